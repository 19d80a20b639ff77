//! Protocol Module
//!
//! Defines the binary wire protocol spoken to the cache server.
//!
//! ## Frame Format
//!
//! Every request and response starts with a fixed 24-byte header
//! (all integers big-endian), followed by extras, key and value with
//! no padding in between.
//!
//! ```text
//! Byte/     0       |       1       |       2       |       3       |
//!    /              |               |               |               |
//!   |0 1 2 3 4 5 6 7|0 1 2 3 4 5 6 7|0 1 2 3 4 5 6 7|0 1 2 3 4 5 6 7|
//!   +---------------+---------------+---------------+---------------+
//!  0| Magic         | Opcode        | Key length                    |
//!   +---------------+---------------+---------------+---------------+
//!  4| Extras length | Data type     | vbucket id / Status           |
//!   +---------------+---------------+---------------+---------------+
//!  8| Total body length                                             |
//!   +---------------+---------------+---------------+---------------+
//! 12| Opaque                                                        |
//!   +---------------+---------------+---------------+---------------+
//! 16| CAS                                                           |
//!   |                                                               |
//!   +---------------+---------------+---------------+---------------+
//! ```
//!
//! ### Magic
//! - 0x80: request
//! - 0x81: response

mod request;
mod response;
mod codec;

pub use request::{Opcode, RequestFrame};
pub use response::{ResponseFrame, Status};
pub use codec::{
    HEADER_LEN, MAX_BODY_LEN, REQ_MAGIC, RES_MAGIC,
    encode_request, decode_request, read_request, write_request,
    encode_response, decode_response, read_response, write_response,
    FrameHeader,
};
