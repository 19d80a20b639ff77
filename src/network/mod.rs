//! Network Module
//!
//! TCP connections to the cache server.
//!
//! ## Architecture
//! - One `Connection` per worker, never shared
//! - Buffered reader/writer halves over a cloned `TcpStream`
//! - `Connector` abstracts connection establishment for the controller

mod connection;

pub use connection::{Connection, Connector, TcpConnector};
