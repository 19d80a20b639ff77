//! Request definitions
//!
//! Opcodes and the request frame sent to the server.

use bytes::Bytes;

/// Wire-level opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Get = 0x00,
    Set = 0x01,
    Add = 0x02,
    Delete = 0x04,
    GetQ = 0x09,
    Noop = 0x0a,
    SetQ = 0x11,
    AddQ = 0x12,
    DeleteQ = 0x14,
}

impl Opcode {
    /// Look up an opcode by its wire code
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Opcode::Get),
            0x01 => Some(Opcode::Set),
            0x02 => Some(Opcode::Add),
            0x04 => Some(Opcode::Delete),
            0x09 => Some(Opcode::GetQ),
            0x0a => Some(Opcode::Noop),
            0x11 => Some(Opcode::SetQ),
            0x12 => Some(Opcode::AddQ),
            0x14 => Some(Opcode::DeleteQ),
            _ => None,
        }
    }

    /// Quiet opcodes only get a reply on error (GETQ also on hit)
    pub fn is_quiet(self) -> bool {
        matches!(
            self,
            Opcode::GetQ | Opcode::SetQ | Opcode::AddQ | Opcode::DeleteQ
        )
    }

    /// The quiet counterpart, if one exists
    pub fn quiet(self) -> Self {
        match self {
            Opcode::Get => Opcode::GetQ,
            Opcode::Set => Opcode::SetQ,
            Opcode::Add => Opcode::AddQ,
            Opcode::Delete => Opcode::DeleteQ,
            other => other,
        }
    }
}

/// A request frame
///
/// Lengths of `key`, `extras` and `body` must fit the header fields
/// (u16, u8 and u32 for the sum respectively). Encoding a frame that
/// violates this panics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    pub opcode: u8,
    pub key: Bytes,
    pub extras: Bytes,
    pub body: Bytes,
    pub opaque: u32,
    pub cas: u64,
}

impl RequestFrame {
    /// Create a frame with no extras, body, opaque or cas
    pub fn new(opcode: Opcode, key: impl Into<Bytes>) -> Self {
        Self {
            opcode: opcode as u8,
            key: key.into(),
            extras: Bytes::new(),
            body: Bytes::new(),
            opaque: 0,
            cas: 0,
        }
    }

    /// GET request
    pub fn get(key: impl Into<Bytes>) -> Self {
        Self::new(Opcode::Get, key)
    }

    /// DELETE request
    pub fn delete(key: impl Into<Bytes>) -> Self {
        Self::new(Opcode::Delete, key)
    }

    /// NOOP request, used as a fence after quiet requests
    pub fn noop() -> Self {
        Self::new(Opcode::Noop, Bytes::new())
    }

    /// Storage request (SET/ADD and their quiet variants)
    ///
    /// Extras carry flags in the high 32 bits and expiry in the low 32 bits.
    pub fn store(
        opcode: Opcode,
        key: impl Into<Bytes>,
        flags: u32,
        expiry: u32,
        body: impl Into<Bytes>,
    ) -> Self {
        let extras = ((u64::from(flags) << 32) | u64::from(expiry)).to_be_bytes();
        Self {
            extras: Bytes::copy_from_slice(&extras),
            body: body.into(),
            ..Self::new(opcode, key)
        }
    }

    /// Set the opaque token echoed back by the server
    pub fn with_opaque(mut self, opaque: u32) -> Self {
        self.opaque = opaque;
        self
    }

    /// Set the cas value
    pub fn with_cas(mut self, cas: u64) -> Self {
        self.cas = cas;
        self
    }

    /// Sum of extras, key and body lengths as declared in the header
    pub fn total_body_len(&self) -> usize {
        self.extras.len() + self.key.len() + self.body.len()
    }
}
