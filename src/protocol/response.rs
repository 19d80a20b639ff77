//! Response definitions
//!
//! Represents responses from the server.

use bytes::Bytes;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    NoError,
    KeyNotFound,
    KeyExists,
    ValueTooLarge,
    InvalidArguments,
    NotStored,
    UnknownCommand,
    OutOfMemory,
    Other(u16),
}

impl Status {
    pub fn from_u16(code: u16) -> Self {
        match code {
            0x0000 => Status::NoError,
            0x0001 => Status::KeyNotFound,
            0x0002 => Status::KeyExists,
            0x0003 => Status::ValueTooLarge,
            0x0004 => Status::InvalidArguments,
            0x0005 => Status::NotStored,
            0x0081 => Status::UnknownCommand,
            0x0082 => Status::OutOfMemory,
            other => Status::Other(other),
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            Status::NoError => 0x0000,
            Status::KeyNotFound => 0x0001,
            Status::KeyExists => 0x0002,
            Status::ValueTooLarge => 0x0003,
            Status::InvalidArguments => 0x0004,
            Status::NotStored => 0x0005,
            Status::UnknownCommand => 0x0081,
            Status::OutOfMemory => 0x0082,
            Status::Other(code) => code,
        }
    }

    pub fn is_success(self) -> bool {
        self == Status::NoError
    }
}

/// A response frame read from the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    /// Opcode echoed from the request
    pub opcode: u8,

    /// Raw status as it appeared in bytes 6..8
    pub status: u16,

    pub key: Bytes,
    pub extras: Bytes,
    pub body: Bytes,

    /// Correlation token echoed from the request
    pub opaque: u32,

    pub cas: u64,
}

impl ResponseFrame {
    /// Create an empty response for the given opcode and status
    pub fn new(opcode: u8, status: Status) -> Self {
        Self {
            opcode,
            status: status.as_u16(),
            key: Bytes::new(),
            extras: Bytes::new(),
            body: Bytes::new(),
            opaque: 0,
            cas: 0,
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_extras(mut self, extras: impl Into<Bytes>) -> Self {
        self.extras = extras.into();
        self
    }

    pub fn with_key(mut self, key: impl Into<Bytes>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_opaque(mut self, opaque: u32) -> Self {
        self.opaque = opaque;
        self
    }

    pub fn with_cas(mut self, cas: u64) -> Self {
        self.cas = cas;
        self
    }

    /// Classified status
    pub fn status(&self) -> Status {
        Status::from_u16(self.status)
    }

    pub fn is_success(&self) -> bool {
        self.status().is_success()
    }

    /// Sum of extras, key and body lengths as declared in the header
    pub fn total_body_len(&self) -> usize {
        self.extras.len() + self.key.len() + self.body.len()
    }
}
