//! Error types for binhammer
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using HammerError
pub type Result<T> = std::result::Result<T, HammerError>;

/// Unified error type for binhammer operations
#[derive(Debug, Error)]
pub enum HammerError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Framing Errors
    // -------------------------------------------------------------------------
    #[error("Bad magic: expected 0x{expected:02x}, got 0x{found:02x}")]
    BadMagic { expected: u8, found: u8 },

    #[error("Body length underflow: total {total} < key {key} + extras {extras}")]
    LengthUnderflow { total: u32, key: u16, extras: u8 },

    #[error("Response for unknown opaque {0}")]
    UnexpectedOpaque(u32),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HammerError {
    /// True if the byte stream can no longer be trusted
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            HammerError::BadMagic { .. }
                | HammerError::LengthUnderflow { .. }
                | HammerError::UnexpectedOpaque(_)
                | HammerError::Protocol(_)
        )
    }
}
