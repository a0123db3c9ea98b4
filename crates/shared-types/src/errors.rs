//! # Error Types
//!
//! Decoding and script-parsing failures.

use thiserror::Error;

/// Errors produced while decoding wire bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input ended before the structure was complete.
    #[error("Unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    /// A CompactSize varint used a longer form than necessary.
    #[error("Non-canonical varint encoding of {0}")]
    NonCanonicalVarint(u64),

    /// A length prefix exceeds the remaining input.
    #[error("Length prefix {0} exceeds remaining input")]
    LengthOverflow(u64),

    /// Bytes were left over after a complete structure.
    #[error("{0} trailing bytes after structure")]
    TrailingBytes(usize),

    /// Hex text could not be parsed into a hash.
    #[error("Invalid hash hex: {0}")]
    InvalidHex(String),
}

/// Errors produced while parsing a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// A push opcode claimed more bytes than the program holds.
    #[error("Truncated push at offset {offset}")]
    TruncatedPush { offset: usize },

    /// A signature script contained a non-push opcode.
    #[error("Non-push opcode 0x{opcode:02x} at instruction {index}")]
    NonPushOpcode { opcode: u8, index: usize },
}
