//! The single error type shared by every stage of the codec.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HuffmanError {
    /// Nothing to count, so no tree can be built.
    #[error("empty input: no symbols to build a frequency table from")]
    EmptyInput,

    #[error("sample ratio must be in (0, 1], got {0}")]
    InvalidSampleRatio(f64),

    #[error("invalid frequency {frequency} for byte {byte:#04x}")]
    InvalidFrequency { byte: u8, frequency: f64 },

    /// The tree is deeper than a `Code` can hold.
    #[error("code length {length} exceeds the maximum of {max}", max = crate::code_table::MAX_CODE_LEN)]
    CodeTooLong { length: usize },

    #[error("invalid code: {0}")]
    InvalidCode(String),

    /// A byte has no code and the table reserves no escape code.
    #[error("byte {byte:#04x} at offset {offset} has no code and the table has no escape code")]
    UnmappedSymbol { byte: u8, offset: usize },

    #[error("malformed code table: {0}")]
    MalformedCodeTable(String),

    /// Bits ran out in the middle of a code or literal.
    #[error("truncated stream after {consumed_bits} bits")]
    TruncatedStream { consumed_bits: usize },
}

pub type Result<T> = std::result::Result<T, HuffmanError>;
