use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised while decoding ABI-encoded data received from the
/// counterparty or read back from a ledger.
///
/// Encoding cannot fail: every [Token][super::Token] tree has exactly one
/// head/tail layout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("encoded data ends before slot {0}")]
    UnexpectedEnd(usize),
    #[error("dynamic offset {0:#x} does not match the expected layout")]
    InvalidOffset(usize),
    #[error("declared byte length {0} exceeds the remaining data")]
    InvalidLength(usize),
    #[error("padding bytes after the payload are not zero")]
    NonZeroPadding,
    #[error("{0} trailing bytes after the last slot")]
    TrailingData(usize),
}
