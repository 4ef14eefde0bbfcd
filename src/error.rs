use crate::abiencode::{self, types::Hash};
use crate::channel::SupportError;
use crate::ledger::LedgerError;
use core::time::Duration;
use thiserror::Error;

/// Protocol-level failures of one swap leg.
///
/// The first two variants are fatal: the leg must be abandoned (and the
/// dispute path taken if funds are at stake). [SwapError::FundingTimeout]
/// and [SwapError::ChallengeTooEarly] are timing conditions that resolve by
/// waiting and retrying; [SwapError::is_retryable] tells them apart.
#[derive(Debug, Error)]
pub enum SwapError {
    #[error("protocol violation in channel {channel:?} at turn {turn}: {reason}")]
    ProtocolViolation {
        channel: Hash,
        turn: u64,
        reason: String,
    },

    #[error("invalid app transition in channel {channel:?}: {reason}")]
    InvalidTransition { channel: Hash, reason: String },

    #[error("no deposit observed on channel {channel:?} within {waited:?}")]
    FundingTimeout { channel: Hash, waited: Duration },

    #[error("challenge on channel {channel:?} has {remaining}s left before it can be pushed")]
    ChallengeTooEarly { channel: Hash, remaining: u64 },

    #[error("ledger submission failed for channel {channel:?} while {context}: {source}")]
    LedgerSubmission {
        channel: Hash,
        context: &'static str,
        source: LedgerError,
    },

    #[error("signature handling failed: {0}")]
    Support(#[from] SupportError),

    #[error("app data encoding: {0}")]
    Abi(#[from] abiencode::Error),
}

impl SwapError {
    /// Whether waiting and retrying can resolve this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SwapError::FundingTimeout { .. } | SwapError::ChallengeTooEarly { .. }
        )
    }

    pub(crate) fn violation(channel: Hash, turn: u64, reason: impl Into<String>) -> Self {
        SwapError::ProtocolViolation {
            channel,
            turn,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_timing_errors_are_retryable() {
        let channel = Hash::default();
        assert!(SwapError::FundingTimeout {
            channel,
            waited: Duration::from_secs(1)
        }
        .is_retryable());
        assert!(SwapError::ChallengeTooEarly {
            channel,
            remaining: 30
        }
        .is_retryable());
        assert!(!SwapError::violation(channel, 4, "turn gap").is_retryable());
        assert!(!SwapError::InvalidTransition {
            channel,
            reason: "pre-image mismatch".into()
        }
        .is_retryable());
    }
}
