//! The on-chain fallback when the counterparty stops cooperating: challenge
//! with the latest supported round, push the outcome after expiry, and
//! defund any conditional transfer left outstanding.

use crate::abiencode::types::{Hash, Signature};
use crate::channel::{ChannelState, SignedState};
use crate::error::SwapError;
use crate::ledger::{ChallengeRequest, Ledger, LedgerError, RevertReason, TxReceipt};
use crate::transfer::{ConditionalTransfer, TransferResolver};
use log::info;

/// Drives the dispute protocol against one ledger.
#[derive(Debug, Clone, Copy)]
pub struct DisputeResolver<'a, L: Ledger> {
    ledger: &'a L,
}

impl<'a, L: Ledger> DisputeResolver<'a, L> {
    pub fn new(ledger: &'a L) -> Self {
        DisputeResolver { ledger }
    }

    /// Challenge a channel with the latest round the challenger can prove:
    /// two consecutively-turned states signed by distinct participants.
    /// Starts the on-chain expiry clock of the state's challenge duration.
    pub fn challenge(
        &self,
        precursor: SignedState,
        contested: SignedState,
    ) -> Result<TxReceipt, SwapError> {
        let channel_id = contested.state.channel_id();
        let turn = contested.state.turn_num();
        if precursor.state.channel_id() != channel_id {
            return Err(SwapError::violation(
                channel_id,
                turn,
                "challenge states belong to different channels",
            ));
        }
        if turn != precursor.state.turn_num() + 1 {
            return Err(SwapError::violation(
                channel_id,
                turn,
                "challenge states are not consecutive turns",
            ));
        }
        if precursor.signer_idx()? == contested.signer_idx()? {
            return Err(SwapError::violation(
                channel_id,
                turn,
                "challenge states must be signed by distinct participants",
            ));
        }

        let receipt = self
            .ledger
            .challenge(&ChallengeRequest {
                precursor,
                contested,
            })
            .map_err(|source| SwapError::LedgerSubmission {
                channel: channel_id,
                context: "submitting the challenge",
                source,
            })?;
        info!(
            "challenged channel {:?} at turn {} ({} gas)",
            channel_id, turn, receipt.gas_used,
        );
        Ok(receipt)
    }

    /// Finalize a challenged channel once its window has elapsed and pay
    /// out the recorded outcome. Early calls surface as the retryable
    /// [SwapError::ChallengeTooEarly]; repeating the call after conclusion
    /// fails rather than transferring twice.
    pub fn push_outcome_and_transfer_all(
        &self,
        state: &ChannelState,
    ) -> Result<TxReceipt, SwapError> {
        let channel_id = state.channel_id();
        let receipt = self
            .ledger
            .push_outcome_and_transfer_all(channel_id, state)
            .map_err(|source| match source {
                LedgerError::Reverted(RevertReason::ChallengeNotExpired { remaining }) => {
                    SwapError::ChallengeTooEarly {
                        channel: channel_id,
                        remaining,
                    }
                }
                source => SwapError::LedgerSubmission {
                    channel: channel_id,
                    context: "pushing the challenged outcome",
                    source,
                },
            })?;
        info!(
            "pushed outcome for channel {:?} and transferred holdings ({} gas)",
            channel_id, receipt.gas_used,
        );
        Ok(receipt)
    }

    /// Resolve an outstanding conditional transfer with its pre-image and
    /// the responder's counter-signature, then exit the released balance to
    /// the beneficiary.
    pub fn defund_transfer(
        &self,
        transfer: &ConditionalTransfer,
        resolver: &TransferResolver,
        counter_sig: Signature,
        proof: &[Hash],
    ) -> Result<TxReceipt, SwapError> {
        let channel_id = transfer.channel_id;
        let submission = |source| SwapError::LedgerSubmission {
            channel: channel_id,
            context: "defunding the conditional transfer",
            source,
        };

        let defund = self
            .ledger
            .defund_transfer(
                transfer,
                &transfer.encode_state(),
                &resolver.encode(),
                counter_sig,
                proof,
            )
            .map_err(submission)?;

        let exit = self
            .ledger
            .exit(channel_id, transfer.beneficiary)
            .map_err(|source| SwapError::LedgerSubmission {
                channel: channel_id,
                context: "exiting the released transfer balance",
                source,
            })?;

        info!(
            "defunded transfer {:?} on channel {:?} ({} gas)",
            transfer.hash(),
            channel_id,
            defund.gas_used + exit.gas_used,
        );
        Ok(TxReceipt {
            gas_used: defund.gas_used + exit.gas_used,
            events: defund
                .events
                .into_iter()
                .chain(exit.events.into_iter())
                .collect(),
        })
    }
}
