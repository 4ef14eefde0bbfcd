use super::{unlock::UnlockedLeg, FINAL_TURN};
use crate::abiencode::types::Hash;
use crate::actor::Actor;
use crate::channel::{ChannelState, PendingSupport};
use crate::error::SwapError;
use crate::hashlock;
use crate::ledger::Ledger;
use core::time::Duration;
use log::info;

impl UnlockedLeg {
    /// Collaboratively defund the leg: verify the 0→4 transition under the
    /// hash-lock rules, finalize at turn 5 with both signatures and conclude
    /// on-chain, transferring all holdings per the unlocked outcome.
    ///
    /// The conditional-logic check runs before any turn-5 signature exists;
    /// a rejected unlock aborts with [SwapError::InvalidTransition] and
    /// leaves the on-chain holdings untouched, so the dispute path remains
    /// available.
    pub fn defund<L: Ledger>(
        self,
        ledger: &L,
        proposer: &Actor,
        joiner: &Actor,
        settlement_timeout: Duration,
    ) -> Result<ConcludedLeg, SwapError> {
        let channel = *self.leg.initial_state().channel();
        let channel_id = channel.id();
        if proposer.address() != channel.proposer() || joiner.address() != channel.joiner() {
            return Err(SwapError::violation(
                channel_id,
                FINAL_TURN,
                "defunding keys do not match the channel participants",
            ));
        }

        if !hashlock::valid_transition(self.leg.initial_state(), &self.unlock4.state)? {
            return Err(SwapError::InvalidTransition {
                channel: channel_id,
                reason: "hash lock rejected the unlock state".into(),
            });
        }
        info!(
            "{} verified the unlock on channel {:?}; finalizing at turn 5",
            proposer.name(),
            channel_id,
        );

        let mut final5 = self.unlock4.state.advance();
        final5.is_final = true;
        debug_assert_eq!(final5.turn_num(), FINAL_TURN);

        let mut support = PendingSupport::new(final5.clone());
        support.add(&proposer.sign(&final5))?;
        support.add(&joiner.sign(&final5))?;
        let supported = support.finish()?;

        let receipt = ledger
            .conclude(&supported)
            .map_err(|source| SwapError::LedgerSubmission {
                channel: channel_id,
                context: "concluding and transferring the final outcome",
                source,
            })?;

        ledger
            .wait_for_concluded(channel_id, settlement_timeout)
            .map_err(|source| SwapError::LedgerSubmission {
                channel: channel_id,
                context: "awaiting the Concluded event",
                source,
            })?;

        info!(
            "channel {:?} concluded, {} gas; funds transferred out",
            channel_id, receipt.gas_used,
        );

        Ok(ConcludedLeg {
            channel_id,
            final_state: supported.state,
            gas_used: receipt.gas_used,
        })
    }
}

/// Terminal phase of a leg: the final state is on-chain and holdings have
/// been paid out. No further states are valid for this channel.
#[derive(Debug)]
pub struct ConcludedLeg {
    pub channel_id: Hash,
    pub final_state: ChannelState,
    pub gas_used: u64,
}
