use super::{fund::FundedLeg, UNLOCK_TURN};
use crate::actor::Actor;
use crate::channel::SignedState;
use crate::error::SwapError;
use crate::hashlock::HashLockedSwapData;
use log::info;

impl FundedLeg {
    /// Reveal the pre-image: build the turn-4 state carrying it in the app
    /// data with the outcome swapped, signed by the holder.
    ///
    /// The pre-image is deliberately not checked against the commitment
    /// here; revealing is the economically binding action, and validity is
    /// judged by the conditional-logic check when the leg is defunded (or by
    /// the adjudicator in a dispute).
    pub fn unlock(self, holder: &Actor, pre_image: &[u8]) -> Result<UnlockedLeg, SwapError> {
        let channel_id = self.channel_id();
        if self.initial_state().channel().part_idx(holder.address()).is_none() {
            return Err(SwapError::violation(
                channel_id,
                UNLOCK_TURN,
                "only a channel participant can reveal the pre-image",
            ));
        }

        let commitment = self.commitment()?;
        let swapped = self.initial_state().outcome.swap().map_err(|e| {
            SwapError::violation(channel_id, UNLOCK_TURN, e.to_string())
        })?;

        let mut state = self.post_fund3.state.advance();
        state.app_data = HashLockedSwapData::reveal(commitment, pre_image.to_vec()).encode();
        state.outcome = swapped;
        debug_assert_eq!(state.turn_num(), UNLOCK_TURN);

        let unlock4 = holder.sign(&state);
        info!(
            "{} reveals the pre-image on channel {:?}, swapping the outcome at turn 4",
            holder.name(),
            channel_id,
        );

        Ok(UnlockedLeg {
            leg: self,
            unlock4,
        })
    }

    /// Accept a turn-4 unlock state received from the counterparty.
    ///
    /// Verifies channel identity, the exactly-one turn step and that the
    /// signer is a participant. The hash-lock condition itself is judged at
    /// defund time.
    pub fn observe_unlock(self, unlock4: SignedState) -> Result<UnlockedLeg, SwapError> {
        let channel_id = self.channel_id();
        if unlock4.state.channel_id() != channel_id {
            return Err(SwapError::violation(
                channel_id,
                unlock4.state.turn_num(),
                "unlock state belongs to a different channel",
            ));
        }
        if unlock4.state.turn_num() != self.post_fund3.state.turn_num() + 1 {
            return Err(SwapError::violation(
                channel_id,
                unlock4.state.turn_num(),
                "unlock state does not advance the turn by exactly one",
            ));
        }
        unlock4.signer_idx()?;

        Ok(UnlockedLeg { leg: self, unlock4 })
    }
}

/// A leg holding a signed turn-4 unlock state mirroring the swapped
/// allocation. Ready for collaborative defunding.
#[derive(Debug)]
pub struct UnlockedLeg {
    pub(super) leg: FundedLeg,
    pub(super) unlock4: SignedState,
}

impl UnlockedLeg {
    pub fn unlock_state(&self) -> &SignedState {
        &self.unlock4
    }

    /// Extract the pre-image the unlock state revealed; this is how the
    /// counterparty learns the secret to mirror the unlock on the other leg.
    pub fn revealed_secret(&self) -> Result<Vec<u8>, SwapError> {
        let data = HashLockedSwapData::decode(&self.unlock4.state.app_data)?;
        if !data.is_revealed() {
            return Err(SwapError::violation(
                self.leg.channel_id(),
                self.unlock4.state.turn_num(),
                "unlock state does not carry a pre-image",
            ));
        }
        Ok(data.pre_image)
    }
}
