use super::{fund::JoinedLeg, LegParams};
use crate::abiencode::types::Hash;
use crate::actor::Actor;
use crate::channel::{turn_taker, ChannelState, Outcome, SignedState};
use crate::error::SwapError;
use crate::hashlock::HashLockedSwapData;
use log::info;

/// Build and sign the initial state (turn 0) of a hash-locked swap leg.
///
/// The whole amount sits in the proposer's slot; the commitment goes into
/// the app data with an empty pre-image.
pub fn propose_swap(
    params: &LegParams,
    proposer: &Actor,
    commitment: Hash,
) -> Result<ProposedLeg, SwapError> {
    let channel = params.channel;
    if proposer.address() != channel.proposer() {
        return Err(SwapError::violation(
            channel.id(),
            0,
            "proposing key does not belong to participant 0",
        ));
    }

    let outcome = Outcome::funded_by_proposer(channel.proposer(), channel.joiner(), params.amount);
    let app_data = HashLockedSwapData::commit(commitment).encode();
    let state = ChannelState::pre_fund(
        channel,
        params.challenge_duration,
        params.app_definition,
        outcome,
        app_data,
    );

    info!(
        "{} proposes a hash-locked payment of {} on ledger {} (channel {:?})",
        proposer.name(),
        params.amount,
        channel.ledger_id,
        channel.id(),
    );

    Ok(ProposedLeg {
        params: params.clone(),
        pre_fund0: proposer.sign(&state),
    })
}

/// A leg whose initial state exists and carries the proposer's signature,
/// waiting for the joiner to countersign the terms.
#[derive(Debug)]
pub struct ProposedLeg {
    params: LegParams,
    pre_fund0: SignedState,
}

impl ProposedLeg {
    pub fn initial_state(&self) -> &ChannelState {
        &self.pre_fund0.state
    }

    /// The hash commitment embedded at turn 0.
    pub fn commitment(&self) -> Result<Hash, SwapError> {
        Ok(HashLockedSwapData::decode(&self.pre_fund0.state.app_data)?.h)
    }

    /// The joiner validates the proposed terms and countersigns at turn 1.
    pub fn join(self, joiner: &Actor) -> Result<JoinedLeg, SwapError> {
        let state = &self.pre_fund0.state;
        let channel = *state.channel();
        let channel_id = channel.id();
        let violation = |reason: &str| SwapError::violation(channel_id, state.turn_num(), reason);

        if joiner.address() != channel.joiner() {
            return Err(violation("joining key does not belong to participant 1"));
        }
        if self.pre_fund0.signer_idx()? != turn_taker(state.turn_num()) {
            return Err(violation("initial state is not signed by the proposer"));
        }
        if state.turn_num() != 0 || state.is_final {
            return Err(violation("initial state must be turn 0 and not final"));
        }
        if state.challenge_duration == 0 {
            return Err(violation("challenge duration must be non-zero"));
        }
        match state.outcome.0.as_slice() {
            [funder, beneficiary] => {
                if beneficiary.destination != joiner.destination() {
                    return Err(violation("joiner does not own the receiving slot"));
                }
                if funder.amount != self.params.amount {
                    return Err(violation("funded slot does not match the agreed amount"));
                }
            }
            _ => return Err(violation("outcome must hold exactly two allocations")),
        }
        let app_data = HashLockedSwapData::decode(&state.app_data)?;
        if app_data.is_revealed() {
            return Err(violation("pre-image must be empty before unlock"));
        }

        let pre_fund1 = joiner.sign(&state.advance());
        info!(
            "{} joins channel {:?} on ledger {}, countersigning at turn 1",
            joiner.name(),
            channel_id,
            channel.ledger_id,
        );

        Ok(JoinedLeg::new(self.params, self.pre_fund0, pre_fund1))
    }
}
