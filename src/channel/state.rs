use super::{Channel, Outcome};
use crate::abiencode::{
    encode, keccak,
    types::{Address, Hash},
    Token,
};
use serde::{Deserialize, Serialize};

/// A versioned snapshot of a channel.
///
/// `channel` and `turn_num` are private so the only ways to produce a state
/// are [ChannelState::pre_fund] (turn 0) and [ChannelState::advance] (turn
/// + 1). This forces the monotonic-turn invariant at compile time instead of
/// re-checking it at every use site.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChannelState {
    channel: Channel,
    turn_num: u64,
    pub is_final: bool,
    /// Seconds a challenge for this channel stays open on-chain.
    pub challenge_duration: u64,
    pub outcome: Outcome,
    /// Address of the conditional-logic contract governing app transitions.
    pub app_definition: Address,
    /// Opaque app data; for this protocol the encoded hash-lock tuple.
    pub app_data: Vec<u8>,
}

impl ChannelState {
    /// The initial state of a channel (turn 0), built by the proposer.
    pub fn pre_fund(
        channel: Channel,
        challenge_duration: u64,
        app_definition: Address,
        outcome: Outcome,
        app_data: Vec<u8>,
    ) -> Self {
        ChannelState {
            channel,
            turn_num: 0,
            is_final: false,
            challenge_duration,
            outcome,
            app_definition,
            app_data,
        }
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn channel_id(&self) -> Hash {
        self.channel.id()
    }

    pub fn turn_num(&self) -> u64 {
        self.turn_num
    }

    /// Create the state that replaces this one: same channel, same terms,
    /// turn number advanced by exactly one.
    pub fn advance(&self) -> Self {
        ChannelState {
            channel: self.channel,
            turn_num: self.turn_num + 1,
            is_final: self.is_final,
            challenge_duration: self.challenge_duration,
            outcome: self.outcome.clone(),
            app_definition: self.app_definition,
            app_data: self.app_data.clone(),
        }
    }

    /// Two states belong to the same round if channel and turn match.
    pub fn same_round(&self, other: &ChannelState) -> bool {
        self.channel_id() == other.channel_id() && self.turn_num == other.turn_num
    }

    /// keccak256 over the fixed terms and app data.
    pub fn app_part_hash(&self) -> Hash {
        keccak(&encode(&[
            Token::Uint(self.challenge_duration.into()),
            Token::Address(self.app_definition),
            Token::Bytes(self.app_data.clone()),
        ]))
    }

    pub fn outcome_hash(&self) -> Hash {
        keccak(&encode(&[self.outcome.token()]))
    }

    /// The hash participants sign: layered over the channel id, the app part
    /// and the outcome so on-chain code can recompute it from the encoded
    /// parts it receives.
    pub fn hash(&self) -> Hash {
        keccak(&encode(&[
            Token::Uint(self.turn_num.into()),
            Token::Bool(self.is_final),
            Token::FixedBytes(self.channel_id()),
            Token::FixedBytes(self.app_part_hash()),
            Token::FixedBytes(self.outcome_hash()),
        ]))
    }
}
