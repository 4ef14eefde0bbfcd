mod outcome;
mod state;
mod support;

use crate::abiencode::{encode, keccak, types::{Address, Hash, U256}, Token};
use serde::{Deserialize, Serialize};

pub use outcome::{address_destination, Allocation, Outcome, OutcomeError};
pub use state::ChannelState;
pub use support::{sign_state, turn_taker, PendingSupport, SignedState, SupportError, SupportedState};

/// Index of a participant in the channel.
///
/// `0` is the proposer of the channel, `1` the joiner.
pub type PartIdx = usize;

pub const PARTICIPANTS: usize = 2;

/// Identity of a 2-party channel on one ledger.
///
/// Immutable once created; the identity hash is the on-chain lookup key for
/// holdings, challenges and conclusions.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Channel {
    pub ledger_id: U256,
    pub nonce: u64,
    pub participants: [Address; PARTICIPANTS],
}

impl Channel {
    pub fn new(ledger_id: U256, nonce: u64, participants: [Address; PARTICIPANTS]) -> Self {
        Channel {
            ledger_id,
            nonce,
            participants,
        }
    }

    /// keccak256(abi.encode(ledgerId, participants, nonce))
    pub fn id(&self) -> Hash {
        keccak(&encode(&[
            Token::Uint(self.ledger_id),
            Token::Array(self.participants.iter().map(|p| Token::Address(*p)).collect()),
            Token::Uint(self.nonce.into()),
        ]))
    }

    pub fn proposer(&self) -> Address {
        self.participants[0]
    }

    pub fn joiner(&self) -> Address {
        self.participants[1]
    }

    /// Index of `addr` among the participants, if any.
    pub fn part_idx(&self, addr: Address) -> Option<PartIdx> {
        self.participants.iter().position(|&p| p == addr)
    }
}

/// CREATE2-style derivation of the address a channel's funds are sent to
/// before the channel contract exists:
/// `keccak256(0xff ++ factory ++ salt ++ initCodeHash)[12..]`, with the
/// channel id as the salt.
///
/// Uses packed encoding, not slots, matching the EVM's CREATE2 formula.
pub fn funding_address(factory: Address, channel_id: Hash, init_code_hash: Hash) -> Address {
    let mut packed = Vec::with_capacity(1 + 20 + 32 + 32);
    packed.push(0xff);
    packed.extend_from_slice(&factory.0);
    packed.extend_from_slice(&channel_id.0);
    packed.extend_from_slice(&init_code_hash.0);
    let hash = keccak(&packed);

    let mut addr = Address::default();
    addr.0.copy_from_slice(&hash.0[32 - 20..]);
    addr
}
