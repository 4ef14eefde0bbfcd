use crate::abiencode::{
    types::{Address, Bytes32, Hash, U256},
    Token,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One slot of the fund-distribution plan.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub destination: Bytes32,
    pub amount: U256,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("outcome must hold exactly two allocations, got {0}")]
pub struct OutcomeError(pub usize);

/// Ordered fund-distribution plan of a channel state.
///
/// Slot 0 is by convention the proposer/funder, slot 1 the
/// joiner/beneficiary.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Outcome(pub Vec<Allocation>);

impl Outcome {
    /// The canonical funding outcome: the whole amount sits in the
    /// proposer's slot, the joiner's slot is empty.
    pub fn funded_by_proposer(proposer: Address, joiner: Address, amount: U256) -> Self {
        Outcome(vec![
            Allocation {
                destination: address_destination(proposer),
                amount,
            },
            Allocation {
                destination: address_destination(joiner),
                amount: U256::zero(),
            },
        ])
    }

    /// Exchange the amounts of slot 0 and slot 1, keeping the destinations.
    ///
    /// This is the economic effect of resolving the hash lock: the locked
    /// amount moves to the counterparty's slot. Applying it twice returns
    /// the original outcome.
    pub fn swap(&self) -> Result<Outcome, OutcomeError> {
        match self.0.as_slice() {
            [a, b] => Ok(Outcome(vec![
                Allocation {
                    destination: a.destination,
                    amount: b.amount,
                },
                Allocation {
                    destination: b.destination,
                    amount: a.amount,
                },
            ])),
            slots => Err(OutcomeError(slots.len())),
        }
    }

    pub fn total(&self) -> U256 {
        self.0
            .iter()
            .fold(U256::zero(), |acc, alloc| acc + alloc.amount)
    }

    pub(crate) fn token(&self) -> Token {
        Token::Array(
            self.0
                .iter()
                .map(|alloc| {
                    Token::Tuple(vec![
                        Token::FixedBytes(Hash(alloc.destination.0)),
                        Token::Uint(alloc.amount),
                    ])
                })
                .collect(),
        )
    }
}

/// Widen a 20-byte address into the 32-byte destination form used in
/// allocations (left-padded with zeroes).
pub fn address_destination(addr: Address) -> Bytes32 {
    let mut dest = Bytes32::default();
    dest.0[32 - 20..].copy_from_slice(&addr.0);
    dest
}
