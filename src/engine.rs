//! The per-leg swap protocol engine.
//!
//! One leg is a single channel on a single ledger, driven through the
//! turn-numbered script as a chain of phase types, each consumed by the
//! transition into the next:
//!
//! ```text
//! propose_swap -> ProposedLeg -> JoinedLeg -> FundedLeg -> UnlockedLeg -> ConcludedLeg
//!    (turn 0)        join()      deposit +      unlock()      defund()
//!                                turns 2/3     (turn 4)      (turn 5, final)
//! ```
//!
//! Turn numbers only ever advance by one per transition; anything else is a
//! protocol violation that aborts the leg.

mod defund;
mod fund;
mod propose;
mod unlock;

use crate::abiencode::types::{Address, U256};
use crate::channel::Channel;

pub use defund::ConcludedLeg;
pub use fund::{FundedLeg, JoinedLeg};
pub use propose::{propose_swap, ProposedLeg};
pub use unlock::UnlockedLeg;

/// Turn of the unlock state revealing the pre-image.
pub const UNLOCK_TURN: u64 = 4;
/// Turn of the finalized state submitted for conclusion.
pub const FINAL_TURN: u64 = 5;

/// Construction parameters of one swap leg.
#[derive(Debug, Clone)]
pub struct LegParams {
    pub channel: Channel,
    pub challenge_duration: u64,
    /// Address of the hash-lock conditional-logic contract on this ledger.
    pub app_definition: Address,
    /// Amount the proposer locks into slot 0 at turn 0.
    pub amount: U256,
}
