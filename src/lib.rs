//! Atomic cross-chain swaps over two-party, hash-locked state channels.
//!
//! One swap runs two independent channel legs, one per ledger. Each leg walks
//! the turn-numbered funding script (pre-fund, deposit, post-fund), the
//! secret holder reveals the pre-image on the short-timeout leg, the
//! counterparty mirrors the unlock on the long-timeout leg, and both legs are
//! concluded on-chain. When the counterparty stops cooperating, the
//! [dispute] path finalizes a channel unilaterally from the latest supported
//! states.

mod abiencode {
    mod encode;
    mod error;
    mod hashing;

    pub mod types;

    pub use encode::{encode, Token, SLOT};
    pub use error::{Error, Result};
    pub use hashing::keccak;
}
pub mod sig;

pub mod actor;
pub mod channel;
pub mod dispute;
pub mod engine;
mod error;
pub mod hashlock;
pub mod ledger;
pub mod orchestrator;
pub mod transfer;

pub use abiencode::types::{Address, Bytes32, Hash, Signature, U256};
pub use actor::Actor;
pub use error::SwapError;
pub use orchestrator::{AtomicSwapOrchestrator, LegContext, SwapConfig, SwapSummary};
