//! The ledger collaborator: everything the protocol consumes from a chain.
//!
//! The crate defines the seam only; a production implementation would wrap
//! an RPC provider and the deployed adjudicator/asset-holder contracts,
//! while tests drive an in-memory chain. Implementations own their
//! connection exclusively and must be shareable across the two defunding
//! threads, hence the `Sync` bound.

use crate::abiencode::types::{Address, Bytes32, Hash, Signature, U256};
use crate::channel::{ChannelState, SignedState, SupportedState};
use crate::transfer::ConditionalTransfer;
use core::time::Duration;
use thiserror::Error;

/// Receipt of a submitted transaction: consumed gas plus the events the
/// transaction emitted.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    pub gas_used: u64,
    pub events: Vec<LedgerEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    Deposited {
        channel: Hash,
        amount: U256,
        destination_holdings: U256,
    },
    Concluded {
        channel: Hash,
    },
    Challenged {
        channel: Hash,
        turn_num: u64,
        expires_at: u64,
    },
    OutcomePushed {
        channel: Hash,
    },
    TransferDefunded {
        channel: Hash,
        transfer_id: Hash,
    },
    Exited {
        channel: Hash,
        destination: Bytes32,
        amount: U256,
    },
}

/// Why the (simulated) adjudicator rejected a transaction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RevertReason {
    #[error("holdings do not match the expected amount")]
    WrongExpectedHeld,
    #[error("insufficient balance for the transfer")]
    InsufficientBalance,
    #[error("state is not final")]
    NotFinal,
    #[error("signature does not recover to a participant")]
    InvalidSignature,
    #[error("channel already concluded")]
    AlreadyConcluded,
    #[error("challenge states do not form a supported round")]
    UnsupportedChallenge,
    #[error("a challenge with an equal or higher turn exists")]
    StaleChallenge,
    #[error("no active challenge for this channel")]
    NoChallenge,
    #[error("challenge is open for another {remaining}s")]
    ChallengeNotExpired { remaining: u64 },
    #[error("pushed state does not match the challenged state")]
    WrongPushedState,
    #[error("no transfer set registered for this channel")]
    NoTransferRoot,
    #[error("merkle proof does not match the registered root")]
    InvalidProof,
    #[error("resolver pre-image does not open the transfer lock")]
    InvalidResolver,
    #[error("transfer already defunded")]
    TransferAlreadyDefunded,
    #[error("nothing to exit for this destination")]
    NothingToExit,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("transaction reverted: {0}")]
    Reverted(RevertReason),
    #[error("no {event} event observed within {timeout:?}")]
    EventTimeout {
        event: &'static str,
        timeout: Duration,
    },
}

/// A challenge submission: the latest round the challenger can prove, as
/// two consecutively-turned states signed by distinct participants.
#[derive(Debug, Clone)]
pub struct ChallengeRequest {
    pub precursor: SignedState,
    pub contested: SignedState,
}

pub trait Ledger: Sync {
    /// Chain identity, baked into every channel id on this ledger.
    fn ledger_id(&self) -> U256;

    /// Timestamp of the latest block.
    fn block_timestamp(&self) -> u64;

    /// Advance the simulated clock. Test-chain capability, used to cross
    /// challenge expiry deterministically; production ledgers reject it.
    fn advance_time(&self, secs: u64) -> Result<(), LedgerError>;

    /// Deterministic address a channel's funds are held at before its
    /// contract is deployed, derived CREATE2-style from this ledger's
    /// channel factory and the channel id ([crate::channel::funding_address]).
    fn channel_address(&self, channel: Hash) -> Address;

    /// Funds currently held on-chain for a channel.
    fn holdings(&self, channel: Hash) -> U256;

    /// Token balance of a destination outside any channel.
    fn balance_of(&self, destination: Bytes32) -> U256;

    /// Deposit `amount` into a channel's holdings, guarded by the holdings
    /// the depositor expects to exist already.
    fn deposit(
        &self,
        channel: Hash,
        expected_held: U256,
        amount: U256,
        from: Bytes32,
    ) -> Result<TxReceipt, LedgerError>;

    /// Resolve once a deposit event for `channel` has been observed.
    fn wait_for_deposit(&self, channel: Hash, timeout: Duration)
        -> Result<LedgerEvent, LedgerError>;

    /// Conclude a finalized state and transfer all holdings per its outcome
    /// in one transaction.
    fn conclude(&self, conclusion: &SupportedState) -> Result<TxReceipt, LedgerError>;

    /// Resolve once the Concluded event for `channel` has been observed.
    fn wait_for_concluded(
        &self,
        channel: Hash,
        timeout: Duration,
    ) -> Result<LedgerEvent, LedgerError>;

    /// Open a challenge asserting the given round; starts the expiry timer.
    fn challenge(&self, request: &ChallengeRequest) -> Result<TxReceipt, LedgerError>;

    /// Finalize a challenged channel after expiry and pay out its outcome.
    fn push_outcome_and_transfer_all(
        &self,
        channel: Hash,
        state: &ChannelState,
    ) -> Result<TxReceipt, LedgerError>;

    /// Anchor the merkle root of a channel's outstanding conditional
    /// transfers, making them individually defundable.
    fn register_transfer_root(&self, channel: Hash, root: Hash) -> Result<TxReceipt, LedgerError>;

    /// Resolve one outstanding transfer with its pre-image and the
    /// responder's counter-signature over the transfer hash.
    fn defund_transfer(
        &self,
        transfer: &ConditionalTransfer,
        state_encoding: &[u8],
        resolver_encoding: &[u8],
        counter_sig: Signature,
        proof: &[Hash],
    ) -> Result<TxReceipt, LedgerError>;

    /// Release a defunded transfer balance to its beneficiary.
    fn exit(&self, channel: Hash, destination: Bytes32) -> Result<TxReceipt, LedgerError>;
}
