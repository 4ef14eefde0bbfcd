//! Coordinates the two legs of an atomic swap.
//!
//! Leg L (the executor's, long challenge window) is proposed and funded
//! first; leg R (the responder's, short window) reuses the commitment
//! decoded from leg L's app data. The executor reveals the secret on leg R
//! — the binding action — the responder mirrors the unlock on leg L with the
//! extracted secret, and both legs defund concurrently. The asymmetric
//! windows (L strictly longer than R) keep the responder safe: if the
//! executor never reveals, leg L can still be disputed after leg R's lock
//! has lapsed.

use crate::abiencode::types::{Address, Hash, U256};
use crate::actor::Actor;
use crate::channel::Channel;
use crate::engine::{propose_swap, ConcludedLeg, FundedLeg, LegParams, UnlockedLeg};
use crate::error::SwapError;
use crate::hashlock::lock_hash;
use crate::ledger::Ledger;
use core::time::Duration;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Explicit swap configuration; the orchestrator holds no other state.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct SwapConfig {
    /// Amount locked on each leg.
    pub swap_amount: U256,
    /// Challenge window of the executor-funded leg (L), seconds.
    pub long_challenge_duration: u64,
    /// Challenge window of the responder-funded leg (R), seconds.
    pub short_challenge_duration: u64,
    /// Bound on each joiner's wait for the deposit event.
    pub funding_timeout: Duration,
    /// Bound on the wait for each Concluded event.
    pub settlement_timeout: Duration,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("swap amount must be non-zero")]
    ZeroAmount,
    #[error("long-leg challenge duration ({long}s) must exceed the short leg's ({short}s)")]
    TimeoutsNotAsymmetric { long: u64, short: u64 },
    #[error("funding timeout must be non-zero")]
    ZeroFundingTimeout,
}

impl SwapConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.swap_amount.is_zero() {
            return Err(ConfigError::ZeroAmount);
        }
        if self.long_challenge_duration <= self.short_challenge_duration {
            return Err(ConfigError::TimeoutsNotAsymmetric {
                long: self.long_challenge_duration,
                short: self.short_challenge_duration,
            });
        }
        if self.funding_timeout.is_zero() {
            return Err(ConfigError::ZeroFundingTimeout);
        }
        Ok(())
    }
}

/// Per-ledger context of one leg: the connection plus the deployment
/// artifacts a channel on that ledger references.
#[derive(Debug, Clone, Copy)]
pub struct LegContext<'a, L: Ledger> {
    pub ledger: &'a L,
    /// Hash-lock conditional-logic contract on this ledger.
    pub app_definition: Address,
    /// Channel nonce between these participants on this ledger.
    pub channel_nonce: u64,
}

/// Outcome of a completed swap: one concluded leg per ledger.
#[derive(Debug)]
pub struct SwapSummary {
    pub left: ConcludedLeg,
    pub right: ConcludedLeg,
}

impl SwapSummary {
    pub fn total_gas(&self) -> u64 {
        self.left.gas_used + self.right.gas_used
    }
}

pub struct AtomicSwapOrchestrator<'a, LL: Ledger, RL: Ledger> {
    config: SwapConfig,
    left: LegContext<'a, LL>,
    right: LegContext<'a, RL>,
}

impl<'a, LL: Ledger, RL: Ledger> AtomicSwapOrchestrator<'a, LL, RL> {
    pub fn new(
        config: SwapConfig,
        left: LegContext<'a, LL>,
        right: LegContext<'a, RL>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(AtomicSwapOrchestrator {
            config,
            left,
            right,
        })
    }

    /// Run the full swap. The executor funds leg L and knows `secret`; the
    /// responder funds leg R. A protocol error on either leg aborts before
    /// the paired leg is defunded.
    pub fn execute(
        &self,
        executor: &Actor,
        responder: &Actor,
        secret: &[u8],
    ) -> Result<SwapSummary, SwapError> {
        let commitment = lock_hash(secret);
        info!(
            "starting atomic swap of {} between {} and {}",
            self.config.swap_amount,
            executor.name(),
            responder.name(),
        );

        // Leg L: executor locks funds for the responder under the commitment.
        let funded_l = self.fund_leg(
            &self.left_params(executor, responder),
            self.left.ledger,
            executor,
            responder,
            commitment,
        )?;

        // Leg R reuses the commitment decoded from leg L's app data; the
        // responder funds it to incentivize the reveal.
        let commitment_r = funded_l.commitment()?;
        let funded_r = self.fund_leg(
            &self.right_params(responder, executor),
            self.right.ledger,
            responder,
            executor,
            commitment_r,
        )?;

        // The reveal on leg R is the economically binding action; the
        // responder extracts the secret from it and mirrors the unlock.
        let unlocked_r = funded_r.unlock(executor, secret)?;
        let revealed = unlocked_r.revealed_secret()?;
        let unlocked_l = funded_l.unlock(responder, &revealed)?;

        self.defund_both(unlocked_l, unlocked_r, executor, responder)
    }

    fn left_params(&self, proposer: &Actor, joiner: &Actor) -> LegParams {
        LegParams {
            channel: Channel::new(
                self.left.ledger.ledger_id(),
                self.left.channel_nonce,
                [proposer.address(), joiner.address()],
            ),
            challenge_duration: self.config.long_challenge_duration,
            app_definition: self.left.app_definition,
            amount: self.config.swap_amount,
        }
    }

    fn right_params(&self, proposer: &Actor, joiner: &Actor) -> LegParams {
        LegParams {
            channel: Channel::new(
                self.right.ledger.ledger_id(),
                self.right.channel_nonce,
                [proposer.address(), joiner.address()],
            ),
            challenge_duration: self.config.short_challenge_duration,
            app_definition: self.right.app_definition,
            amount: self.config.swap_amount,
        }
    }

    fn fund_leg<L: Ledger>(
        &self,
        params: &LegParams,
        ledger: &L,
        proposer: &Actor,
        joiner: &Actor,
        commitment: Hash,
    ) -> Result<FundedLeg, SwapError> {
        let proposed = propose_swap(params, proposer, commitment)?;
        let mut joined = proposed.join(joiner)?;
        joined.submit_deposit(ledger, proposer)?;
        joined.await_funding(ledger, joiner, self.config.funding_timeout)
    }

    /// Defund both legs concurrently; each ledger connection is owned by
    /// exactly one scoped thread for the duration.
    fn defund_both(
        &self,
        unlocked_l: UnlockedLeg,
        unlocked_r: UnlockedLeg,
        executor: &Actor,
        responder: &Actor,
    ) -> Result<SwapSummary, SwapError> {
        let settlement = self.config.settlement_timeout;
        let (left, right) = std::thread::scope(|s| {
            let left = s.spawn(move || {
                unlocked_l.defund(self.left.ledger, executor, responder, settlement)
            });
            let right = s.spawn(move || {
                unlocked_r.defund(self.right.ledger, responder, executor, settlement)
            });
            (left.join(), right.join())
        });

        let summary = SwapSummary {
            left: left.expect("left defund thread panicked")?,
            right: right.expect("right defund thread panicked")?,
        };
        info!(
            "swap complete: channels {:?} / {:?}, {} gas total",
            summary.left.channel_id,
            summary.right.channel_id,
            summary.total_gas(),
        );
        Ok(summary)
    }
}

/// A fresh 32-byte swap secret.
pub fn random_secret<R: rand::Rng + rand::CryptoRng>(rng: &mut R) -> Vec<u8> {
    let bytes: [u8; 32] = rng.gen();
    bytes.to_vec()
}
