use super::LegParams;
use crate::abiencode::types::{Hash, U256};
use crate::actor::Actor;
use crate::channel::{ChannelState, SignedState};
use crate::error::SwapError;
use crate::hashlock::HashLockedSwapData;
use crate::ledger::{Ledger, LedgerError, TxReceipt};
use core::time::Duration;
use log::info;

/// A leg with the pre-fund round signed by both parties. The proposer now
/// deposits on-chain; the joiner reacts to the deposit event.
#[derive(Debug)]
pub struct JoinedLeg {
    params: LegParams,
    pre_fund0: SignedState,
    pre_fund1: SignedState,
    /// The proposer's turn-2 acknowledgement. Signed locally when the
    /// deposit goes out; never delivered to the joiner in this protocol.
    post_fund2: Option<SignedState>,
}

impl JoinedLeg {
    pub(super) fn new(params: LegParams, pre_fund0: SignedState, pre_fund1: SignedState) -> Self {
        JoinedLeg {
            params,
            pre_fund0,
            pre_fund1,
            post_fund2: None,
        }
    }

    pub fn channel_id(&self) -> Hash {
        self.pre_fund0.state.channel_id()
    }

    /// The proposer transfers the slot-0 amount into the channel's holdings
    /// and acknowledges with a locally-kept turn-2 signature.
    pub fn submit_deposit<L: Ledger>(
        &mut self,
        ledger: &L,
        proposer: &Actor,
    ) -> Result<TxReceipt, SwapError> {
        let channel_id = self.channel_id();
        if proposer.address() != self.pre_fund0.state.channel().proposer() {
            return Err(SwapError::violation(
                channel_id,
                2,
                "only the proposer funds the channel",
            ));
        }

        let receipt = ledger
            .deposit(
                channel_id,
                U256::zero(),
                self.params.amount,
                proposer.destination(),
            )
            .map_err(|source| SwapError::LedgerSubmission {
                channel: channel_id,
                context: "depositing the swap amount",
                source,
            })?;

        self.post_fund2 = Some(proposer.sign(&self.pre_fund1.state.advance()));
        info!(
            "{} deposited {} into channel {:?} ({} gas), signing PostFund2",
            proposer.name(),
            self.params.amount,
            channel_id,
            receipt.gas_used,
        );
        Ok(receipt)
    }

    /// The joiner waits for the deposit event, checks the credited holdings
    /// against the funding agreement and countersigns at turn 3.
    ///
    /// The wait is bounded: expiry surfaces as the retryable
    /// [SwapError::FundingTimeout] instead of hanging the leg.
    pub fn await_funding<L: Ledger>(
        self,
        ledger: &L,
        joiner: &Actor,
        timeout: Duration,
    ) -> Result<FundedLeg, SwapError> {
        let channel_id = self.channel_id();
        if joiner.address() != self.pre_fund0.state.channel().joiner() {
            return Err(SwapError::violation(
                channel_id,
                3,
                "only the joiner acknowledges funding",
            ));
        }

        ledger
            .wait_for_deposit(channel_id, timeout)
            .map_err(|e| match e {
                LedgerError::EventTimeout { .. } => SwapError::FundingTimeout {
                    channel: channel_id,
                    waited: timeout,
                },
                source => SwapError::LedgerSubmission {
                    channel: channel_id,
                    context: "observing the deposit event",
                    source,
                },
            })?;

        let held = ledger.holdings(channel_id);
        if held < self.params.amount {
            return Err(SwapError::violation(
                channel_id,
                3,
                format!(
                    "deposit of {held} is below the {} committed at turn 0",
                    self.params.amount
                ),
            ));
        }

        let post_fund3 = joiner.sign(&self.pre_fund1.state.advance().advance());
        info!(
            "{} sees the deposit on channel {:?} and signs PostFund3",
            joiner.name(),
            channel_id,
        );

        Ok(FundedLeg {
            params: self.params,
            pre_fund0: self.pre_fund0,
            pre_fund1: self.pre_fund1,
            post_fund2: self.post_fund2,
            post_fund3,
        })
    }
}

/// A leg whose deposit has been observed and acknowledged: the channel is
/// running and the hash lock can be resolved.
#[derive(Debug)]
pub struct FundedLeg {
    pub(super) params: LegParams,
    pub(super) pre_fund0: SignedState,
    pub(super) pre_fund1: SignedState,
    pub(super) post_fund2: Option<SignedState>,
    pub(super) post_fund3: SignedState,
}

impl FundedLeg {
    pub fn channel_id(&self) -> Hash {
        self.pre_fund0.state.channel_id()
    }

    pub fn initial_state(&self) -> &ChannelState {
        &self.pre_fund0.state
    }

    pub fn params(&self) -> &LegParams {
        &self.params
    }

    /// The pre-fund round as both parties signed it. This is the pair the
    /// joiner can challenge with, having never seen PostFund2.
    pub fn pre_fund_pair(&self) -> (SignedState, SignedState) {
        (self.pre_fund0.clone(), self.pre_fund1.clone())
    }

    /// The hash commitment this leg was proposed with.
    pub fn commitment(&self) -> Result<Hash, SwapError> {
        Ok(HashLockedSwapData::decode(&self.pre_fund0.state.app_data)?.h)
    }

    /// The latest fully-signed consecutive round, suitable for a challenge
    /// when the counterparty stops cooperating.
    pub fn latest_supported_pair(&self) -> Result<(SignedState, SignedState), SwapError> {
        let post_fund2 = self.post_fund2.clone().ok_or_else(|| {
            SwapError::violation(
                self.channel_id(),
                2,
                "no local PostFund2 signature; only the proposer can challenge from here",
            )
        })?;
        Ok((post_fund2, self.post_fund3.clone()))
    }
}
