use super::{ChannelState, PartIdx, PARTICIPANTS};
use crate::abiencode::types::{Address, Signature};
use crate::sig::{self, recover_signer, Signer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A channel state together with one participant's signature over its hash.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SignedState {
    pub state: ChannelState,
    pub sig: Signature,
}

impl SignedState {
    /// Recover the address that signed this state.
    pub fn recover(&self) -> Result<Address, sig::Error> {
        recover_signer(self.state.hash(), self.sig)
    }

    /// Recover the signer and resolve them to a participant index.
    pub fn signer_idx(&self) -> Result<PartIdx, SupportError> {
        let addr = self.recover()?;
        self.state
            .channel()
            .part_idx(addr)
            .ok_or(SupportError::NotAParticipant(addr))
    }
}

pub fn sign_state(signer: &Signer, state: &ChannelState) -> SignedState {
    SignedState {
        state: state.clone(),
        sig: signer.sign_eth(state.hash()),
    }
}

/// The participant expected to produce a given funding-phase turn.
///
/// The proposer moves on even turns, the joiner on odd turns. The unlock
/// turn (4) is exempt: it is signed by whichever participant holds the
/// secret, so callers validate it by recovery instead.
pub fn turn_taker(turn_num: u64) -> PartIdx {
    (turn_num % 2) as PartIdx
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SupportError {
    #[error("signer {0:?} is not a channel participant")]
    NotAParticipant(Address),
    #[error("participant {0} already signed this state")]
    AlreadySigned(PartIdx),
    #[error("missing signature from participant {0}")]
    MissingSignature(PartIdx),
    #[error("signature is for a different state")]
    WrongState,
    #[error("signature recovery failed: {0}")]
    Recovery(String),
}

impl From<sig::Error> for SupportError {
    fn from(e: sig::Error) -> Self {
        SupportError::Recovery(e.to_string())
    }
}

/// Collects participant signatures for one state until it is supported.
///
/// A state is supported once every participant's signature has been
/// verified against the state hash.
#[derive(Debug, Clone)]
pub struct PendingSupport {
    state: ChannelState,
    sigs: [Option<Signature>; PARTICIPANTS],
}

impl PendingSupport {
    pub fn new(state: ChannelState) -> Self {
        PendingSupport {
            state,
            sigs: [None; PARTICIPANTS],
        }
    }

    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    /// Verify and record one signature, returning who signed.
    pub fn add(&mut self, signed: &SignedState) -> Result<PartIdx, SupportError> {
        if !signed.state.same_round(&self.state) || signed.state.hash() != self.state.hash() {
            return Err(SupportError::WrongState);
        }
        let part_idx = signed.signer_idx()?;
        match self.sigs[part_idx] {
            Some(_) => Err(SupportError::AlreadySigned(part_idx)),
            None => {
                self.sigs[part_idx] = Some(signed.sig);
                Ok(part_idx)
            }
        }
    }

    pub fn is_supported(&self) -> bool {
        self.sigs.iter().all(Option::is_some)
    }

    /// Finish collecting. All signatures have been verified in [add], this
    /// only checks completeness and packs them into an array.
    pub fn finish(self) -> Result<SupportedState, SupportError> {
        let mut sigs = [Signature::default(); PARTICIPANTS];
        for (part_idx, sig) in self.sigs.iter().enumerate() {
            sigs[part_idx] = sig.ok_or(SupportError::MissingSignature(part_idx))?;
        }
        Ok(SupportedState {
            state: self.state,
            sigs,
        })
    }
}

/// A state signed by every participant, ready for on-chain submission.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SupportedState {
    pub state: ChannelState,
    pub sigs: [Signature; PARTICIPANTS],
}
