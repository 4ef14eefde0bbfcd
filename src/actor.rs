//! A swap participant: identity plus the capabilities the protocol needs
//! from them (signing states, checking balances). Presentation concerns
//! stay outside; the engine reports through `log` instead.

use crate::abiencode::types::{Address, Bytes32, U256};
use crate::channel::{address_destination, sign_state, ChannelState, SignedState};
use crate::ledger::Ledger;
use crate::sig::{self, Signer};

#[derive(Debug)]
pub struct Actor {
    name: String,
    signer: Signer,
}

impl Actor {
    pub fn new(name: impl Into<String>, signer: Signer) -> Self {
        Actor {
            name: name.into(),
            signer,
        }
    }

    /// Actor with a freshly generated key.
    pub fn random<R: rand::Rng + rand::CryptoRng>(name: impl Into<String>, rng: &mut R) -> Self {
        Actor::new(name, Signer::new(rng))
    }

    /// Actor for a known private key, used for deterministic tests.
    pub fn from_key(name: impl Into<String>, private_key: &[u8; 32]) -> Result<Self, sig::Error> {
        Ok(Actor::new(name, Signer::from_bytes(private_key)?))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// This actor's 32-byte allocation destination.
    pub fn destination(&self) -> Bytes32 {
        address_destination(self.address())
    }

    pub fn sign(&self, state: &ChannelState) -> SignedState {
        sign_state(&self.signer, state)
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    pub fn balance_on(&self, ledger: &dyn Ledger) -> U256 {
        ledger.balance_of(self.destination())
    }
}
