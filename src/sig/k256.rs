//! Signer using the k256 Rust crate (implementation of ecdsa in Rust).

use crate::abiencode::types::{Address, Hash, Signature};
use k256::{
    ecdsa::{
        recoverable,
        signature::{hazmat::PrehashSigner, Signature as k256Signature},
        SigningKey, VerifyingKey,
    },
    elliptic_curve::sec1::ToEncodedPoint,
};
use sha3::{Digest, Keccak256};

use super::hash_to_eth_signed_msg_hash;

pub use k256::ecdsa::Error;

#[derive(Debug)]
pub struct Signer {
    key: SigningKey,
    addr: Address,
}

impl From<VerifyingKey> for Address {
    fn from(key: VerifyingKey) -> Self {
        // Convert the key into an EncodedPoint (on the curve), which has the
        // data we need in bytes [1..]. Then convert that into an array and
        // unwrap. This panics if the bytes representation of EncodedPoint is
        // not 65 bytes, which is unlikely to change in the dependency. If it
        // does we have bigger problems, given that its contents/layout will
        // likely change, too if the length changes.
        let pk_bytes: [u8; 65] = key.to_encoded_point(false).as_bytes().try_into().unwrap();

        // Throw away the first byte, which is not part of the public key. It
        // is added by the uncompressed-point encoding.
        let hash: [u8; 32] = Keccak256::digest(&pk_bytes[1..]).into();

        let mut addr = Address([0; 20]);
        addr.0.copy_from_slice(&hash[32 - 20..]);
        addr
    }
}

impl Signer {
    pub fn new<R: rand::Rng + rand::CryptoRng>(rng: &mut R) -> Self {
        let key = SigningKey::random(rng);
        let addr = key.verifying_key().into();
        Self { key, addr }
    }

    /// Signer for a known private key, used for deterministic test actors.
    pub fn from_bytes(private_key: &[u8; 32]) -> Result<Self, Error> {
        let key = SigningKey::from_bytes(private_key)?;
        let addr = key.verifying_key().into();
        Ok(Self { key, addr })
    }

    pub fn address(&self) -> Address {
        self.addr
    }

    pub fn sign_eth(&self, msg: Hash) -> Signature {
        // "\x19Ethereum Signed Message:\n32" format
        let hash = hash_to_eth_signed_msg_hash(msg);

        let sig: recoverable::Signature = self.key.sign_prehash(&hash.0).unwrap();

        // The recoverable signature is already 65 bytes of r, s and v in this
        // order, but v has to be shifted by 27 to be valid in the EVM.
        let mut sig_bytes: [u8; 65] = sig.as_bytes().try_into().expect(
            "Unreachable: Signature size doesn't match, something big must have changed in the dependency",
        );
        debug_assert!(sig_bytes[32] & 0x80 == 0);
        sig_bytes[64] += 27;

        Signature(sig_bytes)
    }
}

/// Recover the address that produced `eth_sig` over `msg`.
///
/// Free-standing because verification needs no private key: every
/// participant recovers the counterparty's address from the signature alone.
pub fn recover_signer(msg: Hash, eth_sig: Signature) -> Result<Address, Error> {
    // "\x19Ethereum Signed Message:\n32" format
    let hash = hash_to_eth_signed_msg_hash(msg);

    // Undo adding the 27, to go back to the format expected below
    let mut sig_bytes: [u8; 65] = eth_sig.0;
    sig_bytes[64] = sig_bytes[64].wrapping_sub(27);

    let sig = recoverable::Signature::from_bytes(&sig_bytes)?;

    let verifying_key = sig.recover_verifying_key_from_digest_bytes(&hash.0.into())?;
    Ok(verifying_key.into())
}
