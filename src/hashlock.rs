//! The hash-locked conditional payment: app data codec and the transition
//! rule the conditional-logic contract enforces.

use crate::abiencode::{self, encode, types::Hash, Token, SLOT};
use crate::channel::ChannelState;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// App data of a hash-locked swap channel: the commitment and, once
/// revealed, the pre-image that satisfies it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HashLockedSwapData {
    pub h: Hash,
    pub pre_image: Vec<u8>,
}

impl HashLockedSwapData {
    /// Pre-unlock form: commitment only, empty pre-image.
    pub fn commit(h: Hash) -> Self {
        HashLockedSwapData {
            h,
            pre_image: Vec::new(),
        }
    }

    /// Post-unlock form: the commitment together with its pre-image.
    pub fn reveal(h: Hash, pre_image: Vec<u8>) -> Self {
        HashLockedSwapData { h, pre_image }
    }

    pub fn is_revealed(&self) -> bool {
        !self.pre_image.is_empty()
    }

    /// ABI encoding of `tuple(bytes32 h, bytes preImage)`.
    pub fn encode(&self) -> Vec<u8> {
        encode(&[Token::Tuple(vec![
            Token::FixedBytes(self.h),
            Token::Bytes(self.pre_image.clone()),
        ])])
    }

    pub fn decode(data: &[u8]) -> abiencode::Result<Self> {
        let tuple_offset = read_usize_slot(data, 0)?;
        if tuple_offset != SLOT {
            return Err(abiencode::Error::InvalidOffset(tuple_offset));
        }
        let h = Hash(read_slot(data, 1)?);
        let bytes_offset = read_usize_slot(data, 2)?;
        if bytes_offset != 2 * SLOT {
            return Err(abiencode::Error::InvalidOffset(bytes_offset));
        }
        let len = read_usize_slot(data, 3)?;
        let payload_start = 4 * SLOT;
        if data.len() < payload_start + len {
            return Err(abiencode::Error::InvalidLength(len));
        }
        let pre_image = data[payload_start..payload_start + len].to_vec();

        let padded_len = (len + SLOT - 1) / SLOT * SLOT;
        let end = payload_start + padded_len;
        if data.len() < end {
            return Err(abiencode::Error::UnexpectedEnd(end / SLOT));
        }
        if data[payload_start + len..end].iter().any(|&b| b != 0) {
            return Err(abiencode::Error::NonZeroPadding);
        }
        if data.len() > end {
            return Err(abiencode::Error::TrailingData(data.len() - end));
        }

        Ok(HashLockedSwapData { h, pre_image })
    }
}

fn read_slot(data: &[u8], index: usize) -> abiencode::Result<[u8; 32]> {
    let start = index * SLOT;
    data.get(start..start + SLOT)
        .map(|s| s.try_into().unwrap())
        .ok_or(abiencode::Error::UnexpectedEnd(index))
}

fn read_usize_slot(data: &[u8], index: usize) -> abiencode::Result<usize> {
    let slot = read_slot(data, index)?;
    if slot[..SLOT - 8].iter().any(|&b| b != 0) {
        return Err(abiencode::Error::InvalidLength(usize::MAX));
    }
    Ok(u64::from_be_bytes(slot[SLOT - 8..].try_into().unwrap()) as usize)
}

/// The commitment for a secret: SHA-256, the digest the hash-lock contract
/// checks on-chain.
pub fn lock_hash(pre_image: &[u8]) -> Hash {
    Hash(Sha256::digest(pre_image).into())
}

/// The hash-lock transition rule between the channel's initial state and a
/// candidate unlock state.
///
/// A transition is valid when either nothing was revealed (commitment and
/// outcome unchanged), or the revealed pre-image hashes to the commitment of
/// the *initial* state and the outcome is the initial outcome swapped.
/// Returns `Ok(false)` for a well-formed but unsatisfied candidate, mirroring
/// the on-chain `validTransition` call.
pub fn valid_transition(from: &ChannelState, to: &ChannelState) -> abiencode::Result<bool> {
    let committed = HashLockedSwapData::decode(&from.app_data)?;
    let candidate = HashLockedSwapData::decode(&to.app_data)?;

    if !candidate.is_revealed() {
        return Ok(candidate.h == committed.h && to.outcome == from.outcome);
    }

    if lock_hash(&candidate.pre_image) != committed.h {
        return Ok(false);
    }
    match from.outcome.swap() {
        Ok(swapped) => Ok(to.outcome == swapped),
        Err(_) => Ok(false),
    }
}
