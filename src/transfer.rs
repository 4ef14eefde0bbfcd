//! Vector-style conditional transfers: individually defundable hash-locked
//! balances anchored to a channel through a merkle root.

use crate::abiencode::{self, encode, keccak, types::{Address, Bytes32, Hash, U256}, Token, SLOT};
use serde::{Deserialize, Serialize};

/// One outstanding hash-locked transfer inside a channel.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConditionalTransfer {
    pub channel_id: Hash,
    pub initiator: Address,
    pub responder: Address,
    /// Destination credited when the transfer resolves.
    pub beneficiary: Bytes32,
    pub amount: U256,
    /// SHA-256 commitment the resolver has to open.
    pub lock_hash: Hash,
    /// Seconds until the transfer can be cancelled instead of resolved.
    pub timeout: u64,
}

impl ConditionalTransfer {
    /// ABI encoding of the transfer state, submitted on defund.
    pub fn encode_state(&self) -> Vec<u8> {
        encode(&[
            Token::FixedBytes(self.channel_id),
            Token::Address(self.initiator),
            Token::Address(self.responder),
            Token::FixedBytes(Hash(self.beneficiary.0)),
            Token::Uint(self.amount),
            Token::FixedBytes(self.lock_hash),
            Token::Uint(self.timeout.into()),
        ])
    }

    /// Transfer identity: the hash of the encoded state. Doubles as the
    /// leaf in the channel's transfer-set merkle tree and as the message
    /// the responder counter-signs.
    pub fn hash(&self) -> Hash {
        keccak(&self.encode_state())
    }
}

/// The data resolving a conditional transfer: the lock's pre-image.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransferResolver {
    pub pre_image: Vec<u8>,
}

impl TransferResolver {
    /// ABI encoding of `tuple(bytes preImage)`.
    pub fn encode(&self) -> Vec<u8> {
        encode(&[Token::Tuple(vec![Token::Bytes(self.pre_image.clone())])])
    }

    pub fn decode(data: &[u8]) -> abiencode::Result<Self> {
        let tuple_offset = read_usize_slot(data, 0)?;
        if tuple_offset != SLOT {
            return Err(abiencode::Error::InvalidOffset(tuple_offset));
        }
        let bytes_offset = read_usize_slot(data, 1)?;
        if bytes_offset != SLOT {
            return Err(abiencode::Error::InvalidOffset(bytes_offset));
        }
        let len = read_usize_slot(data, 2)?;
        let payload_start = 3 * SLOT;
        if data.len() < payload_start + len {
            return Err(abiencode::Error::InvalidLength(len));
        }
        Ok(TransferResolver {
            pre_image: data[payload_start..payload_start + len].to_vec(),
        })
    }
}

fn read_usize_slot(data: &[u8], index: usize) -> abiencode::Result<usize> {
    let start = index * SLOT;
    let slot: [u8; 32] = data
        .get(start..start + SLOT)
        .map(|s| s.try_into().unwrap())
        .ok_or(abiencode::Error::UnexpectedEnd(index))?;
    if slot[..SLOT - 8].iter().any(|&b| b != 0) {
        return Err(abiencode::Error::InvalidLength(usize::MAX));
    }
    Ok(u64::from_be_bytes(slot[SLOT - 8..].try_into().unwrap()) as usize)
}

/// Root of the transfer-set tree. Nodes hash their children in sorted
/// order, so proofs carry no direction bits. A single leaf is its own root;
/// an odd node on a level is promoted unchanged.
pub fn merkle_root(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return Hash::default();
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [a, b] => hash_pair(*a, *b),
                [a] => *a,
                _ => unreachable!(),
            })
            .collect();
    }
    level[0]
}

/// Sibling path for `leaves[index]`, bottom-up.
pub fn merkle_proof(leaves: &[Hash], index: usize) -> Vec<Hash> {
    assert!(index < leaves.len());
    let mut proof = Vec::new();
    let mut level = leaves.to_vec();
    let mut pos = index;
    while level.len() > 1 {
        let sibling = if pos % 2 == 0 { pos + 1 } else { pos - 1 };
        if sibling < level.len() {
            proof.push(level[sibling]);
        }
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [a, b] => hash_pair(*a, *b),
                [a] => *a,
                _ => unreachable!(),
            })
            .collect();
        pos /= 2;
    }
    proof
}

pub fn verify_proof(root: Hash, leaf: Hash, proof: &[Hash]) -> bool {
    proof.iter().fold(leaf, |acc, sibling| hash_pair(acc, *sibling)) == root
}

fn hash_pair(a: Hash, b: Hash) -> Hash {
    let (lo, hi) = if a.0 <= b.0 { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(&lo.0);
    buf[32..].copy_from_slice(&hi.0);
    keccak(&buf)
}
