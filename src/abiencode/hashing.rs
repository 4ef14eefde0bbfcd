use super::types::Hash;
use sha3::{Digest, Keccak256};

/// Keccak-256 digest, the hash the adjudicator contracts use for channel
/// ids, state hashes and merkle nodes.
pub fn keccak(data: &[u8]) -> Hash {
    Hash(Keccak256::digest(data).into())
}
