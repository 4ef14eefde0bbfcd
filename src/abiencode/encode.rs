//! Slot-based ABI encoding of the value shapes this protocol puts on a wire:
//! channel parts, outcome lists and the hash-lock tuple.
//!
//! Values are described as a [Token] tree and laid out with the standard
//! head/tail scheme: static values occupy their slots inline, dynamic values
//! leave a byte offset in the head and append their content to the tail.

use super::types::{Address, Hash, U256};

/// Width of one encoded slot in bytes.
pub const SLOT: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Uint(U256),
    Bool(bool),
    Address(Address),
    /// `bytes32`
    FixedBytes(Hash),
    /// `bytes`, dynamic
    Bytes(Vec<u8>),
    /// Tuple; dynamic iff any member is dynamic
    Tuple(Vec<Token>),
    /// `T[]`, dynamic
    Array(Vec<Token>),
}

impl Token {
    fn is_dynamic(&self) -> bool {
        match self {
            Token::Bytes(_) | Token::Array(_) => true,
            Token::Tuple(items) => items.iter().any(Token::is_dynamic),
            _ => false,
        }
    }

    /// Number of bytes this token occupies in its enclosing head.
    fn head_len(&self) -> usize {
        match self {
            Token::Tuple(items) if !self.is_dynamic() => {
                items.iter().map(Token::head_len).sum()
            }
            _ => SLOT,
        }
    }
}

/// Encode a token sequence the way `abi.encode` lays out an argument list.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_size: usize = tokens.iter().map(Token::head_len).sum();
    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for token in tokens {
        if token.is_dynamic() {
            push_uint(&mut head, U256::from(head_size + tail.len()));
            encode_tail(token, &mut tail);
        } else {
            encode_static(token, &mut head);
        }
    }

    head.extend_from_slice(&tail);
    head
}

fn encode_static(token: &Token, out: &mut Vec<u8>) {
    match token {
        Token::Uint(v) => push_uint(out, *v),
        Token::Bool(b) => push_uint(out, U256::from(*b as u8)),
        Token::Address(a) => {
            // Addresses are right-aligned in their slot, like uints.
            let mut slot = [0u8; SLOT];
            slot[SLOT - 20..].copy_from_slice(&a.0);
            out.extend_from_slice(&slot);
        }
        Token::FixedBytes(h) => out.extend_from_slice(&h.0),
        Token::Tuple(items) => {
            debug_assert!(!token.is_dynamic());
            for item in items {
                encode_static(item, out);
            }
        }
        Token::Bytes(_) | Token::Array(_) => unreachable!("dynamic token in static position"),
    }
}

fn encode_tail(token: &Token, out: &mut Vec<u8>) {
    match token {
        Token::Bytes(data) => {
            push_uint(out, U256::from(data.len()));
            out.extend_from_slice(data);
            let rem = data.len() % SLOT;
            if rem != 0 {
                out.extend_from_slice(&[0u8; SLOT][rem..]);
            }
        }
        Token::Array(items) => {
            push_uint(out, U256::from(items.len()));
            out.extend_from_slice(&encode(items));
        }
        Token::Tuple(items) => out.extend_from_slice(&encode(items)),
        _ => unreachable!("static token in tail position"),
    }
}

fn push_uint(out: &mut Vec<u8>, v: U256) {
    out.extend_from_slice(&v.to_slot());
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex::FromHex;

    /// Encode `tokens` and compare against a whitespace-padded hex dump of
    /// the expected slots.
    pub fn encode_and_compare(tokens: &[Token], expected: &str) {
        let expected: String = expected.split_whitespace().collect();
        let expected = Vec::from_hex(expected).unwrap();
        assert_eq!(encode(tokens), expected);
    }

    #[test]
    fn static_words() {
        let addr = Address(<[u8; 20]>::from_hex("5B38Da6a701c568545dCfcB03FcB875f56beddC4").unwrap());
        encode_and_compare(
            &[
                Token::Uint(0x2222.into()),
                Token::Bool(true),
                Token::Address(addr),
            ],
            "
            0000000000000000000000000000000000000000000000000000000000002222
            0000000000000000000000000000000000000000000000000000000000000001
            0000000000000000000000005b38da6a701c568545dcfcb03fcb875f56beddc4
            ",
        );
    }

    #[test]
    fn dynamic_bytes_tuple() {
        // tuple(bytes32 h, bytes preImage) with a 4-byte pre-image, the exact
        // shape of the hash-lock app data.
        let h = Hash(*b"11111111111111111111111111111111");
        encode_and_compare(
            &[Token::Tuple(vec![
                Token::FixedBytes(h),
                Token::Bytes(vec![0xde, 0xad, 0xbe, 0xef]),
            ])],
            "
            0000000000000000000000000000000000000000000000000000000000000020
            3131313131313131313131313131313131313131313131313131313131313131
            0000000000000000000000000000000000000000000000000000000000000040
            0000000000000000000000000000000000000000000000000000000000000004
            deadbeef00000000000000000000000000000000000000000000000000000000
            ",
        );
    }

    #[test]
    fn empty_bytes_occupy_one_slot() {
        encode_and_compare(
            &[Token::Tuple(vec![
                Token::FixedBytes(Hash::default()),
                Token::Bytes(vec![]),
            ])],
            "
            0000000000000000000000000000000000000000000000000000000000000020
            0000000000000000000000000000000000000000000000000000000000000000
            0000000000000000000000000000000000000000000000000000000000000040
            0000000000000000000000000000000000000000000000000000000000000000
            ",
        );
    }

    #[test]
    fn array_of_static_tuples() {
        // The outcome wire shape: tuple(bytes32 destination, uint256 amount)[]
        let dest = |b: u8| Token::FixedBytes(Hash([b; 32]));
        encode_and_compare(
            &[Token::Array(vec![
                Token::Tuple(vec![dest(0xaa), Token::Uint(2.into())]),
                Token::Tuple(vec![dest(0xbb), Token::Uint(0.into())]),
            ])],
            "
            0000000000000000000000000000000000000000000000000000000000000020
            0000000000000000000000000000000000000000000000000000000000000002
            aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa
            0000000000000000000000000000000000000000000000000000000000000002
            bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb
            0000000000000000000000000000000000000000000000000000000000000000
            ",
        );
    }

    #[test]
    fn static_tuples_flatten_into_the_head() {
        encode_and_compare(
            &[
                Token::Tuple(vec![Token::Uint(1.into()), Token::Uint(2.into())]),
                Token::Uint(3.into()),
            ],
            "
            0000000000000000000000000000000000000000000000000000000000000001
            0000000000000000000000000000000000000000000000000000000000000002
            0000000000000000000000000000000000000000000000000000000000000003
            ",
        );
    }
}
