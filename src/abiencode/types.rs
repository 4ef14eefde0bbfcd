//! Newtypes for the Solidity-facing values used throughout the protocol.

use core::fmt::Debug;

use rand::{distributions::Standard, prelude::Distribution};
use serde::{de, Deserialize, Serialize};
use uint::construct_uint;

macro_rules! impl_hex_debug {
    ($T:ident) => {
        impl Debug for $T {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str("0x")?;
                for b in self.0 {
                    f.write_fmt(format_args!("{:02x}", b))?;
                }
                Ok(())
            }
        }
    };
}

macro_rules! bytes_newtype {
    ( $T:ident, $N:literal ) => {
        #[derive(PartialEq, Eq, Hash, Copy, Clone)]
        pub struct $T(pub [u8; $N]);

        impl Serialize for $T {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_bytes(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $T {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let bytes: &[u8] = de::Deserialize::deserialize(deserializer)?;
                let bytes: [u8; $N] = bytes
                    .try_into()
                    .map_err(|_| de::Error::invalid_length(bytes.len(), &stringify!($N)))?;
                Ok($T(bytes))
            }
        }

        impl Distribution<$T> for Standard {
            fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> $T {
                let mut arr = [0u8; $N];
                rng.fill(&mut arr[..]);
                $T(arr)
            }
        }

        impl Default for $T {
            fn default() -> Self {
                Self([0; $N])
            }
        }

        impl_hex_debug!($T);
    };
}

bytes_newtype!(Bytes32, 32);
bytes_newtype!(Hash, 32);
bytes_newtype!(Signature, 65);

impl Signature {
    pub fn new(rs: &[u8; 64], v: u8) -> Self {
        let mut sig: Signature = Signature([0; 65]);
        sig.0[..64].copy_from_slice(rs);
        sig.0[64] = v;
        sig
    }
}

// primitive_types::U256 and ethereum_types::U256 both serde-serialize to hex
// strings, which does not round-trip through a byte-oriented format. Both are
// thin wrappers around construct_uint anyway, so we construct our own and
// serialize it as the 32 big-endian bytes it occupies in an ABI slot.
construct_uint! {
    pub struct U256(4);
}

impl U256 {
    pub fn to_slot(self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        self.to_big_endian(&mut bytes);
        bytes
    }
}

impl Serialize for U256 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.to_slot())
    }
}

impl<'de> Deserialize<'de> for U256 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bytes: &[u8] = de::Deserialize::deserialize(deserializer)?;
        if bytes.len() != 32 {
            return Err(de::Error::invalid_length(bytes.len(), &"32"));
        }
        Ok(U256::from_big_endian(bytes))
    }
}

impl Distribution<U256> for Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> U256 {
        let buf: [u8; 32] = rng.gen();
        U256::from_big_endian(&buf)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Address(pub [u8; 20]);
impl_hex_debug!(Address);

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bytes: &[u8] = de::Deserialize::deserialize(deserializer)?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| de::Error::invalid_length(bytes.len(), &"20"))?;
        Ok(Address(bytes))
    }
}

impl Distribution<Address> for Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Address {
        Address(rng.gen())
    }
}
