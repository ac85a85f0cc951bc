//! Common types for the circuit engine abstraction.

use crate::error::CodecError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;

/// Name of a simulated participant.
///
/// Actors carry no identity of their own; they are registry keys that pair
/// a name with a private state.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(String);

impl Actor {
    /// Creates an actor from any string-like name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the actor name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Actor {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Actor {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for Actor {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Defines a 32-byte key type that serializes as lowercase hex.
///
/// Hex strings keep the keys usable as JSON map keys in raw ledger state.
macro_rules! hex_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            /// Wraps raw key bytes.
            pub fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Returns the raw key bytes.
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Returns the full hex encoding.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parses a 64-character hex string.
            pub fn from_hex(s: &str) -> Result<Self, CodecError> {
                let bytes = hex::decode(s).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
                let bytes: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
                    CodecError::InvalidHex(format!("expected 32 bytes, got {}", v.len()))
                })?;
                Ok(Self(bytes))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                // Show first 8 chars for readability
                write!(f, "{}", &self.to_hex()[..8])
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_key!(
    /// Public key presented as the calling identity of a circuit call.
    CoinPublicKey
);

hex_key!(
    /// Address of the deployed contract instance.
    ContractAddress
);

/// Raw, codec-level contract state.
///
/// Backed by a JSON value whose objects are ordered maps, so two equal
/// typed ledgers always encode to identical raw state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateValue(serde_json::Value);

impl StateValue {
    /// Encodes a typed value into raw state.
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Self, CodecError> {
        serde_json::to_value(value)
            .map(Self)
            .map_err(|e| CodecError::Encode(e.to_string()))
    }

    /// Decodes raw state into a typed value. Never mutates `self`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        T::deserialize(&self.0).map_err(|e| CodecError::Decode(e.to_string()))
    }

    /// Returns the underlying JSON value.
    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for StateValue {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}
