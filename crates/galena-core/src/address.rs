// crates/galena-core/src/address.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a miner or worker on the Galena network.
///
/// Two forms:
/// - **Id**: shorthand for an actor already registered in the chain's actor
///   table. Cheap to embed in digests, carries no key material.
/// - **Key**: embeds an ed25519 public key directly, so that ticket
///   validation can recover the verifying key from the address alone without
///   a state lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Address {
    /// Actor-table ID address.
    Id(u64),
    /// Key address embedding an ed25519 public key.
    Key([u8; 32]),
}

impl Address {
    /// Create an ID address for the given actor id.
    pub fn new_id(id: u64) -> Self {
        Address::Id(id)
    }

    /// Create a key address embedding the given ed25519 public key.
    pub fn from_public_key(public_key: [u8; 32]) -> Self {
        Address::Key(public_key)
    }

    /// The embedded public key, if this is a key address.
    pub fn public_key(&self) -> Option<&[u8; 32]> {
        match self {
            Address::Id(_) => None,
            Address::Key(pk) => Some(pk),
        }
    }

    /// Canonical bytes for binding this address into a digest.
    ///
    /// A one-byte form tag precedes the payload so an ID address can never
    /// collide with a key address.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Address::Id(id) => {
                let mut out = Vec::with_capacity(9);
                out.push(0u8);
                out.extend_from_slice(&id.to_be_bytes());
                out
            }
            Address::Key(pk) => {
                let mut out = Vec::with_capacity(33);
                out.push(1u8);
                out.extend_from_slice(pk);
                out
            }
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Id(id) => write!(f, "gl0{}", id),
            Address::Key(pk) => write!(f, "gl1{}", hex::encode(pk)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_forms() {
        assert_eq!(Address::new_id(42).to_string(), "gl042");

        let addr = Address::from_public_key([0xab; 32]);
        let s = addr.to_string();
        assert!(s.starts_with("gl1ab"));
        assert_eq!(s.len(), 3 + 64);
    }

    #[test]
    fn test_public_key_accessor() {
        assert!(Address::new_id(1).public_key().is_none());
        assert_eq!(
            Address::from_public_key([7u8; 32]).public_key(),
            Some(&[7u8; 32])
        );
    }

    #[test]
    fn test_digest_bytes_disambiguate_forms() {
        // An ID address must never produce the same digest bytes as a key
        // address, whatever the payload.
        let id = Address::new_id(0);
        let key = Address::from_public_key([0u8; 32]);
        assert_ne!(id.to_bytes(), key.to_bytes());
        assert_eq!(id.to_bytes()[0], 0u8);
        assert_eq!(key.to_bytes()[0], 1u8);
    }
}
