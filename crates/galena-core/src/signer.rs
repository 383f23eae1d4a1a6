// crates/galena-core/src/signer.rs
//
// The signing capability used to derive VRF proofs, and its keystore-backed
// implementation.
//
// Ticket creation needs a private signing capability; ticket validation only
// needs public keys. Keeping the capability behind a trait lets tests inject
// a signer with a known key table and lets a remote wallet stand behind the
// same interface.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::address::Address;
use crate::block::VrfProof;
use crate::crypto::Keypair;
use crate::error::GalenaError;

/// Capability to produce a verifiable proof over a byte payload on behalf of
/// an address.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Sign `payload` with the key controlling `addr`.
    ///
    /// Fails with `GalenaError::Signing` when `addr` is not a key this
    /// signer controls.
    async fn sign_bytes(&self, addr: &Address, payload: &[u8]) -> Result<VrfProof, GalenaError>;
}

/// A signer backed by an in-memory table of ed25519 keypairs.
///
/// Serves as the node's worker-key signer in the daemon and as the mock
/// signer in tests; both only ever need a small, known key table.
pub struct KeystoreSigner {
    keys: HashMap<Address, Keypair>,
}

impl KeystoreSigner {
    /// Create an empty keystore.
    pub fn new() -> Self {
        KeystoreSigner {
            keys: HashMap::new(),
        }
    }

    /// Add a keypair to the keystore, returning its key address.
    pub fn add_key(&mut self, keypair: Keypair) -> Address {
        let addr = keypair.address();
        self.keys.insert(addr.clone(), keypair);
        addr
    }

    /// Addresses of all keys in the keystore.
    pub fn addresses(&self) -> Vec<Address> {
        self.keys.keys().cloned().collect()
    }
}

impl Default for KeystoreSigner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Signer for KeystoreSigner {
    async fn sign_bytes(&self, addr: &Address, payload: &[u8]) -> Result<VrfProof, GalenaError> {
        let keypair = self.keys.get(addr).ok_or_else(|| {
            GalenaError::Signing(format!("address {} is not controlled by this signer", addr))
        })?;
        Ok(keypair.sign(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto;

    #[tokio::test]
    async fn test_sign_with_known_address() {
        let mut signer = KeystoreSigner::new();
        let keypair = Keypair::generate();
        let pubkey = keypair.public_key_bytes();
        let addr = signer.add_key(keypair);

        let proof = signer.sign_bytes(&addr, b"payload").await.unwrap();
        assert!(crypto::verify_proof(&pubkey, b"payload", &proof).unwrap());
    }

    #[tokio::test]
    async fn test_unknown_address_fails_distinguishably() {
        let signer = KeystoreSigner::new();
        let stranger = Keypair::generate().address();

        let result = signer.sign_bytes(&stranger, b"payload").await;
        assert!(matches!(result, Err(GalenaError::Signing(_))));
    }
}
