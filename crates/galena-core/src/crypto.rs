// crates/galena-core/src/crypto.rs

use ed25519_dalek::{Signer as DalekSigner, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::address::Address;
use crate::block::VrfProof;
use crate::error::GalenaError;

/// An ed25519 keypair used to produce and check VRF proofs.
pub struct Keypair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

impl Keypair {
    /// Generate a new random ed25519 keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        Keypair {
            signing_key,
            verifying_key,
        }
    }

    /// Reconstruct a keypair from 32 secret key bytes.
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(secret);
        let verifying_key = signing_key.verifying_key();
        Keypair {
            signing_key,
            verifying_key,
        }
    }

    /// Get the public key bytes (32 bytes).
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// The key address embedding this keypair's public key.
    pub fn address(&self) -> Address {
        Address::from_public_key(self.public_key_bytes())
    }

    /// Sign a message, producing a VRF proof.
    pub fn sign(&self, message: &[u8]) -> VrfProof {
        let signature = self.signing_key.sign(message);
        VrfProof::new(signature.to_bytes().to_vec())
    }
}

/// Verify a VRF proof against a message and the prover's public key.
///
/// Returns `true` if the proof is a valid ed25519 signature over `message`
/// by the holder of `public_key_bytes`.
pub fn verify_proof(
    public_key_bytes: &[u8; 32],
    message: &[u8],
    proof: &VrfProof,
) -> Result<bool, GalenaError> {
    let verifying_key = VerifyingKey::from_bytes(public_key_bytes)
        .map_err(|e| GalenaError::Crypto(format!("Invalid public key: {}", e)))?;

    let signature_array: [u8; 64] = proof
        .as_bytes()
        .try_into()
        .map_err(|_| GalenaError::Crypto("VRF proof must be exactly 64 bytes".to_string()))?;

    let signature = ed25519_dalek::Signature::from_bytes(&signature_array);

    match verifying_key.verify(message, &signature) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// Compute SHA-256 hash of the given bytes.
///
/// Returns a 32-byte hash.
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}
