use thiserror::Error;

/// Protocol-wide error types for the Galena Protocol.
#[derive(Debug, Error)]
pub enum GalenaError {
    /// Chain clock misconfiguration (invalid genesis time or epoch duration).
    /// Fatal at construction; never produced at runtime.
    #[error("Clock error: {0}")]
    Clock(String),

    /// The chain head could not be fetched this tick. Transient; the
    /// scheduler logs it and retries at the next epoch boundary.
    #[error("Head unavailable: {0}")]
    HeadUnavailable(String),

    /// The signer refused or failed to produce a proof, e.g. the worker
    /// address is not a key it controls.
    #[error("Signing error: {0}")]
    Signing(String),

    /// A ticket's VRF proof does not verify against the claimed tuple.
    #[error("Invalid ticket: {0}")]
    InvalidTicket(String),

    /// Ticket validation inputs are structurally inconsistent (empty proof,
    /// wrong proof length, address without an embedded key).
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The randomness beacon could not supply an entry for the round.
    #[error("Beacon error: {0}")]
    Beacon(String),

    /// Cryptographic error (key decoding, signature verification plumbing).
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid state transition (scheduler or daemon lifecycle).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Configuration file could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for GalenaError {
    fn from(e: serde_json::Error) -> Self {
        GalenaError::Serialization(e.to_string())
    }
}

impl From<ed25519_dalek::SignatureError> for GalenaError {
    fn from(e: ed25519_dalek::SignatureError) -> Self {
        GalenaError::Crypto(e.to_string())
    }
}
