//! Error types for DKG and threshold signing operations

use crate::ParticipantIndex;
use thiserror::Error;

/// Result type alias for DKG operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during DKG and threshold signing
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid threshold/party configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The secure random source failed
    #[error("Randomness error: {0}")]
    Randomness(String),

    /// Commitment or share failed its consistency check
    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    /// A signature share does not verify under its issuer's public-key share
    #[error("Invalid signature share from participant {index}")]
    InvalidSignatureShare { index: ParticipantIndex },

    /// Group signature does not verify under the group public key
    #[error("Invalid signature")]
    InvalidSignature,

    /// Threshold requirements not met
    #[error("Threshold not met: required {required}, got {actual}")]
    ThresholdNotMet { required: usize, actual: usize },

    /// Malformed or insufficient input to Lagrange reconstruction
    #[error("Reconstruction failed: {0}")]
    Reconstruction(#[from] ReconstructionError),

    /// Externally supplied coordinates are not a valid group element
    #[error("Point decoding error: {0}")]
    PointDecoding(String),

    /// Externally supplied scalar text could not be parsed
    #[error("Scalar decoding error: {0}")]
    ScalarDecoding(String),

    /// Participant index outside `1..=n`
    #[error("Invalid participant index: {0}")]
    InvalidParticipant(ParticipantIndex),

    /// Commitments or shares still outstanding
    #[error("Missing contributions from participants {0:?}")]
    MissingContributions(Vec<ParticipantIndex>),

    /// Operation not permitted in the current protocol phase
    #[error("Unexpected phase: expected {expected}, found {found}")]
    UnexpectedPhase {
        expected: &'static str,
        found: &'static str,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Network/relay error
    #[error("Relay error: {0}")]
    Relay(String),
}

/// Input errors for Lagrange interpolation at zero
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconstructionError {
    #[error("at least 2 shares are required, got {0}")]
    InsufficientShares(usize),

    #[error("{shares} shares supplied with {indices} indices")]
    LengthMismatch { shares: usize, indices: usize },

    #[error("participant index 0 is reserved for the secret")]
    ZeroIndex,

    #[error("participant index {0} supplied twice")]
    DuplicateIndex(ParticipantIndex),

    #[error("Lagrange denominator is not invertible")]
    NonInvertible,
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
