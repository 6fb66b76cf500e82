//! Core types for the DKG and threshold signing protocol

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::curve::PairingCurve;
use crate::encoding::{EncodedG2, EncodedScalar};
use crate::{Error, Result};

/// 1-based participant identifier; 0 is reserved for the shared secret.
pub type ParticipantIndex = u64;

/// Unique identifier for a session
pub type SessionId = [u8; 32];

/// Key material held by one participant after DKG
///
/// Deserialization rejects a share whose index, threshold or public-key share
/// list disagree with its party count.
#[derive(Clone, Serialize, Deserialize)]
#[serde(bound = "", try_from = "KeyShareFields<C>")]
pub struct KeyShare<C: PairingCurve> {
    /// This participant's index
    pub index: ParticipantIndex,

    /// Total number of participants
    pub n_parties: usize,

    /// Polynomial degree t; t + 1 signature shares reconstruct a signature
    pub threshold: usize,

    /// Sum of the shares received from every dealer
    pub secret_share: EncodedScalar<C>,

    /// Public-key shares of all participants, position `i - 1` for index `i`
    pub public_key_shares: Vec<EncodedG2<C>>,

    /// Group public key
    pub group_public_key: EncodedG2<C>,
}

/// Unchecked wire form of [`KeyShare`]
#[derive(Deserialize)]
#[serde(bound = "")]
struct KeyShareFields<C: PairingCurve> {
    index: ParticipantIndex,
    n_parties: usize,
    threshold: usize,
    secret_share: EncodedScalar<C>,
    public_key_shares: Vec<EncodedG2<C>>,
    group_public_key: EncodedG2<C>,
}

impl<C: PairingCurve> TryFrom<KeyShareFields<C>> for KeyShare<C> {
    type Error = Error;

    fn try_from(fields: KeyShareFields<C>) -> Result<Self> {
        let share = Self {
            index: fields.index,
            n_parties: fields.n_parties,
            threshold: fields.threshold,
            secret_share: fields.secret_share,
            public_key_shares: fields.public_key_shares,
            group_public_key: fields.group_public_key,
        };
        share.validate()?;
        Ok(share)
    }
}

impl<C: PairingCurve> KeyShare<C> {
    /// Check that index, threshold and public-key shares fit `n_parties`.
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.n_parties, self.threshold)?;
        if position(self.index, self.n_parties).is_none() {
            return Err(Error::InvalidParticipant(self.index));
        }
        if self.public_key_shares.len() != self.n_parties {
            return Err(Error::InvalidConfig(format!(
                "key share lists {} public-key shares for {} parties",
                self.public_key_shares.len(),
                self.n_parties
            )));
        }
        Ok(())
    }

    pub fn secret(&self) -> &C::Scalar {
        &self.secret_share.0
    }

    pub fn group_public_key(&self) -> C::G2 {
        self.group_public_key.0
    }

    /// Public-key share of any participant.
    pub fn public_key_share_of(&self, index: ParticipantIndex) -> Result<C::G2> {
        position(index, self.n_parties)
            .and_then(|i| self.public_key_shares.get(i))
            .map(|p| p.0)
            .ok_or(Error::InvalidParticipant(index))
    }

    /// This participant's own public-key share.
    pub fn public_key_share(&self) -> Result<C::G2> {
        self.public_key_share_of(self.index)
    }

    /// Signature share over `message` under this participant's secret share.
    pub fn sign(&self, message: &[u8]) -> C::G1 {
        C::sign(self.secret(), message)
    }

    /// Minimum number of signature shares for reconstruction
    pub fn required_signers(&self) -> usize {
        self.threshold.saturating_add(1)
    }
}

impl<C: PairingCurve> fmt::Debug for KeyShare<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyShare")
            .field("index", &self.index)
            .field("n_parties", &self.n_parties)
            .field("threshold", &self.threshold)
            .field("secret_share", &"<redacted>")
            .field("group_public_key", &self.group_public_key)
            .finish()
    }
}

/// Zero-based position of a 1-based index, if it is within `1..=n_parties`.
pub(crate) fn position(index: ParticipantIndex, n_parties: usize) -> Option<usize> {
    let i = usize::try_from(index).ok()?;
    (1..=n_parties).contains(&i).then(|| i - 1)
}

/// Check `1 <= threshold < n_parties`.
pub fn validate_threshold(n_parties: usize, threshold: usize) -> Result<()> {
    if n_parties < 2 {
        return Err(Error::InvalidConfig(
            "At least 2 parties are required".into(),
        ));
    }
    if threshold == 0 {
        return Err(Error::InvalidConfig(
            "Threshold must be at least 1".into(),
        ));
    }
    if threshold >= n_parties {
        return Err(Error::InvalidConfig(
            "Threshold must be smaller than the number of parties".into(),
        ));
    }
    Ok(())
}

/// Configuration for DKG/signing sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session identifier
    pub session_id: SessionId,

    /// Number of parties
    pub n_parties: usize,

    /// Polynomial degree t (t + 1 shares required)
    pub threshold: usize,

    /// This party's 1-based index
    pub index: ParticipantIndex,
}

impl SessionConfig {
    /// Create a new session configuration with a random session id
    pub fn new(n_parties: usize, threshold: usize, index: ParticipantIndex) -> Result<Self> {
        Self::with_session_id(rand::random(), n_parties, threshold, index)
    }

    /// Create a configuration for an already agreed session
    pub fn with_session_id(
        session_id: SessionId,
        n_parties: usize,
        threshold: usize,
        index: ParticipantIndex,
    ) -> Result<Self> {
        validate_threshold(n_parties, threshold)?;
        if position(index, n_parties).is_none() {
            return Err(Error::InvalidParticipant(index));
        }

        Ok(Self {
            session_id,
            n_parties,
            threshold,
            index,
        })
    }

    /// All participant indices `1..=n`
    pub fn participants(&self) -> impl Iterator<Item = ParticipantIndex> {
        1..=self.n_parties as ParticipantIndex
    }

    /// Number of coefficients each dealer commits to
    pub fn coefficient_count(&self) -> usize {
        self.threshold + 1
    }
}
