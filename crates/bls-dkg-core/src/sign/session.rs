//! Per-signing-event state machine

use std::collections::BTreeMap;

use tracing::{debug, info, instrument, warn};

use super::lagrange::reconstruct_signature;
use crate::curve::PairingCurve;
use crate::error::ReconstructionError;
use crate::types::position;
use crate::{Error, KeyShare, ParticipantIndex, Result};

/// Progress of one signing event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningState {
    /// Accepting signature shares
    SharesCollected,
    /// Every share checked against its issuer's public-key share
    Verified,
    /// Group signature interpolated, not yet checked
    Reconstructed,
    /// Group signature verifies under the group public key
    VerifiedAgainstGroupKey,
    /// A check failed; nothing will be emitted
    Aborted,
}

impl SigningState {
    fn name(self) -> &'static str {
        match self {
            SigningState::SharesCollected => "SharesCollected",
            SigningState::Verified => "Verified",
            SigningState::Reconstructed => "Reconstructed",
            SigningState::VerifiedAgainstGroupKey => "VerifiedAgainstGroupKey",
            SigningState::Aborted => "Aborted",
        }
    }
}

/// Collects, checks and combines signature shares for one message.
pub struct SigningSession<C: PairingCurve> {
    message: Vec<u8>,
    n_parties: usize,
    threshold: usize,
    public_key_shares: Vec<C::G2>,
    group_public_key: C::G2,
    shares: BTreeMap<ParticipantIndex, C::G1>,
    signature: Option<C::G1>,
    state: SigningState,
}

impl<C: PairingCurve> SigningSession<C> {
    /// Start a session using the public data of a key share.
    pub fn new(key_share: &KeyShare<C>, message: &[u8]) -> Result<Self> {
        key_share.validate()?;
        Ok(Self {
            message: message.to_vec(),
            n_parties: key_share.n_parties,
            threshold: key_share.threshold,
            public_key_shares: key_share.public_key_shares.iter().map(|p| p.0).collect(),
            group_public_key: key_share.group_public_key(),
            shares: BTreeMap::new(),
            signature: None,
            state: SigningState::SharesCollected,
        })
    }

    pub fn state(&self) -> SigningState {
        self.state
    }

    pub fn share_count(&self) -> usize {
        self.shares.len()
    }

    /// Record the signature share issued by `index`.
    pub fn add_share(&mut self, index: ParticipantIndex, signature: C::G1) -> Result<()> {
        self.expect_state(SigningState::SharesCollected)?;

        if position(index, self.n_parties).is_none() {
            return Err(self.abort(Error::InvalidParticipant(index)));
        }
        if self.shares.insert(index, signature).is_some() {
            return Err(self.abort(ReconstructionError::DuplicateIndex(index).into()));
        }
        Ok(())
    }

    /// Check every collected share against its issuer's public-key share.
    #[instrument(skip(self), fields(shares = self.shares.len()))]
    pub fn verify(&mut self) -> Result<()> {
        self.expect_state(SigningState::SharesCollected)?;

        let required = self.threshold + 1;
        if self.shares.len() < required {
            return Err(self.abort(Error::ThresholdNotMet {
                required,
                actual: self.shares.len(),
            }));
        }

        let bad = self.shares.iter().find_map(|(index, signature)| {
            let public_key_share = position(*index, self.n_parties)
                .and_then(|i| self.public_key_shares.get(i));
            match public_key_share {
                Some(pk) if C::verify_single_signature(signature, pk, &self.message) => None,
                _ => Some(*index),
            }
        });
        if let Some(index) = bad {
            warn!(index, "Signature share failed verification");
            return Err(self.abort(Error::InvalidSignatureShare { index }));
        }

        self.state = SigningState::Verified;
        debug!("All signature shares verified");
        Ok(())
    }

    /// Interpolate the verified shares at zero.
    pub fn reconstruct(&mut self) -> Result<()> {
        self.expect_state(SigningState::Verified)?;

        let (indices, shares): (Vec<ParticipantIndex>, Vec<C::G1>) =
            self.shares.iter().map(|(i, s)| (*i, *s)).unzip();
        match reconstruct_signature::<C>(&shares, &indices) {
            Ok(signature) => {
                self.signature = Some(signature);
                self.state = SigningState::Reconstructed;
                Ok(())
            }
            Err(e) => Err(self.abort(e.into())),
        }
    }

    /// Check the reconstructed signature against the group key and release it.
    #[instrument(skip(self))]
    pub fn finish(&mut self) -> Result<C::G1> {
        self.expect_state(SigningState::Reconstructed)?;

        let verified = self
            .signature
            .filter(|s| C::verify_single_signature(s, &self.group_public_key, &self.message));
        let Some(signature) = verified else {
            return Err(self.abort(Error::InvalidSignature));
        };

        self.state = SigningState::VerifiedAgainstGroupKey;
        info!(signers = ?self.shares.keys().collect::<Vec<_>>(), "Group signature verified");
        Ok(signature)
    }

    /// Run verify, reconstruct and finish in order.
    pub fn complete(&mut self) -> Result<C::G1> {
        self.verify()?;
        self.reconstruct()?;
        self.finish()
    }

    fn expect_state(&self, expected: SigningState) -> Result<()> {
        if self.state != expected {
            return Err(Error::UnexpectedPhase {
                expected: expected.name(),
                found: self.state.name(),
            });
        }
        Ok(())
    }

    fn abort(&mut self, err: Error) -> Error {
        warn!(state = self.state.name(), error = %err, "Signing aborted");
        self.state = SigningState::Aborted;
        self.signature = None;
        err
    }
}
