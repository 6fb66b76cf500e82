//! DKG message types

use serde::{Deserialize, Serialize};

use crate::curve::PairingCurve;
use crate::encoding::{EncodedG1, EncodedG2, EncodedScalar};
use crate::ParticipantIndex;

/// Round 1 message: commitments to the dealer's polynomial coefficients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct DkgCommitmentMessage<C: PairingCurve> {
    /// Dealer index
    pub dealer: ParticipantIndex,
    /// G1 commitments, one per coefficient
    pub commitments_g1: Vec<EncodedG1<C>>,
    /// G2 commitments, one per coefficient
    pub commitments_g2: Vec<EncodedG2<C>>,
}

impl<C: PairingCurve> DkgCommitmentMessage<C> {
    pub fn g1(&self) -> Vec<C::G1> {
        self.commitments_g1.iter().map(|p| p.0).collect()
    }

    pub fn g2(&self) -> Vec<C::G2> {
        self.commitments_g2.iter().map(|p| p.0).collect()
    }
}

/// Round 2 message: private share for exactly one recipient
///
/// Sent over a confidential point-to-point channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct DkgShareMessage<C: PairingCurve> {
    /// Dealer index
    pub dealer: ParticipantIndex,
    /// Recipient index
    pub recipient: ParticipantIndex,
    /// Dealer polynomial evaluated at the recipient index
    pub share: EncodedScalar<C>,
}
