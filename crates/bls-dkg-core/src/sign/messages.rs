//! Signing message types

use serde::{Deserialize, Serialize};

use crate::curve::PairingCurve;
use crate::encoding::EncodedG1;
use crate::ParticipantIndex;

/// A participant's signature share over the session message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct SignatureShareMessage<C: PairingCurve> {
    /// Issuer index
    pub index: ParticipantIndex,
    /// `H(m) * secret_share`
    pub signature: EncodedG1<C>,
}
