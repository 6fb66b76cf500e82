//! Threshold signing driver

use std::collections::HashSet;

use tracing::{debug, info, instrument};

use super::{SignatureShareMessage, SigningSession};
use crate::curve::PairingCurve;
use crate::encoding::EncodedG1;
use crate::error::ReconstructionError;
use crate::mpc::{Relay, Round};
use crate::{Error, KeyShare, ParticipantIndex, Result, SessionId};

/// Produce a group signature over `message` together with the other `signers`.
///
/// Every signer broadcasts its signature share, collects everyone else's and
/// runs a [`SigningSession`] over them. The returned signature has been
/// verified against the group public key.
///
/// # Arguments
/// * `key_share` - This participant's key share from DKG
/// * `message` - Message to sign
/// * `signers` - Indices of all participating signers, this one included
/// * `session_id` - Identifier agreed by all signers for this signing event
/// * `relay` - Message relay for communication
#[instrument(skip(key_share, message, relay), fields(index = key_share.index))]
pub async fn run_threshold_sign<C: PairingCurve, R: Relay>(
    key_share: &KeyShare<C>,
    message: &[u8],
    signers: &[ParticipantIndex],
    session_id: &SessionId,
    relay: &R,
) -> Result<C::G1> {
    info!(signers = ?signers, "Starting threshold signing");
    key_share.validate()?;

    let required = key_share.required_signers();
    if signers.len() < required {
        return Err(Error::ThresholdNotMet {
            required,
            actual: signers.len(),
        });
    }
    let mut seen = HashSet::with_capacity(signers.len());
    if let Some(dup) = signers.iter().find(|i| !seen.insert(**i)) {
        return Err(ReconstructionError::DuplicateIndex(*dup).into());
    }
    if !signers.contains(&key_share.index) {
        return Err(Error::InvalidParticipant(key_share.index));
    }

    let share_msg = SignatureShareMessage::<C> {
        index: key_share.index,
        signature: EncodedG1(key_share.sign(message)),
    };
    relay
        .broadcast(session_id, Round::SignatureShares, &share_msg)
        .await?;

    let collected = relay
        .collect_broadcasts::<SignatureShareMessage<C>>(
            session_id,
            Round::SignatureShares,
            signers.len(),
        )
        .await?;
    debug!(shares = collected.len(), "Collected signature shares");

    let mut session = SigningSession::new(key_share, message)?;
    for msg in &collected {
        if !signers.contains(&msg.index) {
            return Err(Error::InvalidParticipant(msg.index));
        }
        session.add_share(msg.index, msg.signature.0)?;
    }
    session.complete()
}
