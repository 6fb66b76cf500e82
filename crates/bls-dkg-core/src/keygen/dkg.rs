//! DKG protocol driver

use rand::rngs::OsRng;
use tracing::{debug, info, instrument};

use super::{DkgCommitmentMessage, DkgSession, DkgShareMessage};
use crate::curve::PairingCurve;
use crate::encoding::g2_to_text;
use crate::mpc::{Relay, Round};
use crate::{KeyShare, Result, SessionConfig};

/// Run the distributed key generation protocol for one participant.
///
/// # Arguments
/// * `config` - Session configuration
/// * `relay` - Message relay for communication
///
/// # Returns
/// The participant's key share once every dealer's contribution verified
#[instrument(skip(config, relay), fields(index = config.index))]
pub async fn run_dkg<C: PairingCurve, R: Relay>(
    config: &SessionConfig,
    relay: &R,
) -> Result<KeyShare<C>> {
    info!(
        n_parties = config.n_parties,
        threshold = config.threshold,
        curve = C::NAME,
        "Starting DKG"
    );
    let mut session = DkgSession::<C>::new(config.clone());

    // Deal and publish commitments
    debug!(round = %Round::DkgCommitments, "Publishing commitments");
    let (commitment_msg, share_msgs) = session.deal(&mut OsRng)?;
    relay
        .broadcast(&config.session_id, Round::DkgCommitments, &commitment_msg)
        .await?;

    let all_commitments = relay
        .collect_broadcasts::<DkgCommitmentMessage<C>>(
            &config.session_id,
            Round::DkgCommitments,
            config.n_parties,
        )
        .await?;
    for msg in all_commitments.iter().filter(|m| m.dealer != config.index) {
        session.receive_commitment(msg)?;
    }

    // Private shares
    debug!(round = %Round::DkgShares, "Sending shares");
    for msg in &share_msgs {
        relay
            .send_direct(&config.session_id, Round::DkgShares, msg.recipient, msg)
            .await?;
    }
    drop(share_msgs);

    let received = relay
        .collect_direct::<DkgShareMessage<C>>(
            &config.session_id,
            Round::DkgShares,
            config.index,
            config.n_parties - 1,
        )
        .await?;

    // Verify and aggregate
    debug!("Verifying received shares");
    for msg in &received {
        session.receive_share(msg)?;
    }
    let key_share = session.finalize()?;

    info!(
        group_public_key = %g2_to_text::<C>(&key_share.group_public_key()).join(","),
        "DKG completed successfully"
    );

    Ok(key_share)
}
