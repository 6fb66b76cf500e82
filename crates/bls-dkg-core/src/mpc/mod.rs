//! Message transport between DKG and signing participants
//!
//! Both protocols are one-shot exchanges: a DKG moves commitments by
//! broadcast and shares point to point, a signing event broadcasts one
//! signature share per signer. Every message is keyed by session and
//! [`Round`], so a relay can carry many DKG and signing sessions at once.

use std::fmt;

use crate::{ParticipantIndex, Result, SessionId};
use serde::{de::DeserializeOwned, Serialize};

pub use ::async_trait::async_trait;

/// Protocol step a message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Round {
    /// DKG: every dealer broadcasts its G1 and G2 commitments
    DkgCommitments,
    /// DKG: every dealer sends one share directly to each other participant
    DkgShares,
    /// Signing: every signer broadcasts its signature share
    SignatureShares,
}

impl Round {
    /// Whether the round is delivered point to point rather than broadcast.
    pub fn is_direct(self) -> bool {
        matches!(self, Round::DkgShares)
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Round::DkgCommitments => "dkg-commitments",
            Round::DkgShares => "dkg-shares",
            Round::SignatureShares => "signature-shares",
        };
        f.write_str(name)
    }
}

/// Message relay used by the protocol drivers.
///
/// Broadcasts are visible to every participant of a session, including the
/// sender. Direct messages are delivered only to the addressed participant
/// and are assumed to travel over an authenticated confidential channel.
/// Collect calls fail with [`crate::Error::Relay`] once the relay's timeout
/// passes, whatever other sessions are doing meanwhile.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Broadcast a message to all parties of the session
    async fn broadcast<T: Serialize + Send + Sync>(
        &self,
        session_id: &SessionId,
        round: Round,
        message: &T,
    ) -> Result<()>;

    /// Send a direct message to one party
    async fn send_direct<T: Serialize + Send + Sync>(
        &self,
        session_id: &SessionId,
        round: Round,
        to: ParticipantIndex,
        message: &T,
    ) -> Result<()>;

    /// Wait for `count` broadcasts of a round
    async fn collect_broadcasts<T: DeserializeOwned + Send>(
        &self,
        session_id: &SessionId,
        round: Round,
        count: usize,
    ) -> Result<Vec<T>>;

    /// Wait for `count` direct messages addressed to `me`
    async fn collect_direct<T: DeserializeOwned + Send>(
        &self,
        session_id: &SessionId,
        round: Round,
        me: ParticipantIndex,
        count: usize,
    ) -> Result<Vec<T>>;
}

/// In-memory relay for local runs and tests
pub mod memory;

pub use memory::MemoryRelay;
