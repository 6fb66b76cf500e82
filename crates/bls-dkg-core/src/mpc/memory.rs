//! In-process relay backed by concurrent maps

use super::{async_trait, Relay, Round};
use crate::{Error, ParticipantIndex, Result, SessionId};
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::trace;

type Mailbox<K> = Arc<DashMap<K, Vec<Vec<u8>>>>;

/// In-memory message relay shared by all local participants
#[derive(Clone)]
pub struct MemoryRelay {
    /// (session, round) -> serialized broadcasts
    broadcasts: Mailbox<(SessionId, Round)>,
    /// (session, round, recipient) -> serialized direct messages
    directs: Mailbox<(SessionId, Round, ParticipantIndex)>,
    notify: broadcast::Sender<()>,
    timeout: Duration,
}

impl MemoryRelay {
    /// Relay with a 30 second collection timeout
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Relay whose collect calls fail once `timeout` elapses
    pub fn with_timeout(timeout: Duration) -> Self {
        let (notify, _) = broadcast::channel(256);
        Self {
            broadcasts: Arc::new(DashMap::new()),
            directs: Arc::new(DashMap::new()),
            notify,
            timeout,
        }
    }

    fn post<K: Eq + Hash>(&self, mailbox: &DashMap<K, Vec<Vec<u8>>>, key: K, bytes: Vec<u8>) {
        mailbox.entry(key).or_default().push(bytes);
        let _ = self.notify.send(());
    }

    /// Poll `mailbox[key]` until it holds `count` messages or the timeout hits.
    async fn wait_for<K, T>(
        &self,
        mailbox: &DashMap<K, Vec<Vec<u8>>>,
        key: K,
        count: usize,
    ) -> Result<Vec<T>>
    where
        K: Eq + Hash,
        T: DeserializeOwned,
    {
        let mut rx = self.notify.subscribe();
        let deadline = tokio::time::Instant::now() + self.timeout;

        loop {
            if let Some(messages) = mailbox.get(&key) {
                if messages.len() >= count {
                    return messages
                        .iter()
                        .take(count)
                        .map(|bytes| deserialize(bytes))
                        .collect();
                }
                trace!(available = messages.len(), count, "Waiting for messages");
            }

            if tokio::time::Instant::now() >= deadline {
                let available = mailbox.get(&key).map(|m| m.len()).unwrap_or(0);
                return Err(Error::Relay(format!(
                    "timed out with {} of {} messages",
                    available, count
                )));
            }

            // Notifications from any session wake us; the deadline still bounds the wait
            tokio::select! {
                _ = rx.recv() => {}
                _ = tokio::time::sleep_until(deadline) => {}
            }
        }
    }
}

impl Default for MemoryRelay {
    fn default() -> Self {
        Self::new()
    }
}

fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| Error::Serialization(e.to_string()))
}

fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| Error::Deserialization(e.to_string()))
}

#[async_trait]
impl Relay for MemoryRelay {
    async fn broadcast<T: Serialize + Send + Sync>(
        &self,
        session_id: &SessionId,
        round: Round,
        message: &T,
    ) -> Result<()> {
        let bytes = serialize(message)?;
        self.post(&self.broadcasts, (*session_id, round), bytes);
        Ok(())
    }

    async fn send_direct<T: Serialize + Send + Sync>(
        &self,
        session_id: &SessionId,
        round: Round,
        to: ParticipantIndex,
        message: &T,
    ) -> Result<()> {
        let bytes = serialize(message)?;
        self.post(&self.directs, (*session_id, round, to), bytes);
        Ok(())
    }

    async fn collect_broadcasts<T: DeserializeOwned + Send>(
        &self,
        session_id: &SessionId,
        round: Round,
        count: usize,
    ) -> Result<Vec<T>> {
        self.wait_for(&self.broadcasts, (*session_id, round), count)
            .await
    }

    async fn collect_direct<T: DeserializeOwned + Send>(
        &self,
        session_id: &SessionId,
        round: Round,
        me: ParticipantIndex,
        count: usize,
    ) -> Result<Vec<T>> {
        self.wait_for(&self.directs, (*session_id, round, me), count)
            .await
    }
}
