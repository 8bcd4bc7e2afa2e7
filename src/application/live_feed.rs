// Per-user fan-out of dashboard changes
use crate::domain::incident::IncidentRecord;
use crate::domain::timer::TimerSnapshot;
use std::collections::HashMap;
use tokio::sync::{broadcast, Mutex};

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub enum LiveUpdate {
    Counter(u64),
    Record(IncidentRecord),
    Timer(TimerSnapshot),
    Notice(String),
    /// The current notice expired or was dismissed
    NoticeCleared,
}

#[derive(Debug, Default)]
pub struct LiveFeed {
    channels: Mutex<HashMap<String, broadcast::Sender<LiveUpdate>>>,
}

impl LiveFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self, uid: &str) -> broadcast::Receiver<LiveUpdate> {
        let mut channels = self.channels.lock().await;
        channels
            .entry(uid.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Deliver `update` to every live subscriber of `uid`. Channels without
    /// subscribers are dropped.
    pub async fn publish(&self, uid: &str, update: LiveUpdate) {
        let mut channels = self.channels.lock().await;
        let Some(sender) = channels.get(uid) else {
            return;
        };

        if sender.send(update).is_err() {
            tracing::debug!("No live subscribers left for {}", uid);
            channels.remove(uid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers_of_same_user() {
        let feed = LiveFeed::new();
        let mut alice = feed.subscribe("alice").await;
        let mut bob = feed.subscribe("bob").await;

        feed.publish("alice", LiveUpdate::Counter(4)).await;

        assert!(matches!(alice.recv().await, Ok(LiveUpdate::Counter(4))));
        assert!(bob.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_dropped() {
        let feed = LiveFeed::new();
        feed.publish("nobody", LiveUpdate::Counter(1)).await;

        let receiver = feed.subscribe("gone").await;
        drop(receiver);
        feed.publish("gone", LiveUpdate::Counter(1)).await;
        assert!(feed.channels.lock().await.is_empty());
    }
}
