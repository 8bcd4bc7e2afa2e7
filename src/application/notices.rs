// Transient user-visible notices that dismiss themselves
use crate::application::errors::TrackerError;
use crate::application::live_feed::{LiveFeed, LiveUpdate};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
struct Notice {
    id: u64,
    message: String,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct NoticeBoard {
    ttl: Duration,
    feed: Arc<LiveFeed>,
    notices: Arc<Mutex<HashMap<String, Notice>>>,
    next_id: AtomicU64,
}

impl NoticeBoard {
    pub fn new(ttl: Duration, feed: Arc<LiveFeed>) -> Self {
        Self {
            ttl,
            feed,
            notices: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Replace the user's notice; it is shown until the ttl elapses, then
    /// live subscribers are told it cleared.
    pub async fn post(&self, uid: &str, message: impl Into<String>) {
        let message = message.into();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let expires_at = Instant::now() + self.ttl;
        self.notices.lock().await.insert(
            uid.to_string(),
            Notice {
                id,
                message: message.clone(),
                expires_at,
            },
        );
        self.feed.publish(uid, LiveUpdate::Notice(message)).await;

        let notices = self.notices.clone();
        let feed = self.feed.clone();
        let uid = uid.to_string();
        tokio::spawn(async move {
            tokio::time::sleep_until(expires_at).await;
            let expired = {
                let mut notices = notices.lock().await;
                // A newer notice owns its own expiry
                if notices.get(&uid).is_some_and(|notice| notice.id == id) {
                    notices.remove(&uid);
                    true
                } else {
                    false
                }
            };
            if expired {
                feed.publish(&uid, LiveUpdate::NoticeCleared).await;
            }
        });
    }

    pub async fn current(&self, uid: &str) -> Option<String> {
        let mut notices = self.notices.lock().await;
        match notices.get(uid) {
            Some(notice) if notice.expires_at > Instant::now() => Some(notice.message.clone()),
            Some(_) => {
                notices.remove(uid);
                None
            }
            None => None,
        }
    }

    pub async fn dismiss(&self, uid: &str) {
        let removed = self.notices.lock().await.remove(uid);
        if removed.is_some() {
            self.feed.publish(uid, LiveUpdate::NoticeCleared).await;
        }
    }

    /// Log a persistence failure, show it to the user and hand back the error
    /// to return to the caller.
    pub async fn report(&self, uid: &str, message: &str, error: anyhow::Error) -> TrackerError {
        tracing::error!("{} for {}: {:#}", message, uid, error);
        self.post(uid, message).await;
        TrackerError::upstream(message, error)
    }
}
