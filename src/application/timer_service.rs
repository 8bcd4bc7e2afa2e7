// Timer service - Per-user time-since-incident timers with one tick task each
use crate::application::history_store::HistoryStore;
use crate::application::live_feed::{LiveFeed, LiveUpdate};
use crate::domain::timer::{RollingHistory, Stopwatch, TimerSnapshot};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
struct UserTimer {
    stopwatch: Stopwatch,
    history: RollingHistory,
    ticker: Option<JoinHandle<()>>,
}

impl UserTimer {
    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

#[derive(Clone)]
pub struct TimerService {
    history_store: Arc<dyn HistoryStore>,
    feed: Arc<LiveFeed>,
    timers: Arc<Mutex<HashMap<String, Arc<Mutex<UserTimer>>>>>,
    tick_interval: Duration,
}

impl TimerService {
    pub fn new(history_store: Arc<dyn HistoryStore>, feed: Arc<LiveFeed>) -> Self {
        Self {
            history_store,
            feed,
            timers: Arc::new(Mutex::new(HashMap::new())),
            tick_interval: TICK_INTERVAL,
        }
    }

    /// Reading an idle user's timer does not keep it in memory
    pub async fn snapshot(&self, uid: &str) -> TimerSnapshot {
        let existing = self.timers.lock().await.get(uid).cloned();
        match existing {
            Some(timer) => {
                let guard = timer.lock().await;
                TimerSnapshot::capture(&guard.stopwatch, &guard.history)
            }
            None => TimerSnapshot::capture(&Stopwatch::new(), &self.load_history(uid).await),
        }
    }

    pub async fn start(&self, uid: &str) -> TimerSnapshot {
        self.transition(uid, Stopwatch::start).await
    }

    pub async fn stop(&self, uid: &str) -> TimerSnapshot {
        self.transition(uid, Stopwatch::stop).await
    }

    pub async fn reset(&self, uid: &str) -> TimerSnapshot {
        self.transition(uid, Stopwatch::reset).await
    }

    /// Abort every tick task and commit running timers to their history,
    /// the same way a stop does.
    pub async fn shutdown(&self) {
        let mut to_persist = Vec::new();
        let stopped = {
            let timers = self.timers.lock().await;
            for (uid, timer) in timers.iter() {
                let mut guard = timer.lock().await;
                guard.stop_ticker();
                if let Some(seconds) = guard.stopwatch.stop() {
                    guard.history.push(seconds);
                    to_persist.push((uid.clone(), guard.history.entries()));
                }
            }
            timers.len()
        };

        for (uid, entries) in to_persist {
            if let Err(e) = self.history_store.save(&uid, &entries).await {
                tracing::warn!("Failed to persist timer history for {}: {:#}", uid, e);
            }
        }
        tracing::info!("Stopped {} timer(s)", stopped);
    }

    async fn transition(
        &self,
        uid: &str,
        apply: impl FnOnce(&mut Stopwatch) -> Option<u64>,
    ) -> TimerSnapshot {
        let timer = self.timer_for(uid).await;

        let (snapshot, to_persist) = {
            let mut guard = timer.lock().await;
            // The old tick source goes away on every transition
            guard.stop_ticker();

            let committed = apply(&mut guard.stopwatch);
            if let Some(seconds) = committed {
                guard.history.push(seconds);
                tracing::debug!(
                    "Committed {}s to history of {} ({} entries)",
                    seconds,
                    uid,
                    guard.history.len()
                );
            }

            if guard.stopwatch.is_running() {
                guard.ticker = Some(self.spawn_ticker(Arc::downgrade(&timer)));
            }

            (
                TimerSnapshot::capture(&guard.stopwatch, &guard.history),
                committed.map(|_| guard.history.entries()),
            )
        };

        let mut persisted = true;
        if let Some(entries) = to_persist {
            if let Err(e) = self.history_store.save(uid, &entries).await {
                tracing::warn!("Failed to persist timer history for {}: {:#}", uid, e);
                persisted = false;
            }
        }

        if persisted && !snapshot.is_running && snapshot.seconds == 0 {
            self.release_if_idle(uid, &timer).await;
        }

        self.feed
            .publish(uid, LiveUpdate::Timer(snapshot.clone()))
            .await;

        snapshot
    }

    /// Drop a cleared timer from memory; its history can be reloaded from the
    /// store. Kept while any other caller still holds it.
    async fn release_if_idle(&self, uid: &str, timer: &Arc<Mutex<UserTimer>>) {
        let mut timers = self.timers.lock().await;
        // Map entry plus ours; new holders only come through the map lock
        if Arc::strong_count(timer) != 2 {
            return;
        }
        let idle = {
            let guard = timer.lock().await;
            !guard.stopwatch.is_running() && guard.stopwatch.seconds() == 0
        };
        if idle {
            timers.remove(uid);
            tracing::debug!("Released idle timer of {}", uid);
        }
    }

    fn spawn_ticker(&self, timer: Weak<Mutex<UserTimer>>) -> JoinHandle<()> {
        let period = self.tick_interval;
        tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                let Some(timer) = timer.upgrade() else {
                    break;
                };
                timer.lock().await.stopwatch.tick();
            }
        })
    }

    /// Timer of `uid`, loading its history from the store on first use.
    /// The store is read without holding the map lock.
    async fn timer_for(&self, uid: &str) -> Arc<Mutex<UserTimer>> {
        if let Some(timer) = self.timers.lock().await.get(uid) {
            return timer.clone();
        }

        let history = self.load_history(uid).await;

        // Another request may have loaded the same user in the meantime
        self.timers
            .lock()
            .await
            .entry(uid.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(UserTimer {
                    history,
                    ..UserTimer::default()
                }))
            })
            .clone()
    }

    async fn load_history(&self, uid: &str) -> RollingHistory {
        match self.history_store.load(uid).await {
            Ok(entries) => RollingHistory::from_entries(entries),
            Err(e) => {
                tracing::warn!("Failed to load timer history for {}: {:#}", uid, e);
                RollingHistory::default()
            }
        }
    }
}
