// Streaming dashboard service - Snapshot first, then live updates
use crate::application::counter_service::CounterService;
use crate::application::errors::TrackerError;
use crate::application::live_feed::{LiveFeed, LiveUpdate};
use crate::application::notices::NoticeBoard;
use crate::application::statistics_service::StatisticsService;
use crate::application::timer_service::TimerService;
use crate::domain::dashboard::Dashboard;
use crate::domain::session::Session;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

const STREAM_BUFFER: usize = 100;

#[derive(Debug, Clone)]
pub enum StreamMessage {
    Snapshot(Box<Dashboard>),
    Update(LiveUpdate),
}

#[derive(Clone)]
pub struct StreamingDashboardService {
    counters: CounterService,
    timers: TimerService,
    statistics: StatisticsService,
    notices: Arc<NoticeBoard>,
    feed: Arc<LiveFeed>,
    closing: Arc<watch::Sender<bool>>,
}

impl StreamingDashboardService {
    pub fn new(
        counters: CounterService,
        timers: TimerService,
        statistics: StatisticsService,
        notices: Arc<NoticeBoard>,
        feed: Arc<LiveFeed>,
    ) -> Self {
        Self {
            counters,
            timers,
            statistics,
            notices,
            feed,
            closing: Arc::new(watch::channel(false).0),
        }
    }

    /// End every open stream and refuse new ones, so a graceful shutdown
    /// is not held up by long-lived dashboard connections.
    pub fn close_streams(&self) {
        self.closing.send_replace(true);
    }

    pub async fn snapshot(&self, session: &Session) -> Result<Dashboard, TrackerError> {
        let incidents = self.counters.current(session).await?;
        let weekly = self.statistics.weekly(session).await?;
        let timer = self.timers.snapshot(&session.uid).await;
        let notice = self.notices.current(&session.uid).await;

        Ok(Dashboard::new(
            session.email.clone(),
            incidents,
            timer,
            weekly,
            notice,
        ))
    }

    /// Subscribe before reading the snapshot so no change falls in between.
    /// The forwarding task ends when the receiver is dropped or streams close.
    pub async fn stream_dashboard(
        &self,
        session: &Session,
    ) -> Result<mpsc::Receiver<StreamMessage>, TrackerError> {
        let updates = self.feed.subscribe(&session.uid).await;
        let dashboard = self.snapshot(session).await?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let uid = session.uid.clone();
        let mut closing = self.closing.subscribe();

        tokio::spawn(async move {
            if tx
                .send(StreamMessage::Snapshot(Box::new(dashboard)))
                .await
                .is_err()
            {
                return;
            }
            if *closing.borrow() {
                return;
            }

            let mut updates = BroadcastStream::new(updates);
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    _ = closing.changed() => break,
                    update = updates.next() => match update {
                        Some(Ok(update)) => {
                            if tx.send(StreamMessage::Update(update)).await.is_err() {
                                break;
                            }
                        }
                        Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                            tracing::warn!("Live stream of {} skipped {} update(s)", uid, skipped);
                        }
                        None => break,
                    },
                }
            }

            tracing::debug!("Live stream of {} closed", uid);
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{session, MemoryHistoryStore, MemoryRepository};
    use crate::domain::counter::CounterAction;
    use std::time::Duration;

    fn service(repository: Arc<MemoryRepository>) -> (StreamingDashboardService, CounterService) {
        let feed = Arc::new(LiveFeed::new());
        let notices = Arc::new(NoticeBoard::new(Duration::from_secs(5), feed.clone()));
        let timers = TimerService::new(Arc::new(MemoryHistoryStore::default()), feed.clone());
        let counters = CounterService::new(
            repository.clone(),
            timers.clone(),
            feed.clone(),
            notices.clone(),
        );
        let statistics = StatisticsService::new(repository, notices.clone(), 5);
        (
            StreamingDashboardService::new(counters.clone(), timers, statistics, notices, feed),
            counters,
        )
    }

    #[tokio::test]
    async fn test_snapshot() {
        let (dashboard, _) = service(Arc::new(MemoryRepository::with_counter("alice", 4)));
        let snapshot = dashboard.snapshot(&session("alice")).await.unwrap();

        assert_eq!(snapshot.incidents, 4);
        assert_eq!(snapshot.email.as_deref(), Some("alice@example.com"));
        assert!(snapshot.weekly.is_empty());
        assert!(snapshot.notice.is_none());
        assert_eq!(snapshot.timer.elapsed, "00:00:00");
    }

    #[tokio::test]
    async fn test_stream_sends_snapshot_then_updates() {
        let (dashboard, counters) = service(Arc::new(MemoryRepository::with_counter("alice", 1)));
        let alice = session("alice");
        let mut rx = dashboard.stream_dashboard(&alice).await.unwrap();

        match rx.recv().await {
            Some(StreamMessage::Snapshot(snapshot)) => assert_eq!(snapshot.incidents, 1),
            other => panic!("expected snapshot, got {other:?}"),
        }

        counters.apply(&alice, CounterAction::Increment).await.unwrap();

        match rx.recv().await {
            Some(StreamMessage::Update(LiveUpdate::Counter(count))) => assert_eq!(count, 2),
            other => panic!("expected counter update, got {other:?}"),
        }
        match rx.recv().await {
            Some(StreamMessage::Update(LiveUpdate::Timer(timer))) => assert!(timer.is_running),
            other => panic!("expected timer update, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_close_streams_ends_open_and_new_streams() {
        let (dashboard, counters) = service(Arc::new(MemoryRepository::with_counter("alice", 1)));
        let alice = session("alice");
        let mut open = dashboard.stream_dashboard(&alice).await.unwrap();
        assert!(matches!(open.recv().await, Some(StreamMessage::Snapshot(_))));

        dashboard.close_streams();
        counters.apply(&alice, CounterAction::Increment).await.unwrap();

        let ended = tokio::time::timeout(Duration::from_secs(1), async {
            while open.recv().await.is_some() {}
        })
        .await;
        assert!(ended.is_ok());

        let mut late = dashboard.stream_dashboard(&alice).await.unwrap();
        assert!(matches!(late.recv().await, Some(StreamMessage::Snapshot(_))));
        assert!(late.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_snapshot_fails_stream() {
        let repository = Arc::new(MemoryRepository::default());
        repository.fail_requests(true);
        let (dashboard, _) = service(repository);

        assert!(dashboard.stream_dashboard(&session("alice")).await.is_err());
    }
}
