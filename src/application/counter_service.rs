// Counter service - Increment, decrement and reset the incident counter
use crate::application::errors::TrackerError;
use crate::application::incident_repository::IncidentRepository;
use crate::application::live_feed::{LiveFeed, LiveUpdate};
use crate::application::notices::NoticeBoard;
use crate::application::timer_service::TimerService;
use crate::domain::counter::{CounterAction, CounterOutcome, IncidentCounter};
use crate::domain::session::Session;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone)]
pub struct CounterService {
    repository: Arc<dyn IncidentRepository>,
    timers: TimerService,
    feed: Arc<LiveFeed>,
    notices: Arc<NoticeBoard>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Marks a user's counter as busy until dropped
struct InFlight<'a> {
    set: &'a Mutex<HashSet<String>>,
    uid: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.uid);
    }
}

impl CounterService {
    pub fn new(
        repository: Arc<dyn IncidentRepository>,
        timers: TimerService,
        feed: Arc<LiveFeed>,
        notices: Arc<NoticeBoard>,
    ) -> Self {
        Self {
            repository,
            timers,
            feed,
            notices,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub async fn current(&self, session: &Session) -> Result<u64, TrackerError> {
        match self.repository.get_incident_count(session).await {
            Ok(count) => Ok(count.unwrap_or(0)),
            Err(e) => Err(self
                .notices
                .report(&session.uid, "Failed to fetch incident count", e)
                .await),
        }
    }

    /// Apply `action` and restart (increment, decrement) or clear (reset)
    /// the user's timer. Decrementing at zero writes nothing.
    pub async fn apply(
        &self,
        session: &Session,
        action: CounterAction,
    ) -> Result<CounterOutcome, TrackerError> {
        let _in_flight = self.claim(&session.uid)?;

        let counter = IncidentCounter::new(self.current(session).await?);
        let Some(next) = counter.next_value(action) else {
            tracing::debug!("Counter of {} already at zero, nothing to {}", session.uid, action.as_str());
            return Ok(CounterOutcome {
                incidents: counter.incidents,
                action,
                changed: false,
            });
        };

        if let Err(e) = self.repository.set_incident_count(session, next).await {
            return Err(self
                .notices
                .report(&session.uid, "Failed to update incident count", e)
                .await);
        }

        tracing::info!(
            "Counter of {} {}: {} -> {}",
            session.uid,
            action.as_str(),
            counter.incidents,
            next
        );
        self.feed.publish(&session.uid, LiveUpdate::Counter(next)).await;

        match action {
            CounterAction::Increment | CounterAction::Decrement => {
                self.timers.start(&session.uid).await;
            }
            CounterAction::Reset => {
                self.timers.reset(&session.uid).await;
            }
        }

        Ok(CounterOutcome {
            incidents: next,
            action,
            changed: true,
        })
    }

    fn claim(&self, uid: &str) -> Result<InFlight<'_>, TrackerError> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(uid.to_string()) {
            return Err(TrackerError::Busy);
        }
        Ok(InFlight {
            set: &self.in_flight,
            uid: uid.to_string(),
        })
    }
}
