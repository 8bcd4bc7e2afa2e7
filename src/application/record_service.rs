// Record service - Validate and append daily incident records
use crate::application::errors::TrackerError;
use crate::application::incident_repository::IncidentRepository;
use crate::application::live_feed::{LiveFeed, LiveUpdate};
use crate::application::notices::NoticeBoard;
use crate::domain::incident::{IncidentRecord, RecordDraft};
use crate::domain::session::Session;
use std::sync::Arc;

#[derive(Clone)]
pub struct RecordService {
    repository: Arc<dyn IncidentRepository>,
    feed: Arc<LiveFeed>,
    notices: Arc<NoticeBoard>,
}

impl RecordService {
    pub fn new(
        repository: Arc<dyn IncidentRepository>,
        feed: Arc<LiveFeed>,
        notices: Arc<NoticeBoard>,
    ) -> Self {
        Self {
            repository,
            feed,
            notices,
        }
    }

    pub async fn add_record(
        &self,
        session: &Session,
        draft: &RecordDraft,
    ) -> Result<IncidentRecord, TrackerError> {
        let record = draft.validate()?;

        match self.repository.append_record(session, &record).await {
            Ok(stored) => {
                tracing::info!(
                    "Recorded {} incident(s) on {} for {}",
                    stored.incident_count,
                    stored.date,
                    session.uid
                );
                self.feed
                    .publish(&session.uid, LiveUpdate::Record(stored.clone()))
                    .await;
                Ok(stored)
            }
            Err(e) => Err(self
                .notices
                .report(&session.uid, "Error adding record", e)
                .await),
        }
    }
}
