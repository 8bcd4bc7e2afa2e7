// Statistics service - Weekly averages, graph series and the records table
use crate::application::errors::TrackerError;
use crate::application::incident_repository::IncidentRepository;
use crate::application::notices::NoticeBoard;
use crate::domain::dashboard::{GraphPoint, Statistics};
use crate::domain::incident::{paginate, IncidentRecord, RecordsPage};
use crate::domain::session::Session;
use crate::domain::weekly::{compute_weekly_averages, WeeklySummary};
use std::sync::Arc;

#[derive(Clone)]
pub struct StatisticsService {
    repository: Arc<dyn IncidentRepository>,
    notices: Arc<NoticeBoard>,
    page_size: usize,
}

impl StatisticsService {
    pub fn new(
        repository: Arc<dyn IncidentRepository>,
        notices: Arc<NoticeBoard>,
        page_size: usize,
    ) -> Self {
        Self {
            repository,
            notices,
            page_size,
        }
    }

    /// Records in creation order
    pub async fn records(&self, session: &Session) -> Result<Vec<IncidentRecord>, TrackerError> {
        match self.repository.list_records(session).await {
            Ok(records) => Ok(records),
            Err(e) => Err(self
                .notices
                .report(&session.uid, "Failed to fetch incident records", e)
                .await),
        }
    }

    pub async fn statistics(&self, session: &Session) -> Result<Statistics, TrackerError> {
        let records = self.records(session).await?;
        Ok(Statistics {
            weekly: weekly_averages(&records),
            graph: records.iter().map(GraphPoint::from).collect(),
        })
    }

    pub async fn records_page(
        &self,
        session: &Session,
        page: usize,
    ) -> Result<RecordsPage, TrackerError> {
        let records = self.records(session).await?;
        Ok(paginate(&records, page, self.page_size))
    }

    pub async fn weekly(&self, session: &Session) -> Result<Vec<WeeklySummary>, TrackerError> {
        let records = self.records(session).await?;
        Ok(weekly_averages(&records))
    }
}

/// Weekly buckets over records ordered by date. Records arrive in creation
/// order, so a back-filled day is moved into place first.
pub fn weekly_averages(records: &[IncidentRecord]) -> Vec<WeeklySummary> {
    let mut by_date = records.to_vec();
    by_date.sort_by_key(|record| record.date);

    match compute_weekly_averages(&by_date) {
        Ok(summaries) => summaries,
        Err(e) => {
            tracing::error!("Weekly aggregation rejected sorted records: {}", e);
            Vec::new()
        }
    }
}
