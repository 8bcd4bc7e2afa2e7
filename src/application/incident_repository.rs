// Repository trait for the per-user incident documents
use crate::domain::incident::{IncidentRecord, NewIncidentRecord};
use crate::domain::session::Session;
use async_trait::async_trait;

#[async_trait]
pub trait IncidentRepository: Send + Sync {
    /// Upsert the user document and create the counter document if it is missing
    async fn initialize_user(&self, session: &Session) -> anyhow::Result<()>;

    /// Current counter value, `None` when the counter document does not exist
    async fn get_incident_count(&self, session: &Session) -> anyhow::Result<Option<u64>>;

    async fn set_incident_count(&self, session: &Session, incidents: u64) -> anyhow::Result<()>;

    /// All records of the user, ascending by creation time
    async fn list_records(&self, session: &Session) -> anyhow::Result<Vec<IncidentRecord>>;

    async fn append_record(
        &self,
        session: &Session,
        record: &NewIncidentRecord,
    ) -> anyhow::Result<IncidentRecord>;
}
