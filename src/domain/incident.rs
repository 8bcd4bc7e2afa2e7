// Incident record domain models
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

/// Date format accepted from the record form and stored in the document store.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A daily incident record as stored remotely. Records are never edited.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentRecord {
    pub id: String,
    pub date: NaiveDate,
    pub day: String,
    pub incident_count: u64,
    pub created_at: DateTime<Utc>,
}

impl IncidentRecord {
    pub fn new(
        id: String,
        date: NaiveDate,
        day: String,
        incident_count: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            date,
            day,
            incident_count,
            created_at,
        }
    }
}

/// A validated record that has not been written yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIncidentRecord {
    pub date: NaiveDate,
    pub day: String,
    pub incident_count: u64,
}

impl NewIncidentRecord {
    pub fn new(date: NaiveDate, incident_count: u64) -> Self {
        Self {
            date,
            day: weekday_name(date),
            incident_count,
        }
    }
}

/// Full English weekday name, e.g. "Monday".
pub fn weekday_name(date: NaiveDate) -> String {
    date.format("%A").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("A date is required")]
    MissingDate,
    #[error("Date must be formatted as YYYY-MM-DD, got '{0}'")]
    InvalidDate(String),
    #[error("An incident count is required")]
    MissingCount,
    #[error("Incident count must be a positive number")]
    InvalidCount(String),
    #[error("Email and password are required")]
    MissingCredentials,
    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Raw values as typed into the record form.
#[derive(Debug, Clone, Default)]
pub struct RecordDraft {
    pub date: String,
    pub incident_count: String,
}

impl RecordDraft {
    pub fn new(date: impl Into<String>, incident_count: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            incident_count: incident_count.into(),
        }
    }

    pub fn validate(&self) -> Result<NewIncidentRecord, ValidationError> {
        let date = self.date.trim();
        if date.is_empty() {
            return Err(ValidationError::MissingDate);
        }
        let date = NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map_err(|_| ValidationError::InvalidDate(date.to_string()))?;

        let count = self.incident_count.trim();
        if count.is_empty() {
            return Err(ValidationError::MissingCount);
        }
        let count = match count.parse::<i64>() {
            Ok(value) if value >= 0 => value as u64,
            _ => return Err(ValidationError::InvalidCount(count.to_string())),
        };

        Ok(NewIncidentRecord::new(date, count))
    }
}

/// One page of the records table.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordsPage {
    pub records: Vec<IncidentRecord>,
    pub page: usize,
    pub total_pages: usize,
    pub total_records: usize,
}

/// Slice `records` into 1-based pages, clamping `page` into range.
pub fn paginate(records: &[IncidentRecord], page: usize, per_page: usize) -> RecordsPage {
    let per_page = per_page.max(1);
    let total_pages = records.len().div_ceil(per_page);
    let page = page.clamp(1, total_pages.max(1));

    let start = ((page - 1) * per_page).min(records.len());
    let end = (start + per_page).min(records.len());

    RecordsPage {
        records: records[start..end].to_vec(),
        page,
        total_pages,
        total_records: records.len(),
    }
}
