// Firestore REST implementation of the incident repository
use crate::application::incident_repository::IncidentRepository;
use crate::domain::incident::{IncidentRecord, NewIncidentRecord, DATE_FORMAT};
use crate::domain::session::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Map, Value};

const FIRESTORE_HOST: &str = "https://firestore.googleapis.com";
const RECORDS_COLLECTION: &str = "daily_incidents";

#[derive(Debug, Clone)]
pub struct FirestoreRepository {
    client: reqwest::Client,
    documents_url: String,
}

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
    #[serde(default, rename = "createTime")]
    create_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<Document>,
}

impl FirestoreRepository {
    pub fn new(project_id: &str, database: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            documents_url: format!(
                "{}/v1/projects/{}/databases/{}/documents",
                FIRESTORE_HOST, project_id, database
            ),
        }
    }

    fn user_url(&self, uid: &str) -> String {
        format!("{}/users/{}", self.documents_url, urlencoding::encode(uid))
    }

    fn counter_url(&self, uid: &str) -> String {
        format!("{}/incident_count/counter", self.user_url(uid))
    }

    /// Send an authenticated request; a 404 comes back as `None`
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        session: &Session,
    ) -> Result<Option<Value>> {
        let response = request
            .bearer_auth(&session.id_token)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to Firestore")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Firestore request failed with status {}: {}", status, body);
        }

        let data = response
            .json::<Value>()
            .await
            .context("Failed to parse Firestore response")?;

        Ok(Some(data))
    }
}

#[async_trait]
impl IncidentRepository for FirestoreRepository {
    async fn initialize_user(&self, session: &Session) -> Result<()> {
        let now = timestamp_value(Utc::now());
        let email = match &session.email {
            Some(email) => json!({ "stringValue": email }),
            None => json!({ "nullValue": null }),
        };

        let request = self
            .client
            .patch(self.user_url(&session.uid))
            .query(&[
                ("updateMask.fieldPaths", "email"),
                ("updateMask.fieldPaths", "createdAt"),
            ])
            .json(&json!({ "fields": { "email": email, "createdAt": now } }));
        self.execute(request, session).await?;

        if self.get_incident_count(session).await?.is_some() {
            return Ok(());
        }

        tracing::info!("Creating incident counter for {}", session.uid);
        let request = self
            .client
            .patch(self.counter_url(&session.uid))
            .json(&json!({
                "fields": {
                    "incidents": integer_value(0),
                    "lastUpdated": now,
                    "createdAt": now,
                    "metadata": { "mapValue": { "fields": {
                        "version": { "stringValue": "1.0" },
                        "type": { "stringValue": "incident_counter" },
                    } } },
                }
            }));
        self.execute(request, session).await?;

        Ok(())
    }

    async fn get_incident_count(&self, session: &Session) -> Result<Option<u64>> {
        let request = self.client.get(self.counter_url(&session.uid));
        let Some(data) = self.execute(request, session).await? else {
            return Ok(None);
        };

        let document: Document =
            serde_json::from_value(data).context("Unexpected counter document")?;
        Ok(Some(integer_field(&document.fields, "incidents").unwrap_or(0)))
    }

    async fn set_incident_count(&self, session: &Session, incidents: u64) -> Result<()> {
        tracing::debug!("Writing incident count {} for {}", incidents, session.uid);
        let request = self
            .client
            .patch(self.counter_url(&session.uid))
            .query(&[
                ("updateMask.fieldPaths", "incidents"),
                ("updateMask.fieldPaths", "lastUpdated"),
                ("currentDocument.exists", "true"),
            ])
            .json(&json!({
                "fields": {
                    "incidents": integer_value(incidents),
                    "lastUpdated": timestamp_value(Utc::now()),
                }
            }));

        if self.execute(request, session).await?.is_none() {
            anyhow::bail!("Incident counter of {} does not exist", session.uid);
        }
        Ok(())
    }

    async fn list_records(&self, session: &Session) -> Result<Vec<IncidentRecord>> {
        let request = self
            .client
            .post(format!("{}:runQuery", self.user_url(&session.uid)))
            .json(&json!({
                "structuredQuery": {
                    "from": [{ "collectionId": RECORDS_COLLECTION }],
                    "orderBy": [{
                        "field": { "fieldPath": "createdAt" },
                        "direction": "ASCENDING",
                    }],
                }
            }));

        let Some(data) = self.execute(request, session).await? else {
            return Ok(Vec::new());
        };

        let items: Vec<RunQueryItem> =
            serde_json::from_value(data).context("Unexpected runQuery response")?;

        let records: Vec<IncidentRecord> = items
            .into_iter()
            .filter_map(|item| item.document)
            .filter_map(|document| {
                let record = record_from_document(&document);
                if record.is_none() {
                    tracing::warn!("Skipping malformed incident record {}", document.name);
                }
                record
            })
            .collect();

        tracing::debug!("Fetched {} records for {}", records.len(), session.uid);
        Ok(records)
    }

    async fn append_record(
        &self,
        session: &Session,
        record: &NewIncidentRecord,
    ) -> Result<IncidentRecord> {
        let request = self
            .client
            .post(format!("{}/{}", self.user_url(&session.uid), RECORDS_COLLECTION))
            .json(&record_fields(record, Utc::now()));

        let data = self
            .execute(request, session)
            .await?
            .context("Firestore did not return the created record")?;
        let document: Document =
            serde_json::from_value(data).context("Unexpected record document")?;

        record_from_document(&document).context("Created record could not be read back")
    }
}

fn integer_value(value: u64) -> Value {
    json!({ "integerValue": value.to_string() })
}

fn timestamp_value(at: DateTime<Utc>) -> Value {
    json!({ "timestampValue": at.to_rfc3339_opts(SecondsFormat::Micros, true) })
}

fn record_fields(record: &NewIncidentRecord, created_at: DateTime<Utc>) -> Value {
    json!({
        "fields": {
            "date": { "stringValue": record.date.format(DATE_FORMAT).to_string() },
            "day": { "stringValue": record.day },
            "incidentCount": integer_value(record.incident_count),
            "createdAt": timestamp_value(created_at),
        }
    })
}

fn string_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key)?.get("stringValue")?.as_str()
}

/// Integers arrive as strings; numbers written by other clients may be
/// doubles, accepted only when whole and non-negative
fn integer_field(fields: &Map<String, Value>, key: &str) -> Option<u64> {
    let value = fields.get(key)?;
    if let Some(integer) = value.get("integerValue") {
        return match integer {
            Value::String(s) => s.parse().ok(),
            other => other.as_u64(),
        };
    }
    value
        .get("doubleValue")?
        .as_f64()
        .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= u64::MAX as f64)
        .map(|v| v as u64)
}

fn timestamp_field(fields: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    let raw = fields.get(key)?.get("timestampValue")?.as_str()?;
    parse_timestamp(raw)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

fn record_from_document(document: &Document) -> Option<IncidentRecord> {
    let id = document.name.rsplit('/').next()?.to_string();
    let date = NaiveDate::parse_from_str(string_field(&document.fields, "date")?, DATE_FORMAT).ok()?;
    let day = string_field(&document.fields, "day")
        .map(str::to_string)
        .unwrap_or_else(|| crate::domain::incident::weekday_name(date));
    let incident_count = integer_field(&document.fields, "incidentCount")?;
    let created_at = timestamp_field(&document.fields, "createdAt")
        .or_else(|| document.create_time.as_deref().and_then(parse_timestamp))
        .unwrap_or_else(Utc::now);

    Some(IncidentRecord::new(id, date, day, incident_count, created_at))
}
