// In-memory fakes for exercising the use cases without remote services
use crate::application::errors::TrackerError;
use crate::application::history_store::HistoryStore;
use crate::application::identity_provider::IdentityProvider;
use crate::application::incident_repository::IncidentRepository;
use crate::domain::incident::{IncidentRecord, NewIncidentRecord};
use crate::domain::session::{AuthFailure, Session};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn session(uid: &str) -> Session {
    Session::new(
        uid.to_string(),
        Some(format!("{uid}@example.com")),
        format!("id-token-{uid}"),
        format!("refresh-{uid}"),
        3600,
    )
}

#[derive(Default)]
struct MemoryState {
    users: HashSet<String>,
    counters: HashMap<String, u64>,
    records: HashMap<String, Vec<IncidentRecord>>,
    next_id: usize,
}

#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
    fail: AtomicBool,
    counter_writes: AtomicUsize,
}

impl MemoryRepository {
    pub fn with_counter(uid: &str, incidents: u64) -> Self {
        let repository = Self::default();
        repository
            .state
            .lock()
            .unwrap()
            .counters
            .insert(uid.to_string(), incidents);
        repository
    }

    pub fn fail_requests(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn counter_writes(&self) -> usize {
        self.counter_writes.load(Ordering::SeqCst)
    }

    pub fn counter(&self, uid: &str) -> Option<u64> {
        self.state.lock().unwrap().counters.get(uid).copied()
    }

    pub fn is_initialized(&self, uid: &str) -> bool {
        self.state.lock().unwrap().users.contains(uid)
    }

    pub fn seed_record(&self, uid: &str, record: IncidentRecord) {
        self.state
            .lock()
            .unwrap()
            .records
            .entry(uid.to_string())
            .or_default()
            .push(record);
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("document store unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl IncidentRepository for MemoryRepository {
    async fn initialize_user(&self, session: &Session) -> anyhow::Result<()> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        state.users.insert(session.uid.clone());
        state.counters.entry(session.uid.clone()).or_insert(0);
        Ok(())
    }

    async fn get_incident_count(&self, session: &Session) -> anyhow::Result<Option<u64>> {
        self.check()?;
        Ok(self.counter(&session.uid))
    }

    async fn set_incident_count(&self, session: &Session, incidents: u64) -> anyhow::Result<()> {
        self.check()?;
        self.counter_writes.fetch_add(1, Ordering::SeqCst);
        self.state
            .lock()
            .unwrap()
            .counters
            .insert(session.uid.clone(), incidents);
        Ok(())
    }

    async fn list_records(&self, session: &Session) -> anyhow::Result<Vec<IncidentRecord>> {
        self.check()?;
        let state = self.state.lock().unwrap();
        Ok(state.records.get(&session.uid).cloned().unwrap_or_default())
    }

    async fn append_record(
        &self,
        session: &Session,
        record: &NewIncidentRecord,
    ) -> anyhow::Result<IncidentRecord> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let stored = IncidentRecord::new(
            format!("record-{}", state.next_id),
            record.date,
            record.day.clone(),
            record.incident_count,
            Utc::now(),
        );
        state
            .records
            .entry(session.uid.clone())
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }
}

#[derive(Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<HashMap<String, Vec<u64>>>,
}

impl MemoryHistoryStore {
    pub fn seed(&self, key: &str, entries: Vec<u64>) {
        self.entries.lock().unwrap().insert(key.to_string(), entries);
    }

    pub fn entries(&self, key: &str) -> Vec<u64> {
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn load(&self, key: &str) -> anyhow::Result<Vec<u64>> {
        Ok(self.entries(key))
    }

    async fn save(&self, key: &str, entries: &[u64]) -> anyhow::Result<()> {
        self.seed(key, entries.to_vec());
        Ok(())
    }
}

/// Accepts any email with the password "hunter22"; uid is the email's local part.
#[derive(Default)]
pub struct StubIdentity {
    pub reset_requests: Mutex<Vec<String>>,
    pub refreshes: AtomicUsize,
}

pub const STUB_PASSWORD: &str = "hunter22";

#[async_trait]
impl IdentityProvider for StubIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, TrackerError> {
        if password != STUB_PASSWORD {
            return Err(AuthFailure::from_provider_code("INVALID_LOGIN_CREDENTIALS").into());
        }
        let uid = email.split('@').next().unwrap_or(email);
        Ok(session(uid))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, TrackerError> {
        if password.len() < 6 {
            return Err(AuthFailure::from_provider_code("WEAK_PASSWORD : too short").into());
        }
        self.sign_in(email, STUB_PASSWORD).await
    }

    async fn sign_in_with_idp(
        &self,
        provider_id: &str,
        id_token: &str,
    ) -> Result<Session, TrackerError> {
        if provider_id != "google.com" || id_token.is_empty() {
            return Err(AuthFailure::from_provider_code("INVALID_IDP_RESPONSE").into());
        }
        Ok(session("oauth-user"))
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), TrackerError> {
        self.reset_requests.lock().unwrap().push(email.to_string());
        Ok(())
    }

    async fn confirm_password_reset(
        &self,
        code: &str,
        _new_password: &str,
    ) -> Result<(), TrackerError> {
        if code != "valid-code" {
            return Err(AuthFailure::from_provider_code("INVALID_OOB_CODE").into());
        }
        Ok(())
    }

    async fn refresh(&self, session: &Session) -> Result<Session, TrackerError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        let mut refreshed = session.clone();
        refreshed.id_token = format!("{}-refreshed", session.id_token);
        refreshed.expires_at = Utc::now() + chrono::Duration::seconds(3600);
        Ok(refreshed)
    }
}
