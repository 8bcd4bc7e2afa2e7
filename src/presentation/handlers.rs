// HTTP request handlers
use crate::application::errors::TrackerError;
use crate::domain::counter::CounterAction;
use crate::domain::incident::RecordDraft;
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::infrastructure::json_mapper::{
    counter_to_json, dashboard_to_json, record_to_json, records_page_to_json,
    signed_in_to_json, statistics_to_json, timer_to_json,
};
use crate::presentation::app_state::AppState;
use crate::presentation::auth::CurrentSession;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OAuthBody {
    pub provider_id: String,
    pub id_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PasswordResetBody {
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfirmResetBody {
    pub code: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// The form sends the count either as a number or as the raw input text
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordBody {
    pub date: String,
    pub incident_count: Value,
}

impl RecordBody {
    fn into_draft(self) -> RecordDraft {
        let count = match self.incident_count {
            Value::Null => String::new(),
            Value::String(s) => s,
            other => other.to_string(),
        };
        RecordDraft::new(self.date, count)
    }
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
}

async fn respond<T: Serialize>(headers: &HeaderMap, status: StatusCode, data: T) -> Response {
    match json_response(status, &data, accepts_brotli(headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

async fn respond_result<T: Serialize>(
    headers: &HeaderMap,
    status: StatusCode,
    result: Result<T, TrackerError>,
) -> Response {
    match result {
        Ok(data) => respond(headers, status, data).await,
        Err(e) => e.into_response(),
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn sign_in(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CredentialsBody>,
) -> Response {
    let result = state
        .auth_service
        .sign_in(&body.email, &body.password)
        .await
        .map(signed_in_to_json);
    respond_result(&headers, StatusCode::OK, result).await
}

pub async fn sign_up(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CredentialsBody>,
) -> Response {
    let result = state
        .auth_service
        .sign_up(&body.email, &body.password)
        .await
        .map(signed_in_to_json);
    respond_result(&headers, StatusCode::CREATED, result).await
}

pub async fn sign_in_with_oauth(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(body): Json<OAuthBody>,
) -> Response {
    let result = state
        .auth_service
        .sign_in_with_oauth(&body.provider_id, &body.id_token)
        .await
        .map(signed_in_to_json);
    respond_result(&headers, StatusCode::OK, result).await
}

pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PasswordResetBody>,
) -> Response {
    match state.auth_service.request_password_reset(&body.email).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn confirm_password_reset(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConfirmResetBody>,
) -> Response {
    match state
        .auth_service
        .confirm_password_reset(&body.code, &body.new_password, &body.confirm_password)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn sign_out(current: CurrentSession, State(state): State<Arc<AppState>>) -> Response {
    state.auth_service.sign_out(&current.token).await;
    StatusCode::NO_CONTENT.into_response()
}

pub async fn dashboard(
    current: CurrentSession,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let result = state
        .streaming_service
        .snapshot(&current.session)
        .await
        .map(dashboard_to_json);
    respond_result(&headers, StatusCode::OK, result).await
}

/// Snapshot first, then live updates until the client goes away
pub async fn stream_dashboard(
    current: CurrentSession,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state
        .streaming_service
        .stream_dashboard(&current.session)
        .await
    {
        Ok(rx) => stream_from_receiver(rx, accepts_brotli(&headers)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn dismiss_notice(current: CurrentSession, State(state): State<Arc<AppState>>) -> Response {
    state.notices.dismiss(&current.session.uid).await;
    StatusCode::NO_CONTENT.into_response()
}

async fn apply_counter(
    current: CurrentSession,
    headers: HeaderMap,
    state: Arc<AppState>,
    action: CounterAction,
) -> Response {
    let result = state
        .counter_service
        .apply(&current.session, action)
        .await
        .map(counter_to_json);
    respond_result(&headers, StatusCode::OK, result).await
}

pub async fn increment_counter(
    current: CurrentSession,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    apply_counter(current, headers, state, CounterAction::Increment).await
}

pub async fn decrement_counter(
    current: CurrentSession,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    apply_counter(current, headers, state, CounterAction::Decrement).await
}

pub async fn reset_counter(
    current: CurrentSession,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    apply_counter(current, headers, state, CounterAction::Reset).await
}

pub async fn timer(
    current: CurrentSession,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let snapshot = state.timer_service.snapshot(&current.session.uid).await;
    respond(&headers, StatusCode::OK, timer_to_json(snapshot)).await
}

pub async fn start_timer(
    current: CurrentSession,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let snapshot = state.timer_service.start(&current.session.uid).await;
    respond(&headers, StatusCode::OK, timer_to_json(snapshot)).await
}

pub async fn stop_timer(
    current: CurrentSession,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let snapshot = state.timer_service.stop(&current.session.uid).await;
    respond(&headers, StatusCode::OK, timer_to_json(snapshot)).await
}

pub async fn reset_timer(
    current: CurrentSession,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let snapshot = state.timer_service.reset(&current.session.uid).await;
    respond(&headers, StatusCode::OK, timer_to_json(snapshot)).await
}

pub async fn list_records(
    current: CurrentSession,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let page = query.page.unwrap_or(1);
    let result = state
        .statistics_service
        .records_page(&current.session, page)
        .await
        .map(records_page_to_json);
    respond_result(&headers, StatusCode::OK, result).await
}

pub async fn add_record(
    current: CurrentSession,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(body): Json<RecordBody>,
) -> Response {
    let result = state
        .record_service
        .add_record(&current.session, &body.into_draft())
        .await
        .map(|record| json!({ "record": record_to_json(record) }));
    respond_result(&headers, StatusCode::CREATED, result).await
}

pub async fn statistics(
    current: CurrentSession,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let result = state
        .statistics_service
        .statistics(&current.session)
        .await
        .map(statistics_to_json);
    respond_result(&headers, StatusCode::OK, result).await
}
