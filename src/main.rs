// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::application::auth_service::AuthService;
use crate::application::counter_service::CounterService;
use crate::application::live_feed::LiveFeed;
use crate::application::notices::NoticeBoard;
use crate::application::record_service::RecordService;
use crate::application::statistics_service::StatisticsService;
use crate::application::streaming_service::StreamingDashboardService;
use crate::application::timer_service::TimerService;
use crate::infrastructure::config::load_settings;
use crate::infrastructure::file_history_store::FileHistoryStore;
use crate::infrastructure::firestore_repository::FirestoreRepository;
use crate::infrastructure::identity_toolkit::IdentityToolkit;
use crate::presentation::app_state::AppState;
use crate::presentation::router::router;

const DEFAULT_LOG_FILTER: &str = "le_traqueur=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    // Load configuration
    let settings = load_settings()?;
    let addr = settings.server.socket_addr()?;

    // Create adapters (infrastructure layer)
    let repository = Arc::new(FirestoreRepository::new(
        &settings.firebase.project_id,
        &settings.firebase.database,
    ));
    let identity = Arc::new(IdentityToolkit::new(settings.firebase.api_key.clone()));
    let history_store = Arc::new(FileHistoryStore::new(&settings.storage.history_dir));

    // Create services (application layer)
    let feed = Arc::new(LiveFeed::new());
    let notices = Arc::new(NoticeBoard::new(settings.dashboard.notice_ttl(), feed.clone()));
    let timer_service = TimerService::new(history_store, feed.clone());
    let counter_service = CounterService::new(
        repository.clone(),
        timer_service.clone(),
        feed.clone(),
        notices.clone(),
    );
    let statistics_service = StatisticsService::new(
        repository.clone(),
        notices.clone(),
        settings.dashboard.records_page_size,
    );
    let record_service = RecordService::new(repository.clone(), feed.clone(), notices.clone());
    let auth_service = AuthService::new(identity, repository, notices.clone())
        .with_idle_timeout(settings.auth.session_idle_timeout());
    let streaming_service = StreamingDashboardService::new(
        counter_service.clone(),
        timer_service.clone(),
        statistics_service.clone(),
        notices.clone(),
        feed,
    );

    // Create application state
    let state = Arc::new(AppState {
        auth_service,
        counter_service,
        timer_service: timer_service.clone(),
        record_service,
        statistics_service,
        streaming_service,
        notices,
    });

    // Open dashboard streams are closed on shutdown so connections can drain
    let streams = state.streaming_service.clone();
    let app = router(state);

    // Start server
    tracing::info!("Starting le-traqueur service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            streams.close_streams();
        })
        .await?;

    timer_service.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
