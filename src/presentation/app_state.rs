// Application state for HTTP handlers
use crate::application::auth_service::AuthService;
use crate::application::counter_service::CounterService;
use crate::application::notices::NoticeBoard;
use crate::application::record_service::RecordService;
use crate::application::statistics_service::StatisticsService;
use crate::application::streaming_service::StreamingDashboardService;
use crate::application::timer_service::TimerService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub counter_service: CounterService,
    pub timer_service: TimerService,
    pub record_service: RecordService,
    pub statistics_service: StatisticsService,
    pub streaming_service: StreamingDashboardService,
    pub notices: Arc<NoticeBoard>,
}
