// Mapper to convert domain models to JSON wire types
use crate::application::auth_service::SignedIn;
use crate::application::live_feed::LiveUpdate;
use crate::application::streaming_service::StreamMessage;
use crate::domain::counter::CounterOutcome;
use crate::domain::dashboard::{Dashboard, GraphPoint, Statistics};
use crate::domain::incident::{IncidentRecord, RecordsPage, DATE_FORMAT};
use crate::domain::timer::TimerSnapshot;
use crate::domain::weekly::WeeklySummary;
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDto {
    pub email: Option<String>,
    pub incidents: u64,
    pub timer: TimerDto,
    pub weekly: Vec<WeeklyDto>,
    pub notice: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerDto {
    pub seconds: u64,
    pub is_running: bool,
    pub elapsed: String,
    pub average_time: String,
    pub history: Vec<u64>,
    pub severity: &'static str,
    pub extended: bool,
    pub progress_percent: f64,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyDto {
    pub week: String,
    pub average: f64,
    pub days_count: usize,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordDto {
    pub id: String,
    pub date: String,
    pub day: String,
    pub incident_count: u64,
    pub created_at: String,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordsPageDto {
    pub records: Vec<RecordDto>,
    pub page: usize,
    pub total_pages: usize,
    pub total_records: usize,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphPointDto {
    pub date: String,
    pub incident_count: u64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct StatisticsDto {
    pub weekly: Vec<WeeklyDto>,
    pub graph: Vec<GraphPointDto>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CounterDto {
    pub incidents: u64,
    pub action: &'static str,
    pub changed: bool,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SignedInDto {
    pub token: String,
    pub uid: String,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessageDto {
    Snapshot { dashboard: DashboardDto },
    Counter { incidents: u64 },
    Record { record: RecordDto },
    Timer { timer: TimerDto },
    Notice { message: String },
    NoticeCleared,
}

pub fn dashboard_to_json(dashboard: Dashboard) -> DashboardDto {
    DashboardDto {
        email: dashboard.email,
        incidents: dashboard.incidents,
        timer: timer_to_json(dashboard.timer),
        weekly: weekly_to_json(dashboard.weekly),
        notice: dashboard.notice,
    }
}

pub fn timer_to_json(timer: TimerSnapshot) -> TimerDto {
    TimerDto {
        seconds: timer.seconds,
        is_running: timer.is_running,
        elapsed: timer.elapsed,
        average_time: timer.average_time,
        history: timer.history,
        severity: timer.severity.as_str(),
        extended: timer.extended,
        progress_percent: timer.progress_percent,
    }
}

pub fn weekly_to_json(weekly: Vec<WeeklySummary>) -> Vec<WeeklyDto> {
    weekly
        .into_iter()
        .map(|summary| WeeklyDto {
            week: summary.week,
            average: summary.average,
            days_count: summary.days_count,
        })
        .collect()
}

pub fn record_to_json(record: IncidentRecord) -> RecordDto {
    RecordDto {
        id: record.id,
        date: record.date.format(DATE_FORMAT).to_string(),
        day: record.day,
        incident_count: record.incident_count,
        created_at: record.created_at.to_rfc3339(),
    }
}

pub fn records_page_to_json(page: RecordsPage) -> RecordsPageDto {
    RecordsPageDto {
        records: page.records.into_iter().map(record_to_json).collect(),
        page: page.page,
        total_pages: page.total_pages,
        total_records: page.total_records,
    }
}

pub fn statistics_to_json(statistics: Statistics) -> StatisticsDto {
    StatisticsDto {
        weekly: weekly_to_json(statistics.weekly),
        graph: statistics.graph.into_iter().map(graph_point_to_json).collect(),
    }
}

fn graph_point_to_json(point: GraphPoint) -> GraphPointDto {
    GraphPointDto {
        date: point.date,
        incident_count: point.incident_count,
    }
}

pub fn counter_to_json(outcome: CounterOutcome) -> CounterDto {
    CounterDto {
        incidents: outcome.incidents,
        action: outcome.action.as_str(),
        changed: outcome.changed,
    }
}

pub fn signed_in_to_json(signed_in: SignedIn) -> SignedInDto {
    SignedInDto {
        token: signed_in.token,
        uid: signed_in.uid,
        email: signed_in.email,
    }
}

pub fn stream_message_to_json(message: StreamMessage) -> StreamMessageDto {
    match message {
        StreamMessage::Snapshot(dashboard) => StreamMessageDto::Snapshot {
            dashboard: dashboard_to_json(*dashboard),
        },
        StreamMessage::Update(LiveUpdate::Counter(incidents)) => {
            StreamMessageDto::Counter { incidents }
        }
        StreamMessage::Update(LiveUpdate::Record(record)) => StreamMessageDto::Record {
            record: record_to_json(record),
        },
        StreamMessage::Update(LiveUpdate::Timer(timer)) => StreamMessageDto::Timer {
            timer: timer_to_json(timer),
        },
        StreamMessage::Update(LiveUpdate::Notice(message)) => StreamMessageDto::Notice { message },
        StreamMessage::Update(LiveUpdate::NoticeCleared) => StreamMessageDto::NoticeCleared,
    }
}
