// Dashboard domain model
use super::incident::IncidentRecord;
use super::timer::TimerSnapshot;
use super::weekly::WeeklySummary;

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub email: Option<String>,
    pub incidents: u64,
    pub timer: TimerSnapshot,
    pub weekly: Vec<WeeklySummary>,
    pub notice: Option<String>,
}

impl Dashboard {
    pub fn new(
        email: Option<String>,
        incidents: u64,
        timer: TimerSnapshot,
        weekly: Vec<WeeklySummary>,
        notice: Option<String>,
    ) -> Self {
        Self {
            email,
            incidents,
            timer,
            weekly,
            notice,
        }
    }
}

/// Statistics view: weekly buckets plus the raw series for the graph.
#[derive(Debug, Clone)]
pub struct Statistics {
    pub weekly: Vec<WeeklySummary>,
    pub graph: Vec<GraphPoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphPoint {
    pub date: String,
    pub incident_count: u64,
}

impl From<&IncidentRecord> for GraphPoint {
    fn from(record: &IncidentRecord) -> Self {
        Self {
            date: record.date.to_string(),
            incident_count: record.incident_count,
        }
    }
}
