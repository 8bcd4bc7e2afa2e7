// Time-since-incident timer state
use std::collections::VecDeque;

/// Completed durations kept for the rolling average.
pub const HISTORY_CAPACITY: usize = 10;

/// Elapsed-seconds counter driven by an external one-second tick.
///
/// Transitions return the duration they committed, if any, so the caller can
/// record it in the rolling history. Zero-length intervals are never committed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stopwatch {
    seconds: u64,
    running: bool,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start from zero. Restarting a running stopwatch commits the current run.
    pub fn start(&mut self) -> Option<u64> {
        let committed = self.commit_if_running();
        self.running = true;
        self.seconds = 0;
        committed
    }

    /// Stop ticking but keep the last value visible.
    pub fn stop(&mut self) -> Option<u64> {
        let committed = self.commit_if_running();
        self.running = false;
        committed
    }

    /// Stop ticking and clear the value.
    pub fn reset(&mut self) -> Option<u64> {
        let committed = self.commit_if_running();
        self.running = false;
        self.seconds = 0;
        committed
    }

    pub fn tick(&mut self) {
        if self.running {
            self.seconds = self.seconds.saturating_add(1);
        }
    }

    fn commit_if_running(&self) -> Option<u64> {
        (self.running && self.seconds > 0).then_some(self.seconds)
    }
}

/// Last [`HISTORY_CAPACITY`] completed durations, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollingHistory {
    entries: VecDeque<u64>,
}

impl RollingHistory {
    /// Keeps only the newest entries when given more than the capacity.
    pub fn from_entries(entries: impl IntoIterator<Item = u64>) -> Self {
        let mut history = Self::default();
        for entry in entries {
            history.push(entry);
        }
        history
    }

    pub fn push(&mut self, seconds: u64) {
        if self.entries.len() == HISTORY_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(seconds);
    }

    pub fn entries(&self) -> Vec<u64> {
        self.entries.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Arithmetic mean rounded to whole seconds.
    pub fn average_seconds(&self) -> Option<u64> {
        if self.is_empty() {
            return None;
        }
        let total: u64 = self.entries.iter().sum();
        Some((total as f64 / self.len() as f64).round() as u64)
    }

    pub fn average_time(&self) -> String {
        format_hms(self.average_seconds().unwrap_or(0))
    }
}

/// `HH:MM:SS`, hours are not wrapped at 24.
pub fn format_hms(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Colour band of the elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSeverity {
    Calm,
    Steady,
    Elevated,
    High,
    Critical,
}

impl TimerSeverity {
    pub fn for_seconds(seconds: u64) -> Self {
        match seconds {
            0..60 => Self::Calm,
            60..120 => Self::Steady,
            120..180 => Self::Elevated,
            180..240 => Self::High,
            _ => Self::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calm => "calm",
            Self::Steady => "steady",
            Self::Elevated => "elevated",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Elapsed time past which an incident is flagged as extended.
pub const EXTENDED_AFTER_SECS: u64 = 180;

/// Point-in-time view of a user's timer.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerSnapshot {
    pub seconds: u64,
    pub is_running: bool,
    pub elapsed: String,
    pub average_time: String,
    pub history: Vec<u64>,
    pub severity: TimerSeverity,
    pub extended: bool,
    pub progress_percent: f64,
}

impl TimerSnapshot {
    pub fn capture(stopwatch: &Stopwatch, history: &RollingHistory) -> Self {
        let seconds = stopwatch.seconds();
        Self {
            seconds,
            is_running: stopwatch.is_running(),
            elapsed: format_hms(seconds),
            average_time: history.average_time(),
            history: history.entries(),
            severity: TimerSeverity::for_seconds(seconds),
            extended: seconds >= EXTENDED_AFTER_SECS,
            // Progress ring fills over one hour
            progress_percent: (seconds as f64 / 3600.0 * 100.0).min(100.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticked(stopwatch: &mut Stopwatch, ticks: u64) {
        for _ in 0..ticks {
            stopwatch.tick();
        }
    }

    #[test]
    fn test_start_then_reset_commits_elapsed() {
        let mut stopwatch = Stopwatch::new();
        assert_eq!(stopwatch.start(), None);
        ticked(&mut stopwatch, 3);
        assert_eq!(stopwatch.seconds(), 3);

        assert_eq!(stopwatch.reset(), Some(3));
        assert_eq!(stopwatch.seconds(), 0);
        assert!(!stopwatch.is_running());
    }

    #[test]
    fn test_zero_duration_is_not_committed() {
        let mut stopwatch = Stopwatch::new();
        stopwatch.start();
        assert_eq!(stopwatch.reset(), None);
        stopwatch.start();
        assert_eq!(stopwatch.start(), None);
    }

    #[test]
    fn test_restart_commits_and_zeroes() {
        let mut stopwatch = Stopwatch::new();
        stopwatch.start();
        ticked(&mut stopwatch, 5);
        assert_eq!(stopwatch.start(), Some(5));
        assert_eq!(stopwatch.seconds(), 0);
        assert!(stopwatch.is_running());
    }

    #[test]
    fn test_stop_keeps_value_visible() {
        let mut stopwatch = Stopwatch::new();
        stopwatch.start();
        ticked(&mut stopwatch, 4);
        assert_eq!(stopwatch.stop(), Some(4));
        assert_eq!(stopwatch.seconds(), 4);

        stopwatch.tick();
        assert_eq!(stopwatch.seconds(), 4);

        // Already committed by the stop.
        assert_eq!(stopwatch.stop(), None);
        assert_eq!(stopwatch.reset(), None);
        assert_eq!(stopwatch.seconds(), 0);
    }

    #[test]
    fn test_idle_stopwatch_ignores_ticks() {
        let mut stopwatch = Stopwatch::new();
        ticked(&mut stopwatch, 3);
        assert_eq!(stopwatch.seconds(), 0);
    }

    #[test]
    fn test_history_average() {
        let history = RollingHistory::from_entries([10, 20, 30]);
        assert_eq!(history.average_seconds(), Some(20));
        assert_eq!(history.average_time(), "00:00:20");
    }

    #[test]
    fn test_empty_history_average() {
        let history = RollingHistory::default();
        assert_eq!(history.average_seconds(), None);
        assert_eq!(history.average_time(), "00:00:00");
    }

    #[test]
    fn test_history_is_capped() {
        let mut history = RollingHistory::from_entries(1..=12);
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.entries().first(), Some(&3));

        history.push(100);
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.entries().first(), Some(&4));
        assert_eq!(history.entries().last(), Some(&100));
    }

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(59), "00:00:59");
        assert_eq!(format_hms(3661), "01:01:01");
        assert_eq!(format_hms(90_000), "25:00:00");
    }

    #[test]
    fn test_severity_bands() {
        assert_eq!(TimerSeverity::for_seconds(0), TimerSeverity::Calm);
        assert_eq!(TimerSeverity::for_seconds(60), TimerSeverity::Steady);
        assert_eq!(TimerSeverity::for_seconds(179), TimerSeverity::Elevated);
        assert_eq!(TimerSeverity::for_seconds(180), TimerSeverity::High);
        assert_eq!(TimerSeverity::for_seconds(240), TimerSeverity::Critical);
    }

    #[test]
    fn test_snapshot() {
        let mut stopwatch = Stopwatch::new();
        stopwatch.start();
        for _ in 0..200 {
            stopwatch.tick();
        }
        let snapshot = TimerSnapshot::capture(&stopwatch, &RollingHistory::from_entries([60]));

        assert_eq!(snapshot.elapsed, "00:03:20");
        assert_eq!(snapshot.average_time, "00:01:00");
        assert!(snapshot.extended);
        assert_eq!(snapshot.severity, TimerSeverity::High);
        assert!(snapshot.progress_percent > 5.5 && snapshot.progress_percent < 5.6);
    }
}
