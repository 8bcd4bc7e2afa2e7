// Weekly aggregation over the incident time series
use super::incident::IncidentRecord;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklySummary {
    pub week: String,
    pub average: f64,
    pub days_count: usize,
}

/// Records handed to the aggregation must be in non-decreasing date order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record {index} is dated {found}, which precedes {previous}")]
pub struct OrderingError {
    pub index: usize,
    pub previous: NaiveDate,
    pub found: NaiveDate,
}

/// Group ordered records into week buckets and average each bucket.
///
/// A bucket closes on a Sunday record, on the last record, or when the next
/// record falls on a Monday. The first bucket is labelled from the Monday of
/// the first record's week; every later bucket is labelled from its own first
/// record's date, so a bucket opened mid-week after a gap carries that
/// mid-week date as its start.
pub fn compute_weekly_averages(
    records: &[IncidentRecord],
) -> Result<Vec<WeeklySummary>, OrderingError> {
    check_order(records)?;

    let Some(first) = records.first() else {
        return Ok(Vec::new());
    };

    let mut summaries = Vec::new();
    let mut week_start = monday_of(first.date);
    let mut total: u64 = 0;
    let mut days: usize = 0;

    for (index, record) in records.iter().enumerate() {
        let next = records.get(index + 1);

        total += record.incident_count;
        days += 1;

        let closes = record.date.weekday() == Weekday::Sun
            || next.is_none_or(|n| n.date.weekday() == Weekday::Mon);

        if closes {
            summaries.push(WeeklySummary {
                week: week_label(week_start, record.date),
                average: round2(total as f64 / days as f64),
                days_count: days,
            });

            total = 0;
            days = 0;

            if let Some(next) = next {
                week_start = next.date;
            }
        }
    }

    Ok(summaries)
}

fn check_order(records: &[IncidentRecord]) -> Result<(), OrderingError> {
    for (index, pair) in records.windows(2).enumerate() {
        if pair[1].date < pair[0].date {
            return Err(OrderingError {
                index: index + 1,
                previous: pair[0].date,
                found: pair[1].date,
            });
        }
    }
    Ok(())
}

/// Monday of the week containing `date`; Sunday belongs to the week that
/// started six days earlier.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

/// "Jan 1 - Jan 7"
pub fn week_label(start: NaiveDate, end: NaiveDate) -> String {
    format!("{} - {}", start.format("%b %-d"), end.format("%b %-d"))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
