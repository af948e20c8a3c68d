//! Analytics log queries: time ranges, trends and daily goal tracking.

use crate::{AnalyticsLog, Error, Result};
use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Window of history to include, measured back from now
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    #[default]
    Week,
    Month,
    Year,
    All,
}

impl TimeRange {
    /// Earliest included timestamp, or None for all time
    pub fn start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TimeRange::Week => Some(now - Duration::days(7)),
            TimeRange::Month => now.checked_sub_months(Months::new(1)),
            TimeRange::Year => now.checked_sub_months(Months::new(12)),
            TimeRange::All => None,
        }
    }

    pub fn contains(&self, now: DateTime<Utc>, timestamp: DateTime<Utc>) -> bool {
        self.start(now).map_or(true, |start| timestamp >= start)
    }
}

impl FromStr for TimeRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "week" => Ok(TimeRange::Week),
            "month" => Ok(TimeRange::Month),
            "year" => Ok(TimeRange::Year),
            "all" => Ok(TimeRange::All),
            other => Err(Error::Config(format!(
                "Unknown time range '{}' (expected week, month, year or all)",
                other
            ))),
        }
    }
}

/// Logs within `range`, oldest first
pub fn filter_logs<'a>(
    logs: &[&'a AnalyticsLog],
    range: TimeRange,
    now: DateTime<Utc>,
) -> Vec<&'a AnalyticsLog> {
    let mut out: Vec<&AnalyticsLog> = logs
        .iter()
        .copied()
        .filter(|log| range.contains(now, log.timestamp))
        .collect();
    out.sort_by_key(|log| log.timestamp);
    out
}

/// Distinct series names, sorted
pub fn unique_names(logs: &[&AnalyticsLog]) -> Vec<String> {
    let mut names: Vec<String> = logs.iter().map(|log| log.name.clone()).collect();
    names.sort();
    names.dedup();
    names
}

/// Latest value of one series and its change from the entry before it
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub name: String,
    pub unit: Option<String>,
    pub entries: usize,
    pub latest: f64,
    pub latest_at: DateTime<Utc>,
    pub change: Option<f64>,
}

pub fn summarize(logs: &[&AnalyticsLog], name: &str) -> Option<SeriesSummary> {
    let mut series: Vec<&AnalyticsLog> = logs.iter().copied().filter(|l| l.name == name).collect();
    series.sort_by_key(|log| log.timestamp);

    let latest = *series.last()?;
    let change = series
        .len()
        .checked_sub(2)
        .map(|i| latest.value - series[i].value);

    Some(SeriesSummary {
        name: name.to_string(),
        unit: latest.unit.clone(),
        entries: series.len(),
        latest: latest.value,
        latest_at: latest.timestamp,
        change,
    })
}

/// One calendar day of a cumulative series
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: f64,
    pub goal: Option<f64>,
}

impl DailyTotal {
    pub fn goal_met(&self) -> bool {
        self.goal.is_some_and(|goal| self.total >= goal)
    }
}

/// Per-day sums for a cumulative series (UTC days, oldest first)
///
/// Non-cumulative entries are ignored. The goal for a day is the most recent
/// goal recorded on that day.
pub fn daily_totals(logs: &[&AnalyticsLog], name: &str) -> Vec<DailyTotal> {
    let mut entries: Vec<&AnalyticsLog> = logs
        .iter()
        .copied()
        .filter(|l| l.name == name && l.is_cumulative())
        .collect();
    entries.sort_by_key(|log| log.timestamp);

    let mut days: BTreeMap<NaiveDate, DailyTotal> = BTreeMap::new();
    for log in entries {
        let date = log.timestamp.date_naive();
        let day = days.entry(date).or_insert(DailyTotal {
            date,
            total: 0.0,
            goal: None,
        });
        day.total += log.value;
        if log.daily_goal.is_some() {
            day.goal = log.daily_goal;
        }
    }
    days.into_values().collect()
}
