//! # Stats
//! Read-side views built from persisted score bundles: today's score card, the
//! weekly trend, history rows, and the mentor overview. Nothing here re-scores
//! raw entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entry::EntryRecord;
use crate::profile::{Role, UserProfile};
use crate::scoring::{ScoreBundle, BODY_MAX, SADHANA_MAX, SOUL_MAX, TOTAL_MAX};

/// Totals at or above this grade `High` in history.
pub const HIGH_GRADE_MIN: u32 = 150;
/// Totals at or above this (and below `HIGH_GRADE_MIN`) grade `Medium`.
pub const MEDIUM_GRADE_MIN: u32 = 100;
/// Mentor filter: averages strictly below this need attention.
pub const LOW_AVERAGE_BELOW: u32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Gauge {
    pub current: u32,
    pub max: u32,
    pub percent: u32,
}

impl Gauge {
    pub fn new(current: u32, max: u32) -> Self {
        Self {
            current,
            max,
            percent: percent(current, max),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreCard {
    pub total: Gauge,
    pub body: Gauge,
    pub soul: Gauge,
    pub sadhana: Gauge,
}

impl From<ScoreBundle> for ScoreCard {
    fn from(s: ScoreBundle) -> Self {
        Self {
            total: Gauge::new(s.total, TOTAL_MAX),
            body: Gauge::new(s.body, BODY_MAX),
            soul: Gauge::new(s.soul, SOUL_MAX),
            sadhana: Gauge::new(s.sadhana, SADHANA_MAX),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    /// `MM-DD`, for chart axes.
    pub label: String,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub date: NaiveDate,
    pub today: ScoreCard,
    /// Oldest first.
    pub weekly: Vec<TrendPoint>,
}

/// `records` must be date descending (as returned by the store).
pub fn dashboard(records: &[EntryRecord], today: NaiveDate, trend_len: usize) -> DashboardStats {
    let today_scores = records
        .iter()
        .find(|r| r.date == today)
        .map_or(ScoreBundle::ZERO, |r| r.scores);

    let mut weekly: Vec<TrendPoint> = records
        .iter()
        .take(trend_len)
        .map(|r| TrendPoint {
            date: r.date,
            label: r.date.format("%m-%d").to_string(),
            total: r.scores.total,
        })
        .collect();
    weekly.reverse();

    DashboardStats {
        date: today,
        today: today_scores.into(),
        weekly,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    High,
    Medium,
    Low,
}

impl Grade {
    pub fn for_total(total: u32) -> Self {
        if total >= HIGH_GRADE_MIN {
            Grade::High
        } else if total >= MEDIUM_GRADE_MIN {
            Grade::Medium
        } else {
            Grade::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    pub date: NaiveDate,
    pub body: u32,
    pub soul: u32,
    pub sadhana: u32,
    pub total: u32,
    pub grade: Grade,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<&EntryRecord> for HistoryRow {
    fn from(r: &EntryRecord) -> Self {
        Self {
            date: r.date,
            body: r.scores.body,
            soul: r.scores.soul,
            sadhana: r.scores.sadhana,
            total: r.scores.total,
            grade: Grade::for_total(r.scores.total),
            note: r.daily_note.clone(),
        }
    }
}

pub fn history_rows(records: &[EntryRecord]) -> Vec<HistoryRow> {
    records.iter().map(HistoryRow::from).collect()
}

/* ----------------------------
Mentor overview
---------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MentorFilter {
    #[default]
    All,
    /// Average above `HIGH_GRADE_MIN`.
    High,
    /// Average below `LOW_AVERAGE_BELOW`.
    Low,
}

impl MentorFilter {
    pub fn matches(self, m: &MenteeSummary) -> bool {
        match self {
            MentorFilter::All => true,
            MentorFilter::High => m.average_total > HIGH_GRADE_MIN,
            MentorFilter::Low => m.average_total < LOW_AVERAGE_BELOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenteeSummary {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
    pub days_logged: u32,
    /// Mean persisted total over logged days, rounded; 0 with no days.
    pub average_total: u32,
    /// Logged days as a percentage of the window.
    pub consistency: u32,
    pub days_at_or_above_target: u32,
}

/// Aggregate one user's records from a `window_days` window.
pub fn summarize_mentee(
    profile: &UserProfile,
    records: &[EntryRecord],
    window_days: u32,
    target: u32,
) -> MenteeSummary {
    let days_logged = records.len() as u32;
    let sum: u64 = records.iter().map(|r| u64::from(r.scores.total)).sum();
    let average_total = if days_logged > 0 {
        (sum as f64 / f64::from(days_logged)).round() as u32
    } else {
        0
    };
    let days_at_or_above_target = records
        .iter()
        .filter(|r| r.scores.total >= target)
        .count() as u32;

    MenteeSummary {
        user_id: profile.user_id.clone(),
        display_name: profile.display_name.clone(),
        email: profile.email.clone(),
        role: profile.role,
        days_logged,
        average_total,
        consistency: percent(days_logged.min(window_days), window_days),
        days_at_or_above_target,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorOverview {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub window_days: u32,
    pub target: u32,
    pub filter: MentorFilter,
    pub mentees: Vec<MenteeSummary>,
}

fn percent(current: u32, max: u32) -> u32 {
    if max == 0 {
        return 0;
    }
    (f64::from(current) / f64::from(max) * 100.0).round() as u32
}
