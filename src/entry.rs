//! # Entry model
//! The canonical daily record (`DailyEntry`), the raw form submission it is built
//! from (`RawEntry`), and the persisted document pairing both with its scores
//! (`EntryRecord`).
//!
//! Time-of-day values are kept as zero-padded `HH:MM` strings so that plain
//! string ordering matches chronological order within a day.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize::normalize_entry;
use crate::scoring::{compute_scores, ScoreBundle};

/// Attendance at one of the morning programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attendance {
    Present,
    Late,
    #[default]
    Absent,
}

impl Attendance {
    /// Points awarded by the soul rubric.
    pub fn points(self) -> u32 {
        match self {
            Attendance::Present => 5,
            Attendance::Late => 3,
            Attendance::Absent => 0,
        }
    }

    /// Exact token match after trimming; anything else (including `"PRESENT"`) is `Absent`.
    pub fn parse_token(raw: &str) -> Self {
        match raw.trim() {
            "present" => Attendance::Present,
            "late" => Attendance::Late,
            _ => Attendance::Absent,
        }
    }
}

static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})(?::\d{2})?$").expect("time-of-day regex"));

/// Zero-padded 24h `HH:MM`. Construction always goes through [`TimeOfDay::parse`],
/// so every value in the system is canonical.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(String);

impl TimeOfDay {
    /// Accepts `H:MM`, `HH:MM` and `HH:MM:SS` (seconds dropped).
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = TIME_RE.captures(raw.trim())?;
        let hour: u8 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u8 = caps.get(2)?.as_str().parse().ok()?;
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self(format!("{hour:02}:{minute:02}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid time of day: '{s}'"))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> Self {
        t.0
    }
}

/// Hearing minutes across the three sub-categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HearingMinutes {
    #[serde(default)]
    pub sp: u32,
    #[serde(default)]
    pub sm: u32,
    #[serde(default)]
    pub rsp: u32,
}

impl HearingMinutes {
    pub fn total(&self) -> u32 {
        self.sp.saturating_add(self.sm).saturating_add(self.rsp)
    }
}

/// Canonical daily entry, ready for scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wake_up_time: Option<TimeOfDay>,
    #[serde(default)]
    pub day_sleep_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_bed_time: Option<TimeOfDay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub japa_finish_time: Option<TimeOfDay>,
    #[serde(default)]
    pub shikshastakam_attendance: Attendance,
    #[serde(default)]
    pub mangal_aarti_attendance: Attendance,
    #[serde(default)]
    pub morning_class_attendance: Attendance,
    #[serde(default)]
    pub scripture_reading_minutes: u32,
    #[serde(default)]
    pub sloka_reading_minutes: u32,
    #[serde(default)]
    pub hearing_minutes: HearingMinutes,
    #[serde(default)]
    pub menial_service_minutes: u32,
    #[serde(default)]
    pub missionary_service_minutes: u32,
    #[serde(default)]
    pub harinam_service_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_note: Option<String>,
}

impl DailyEntry {
    pub fn attendance(&self) -> [Attendance; 3] {
        [
            self.shikshastakam_attendance,
            self.mangal_aarti_attendance,
            self.morning_class_attendance,
        ]
    }

    /// True when nothing the rubric looks at was logged: no times, every
    /// minute field zero, every program absent. Services and the note do not count.
    pub fn is_blank(&self) -> bool {
        self.wake_up_time.is_none()
            && self.to_bed_time.is_none()
            && self.japa_finish_time.is_none()
            && self.day_sleep_minutes == 0
            && self.scripture_reading_minutes == 0
            && self.sloka_reading_minutes == 0
            && self.hearing_minutes.total() == 0
            && self.attendance().iter().all(|a| *a == Attendance::Absent)
    }

    pub fn services(&self) -> ServiceSummary {
        ServiceSummary::new(
            self.menial_service_minutes,
            self.missionary_service_minutes,
            self.harinam_service_minutes,
        )
    }
}

/// Service minutes of the day. Informational only; services are not scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    pub menial_service: u32,
    pub missionary_service: u32,
    pub harinam_sankirtan: u32,
    pub total_service_time: u32,
}

impl ServiceSummary {
    pub fn new(menial: u32, missionary: u32, harinam: u32) -> Self {
        Self {
            menial_service: menial,
            missionary_service: missionary,
            harinam_sankirtan: harinam,
            total_service_time: menial.saturating_add(missionary).saturating_add(harinam),
        }
    }
}

/// Raw form submission: field name -> value as sent by the client.
///
/// Strings are taken as-is; JSON numbers are read through their decimal text;
/// `null`, booleans, arrays and objects count as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawEntry(BTreeMap<String, Value>);

impl RawEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter (handy for tests and fixtures).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<Cow<'_, str>> {
        match self.0.get(key)? {
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            _ => None,
        }
    }

    /// First readable value among `names` (form key first, then aliases).
    pub fn lookup(&self, names: &[&str]) -> Option<Cow<'_, str>> {
        names.iter().find_map(|n| self.get(n))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The persisted document for one user and one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRecord {
    pub date: NaiveDate,
    pub user_id: String,
    /// The submission exactly as received, for re-populating the entry form.
    pub form_data: RawEntry,
    pub entry: DailyEntry,
    pub service_data: ServiceSummary,
    pub scores: ScoreBundle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_note: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl EntryRecord {
    /// Normalize and score a submission. Never fails: malformed fields degrade to defaults.
    pub fn from_submission(
        user_id: impl Into<String>,
        date: NaiveDate,
        form_data: RawEntry,
        now: DateTime<Utc>,
    ) -> Self {
        let entry = normalize_entry(&form_data);
        let scores = compute_scores(&entry);
        Self {
            date,
            user_id: user_id.into(),
            service_data: entry.services(),
            daily_note: entry.daily_note.clone(),
            form_data,
            entry,
            scores,
            last_updated: now,
        }
    }
}
