//! # Entry Normalizer
//! Turns a raw, possibly partial, stringly-typed form submission into a canonical
//! [`DailyEntry`]. Total over its input: whatever cannot be read falls back to the
//! field default (0 minutes, `absent`, unset time).

use crate::entry::{Attendance, DailyEntry, HearingMinutes, RawEntry, TimeOfDay};

/// Accepted field names: the form key first, then the canonical record name.
pub mod fields {
    pub const WAKE_UP_TIME: &[&str] = &["wakeUpTime"];
    pub const DAY_SLEEP: &[&str] = &["daySleep", "daySleepMinutes"];
    pub const TO_BED_TIME: &[&str] = &["toBedTime"];
    pub const JAPA_TIME: &[&str] = &["japaTime", "japaFinishTime"];
    pub const SHIKSHASTAKAM: &[&str] = &["shikshastakam", "shikshastakamAttendance"];
    pub const MANGAL_AARTI: &[&str] = &["mangalAarti", "mangalAartiAttendance"];
    pub const MORNING_CLASS: &[&str] = &["morningClass", "morningClassAttendance"];
    pub const READ_SP: &[&str] = &["readSpMins", "scriptureReadingMinutes"];
    pub const READ_SLOKA: &[&str] = &["readSlokaMins", "slokaReadingMinutes"];
    pub const HEAR_SP: &[&str] = &["hearSpMins"];
    pub const HEAR_SM: &[&str] = &["hearSmMins"];
    pub const HEAR_RSP: &[&str] = &["hearRspMins"];
    pub const MENIAL: &[&str] = &["menialService", "menialServiceMinutes"];
    pub const MISSIONARY: &[&str] = &["missionaryService", "missionaryServiceMinutes"];
    pub const HARINAM: &[&str] = &["harinamSankirtan", "harinamServiceMinutes"];
    pub const DAILY_NOTE: &[&str] = &["dailyNote"];
}

/// Build the canonical entry from a raw submission.
pub fn normalize_entry(raw: &RawEntry) -> DailyEntry {
    let minutes = |names: &[&str]| raw.lookup(names).map_or(0, |v| parse_minutes(&v));
    let time = |names: &[&str]| raw.lookup(names).and_then(|v| TimeOfDay::parse(&v));
    let attendance = |names: &[&str]| {
        raw.lookup(names)
            .map_or(Attendance::Absent, |v| Attendance::parse_token(&v))
    };

    DailyEntry {
        wake_up_time: time(fields::WAKE_UP_TIME),
        day_sleep_minutes: minutes(fields::DAY_SLEEP),
        to_bed_time: time(fields::TO_BED_TIME),
        japa_finish_time: time(fields::JAPA_TIME),
        shikshastakam_attendance: attendance(fields::SHIKSHASTAKAM),
        mangal_aarti_attendance: attendance(fields::MANGAL_AARTI),
        morning_class_attendance: attendance(fields::MORNING_CLASS),
        scripture_reading_minutes: minutes(fields::READ_SP),
        sloka_reading_minutes: minutes(fields::READ_SLOKA),
        hearing_minutes: HearingMinutes {
            sp: minutes(fields::HEAR_SP),
            sm: minutes(fields::HEAR_SM),
            rsp: minutes(fields::HEAR_RSP),
        },
        menial_service_minutes: minutes(fields::MENIAL),
        missionary_service_minutes: minutes(fields::MISSIONARY),
        harinam_service_minutes: minutes(fields::HARINAM),
        daily_note: raw.lookup(fields::DAILY_NOTE).and_then(|v| normalize_note(&v)),
    }
}

/// Lenient integer read: surrounding whitespace and trailing garbage are ignored
/// (`"15 min"` -> 15, `"12.5"` -> 12). No leading digits -> 0.
/// Negative values clamp to 0; overflow saturates.
pub fn parse_minutes(raw: &str) -> u32 {
    let s = raw.trim();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..end];
    if negative || digits.is_empty() {
        return 0;
    }
    digits.bytes().fold(0u32, |acc, d| {
        acc.saturating_mul(10).saturating_add(u32::from(d - b'0'))
    })
}

fn normalize_note(raw: &str) -> Option<String> {
    let t = raw.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}
