//! # Scoring Engine
//! Pure, testable rubric that maps a canonical [`DailyEntry`] to a [`ScoreBundle`].
//! No I/O and no configuration: the same entry always yields the same bundle, so
//! historical entries can be re-scored at any time.
//!
//! Rubric: banded thresholds (inclusive `<=`, first match wins) for times and day
//! sleep, categorical weights for attendance, linear caps for reading and hearing.
//! Only the four outputs are rounded; components stay unrounded until then.

use serde::{Deserialize, Serialize};

use crate::entry::{DailyEntry, TimeOfDay};

pub const BODY_MAX: u32 = 75;
pub const SOUL_MAX: u32 = 40;
pub const SADHANA_MAX: u32 = 65;
pub const TOTAL_MAX: u32 = BODY_MAX + SOUL_MAX + SADHANA_MAX;

const WAKE_UP_BANDS: &[(&str, f64)] = &[
    ("04:30", 25.0),
    ("04:40", 20.0),
    ("04:45", 15.0),
    ("05:00", 10.0),
];

const DAY_SLEEP_BANDS: &[(u32, f64)] = &[
    (60, 25.0),
    (70, 20.0),
    (80, 15.0),
    (90, 10.0),
    (100, 5.0),
];

const TO_BED_BANDS: &[(&str, f64)] = &[
    ("21:30", 25.0),
    ("21:45", 20.0),
    ("22:00", 15.0),
    ("22:15", 10.0),
    ("22:30", 5.0),
];

const JAPA_BANDS: &[(&str, f64)] = &[
    ("08:00", 25.0),
    ("10:00", 20.0),
    ("12:00", 15.0),
    ("14:00", 10.0),
    ("18:00", 5.0),
];

/// (minutes cap, points at cap)
const SCRIPTURE_READING: (u32, f64) = (20, 25.0);
const SLOKA_READING: (u32, f64) = (10, 10.0);
const HEARING: (u32, f64) = (30, 30.0);

/// Final, rounded scores. `total == body + soul + sadhana` always.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreBundle {
    pub body: u32,
    pub soul: u32,
    pub sadhana: u32,
    pub total: u32,
}

impl ScoreBundle {
    pub const ZERO: ScoreBundle = ScoreBundle {
        body: 0,
        soul: 0,
        sadhana: 0,
        total: 0,
    };
}

/// Unrounded rubric components, exposed for explainability in score previews.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub wake_up: f64,
    pub day_sleep: f64,
    pub to_bed: f64,
    pub japa: f64,
    pub attendance: f64,
    pub reading: f64,
    pub hearing: f64,
}

impl ScoreBreakdown {
    pub fn body(&self) -> f64 {
        self.wake_up + self.day_sleep + self.to_bed
    }

    pub fn soul(&self) -> f64 {
        self.japa + self.attendance
    }

    pub fn sadhana(&self) -> f64 {
        self.reading + self.hearing
    }

    /// Round once, at the end.
    pub fn bundle(&self) -> ScoreBundle {
        let body = round_points(self.body());
        let soul = round_points(self.soul());
        let sadhana = round_points(self.sadhana());
        let total = round_points(self.body() + self.soul() + self.sadhana());
        // Body and soul bands award whole points, so every fraction sits in sadhana.
        debug_assert_eq!(total, body + soul + sadhana);
        ScoreBundle {
            body,
            soul,
            sadhana,
            total,
        }
    }
}

/// Score a canonical entry. Total function: never fails, never panics.
pub fn compute_scores(entry: &DailyEntry) -> ScoreBundle {
    breakdown(entry).bundle()
}

/// Per-component scores before rounding.
///
/// A blank entry (nothing the rubric reads was logged) scores zero everywhere;
/// otherwise an absent day-sleep value would still earn the best band.
pub fn breakdown(entry: &DailyEntry) -> ScoreBreakdown {
    if entry.is_blank() {
        return ScoreBreakdown::default();
    }

    let attendance: u32 = entry.attendance().iter().map(|a| a.points()).sum();

    ScoreBreakdown {
        wake_up: time_band(entry.wake_up_time.as_ref(), WAKE_UP_BANDS),
        day_sleep: minutes_band(entry.day_sleep_minutes, DAY_SLEEP_BANDS),
        to_bed: time_band(entry.to_bed_time.as_ref(), TO_BED_BANDS),
        japa: time_band(entry.japa_finish_time.as_ref(), JAPA_BANDS),
        attendance: f64::from(attendance),
        reading: linear(entry.scripture_reading_minutes, SCRIPTURE_READING)
            + linear(entry.sloka_reading_minutes, SLOKA_READING),
        hearing: linear(entry.hearing_minutes.total(), HEARING),
    }
}

/// Unset time -> 0. Canonical `HH:MM` strings compare chronologically.
fn time_band(time: Option<&TimeOfDay>, bands: &[(&str, f64)]) -> f64 {
    time.and_then(|t| bands.iter().find(|(limit, _)| t.as_str() <= *limit))
        .map_or(0.0, |(_, points)| *points)
}

fn minutes_band(minutes: u32, bands: &[(u32, f64)]) -> f64 {
    bands
        .iter()
        .find(|(limit, _)| minutes <= *limit)
        .map_or(0.0, |(_, points)| *points)
}

fn linear(minutes: u32, (cap, points): (u32, f64)) -> f64 {
    f64::from(minutes.min(cap)) / f64::from(cap) * points
}

fn round_points(x: f64) -> u32 {
    x.round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Attendance, HearingMinutes};

    fn t(s: &str) -> Option<TimeOfDay> {
        TimeOfDay::parse(s)
    }

    /// Entry with only a wake-up time (day sleep 0 still scores its band).
    fn waking_at(s: &str) -> DailyEntry {
        DailyEntry {
            wake_up_time: t(s),
            ..DailyEntry::default()
        }
    }

    #[test]
    fn wake_up_bands_are_inclusive() {
        let cases = [
            ("03:59", 25.0),
            ("04:30", 25.0),
            ("04:31", 20.0),
            ("04:40", 20.0),
            ("04:41", 15.0),
            ("04:45", 15.0),
            ("04:46", 10.0),
            ("05:00", 10.0),
            ("05:01", 0.0),
            ("11:00", 0.0),
        ];
        for (time, want) in cases {
            assert_eq!(breakdown(&waking_at(time)).wake_up, want, "wake {time}");
        }
    }

    #[test]
    fn day_sleep_bands() {
        let base = waking_at("06:00");
        for (mins, want) in [
            (0, 25.0),
            (60, 25.0),
            (61, 20.0),
            (70, 20.0),
            (80, 15.0),
            (90, 10.0),
            (100, 5.0),
            (101, 0.0),
            (600, 0.0),
        ] {
            let e = DailyEntry {
                day_sleep_minutes: mins,
                ..base.clone()
            };
            assert_eq!(breakdown(&e).day_sleep, want, "day sleep {mins}");
        }
    }

    #[test]
    fn bedtime_and_japa_bands() {
        let bed = |s| DailyEntry {
            to_bed_time: t(s),
            ..DailyEntry::default()
        };
        assert_eq!(breakdown(&bed("21:30")).to_bed, 25.0);
        assert_eq!(breakdown(&bed("21:31")).to_bed, 20.0);
        assert_eq!(breakdown(&bed("22:30")).to_bed, 5.0);
        assert_eq!(breakdown(&bed("22:31")).to_bed, 0.0);
        // Past midnight compares as early morning: lexicographic rubric.
        assert_eq!(breakdown(&bed("00:30")).to_bed, 25.0);

        let japa = |s| DailyEntry {
            japa_finish_time: t(s),
            ..DailyEntry::default()
        };
        assert_eq!(breakdown(&japa("08:00")).japa, 25.0);
        assert_eq!(breakdown(&japa("10:00")).japa, 20.0);
        assert_eq!(breakdown(&japa("12:00")).japa, 15.0);
        assert_eq!(breakdown(&japa("14:00")).japa, 10.0);
        assert_eq!(breakdown(&japa("18:00")).japa, 5.0);
        assert_eq!(breakdown(&japa("18:01")).japa, 0.0);
    }

    #[test]
    fn attendance_weights() {
        let att = |a, b, c| DailyEntry {
            shikshastakam_attendance: a,
            mangal_aarti_attendance: b,
            morning_class_attendance: c,
            ..DailyEntry::default()
        };
        use Attendance::*;
        assert_eq!(breakdown(&att(Present, Present, Present)).attendance, 15.0);
        assert_eq!(breakdown(&att(Present, Late, Absent)).attendance, 8.0);
        assert_eq!(breakdown(&att(Absent, Absent, Absent)).attendance, 0.0);
    }

    #[test]
    fn reading_and_hearing_scale_linearly_with_caps() {
        let read = |sp, sloka| DailyEntry {
            scripture_reading_minutes: sp,
            sloka_reading_minutes: sloka,
            ..DailyEntry::default()
        };
        assert_eq!(breakdown(&read(10, 0)).reading, 12.5);
        assert_eq!(breakdown(&read(20, 0)).reading, 25.0);
        assert_eq!(breakdown(&read(25, 0)).reading, 25.0);
        assert_eq!(breakdown(&read(0, 5)).reading, 5.0);
        assert_eq!(breakdown(&read(0, 50)).reading, 10.0);

        let hear = |sp, sm, rsp| DailyEntry {
            hearing_minutes: HearingMinutes { sp, sm, rsp },
            ..DailyEntry::default()
        };
        assert_eq!(breakdown(&hear(10, 10, 10)).hearing, 30.0);
        assert_eq!(breakdown(&hear(5, 5, 5)).hearing, 15.0);
        assert_eq!(breakdown(&hear(15, 15, 15)).hearing, 30.0);
    }

    #[test]
    fn perfect_day_scores_180() {
        let e = DailyEntry {
            wake_up_time: t("04:30"),
            day_sleep_minutes: 60,
            to_bed_time: t("21:30"),
            japa_finish_time: t("08:00"),
            shikshastakam_attendance: Attendance::Present,
            mangal_aarti_attendance: Attendance::Present,
            morning_class_attendance: Attendance::Present,
            scripture_reading_minutes: 20,
            sloka_reading_minutes: 10,
            hearing_minutes: HearingMinutes {
                sp: 10,
                sm: 10,
                rsp: 10,
            },
            menial_service_minutes: 45,
            missionary_service_minutes: 7,
            harinam_service_minutes: 90,
            daily_note: Some("all done".into()),
        };
        assert_eq!(
            compute_scores(&e),
            ScoreBundle {
                body: 75,
                soul: 40,
                sadhana: 65,
                total: 180
            }
        );
    }

    #[test]
    fn blank_entry_scores_zero() {
        assert_eq!(compute_scores(&DailyEntry::default()), ScoreBundle::ZERO);
    }

    #[test]
    fn rounds_once_at_the_end() {
        // 12.5 reading rounds up; day sleep 0 on a non-blank entry earns 25.
        let e = DailyEntry {
            scripture_reading_minutes: 10,
            ..DailyEntry::default()
        };
        let s = compute_scores(&e);
        assert_eq!(s.sadhana, 13);
        assert_eq!(s.body, 25);
        assert_eq!(s.total, 38);
        assert_eq!(s.total, s.body + s.soul + s.sadhana);
    }

    #[test]
    fn fractional_components_sum_before_rounding() {
        // reading 1/20*25 = 1.25, sloka 1/10*10 = 1, hearing 1 -> 3.25 -> 3
        let e = DailyEntry {
            scripture_reading_minutes: 1,
            sloka_reading_minutes: 1,
            hearing_minutes: HearingMinutes {
                sp: 1,
                sm: 0,
                rsp: 0,
            },
            day_sleep_minutes: 500,
            ..DailyEntry::default()
        };
        let s = compute_scores(&e);
        assert_eq!(s.sadhana, 3);
        assert_eq!(s.total, 3);
    }

    #[test]
    fn scoring_is_idempotent() {
        let e = DailyEntry {
            wake_up_time: t("04:41"),
            scripture_reading_minutes: 7,
            ..DailyEntry::default()
        };
        assert_eq!(compute_scores(&e), compute_scores(&e));
    }

    #[test]
    fn extreme_values_stay_within_caps() {
        let e = DailyEntry {
            day_sleep_minutes: u32::MAX,
            scripture_reading_minutes: u32::MAX,
            sloka_reading_minutes: u32::MAX,
            hearing_minutes: HearingMinutes {
                sp: u32::MAX,
                sm: u32::MAX,
                rsp: u32::MAX,
            },
            ..DailyEntry::default()
        };
        let s = compute_scores(&e);
        assert!(s.body <= BODY_MAX && s.soul <= SOUL_MAX && s.sadhana <= SADHANA_MAX);
        assert_eq!(s.sadhana, 65);
        assert_eq!(s.total, s.body + s.soul + s.sadhana);
    }
}
