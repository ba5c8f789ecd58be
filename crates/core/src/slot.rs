//! Recurring weekly slot codec.
//!
//! A slot is a `(day, pod)` pair where `pod` is a part-of-day band. Its
//! canonical string form is `"{day}:{pod}"`, e.g. `"wed:evening"`, and is the
//! value stored in `sessions.slot_code` and `tutor_availability.slot_code`.
//!
//! Band rule on the local hour: `>= 18` is evening, `>= 12` is afternoon,
//! anything else is morning. Hours before 08:00 therefore classify as
//! morning and hours from 22:00 onward as evening; both edges are policy and
//! covered by tests below.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, TimeZone, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Local hour at which the afternoon band starts.
pub const AFTERNOON_START_HOUR: u32 = 12;

/// Local hour at which the evening band starts.
pub const EVENING_START_HOUR: u32 = 18;

// ---------------------------------------------------------------------------
// Day
// ---------------------------------------------------------------------------

/// Day of week, numbered 0=Sunday..6=Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Sun,
        Day::Mon,
        Day::Tue,
        Day::Wed,
        Day::Thu,
        Day::Fri,
        Day::Sat,
    ];

    /// Three-letter code used in slot codes.
    pub fn code(self) -> &'static str {
        match self {
            Day::Sun => "sun",
            Day::Mon => "mon",
            Day::Tue => "tue",
            Day::Wed => "wed",
            Day::Thu => "thu",
            Day::Fri => "fri",
            Day::Sat => "sat",
        }
    }

    /// Parse a code case-insensitively.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|d| d.code() == code)
    }

    pub fn from_weekday(weekday: Weekday) -> Self {
        Self::ALL[weekday.num_days_from_sunday() as usize]
    }
}

// ---------------------------------------------------------------------------
// Pod
// ---------------------------------------------------------------------------

/// Part-of-day band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pod {
    Morning,
    Afternoon,
    Evening,
}

impl Pod {
    pub const ALL: [Pod; 3] = [Pod::Morning, Pod::Afternoon, Pod::Evening];

    pub fn code(self) -> &'static str {
        match self {
            Pod::Morning => "morning",
            Pod::Afternoon => "afternoon",
            Pod::Evening => "evening",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|p| p.code() == code)
    }

    /// Classify a local wall-clock hour (0..=23).
    pub fn from_hour(hour: u32) -> Self {
        if hour >= EVENING_START_HOUR {
            Pod::Evening
        } else if hour >= AFTERNOON_START_HOUR {
            Pod::Afternoon
        } else {
            Pod::Morning
        }
    }
}

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

/// A recurring weekly slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub day: Day,
    pub pod: Pod,
}

impl Slot {
    pub fn new(day: Day, pod: Pod) -> Self {
        Self { day, pod }
    }

    /// Canonical `"{day}:{pod}"` code.
    pub fn code(&self) -> String {
        format!("{}:{}", self.day.code(), self.pod.code())
    }

    /// Slot containing `instant` when read on the wall clock of `tz`.
    pub fn from_instant<Tz: TimeZone>(instant: &Timestamp, tz: &Tz) -> Self {
        let local = instant.with_timezone(tz);
        Self {
            day: Day::from_weekday(local.weekday()),
            pod: Pod::from_hour(local.hour()),
        }
    }

    /// Parse a legacy free-form slot label such as `"Mercredi (wed:evening)"`
    /// or `"wed:evening (Mercredi soir)"`.
    ///
    /// A trailing parenthesised label is dropped first; if what remains is not
    /// a slot code, the parenthesised part itself is tried.
    pub fn parse_legacy(label: &str) -> Option<Self> {
        let label = label.trim();
        if let Some(open) = label.rfind('(') {
            if label.ends_with(')') {
                let head = label[..open].trim();
                if let Ok(slot) = head.parse() {
                    return Some(slot);
                }
                return label[open + 1..label.len() - 1].parse().ok();
            }
        }
        label.parse().ok()
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.day.code(), self.pod.code())
    }
}

impl FromStr for Slot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (day, pod) = s
            .split_once(':')
            .ok_or_else(|| format!("Slot code '{s}' must look like 'day:pod'"))?;
        let day = Day::from_code(day).ok_or_else(|| format!("Unknown day in slot '{s}'"))?;
        let pod = Pod::from_code(pod).ok_or_else(|| format!("Unknown part of day in slot '{s}'"))?;
        Ok(Self { day, pod })
    }
}

/// Raw `{day, pod}` pair as submitted by clients, before vocabulary checks.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSlot {
    pub day: String,
    pub pod: String,
}

/// Normalise submitted slots into a de-duplicated, order-preserving list.
///
/// Structured slots win when at least one is given; otherwise the legacy
/// string labels are parsed. Entries outside the day/pod vocabularies are
/// dropped silently.
pub fn normalize_slots(structured: &[RawSlot], legacy: &[String]) -> Vec<Slot> {
    let candidates: Vec<Option<Slot>> = if !structured.is_empty() {
        structured
            .iter()
            .map(|raw| Some(Slot::new(Day::from_code(&raw.day)?, Pod::from_code(&raw.pod)?)))
            .collect()
    } else {
        legacy.iter().map(|label| Slot::parse_legacy(label)).collect()
    };

    let mut out: Vec<Slot> = Vec::new();
    for slot in candidates.into_iter().flatten() {
        if !out.contains(&slot) {
            out.push(slot);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, Utc};

    use super::*;

    fn utc(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    // -----------------------------------------------------------------------
    // Band boundaries
    // -----------------------------------------------------------------------

    #[test]
    fn band_edges() {
        assert_eq!(Pod::from_hour(0), Pod::Morning);
        assert_eq!(Pod::from_hour(7), Pod::Morning);
        assert_eq!(Pod::from_hour(8), Pod::Morning);
        assert_eq!(Pod::from_hour(11), Pod::Morning);
        assert_eq!(Pod::from_hour(12), Pod::Afternoon);
        assert_eq!(Pod::from_hour(17), Pod::Afternoon);
        assert_eq!(Pod::from_hour(18), Pod::Evening);
        assert_eq!(Pod::from_hour(21), Pod::Evening);
        assert_eq!(Pod::from_hour(23), Pod::Evening);
    }

    #[test]
    fn one_minute_before_noon_is_morning() {
        let slot = Slot::from_instant(&utc("2025-01-15T11:59:00Z"), &Utc);
        assert_eq!(slot.code(), "wed:morning");
        let slot = Slot::from_instant(&utc("2025-01-15T12:00:00Z"), &Utc);
        assert_eq!(slot.code(), "wed:afternoon");
    }

    #[test]
    fn early_hours_count_as_morning() {
        let slot = Slot::from_instant(&utc("2025-01-15T05:30:00Z"), &Utc);
        assert_eq!(slot, Slot::new(Day::Wed, Pod::Morning));
    }

    #[test]
    fn late_night_counts_as_evening() {
        let slot = Slot::from_instant(&utc("2025-01-15T23:10:00Z"), &Utc);
        assert_eq!(slot, Slot::new(Day::Wed, Pod::Evening));
    }

    // -----------------------------------------------------------------------
    // Day numbering and timezones
    // -----------------------------------------------------------------------

    #[test]
    fn sunday_is_day_zero() {
        assert_eq!(Day::from_weekday(Weekday::Sun), Day::Sun);
        assert_eq!(Day::from_weekday(Weekday::Sat), Day::Sat);
        let slot = Slot::from_instant(&utc("2025-01-19T09:00:00Z"), &Utc);
        assert_eq!(slot.code(), "sun:morning");
    }

    #[test]
    fn offset_moves_day_and_band() {
        // 23:30 UTC Tuesday is 01:30 Wednesday at UTC+2.
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let slot = Slot::from_instant(&utc("2025-01-14T23:30:00Z"), &plus_two);
        assert_eq!(slot.code(), "wed:morning");

        let slot = Slot::from_instant(&utc("2025-01-14T23:30:00Z"), &Utc);
        assert_eq!(slot.code(), "tue:evening");
    }

    #[test]
    fn code_parses_back_to_same_slot() {
        for day in Day::ALL {
            for pod in Pod::ALL {
                let slot = Slot::new(day, pod);
                assert_eq!(slot.code().parse::<Slot>().unwrap(), slot);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Parsing and normalisation
    // -----------------------------------------------------------------------

    #[test]
    fn parse_rejects_unknown_vocabulary() {
        assert!("wed:night".parse::<Slot>().is_err());
        assert!("mercredi:evening".parse::<Slot>().is_err());
        assert!("wed-evening".parse::<Slot>().is_err());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("WED:Evening".parse::<Slot>().unwrap().code(), "wed:evening");
    }

    #[test]
    fn legacy_labels() {
        assert_eq!(
            Slot::parse_legacy("wed:evening (Mercredi soir)").map(|s| s.code()),
            Some("wed:evening".to_string())
        );
        assert_eq!(
            Slot::parse_legacy("Mercredi (wed:evening)").map(|s| s.code()),
            Some("wed:evening".to_string())
        );
        assert_eq!(Slot::parse_legacy("Mercredi soir"), None);
    }

    #[test]
    fn normalize_prefers_structured_and_dedupes() {
        let structured = vec![
            RawSlot { day: "wed".into(), pod: "evening".into() },
            RawSlot { day: "WED".into(), pod: "Evening".into() },
            RawSlot { day: "moon".into(), pod: "evening".into() },
            RawSlot { day: "sat".into(), pod: "morning".into() },
        ];
        let legacy = vec!["mon:afternoon".to_string()];
        let slots = normalize_slots(&structured, &legacy);
        assert_eq!(
            slots,
            vec![Slot::new(Day::Wed, Pod::Evening), Slot::new(Day::Sat, Pod::Morning)]
        );
    }

    #[test]
    fn normalize_falls_back_to_legacy() {
        let legacy = vec![
            "mon:afternoon".to_string(),
            "Lundi (mon:afternoon)".to_string(),
            "garbage".to_string(),
        ];
        let slots = normalize_slots(&[], &legacy);
        assert_eq!(slots, vec![Slot::new(Day::Mon, Pod::Afternoon)]);
    }

    #[test]
    fn serde_uses_lowercase_codes() {
        let json = serde_json::to_value(Slot::new(Day::Thu, Pod::Afternoon)).unwrap();
        assert_eq!(json, serde_json::json!({ "day": "thu", "pod": "afternoon" }));
    }
}
