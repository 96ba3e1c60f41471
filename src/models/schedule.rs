use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Canonical shape: module-type tag ("CAT", "LAB", ...) -> block.
pub type Schedule = BTreeMap<String, ScheduleBlock>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleBlock {
    #[serde(default)]
    pub location: Location,
    /// Weekday code ("L", "M", "W", "J", "V", "S") -> time-slot numbers.
    #[serde(default)]
    pub modules: BTreeMap<String, Vec<u32>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub campus: Option<String>,
    #[serde(default)]
    pub place: Option<String>,
}

/// The three schedule shapes seen in upstream data over the years. All of
/// them collapse into [`Schedule`] before anything is stored; query code
/// only ever sees the canonical shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawSchedule {
    /// Per-type map, modules already keyed by weekday.
    ByType(BTreeMap<String, ScheduleBlock>),
    /// List of per-type blocks with a nested module list.
    Grouped(Vec<RawGroupedBlock>),
    /// Flat list, one entry per (module type, weekday) pair.
    Flat(Vec<RawFlatEntry>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGroupedBlock {
    pub identifier: String,
    #[serde(default)]
    pub location: Location,
    pub modules: Vec<RawDayModules>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDayModules {
    pub day: String,
    #[serde(default)]
    pub hours: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFlatEntry {
    pub identifier: String,
    pub day: String,
    #[serde(default)]
    pub hours: Vec<u32>,
    #[serde(default)]
    pub location: Location,
}

impl Default for RawSchedule {
    fn default() -> Self {
        RawSchedule::ByType(BTreeMap::new())
    }
}

impl RawSchedule {
    pub fn normalize(self) -> Schedule {
        match self {
            RawSchedule::ByType(blocks) => blocks,
            RawSchedule::Grouped(blocks) => {
                let mut schedule = Schedule::new();
                for block in blocks {
                    let entry = schedule.entry(block.identifier.to_uppercase()).or_default();
                    if entry.location.campus.is_none() {
                        entry.location = block.location;
                    }
                    for day in block.modules {
                        merge_day(entry, &day.day, &day.hours);
                    }
                }
                schedule
            }
            RawSchedule::Flat(entries) => {
                let mut schedule = Schedule::new();
                for raw in entries {
                    let entry = schedule.entry(raw.identifier.to_uppercase()).or_default();
                    if entry.location.campus.is_none() {
                        entry.location = raw.location;
                    }
                    merge_day(entry, &raw.day, &raw.hours);
                }
                schedule
            }
        }
    }
}

fn merge_day(block: &mut ScheduleBlock, day: &str, hours: &[u32]) {
    let slots = block.modules.entry(day.to_uppercase()).or_default();
    slots.extend_from_slice(hours);
    slots.sort_unstable();
    slots.dedup();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical() -> Schedule {
        serde_json::from_str(
            r#"{
                "CAT": {
                    "location": { "campus": "San Joaquin", "place": "BC25" },
                    "modules": { "L": [1, 2], "W": [1, 2] }
                },
                "LAB": {
                    "location": { "campus": "San Joaquin", "place": "LAB3" },
                    "modules": { "J": [4] }
                }
            }"#,
        )
        .expect("valid canonical schedule")
    }

    #[test]
    fn by_type_passes_through() {
        let raw: RawSchedule = serde_json::from_str(
            r#"{
                "CAT": {
                    "location": { "campus": "San Joaquin", "place": "BC25" },
                    "modules": { "L": [1, 2], "W": [1, 2] }
                },
                "LAB": {
                    "location": { "campus": "San Joaquin", "place": "LAB3" },
                    "modules": { "J": [4] }
                }
            }"#,
        )
        .expect("parses");

        assert_eq!(raw.normalize(), canonical());
    }

    #[test]
    fn grouped_blocks_normalize() {
        let raw: RawSchedule = serde_json::from_str(
            r#"[
                {
                    "identifier": "CAT",
                    "location": { "campus": "San Joaquin", "place": "BC25" },
                    "modules": [
                        { "day": "L", "hours": [1, 2] },
                        { "day": "W", "hours": [1, 2] }
                    ]
                },
                {
                    "identifier": "LAB",
                    "location": { "campus": "San Joaquin", "place": "LAB3" },
                    "modules": [ { "day": "J", "hours": [4] } ]
                }
            ]"#,
        )
        .expect("parses");

        assert_eq!(raw.normalize(), canonical());
    }

    #[test]
    fn flat_entries_normalize() {
        let raw: RawSchedule = serde_json::from_str(
            r#"[
                { "identifier": "cat", "day": "L", "hours": [2, 1], "location": { "campus": "San Joaquin", "place": "BC25" } },
                { "identifier": "CAT", "day": "w", "hours": [1, 2], "location": { "campus": "San Joaquin", "place": "BC25" } },
                { "identifier": "LAB", "day": "J", "hours": [4], "location": { "campus": "San Joaquin", "place": "LAB3" } }
            ]"#,
        )
        .expect("parses");

        assert_eq!(raw.normalize(), canonical());
    }

    #[test]
    fn merging_duplicate_days_dedups_slots() {
        let raw: RawSchedule = serde_json::from_str(
            r#"[
                { "identifier": "AYUD", "day": "V", "hours": [5] },
                { "identifier": "AYUD", "day": "V", "hours": [5, 6] }
            ]"#,
        )
        .expect("parses");

        let schedule = raw.normalize();
        assert_eq!(schedule["AYUD"].modules["V"], vec![5, 6]);
    }

    #[test]
    fn empty_schedule_defaults_to_no_blocks() {
        let raw = RawSchedule::default();
        assert!(raw.normalize().is_empty());
    }
}
