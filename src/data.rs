use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// Type aliases for clarity
pub type EventIndex = usize;
pub type SlotIndex = usize;
pub type Seconds = u32;

/// A bookable venue/time unit. Identity is the position in the slot list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub venue: String,
    pub starts_at: NaiveDateTime,
    pub duration: Seconds,
    pub capacity: u32,
    pub event_type: String,
}

impl Slot {
    pub fn ends_at(&self) -> NaiveDateTime {
        self.starts_at + Duration::seconds(i64::from(self.duration))
    }

    /// Closed-open overlap of `[starts_at, ends_at)` with `[from, until)`.
    pub fn overlaps(&self, from: NaiveDateTime, until: NaiveDateTime) -> bool {
        self.starts_at < until && self.ends_at() > from
    }

    /// True when both slots are occupied at some common instant.
    pub fn concurrent_with(&self, other: &Slot) -> bool {
        self.overlaps(other.starts_at, other.ends_at())
    }
}

/// A schedulable talk, workshop or plenary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub title: String,
    pub duration: Seconds,
    pub tags: BTreeSet<String>,
    pub person: Option<String>,
    pub event_type: String,
    pub demand: u32,
}

/// One scheduled item of the final timetable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Allocation {
    pub event: Event,
    pub slot: Slot,
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} {}",
            self.event.title,
            self.slot.venue,
            self.slot.starts_at.format("%Y-%m-%d %H:%M")
        )
    }
}

/// Midnight of `day` plus `offset` seconds.
pub fn at_offset(day: NaiveDate, offset: Seconds) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN) + Duration::seconds(i64::from(offset))
}

/// A venue described by an availability calendar. Its slots come from the
/// session templates of every event type it is suitable for.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateVenue {
    pub name: String,
    pub capacity: u32,
    pub suitable_for: Vec<String>,
    pub available: Vec<NaiveDate>,
}

/// A named session and the ordered slot times it contains.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionTemplate {
    pub name: String,
    pub slots: Vec<SessionSlot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSlot {
    /// Offset from midnight.
    pub starts_at: Seconds,
    pub duration: Seconds,
}

/// Session templates keyed by event type.
pub type SessionCatalogue = BTreeMap<String, Vec<SessionTemplate>>;

/// A flattened template entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotTime {
    pub session_name: String,
    pub starts_at: Seconds,
    pub duration: Seconds,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NestedVenue {
    pub name: String,
    pub days: Vec<NestedDay>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NestedDay {
    pub date: NaiveDate,
    pub sessions: Vec<NestedSession>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NestedSession {
    pub name: String,
    pub slots: Vec<SlotDescriptor>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDescriptor {
    pub starts_at: Seconds,
    pub duration: Seconds,
    pub capacity: u32,
    pub event_type: String,
}

/// The venue directory, in whichever shape the loading layer supplies.
///
/// The shape is always declared explicitly through the `shape` tag.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum VenueDirectory {
    #[serde(rename_all = "camelCase")]
    Templated {
        venues: Vec<TemplateVenue>,
        sessions: SessionCatalogue,
        /// Order in which event types are expanded. Types it leaves out
        /// follow in catalogue order.
        #[serde(default)]
        event_types: Vec<String>,
    },
    Nested {
        venues: Vec<NestedVenue>,
    },
}

/// Tags as they appear in loosely typed records: either a list or a
/// comma separated string, where `"null"` means no tags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawTags {
    List(Vec<String>),
    Text(String),
}

impl RawTags {
    pub fn into_set(self) -> BTreeSet<String> {
        match self {
            RawTags::List(tags) => tags.into_iter().collect(),
            RawTags::Text(text) => {
                let text = text.trim();
                if text.is_empty() || text.eq_ignore_ascii_case("null") {
                    BTreeSet::new()
                } else {
                    text.split(',')
                        .map(str::trim)
                        .filter(|tag| !tag.is_empty())
                        .map(str::to_owned)
                        .collect()
                }
            }
        }
    }
}

/// An event record as handed in by the loading layer.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawEvent {
    pub title: Option<String>,
    pub duration: Option<Seconds>,
    pub tags: Option<RawTags>,
    pub person: Option<String>,
    pub event_type: Option<String>,
    /// Older record schemas carry no demand.
    pub demand: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnavailableInterval {
    pub unavailable_from: NaiveDateTime,
    pub unavailable_until: NaiveDateTime,
}

/// Owner key (person or event title) to the intervals it is unavailable.
pub type UnavailabilityDeclarations = BTreeMap<String, Vec<UnavailableInterval>>;

/// Owner key (person or event title) to the keys it must not overlap with.
pub type ClashDeclarations = BTreeMap<String, Vec<String>>;

/// A manually scheduled item, e.g. one exported from an earlier run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAllocation {
    pub title: Option<String>,
    pub person: Option<String>,
    pub venue: Option<String>,
    pub day: Option<NaiveDate>,
    pub session: Option<String>,
    pub starts_at: Option<Seconds>,
    pub duration: Option<Seconds>,
    pub tags: Option<RawTags>,
    pub event_type: Option<String>,
    pub capacity: Option<u32>,
    pub demand: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2017, 10, 26).expect("valid date")
    }

    fn slot(offset: Seconds, duration: Seconds) -> Slot {
        Slot {
            venue: "Room A".into(),
            starts_at: at_offset(day(), offset),
            duration,
            capacity: 80,
            event_type: "talk".into(),
        }
    }

    #[rstest]
    fn offset_is_added_to_midnight() {
        let instant = at_offset(day(), 36_900);
        assert_eq!(instant.format("%H:%M").to_string(), "10:15");
    }

    #[rstest]
    #[case(36_000, 1_800, true)]
    #[case(35_000, 1_800, true)]
    #[case(37_800, 1_800, false)]
    #[case(32_400, 1_800, false)]
    fn overlap_is_closed_open(
        #[case] offset: Seconds,
        #[case] duration: Seconds,
        #[case] expected: bool,
    ) {
        // Reference slot occupies [10:00, 10:30).
        let reference = slot(36_000, 1_800);
        let other = slot(offset, duration);
        assert_eq!(reference.concurrent_with(&other), expected);
        assert_eq!(other.concurrent_with(&reference), expected);
    }

    #[rstest]
    #[case(RawTags::Text("null".into()), &[])]
    #[case(RawTags::Text("  ".into()), &[])]
    #[case(RawTags::Text("python, data".into()), &["data", "python"])]
    #[case(RawTags::List(vec!["talk".into(), "talk".into()]), &["talk"])]
    fn raw_tags_normalise(#[case] raw: RawTags, #[case] expected: &[&str]) {
        let expected: BTreeSet<String> = expected.iter().map(|t| (*t).to_owned()).collect();
        assert_eq!(raw.into_set(), expected);
    }

    #[rstest]
    fn venue_directory_requires_declared_shape() {
        let nested = r#"{"shape": "nested", "venues": []}"#;
        let parsed: VenueDirectory = serde_json::from_str(nested).expect("nested directory");
        assert!(matches!(parsed, VenueDirectory::Nested { venues } if venues.is_empty()));

        let untagged = r#"{"venues": []}"#;
        assert!(serde_json::from_str::<VenueDirectory>(untagged).is_err());
    }

    #[rstest]
    fn raw_event_tolerates_missing_demand() {
        let raw: RawEvent = serde_json::from_str(
            r#"{"title": "Talk", "duration": 1800, "tags": null, "eventType": "talk"}"#,
        )
        .expect("raw event");
        assert_eq!(raw.demand, None);
        assert_eq!(raw.tags, None);
    }
}
