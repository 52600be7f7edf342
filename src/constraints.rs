//! Hard-constraint tables derived from the normalised slot and event lists.
//!
//! [`Unavailability`] is a partial mapping: an event without restrictions has
//! no entry at all. [`Clashes`] and [`Unsuitability`] are total: every event
//! index has an entry, possibly empty.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use itertools::Itertools;
use log::trace;

use crate::data::{
    ClashDeclarations, Event, EventIndex, Slot, SlotIndex, UnavailabilityDeclarations,
};

/// Slots each event cannot occupy because its owner is unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Unavailability {
    entries: BTreeMap<EventIndex, Vec<SlotIndex>>,
}

impl Unavailability {
    /// Whether `event` carries any restriction.
    pub fn contains(&self, event: EventIndex) -> bool {
        self.entries.contains_key(&event)
    }

    pub fn get(&self, event: EventIndex) -> Option<&[SlotIndex]> {
        self.entries.get(&event).map(Vec::as_slice)
    }

    /// Like [`Self::get`], reading a missing entry as "no restriction".
    pub fn slots_for(&self, event: EventIndex) -> &[SlotIndex] {
        self.get(event).unwrap_or(&[])
    }

    pub fn is_unavailable(&self, event: EventIndex, slot: SlotIndex) -> bool {
        self.slots_for(event).binary_search(&slot).is_ok()
    }

    pub fn events(&self) -> impl Iterator<Item = EventIndex> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EventIndex, &[SlotIndex])> {
        self.entries.iter().map(|(event, slots)| (*event, slots.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Events that must not run at the same time as each event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clashes {
    adjacency: Vec<Vec<EventIndex>>,
    declared_pairs: usize,
}

impl Clashes {
    /// Neighbours of `event` in discovery order. Empty for unknown indices.
    pub fn get(&self, event: EventIndex) -> &[EventIndex] {
        self.adjacency.get(event).map_or(&[], Vec::as_slice)
    }

    pub fn are_clashing(&self, a: EventIndex, b: EventIndex) -> bool {
        self.get(a).contains(&b)
    }

    /// Number of distinct unordered person pairs contributed by declarations.
    pub fn declared_pairs(&self) -> usize {
        self.declared_pairs
    }

    pub fn iter(&self) -> impl Iterator<Item = (EventIndex, &[EventIndex])> {
        self.adjacency
            .iter()
            .enumerate()
            .map(|(event, neighbours)| (event, neighbours.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }
}

/// Slots each event cannot occupy because of type or capacity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Unsuitability {
    entries: Vec<Vec<SlotIndex>>,
}

impl Unsuitability {
    pub fn get(&self, event: EventIndex) -> &[SlotIndex] {
        self.entries.get(event).map_or(&[], Vec::as_slice)
    }

    pub fn is_unsuitable(&self, event: EventIndex, slot: SlotIndex) -> bool {
        self.get(event).binary_search(&slot).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EventIndex, &[SlotIndex])> {
        self.entries
            .iter()
            .enumerate()
            .map(|(event, slots)| (event, slots.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Intervals declared for the event's person and, as an event-scoped key,
/// for its title. Unknown keys contribute nothing.
pub fn unavailability(
    events: &[Event],
    slots: &[Slot],
    declarations: &UnavailabilityDeclarations,
) -> Unavailability {
    let mut entries = BTreeMap::new();
    for (index, event) in events.iter().enumerate() {
        let intervals: Vec<_> = event
            .person
            .iter()
            .chain(std::iter::once(&event.title).filter(|t| event.person.as_ref() != Some(*t)))
            .filter_map(|key| declarations.get(key))
            .flatten()
            .collect();
        if intervals.is_empty() {
            continue;
        }

        let unavailable: Vec<SlotIndex> = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| {
                intervals
                    .iter()
                    .any(|i| slot.overlaps(i.unavailable_from, i.unavailable_until))
            })
            .map(|(slot_index, _)| slot_index)
            .collect();
        if !unavailable.is_empty() {
            entries.insert(index, unavailable);
        }
    }
    trace!("{} of {} events have unavailable slots", entries.len(), events.len());
    Unavailability { entries }
}

/// Adjacency lists that drop duplicate and reflexive edges while keeping
/// first-insertion order.
struct AdjacencyBuilder {
    adjacency: Vec<Vec<EventIndex>>,
    seen: HashSet<(EventIndex, EventIndex)>,
}

impl AdjacencyBuilder {
    fn new(len: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); len],
            seen: HashSet::new(),
        }
    }

    fn add(&mut self, from: EventIndex, to: EventIndex) {
        if from != to && self.seen.insert((from, to)) {
            self.adjacency[from].push(to);
        }
    }
}

fn matching(events: &[Event], key: &str) -> Vec<EventIndex> {
    events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.person.as_deref() == Some(key) || e.title == key)
        .map(|(index, _)| index)
        .collect()
}

/// Declared edges first (keys in sorted order, partners as listed), then
/// edges between events sharing a person.
///
/// A declaration keyed by a person is symmetric. One keyed only by an event
/// title is directional: only the declaring event gains the edge.
pub fn clashes(events: &[Event], declarations: &ClashDeclarations) -> Clashes {
    let mut builder = AdjacencyBuilder::new(events.len());
    let people: HashSet<&str> = events.iter().filter_map(|e| e.person.as_deref()).collect();
    let mut person_pairs = BTreeSet::new();

    for (key, partners) in declarations {
        let declaring = matching(events, key);
        if declaring.is_empty() {
            continue;
        }
        let person_level = people.contains(key.as_str());

        for partner in partners {
            for &from in &declaring {
                for to in matching(events, partner) {
                    builder.add(from, to);
                    if person_level {
                        builder.add(to, from);
                    }
                }
            }
            if person_level && partner != key && people.contains(partner.as_str()) {
                let pair = if key.as_str() < partner.as_str() {
                    (key.as_str(), partner.as_str())
                } else {
                    (partner.as_str(), key.as_str())
                };
                person_pairs.insert(pair);
            }
        }
    }

    let by_person = events
        .iter()
        .enumerate()
        .filter_map(|(index, e)| e.person.as_deref().map(|p| (p, index)))
        .into_group_map();
    for (index, event) in events.iter().enumerate() {
        if let Some(shared) = event.person.as_deref().and_then(|p| by_person.get(p)) {
            for &other in shared {
                builder.add(index, other);
            }
        }
    }

    Clashes {
        adjacency: builder.adjacency,
        declared_pairs: person_pairs.len(),
    }
}

/// Slots whose event type differs from the event's, or whose capacity is
/// below its demand.
pub fn unsuitability(events: &[Event], slots: &[Slot]) -> Unsuitability {
    let entries = events
        .iter()
        .map(|event| {
            slots
                .iter()
                .enumerate()
                .filter(|(_, slot)| {
                    slot.event_type != event.event_type || slot.capacity < event.demand
                })
                .map(|(index, _)| index)
                .collect()
        })
        .collect();
    Unsuitability { entries }
}

/// For each slot, the other slots (in any venue) overlapping it in time.
pub fn concurrent_slots(slots: &[Slot]) -> Vec<Vec<SlotIndex>> {
    slots
        .iter()
        .enumerate()
        .map(|(index, slot)| {
            slots
                .iter()
                .enumerate()
                .filter(|&(other, candidate)| other != index && slot.concurrent_with(candidate))
                .map(|(other, _)| other)
                .collect()
        })
        .collect()
}
