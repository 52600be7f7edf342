//! Turns solver output or manual schedule records into [`Allocation`]s.

use crate::data::{Allocation, Event, EventIndex, RawAllocation, Slot, SlotIndex, at_offset};
use crate::error::{IndexKind, Result, SchedulerError};

/// Dereference `(event, slot)` index pairs against the canonical lists.
///
/// An index outside either list means the optimisation capability broke its
/// contract, so it is reported as [`SchedulerError::IndexOutOfBounds`].
pub fn resolve(
    pairs: &[(EventIndex, SlotIndex)],
    events: &[Event],
    slots: &[Slot],
) -> Result<Vec<Allocation>> {
    pairs
        .iter()
        .map(|&(event, slot)| {
            Ok(Allocation {
                event: lookup(events, event, IndexKind::Event)?.clone(),
                slot: lookup(slots, slot, IndexKind::Slot)?.clone(),
            })
        })
        .collect()
}

fn lookup<T>(items: &[T], index: usize, kind: IndexKind) -> Result<&T> {
    items.get(index).ok_or(SchedulerError::IndexOutOfBounds {
        kind,
        index,
        len: items.len(),
    })
}

/// Rebuild allocations from manual records. The pairs are kept as given,
/// whether or not they match anything in the current model.
pub fn resolve_manual(records: &[RawAllocation]) -> Result<Vec<Allocation>> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| manual(index, record))
        .collect()
}

fn manual(index: usize, record: &RawAllocation) -> Result<Allocation> {
    let required =
        |value: Option<String>, field| value.ok_or(SchedulerError::missing(index, field));
    let title = required(record.title.clone(), "title")?;
    let venue = required(record.venue.clone(), "venue")?;
    let event_type = required(record.event_type.clone(), "eventType")?;
    let day = record.day.ok_or(SchedulerError::missing(index, "day"))?;
    let starts_at = record
        .starts_at
        .ok_or(SchedulerError::missing(index, "startsAt"))?;
    let duration = record
        .duration
        .ok_or(SchedulerError::missing(index, "duration"))?;

    let event = Event {
        title,
        duration,
        tags: record.tags.clone().map(|t| t.into_set()).unwrap_or_default(),
        person: record.person.clone(),
        event_type: event_type.clone(),
        demand: record.demand.unwrap_or(0),
    };
    let slot = Slot {
        venue,
        starts_at: at_offset(day, starts_at),
        duration,
        capacity: record.capacity.unwrap_or(0),
        event_type,
    };
    Ok(Allocation { event, slot })
}

impl Allocation {
    /// Canonical indices of this allocation, found by value equality.
    pub fn locate(&self, events: &[Event], slots: &[Slot]) -> Option<(EventIndex, SlotIndex)> {
        let event = events.iter().position(|e| *e == self.event)?;
        let slot = slots.iter().position(|s| *s == self.slot)?;
        Some((event, slot))
    }
}
