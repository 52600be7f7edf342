//! Flattens venue directories and raw event records into the canonical,
//! index-addressed slot and event lists.

use std::collections::BTreeMap;

use log::trace;

use crate::data::{
    Event, NestedVenue, RawEvent, SessionCatalogue, Slot, SlotTime, TemplateVenue, VenueDirectory,
    at_offset,
};
use crate::error::{Result, SchedulerError};

/// Reshape session templates into one ordered list of slot times per event
/// type. Per-type ordering is that of the catalogue.
pub fn slot_times(sessions: &SessionCatalogue) -> BTreeMap<String, Vec<SlotTime>> {
    sessions
        .iter()
        .map(|(event_type, templates)| {
            let times = templates
                .iter()
                .flat_map(|session| {
                    session.slots.iter().map(|slot| SlotTime {
                        session_name: session.name.clone(),
                        starts_at: slot.starts_at,
                        duration: slot.duration,
                    })
                })
                .collect();
            (event_type.clone(), times)
        })
        .collect()
}

/// Outer expansion order: `event_types` as given, then any catalogue type it
/// leaves out, in catalogue order.
fn type_order<'a>(event_types: &'a [String], sessions: &'a SessionCatalogue) -> Vec<&'a str> {
    let mut order: Vec<&str> = Vec::with_capacity(sessions.len());
    for event_type in event_types.iter().chain(sessions.keys()) {
        if sessions.contains_key(event_type) && !order.contains(&event_type.as_str()) {
            order.push(event_type.as_str());
        }
    }
    order
}

/// One slot per (event type, suitable venue, available day, slot time).
pub fn templated_slots(
    venues: &[TemplateVenue],
    sessions: &SessionCatalogue,
    event_types: &[String],
) -> Vec<Slot> {
    let mut times_by_type = slot_times(sessions);
    let mut slots = Vec::new();
    for event_type in type_order(event_types, sessions) {
        let Some(times) = times_by_type.remove(event_type) else {
            continue;
        };
        let event_type = event_type.to_owned();
        for venue in venues.iter().filter(|v| v.suitable_for.contains(&event_type)) {
            for day in &venue.available {
                for time in &times {
                    slots.push(Slot {
                        venue: venue.name.clone(),
                        starts_at: at_offset(*day, time.starts_at),
                        duration: time.duration,
                        capacity: venue.capacity,
                        event_type: event_type.clone(),
                    });
                }
            }
        }
    }
    trace!("Expanded {} template venues into {} slots", venues.len(), slots.len());
    slots
}

/// Flatten venue, day, session and descriptor in the order given.
pub fn nested_slots(venues: &[NestedVenue]) -> Vec<Slot> {
    venues
        .iter()
        .flat_map(|venue| {
            venue.days.iter().flat_map(move |day| {
                day.sessions.iter().flat_map(move |session| {
                    session.slots.iter().map(move |descriptor| Slot {
                        venue: venue.name.clone(),
                        starts_at: at_offset(day.date, descriptor.starts_at),
                        duration: descriptor.duration,
                        capacity: descriptor.capacity,
                        event_type: descriptor.event_type.clone(),
                    })
                })
            })
        })
        .collect()
}

pub fn slots(directory: &VenueDirectory) -> Vec<Slot> {
    match directory {
        VenueDirectory::Templated {
            venues,
            sessions,
            event_types,
        } => templated_slots(venues, sessions, event_types),
        VenueDirectory::Nested { venues } => nested_slots(venues),
    }
}

/// Map each raw record to an [`Event`], failing on the first record that
/// lacks a title, duration or event type.
pub fn events(records: &[RawEvent]) -> Result<Vec<Event>> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| event(index, record))
        .collect()
}

fn event(index: usize, record: &RawEvent) -> Result<Event> {
    let title = record
        .title
        .clone()
        .ok_or_else(|| SchedulerError::missing(index, "title"))?;
    let duration = record
        .duration
        .ok_or_else(|| SchedulerError::missing(index, "duration"))?;
    let event_type = record
        .event_type
        .clone()
        .ok_or_else(|| SchedulerError::missing(index, "eventType"))?;

    Ok(Event {
        title,
        duration,
        tags: record.tags.clone().map(|t| t.into_set()).unwrap_or_default(),
        person: record.person.clone(),
        event_type,
        demand: record.demand.unwrap_or(0),
    })
}
