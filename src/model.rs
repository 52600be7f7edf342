use log::info;

use crate::constraints::{self, Clashes, Unavailability, Unsuitability};
use crate::data::{
    ClashDeclarations, Event, EventIndex, RawEvent, Slot, SlotIndex, UnavailabilityDeclarations,
    VenueDirectory,
};
use crate::error::Result;
use crate::normalise;

/// The flat, index-addressed model handed to an optimisation capability.
///
/// Every table references events and slots by their position in
/// [`Model::events`] and [`Model::slots`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub events: Vec<Event>,
    pub slots: Vec<Slot>,
    pub unavailability: Unavailability,
    pub clashes: Clashes,
    pub unsuitability: Unsuitability,
    /// Slots overlapping each slot in time.
    pub concurrency: Vec<Vec<SlotIndex>>,
}

impl Model {
    /// Normalise the raw definitions and derive every constraint table.
    pub fn build(
        directory: &VenueDirectory,
        records: &[RawEvent],
        unavailability: &UnavailabilityDeclarations,
        clashes: &ClashDeclarations,
    ) -> Result<Self> {
        let slots = normalise::slots(directory);
        let events = normalise::events(records)?;
        Ok(Self::from_parts(events, slots, unavailability, clashes))
    }

    /// Derive the tables for already normalised lists.
    pub fn from_parts(
        events: Vec<Event>,
        slots: Vec<Slot>,
        unavailability: &UnavailabilityDeclarations,
        clashes: &ClashDeclarations,
    ) -> Self {
        let model = Self {
            unavailability: constraints::unavailability(&events, &slots, unavailability),
            clashes: constraints::clashes(&events, clashes),
            unsuitability: constraints::unsuitability(&events, &slots),
            concurrency: constraints::concurrent_slots(&slots),
            events,
            slots,
        };
        info!(
            "Built constraint model: {} events, {} slots, {} restricted events, {} clash pairs",
            model.events.len(),
            model.slots.len(),
            model.unavailability.len(),
            model.clashes.declared_pairs()
        );
        model
    }

    /// Whether `event` may be placed in `slot` on its own, ignoring clashes.
    pub fn admissible(&self, event: EventIndex, slot: SlotIndex) -> bool {
        !self.unavailability.is_unavailable(event, slot)
            && !self.unsuitability.is_unsuitable(event, slot)
    }

    /// Admissible slots per event.
    pub fn candidates(&self) -> Vec<Vec<SlotIndex>> {
        (0..self.events.len())
            .map(|event| {
                (0..self.slots.len())
                    .filter(|&slot| self.admissible(event, slot))
                    .collect()
            })
            .collect()
    }
}
