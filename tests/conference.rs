//! End-to-end behaviour over a small conference: five venues, four days and
//! six events.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use conference_scheduler::allocation::{resolve, resolve_manual};
use conference_scheduler::data::{
    ClashDeclarations, RawAllocation, RawEvent, RawTags, SessionCatalogue, SessionSlot,
    SessionTemplate, TemplateVenue, UnavailabilityDeclarations, UnavailableInterval,
    VenueDirectory,
};
use conference_scheduler::solver::{Capability, Infeasible, SolveRequest};
use conference_scheduler::{
    Engine, IndexKind, Model, Orchestrator, SchedulerError, SolveOutcome, normalise,
};
use rstest::{fixture, rstest};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2017, 10, d).expect("valid date")
}

fn instant(d: u32, h: u32, m: u32) -> NaiveDateTime {
    day(d).and_hms_opt(h, m, 0).expect("valid time")
}

fn venue(name: &str, capacity: u32, suitable_for: &[&str], available: &[u32]) -> TemplateVenue {
    TemplateVenue {
        name: name.into(),
        capacity,
        suitable_for: suitable_for.iter().map(|s| (*s).to_owned()).collect(),
        available: available.iter().copied().map(day).collect(),
    }
}

fn session(name: &str, slots: &[(u32, u32)]) -> SessionTemplate {
    SessionTemplate {
        name: name.into(),
        slots: slots
            .iter()
            .map(|&(starts_at, duration)| SessionSlot { starts_at, duration })
            .collect(),
    }
}

#[fixture]
fn directory() -> VenueDirectory {
    let all_days = [26, 27, 28, 29];
    let venues = vec![
        venue("Assembly Room", 500, &["talk", "plenary"], &all_days),
        venue("Room A", 80, &["workshop"], &all_days),
        venue("Ferrier Hall", 200, &["talk"], &all_days),
        venue("Room C", 80, &["talk", "workshop"], &all_days),
        venue("Room D", 100, &["talk"], &[26]),
    ];
    let mut sessions = SessionCatalogue::new();
    sessions.insert("plenary".into(), vec![session("None", &[(34_200, 2_700)])]);
    sessions.insert(
        "talk".into(),
        vec![
            session("morning", &[(36_900, 1_800), (39_600, 1_800)]),
            session("afternoon", &[(52_200, 1_800), (54_000, 1_800)]),
        ],
    );
    sessions.insert(
        "workshop".into(),
        vec![session("None", &[(36_900, 7_200), (52_200, 7_200)])],
    );
    VenueDirectory::Templated {
        venues,
        sessions,
        event_types: ["talk", "workshop", "plenary"].map(String::from).to_vec(),
    }
}

fn record(title: &str, duration: u32, tags: &[&str], person: &str, event_type: &str) -> RawEvent {
    RawEvent {
        title: Some(title.into()),
        duration: Some(duration),
        tags: Some(RawTags::List(tags.iter().map(|t| (*t).to_owned()).collect())),
        person: Some(person.into()),
        event_type: Some(event_type.into()),
        demand: None,
    }
}

#[fixture]
fn records() -> Vec<RawEvent> {
    vec![
        record("UKPA AGM", 2_700, &["plenary"], "owen-campbell", "talk"),
        record("A very exciting talk", 1_800, &["talk"], "owen-campbell", "talk"),
        record("A very interesting talk", 1_800, &["talk"], "vincent-knight", "talk"),
        record("A slightly dull talk", 1_800, &[], "joe-bloggs", "talk"),
        record("A fascinating workshop", 5_400, &["talk"], "alice", "workshop"),
        record("A beginner workshop", 5_400, &["talk"], "bob", "workshop"),
    ]
}

#[fixture]
fn unavailability() -> UnavailabilityDeclarations {
    let mut declarations = UnavailabilityDeclarations::new();
    declarations.insert(
        "owen-campbell".into(),
        vec![UnavailableInterval {
            unavailable_from: instant(26, 0, 0),
            unavailable_until: instant(26, 23, 59),
        }],
    );
    declarations
}

#[fixture]
fn clashes() -> ClashDeclarations {
    let mut declarations = ClashDeclarations::new();
    declarations.insert(
        "owen-campbell".into(),
        vec!["vincent-knight".into(), "joe-bloggs".into()],
    );
    declarations
}

#[fixture]
fn model(
    directory: VenueDirectory,
    records: Vec<RawEvent>,
    unavailability: UnavailabilityDeclarations,
    clashes: ClashDeclarations,
) -> Model {
    Model::build(&directory, &records, &unavailability, &clashes).expect("well formed conference")
}

#[rstest]
fn four_days_three_types_give_72_slots(directory: VenueDirectory) {
    assert_eq!(normalise::slots(&directory).len(), 72);
}

#[rstest]
fn slots_follow_the_declared_event_type_order(directory: VenueDirectory) {
    let slots = normalise::slots(&directory);
    // talk: 4 venues over 4 days plus Room D on one day, 4 times each.
    // workshop: 2 venues, 4 days, 2 times. plenary: 1 venue, 4 days, 1 time.
    let types: Vec<&str> = slots.iter().map(|s| s.event_type.as_str()).collect();
    assert!(types[..52].iter().all(|t| *t == "talk"));
    assert!(types[52..68].iter().all(|t| *t == "workshop"));
    assert!(types[68..].iter().all(|t| *t == "plenary"));
    assert_eq!(slots[0].venue, "Assembly Room");
    assert_eq!(slots[0].starts_at, instant(26, 10, 15));
}

#[rstest]
fn tables_are_total_and_in_range(model: Model) {
    assert_eq!(model.events.len(), 6);
    assert_eq!(model.clashes.len(), model.events.len());
    assert_eq!(model.unsuitability.len(), model.events.len());
    assert!(model.unavailability.events().all(|e| e < model.events.len()));
    for (_, slots) in model.unsuitability.iter().chain(model.unavailability.iter()) {
        assert!(slots.iter().all(|&s| s < model.slots.len()));
    }
    for (event, others) in model.clashes.iter() {
        assert!(others.iter().all(|&o| o < model.events.len() && o != event));
    }
}

#[rstest]
fn whole_day_unavailability_covers_that_day(model: Model) {
    let first_day: Vec<usize> = model
        .slots
        .iter()
        .enumerate()
        .filter(|(_, s)| s.starts_at.date() == day(26))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(first_day.len(), 21);
    assert_eq!(model.unavailability.events().collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(model.unavailability.get(0), Some(first_day.as_slice()));
    assert_eq!(model.unavailability.get(1), Some(first_day.as_slice()));
    assert!(!model.unavailability.contains(2));
}

#[rstest]
fn declared_person_clashes_are_symmetric(model: Model) {
    let table: Vec<Vec<usize>> = model.clashes.iter().map(|(_, o)| o.to_vec()).collect();
    assert_eq!(
        table,
        vec![vec![2, 3, 1], vec![2, 3, 0], vec![0, 1], vec![0, 1], vec![], vec![]]
    );
    assert_eq!(model.clashes.declared_pairs(), 2);
}

#[rstest]
fn mutual_declarations_do_not_double_count(records: Vec<RawEvent>, mut clashes: ClashDeclarations) {
    clashes.insert("vincent-knight".into(), vec!["owen-campbell".into()]);
    let events = normalise::events(&records).expect("well formed");
    let table = conference_scheduler::constraints::clashes(&events, &clashes);
    assert_eq!(table.get(0), &[2, 3, 1]);
    assert_eq!(table.get(2), &[0, 1]);
    assert_eq!(table.declared_pairs(), 2);
}

#[rstest]
fn workshops_only_fit_workshop_slots(model: Model) {
    for (event, unsuitable) in model.unsuitability.iter() {
        let expected: Vec<usize> = model
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.event_type != model.events[event].event_type)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(unsuitable, expected.as_slice());
    }
}

#[rstest]
fn normalisation_is_idempotent(
    directory: VenueDirectory,
    records: Vec<RawEvent>,
    unavailability: UnavailabilityDeclarations,
    clashes: ClashDeclarations,
) {
    let first = Model::build(&directory, &records, &unavailability, &clashes).expect("first");
    let second = Model::build(&directory, &records, &unavailability, &clashes).expect("second");
    assert_eq!(first, second);
}

#[rstest]
fn manual_allocation_with_null_tags() {
    let records = vec![RawAllocation {
        title: Some("A slightly dull talk".into()),
        person: Some("joe-bloggs".into()),
        venue: Some("Room D".into()),
        day: Some(day(26)),
        session: Some("afternoon".into()),
        starts_at: Some(52_200),
        duration: Some(1_800),
        tags: Some(RawTags::Text("null".into())),
        event_type: Some("talk".into()),
        capacity: Some(100),
        demand: None,
    }];
    let allocations = resolve_manual(&records).expect("well formed");
    assert_eq!(allocations[0].event.tags, BTreeSet::new());
    assert_eq!(allocations[0].slot.starts_at, instant(26, 14, 30));
}

#[rstest]
#[case("highs")]
#[case("highs_efficiency")]
#[case("hill_climber")]
#[case("simulated_annealing")]
fn bundled_engine_honours_every_hard_constraint(model: Model, #[case] strategy: &str) {
    let outcome = Orchestrator::new(Engine)
        .solve(&model, strategy)
        .expect("registered strategy");
    let pairs = match outcome {
        SolveOutcome::Scheduled(pairs) => pairs,
        SolveOutcome::NoSolution(diagnostic) => panic!("expected a timetable: {diagnostic:?}"),
    };
    let allocations = resolve(&pairs, &model.events, &model.slots).expect("in range");
    assert_eq!(allocations.len(), model.events.len());

    let used: BTreeSet<usize> = pairs.iter().map(|&(_, s)| s).collect();
    assert_eq!(used.len(), pairs.len(), "a slot was double-booked");
    for &(event, slot) in &pairs {
        assert!(model.admissible(event, slot));
        for &other in model.clashes.get(event) {
            let other_slot = &model.slots[pairs[other].1];
            assert!(!model.slots[slot].concurrent_with(other_slot));
        }
    }
    // Owen is away on the first day.
    assert!(allocations[..2].iter().all(|a| a.slot.starts_at.date() != day(26)));
}

#[rstest]
fn unknown_strategy_fails_fast(model: Model) {
    let err = Orchestrator::new(Engine)
        .solve(&model, "glpk")
        .expect_err("not registered");
    assert_eq!(err, SchedulerError::UnknownStrategy("glpk".into()));
}

#[rstest]
fn impossible_unavailability_yields_no_solution(
    directory: VenueDirectory,
    records: Vec<RawEvent>,
    clashes: ClashDeclarations,
) {
    let mut unavailability = UnavailabilityDeclarations::new();
    unavailability.insert(
        "alice".into(),
        vec![UnavailableInterval {
            unavailable_from: instant(26, 0, 0),
            unavailable_until: instant(30, 0, 0),
        }],
    );
    let model = Model::build(&directory, &records, &unavailability, &clashes).expect("well formed");
    for strategy in ["highs", "hill_climber"] {
        let outcome = Orchestrator::new(Engine).solve(&model, strategy).expect("registered");
        assert!(matches!(outcome, SolveOutcome::NoSolution(ref d) if d.strategy == strategy));
    }
}

/// Pretends every event goes into a slot that does not exist.
struct Misbehaving;

impl Capability for Misbehaving {
    fn solve(&self, request: &SolveRequest<'_>) -> Result<Vec<usize>, Infeasible> {
        Ok(vec![request.model.slots.len(); request.model.events.len()])
    }
}

#[rstest]
fn capability_contract_violation_is_fatal(model: Model) {
    let err = Orchestrator::new(Misbehaving)
        .solve(&model, "highs")
        .expect_err("slot index out of range");
    assert_eq!(
        err,
        SchedulerError::IndexOutOfBounds {
            kind: IndexKind::Slot,
            index: 72,
            len: 72
        }
    );
}
