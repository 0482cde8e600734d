//! End-to-end tests for `compute`: rules, busy slots and capacities in,
//! merged slots out. All scenarios run on Monday 2025-03-10, UTC.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use slot_engine::{
    compute, compute_with_limits, explain, explain_with_limits, filter_min_duration,
    find_first_slot, AvailabilityQuery, BusySlot, CapacityMap, DailyWindow, DatePeriod,
    EngineError, EngineInputs, QueryLimits, Rule, RulePattern, UtcSlot, WeekdayMask,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
}

fn window(h1: u32, m1: u32, h2: u32, m2: u32) -> DailyWindow {
    DailyWindow::new(
        NaiveTime::from_hms_opt(h1, m1, 0).unwrap(),
        NaiveTime::from_hms_opt(h2, m2, 0).unwrap(),
    )
    .unwrap()
}

/// Include rule opening `resource` on the scenario day.
fn open(resource: u32, h1: u32, h2: u32) -> Rule {
    Rule::new(
        u64::from(resource),
        resource,
        RulePattern::SingleDate { date: day() },
        window(h1, 0, h2, 0),
    )
    .unwrap()
}

fn busy(resource: u32, h1: u32, m1: u32, h2: u32, m2: u32) -> BusySlot {
    BusySlot::new(resource, at(h1, m1), at(h2, m2)).unwrap()
}

fn query(required: &[u32], groups: &[&[u32]]) -> AvailabilityQuery {
    AvailabilityQuery::new(
        DatePeriod::single(day()),
        required.iter().copied(),
        groups.iter().map(|g| g.iter().copied()),
    )
    .unwrap()
}

fn times(slots: &[UtcSlot]) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    slots.iter().map(|s| (s.start(), s.end())).collect()
}

fn ids(list: &[u32]) -> BTreeSet<u32> {
    list.iter().copied().collect()
}

// ── Scenario 1: capacity 1, one busy slot ───────────────────────────────────

#[test]
fn scenario_capacity_one_single_busy() {
    let inputs = EngineInputs {
        rules: vec![open(1, 9, 11)],
        busy: vec![busy(1, 9, 0, 10, 0)],
        capacities: CapacityMap::new().with(1, 1).unwrap(),
    };

    let slots = compute(&query(&[1], &[]), &inputs).unwrap();
    assert_eq!(times(&slots), vec![(at(10, 0), at(11, 0))]);
    assert_eq!(slots[0].resource_ids(), &ids(&[1]));
}

// ── Scenario 2: capacity 2, one busy slot ───────────────────────────────────

#[test]
fn scenario_capacity_two_single_busy_keeps_window() {
    let inputs = EngineInputs {
        rules: vec![open(2, 9, 11)],
        busy: vec![busy(2, 9, 0, 10, 0)],
        capacities: CapacityMap::new().with(2, 2).unwrap(),
    };

    let slots = compute(&query(&[2], &[]), &inputs).unwrap();
    assert_eq!(times(&slots), vec![(at(9, 0), at(11, 0))]);
}

// ── Scenario 3: capacity 2, two overlapping busy slots ──────────────────────

#[test]
fn scenario_capacity_two_overlapping_busy() {
    let inputs = EngineInputs {
        rules: vec![open(3, 9, 11)],
        busy: vec![busy(3, 9, 0, 10, 0), busy(3, 9, 30, 10, 30)],
        capacities: CapacityMap::new().with(3, 2).unwrap(),
    };

    let slots = compute(&query(&[3], &[]), &inputs).unwrap();
    assert_eq!(
        times(&slots),
        vec![(at(9, 0), at(9, 30)), (at(10, 0), at(11, 0))]
    );
}

// ── Scenario 4: capacity 3, three busy slots ────────────────────────────────

#[test]
fn scenario_capacity_three_triple_overlap() {
    let inputs = EngineInputs {
        rules: vec![open(4, 9, 11)],
        busy: vec![
            busy(4, 9, 0, 11, 0),
            busy(4, 9, 30, 10, 30),
            busy(4, 10, 0, 11, 0),
        ],
        capacities: CapacityMap::new().with(4, 3).unwrap(),
    };

    let slots = compute(&query(&[4], &[]), &inputs).unwrap();
    assert_eq!(
        times(&slots),
        vec![(at(9, 0), at(10, 0)), (at(10, 30), at(11, 0))]
    );
}

// ── Scenario 5: required resource plus an OR-group ──────────────────────────

#[test]
fn scenario_or_group_satisfied_by_member_with_spare_capacity() {
    let inputs = EngineInputs {
        rules: vec![open(10, 9, 11), open(11, 9, 11), open(12, 9, 11)],
        busy: vec![busy(11, 9, 0, 11, 0), busy(12, 9, 0, 10, 0)],
        capacities: CapacityMap::from_pairs([(11, 1), (12, 2)]).unwrap(),
    };

    let slots = compute(&query(&[10], &[&[11, 12]]), &inputs).unwrap();
    assert_eq!(times(&slots), vec![(at(9, 0), at(11, 0))]);
    assert_eq!(slots[0].resource_ids(), &ids(&[10, 12]));
}

// ── Multi-day weekly rules with exclusions ──────────────────────────────────

#[test]
fn weekday_hours_with_lunch_exclusion_over_a_week() {
    let week = DatePeriod::new(day(), NaiveDate::from_ymd_opt(2025, 3, 16).unwrap()).unwrap();
    let hours = Rule::new(
        1,
        1,
        RulePattern::RecurringWeekly {
            days: WeekdayMask::MONDAY_TO_FRIDAY,
            from: None,
            to: None,
        },
        window(9, 0, 17, 0),
    )
    .unwrap();
    let lunch = Rule::new(
        2,
        1,
        RulePattern::SingleDate {
            date: NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
        },
        window(12, 0, 13, 0),
    )
    .unwrap()
    .excluding();

    let inputs = EngineInputs {
        rules: vec![hours, lunch],
        ..EngineInputs::default()
    };
    let query = AvailabilityQuery::new(week, [1], Vec::<Vec<u32>>::new()).unwrap();

    let slots = compute(&query, &inputs).unwrap();
    assert_eq!(slots.len(), 6, "five weekdays, Wednesday split by lunch");
    assert_eq!(
        slots[2].start(),
        Utc.with_ymd_and_hms(2025, 3, 12, 9, 0, 0).unwrap()
    );
    assert_eq!(
        slots[2].end(),
        Utc.with_ymd_and_hms(2025, 3, 12, 12, 0, 0).unwrap()
    );
    assert_eq!(
        slots[3].start(),
        Utc.with_ymd_and_hms(2025, 3, 12, 13, 0, 0).unwrap()
    );
    assert!(slots
        .iter()
        .all(|s| s.start().date_naive() <= NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()));
}

#[test]
fn resource_without_rules_is_never_available() {
    let inputs = EngineInputs {
        rules: vec![open(1, 9, 11)],
        ..EngineInputs::default()
    };
    let slots = compute(&query(&[1, 2], &[]), &inputs).unwrap();
    assert!(slots.is_empty());
}

#[test]
fn rules_for_other_resources_are_ignored() {
    let inputs = EngineInputs {
        rules: vec![open(1, 9, 11), open(99, 6, 20)],
        busy: vec![busy(99, 9, 0, 10, 0)],
        ..EngineInputs::default()
    };
    let slots = compute(&query(&[1], &[]), &inputs).unwrap();
    assert_eq!(times(&slots), vec![(at(9, 0), at(11, 0))]);
}

// ── Output shape and determinism ────────────────────────────────────────────

#[test]
fn output_is_sorted_disjoint_and_non_adjacent() {
    let inputs = EngineInputs {
        rules: vec![open(1, 8, 18), open(2, 8, 18)],
        busy: vec![
            busy(1, 9, 0, 10, 0),
            busy(2, 10, 0, 11, 0),
            busy(1, 14, 0, 15, 0),
        ],
        ..EngineInputs::default()
    };
    let slots = compute(&query(&[1, 2], &[]), &inputs).unwrap();

    assert_eq!(
        times(&slots),
        vec![
            (at(8, 0), at(9, 0)),
            (at(11, 0), at(14, 0)),
            (at(15, 0), at(18, 0)),
        ]
    );
    for pair in slots.windows(2) {
        assert!(pair[0].end() < pair[1].start());
    }
}

#[test]
fn identical_inputs_give_identical_output() {
    let inputs = EngineInputs {
        rules: vec![open(10, 9, 11), open(11, 9, 11), open(12, 8, 12)],
        busy: vec![busy(11, 9, 30, 10, 0), busy(12, 10, 0, 10, 30)],
        capacities: CapacityMap::from_pairs([(12, 2)]).unwrap(),
    };
    let q = query(&[10], &[&[11, 12]]);
    assert_eq!(compute(&q, &inputs).unwrap(), compute(&q, &inputs).unwrap());
}

// ── Limits and errors ───────────────────────────────────────────────────────

#[test]
fn oversized_query_is_rejected() {
    let limits = QueryLimits {
        max_groups: 1,
        ..QueryLimits::default()
    };
    let err = compute_with_limits(
        &query(&[1], &[&[2], &[3]]),
        &EngineInputs::default(),
        &limits,
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::InvalidQuery(_)));
}

// ── Diagnostics and post-filters ────────────────────────────────────────────

#[test]
fn explain_reports_each_stage_per_resource() {
    let inputs = EngineInputs {
        rules: vec![open(1, 9, 11)],
        busy: vec![busy(1, 9, 0, 10, 0)],
        capacities: CapacityMap::new(),
    };
    let reports = explain(&query(&[1], &[&[2]]), &inputs).unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].resource_id, 1);
    assert_eq!(reports[0].capacity, 1);
    assert_eq!(reports[0].include_candidates, 1);
    assert_eq!(reports[0].busy_slots, 1);
    assert_eq!(reports[0].ruled_open.total_minutes(), 120);
    assert_eq!(reports[0].available.total_minutes(), 60);
    assert!(reports[0].available.is_subset_of(&reports[0].ruled_open));
    assert!(reports[1].ruled_open.is_empty());
}

#[test]
fn explain_honours_explicit_limits() {
    let required: Vec<u32> = (1..=70).collect();
    let q = query(&required, &[]);
    let inputs = EngineInputs {
        rules: required.iter().map(|&id| open(id, 9, 11)).collect(),
        ..EngineInputs::default()
    };

    let err = explain(&q, &inputs).unwrap_err();
    assert!(matches!(err, EngineError::InvalidQuery(_)));

    let limits = QueryLimits {
        max_required: 100,
        ..QueryLimits::default()
    };
    let reports = explain_with_limits(&q, &inputs, &limits).unwrap();
    assert_eq!(reports.len(), 70);
    assert!(reports.iter().all(|r| r.ruled_open.total_minutes() == 120));
    assert_eq!(compute_with_limits(&q, &inputs, &limits).unwrap().len(), 1);
}

#[test]
fn first_slot_respects_min_duration() {
    let inputs = EngineInputs {
        rules: vec![open(1, 9, 17)],
        busy: vec![busy(1, 9, 15, 12, 0)],
        ..EngineInputs::default()
    };
    let slots = compute(&query(&[1], &[]), &inputs).unwrap();

    let first = find_first_slot(&slots, 60).unwrap();
    assert_eq!(first.start(), at(12, 0));
    assert_eq!(first.duration_minutes(), 300);

    assert!(find_first_slot(&slots, 600).is_none());
    assert_eq!(filter_min_duration(slots, 30).len(), 1);
}
