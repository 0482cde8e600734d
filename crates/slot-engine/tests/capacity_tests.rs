//! Tests for the capacity sweep over busy slots.

use chrono::{DateTime, TimeZone, Utc};
use slot_engine::capacity::{busy_by_resource, saturated_spans, sweep_capacity, BusySlot};
use slot_engine::interval::{SpanSet, TimeSpan};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
}

fn span(h1: u32, m1: u32, h2: u32, m2: u32) -> TimeSpan {
    TimeSpan::new(at(h1, m1), at(h2, m2)).unwrap()
}

fn open_nine_to_eleven() -> SpanSet {
    SpanSet::single(span(9, 0, 11, 0))
}

// ── Capacity scenarios ──────────────────────────────────────────────────────

#[test]
fn capacity_one_blocks_any_overlap() {
    let avail = sweep_capacity(&open_nine_to_eleven(), &[span(9, 0, 10, 0)], 1);
    assert_eq!(avail.spans(), &[span(10, 0, 11, 0)]);
}

#[test]
fn single_busy_under_capacity_two_leaves_window_open() {
    let avail = sweep_capacity(&open_nine_to_eleven(), &[span(9, 0, 10, 0)], 2);
    assert_eq!(avail.spans(), &[span(9, 0, 11, 0)]);
}

#[test]
fn capacity_two_blocks_only_where_two_overlap() {
    let busy = [span(9, 0, 10, 0), span(9, 30, 10, 30)];
    let avail = sweep_capacity(&open_nine_to_eleven(), &busy, 2);
    assert_eq!(avail.spans(), &[span(9, 0, 9, 30), span(10, 0, 11, 0)]);
}

#[test]
fn capacity_three_blocks_only_where_three_overlap() {
    let busy = [span(9, 0, 11, 0), span(9, 30, 10, 30), span(10, 0, 11, 0)];
    let avail = sweep_capacity(&open_nine_to_eleven(), &busy, 3);
    assert_eq!(avail.spans(), &[span(9, 0, 10, 0), span(10, 30, 11, 0)]);
}

// ── Edge cases ──────────────────────────────────────────────────────────────

#[test]
fn no_busy_slots_leave_ruled_open_unchanged() {
    let open = SpanSet::from_spans([span(9, 0, 10, 0), span(13, 0, 14, 0)]);
    assert_eq!(sweep_capacity(&open, &[], 1), open);
}

#[test]
fn busy_outside_open_time_changes_nothing() {
    let avail = sweep_capacity(&open_nine_to_eleven(), &[span(12, 0, 13, 0)], 1);
    assert_eq!(avail.spans(), &[span(9, 0, 11, 0)]);
}

#[test]
fn shared_boundary_belongs_to_entered_interval() {
    // 09:00-10:00 ends exactly where 10:00-11:00 begins; at 10:00 only one is
    // active, so capacity 2 is never reached.
    let busy = [span(9, 0, 10, 0), span(10, 0, 11, 0)];
    let avail = sweep_capacity(&open_nine_to_eleven(), &busy, 2);
    assert_eq!(avail.spans(), &[span(9, 0, 11, 0)]);
}

#[test]
fn identical_busy_slots_each_consume_capacity() {
    let busy = [span(9, 0, 10, 0), span(9, 0, 10, 0)];
    assert_eq!(
        sweep_capacity(&open_nine_to_eleven(), &busy, 2).spans(),
        &[span(10, 0, 11, 0)]
    );
    assert_eq!(
        sweep_capacity(&open_nine_to_eleven(), &busy, 3).spans(),
        &[span(9, 0, 11, 0)]
    );
}

#[test]
fn kept_pieces_around_a_gap_in_saturation_stay_separate() {
    let busy = [span(9, 15, 9, 30), span(10, 0, 10, 15)];
    let avail = sweep_capacity(&open_nine_to_eleven(), &busy, 1);
    assert_eq!(
        avail.spans(),
        &[span(9, 0, 9, 15), span(9, 30, 10, 0), span(10, 15, 11, 0)]
    );
}

#[test]
fn saturated_spans_report_step_function_plateaus() {
    let busy = [span(9, 0, 11, 0), span(9, 30, 10, 30), span(10, 0, 11, 0)];
    assert_eq!(saturated_spans(&busy, 2).spans(), &[span(9, 30, 11, 0)]);
    assert!(saturated_spans(&busy, 4).is_empty());
}

#[test]
fn busy_slots_group_by_resource() {
    let slots = [
        BusySlot::new(2, at(9, 0), at(10, 0)).unwrap(),
        BusySlot::new(1, at(9, 0), at(9, 30)).unwrap(),
        BusySlot::new(2, at(11, 0), at(12, 0)).unwrap(),
    ];
    let grouped = busy_by_resource(&slots);
    assert_eq!(grouped[&1], vec![span(9, 0, 9, 30)]);
    assert_eq!(grouped[&2], vec![span(9, 0, 10, 0), span(11, 0, 12, 0)]);
}

#[test]
fn inverted_busy_slot_is_rejected() {
    assert!(BusySlot::new(1, at(10, 0), at(9, 0)).is_err());
}
