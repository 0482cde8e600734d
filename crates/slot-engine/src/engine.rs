//! The availability computation entry point.
//!
//! [`compute`] runs the whole pipeline for one query: rule expansion, open
//! windows, capacity sweep per resource, then AND/OR combination. It reads no
//! clock and holds no state, so identical inputs always give identical output.

use std::collections::BTreeMap;

use crate::capacity::{busy_by_resource, sweep_capacity, BusySlot, CapacityMap};
use crate::combine::{combine, AvailabilityQuery, QueryLimits, UtcSlot};
use crate::error::{EngineError, Result};
use crate::interval::SpanSet;
use crate::resolver::{resolve_rules, Polarity};
use crate::rule::{ResourceId, Rule};
use crate::window::build_open_windows;

/// Already-resolved inputs for one computation.
#[derive(Debug, Clone, Default)]
pub struct EngineInputs {
    pub rules: Vec<Rule>,
    pub busy: Vec<BusySlot>,
    pub capacities: CapacityMap,
}

/// Intermediate results for one resource of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReport {
    pub resource_id: ResourceId,
    pub capacity: u32,
    pub include_candidates: usize,
    pub exclude_candidates: usize,
    pub busy_slots: usize,
    /// Time opened by the calendar rules, before busy slots are considered.
    pub ruled_open: SpanSet,
    /// Ruled-open time where concurrency stays below capacity.
    pub available: SpanSet,
}

/// Compute the slots during which `query` is satisfiable, with default limits.
///
/// # Errors
/// Returns [`EngineError::InvalidQuery`] if the query exceeds
/// [`QueryLimits::default`].
pub fn compute(query: &AvailabilityQuery, inputs: &EngineInputs) -> Result<Vec<UtcSlot>> {
    compute_with_limits(query, inputs, &QueryLimits::default())
}

/// Compute slots, rejecting queries that exceed `limits`.
///
/// # Errors
/// Returns [`EngineError::InvalidQuery`] for a query with no required
/// resources or one that exceeds `limits`.
pub fn compute_with_limits(
    query: &AvailabilityQuery,
    inputs: &EngineInputs,
    limits: &QueryLimits,
) -> Result<Vec<UtcSlot>> {
    check_query(query, limits)?;

    let available: BTreeMap<ResourceId, SpanSet> = explain_resources(query, inputs)
        .into_iter()
        .map(|report| (report.resource_id, report.available))
        .collect();

    Ok(combine(&available, query.required(), query.or_groups()))
}

/// Per-resource breakdown of a query, for diagnostics.
///
/// # Errors
/// Same conditions as [`compute`].
pub fn explain(query: &AvailabilityQuery, inputs: &EngineInputs) -> Result<Vec<ResourceReport>> {
    explain_with_limits(query, inputs, &QueryLimits::default())
}

/// Per-resource breakdown, rejecting queries that exceed `limits`.
///
/// # Errors
/// Same conditions as [`compute_with_limits`].
pub fn explain_with_limits(
    query: &AvailabilityQuery,
    inputs: &EngineInputs,
    limits: &QueryLimits,
) -> Result<Vec<ResourceReport>> {
    check_query(query, limits)?;
    Ok(explain_resources(query, inputs))
}

fn check_query(query: &AvailabilityQuery, limits: &QueryLimits) -> Result<()> {
    if query.required().is_empty() {
        return Err(EngineError::InvalidQuery(
            "at least one required resource is needed".to_string(),
        ));
    }
    query.check_limits(limits)
}

fn explain_resources(query: &AvailabilityQuery, inputs: &EngineInputs) -> Vec<ResourceReport> {
    let resolved = resolve_rules(&inputs.rules, query.period());
    let open_windows = build_open_windows(&resolved);
    let busy = busy_by_resource(&inputs.busy);

    query
        .resource_ids()
        .into_iter()
        .map(|resource_id| {
            let candidates = resolved.get(&resource_id).map(Vec::as_slice).unwrap_or(&[]);
            let include_candidates = candidates
                .iter()
                .filter(|c| c.polarity == Polarity::Include)
                .count();
            let ruled_open = open_windows.get(&resource_id).cloned().unwrap_or_default();
            let busy_spans = busy.get(&resource_id).map(Vec::as_slice).unwrap_or(&[]);
            let capacity = inputs.capacities.get(resource_id);
            let available = sweep_capacity(&ruled_open, busy_spans, capacity);

            ResourceReport {
                resource_id,
                capacity,
                include_candidates,
                exclude_candidates: candidates.len() - include_candidates,
                busy_slots: busy_spans.len(),
                ruled_open,
                available,
            }
        })
        .collect()
}

/// The first slot lasting at least `min_duration_minutes`.
pub fn find_first_slot(slots: &[UtcSlot], min_duration_minutes: i64) -> Option<&UtcSlot> {
    slots
        .iter()
        .find(|slot| slot.duration_minutes() >= min_duration_minutes)
}

/// Drop slots shorter than `min_duration_minutes`, keeping order.
pub fn filter_min_duration(slots: Vec<UtcSlot>, min_duration_minutes: i64) -> Vec<UtcSlot> {
    slots
        .into_iter()
        .filter(|slot| slot.duration_minutes() >= min_duration_minutes)
        .collect()
}
