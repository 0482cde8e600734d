//! Capacity-aware filtering of ruled-open time.
//!
//! Busy slots are swept in time order into a step function counting how many
//! are active at each instant. Wherever that count reaches the resource's
//! capacity the resource is saturated; the available set is the ruled-open set
//! minus the saturated spans.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::{EngineError, Result};
use crate::interval::{SpanSet, TimeSpan};
use crate::rule::ResourceId;

/// One unit of occupation of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusySlot {
    resource_id: ResourceId,
    span: TimeSpan,
}

impl BusySlot {
    /// # Errors
    /// Returns [`EngineError::InvalidSpan`] when `end <= start`.
    pub fn new(resource_id: ResourceId, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        Ok(Self::from_span(resource_id, TimeSpan::new(start, end)?))
    }

    pub fn from_span(resource_id: ResourceId, span: TimeSpan) -> Self {
        Self { resource_id, span }
    }

    pub fn resource_id(&self) -> ResourceId {
        self.resource_id
    }

    pub fn span(&self) -> TimeSpan {
        self.span
    }
}

/// Per-resource capacity. Resources without an entry have capacity 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapacityMap {
    entries: BTreeMap<ResourceId, u32>,
}

impl CapacityMap {
    pub const DEFAULT_CAPACITY: u32 = 1;

    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Returns [`EngineError::InvalidCapacity`] for a zero capacity.
    pub fn with(mut self, resource_id: ResourceId, capacity: u32) -> Result<Self> {
        if capacity == 0 {
            return Err(EngineError::InvalidCapacity(format!(
                "resource {} has capacity 0",
                resource_id
            )));
        }
        self.entries.insert(resource_id, capacity);
        Ok(self)
    }

    /// # Errors
    /// Returns [`EngineError::InvalidCapacity`] if any capacity is zero.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (ResourceId, u32)>,
    {
        pairs
            .into_iter()
            .try_fold(Self::new(), |map, (id, cap)| map.with(id, cap))
    }

    pub fn get(&self, resource_id: ResourceId) -> u32 {
        self.entries
            .get(&resource_id)
            .copied()
            .unwrap_or(Self::DEFAULT_CAPACITY)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, u32)> + '_ {
        self.entries.iter().map(|(id, cap)| (*id, *cap))
    }
}

/// Spans during which at least `capacity` of the given busy spans are active.
pub fn saturated_spans<'a, I>(busy: I, capacity: u32) -> SpanSet
where
    I: IntoIterator<Item = &'a TimeSpan>,
{
    let mut edges: Vec<(DateTime<Utc>, i64)> = busy
        .into_iter()
        .flat_map(|span| [(span.start(), 1), (span.end(), -1)])
        .collect();
    edges.sort_unstable();

    let threshold = i64::from(capacity);
    let mut saturated = Vec::new();
    let mut active = 0i64;
    let mut saturated_since: Option<DateTime<Utc>> = None;

    let mut idx = 0;
    while idx < edges.len() {
        // Apply every edge at this instant before classifying, so a slot ending
        // exactly where another starts never counts twice.
        let instant = edges[idx].0;
        while idx < edges.len() && edges[idx].0 == instant {
            active += edges[idx].1;
            idx += 1;
        }

        match (saturated_since, active >= threshold) {
            (None, true) => saturated_since = Some(instant),
            (Some(since), false) => {
                saturated.push(TimeSpan::from_ordered(since, instant));
                saturated_since = None;
            }
            _ => {}
        }
    }

    SpanSet::from_spans(saturated)
}

/// Restrict `ruled_open` to the time where concurrent busy slots stay strictly
/// below `capacity`.
pub fn sweep_capacity(ruled_open: &SpanSet, busy: &[TimeSpan], capacity: u32) -> SpanSet {
    if busy.is_empty() || ruled_open.is_empty() {
        return ruled_open.clone();
    }
    ruled_open.difference(&saturated_spans(busy, capacity))
}

/// Group busy spans by resource, keeping input order within a resource.
pub fn busy_by_resource(busy: &[BusySlot]) -> BTreeMap<ResourceId, Vec<TimeSpan>> {
    let mut grouped: BTreeMap<ResourceId, Vec<TimeSpan>> = BTreeMap::new();
    for slot in busy {
        grouped.entry(slot.resource_id).or_default().push(slot.span);
    }
    grouped
}
