//! Boolean composition of per-resource availability.
//!
//! Required resources are combined with AND (interval intersection), members
//! of each alternative group with OR (interval union), and the group results
//! are intersected with the required result.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::error::{EngineError, Result};
use crate::interval::{SpanSet, TimeSpan};
use crate::period::DatePeriod;
use crate::rule::ResourceId;

/// Upper bounds on query size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    pub max_required: usize,
    pub max_groups: usize,
    pub max_group_size: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_required: 64,
            max_groups: 16,
            max_group_size: 64,
        }
    }
}

/// Which resources must be free together, and over which dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityQuery {
    period: DatePeriod,
    required: BTreeSet<ResourceId>,
    or_groups: Vec<BTreeSet<ResourceId>>,
}

impl AvailabilityQuery {
    /// Build a query from raw id lists.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidQuery`] when the required list is empty,
    /// any id is zero, an id repeats within the required list or within a
    /// group, or a group is empty.
    pub fn new<R, G, M>(period: DatePeriod, required: R, or_groups: G) -> Result<Self>
    where
        R: IntoIterator<Item = ResourceId>,
        G: IntoIterator<Item = M>,
        M: IntoIterator<Item = ResourceId>,
    {
        let required = unique_ids(required, "required resources")?;
        if required.is_empty() {
            return Err(EngineError::InvalidQuery(
                "at least one required resource is needed".to_string(),
            ));
        }

        let or_groups = or_groups
            .into_iter()
            .enumerate()
            .map(|(idx, members)| {
                let group = unique_ids(members, &format!("or-group {}", idx))?;
                if group.is_empty() {
                    return Err(EngineError::InvalidQuery(format!(
                        "or-group {} has no members",
                        idx
                    )));
                }
                Ok(group)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            period,
            required,
            or_groups,
        })
    }

    pub fn period(&self) -> &DatePeriod {
        &self.period
    }

    pub fn required(&self) -> &BTreeSet<ResourceId> {
        &self.required
    }

    pub fn or_groups(&self) -> &[BTreeSet<ResourceId>] {
        &self.or_groups
    }

    /// Every resource id the query mentions.
    pub fn resource_ids(&self) -> BTreeSet<ResourceId> {
        self.required
            .iter()
            .chain(self.or_groups.iter().flatten())
            .copied()
            .collect()
    }

    /// # Errors
    /// Returns [`EngineError::InvalidQuery`] when any count exceeds `limits`.
    pub fn check_limits(&self, limits: &QueryLimits) -> Result<()> {
        if self.required.len() > limits.max_required {
            return Err(EngineError::InvalidQuery(format!(
                "{} required resources exceed the limit of {}",
                self.required.len(),
                limits.max_required
            )));
        }
        if self.or_groups.len() > limits.max_groups {
            return Err(EngineError::InvalidQuery(format!(
                "{} or-groups exceed the limit of {}",
                self.or_groups.len(),
                limits.max_groups
            )));
        }
        if let Some((idx, group)) = self
            .or_groups
            .iter()
            .enumerate()
            .find(|(_, group)| group.len() > limits.max_group_size)
        {
            return Err(EngineError::InvalidQuery(format!(
                "or-group {} has {} members, over the limit of {}",
                idx,
                group.len(),
                limits.max_group_size
            )));
        }
        Ok(())
    }
}

fn unique_ids<I>(ids: I, what: &str) -> Result<BTreeSet<ResourceId>>
where
    I: IntoIterator<Item = ResourceId>,
{
    let mut seen = BTreeSet::new();
    for id in ids {
        if id == 0 {
            return Err(EngineError::InvalidQuery(format!(
                "{} contain resource id 0",
                what
            )));
        }
        if !seen.insert(id) {
            return Err(EngineError::InvalidQuery(format!(
                "{} list resource {} more than once",
                what, id
            )));
        }
    }
    Ok(seen)
}

/// One output window during which the query is satisfiable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UtcSlot {
    span: TimeSpan,
    resource_ids: BTreeSet<ResourceId>,
}

impl UtcSlot {
    pub fn new(span: TimeSpan, resource_ids: BTreeSet<ResourceId>) -> Self {
        Self { span, resource_ids }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.span.start()
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.span.end()
    }

    pub fn span(&self) -> TimeSpan {
        self.span
    }

    /// Required ids plus every group member that is free for the whole slot.
    pub fn resource_ids(&self) -> &BTreeSet<ResourceId> {
        &self.resource_ids
    }

    pub fn duration_minutes(&self) -> i64 {
        self.span.duration_minutes()
    }
}

/// Combine per-resource availability into the final slot sequence.
///
/// Ids missing from `available` are treated as never available. An empty
/// `required` set constrains nothing; with neither required ids nor groups
/// there is nothing to bound the result and no slots are produced.
pub fn combine(
    available: &BTreeMap<ResourceId, SpanSet>,
    required: &BTreeSet<ResourceId>,
    or_groups: &[BTreeSet<ResourceId>],
) -> Vec<UtcSlot> {
    let required_avail = required_availability(available, required);
    let combined = or_groups
        .iter()
        .map(|group| group_availability(available, group))
        .fold(required_avail, |acc, group_avail| match acc {
            Some(acc) => Some(acc.intersect(&group_avail)),
            None => Some(group_avail),
        })
        .unwrap_or_default();

    combined
        .iter()
        .map(|span| {
            let mut ids = required.clone();
            for group in or_groups {
                ids.extend(
                    group
                        .iter()
                        .filter(|id| available.get(*id).is_some_and(|avail| avail.covers(span))),
                );
            }
            UtcSlot::new(*span, ids)
        })
        .collect()
}

/// Intersection of the required resources' availability, left to right.
///
/// `None` means no required resource was given (the identity for intersection).
pub fn required_availability(
    available: &BTreeMap<ResourceId, SpanSet>,
    required: &BTreeSet<ResourceId>,
) -> Option<SpanSet> {
    let empty = SpanSet::new();
    let mut ids = required.iter();
    let first = ids.next()?;
    let mut acc = available.get(first).unwrap_or(&empty).clone();
    for id in ids {
        if acc.is_empty() {
            break;
        }
        acc = acc.intersect(available.get(id).unwrap_or(&empty));
    }
    Some(acc)
}

/// Union of one alternative group's availability.
pub fn group_availability(
    available: &BTreeMap<ResourceId, SpanSet>,
    group: &BTreeSet<ResourceId>,
) -> SpanSet {
    group
        .iter()
        .filter_map(|id| available.get(id))
        .fold(SpanSet::new(), |acc, avail| acc.union(avail))
}
