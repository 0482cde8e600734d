//! Serde-friendly wire records for JSON surfaces (CLI, WASM).
//!
//! Records mirror the flat storage schema: a rule row carries every optional
//! field, and may be linked to several resources. Converting a record into
//! engine types validates the fields its kind needs and flattens multi-resource
//! rules into one [`Rule`] per resource.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::capacity::{BusySlot, CapacityMap};
use crate::combine::{AvailabilityQuery, UtcSlot};
use crate::engine::{EngineInputs, ResourceReport};
use crate::error::{EngineError, Result};
use crate::interval::TimeSpan;
use crate::period::DatePeriod;
use crate::rule::{DailyWindow, ResourceId, Rule, RuleId, RuleKind, RulePattern, WeekdayMask};

/// A stored calendar rule, possibly linked to several resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub id: RuleId,
    pub kind: RuleKind,
    #[serde(default)]
    pub is_exclude: bool,
    #[serde(default)]
    pub from_date: Option<NaiveDate>,
    #[serde(default)]
    pub to_date: Option<NaiveDate>,
    #[serde(default)]
    pub single_date: Option<NaiveDate>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub days_of_week_mask: Option<u8>,
    #[serde(default)]
    pub day_of_month: Option<u32>,
    #[serde(default)]
    pub interval_days: Option<u32>,
    #[serde(default)]
    pub resource_id: Option<ResourceId>,
    #[serde(default)]
    pub resource_ids: Vec<ResourceId>,
}

impl RuleRecord {
    /// Flatten into one validated [`Rule`] per linked resource.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidRule`] when a field required by the kind is
    /// missing or out of range, or the record is linked to no resource, and
    /// [`EngineError::InvalidWindow`] for an empty time window.
    pub fn to_rules(&self) -> Result<Vec<Rule>> {
        let pattern = self.pattern()?;
        let window = DailyWindow::new(self.start_time, self.end_time)?;

        let mut resources: Vec<ResourceId> = self
            .resource_id
            .into_iter()
            .chain(self.resource_ids.iter().copied())
            .collect();
        resources.sort_unstable();
        resources.dedup();
        if resources.is_empty() {
            return Err(EngineError::InvalidRule(format!(
                "rule {} is not linked to any resource",
                self.id
            )));
        }

        resources
            .into_iter()
            .map(|resource_id| {
                let rule = Rule::new(self.id, resource_id, pattern, window)?;
                Ok(if self.is_exclude {
                    rule.excluding()
                } else {
                    rule
                })
            })
            .collect()
    }

    fn pattern(&self) -> Result<RulePattern> {
        let missing = |field: &str| {
            EngineError::InvalidRule(format!(
                "rule {} of kind {:?} needs {}",
                self.id, self.kind, field
            ))
        };

        Ok(match self.kind {
            RuleKind::RecurringWeekly => RulePattern::RecurringWeekly {
                days: WeekdayMask::new(
                    self.days_of_week_mask
                        .ok_or_else(|| missing("days_of_week_mask"))?,
                )?,
                from: self.from_date,
                to: self.to_date,
            },
            RuleKind::SingleDate => RulePattern::SingleDate {
                date: self.single_date.ok_or_else(|| missing("single_date"))?,
            },
            RuleKind::DateRange => RulePattern::DateRange {
                from: self.from_date,
                to: self.to_date,
            },
            RuleKind::Monthly => RulePattern::Monthly {
                day_of_month: self.day_of_month.ok_or_else(|| missing("day_of_month"))?,
                from: self.from_date,
                to: self.to_date,
            },
            RuleKind::IntervalDays => RulePattern::IntervalDays {
                anchor: self.from_date,
                every: self.interval_days.ok_or_else(|| missing("interval_days"))?,
                until: self.to_date,
            },
        })
    }
}

/// A busy interval with RFC 3339 instants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyRecord {
    pub resource_id: ResourceId,
    pub start: String,
    pub end: String,
}

impl BusyRecord {
    /// # Errors
    /// Returns [`EngineError::NonUtcInstant`] for an unparseable or offset
    /// instant and [`EngineError::InvalidSpan`] when `end <= start`.
    pub fn to_busy_slot(&self) -> Result<BusySlot> {
        BusySlot::new(
            self.resource_id,
            parse_utc_instant(&self.start)?,
            parse_utc_instant(&self.end)?,
        )
    }
}

/// The resource-selection part of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub required: Vec<ResourceId>,
    #[serde(default)]
    pub or_groups: Vec<Vec<ResourceId>>,
}

impl QueryRecord {
    /// # Errors
    /// Returns [`EngineError::InvalidPeriod`] or [`EngineError::InvalidQuery`].
    pub fn to_query(&self) -> Result<AvailabilityQuery> {
        let period = DatePeriod::new(self.from, self.to)?;
        AvailabilityQuery::new(
            period,
            self.required.iter().copied(),
            self.or_groups.iter().map(|group| group.iter().copied()),
        )
    }
}

/// A complete computation request: query plus every input it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    pub query: QueryRecord,
    #[serde(default)]
    pub rules: Vec<RuleRecord>,
    #[serde(default)]
    pub busy: Vec<BusyRecord>,
    #[serde(default)]
    pub capacities: BTreeMap<ResourceId, u32>,
}

impl AvailabilityRequest {
    /// # Errors
    /// Returns [`EngineError::InvalidRequest`] when `json` does not match the
    /// request schema.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::InvalidRequest(e.to_string()))
    }

    /// Validate every record and build engine values.
    ///
    /// # Errors
    /// The first construction or query error found.
    pub fn to_parts(&self) -> Result<(AvailabilityQuery, EngineInputs)> {
        let query = self.query.to_query()?;

        let mut rules = Vec::new();
        for record in &self.rules {
            rules.extend(record.to_rules()?);
        }
        let busy = self
            .busy
            .iter()
            .map(BusyRecord::to_busy_slot)
            .collect::<Result<Vec<_>>>()?;
        let capacities =
            CapacityMap::from_pairs(self.capacities.iter().map(|(id, cap)| (*id, *cap)))?;

        Ok((
            query,
            EngineInputs {
                rules,
                busy,
                capacities,
            },
        ))
    }
}

/// Parse an RFC 3339 instant that must carry a zero UTC offset.
///
/// A naive datetime (`2025-03-10T09:00:00`) is read as UTC.
///
/// # Errors
/// Returns [`EngineError::NonUtcInstant`] when the string is unparseable or
/// carries a non-zero offset.
pub fn parse_utc_instant(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        if dt.offset().local_minus_utc() != 0 {
            return Err(EngineError::NonUtcInstant(format!(
                "'{}' has offset {}",
                s,
                dt.offset()
            )));
        }
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| EngineError::NonUtcInstant(format!("'{}': {}", s, e)))
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A span rendered for output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanRecord {
    pub start: String,
    pub end: String,
}

impl From<&TimeSpan> for SpanRecord {
    fn from(span: &TimeSpan) -> Self {
        Self {
            start: format_instant(span.start()),
            end: format_instant(span.end()),
        }
    }
}

/// An output slot rendered for JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRecord {
    pub start: String,
    pub end: String,
    pub duration_minutes: i64,
    pub resource_ids: Vec<ResourceId>,
}

impl From<&UtcSlot> for SlotRecord {
    fn from(slot: &UtcSlot) -> Self {
        Self {
            start: format_instant(slot.start()),
            end: format_instant(slot.end()),
            duration_minutes: slot.duration_minutes(),
            resource_ids: slot.resource_ids().iter().copied().collect(),
        }
    }
}

/// A per-resource diagnostic report rendered for JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceReportRecord {
    pub resource_id: ResourceId,
    pub capacity: u32,
    pub include_candidates: usize,
    pub exclude_candidates: usize,
    pub busy_slots: usize,
    pub ruled_open_minutes: i64,
    pub available_minutes: i64,
    pub ruled_open: Vec<SpanRecord>,
    pub available: Vec<SpanRecord>,
}

impl From<&ResourceReport> for ResourceReportRecord {
    fn from(report: &ResourceReport) -> Self {
        Self {
            resource_id: report.resource_id,
            capacity: report.capacity,
            include_candidates: report.include_candidates,
            exclude_candidates: report.exclude_candidates,
            busy_slots: report.busy_slots,
            ruled_open_minutes: report.ruled_open.total_minutes(),
            available_minutes: report.available.total_minutes(),
            ruled_open: report.ruled_open.iter().map(SpanRecord::from).collect(),
            available: report.available.iter().map(SpanRecord::from).collect(),
        }
    }
}
