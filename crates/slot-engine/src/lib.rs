//! # slot-engine
//!
//! Deterministic multi-resource availability computation.
//!
//! Given calendar rules, busy slots with per-resource capacity, and a query
//! naming required resources plus alternative groups, the engine returns the
//! merged, ordered UTC windows during which the whole combination is free. It
//! is a pure function: no I/O, no clock, no timezone conversion.
//!
//! ## Pipeline
//!
//! - [`resolver`]: rules × date period → tagged candidate spans per resource
//! - [`window`]: include spans minus exclude spans → ruled-open set
//! - [`capacity`]: sweep-line over busy slots against capacity → available set
//! - [`combine`]: AND over required resources, OR within groups → slots
//! - [`engine`]: the [`compute`] entry point tying the stages together
//!
//! ## Supporting modules
//!
//! - [`interval`]: half-open spans and normalized span sets
//! - [`period`]: inclusive date periods
//! - [`rule`]: rule patterns and daily windows
//! - [`record`]: serde wire records for JSON surfaces
//! - [`source`]: collaborator traits (data loading, hierarchy expansion)
//! - [`error`]: Error types

pub mod capacity;
pub mod combine;
pub mod engine;
pub mod error;
pub mod interval;
pub mod period;
pub mod record;
pub mod resolver;
pub mod rule;
pub mod source;
pub mod window;

pub use capacity::{BusySlot, CapacityMap};
pub use combine::{AvailabilityQuery, QueryLimits, UtcSlot};
pub use engine::{
    compute, compute_with_limits, explain, explain_with_limits, filter_min_duration,
    find_first_slot, EngineInputs, ResourceReport,
};
pub use error::EngineError;
pub use interval::{SpanSet, TimeSpan};
pub use period::DatePeriod;
pub use record::{AvailabilityRequest, SlotRecord};
pub use rule::{DailyWindow, ResourceId, Rule, RuleKind, RulePattern, WeekdayMask};
pub use source::{
    compute_from_source, PropertyTreeExpander, ResourceAncestorResolver, RuleAndBusyDataSource,
    TenantId, TraversalMode,
};
