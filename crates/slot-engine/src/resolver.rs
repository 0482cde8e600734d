//! Rule expansion over a date period.
//!
//! Walks every date of the period against every rule and emits one tagged
//! candidate span per match, grouped by resource. Nothing is merged here; the
//! [`window`](crate::window) module turns candidates into open windows.

use std::collections::BTreeMap;

use crate::interval::TimeSpan;
use crate::period::DatePeriod;
use crate::rule::{ResourceId, Rule, RuleId};

/// Whether a candidate opens or removes time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    Include,
    Exclude,
}

/// One concrete span contributed by a matching rule on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub rule_id: RuleId,
    pub span: TimeSpan,
    pub polarity: Polarity,
}

/// Candidates per resource, in date order then rule order.
pub type ResolvedCandidates = BTreeMap<ResourceId, Vec<Candidate>>;

/// Expand `rules` over `period` into tagged candidate spans per resource.
///
/// Resources whose rules never match do not appear in the result.
pub fn resolve_rules(rules: &[Rule], period: &DatePeriod) -> ResolvedCandidates {
    let mut resolved = ResolvedCandidates::new();

    for date in period {
        for rule in rules {
            if let Some(span) = rule.candidate_on(date) {
                let polarity = if rule.is_exclude() {
                    Polarity::Exclude
                } else {
                    Polarity::Include
                };
                resolved
                    .entry(rule.resource_id())
                    .or_default()
                    .push(Candidate {
                        rule_id: rule.id(),
                        span,
                        polarity,
                    });
            }
        }
    }

    resolved
}
