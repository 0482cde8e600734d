//! Open-window construction from resolved rule candidates.
//!
//! For each resource, include candidates are unioned into `Open(R)`, exclude
//! candidates into `Excl(R)`, and the ruled-open set is `Open(R) - Excl(R)`.

use std::collections::BTreeMap;

use crate::interval::SpanSet;
use crate::resolver::{Candidate, Polarity, ResolvedCandidates};
use crate::rule::ResourceId;

/// Ruled-open span sets per resource.
pub type RuledOpen = BTreeMap<ResourceId, SpanSet>;

/// Fold one resource's candidates into its ruled-open set.
///
/// With no include candidates the result is empty, whatever the exclusions.
pub fn ruled_open(candidates: &[Candidate]) -> SpanSet {
    let open = union_of(candidates, Polarity::Include);
    if open.is_empty() {
        return open;
    }
    let excluded = union_of(candidates, Polarity::Exclude);
    open.difference(&excluded)
}

/// Build ruled-open sets for every resource present in `resolved`.
pub fn build_open_windows(resolved: &ResolvedCandidates) -> RuledOpen {
    resolved
        .iter()
        .map(|(resource, candidates)| (*resource, ruled_open(candidates)))
        .collect()
}

fn union_of(candidates: &[Candidate], polarity: Polarity) -> SpanSet {
    candidates
        .iter()
        .filter(|c| c.polarity == polarity)
        .map(|c| c.span)
        .collect()
}
