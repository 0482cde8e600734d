//! Half-open UTC time spans and normalized span sets.
//!
//! A [`SpanSet`] is always kept sorted by start, with members pairwise disjoint
//! and non-adjacent: two spans that touch (`a.end == b.start`) are stored as one.
//! Every set operation in this module preserves that normal form, so callers can
//! compare sets with `==` and rely on the ordering of [`SpanSet::spans`].

use chrono::{DateTime, Utc};

use crate::error::{EngineError, Result};

/// A half-open interval `[start, end)` of UTC instants with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSpan {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeSpan {
    /// Build a span, rejecting empty or inverted ranges.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidSpan`] when `end <= start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end <= start {
            return Err(EngineError::InvalidSpan(format!(
                "end {} is not after start {}",
                end.to_rfc3339(),
                start.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// Callers guarantee `start < end`.
    pub(crate) fn from_ordered(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start < end, "span must be non-empty");
        Self { start, end }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Whether `instant` lies in `[start, end)`.
    pub fn contains_instant(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Two spans overlap iff `a.start < b.end && b.start < a.end`.
    /// Spans that merely touch do not overlap.
    pub fn overlaps(&self, other: &TimeSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether `other` lies entirely inside this span.
    pub fn covers(&self, other: &TimeSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// A sorted set of disjoint, non-adjacent [`TimeSpan`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SpanSet {
    spans: Vec<TimeSpan>,
}

impl SpanSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(span: TimeSpan) -> Self {
        Self { spans: vec![span] }
    }

    /// Union an arbitrary collection of spans into normal form.
    pub fn from_spans<I>(spans: I) -> Self
    where
        I: IntoIterator<Item = TimeSpan>,
    {
        let mut sorted: Vec<TimeSpan> = spans.into_iter().collect();
        sorted.sort_unstable();

        let mut merged = Vec::with_capacity(sorted.len());
        for span in sorted {
            push_coalesced(&mut merged, span);
        }
        Self { spans: merged }
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn spans(&self) -> &[TimeSpan] {
        &self.spans
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimeSpan> {
        self.spans.iter()
    }

    pub fn total_minutes(&self) -> i64 {
        self.spans.iter().map(TimeSpan::duration_minutes).sum()
    }

    /// Every instant in `self` or `other`.
    pub fn union(&self, other: &SpanSet) -> SpanSet {
        let mut merged = Vec::with_capacity(self.spans.len() + other.spans.len());
        let (mut i, mut j) = (0, 0);
        while i < self.spans.len() || j < other.spans.len() {
            let take_left = match (self.spans.get(i), other.spans.get(j)) {
                (Some(a), Some(b)) => a.start <= b.start,
                (Some(_), None) => true,
                _ => false,
            };
            if take_left {
                push_coalesced(&mut merged, self.spans[i]);
                i += 1;
            } else {
                push_coalesced(&mut merged, other.spans[j]);
                j += 1;
            }
        }
        SpanSet { spans: merged }
    }

    /// Every instant in both `self` and `other`, via a linear merge-sweep.
    pub fn intersect(&self, other: &SpanSet) -> SpanSet {
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.spans.len() && j < other.spans.len() {
            let a = self.spans[i];
            let b = other.spans[j];
            let start = a.start.max(b.start);
            let end = a.end.min(b.end);
            if start < end {
                push_coalesced(&mut out, TimeSpan::from_ordered(start, end));
            }
            // Advance whichever span finishes first; the other may still
            // overlap the next span on the opposite side.
            if a.end <= b.end {
                i += 1;
            } else {
                j += 1;
            }
        }
        SpanSet { spans: out }
    }

    /// Every instant in `self` that is not in `other`.
    ///
    /// A span of `other` strictly inside a span of `self` splits it in two.
    pub fn difference(&self, other: &SpanSet) -> SpanSet {
        let mut out = Vec::new();
        let mut first = 0;
        for span in &self.spans {
            while first < other.spans.len() && other.spans[first].end <= span.start {
                first += 1;
            }

            let mut cursor = span.start;
            for cut in other.spans[first..]
                .iter()
                .take_while(|cut| cut.start < span.end)
            {
                if cut.start > cursor {
                    push_coalesced(&mut out, TimeSpan::from_ordered(cursor, cut.start));
                }
                cursor = cursor.max(cut.end);
                if cursor >= span.end {
                    break;
                }
            }
            if cursor < span.end {
                push_coalesced(&mut out, TimeSpan::from_ordered(cursor, span.end));
            }
        }
        SpanSet { spans: out }
    }

    /// Whether a single member of the set contains all of `span`.
    pub fn covers(&self, span: &TimeSpan) -> bool {
        let idx = self.spans.partition_point(|s| s.start <= span.start);
        idx > 0 && self.spans[idx - 1].end >= span.end
    }

    /// Whether every instant of `self` is also in `other`.
    pub fn is_subset_of(&self, other: &SpanSet) -> bool {
        self.spans.iter().all(|span| other.covers(span))
    }
}

impl FromIterator<TimeSpan> for SpanSet {
    fn from_iter<I: IntoIterator<Item = TimeSpan>>(iter: I) -> Self {
        Self::from_spans(iter)
    }
}

impl<'a> IntoIterator for &'a SpanSet {
    type Item = &'a TimeSpan;
    type IntoIter = std::slice::Iter<'a, TimeSpan>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}

/// Append `span` to a start-sorted run, extending the last member when the two
/// overlap or touch.
fn push_coalesced(run: &mut Vec<TimeSpan>, span: TimeSpan) {
    if let Some(last) = run.last_mut() {
        if span.start <= last.end {
            last.end = last.end.max(span.end);
            return;
        }
    }
    run.push(span);
}
