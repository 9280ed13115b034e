//! Span matching primitives.
//!
//! Pure comparisons between two annotation spans: intersection ([`overlap`]),
//! shared start ([`begin_overlap`]) and shared end ([`end_overlap`]). All
//! three treat malformed spans (raw position-array length != 2, empty
//! sub-ranges) as non-matching instead of failing, and all three understand
//! split spans.
//!
//! # Split-span pairing contract
//!
//! When either side of [`overlap`] is split, only the *first* sub-range of
//! the split side is paired against the other side; remaining sub-ranges are
//! ignored. Stored regression baselines were produced under this rule, so
//! widening it to all pairings means re-baselining every report.
//! [`begin_overlap`] and [`end_overlap`] do examine all sub-range pairings.

use crate::annotation::Span;

/// Character range produced by [`overlap`]. Always has positive length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapRange {
    /// Intersection start offset.
    pub start: i64,
    /// Intersection stop offset.
    pub stop: i64,
}

impl OverlapRange {
    /// Number of characters in the intersection.
    #[must_use]
    pub fn length(self) -> i64 {
        self.stop - self.start
    }
}

/// First and last elements of a raw range, if non-empty.
fn bounds(range: &[i64]) -> Option<(i64, i64)> {
    Some((*range.first()?, *range.last()?))
}

fn clip(left: (i64, i64), right: (i64, i64)) -> Option<OverlapRange> {
    let start = left.0.max(right.0);
    let stop = left.1.min(right.1);
    (stop > start).then_some(OverlapRange { start, stop })
}

/// Intersection of two spans, or `None` when they do not overlap or either
/// span is malformed.
///
/// Split sides contribute only their first sub-range (see module docs).
#[must_use]
pub fn overlap(left: &Span, right: &Span) -> Option<OverlapRange> {
    if left.len() != 2 || right.len() != 2 {
        return None;
    }
    match (left, right) {
        (Span::Flat(l), Span::Flat(r)) => clip(bounds(l)?, bounds(r)?),
        (Span::Flat(l), Span::Split(r)) => clip(bounds(l)?, bounds(r.first()?)?),
        (Span::Split(l), Span::Flat(r)) => clip(bounds(l.first()?)?, bounds(r)?),
        (Span::Split(l), Span::Split(r)) => clip(bounds(l.first()?)?, bounds(r.first()?)?),
    }
}

fn starts(span: &Span) -> Vec<i64> {
    match span {
        Span::Flat(range) => range.first().copied().into_iter().collect(),
        Span::Split(ranges) => ranges.iter().filter_map(|r| r.first().copied()).collect(),
    }
}

fn ends(span: &Span) -> Vec<i64> {
    match span {
        Span::Flat(range) => range.last().copied().into_iter().collect(),
        Span::Split(ranges) => ranges.iter().filter_map(|r| r.last().copied()).collect(),
    }
}

/// True when any sub-range start of `right` equals any sub-range start of
/// `left`. Malformed spans never match.
#[must_use]
pub fn begin_overlap(left: &Span, right: &Span) -> bool {
    if left.len() != 2 || right.len() != 2 {
        return false;
    }
    let left_starts = starts(left);
    starts(right).iter().any(|start| left_starts.contains(start))
}

/// True when any sub-range end of `right` equals any sub-range end of
/// `left`. Malformed spans never match.
#[must_use]
pub fn end_overlap(left: &Span, right: &Span) -> bool {
    if left.len() != 2 || right.len() != 2 {
        return false;
    }
    let left_ends = ends(left);
    ends(right).iter().any(|end| left_ends.contains(end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(start: i64, end: i64) -> Span {
        Span::Flat(vec![start, end])
    }

    fn split(ranges: &[(i64, i64)]) -> Span {
        Span::Split(ranges.iter().map(|&(s, e)| vec![s, e]).collect())
    }

    #[test]
    fn flat_overlap_is_intersection() {
        let range = overlap(&flat(0, 10), &flat(0, 5)).unwrap();
        assert_eq!((range.start, range.stop), (0, 5));
        assert_eq!(range.length(), 5);
    }

    #[test]
    fn exact_match_implies_overlap() {
        let span = flat(3, 9);
        let range = overlap(&span, &span).unwrap();
        assert_eq!(range.length(), 6);
    }

    #[test]
    fn disjoint_and_touching_spans_do_not_overlap() {
        assert!(overlap(&flat(0, 5), &flat(6, 10)).is_none());
        // Zero-length intersection is not an overlap.
        assert!(overlap(&flat(0, 5), &flat(5, 10)).is_none());
    }

    #[test]
    fn malformed_spans_never_overlap_or_panic() {
        assert!(overlap(&Span::Flat(vec![]), &Span::Flat(vec![])).is_none());
        assert!(overlap(&Span::Flat(vec![4]), &flat(0, 10)).is_none());
        assert!(overlap(&Span::Flat(vec![0, 5, 9]), &flat(0, 10)).is_none());
        // A split span with three sub-ranges has raw length 3: rejected.
        assert!(overlap(&split(&[(0, 2), (4, 6), (8, 9)]), &flat(0, 10)).is_none());
        assert!(!begin_overlap(&Span::Flat(vec![]), &flat(0, 10)));
        assert!(!end_overlap(&Span::Split(vec![vec![], vec![]]), &flat(0, 10)));
    }

    #[test]
    fn split_overlap_uses_first_sub_range_only() {
        let s = split(&[(0, 3), (20, 25)]);
        // First sub-range intersects.
        assert_eq!(overlap(&flat(1, 10), &s).unwrap().length(), 2);
        // Only the second sub-range would intersect: no overlap reported.
        assert!(overlap(&flat(20, 24), &s).is_none());
        assert!(overlap(&s, &flat(20, 24)).is_none());
    }

    #[test]
    fn split_on_split_pairs_first_sub_ranges() {
        let a = split(&[(0, 5), (30, 35)]);
        let b = split(&[(2, 8), (40, 45)]);
        assert_eq!(overlap(&a, &b).unwrap().length(), 3);
        let c = split(&[(40, 45), (0, 5)]);
        assert!(overlap(&a, &c).is_none());
    }

    #[test]
    fn begin_and_end_examine_all_sub_ranges() {
        let s = split(&[(0, 3), (20, 25)]);
        assert!(begin_overlap(&s, &flat(20, 30)));
        assert!(end_overlap(&s, &flat(10, 25)));
        assert!(!begin_overlap(&s, &flat(1, 3)));
        assert!(!end_overlap(&s, &flat(20, 24)));

        let both = split(&[(5, 9), (20, 25)]);
        assert!(begin_overlap(&s, &split(&[(7, 9), (20, 23)])));
        assert!(end_overlap(&both, &split(&[(1, 9), (30, 31)])));
    }

    #[test]
    fn partial_overlap_begin_without_end() {
        let gold = flat(0, 10);
        let test = flat(0, 5);
        assert!(overlap(&gold, &test).is_some());
        assert!(begin_overlap(&test, &gold));
        assert!(!end_overlap(&test, &gold));
    }
}
