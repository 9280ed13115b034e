//! Span tier: positional agreement between gold and test annotations.
//!
//! For every test annotation the tier finds either an exact gold span match
//! or the set of gold spans it overlaps, and attributes each outcome to the
//! test annotation's type bucket, split by whether the types agree. It also
//! detects fragmentation in both directions: one test span overlapping
//! several gold spans (`split_test_span`) and one gold span overlapping
//! several non-exact test spans (`split_gold_span`).
//!
//! Per query the overlap slot is a running sum of overlap ratios
//! (intersection length over the test span's covered length). At corpus
//! level that slot becomes a [`Stats`] spread over the per-query sums of
//! queries that saw at least one annotation of the type, and all counters
//! become per-annotation rates.

use serde_json::{json, Value};

use crate::annotation::{Annotation, AnnotationType};
use crate::matching;
use crate::stats::{safe_ratio, Stats};

/// Span agreement counters for one annotation type bucket.
///
/// `O` is the overlap-ratio slot: a running `f64` sum per query, a [`Stats`]
/// spread at corpus level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanMetrics<O> {
    /// Test annotations counted into this bucket.
    pub count: usize,
    /// Exact span matches where the types also agree.
    pub perfect_match_type_match: f64,
    /// Exact span matches with disagreeing types.
    pub perfect_match_no_type_match: f64,
    /// Overlapping spans sharing a start offset, types agreeing.
    pub perfect_begin_type_match: f64,
    /// Overlapping spans sharing a start offset, types disagreeing.
    pub perfect_begin_no_type_match: f64,
    /// Overlapping spans sharing an end offset, types agreeing.
    pub perfect_end_type_match: f64,
    /// Overlapping spans sharing an end offset, types disagreeing.
    pub perfect_end_no_type_match: f64,
    /// Gold spans fragmented across several test spans, all types agreeing.
    pub split_gold_type_match: f64,
    /// Gold spans fragmented across several test spans, some type mismatch.
    pub split_gold_no_type_match: f64,
    /// Test spans overlapping several gold spans, all types agreeing.
    pub split_test_type_match: f64,
    /// Test spans overlapping several gold spans, some type mismatch.
    pub split_test_no_type_match: f64,
    /// Overlap-ratio slot, types agreeing.
    pub overlapping_type_match: O,
    /// Overlap-ratio slot, types disagreeing.
    pub overlapping_no_type_match: O,
}

impl SpanMetrics<Stats> {
    fn to_json(&self) -> Value {
        json!({
            "count": self.count,
            "perfect_match": {
                "no_type_match": self.perfect_match_no_type_match,
                "type_match": self.perfect_match_type_match,
            },
            "perfect_begin": {
                "no_type_match": self.perfect_begin_no_type_match,
                "type_match": self.perfect_begin_type_match,
            },
            "perfect_end": {
                "no_type_match": self.perfect_end_no_type_match,
                "type_match": self.perfect_end_type_match,
            },
            "split_gold_span": {
                "no_type_match": self.split_gold_no_type_match,
                "type_match": self.split_gold_type_match,
            },
            "split_test_span": {
                "no_type_match": self.split_test_no_type_match,
                "type_match": self.split_test_type_match,
            },
            "overlapping_span": {
                "no_type_match": self.overlapping_no_type_match.to_json(),
                "type_match": self.overlapping_type_match.to_json(),
            },
        })
    }
}

/// Span metrics for every type bucket plus the cross-type `global` bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanMeasures<O> {
    /// Cross-type bucket; populated only at corpus level.
    pub global: SpanMetrics<O>,
    /// Property bucket.
    pub property: SpanMetrics<O>,
    /// Location bucket.
    pub location: SpanMetrics<O>,
    /// Tempex bucket.
    pub tempex: SpanMetrics<O>,
    /// Target bucket.
    pub target: SpanMetrics<O>,
}

impl<O> SpanMeasures<O> {
    /// Bucket for one annotation type.
    #[must_use]
    pub fn metrics(&self, kind: AnnotationType) -> &SpanMetrics<O> {
        match kind {
            AnnotationType::Property => &self.property,
            AnnotationType::Location => &self.location,
            AnnotationType::Tempex => &self.tempex,
            AnnotationType::Target => &self.target,
        }
    }

    fn metrics_mut(&mut self, kind: AnnotationType) -> &mut SpanMetrics<O> {
        match kind {
            AnnotationType::Property => &mut self.property,
            AnnotationType::Location => &mut self.location,
            AnnotationType::Tempex => &mut self.tempex,
            AnnotationType::Target => &mut self.target,
        }
    }
}

impl SpanMeasures<f64> {
    /// Score span agreement for one query pair.
    #[must_use]
    pub fn measure(gold: &[Annotation], test: &[Annotation]) -> Self {
        let mut measures = SpanMeasures::default();

        for annotation in test {
            let bucket = measures.metrics_mut(annotation.kind);
            bucket.count += 1;

            // Exact span match against the first gold annotation carrying
            // the same position. Gold order is not assumed aligned to test.
            if let Some(exact) = gold
                .iter()
                .find(|gold_ann| gold_ann.position == annotation.position)
            {
                if exact.kind == annotation.kind {
                    bucket.perfect_match_type_match += 1.0;
                } else {
                    bucket.perfect_match_no_type_match += 1.0;
                }
                continue;
            }

            let mut overlap_count = 0usize;
            let mut type_match_count = 0usize;
            for gold_ann in gold {
                let Some(range) = matching::overlap(&annotation.position, &gold_ann.position)
                else {
                    continue;
                };
                overlap_count += 1;
                let covered = annotation.position.covered_length();
                let ratio = if covered > 0 {
                    range.length() as f64 / covered as f64
                } else {
                    0.0
                };
                if gold_ann.kind == annotation.kind {
                    bucket.overlapping_type_match += ratio;
                    type_match_count += 1;
                } else {
                    bucket.overlapping_no_type_match += ratio;
                }
                if matching::begin_overlap(&annotation.position, &gold_ann.position) {
                    if gold_ann.kind == annotation.kind {
                        bucket.perfect_begin_type_match += 1.0;
                    } else {
                        bucket.perfect_begin_no_type_match += 1.0;
                    }
                }
                if matching::end_overlap(&annotation.position, &gold_ann.position) {
                    if gold_ann.kind == annotation.kind {
                        bucket.perfect_end_type_match += 1.0;
                    } else {
                        bucket.perfect_end_no_type_match += 1.0;
                    }
                }
            }
            if overlap_count > 1 {
                if overlap_count == type_match_count {
                    bucket.split_test_type_match += 1.0;
                } else {
                    bucket.split_test_no_type_match += 1.0;
                }
            }
        }

        // Gold fragmentation: one gold span covered by several test spans
        // that are not themselves exact matches of any gold span.
        for gold_ann in gold {
            let mut split_count = 0usize;
            let mut type_match_count = 0usize;
            for test_ann in test {
                let is_exact = gold
                    .iter()
                    .any(|other| other.position == test_ann.position);
                if is_exact {
                    continue;
                }
                if matching::overlap(&gold_ann.position, &test_ann.position).is_none() {
                    continue;
                }
                split_count += 1;
                // Type comparison goes through the first test annotation
                // carrying this position.
                let first = test
                    .iter()
                    .find(|other| other.position == test_ann.position);
                if first.is_some_and(|other| other.kind == gold_ann.kind) {
                    type_match_count += 1;
                }
            }
            if split_count > 1 {
                let bucket = measures.metrics_mut(gold_ann.kind);
                if split_count == type_match_count {
                    bucket.split_gold_type_match += 1.0;
                } else {
                    bucket.split_gold_no_type_match += 1.0;
                }
            }
        }
        measures
    }
}

impl SpanMeasures<Stats> {
    /// Fold per-query span measures into corpus-level rates and spreads.
    ///
    /// Per-type counters normalize by the type's total annotation count;
    /// the global bucket averages the per-type rates over the types that
    /// were seen at all. Overlap spreads only sample queries where the type
    /// occurred, so an absent type does not drag minima to zero.
    #[must_use]
    pub fn fold(per_query: &[SpanMeasures<f64>]) -> Self {
        let mut folded = SpanMeasures::<Stats>::default();
        let mut all_overlap_type: Vec<f64> = Vec::new();
        let mut all_overlap_no_type: Vec<f64> = Vec::new();

        for kind in AnnotationType::ALL {
            let count: usize = per_query.iter().map(|m| m.metrics(kind).count).sum();
            let rate = |field: fn(&SpanMetrics<f64>) -> f64| -> f64 {
                safe_ratio(per_query.iter().map(|m| field(m.metrics(kind))).sum(), count)
            };
            let samples = |field: fn(&SpanMetrics<f64>) -> f64| -> Vec<f64> {
                per_query
                    .iter()
                    .map(|m| m.metrics(kind))
                    .filter(|metrics| metrics.count > 0)
                    .map(field)
                    .collect()
            };
            let overlap_type = samples(|metrics| metrics.overlapping_type_match);
            let overlap_no_type = samples(|metrics| metrics.overlapping_no_type_match);

            *folded.metrics_mut(kind) = SpanMetrics {
                count,
                perfect_match_type_match: rate(|m| m.perfect_match_type_match),
                perfect_match_no_type_match: rate(|m| m.perfect_match_no_type_match),
                perfect_begin_type_match: rate(|m| m.perfect_begin_type_match),
                perfect_begin_no_type_match: rate(|m| m.perfect_begin_no_type_match),
                perfect_end_type_match: rate(|m| m.perfect_end_type_match),
                perfect_end_no_type_match: rate(|m| m.perfect_end_no_type_match),
                split_gold_type_match: rate(|m| m.split_gold_type_match),
                split_gold_no_type_match: rate(|m| m.split_gold_no_type_match),
                split_test_type_match: rate(|m| m.split_test_type_match),
                split_test_no_type_match: rate(|m| m.split_test_no_type_match),
                overlapping_type_match: Stats::from_samples(&overlap_type),
                overlapping_no_type_match: Stats::from_samples(&overlap_no_type),
            };
            folded.global.count += count;
            all_overlap_type.extend(overlap_type);
            all_overlap_no_type.extend(overlap_no_type);
        }

        let type_count = AnnotationType::ALL
            .iter()
            .filter(|&&kind| folded.metrics(kind).count > 0)
            .count();
        let cross = |field: fn(&SpanMetrics<Stats>) -> f64| -> f64 {
            safe_ratio(
                AnnotationType::ALL
                    .iter()
                    .map(|&kind| field(folded.metrics(kind)))
                    .sum(),
                type_count,
            )
        };
        let perfect_match_type_match = cross(|m| m.perfect_match_type_match);
        let perfect_match_no_type_match = cross(|m| m.perfect_match_no_type_match);
        let perfect_begin_type_match = cross(|m| m.perfect_begin_type_match);
        let perfect_begin_no_type_match = cross(|m| m.perfect_begin_no_type_match);
        let perfect_end_type_match = cross(|m| m.perfect_end_type_match);
        let perfect_end_no_type_match = cross(|m| m.perfect_end_no_type_match);
        let split_gold_type_match = cross(|m| m.split_gold_type_match);
        let split_test_type_match = cross(|m| m.split_test_type_match);
        let split_test_no_type_match = cross(|m| m.split_test_no_type_match);

        folded.global.perfect_match_type_match = perfect_match_type_match;
        folded.global.perfect_match_no_type_match = perfect_match_no_type_match;
        folded.global.perfect_begin_type_match = perfect_begin_type_match;
        folded.global.perfect_begin_no_type_match = perfect_begin_no_type_match;
        folded.global.perfect_end_type_match = perfect_end_type_match;
        folded.global.perfect_end_no_type_match = perfect_end_no_type_match;
        folded.global.split_gold_type_match = split_gold_type_match;
        folded.global.split_test_type_match = split_test_type_match;
        folded.global.split_test_no_type_match = split_test_no_type_match;
        // split_gold_no_type_match has no cross-type rate: a gold-side split
        // is attributed to the gold annotation's bucket, and the mixed-type
        // case is reported per type only.
        folded.global.overlapping_type_match = Stats::from_samples(&all_overlap_type);
        folded.global.overlapping_no_type_match = Stats::from_samples(&all_overlap_no_type);
        folded
    }

    /// Serialize as the report's `span_measures` object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "global": self.global.to_json(),
            "property": self.property.to_json(),
            "location": self.location.to_json(),
            "tempex": self.tempex.to_json(),
            "target": self.target.to_json(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn annotations(raw: Value) -> Vec<Annotation> {
        serde_json::from_value(raw).expect("valid annotations")
    }

    #[test]
    fn exact_match_with_type_agreement() {
        let gold = annotations(json!([{"type": "property", "position": [0, 5]}]));
        let measures = SpanMeasures::measure(&gold, &gold);
        assert_eq!(measures.property.count, 1);
        assert_eq!(measures.property.perfect_match_type_match, 1.0);
        assert_eq!(measures.property.overlapping_type_match, 0.0);
    }

    #[test]
    fn exact_match_with_type_disagreement() {
        let gold = annotations(json!([{"type": "property", "position": [0, 5]}]));
        let test = annotations(json!([{"type": "location", "position": [0, 5]}]));
        let measures = SpanMeasures::measure(&gold, &test);
        // The mismatch lands in the test annotation's bucket.
        assert_eq!(measures.location.perfect_match_no_type_match, 1.0);
        assert_eq!(measures.property.perfect_match_no_type_match, 0.0);
    }

    #[test]
    fn overlap_accumulates_coverage_ratio() {
        let gold = annotations(json!([{"type": "tempex", "position": [0, 10]}]));
        // 4 of the test span's 8 characters fall inside gold.
        let test = annotations(json!([{"type": "tempex", "position": [6, 14]}]));
        let measures = SpanMeasures::measure(&gold, &test);
        assert!((measures.tempex.overlapping_type_match - 0.5).abs() < 1e-9);
        assert_eq!(measures.tempex.perfect_match_type_match, 0.0);
        assert_eq!(measures.tempex.perfect_begin_type_match, 0.0);
        assert_eq!(measures.tempex.perfect_end_type_match, 0.0);
    }

    #[test]
    fn shared_begin_and_end_are_counted_per_overlap() {
        let gold = annotations(json!([{"type": "target", "position": [0, 10]}]));
        let test = annotations(json!([{"type": "target", "position": [0, 6]}]));
        let measures = SpanMeasures::measure(&gold, &test);
        assert_eq!(measures.target.perfect_begin_type_match, 1.0);
        assert_eq!(measures.target.perfect_end_type_match, 0.0);
    }

    #[test]
    fn split_test_span_detection() {
        let gold = annotations(json!([
            {"type": "property", "position": [0, 5]},
            {"type": "property", "position": [8, 14]},
        ]));
        // One test span straddling both gold spans, neither exactly.
        let test = annotations(json!([{"type": "property", "position": [2, 12]}]));
        let measures = SpanMeasures::measure(&gold, &test);
        assert_eq!(measures.property.split_test_type_match, 1.0);
        assert_eq!(measures.property.split_test_no_type_match, 0.0);

        let mixed = annotations(json!([
            {"type": "property", "position": [0, 5]},
            {"type": "location", "position": [8, 14]},
        ]));
        let measures = SpanMeasures::measure(&mixed, &test);
        assert_eq!(measures.property.split_test_no_type_match, 1.0);
    }

    #[test]
    fn split_gold_span_detection() {
        let gold = annotations(json!([{"type": "location", "position": [0, 12]}]));
        let test = annotations(json!([
            {"type": "location", "position": [0, 5]},
            {"type": "location", "position": [6, 12]},
        ]));
        let measures = SpanMeasures::measure(&gold, &test);
        assert_eq!(measures.location.split_gold_type_match, 1.0);

        let mixed = annotations(json!([
            {"type": "location", "position": [0, 5]},
            {"type": "tempex", "position": [6, 12]},
        ]));
        let measures = SpanMeasures::measure(&gold, &mixed);
        assert_eq!(measures.location.split_gold_no_type_match, 1.0);
        assert_eq!(measures.location.split_gold_type_match, 0.0);
    }

    #[test]
    fn exact_test_spans_do_not_count_toward_gold_splits() {
        let gold = annotations(json!([
            {"type": "property", "position": [0, 12]},
            {"type": "property", "position": [0, 5]},
        ]));
        // [0,5] is an exact gold span, so only [6,12] overlaps [0,12] for
        // split purposes: below the threshold of two.
        let test = annotations(json!([
            {"type": "property", "position": [0, 5]},
            {"type": "property", "position": [6, 12]},
        ]));
        let measures = SpanMeasures::measure(&gold, &test);
        assert_eq!(measures.property.split_gold_type_match, 0.0);
        assert_eq!(measures.property.split_gold_no_type_match, 0.0);
    }

    #[test]
    fn fold_normalizes_by_type_count() {
        let gold = annotations(json!([{"type": "property", "position": [0, 5]}]));
        let hit = SpanMeasures::measure(&gold, &gold);
        let miss = SpanMeasures::measure(
            &gold,
            &annotations(json!([{"type": "property", "position": [20, 25]}])),
        );
        let folded = SpanMeasures::fold(&[hit, miss]);
        assert_eq!(folded.property.count, 2);
        assert!((folded.property.perfect_match_type_match - 0.5).abs() < 1e-9);
        // Only property was ever seen, so the global rate equals it.
        assert_eq!(folded.global.count, 2);
        assert!((folded.global.perfect_match_type_match - 0.5).abs() < 1e-9);
    }

    #[test]
    fn fold_overlap_spread_skips_absent_types() {
        let gold = annotations(json!([{"type": "tempex", "position": [0, 10]}]));
        let overlapping = SpanMeasures::measure(
            &gold,
            &annotations(json!([{"type": "tempex", "position": [5, 15]}])),
        );
        let empty = SpanMeasures::measure(&gold, &[]);
        let folded = SpanMeasures::fold(&[overlapping, empty]);
        // The annotation-free query contributes no sample, so min stays at
        // the real observed ratio.
        assert!((folded.tempex.overlapping_type_match.min - 0.5).abs() < 1e-9);
        assert!((folded.tempex.overlapping_type_match.max - 0.5).abs() < 1e-9);
    }

    #[test]
    fn fold_of_nothing_is_all_zero() {
        let folded = SpanMeasures::fold(&[]);
        assert_eq!(folded.global.count, 0);
        assert_eq!(folded.global.perfect_match_type_match, 0.0);
        assert_eq!(folded.property.overlapping_type_match, Stats::default());
    }
}
