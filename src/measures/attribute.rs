//! Attribute tier: key-set agreement between paired annotations.
//!
//! Once a test annotation is placed (exactly or by overlap) against a gold
//! annotation, this tier asks whether the two sides describe it with the
//! same attributes: does every key of the test annotation also appear on the
//! gold side? The comparison is over raw key sets only. Value agreement is
//! the value tier's job.
//!
//! `A` is the attribute-match slot: the last observed key-overlap ratio per
//! query, a [`Stats`] spread at corpus level.

use serde_json::{json, Value};

use crate::annotation::{Annotation, AnnotationType};
use crate::matching;
use crate::stats::{safe_ratio, Stats};

/// Attribute agreement counters for one annotation type bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeMetrics<A> {
    /// Test annotations of this type.
    pub count: usize,
    /// Overlapping (non-exact) span pairings where the types also agree.
    pub total_span_type_match: usize,
    /// Share of annotations with every key matched, over exact span matches.
    pub perfect_match_precision: f64,
    /// Share of annotations with every key matched, over overlapping spans.
    pub overlapping_perfect_match: f64,
    /// Key-overlap ratio slot.
    pub attribute_match: A,
}

impl AttributeMetrics<Stats> {
    fn to_json(&self) -> Value {
        json!({
            "count": self.count,
            "total_span_type_match": self.total_span_type_match,
            "per_annotation_span_perfect_match_precision": self.perfect_match_precision,
            "per_annotation_overlapping_span_perfect_match": self.overlapping_perfect_match,
            "per_annotation_attribute_match": self.attribute_match.to_json(),
        })
    }
}

/// Attribute metrics for every type bucket plus the cross-type `global`
/// bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeMeasures<A> {
    /// Cross-type bucket; populated only at corpus level.
    pub global: AttributeMetrics<A>,
    /// Property bucket.
    pub property: AttributeMetrics<A>,
    /// Location bucket.
    pub location: AttributeMetrics<A>,
    /// Tempex bucket.
    pub tempex: AttributeMetrics<A>,
    /// Target bucket.
    pub target: AttributeMetrics<A>,
}

impl<A> AttributeMeasures<A> {
    /// Bucket for one annotation type.
    #[must_use]
    pub fn metrics(&self, kind: AnnotationType) -> &AttributeMetrics<A> {
        match kind {
            AnnotationType::Property => &self.property,
            AnnotationType::Location => &self.location,
            AnnotationType::Tempex => &self.tempex,
            AnnotationType::Target => &self.target,
        }
    }

    fn metrics_mut(&mut self, kind: AnnotationType) -> &mut AttributeMetrics<A> {
        match kind {
            AnnotationType::Property => &mut self.property,
            AnnotationType::Location => &mut self.location,
            AnnotationType::Tempex => &mut self.tempex,
            AnnotationType::Target => &mut self.target,
        }
    }
}

impl AttributeMeasures<f64> {
    /// Score attribute agreement for one query pair.
    #[must_use]
    pub fn measure(gold: &[Annotation], test: &[Annotation]) -> Self {
        let mut measures = AttributeMeasures::default();

        for kind in AnnotationType::ALL {
            measures.metrics_mut(kind).count =
                test.iter().filter(|ann| ann.kind == kind).count();
        }

        for annotation in test {
            let bucket = measures.metrics_mut(annotation.kind);
            if let Some(exact) = gold
                .iter()
                .find(|gold_ann| gold_ann.position == annotation.position)
            {
                if annotation.all_keys_shared(exact) {
                    bucket.perfect_match_precision += 1.0;
                }
                // An exact span pairing is a full attribute match by
                // definition of the slot.
                bucket.attribute_match = 1.0;
                continue;
            }
            for gold_ann in gold {
                if matching::overlap(&gold_ann.position, &annotation.position).is_none() {
                    continue;
                }
                if gold_ann.kind == annotation.kind {
                    bucket.total_span_type_match += 1;
                }
                if annotation.all_keys_shared(gold_ann) {
                    bucket.overlapping_perfect_match += 1.0;
                }
                bucket.attribute_match = annotation.attribute_match_ratio(gold_ann);
            }
        }

        for kind in AnnotationType::ALL {
            let bucket = measures.metrics_mut(kind);
            bucket.perfect_match_precision =
                safe_ratio(bucket.perfect_match_precision, bucket.count);
            bucket.overlapping_perfect_match =
                safe_ratio(bucket.overlapping_perfect_match, bucket.count);
        }
        measures
    }
}

impl AttributeMeasures<Stats> {
    /// Fold per-query attribute measures into corpus-level rates and spreads.
    ///
    /// Per-type precision rates average the per-query rates over the queries
    /// where the type occurred. The global bucket sums raw counts for
    /// `count`, `total_span_type_match` and `overlapping_perfect_match`,
    /// and averages the per-type precision over the types seen at all.
    #[must_use]
    pub fn fold(per_query: &[AttributeMeasures<f64>]) -> Self {
        let mut folded = AttributeMeasures::<Stats>::default();
        let mut all_samples: Vec<f64> = Vec::new();
        let mut type_count = 0usize;
        let mut global_precision = 0.0;

        for kind in AnnotationType::ALL {
            let count: usize = per_query.iter().map(|m| m.metrics(kind).count).sum();
            if count > 0 {
                type_count += 1;
            }
            let total_span_type_match: usize = per_query
                .iter()
                .map(|m| m.metrics(kind).total_span_type_match)
                .sum();
            let precision_sum: f64 = per_query
                .iter()
                .map(|m| m.metrics(kind).perfect_match_precision)
                .sum();
            let overlapping_sum: f64 = per_query
                .iter()
                .map(|m| m.metrics(kind).overlapping_perfect_match)
                .sum();
            let samples: Vec<f64> = per_query
                .iter()
                .map(|m| m.metrics(kind))
                .filter(|metrics| metrics.count > 0)
                .map(|metrics| metrics.attribute_match)
                .collect();
            let queries_with_type = samples.len();

            folded.global.count += count;
            folded.global.total_span_type_match += total_span_type_match;
            // The global roll-up keeps the raw overlapping sum; only the
            // per-type rate is normalized.
            folded.global.overlapping_perfect_match += overlapping_sum;

            let precision = safe_ratio(precision_sum, queries_with_type);
            global_precision += precision;
            all_samples.extend(&samples);

            *folded.metrics_mut(kind) = AttributeMetrics {
                count,
                total_span_type_match,
                perfect_match_precision: precision,
                overlapping_perfect_match: safe_ratio(overlapping_sum, queries_with_type),
                attribute_match: Stats::from_samples(&samples),
            };
        }

        folded.global.perfect_match_precision = safe_ratio(global_precision, type_count);
        folded.global.attribute_match = Stats::from_samples(&all_samples);
        folded
    }

    /// Serialize as the report's `attribute_measures` object.
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
