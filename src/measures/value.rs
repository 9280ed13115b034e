//! Value tier: attribute-content agreement for overlapping pairings.
//!
//! The deepest tier compares what the attributes actually say, with a
//! similarity measure per content family:
//!
//! | bucket    | counted for                         | graded by |
//! |-----------|-------------------------------------|-----------|
//! | `type`    | every test annotation               | type equality per overlap |
//! | `name`    | annotations carrying `name`         | name equality + Levenshtein |
//! | `bbox`    | location annotations                | value equality + polygon IoU |
//! | `tempex`  | tempex annotations                  | value equality + day overlap |
//! | `numeric` | numeric-string `value` attributes   | value equality + absolute offset |
//! | `target`  | target annotations                  | name-list equality + shared elements |
//!
//! Graded similarities live in the `S` slots: the last observed score per
//! query, a [`Stats`] spread at corpus level. Perfect-match counters divide
//! to per-annotation rates once the query is fully scored.

use serde_json::{json, Value};

use crate::annotation::{Annotation, AnnotationType};
use crate::error::Result;
use crate::matching;
use crate::stats::{safe_ratio, Stats};
use crate::{geometry, similarity, temporal};

/// Counter pair for one value bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValueMetrics {
    /// Annotations (or attributes) eligible for this bucket.
    pub total_matching_attributes: usize,
    /// Perfect content matches; a per-annotation rate after finalization.
    pub perfect_value_match: f64,
}

/// Value bucket selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKey {
    /// All-keys-shared pairings across types.
    Global,
    /// Type agreement.
    Type,
    /// `name` attribute agreement.
    Name,
    /// Location geometry agreement.
    Bbox,
    /// Temporal expression agreement.
    Tempex,
    /// Numeric `value` agreement.
    Numeric,
    /// Target collection-list agreement.
    Target,
}

impl ValueKey {
    /// The graded buckets, excluding the `global` roll-up.
    pub const MEASURED: [ValueKey; 6] = [
        ValueKey::Type,
        ValueKey::Name,
        ValueKey::Bbox,
        ValueKey::Tempex,
        ValueKey::Numeric,
        ValueKey::Target,
    ];
}

/// Value metrics for every bucket plus the graded similarity slots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMeasures<S> {
    /// All-keys-shared roll-up.
    pub global: ValueMetrics,
    /// Type bucket.
    pub type_value: ValueMetrics,
    /// Name bucket.
    pub name_value: ValueMetrics,
    /// Bbox bucket.
    pub bbox_value: ValueMetrics,
    /// Tempex bucket.
    pub tempex_value: ValueMetrics,
    /// Numeric bucket.
    pub numeric_value: ValueMetrics,
    /// Target bucket.
    pub target_value: ValueMetrics,
    /// Share of test annotations whose keys all matched some overlapping
    /// gold annotation.
    pub global_ratio_matching_attribute: f64,
    /// Levenshtein distance between lowercased names.
    pub name_levenshtein: S,
    /// Polygon intersect-over-union for location values.
    pub bbox_iou: S,
    /// Day-granularity overlap for tempex ranges.
    pub tempex_duration_overlap: S,
    /// Absolute difference between numeric values.
    pub numeric_value_offset: S,
    /// Shared element count between target name lists.
    pub target_matching_element: S,
}

impl<S> ValueMeasures<S> {
    /// Counter pair for one bucket.
    #[must_use]
    pub fn metrics(&self, key: ValueKey) -> &ValueMetrics {
        match key {
            ValueKey::Global => &self.global,
            ValueKey::Type => &self.type_value,
            ValueKey::Name => &self.name_value,
            ValueKey::Bbox => &self.bbox_value,
            ValueKey::Tempex => &self.tempex_value,
            ValueKey::Numeric => &self.numeric_value,
            ValueKey::Target => &self.target_value,
        }
    }

    fn metrics_mut(&mut self, key: ValueKey) -> &mut ValueMetrics {
        match key {
            ValueKey::Global => &mut self.global,
            ValueKey::Type => &mut self.type_value,
            ValueKey::Name => &mut self.name_value,
            ValueKey::Bbox => &mut self.bbox_value,
            ValueKey::Tempex => &mut self.tempex_value,
            ValueKey::Numeric => &mut self.numeric_value,
            ValueKey::Target => &mut self.target_value,
        }
    }
}

impl ValueMeasures<f64> {
    /// Score value agreement for one query pair.
    ///
    /// Fails only on unparseable temporal content; every other malformed
    /// value degrades to a zero score.
    pub fn measure(gold: &[Annotation], test: &[Annotation]) -> Result<Self> {
        let mut measures = ValueMeasures::default();

        for annotation in test {
            match annotation.kind {
                AnnotationType::Location => {
                    measures.bbox_value.total_matching_attributes += 1;
                }
                AnnotationType::Tempex => {
                    measures.tempex_value.total_matching_attributes += 1;
                }
                AnnotationType::Target => {
                    measures.target_value.total_matching_attributes += 1;
                }
                AnnotationType::Property => {}
            }
            if annotation.name().is_some() {
                measures.name_value.total_matching_attributes += 1;
            }
            if let Some(value) = annotation.value() {
                if value.is_string() && similarity::is_numeric(value) {
                    measures.numeric_value.total_matching_attributes += 1;
                }
            }

            for gold_ann in gold {
                if matching::overlap(&gold_ann.position, &annotation.position).is_none() {
                    continue;
                }
                if annotation.all_keys_shared(gold_ann) {
                    measures.global.total_matching_attributes += 1;
                }
                if gold_ann.kind != annotation.kind {
                    continue;
                }
                measures.type_value.perfect_value_match += 1.0;

                match annotation.kind {
                    AnnotationType::Location => {
                        if let (Some(test_value), Some(gold_value)) =
                            (annotation.value(), gold_ann.value())
                        {
                            if test_value == gold_value {
                                measures.bbox_value.perfect_value_match += 1.0;
                            }
                            measures.bbox_iou =
                                geometry::intersect_over_union(test_value, gold_value);
                        }
                    }
                    AnnotationType::Tempex => {
                        if let (Some(test_value), Some(gold_value)) =
                            (annotation.value(), gold_ann.value())
                        {
                            if test_value == gold_value {
                                measures.tempex_value.perfect_value_match += 1.0;
                            }
                            measures.tempex_duration_overlap =
                                temporal::duration_overlap(test_value, gold_value)? as f64;
                        }
                    }
                    AnnotationType::Target => {
                        if let (Some(test_name), Some(gold_name)) =
                            (annotation.name(), gold_ann.name())
                        {
                            if test_name == gold_name {
                                measures.target_value.perfect_value_match += 1.0;
                            }
                            measures.target_matching_element =
                                similarity::matching_elements(test_name, gold_name) as f64;
                        }
                    }
                    AnnotationType::Property => {}
                }

                // Tempex names are surface text, not normalized labels.
                if annotation.kind != AnnotationType::Tempex {
                    if let (Some(test_name), Some(gold_name)) =
                        (annotation.name(), gold_ann.name())
                    {
                        if similarity::name_matches(test_name, gold_name) {
                            measures.name_value.perfect_value_match += 1.0;
                        }
                        if annotation.kind != AnnotationType::Target {
                            if let (Some(test_str), Some(gold_str)) =
                                (test_name.as_str(), gold_name.as_str())
                            {
                                measures.name_levenshtein = similarity::levenshtein(
                                    &test_str.to_lowercase(),
                                    &gold_str.to_lowercase(),
                                ) as f64;
                            }
                        }
                    }
                }

                if let (Some(test_value), Some(gold_value)) =
                    (annotation.value(), gold_ann.value())
                {
                    if let (Some(test_number), Some(gold_number)) = (
                        similarity::numeric_value(test_value),
                        similarity::numeric_value(gold_value),
                    ) {
                        if test_value == gold_value {
                            measures.numeric_value.perfect_value_match += 1.0;
                        }
                        measures.numeric_value_offset = (test_number - gold_number).abs();
                    }
                }
            }
        }

        // Every annotation carries a type, so the type bucket spans them all.
        measures.type_value.total_matching_attributes = test.len();
        for key in ValueKey::MEASURED {
            let bucket = measures.metrics_mut(key);
            bucket.perfect_value_match =
                safe_ratio(bucket.perfect_value_match, bucket.total_matching_attributes);
        }
        measures.global_ratio_matching_attribute = safe_ratio(
            measures.global.total_matching_attributes as f64,
            test.len(),
        );
        Ok(measures)
    }
}

impl ValueMeasures<Stats> {
    /// Fold per-query value measures into corpus-level rates and spreads.
    ///
    /// Each bucket averages its per-query rate over the queries where the
    /// bucket was populated; similarity spreads sample the same queries.
    #[must_use]
    pub fn fold(per_query: &[ValueMeasures<f64>]) -> Self {
        let mut folded = ValueMeasures::<Stats>::default();

        for key in ValueKey::MEASURED {
            let total: usize = per_query
                .iter()
                .map(|m| m.metrics(key).total_matching_attributes)
                .sum();
            let populated: Vec<&ValueMeasures<f64>> = per_query
                .iter()
                .filter(|m| m.metrics(key).total_matching_attributes > 0)
                .collect();
            let perfect_sum: f64 = populated
                .iter()
                .map(|m| m.metrics(key).perfect_value_match)
                .sum();
            *folded.metrics_mut(key) = ValueMetrics {
                total_matching_attributes: total,
                perfect_value_match: safe_ratio(perfect_sum, populated.len()),
            };
        }

        folded.global.total_matching_attributes = ValueKey::MEASURED
            .iter()
            .map(|&key| folded.metrics(key).total_matching_attributes)
            .sum();
        let queries_with_global = per_query
            .iter()
            .filter(|m| m.global.total_matching_attributes > 0)
            .count();
        folded.global_ratio_matching_attribute = safe_ratio(
            per_query
                .iter()
                .map(|m| m.global_ratio_matching_attribute)
                .sum(),
            queries_with_global,
        );
        let populated_buckets = ValueKey::MEASURED
            .iter()
            .filter(|&&key| folded.metrics(key).total_matching_attributes > 0)
            .count();
        folded.global.perfect_value_match = safe_ratio(
            ValueKey::MEASURED
                .iter()
                .map(|&key| folded.metrics(key).perfect_value_match)
                .sum(),
            populated_buckets,
        );

        let spread = |gate: ValueKey, slot: fn(&ValueMeasures<f64>) -> f64| -> Stats {
            let samples: Vec<f64> = per_query
                .iter()
                .filter(|m| m.metrics(gate).total_matching_attributes > 0)
                .map(slot)
                .collect();
            Stats::from_samples(&samples)
        };
        folded.name_levenshtein = spread(ValueKey::Name, |m| m.name_levenshtein);
        folded.bbox_iou = spread(ValueKey::Bbox, |m| m.bbox_iou);
        folded.tempex_duration_overlap =
            spread(ValueKey::Tempex, |m| m.tempex_duration_overlap);
        folded.numeric_value_offset = spread(ValueKey::Numeric, |m| m.numeric_value_offset);
        folded.target_matching_element =
            spread(ValueKey::Target, |m| m.target_matching_element);
        folded
    }

    /// Serialize as the report's `value_measures` object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "global": {
                "total_matching_attributes": self.global.total_matching_attributes,
                "perfect_value_match": self.global.perfect_value_match,
                "ratio_matching_attributes": self.global_ratio_matching_attribute,
            },
            "type": {
                "total_matching_attributes": self.type_value.total_matching_attributes,
                "perfect_value_match": self.type_value.perfect_value_match,
            },
            "name": {
                "total_matching_attributes": self.name_value.total_matching_attributes,
                "perfect_value_match": self.name_value.perfect_value_match,
                "levenshtein": self.name_levenshtein.to_json(),
            },
            "bbox": {
                "total_matching_attributes": self.bbox_value.total_matching_attributes,
                "perfect_value_match": self.bbox_value.perfect_value_match,
                "intersect_over_union": self.bbox_iou.to_json(),
            },
            "tempex": {
                "total_matching_attributes": self.tempex_value.total_matching_attributes,
                "perfect_value_match": self.tempex_value.perfect_value_match,
                "duration_overlap": self.tempex_duration_overlap.to_json(),
            },
            "numeric": {
                "total_matching_attributes": self.numeric_value.total_matching_attributes,
                "perfect_value_match": self.numeric_value.perfect_value_match,
                "value_offset": self.numeric_value_offset.to_json(),
            },
            "target": {
                "total_matching_attributes": self.target_value.total_matching_attributes,
                "perfect_value_match": self.target_value.perfect_value_match,
                "matching_element": self.target_matching_element.to_json(),
            },
        })
    }
}
