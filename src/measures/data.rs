//! Data tier: annotation volume counts.
//!
//! The cheapest agreement signal: how many annotations each side produced,
//! overall and per type. Large count gaps between gold and test flag missed
//! or hallucinated annotations before any span arithmetic runs.

use serde_json::{json, Value};

use crate::annotation::{Annotation, AnnotationType};
use crate::stats::Stats;

/// Annotation counts for one side (gold or test) of a query or corpus.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataMetrics {
    /// Total annotations across all types.
    pub total_annotation: usize,
    /// Property annotation count.
    pub property: usize,
    /// Location annotation count.
    pub location: usize,
    /// Tempex annotation count.
    pub tempex: usize,
    /// Target annotation count.
    pub target: usize,
    /// Corpus level only: spread of per-query totals.
    pub annotation_per_query: Stats,
}

impl DataMetrics {
    /// Count for one annotation type.
    #[must_use]
    pub fn count(&self, kind: AnnotationType) -> usize {
        match kind {
            AnnotationType::Property => self.property,
            AnnotationType::Location => self.location,
            AnnotationType::Tempex => self.tempex,
            AnnotationType::Target => self.target,
        }
    }

    fn count_mut(&mut self, kind: AnnotationType) -> &mut usize {
        match kind {
            AnnotationType::Property => &mut self.property,
            AnnotationType::Location => &mut self.location,
            AnnotationType::Tempex => &mut self.tempex,
            AnnotationType::Target => &mut self.target,
        }
    }

    /// Count one side's annotations.
    #[must_use]
    pub fn from_annotations(annotations: &[Annotation]) -> Self {
        let mut metrics = DataMetrics {
            total_annotation: annotations.len(),
            ..DataMetrics::default()
        };
        for annotation in annotations {
            *metrics.count_mut(annotation.kind) += 1;
        }
        metrics
    }

    fn to_json(&self) -> Value {
        json!({
            "total_annotation": self.total_annotation,
            "total_annotation_per_type": {
                "property": self.property,
                "location": self.location,
                "tempex": self.tempex,
                "target": self.target,
            },
            "annotation_per_query": self.annotation_per_query.to_json(),
        })
    }
}

/// Gold and test counts side by side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataMeasures {
    /// Counts over the gold annotations.
    pub gold: DataMetrics,
    /// Counts over the test annotations.
    pub test: DataMetrics,
}

impl DataMeasures {
    /// Count both sides of one query pair.
    #[must_use]
    pub fn measure(gold: &[Annotation], test: &[Annotation]) -> Self {
        DataMeasures {
            gold: DataMetrics::from_annotations(gold),
            test: DataMetrics::from_annotations(test),
        }
    }

    /// Sum per-query counts into corpus totals, with the per-query spread.
    #[must_use]
    pub fn fold(per_query: &[DataMeasures]) -> Self {
        let fold_side = |side: fn(&DataMeasures) -> &DataMetrics| -> DataMetrics {
            let totals: Vec<f64> = per_query
                .iter()
                .map(|measures| side(measures).total_annotation as f64)
                .collect();
            let mut folded = DataMetrics {
                total_annotation: per_query
                    .iter()
                    .map(|measures| side(measures).total_annotation)
                    .sum(),
                annotation_per_query: Stats::from_samples(&totals),
                ..DataMetrics::default()
            };
            for kind in AnnotationType::ALL {
                *folded.count_mut(kind) = per_query
                    .iter()
                    .map(|measures| side(measures).count(kind))
                    .sum();
            }
            folded
        };
        DataMeasures {
            gold: fold_side(|measures| &measures.gold),
            test: fold_side(|measures| &measures.test),
        }
    }

    /// Serialize as the report's `data_measures` object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "gold_data": self.gold.to_json(),
            "test_data": self.test.to_json(),
        })
    }
}
