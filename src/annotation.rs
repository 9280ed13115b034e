//! Annotation corpus data model.
//!
//! A corpus file is `{"queries": [{"query": "<text>", "annotations": [..]}]}`.
//! Each annotation carries a `type` (property, location, tempex, target), a
//! `position` span in the query text, and a set of type-specific attributes
//! (`name`, `value`, `operation`, `matchingType`, ...). The attribute set is
//! kept as an open JSON map: the attribute tier scores agreement over raw key
//! sets, so the model must not normalize or drop unknown keys.
//!
//! Spans are character-offset ranges `[start, end]`. A "split" span is the
//! same semantic entity expressed as a list of disjoint ranges
//! `[[s1, e1], [s2, e2]]`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Result;

/// The four annotation categories emitted by the NL2Query pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    /// A measurable property of the data (e.g. cloud cover, resolution).
    Property,
    /// A geographic constraint with a GeoJSON value.
    Location,
    /// A temporal expression (date point or range).
    Tempex,
    /// The dataset/collection the query targets.
    Target,
}

impl AnnotationType {
    /// All annotation types, in corpus aggregation order.
    pub const ALL: [AnnotationType; 4] = [
        AnnotationType::Property,
        AnnotationType::Location,
        AnnotationType::Tempex,
        AnnotationType::Target,
    ];

    /// Lowercase label as it appears in corpus files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AnnotationType::Property => "property",
            AnnotationType::Location => "location",
            AnnotationType::Tempex => "tempex",
            AnnotationType::Target => "target",
        }
    }
}

/// Character span(s) of an annotation in the query text.
///
/// `len()` reports the raw position-array length: 2 for a well-formed flat
/// span, the sub-range count for a split span. The matcher rejects any span
/// whose raw length is not 2, so a split span is only ever matched through
/// its first two sub-ranges (see [`crate::matching`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Span {
    /// Single `[start, end]` range.
    Flat(Vec<i64>),
    /// Split span: one entity across disjoint ranges.
    Split(Vec<Vec<i64>>),
}

impl Span {
    /// Raw element count of the position array.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Span::Flat(range) => range.len(),
            Span::Split(ranges) => ranges.len(),
        }
    }

    /// True for an empty position array.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of characters covered, summing sub-ranges when split.
    ///
    /// A sub-range's extent is its second element minus its first; anything
    /// shorter contributes 0.
    #[must_use]
    pub fn covered_length(&self) -> i64 {
        fn extent(range: &[i64]) -> i64 {
            match (range.first(), range.get(1)) {
                (Some(first), Some(second)) => second - first,
                _ => 0,
            }
        }
        match self {
            Span::Flat(range) => extent(range),
            Span::Split(ranges) => ranges.iter().map(|r| extent(r)).sum(),
        }
    }
}

/// One annotation: a typed span plus its open attribute map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Annotation category.
    #[serde(rename = "type")]
    pub kind: AnnotationType,
    /// Character span(s) in the query text.
    pub position: Span,
    /// Remaining attributes of the raw annotation object.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Annotation {
    /// The `name` attribute, if present.
    #[must_use]
    pub fn name(&self) -> Option<&Value> {
        self.attributes.get("name")
    }

    /// The `value` attribute, if present.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.attributes.get("value")
    }

    /// Number of keys in the raw annotation object (`type` and `position`
    /// included).
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.attributes.len() + 2
    }

    /// Number of keys shared with `other` (`type` and `position` are present
    /// on both sides by construction).
    #[must_use]
    pub fn shared_key_count(&self, other: &Annotation) -> usize {
        2 + self
            .attributes
            .keys()
            .filter(|key| other.attributes.contains_key(key.as_str()))
            .count()
    }

    /// Whether every key of this annotation also appears in `other`.
    #[must_use]
    pub fn all_keys_shared(&self, other: &Annotation) -> bool {
        self.shared_key_count(other) == self.key_count()
    }

    /// Fraction of this annotation's keys present in `other`.
    #[must_use]
    pub fn attribute_match_ratio(&self, other: &Annotation) -> f64 {
        self.shared_key_count(other) as f64 / self.key_count() as f64
    }
}

/// A natural-language query with its annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Query text; gold/test pairing key (exact string equality).
    pub query: String,
    /// Annotations in pipeline output order. Order matters: span matching
    /// tie-breaks on first occurrence.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// A full annotation corpus: the root object of a gold or test file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    /// All annotated queries.
    pub queries: Vec<Query>,
}

impl Corpus {
    /// Parse a corpus from a JSON string.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Read and parse a corpus file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn annotation(raw: Value) -> Annotation {
        serde_json::from_value(raw).expect("valid annotation")
    }

    #[test]
    fn flat_and_split_spans_deserialize() {
        let flat = annotation(json!({"type": "property", "position": [3, 9]}));
        assert_eq!(flat.position, Span::Flat(vec![3, 9]));
        assert_eq!(flat.position.len(), 2);
        assert_eq!(flat.position.covered_length(), 6);

        let split = annotation(json!({"type": "tempex", "position": [[0, 4], [10, 14]]}));
        assert_eq!(split.position.len(), 2);
        assert_eq!(split.position.covered_length(), 8);
    }

    #[test]
    fn covered_length_reads_the_second_element_only() {
        // Extra trailing elements in a sub-range are ignored, short
        // sub-ranges contribute nothing.
        let padded = annotation(json!({"type": "tempex", "position": [[0, 4, 9], [10, 12]]}));
        assert_eq!(padded.position.covered_length(), 6);
        let short = annotation(json!({"type": "tempex", "position": [[7], [10, 12]]}));
        assert_eq!(short.position.covered_length(), 2);
    }

    #[test]
    fn attribute_keys_count_type_and_position() {
        let ann = annotation(json!({
            "type": "property",
            "position": [0, 5],
            "name": "temperature",
            "value": "10",
            "value_type": "integer",
            "operation": "eq"
        }));
        assert_eq!(ann.key_count(), 6);
        assert!(ann.all_keys_shared(&ann));

        let sparse = annotation(json!({
            "type": "property",
            "position": [0, 5],
            "name": "temperature"
        }));
        // 3 of sparse's keys appear in ann; 4 of ann's 6 appear in sparse.
        assert_eq!(sparse.shared_key_count(&ann), 3);
        assert!(sparse.all_keys_shared(&ann));
        assert!(!ann.all_keys_shared(&sparse));
        assert!((ann.attribute_match_ratio(&sparse) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn corpus_requires_queries_root_key() {
        assert!(Corpus::from_json_str(r#"{"queries": []}"#).is_ok());
        assert!(Corpus::from_json_str(r#"{"q": []}"#).is_err());
    }

    #[test]
    fn missing_annotations_defaults_to_empty() {
        let corpus = Corpus::from_json_str(r#"{"queries": [{"query": "snow depth"}]}"#).unwrap();
        assert!(corpus.queries[0].annotations.is_empty());
    }
}
