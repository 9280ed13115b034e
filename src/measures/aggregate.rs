//! Corpus-level report assembly.

use serde_json::{json, Value};

use crate::stats::Stats;

use super::attribute::AttributeMeasures;
use super::data::DataMeasures;
use super::span::SpanMeasures;
use super::value::ValueMeasures;

/// The full corpus-level evaluation report: all four tiers folded over
/// every query pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalMeasures {
    /// Data tier: annotation volume.
    pub data: DataMeasures,
    /// Span tier: positional agreement.
    pub span: SpanMeasures<Stats>,
    /// Attribute tier: key-set agreement.
    pub attribute: AttributeMeasures<Stats>,
    /// Value tier: content agreement.
    pub value: ValueMeasures<Stats>,
}

impl EvalMeasures {
    /// Serialize as the report file's root object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "global_stats": {
                "data_measures": self.data.to_json(),
                "span_measures": self.span.to_json(),
                "attribute_measures": self.attribute.to_json(),
                "value_measures": self.value.to_json(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_root_shape() {
        let report = EvalMeasures::default().to_json();
        let stats = &report["global_stats"];
        assert!(stats["data_measures"]["gold_data"].is_object());
        assert!(stats["span_measures"]["global"]["overlapping_span"]["type_match"]["avg"]
            .is_number());
        assert!(stats["attribute_measures"]["property"]["count"].is_number());
        assert!(stats["value_measures"]["global"]["ratio_matching_attributes"].is_number());
    }
}
