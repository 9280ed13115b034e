//! The four measurement tiers and their corpus-level aggregation.
//!
//! Evaluation runs in two phases. [`evaluate_query`] scores one gold/test
//! query pair through all four tiers; [`evaluate_corpus`] pairs every gold
//! query with its test counterpart by query text, scores each pair, and
//! folds the per-query measures into one [`EvalMeasures`] report.
//!
//! | tier      | question answered                                  |
//! |-----------|-----------------------------------------------------|
//! | data      | did both sides produce the same amount of annotation? |
//! | span      | do the annotations sit on the same text?             |
//! | attribute | do paired annotations carry the same keys?           |
//! | value     | do the attribute contents agree?                     |

pub mod aggregate;
pub mod attribute;
pub mod data;
pub mod span;
pub mod value;

pub use aggregate::EvalMeasures;
pub use attribute::{AttributeMeasures, AttributeMetrics};
pub use data::{DataMeasures, DataMetrics};
pub use span::{SpanMeasures, SpanMetrics};
pub use value::{ValueKey, ValueMeasures, ValueMetrics};

use crate::annotation::{Corpus, Query};
use crate::error::{Error, Result};

/// All four tiers scored for one query pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryMeasures {
    /// Data tier.
    pub data: DataMeasures,
    /// Span tier.
    pub span: SpanMeasures<f64>,
    /// Attribute tier.
    pub attribute: AttributeMeasures<f64>,
    /// Value tier.
    pub value: ValueMeasures<f64>,
}

/// Score one gold/test query pair through all four tiers.
pub fn evaluate_query(gold: &Query, test: &Query) -> Result<QueryMeasures> {
    let gold_anns = &gold.annotations;
    let test_anns = &test.annotations;
    Ok(QueryMeasures {
        data: DataMeasures::measure(gold_anns, test_anns),
        span: SpanMeasures::measure(gold_anns, test_anns),
        attribute: AttributeMeasures::measure(gold_anns, test_anns),
        value: ValueMeasures::measure(gold_anns, test_anns)?,
    })
}

/// Score a whole corpus pair and fold into the corpus-level report.
///
/// Queries are paired by exact query text; the corpora must contain the
/// same number of queries and every gold query text must appear in the
/// test corpus.
pub fn evaluate_corpus(gold: &Corpus, test: &Corpus) -> Result<EvalMeasures> {
    if gold.queries.len() != test.queries.len() {
        return Err(Error::corpus_mismatch(format!(
            "query count differs: {} gold vs {} test",
            gold.queries.len(),
            test.queries.len()
        )));
    }

    let mut per_query = Vec::with_capacity(gold.queries.len());
    for gold_query in &gold.queries {
        let test_query = test
            .queries
            .iter()
            .find(|candidate| candidate.query == gold_query.query)
            .ok_or_else(|| {
                Error::corpus_mismatch(format!(
                    "gold query has no test counterpart: {:?}",
                    gold_query.query
                ))
            })?;
        per_query.push(evaluate_query(gold_query, test_query)?);
    }
    log::info!("evaluated {} query pairs", per_query.len());

    let data: Vec<DataMeasures> = per_query.iter().map(|m| m.data.clone()).collect();
    let span: Vec<SpanMeasures<f64>> = per_query.iter().map(|m| m.span.clone()).collect();
    let attribute: Vec<AttributeMeasures<f64>> =
        per_query.iter().map(|m| m.attribute.clone()).collect();
    let value: Vec<ValueMeasures<f64>> = per_query.iter().map(|m| m.value.clone()).collect();

    Ok(EvalMeasures {
        data: DataMeasures::fold(&data),
        span: SpanMeasures::fold(&span),
        attribute: AttributeMeasures::fold(&attribute),
        value: ValueMeasures::fold(&value),
    })
}
