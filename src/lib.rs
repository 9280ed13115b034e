//! # nlq-eval
//!
//! Agreement metrics for natural-language query annotation pipelines.
//!
//! An NL2Query pipeline reads a natural-language data request ("snow depth
//! over the Alps last winter") and emits typed annotations over the query
//! text. This crate scores a pipeline's output (`test`) against a reference
//! annotation of the same queries (`gold`), in four tiers of increasing
//! strictness:
//!
//! | tier      | measures                                              |
//! |-----------|-------------------------------------------------------|
//! | data      | annotation counts, overall and per type               |
//! | span      | exact / overlapping / fragmented span agreement       |
//! | attribute | key-set agreement between paired annotations          |
//! | value     | content agreement (names, geometries, dates, numbers) |
//!
//! ## Quick Start
//!
//! ```rust
//! use nlq_eval::{evaluate_corpus, Corpus};
//!
//! let gold = Corpus::from_json_str(r#"{"queries": [{
//!     "query": "snow depth in the Alps",
//!     "annotations": [{"type": "property", "position": [0, 10], "name": "snow depth"}]
//! }]}"#)?;
//! let test = gold.clone();
//!
//! let report = evaluate_corpus(&gold, &test)?;
//! assert_eq!(report.span.property.perfect_match_type_match, 1.0);
//! println!("{}", serde_json::to_string_pretty(&report.to_json())?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Input format
//!
//! Gold and test files share one JSON shape: a root `queries` array of
//! `{"query", "annotations"}` objects, where each annotation carries a
//! `type` (`property`, `location`, `tempex`, `target`), a `position` span
//! and free-form attributes. See [`Corpus`].
//!
//! Corpora are paired query-by-query on exact query text; evaluation fails
//! fast when the two files do not describe the same query set.

#![warn(missing_docs)]

pub mod annotation;
mod error;
pub mod geometry;
pub mod matching;
pub mod measures;
pub mod similarity;
pub mod stats;
pub mod temporal;

pub use annotation::{Annotation, AnnotationType, Corpus, Query, Span};
pub use error::{Error, Result};
pub use measures::{evaluate_corpus, evaluate_query, EvalMeasures, QueryMeasures};
pub use stats::Stats;
