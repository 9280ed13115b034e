//! Value similarity helpers for the value tier.
//!
//! String distance, name equality, target name-list overlap and the numeric
//! probe used by the value measures. Everything here is total: malformed or
//! ill-typed values degrade to "no match" / "not numeric", never to an error.

use std::collections::HashSet;

use serde_json::Value;

/// Levenshtein edit distance between two strings.
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Name agreement: case-insensitive equality for string names, raw JSON
/// equality for anything else (target name lists compare element-wise).
#[must_use]
pub fn name_matches(test: &Value, gold: &Value) -> bool {
    match (test, gold) {
        (Value::String(t), Value::String(g)) => t.to_lowercase() == g.to_lowercase(),
        _ => test == gold,
    }
}

/// Number of shared elements between two target name lists.
///
/// Elements are deduplicated before intersecting; non-array values and
/// non-string elements contribute nothing.
#[must_use]
pub fn matching_elements(test: &Value, gold: &Value) -> usize {
    let (Value::Array(test_names), Value::Array(gold_names)) = (test, gold) else {
        return 0;
    };
    let gold_set: HashSet<&str> = gold_names.iter().filter_map(Value::as_str).collect();
    let test_set: HashSet<&str> = test_names.iter().filter_map(Value::as_str).collect();
    test_set.intersection(&gold_set).count()
}

/// Whether a JSON value can be read as a float. A failed parse means "not
/// numeric"; it never propagates.
#[must_use]
pub fn is_numeric(value: &Value) -> bool {
    numeric_value(value).is_some()
}

/// Float reading of a numeric-looking JSON value: numbers directly, strings
/// by parsing, booleans as 0/1.
#[must_use]
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn levenshtein_distance() {
        assert_eq!(levenshtein("sitting", "kitten"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
    }

    #[test]
    fn name_matching_is_case_insensitive_for_strings() {
        assert!(name_matches(&json!("Sentinel-2"), &json!("sentinel-2")));
        assert!(!name_matches(&json!("Sentinel-2"), &json!("Sentinel-1")));
        // List names compare element-wise, case preserved.
        assert!(name_matches(&json!(["a", "b"]), &json!(["a", "b"])));
        assert!(!name_matches(&json!(["a", "B"]), &json!(["a", "b"])));
    }

    #[test]
    fn matching_elements_counts_set_intersection() {
        assert_eq!(
            matching_elements(&json!(["era5", "cmip6", "era5"]), &json!(["cmip6", "cordex"])),
            1
        );
        assert_eq!(matching_elements(&json!(["a"]), &json!([])), 0);
        assert_eq!(matching_elements(&json!("a"), &json!(["a"])), 0);
    }

    #[test]
    fn numeric_probe_never_fails() {
        assert!(is_numeric(&json!("10")));
        assert!(is_numeric(&json!(" 2.5 ")));
        assert!(is_numeric(&json!(42)));
        assert!(is_numeric(&json!(true)));
        assert!(!is_numeric(&json!("ten")));
        assert!(!is_numeric(&json!({"start": "x"})));
        assert!(!is_numeric(&json!(["1"])));
    }

    #[test]
    fn numeric_value_reads_floats() {
        assert_eq!(numeric_value(&json!("1e2")), Some(100.0));
        assert_eq!(numeric_value(&json!(false)), Some(0.0));
        assert_eq!(numeric_value(&json!(null)), None);
    }
}
