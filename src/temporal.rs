//! Temporal value parsing and range comparison.
//!
//! Tempex values are either a literal instant (`2021-04-01T00:00:00Z`), a
//! symbolic token (`#currentdate`, `#currentdate+3m`, `#-infinity`,
//! `#+infinity`), or a range object with `start`/`stop`-style keys whose
//! values are again instants or tokens. Relative offsets are resolved against
//! the wall clock at evaluation time using calendar-ish unit sizes (365 days
//! per year, 31 per month).

use chrono::{Duration, Local, NaiveDateTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

static RELATIVE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#currentdate([+-])([0-9]+)([ymd])").expect("relative date pattern compiles")
});

fn unit_days(unit: &str) -> i64 {
    match unit {
        "y" => 365,
        "m" => 31,
        _ => 1,
    }
}

fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Parse one instant, resolving symbolic tokens.
pub fn parse_instant(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    if let Some(stripped) = raw.strip_prefix('#') {
        let token = format!("#{}", stripped.to_lowercase());
        if token == "#currentdate" {
            return Ok(now());
        }
        if let Some(captures) = RELATIVE_DATE.captures(&token) {
            let quantity: i64 = captures[2]
                .parse()
                .map_err(|_| Error::temporal(format!("bad relative offset in `{raw}`")))?;
            let days = quantity
                .checked_mul(unit_days(&captures[3]))
                .and_then(Duration::try_days)
                .ok_or_else(|| Error::temporal(format!("relative offset overflow in `{raw}`")))?;
            let base = now();
            let shifted = if &captures[1] == "+" {
                base.checked_add_signed(days)
            } else {
                base.checked_sub_signed(days)
            };
            return shifted
                .ok_or_else(|| Error::temporal(format!("relative date out of range: `{raw}`")));
        }
        if token == "#-infinity" {
            return Ok(NaiveDateTime::MIN);
        }
        if token == "#+infinity" {
            return Ok(NaiveDateTime::MAX);
        }
        return Err(Error::temporal(format!("unknown temporal token `{raw}`")));
    }
    NaiveDateTime::parse_from_str(raw, DATE_FORMAT)
        .map_err(|err| Error::temporal(format!("cannot parse instant `{raw}`: {err}")))
}

/// True when the value is a two-key `{"start": .., "end": ..}` object.
fn is_range(value: &Value) -> bool {
    match value.as_object() {
        Some(map) => map.len() == 2 && map.contains_key("start"),
        None => false,
    }
}

fn endpoint(range: &Value, key: &str) -> Result<NaiveDateTime> {
    let raw = range
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::temporal(format!("range is missing endpoint `{key}`")))?;
    parse_instant(raw)
}

fn floor_days(duration: Duration) -> i64 {
    duration.num_seconds().div_euclid(86_400)
}

/// Day-granularity overlap between two tempex values.
///
/// When both values are ranges, this is the length in whole days of the
/// intersection (or, when the ranges are disjoint, a negative gap length).
/// Non-empty overlaps count both end days, hence the `+1`. When either value
/// is not a range, the score is 1 for equal values and 0 otherwise.
pub fn duration_overlap(test: &Value, gold: &Value) -> Result<i64> {
    if is_range(test) && is_range(gold) {
        let test_start = endpoint(test, "start")?;
        let test_end = endpoint(test, "end")?;
        let gold_start = endpoint(gold, "start")?;
        let gold_end = endpoint(gold, "end")?;
        let mut days = floor_days((test_end - gold_start).min(gold_end - test_start));
        if days < 0 {
            days = -days;
        } else if days > 0 {
            days += 1;
        }
        return Ok(days);
    }
    Ok(i64::from(test == gold))
}
