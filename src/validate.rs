//! Parsing and sanity checks for submitted per-game lines.
//!
//! Every check returns an explicit error naming the field; nothing here touches a model.

use std::collections::HashMap;

use log::debug;

use crate::columns::{
    AGE_RANGE, COUNTING_STATS, FOULS_RANGE, GAMES_RANGE, MINUTES_RANGE, Position,
};
use crate::error::{ForecastError, Result};
use crate::stats::RawStatInput;

/// Minimum-value policy for counting stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationPolicy {
    /// Accept `0` for counting stats. When false every counting stat must be strictly positive.
    pub allow_zero_counts: bool,
}

impl ValidationPolicy {
    pub fn strict() -> Self {
        Self {
            allow_zero_counts: false,
        }
    }

    pub fn lenient() -> Self {
        Self {
            allow_zero_counts: true,
        }
    }

    fn admits(self, value: f64) -> bool {
        if self.allow_zero_counts {
            value >= 0.0
        } else {
            value > 0.0
        }
    }

    fn requirement(self) -> &'static str {
        if self.allow_zero_counts {
            "must not be negative"
        } else {
            "must be greater than zero"
        }
    }
}

/// Parse a text submission and run every check.
///
/// The returned line already has attempted counts repaired up to made counts.
pub fn validate(fields: &HashMap<String, String>, policy: ValidationPolicy) -> Result<RawStatInput> {
    let age = parse_int(fields, "Age")?;
    let pos_code = parse_int(fields, "Pos")?;
    let games = parse_int(fields, "G")?;

    let mut counts = [0.0_f64; COUNTING_STATS.len()];
    for (slot, field) in counts.iter_mut().zip(COUNTING_STATS) {
        *slot = parse_count(fields, field, policy)?;
    }
    let [
        minutes,
        two_made,
        two_attempted,
        three_made,
        three_attempted,
        ft_made,
        ft_attempted,
        off_rebounds,
        def_rebounds,
        assists,
        steals,
        blocks,
        turnovers,
        fouls,
    ] = counts;

    check_int_range("Age", age, AGE_RANGE)?;
    let pos = Position::from_code(pos_code).ok_or_else(|| ForecastError::InvalidValue {
        field: "Pos".to_string(),
        value: pos_code.to_string(),
        reason: "position code must be 1 (PG) to 5 (C)".to_string(),
    })?;
    check_int_range("G", games, GAMES_RANGE)?;

    let raw = RawStatInput {
        age: age as u8,
        pos,
        games: games as u8,
        minutes,
        two_made,
        two_attempted,
        three_made,
        three_attempted,
        ft_made,
        ft_attempted,
        off_rebounds,
        def_rebounds,
        assists,
        steals,
        blocks,
        turnovers,
        fouls,
    };
    check_relations(&raw)?;
    debug!(
        "validated line: age={} pos={} g={} mp={}",
        raw.age, raw.pos, raw.games, raw.minutes
    );
    Ok(raw.with_repaired_attempts())
}

/// Flatten a JSON submission object into the text form [`validate`] takes.
///
/// Strings are kept as written, numbers and booleans use their JSON text, `null` becomes blank
/// (and so reports the field as missing).
pub fn submission_from_json(
    object: serde_json::Map<String, serde_json::Value>,
) -> HashMap<String, String> {
    object
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (key, text)
        })
        .collect()
}

/// Run the same checks on an already typed line (e.g. decoded from JSON).
pub fn validate_record(raw: RawStatInput, policy: ValidationPolicy) -> Result<RawStatInput> {
    for field in COUNTING_STATS {
        let Some(value) = raw.counting_stat(field) else {
            continue;
        };
        check_count(field, value, &value.to_string(), policy)?;
    }
    check_int_range("Age", i64::from(raw.age), AGE_RANGE)?;
    check_int_range("G", i64::from(raw.games), GAMES_RANGE)?;
    check_relations(&raw)?;
    Ok(raw.with_repaired_attempts())
}

fn check_relations(raw: &RawStatInput) -> Result<()> {
    let pairs = [
        ("2P", "2PA", raw.two_made, raw.two_attempted),
        ("3P", "3PA", raw.three_made, raw.three_attempted),
        ("FT", "FTA", raw.ft_made, raw.ft_attempted),
    ];
    for (made, attempted, made_value, attempted_value) in pairs {
        if made_value > attempted_value {
            return Err(ForecastError::RelationalValidation {
                made,
                attempted,
                made_value,
                attempted_value,
            });
        }
    }
    check_float_range("MP", raw.minutes, MINUTES_RANGE)?;
    check_float_range("PF", raw.fouls, FOULS_RANGE)?;
    Ok(())
}

fn field_text<'a>(fields: &'a HashMap<String, String>, field: &str) -> Result<&'a str> {
    match fields.get(field).map(|v| v.trim()) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(ForecastError::MissingField {
            field: field.to_string(),
        }),
    }
}

/// Whole numbers, also when written with a zero fraction (`25.0`, as JSON encoders emit).
fn parse_int(fields: &HashMap<String, String>, field: &str) -> Result<i64> {
    let text = field_text(fields, field)?;
    if let Ok(value) = text.parse::<i64>() {
        return Ok(value);
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 => {
            Ok(value as i64)
        }
        _ => Err(ForecastError::InvalidValue {
            field: field.to_string(),
            value: text.to_string(),
            reason: "expected a whole number".to_string(),
        }),
    }
}

fn parse_count(fields: &HashMap<String, String>, field: &str, policy: ValidationPolicy) -> Result<f64> {
    let text = field_text(fields, field)?;
    let value = text.parse::<f64>().map_err(|_| ForecastError::InvalidValue {
        field: field.to_string(),
        value: text.to_string(),
        reason: "expected a number".to_string(),
    })?;
    check_count(field, value, text, policy)?;
    Ok(value)
}

fn check_count(field: &str, value: f64, text: &str, policy: ValidationPolicy) -> Result<()> {
    if !value.is_finite() {
        return Err(ForecastError::InvalidValue {
            field: field.to_string(),
            value: text.to_string(),
            reason: "expected a finite number".to_string(),
        });
    }
    if !policy.admits(value) {
        return Err(ForecastError::InvalidValue {
            field: field.to_string(),
            value: text.to_string(),
            reason: policy.requirement().to_string(),
        });
    }
    Ok(())
}

fn check_int_range(field: &'static str, value: i64, (min, max): (i64, i64)) -> Result<()> {
    if value < min || value > max {
        return Err(ForecastError::RangeValidation {
            field,
            value: value as f64,
            min: min as f64,
            max: max as f64,
        });
    }
    Ok(())
}

fn check_float_range(field: &'static str, value: f64, (min, max): (f64, f64)) -> Result<()> {
    if value < min || value > max {
        return Err(ForecastError::RangeValidation {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}
