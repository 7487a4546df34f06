//! Best-effort type inference for tool arguments.
//!
//! Tool arguments arrive as arbitrary JSON. Most clients send everything as
//! strings, so a string such as `"42"` or `"yes"` has to be recognised as the
//! number or boolean it denotes before it is written into a script.
//!
//! The inference is pure and total: every input maps to exactly one
//! [`CastValue`].
//!
//! # Known limitation
//!
//! Comma detection is a heuristic, not a parser. Any string containing a comma
//! is turned into a list literal, so prose such as `"Hello, world"` comes out
//! as `{Hello,world}`. The behaviour is kept for compatibility and lives in
//! [`infer_list_literal`]. Parameters that are always prose should be declared
//! as [`ParamKind::Text`](super::ParamKind::Text), which bypasses inference.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::escape::quote;

/// Prefix of an AppleScript date literal.
pub const DATE_MARKER: &str = "date \"";

/// A value after kind inference, ready to be rendered as a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum CastValue {
    /// Absent value, rendered as `missing value`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Number. AppleScript has a single numeric kind for integers and reals.
    Number(f64),
    /// Plain string, rendered quoted and escaped.
    Text(String),
    /// Pre-formed AppleScript syntax (list, record, rectangle, date), rendered
    /// verbatim.
    Literal(String),
}

impl CastValue {
    /// Renders the value as AppleScript source.
    #[must_use]
    pub fn to_script(&self) -> String {
        match self {
            Self::Null => "missing value".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::Text(s) => quote(s),
            Self::Literal(s) => s.clone(),
        }
    }

    /// Returns `true` for `Text("")`.
    #[must_use]
    pub fn is_empty_text(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }

    /// Converts the value back to JSON where a JSON equivalent exists.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => integral(*n).map_or_else(
                || serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
                Value::from,
            ),
            Self::Text(s) | Self::Literal(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for CastValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_script())
    }
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("valid regex"))
}

fn iso_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("valid regex"))
}

/// Returns `true` if `s` is an integer or decimal number.
#[must_use]
pub fn is_numeric(s: &str) -> bool {
    number_re().is_match(s)
}

/// Returns `n` as an integer when it has no fractional part and fits exactly.
#[allow(clippy::cast_possible_truncation)]
fn integral(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15).then_some(n as i64)
}

/// Formats a number the way AppleScript expects it: integral values without a
/// fractional part, everything else in shortest round-trip form.
fn format_number(n: f64) -> String {
    integral(n).map_or_else(|| format!("{n}"), |i| i.to_string())
}

/// Infers the kind of an arbitrary JSON value.
#[must_use]
pub fn cast(raw: &Value) -> CastValue {
    match raw {
        Value::Null => CastValue::Null,
        Value::Bool(b) => CastValue::Bool(*b),
        Value::Number(n) => n.as_f64().map_or(CastValue::Null, CastValue::Number),
        Value::String(s) => cast_str(s),
        Value::Array(items) => CastValue::Literal(list_literal(items)),
        Value::Object(map) => CastValue::Literal(format!("{{{}}}", record_fields(map))),
    }
}

/// Infers the kind of a string argument.
///
/// First match wins: empty, boolean words, number, pre-formed `{...}`
/// literal, comma list, ISO date, quoted string, plain text.
#[must_use]
pub fn cast_str(raw: &str) -> CastValue {
    let s = raw.trim();

    if s.is_empty() {
        return CastValue::Text(String::new());
    }

    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" => return CastValue::Bool(true),
        "false" | "no" => return CastValue::Bool(false),
        _ => {}
    }

    if is_numeric(s) {
        if let Ok(n) = s.parse::<f64>() {
            return CastValue::Number(n);
        }
    }

    if s.starts_with('{') && s.ends_with('}') {
        return CastValue::Literal(s.to_string());
    }

    if let Some(list) = infer_list_literal(s) {
        return CastValue::Literal(list);
    }

    if s.starts_with(DATE_MARKER) {
        return CastValue::Literal(s.to_string());
    }
    if iso_date_re().is_match(s) {
        return CastValue::Literal(format!("{DATE_MARKER}{}\"", s.replace('"', "")));
    }

    if let Some(inner) = strip_matching_quotes(s) {
        return CastValue::Text(inner.to_string());
    }

    CastValue::Text(s.to_string())
}

/// Comma heuristic: turns `"1,2,3,4"` into a rectangle literal and any other
/// comma-separated string into a generic list literal.
///
/// Returns `None` when the input has no comma or is already wrapped in
/// braces. Parts are trimmed and emitted bare.
#[must_use]
pub fn infer_list_literal(s: &str) -> Option<String> {
    if !s.contains(',') || (s.starts_with('{') && s.ends_with('}')) {
        return None;
    }

    let parts: Vec<&str> = s.split(',').map(str::trim).collect();

    if parts.len() == 4 && parts.iter().all(|p| is_numeric(p)) {
        return Some(format!("{{{}}}", parts.join(",")));
    }

    if parts.len() >= 2 {
        return Some(format!("{{{}}}", parts.join(",")));
    }

    None
}

fn strip_matching_quotes(s: &str) -> Option<&str> {
    if s.len() < 2 {
        return None;
    }
    let first = s.chars().next()?;
    if (first == '"' || first == '\'') && s.ends_with(first) {
        return Some(&s[1..s.len() - 1]);
    }
    None
}

/// Renders a JSON array as a list literal, casting every element.
fn list_literal(items: &[Value]) -> String {
    let rendered: Vec<String> = items.iter().map(|v| cast(v).to_script()).collect();
    format!("{{{}}}", rendered.join(", "))
}

/// Renders object entries as `key:value` pairs, skipping undefined and empty
/// values. Keys are emitted bare, so only identifier-shaped keys are kept.
pub(crate) fn record_fields(map: &Map<String, Value>) -> String {
    map.iter()
        .filter(|(key, _)| super::synth::is_identifier(key))
        .filter_map(|(key, value)| {
            let cast = cast(value);
            if matches!(cast, CastValue::Null) || cast.is_empty_text() {
                None
            } else {
                Some(format!("{key}:{}", cast.to_script()))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
