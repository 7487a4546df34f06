//! Script synthesis from command templates.
//!
//! A [`ScriptTemplate`] is an ordered list of fixed text and named parameter
//! slots. [`ScriptTemplate::render`] fills the slots from a tool's JSON
//! arguments, casting each value and choosing the quoting convention for its
//! kind:
//!
//! - strings are escaped and double-quoted
//! - numbers, booleans, lists, records and dates use native syntax, unquoted
//!
//! Optional slots whose argument is absent are left out entirely, including
//! their keyword prefix. A property bag with no defined entries likewise
//! drops its `with properties` clause.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use super::cast::{cast, cast_str, record_fields, CastValue};
use super::escape::quote;

/// Errors raised while filling a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    /// A required argument was not supplied.
    #[error("Missing required parameter: {name}")]
    MissingArgument {
        /// Parameter name.
        name: String,
    },

    /// An argument could not be used as the declared kind.
    #[error("Invalid parameter '{name}': {message}")]
    InvalidArgument {
        /// Parameter name.
        name: String,
        /// Description of what's wrong.
        message: String,
    },
}

impl SynthesisError {
    fn invalid(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

/// How a slot interprets its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Run kind inference on the value.
    Auto,
    /// Always a string literal. Skips inference, so commas and quotes are
    /// kept as written.
    Text,
    /// Must be a number.
    Number,
    /// Must be a boolean (`true`/`false`/`yes`/`no` accepted).
    Boolean,
    /// A bare AppleScript term such as a class or property name.
    Identifier,
    /// A four-number list, `{x1,y1,x2,y2}`.
    Rectangle,
    /// A list of string literals, from a JSON array or a comma-separated
    /// string. Elements are never inferred, so a label such as `Yes` stays
    /// text.
    TextList,
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_ ]*$").expect("valid regex"))
}

/// Returns `true` if `s` can be emitted bare as an AppleScript term.
#[must_use]
pub fn is_identifier(s: &str) -> bool {
    identifier_re().is_match(s) && !s.ends_with(' ')
}

#[derive(Debug, Clone)]
enum Segment {
    Text(String),
    Slot {
        name: String,
        kind: ParamKind,
    },
    Optional {
        prefix: String,
        name: String,
        kind: ParamKind,
    },
    Properties {
        prefix: String,
        name: String,
    },
}

/// A command template: fixed text interleaved with named parameter slots.
#[derive(Debug, Clone, Default)]
pub struct ScriptTemplate {
    segments: Vec<Segment>,
}

impl ScriptTemplate {
    /// Creates an empty template.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Appends fixed text.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.segments.push(Segment::Text(text.into()));
        self
    }

    /// Appends a required slot.
    #[must_use]
    pub fn slot(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.segments.push(Segment::Slot {
            name: name.into(),
            kind,
        });
        self
    }

    /// Appends an optional slot. When the argument is absent, `null` or an
    /// empty string, neither `prefix` nor the value is emitted.
    #[must_use]
    pub fn optional(
        mut self,
        prefix: impl Into<String>,
        name: impl Into<String>,
        kind: ParamKind,
    ) -> Self {
        self.segments.push(Segment::Optional {
            prefix: prefix.into(),
            name: name.into(),
            kind,
        });
        self
    }

    /// Appends a property record built from an object argument. Omitted with
    /// its prefix when the object has no defined, non-empty entries.
    #[must_use]
    pub fn properties(mut self, prefix: impl Into<String>, name: impl Into<String>) -> Self {
        self.segments.push(Segment::Properties {
            prefix: prefix.into(),
            name: name.into(),
        });
        self
    }

    /// Fills the template from `args`.
    ///
    /// # Errors
    ///
    /// Returns an error if a required argument is missing or an argument does
    /// not match its declared kind.
    pub fn render(&self, args: &Map<String, Value>) -> Result<ScriptText, SynthesisError> {
        let mut out = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Slot { name, kind } => {
                    let raw = args
                        .get(name)
                        .filter(|v| !v.is_null())
                        .ok_or_else(|| SynthesisError::MissingArgument { name: name.clone() })?;
                    out.push_str(&render_value(name, raw, *kind)?);
                }
                Segment::Optional { prefix, name, kind } => {
                    if let Some(raw) = args.get(name).filter(|v| is_defined(v)) {
                        out.push_str(prefix);
                        out.push_str(&render_value(name, raw, *kind)?);
                    }
                }
                Segment::Properties { prefix, name } => {
                    let record = match args.get(name) {
                        None | Some(Value::Null) => String::new(),
                        Some(Value::Object(map)) => property_record(map)?,
                        Some(_) => {
                            return Err(SynthesisError::invalid(name, "expected an object"));
                        }
                    };
                    if !record.is_empty() {
                        out.push_str(prefix);
                        out.push_str(&record);
                    }
                }
            }
        }

        Ok(ScriptText(out))
    }
}

fn is_defined(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// Renders one argument according to its declared kind.
///
/// # Errors
///
/// Returns an error if the value does not fit `kind`.
pub fn render_value(name: &str, raw: &Value, kind: ParamKind) -> Result<String, SynthesisError> {
    match kind {
        ParamKind::Auto => Ok(cast(raw).to_script()),
        ParamKind::Text => match raw {
            Value::String(s) => Ok(quote(s)),
            Value::Number(n) => Ok(quote(&n.to_string())),
            Value::Bool(b) => Ok(quote(&b.to_string())),
            _ => Err(SynthesisError::invalid(name, "expected a string")),
        },
        ParamKind::Number => match cast(raw) {
            value @ CastValue::Number(_) => Ok(value.to_script()),
            _ => Err(SynthesisError::invalid(name, "expected a number")),
        },
        ParamKind::Boolean => match cast(raw) {
            value @ CastValue::Bool(_) => Ok(value.to_script()),
            _ => Err(SynthesisError::invalid(name, "expected a boolean")),
        },
        ParamKind::Identifier => match raw.as_str().map(str::trim) {
            Some(s) if is_identifier(s) => Ok(s.to_string()),
            _ => Err(SynthesisError::invalid(
                name,
                "expected a plain term (letters, digits, spaces, underscores)",
            )),
        },
        ParamKind::Rectangle => rectangle(name, raw),
        ParamKind::TextList => text_list(name, raw),
    }
}

fn text_list(name: &str, raw: &Value) -> Result<String, SynthesisError> {
    let items: Vec<String> = match raw {
        Value::Array(items) => items
            .iter()
            .map(|v| render_value(name, v, ParamKind::Text))
            .collect::<Result<_, _>>()?,
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(quote)
            .collect(),
        _ => return Err(SynthesisError::invalid(name, "expected a list of strings")),
    };
    if items.is_empty() {
        return Err(SynthesisError::invalid(name, "expected at least one item"));
    }
    Ok(format!("{{{}}}", items.join(", ")))
}

fn rectangle(name: &str, raw: &Value) -> Result<String, SynthesisError> {
    let numbers: Option<Vec<String>> = match raw {
        Value::Array(items) if items.len() == 4 => items
            .iter()
            .map(|v| match cast(v) {
                value @ CastValue::Number(_) => Some(value.to_script()),
                _ => None,
            })
            .collect(),
        Value::String(s) => match cast_str(s) {
            CastValue::Literal(lit) => {
                let inner = lit.trim_start_matches('{').trim_end_matches('}');
                let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
                (parts.len() == 4 && parts.iter().all(|p| super::cast::is_numeric(p)))
                    .then(|| parts.iter().map(|p| cast_str(p).to_script()).collect())
            }
            _ => None,
        },
        _ => None,
    };

    numbers
        .map(|n| format!("{{{}}}", n.join(", ")))
        .ok_or_else(|| SynthesisError::invalid(name, "expected four numbers, e.g. \"0,0,800,600\""))
}

/// Builds a `{key:value, ...}` record from the defined, non-empty entries of
/// `props`. Returns an empty string when nothing is defined.
///
/// # Errors
///
/// Returns an error if a defined entry's key is not a plain term.
pub fn property_record(props: &Map<String, Value>) -> Result<String, SynthesisError> {
    if let Some(bad) = props
        .iter()
        .find(|(key, value)| is_defined(value) && !is_identifier(key))
    {
        return Err(SynthesisError::invalid(
            bad.0,
            "property names must be plain terms",
        ));
    }

    let fields = record_fields(props);
    if fields.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!("{{{fields}}}"))
    }
}

/// Wraps a script body in a `tell application` block.
#[must_use]
pub fn tell_application(app: &str, body: &ScriptText) -> ScriptText {
    ScriptText(format!(
        "tell application {}\n{}\nend tell",
        quote(app),
        body.as_str()
    ))
}

/// An assembled, ready-to-run script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptText(String);

impl ScriptText {
    /// Wraps raw source without any processing.
    #[must_use]
    pub fn raw(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    /// Returns the script source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the script and returns its source.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ScriptText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn notification() -> ScriptTemplate {
        ScriptTemplate::new()
            .text("display notification ")
            .slot("message", ParamKind::Text)
            .optional(" with title ", "title", ParamKind::Text)
            .optional(" subtitle ", "subtitle", ParamKind::Text)
    }

    #[test]
    fn required_and_optional_slots() {
        let script = notification()
            .render(&args(json!({"message": "Build done", "title": "CI"})))
            .unwrap();
        assert_eq!(
            script.as_str(),
            "display notification \"Build done\" with title \"CI\""
        );
    }

    #[test]
    fn unset_optional_is_omitted() {
        let script = notification()
            .render(&args(json!({"message": "x", "subtitle": null, "title": ""})))
            .unwrap();
        assert!(!script.as_str().contains("with title"));
        assert!(!script.as_str().contains("subtitle"));
    }

    #[test]
    fn missing_required_slot() {
        let err = notification().render(&args(json!({"title": "t"}))).unwrap_err();
        assert_eq!(
            err,
            SynthesisError::MissingArgument {
                name: "message".to_string()
            }
        );
        assert_eq!(err.to_string(), "Missing required parameter: message");
    }

    #[test]
    fn auto_slot_uses_native_syntax() {
        let tpl = ScriptTemplate::new()
            .text("set value to ")
            .slot("value", ParamKind::Auto);
        let render = |v: Value| tpl.render(&args(json!({ "value": v }))).unwrap().into_inner();

        assert_eq!(render(json!("42")), "set value to 42");
        assert_eq!(render(json!("yes")), "set value to true");
        assert_eq!(render(json!("1,2,3,4")), "set value to {1,2,3,4}");
        assert_eq!(render(json!("2024-01-31")), "set value to date \"2024-01-31\"");
        assert_eq!(render(json!("say \"hi\"")), "set value to \"say \\\"hi\\\"\"");
    }

    #[test]
    fn text_list_slot() {
        let tpl = ScriptTemplate::new().slot("b", ParamKind::TextList);
        let render = |v: Value| tpl.render(&args(json!({ "b": v }))).unwrap().into_inner();

        assert_eq!(render(json!(["Yes", "No"])), "{\"Yes\", \"No\"}");
        assert_eq!(render(json!("Yes, 2, ")), "{\"Yes\", \"2\"}");
        assert!(tpl.render(&args(json!({ "b": {"a": 1} }))).is_err());
    }

    #[test]
    fn text_list_without_items_is_rejected() {
        let tpl = ScriptTemplate::new().slot("b", ParamKind::TextList);
        for empty in [json!(","), json!(" , ,"), json!([])] {
            assert!(
                matches!(
                    tpl.render(&args(json!({ "b": empty }))),
                    Err(SynthesisError::InvalidArgument { .. })
                ),
                "input {empty}"
            );
        }
    }

    #[test]
    fn text_slot_skips_heuristics() {
        let tpl = ScriptTemplate::new().slot("v", ParamKind::Text);
        let script = tpl.render(&args(json!({"v": "Hello, world"}))).unwrap();
        assert_eq!(script.as_str(), "\"Hello, world\"");
    }

    #[test]
    fn typed_slots_reject_mismatches() {
        let tpl = ScriptTemplate::new().slot("n", ParamKind::Number);
        assert!(tpl.render(&args(json!({"n": "12"}))).is_ok());
        assert!(matches!(
            tpl.render(&args(json!({"n": "twelve"}))),
            Err(SynthesisError::InvalidArgument { .. })
        ));

        let tpl = ScriptTemplate::new().slot("b", ParamKind::Boolean);
        assert_eq!(tpl.render(&args(json!({"b": "no"}))).unwrap().as_str(), "false");
        assert!(tpl.render(&args(json!({"b": 1}))).is_err());
    }

    #[test]
    fn identifiers_cannot_inject() {
        let tpl = ScriptTemplate::new().text("get ").slot("p", ParamKind::Identifier);
        assert_eq!(
            tpl.render(&args(json!({"p": "file type"}))).unwrap().as_str(),
            "get file type"
        );
        assert!(tpl.render(&args(json!({"p": "name\" & do shell script \"id"}))).is_err());
        assert!(tpl.render(&args(json!({"p": "1st"}))).is_err());
    }

    #[test]
    fn rectangles() {
        let tpl = ScriptTemplate::new().slot("r", ParamKind::Rectangle);
        assert_eq!(
            tpl.render(&args(json!({"r": "0, 22, 800, 600"}))).unwrap().as_str(),
            "{0, 22, 800, 600}"
        );
        assert_eq!(
            tpl.render(&args(json!({"r": [10, 20, 30.5, 40]}))).unwrap().as_str(),
            "{10, 20, 30.5, 40}"
        );
        assert!(tpl.render(&args(json!({"r": "1,2,3"}))).is_err());
        assert!(tpl.render(&args(json!({"r": "a,b,c,d"}))).is_err());
    }

    #[test]
    fn property_bag() {
        let tpl = ScriptTemplate::new()
            .text("make new folder")
            .properties(" with properties ", "properties");

        let script = tpl
            .render(&args(json!({"properties": {"name": "Reports", "comment": "", "label index": 2}})))
            .unwrap();
        assert_eq!(
            script.as_str(),
            "make new folder with properties {label index:2, name:\"Reports\"}"
        );
    }

    #[test]
    fn empty_property_bag_drops_clause() {
        let tpl = ScriptTemplate::new()
            .text("make new folder")
            .properties(" with properties ", "properties");

        for props in [json!({}), json!({"name": "", "comment": null}), Value::Null] {
            let script = tpl.render(&args(json!({ "properties": props }))).unwrap();
            assert_eq!(script.as_str(), "make new folder");
        }
        assert_eq!(tpl.render(&Map::new()).unwrap().as_str(), "make new folder");
    }

    #[test]
    fn empty_record_is_empty_string() {
        assert_eq!(property_record(&Map::new()).unwrap(), "");
    }

    #[test]
    fn property_keys_are_checked() {
        let err = property_record(&args(json!({"name}:x": "v"}))).unwrap_err();
        assert!(matches!(err, SynthesisError::InvalidArgument { .. }));
    }

    #[test]
    fn tell_block() {
        let body = ScriptText::raw("activate");
        assert_eq!(
            tell_application("Fin\"der", &body).as_str(),
            "tell application \"Fin\\\"der\"\nactivate\nend tell"
        );
    }
}
