//! AppleScript value marshalling and script synthesis.
//!
//! Turns JSON tool arguments into AppleScript literals and assembles them into
//! runnable scripts.
//!
//! # Pipeline
//!
//! ```text
//! JSON argument ──▶ cast ──▶ CastValue ──▶ escape/quote ──▶ template slot ──▶ ScriptText
//! ```
//!
//! - [`cast`] infers a kind (number, boolean, list, date, ...) for each value
//! - [`escape`] makes string payloads safe inside `"..."`
//! - [`synth`] fills [`ScriptTemplate`]s and wraps bodies in `tell` blocks

pub mod cast;
pub mod escape;
pub mod synth;

pub use cast::{cast, cast_str, infer_list_literal, CastValue};
pub use escape::{escape, quote};
pub use synth::{
    property_record, tell_application, ParamKind, ScriptTemplate, ScriptText, SynthesisError,
};
