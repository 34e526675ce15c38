//! Directive parsers: scanned attributes → default-filled record.
//!
//! These are the lenient half of validation. They always produce a complete
//! record, substituting schema defaults for anything missing or unusable,
//! and describe what they recovered from in `errors`. An out-of-set value
//! for an enumerated attribute falls back to the default without an error;
//! [`crate::lint`] is where that gets flagged.

use crate::config::SdlConfig;
use crate::lexer::{RawValue, tokenize};
use crate::model::{DirectiveKind, Record, Value};
use crate::scanner::{AttributeMap, attributes_of};
use crate::schema::{self, Directive, ITEMS_KEY, ValueKind};
use serde::Serialize;

/// A parsed record plus every recovered validation problem, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseResult {
    pub data: Record,
    pub errors: Vec<String>,
}

impl ParseResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

// ─── Per-directive entry points ──────────────────────────────────────────

/// `!text` (or a bare `--key=value` fragment) → text record.
pub fn parse_text(input: &str) -> ParseResult {
    parse_directive(DirectiveKind::Text, input, &SdlConfig::default())
}

pub fn parse_image(input: &str) -> ParseResult {
    parse_directive(DirectiveKind::Image, input, &SdlConfig::default())
}

/// `!video` → video record. Trim points are also converted to frames at `config.fps`.
pub fn parse_video(input: &str, config: &SdlConfig) -> ParseResult {
    parse_directive(DirectiveKind::Video, input, config)
}

pub fn parse_transition(input: &str) -> ParseResult {
    parse_directive(DirectiveKind::Transition, input, &SdlConfig::default())
}

/// `!!scene` → scene properties.
pub fn parse_scene_meta(input: &str) -> ParseResult {
    parse_directive(DirectiveKind::Scene, input, &SdlConfig::default())
}

/// Parse `input` against the schema for `kind`.
///
/// Directive tokens in `input` are ignored, so both `!text --content=Hi`
/// and `--content=Hi` work.
pub fn parse_directive(kind: DirectiveKind, input: &str, config: &SdlConfig) -> ParseResult {
    let tokens = tokenize(input);
    coerce_record(schema::directive(kind), &attributes_of(&tokens), config)
}

// ─── Coercion ────────────────────────────────────────────────────────────

/// A record holding every default for `dir`, including derived frame keys.
pub fn default_record(dir: &Directive, config: &SdlConfig) -> Record {
    let mut data: Record = dir
        .attributes
        .iter()
        .map(|spec| (spec.name.to_string(), spec.default.to_value()))
        .collect();
    apply_frames(dir, &mut data, config);
    data
}

/// The authored form of a parsed record: optional attributes that still hold
/// their default are removed along with their frame keys. Nested section
/// items are reduced the same way.
pub fn authored_record(dir: &Directive, record: &Record) -> Record {
    let mut data = record.clone();
    for spec in dir.attributes {
        if spec.required || data.get(spec.name) != Some(&spec.default.to_value()) {
            continue;
        }
        data.shift_remove(spec.name);
        if let Some(frames_key) = spec.frames {
            data.shift_remove(frames_key);
        }
    }
    if let Some(Value::Items(children)) = data.get_mut(ITEMS_KEY) {
        for child in children {
            child.data = authored_record(schema::directive(child.kind), &child.data);
        }
    }
    data
}

/// Fill a record for `dir` from scanned attributes.
pub fn coerce_record(dir: &Directive, attrs: &AttributeMap, config: &SdlConfig) -> ParseResult {
    let mut data = default_record(dir, config);
    let mut errors = Vec::new();

    for (key, attr) in attrs {
        if dir.kind == DirectiveKind::Section && key == ITEMS_KEY {
            errors.push(format!("Expected a (...) block for {ITEMS_KEY}: {}", attr.value));
            continue;
        }
        let Some(spec) = dir.attribute(key) else {
            errors.push(format!("Unknown attribute: {key}"));
            continue;
        };
        match coerce_value(spec.kind, key, &attr.value) {
            Ok(value) => {
                if let Some(problem) = check_lenient(spec, key, &value) {
                    match problem {
                        Leniency::Fallback => log::debug!(
                            "!{}: `{}` is not an allowed {key}, using `{:?}`",
                            dir.name(),
                            attr.value,
                            spec.default
                        ),
                        Leniency::Error(msg) => errors.push(msg),
                    }
                    continue;
                }
                data.insert(spec.name.to_string(), value);
            }
            Err(msg) => errors.push(msg),
        }
    }

    for spec in dir.required() {
        if !attrs.keys().any(|key| spec.matches(key)) {
            errors.push(format!("Missing required field: {}", spec.name));
        }
    }

    apply_frames(dir, &mut data, config);
    ParseResult { data, errors }
}

/// Convert a raw value to the declared kind.
///
/// Booleans are `true` only for the literal `"true"`; anything else is
/// `false` and never an error.
pub fn coerce_value(kind: ValueKind, key: &str, raw: &RawValue) -> Result<Value, String> {
    match kind {
        ValueKind::Text => Ok(Value::Text(raw.to_string())),
        ValueKind::Boolean => Ok(Value::Bool(matches!(raw, RawValue::Bare(s) | RawValue::Quoted(s) if s == "true"))),
        ValueKind::Number => match raw {
            RawValue::Bare(s) | RawValue::Quoted(s) => parse_number(s)
                .map(Value::Number)
                .ok_or_else(|| format!("Invalid number for {key}: {s}")),
            RawValue::List(_) => Err(format!("Invalid number for {key}: {raw}")),
        },
        ValueKind::List => match raw {
            RawValue::List(items) => items
                .iter()
                .map(|item| {
                    parse_number(item)
                        .map(Value::Number)
                        .ok_or_else(|| format!("Invalid number for {key}: {item}"))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            _ => Err(format!("Expected a [..] list for {key}: {raw}")),
        },
    }
}

/// Finite number, surrounding whitespace ignored. Unsigned `0x`, `0o` and
/// `0b` integer literals are accepted alongside decimals.
pub fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    let radix = match s.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&s[2..], radix).ok().map(|n| n as f64);
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

enum Leniency {
    /// Drop the value silently and keep the default.
    Fallback,
    /// Drop the value and report why.
    Error(String),
}

fn check_lenient(spec: &schema::AttributeSpec, key: &str, value: &Value) -> Option<Leniency> {
    match value {
        Value::Text(s) => spec
            .values
            .filter(|allowed| !allowed.contains(&s.as_str()))
            .map(|_| Leniency::Fallback),
        Value::Number(n) => {
            let below = spec.min.is_some_and(|min| *n < min);
            let above = spec.max.is_some_and(|max| *n > max);
            (below || above).then(|| {
                Leniency::Error(format!(
                    "Value out of range for {key}: {n} (expected {})",
                    spec.range_label()
                ))
            })
        }
        _ => None,
    }
}

/// Write `floor(seconds * fps)` into each declared frame key.
fn apply_frames(dir: &Directive, data: &mut Record, config: &SdlConfig) {
    let fps = config.effective_fps();
    for spec in dir.attributes {
        let Some(frames_key) = spec.frames else {
            continue;
        };
        if let Some(seconds) = data.get(spec.name).and_then(Value::as_number) {
            data.insert(frames_key.to_string(), Value::Number((seconds * fps).floor()));
        }
    }
}
