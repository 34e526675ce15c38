//! Scene data produced by the parsers and consumed by the composer.
//!
//! A parsed scene is a flat, ordered list of components. Sections are the
//! only recursive node: their `items` value holds child components in the
//! exact order they were authored, which is the layout order a renderer
//! consumes.

use crate::directive::authored_record;
use crate::error::SdlError;
use crate::schema;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Directive kinds ─────────────────────────────────────────────────────

/// Every directive the language knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveKind {
    Scene,
    Text,
    Image,
    Video,
    Transition,
    Section,
}

impl DirectiveKind {
    pub const ALL: [DirectiveKind; 6] = [
        DirectiveKind::Scene,
        DirectiveKind::Text,
        DirectiveKind::Image,
        DirectiveKind::Video,
        DirectiveKind::Transition,
        DirectiveKind::Section,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DirectiveKind::Scene => "scene",
            DirectiveKind::Text => "text",
            DirectiveKind::Image => "image",
            DirectiveKind::Video => "video",
            DirectiveKind::Transition => "transition",
            DirectiveKind::Section => "section",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Whether the directive may appear as a sibling inside `--items=(...)`.
    pub fn nests_in_section(self) -> bool {
        matches!(
            self,
            DirectiveKind::Text | DirectiveKind::Image | DirectiveKind::Video | DirectiveKind::Section
        )
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Values ──────────────────────────────────────────────────────────────

/// A coerced attribute value.
///
/// An empty JSON array deserializes as `Items`; equality treats an empty
/// `Items` and an empty `List` as the same value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
    Items(Vec<ParsedComponent>),
    List(Vec<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_items(&self) -> Option<&[ParsedComponent]> {
        match self {
            Value::Items(items) => Some(items),
            Value::List(list) if list.is_empty() => Some(&[]),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Items(a), Value::Items(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Items(items), Value::List(list)) | (Value::List(list), Value::Items(items)) => {
                items.is_empty() && list.is_empty()
            }
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Attribute name → value. Keeps schema order for output; equality ignores order.
pub type Record = IndexMap<String, Value>;

// ─── Parsed components ───────────────────────────────────────────────────

/// One parsed directive: `{ type, data }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedComponent {
    #[serde(rename = "type")]
    pub kind: DirectiveKind,
    pub data: Record,
}

impl ParsedComponent {
    pub fn new(kind: DirectiveKind, data: Record) -> Self {
        Self { kind, data }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Child components of a section, in authored order. Empty for leaves.
    pub fn items(&self) -> &[ParsedComponent] {
        self.data
            .get("items")
            .and_then(Value::as_items)
            .unwrap_or_default()
    }
}

// ─── Documents ───────────────────────────────────────────────────────────

/// A problem found while parsing a whole document, tagged with its line.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentError {
    /// The block starting at `line` could not be parsed and was skipped.
    Structural { line: usize, error: SdlError },
    /// The block was parsed; `message` describes a recovered problem.
    Validation { line: usize, message: String },
}

impl DocumentError {
    /// Zero-based line the problem was reported on.
    pub fn line(&self) -> usize {
        match self {
            DocumentError::Structural { line, .. } | DocumentError::Validation { line, .. } => *line,
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, DocumentError::Structural { .. })
    }
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::Structural { line, error } => write!(f, "line {}: {error}", line + 1),
            DocumentError::Validation { line, message } => write!(f, "line {}: {message}", line + 1),
        }
    }
}

/// A fully parsed scene file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneDocument {
    /// Scene-level properties, default-filled when the file has no scene line.
    pub scene: Record,
    /// Components in authored order.
    pub components: Vec<ParsedComponent>,
    #[serde(skip)]
    pub errors: Vec<DocumentError>,
}

impl SceneDocument {
    pub fn has_structural_errors(&self) -> bool {
        self.errors.iter().any(DocumentError::is_structural)
    }

    pub fn components_of(&self, kind: DirectiveKind) -> impl Iterator<Item = &ParsedComponent> {
        self.components.iter().filter(move |c| c.kind == kind)
    }
}

// ─── Composer input ──────────────────────────────────────────────────────

/// Scene-level properties written on the scene directive line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneProps {
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Default for SceneProps {
    fn default() -> Self {
        Self {
            duration: 5.0,
            background: None,
            name: None,
        }
    }
}

/// Component records grouped by kind. At most one transition per scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneComponents {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<Record>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub image: Vec<Record>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub video: Vec<Record>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub section: Vec<Record>,
    /// Zero or one record; the composer writes only the first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transition: Vec<Record>,
}

/// Input to [`crate::emitter::compose`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneConfig {
    pub id: String,
    pub scene_props: SceneProps,
    #[serde(default)]
    pub components: SceneComponents,
}

impl SceneConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            scene_props: SceneProps::default(),
            components: SceneComponents::default(),
        }
    }

    /// Build composer input from a parsed document.
    ///
    /// Component records keep only authored values (see
    /// [`authored_record`]) and scene properties that still hold their
    /// defaults are left as `None`. Only the first transition is kept.
    pub fn from_document(id: impl Into<String>, doc: &SceneDocument) -> Self {
        let mut config = Self::new(id);

        if let Some(duration) = doc.scene.get("duration").and_then(Value::as_number) {
            config.scene_props.duration = duration;
        }
        config.scene_props.background = doc
            .scene
            .get("background")
            .and_then(Value::as_str)
            .filter(|bg| *bg != "transparent")
            .map(str::to_string);
        config.scene_props.name = doc
            .scene
            .get("title")
            .and_then(Value::as_str)
            .filter(|title| !title.is_empty())
            .map(str::to_string);

        let components = &mut config.components;
        for component in &doc.components {
            let data = authored_record(schema::directive(component.kind), &component.data);
            match component.kind {
                DirectiveKind::Text => components.text.push(data),
                DirectiveKind::Image => components.image.push(data),
                DirectiveKind::Video => components.video.push(data),
                DirectiveKind::Section => components.section.push(data),
                DirectiveKind::Transition => {
                    if components.transition.is_empty() {
                        components.transition.push(data);
                    }
                }
                DirectiveKind::Scene => {}
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_names_roundtrip() {
        for kind in DirectiveKind::ALL {
            assert_eq!(DirectiveKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(DirectiveKind::from_name("button"), None);
    }

    #[test]
    fn only_layout_directives_nest() {
        assert!(DirectiveKind::Section.nests_in_section());
        assert!(DirectiveKind::Video.nests_in_section());
        assert!(!DirectiveKind::Scene.nests_in_section());
        assert!(!DirectiveKind::Transition.nests_in_section());
    }

    #[test]
    fn leaf_component_has_no_items() {
        let text = ParsedComponent::new(DirectiveKind::Text, Record::new());
        assert!(text.items().is_empty());
    }

    #[test]
    fn record_equality_ignores_order() {
        let mut a = Record::new();
        a.insert("x".into(), Value::Number(1.0));
        a.insert("y".into(), Value::Bool(true));
        let mut b = Record::new();
        b.insert("y".into(), Value::Bool(true));
        b.insert("x".into(), Value::Number(1.0));
        assert_eq!(a, b);
    }

    #[test]
    fn empty_arrays_compare_equal() {
        let json: Value = serde_json::from_str("[]").unwrap();
        assert!(matches!(json, Value::Items(_)));
        assert_eq!(json, Value::List(Vec::new()));
        assert_ne!(Value::List(vec![Value::Number(1.0)]), Value::Items(Vec::new()));
    }

    #[test]
    fn scene_config_serializes_camel_case() {
        let config = SceneConfig::new("intro");
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["sceneProps"]["duration"], 5.0);
        assert!(json["sceneProps"].get("background").is_none());
    }
}
