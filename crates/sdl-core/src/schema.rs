//! Static directive table.
//!
//! Every directive, its attributes, their kinds, defaults and constraints
//! live here once. The permissive parsers in [`crate::directive`], the
//! strict checks in [`crate::lint`] and the editor adapters in
//! [`crate::adapter`] all read this table; none of them keep a copy.

use crate::error::SdlError;
use crate::lexer::Prefix;
use crate::model::{DirectiveKind, Value};
use std::collections::HashSet;

// ─── Attribute specs ─────────────────────────────────────────────────────

/// Declared type of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Number,
    Boolean,
    /// `[a, b]` array literal of numbers.
    List,
}

impl ValueKind {
    pub fn label(self) -> &'static str {
        match self {
            ValueKind::Text => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::List => "list",
        }
    }
}

/// Compile-time default value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Text(&'static str),
    Number(f64),
    Bool(bool),
    List(&'static [f64]),
}

impl DefaultValue {
    pub fn to_value(self) -> Value {
        match self {
            DefaultValue::Text(s) => Value::Text(s.to_string()),
            DefaultValue::Number(n) => Value::Number(n),
            DefaultValue::Bool(b) => Value::Bool(b),
            DefaultValue::List(items) => Value::List(items.iter().copied().map(Value::Number).collect()),
        }
    }

    fn kind(self) -> ValueKind {
        match self {
            DefaultValue::Text(_) => ValueKind::Text,
            DefaultValue::Number(_) => ValueKind::Number,
            DefaultValue::Bool(_) => ValueKind::Boolean,
            DefaultValue::List(_) => ValueKind::List,
        }
    }
}

/// One attribute a directive accepts.
#[derive(Debug, Clone, Copy)]
pub struct AttributeSpec {
    pub name: &'static str,
    /// Alternative spellings accepted on input, e.g. `animate` for `animation`.
    pub aliases: &'static [&'static str],
    pub kind: ValueKind,
    pub required: bool,
    /// Flagged as missing by editor diagnostics only; parsers fill the default silently.
    pub editor_required: bool,
    /// Allowed values for enumerated strings.
    pub values: Option<&'static [&'static str]>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub default: DefaultValue,
    /// For numbers given in seconds: record key that receives `floor(seconds * fps)`.
    pub frames: Option<&'static str>,
    pub doc: &'static str,
}

impl AttributeSpec {
    pub const fn text(name: &'static str, default: &'static str, doc: &'static str) -> Self {
        Self::new(name, ValueKind::Text, DefaultValue::Text(default), doc)
    }

    pub const fn number(name: &'static str, default: f64, doc: &'static str) -> Self {
        Self::new(name, ValueKind::Number, DefaultValue::Number(default), doc)
    }

    pub const fn boolean(name: &'static str, default: bool, doc: &'static str) -> Self {
        Self::new(name, ValueKind::Boolean, DefaultValue::Bool(default), doc)
    }

    pub const fn list(name: &'static str, default: &'static [f64], doc: &'static str) -> Self {
        Self::new(name, ValueKind::List, DefaultValue::List(default), doc)
    }

    const fn new(name: &'static str, kind: ValueKind, default: DefaultValue, doc: &'static str) -> Self {
        Self {
            name,
            aliases: &[],
            kind,
            required: false,
            editor_required: false,
            values: None,
            min: None,
            max: None,
            default,
            frames: None,
            doc,
        }
    }

    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    pub const fn required_in_editor(self) -> Self {
        Self {
            editor_required: true,
            ..self
        }
    }

    pub const fn one_of(self, values: &'static [&'static str]) -> Self {
        Self {
            values: Some(values),
            ..self
        }
    }

    pub const fn range(self, min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            ..self
        }
    }

    pub const fn at_least(self, min: f64) -> Self {
        Self {
            min: Some(min),
            ..self
        }
    }

    pub const fn alias(self, aliases: &'static [&'static str]) -> Self {
        Self { aliases, ..self }
    }

    pub const fn frames(self, key: &'static str) -> Self {
        Self {
            frames: Some(key),
            ..self
        }
    }

    /// Whether `key` names this attribute, directly or through an alias.
    pub fn matches(&self, key: &str) -> bool {
        self.name == key || self.aliases.contains(&key)
    }

    /// `min..max` for messages; open ends print as `…`.
    pub fn range_label(&self) -> String {
        let fmt = |bound: Option<f64>| bound.map_or_else(|| "…".to_string(), |n| n.to_string());
        format!("{}..{}", fmt(self.min), fmt(self.max))
    }
}

// ─── Directives ──────────────────────────────────────────────────────────

/// A directive's full declaration.
#[derive(Debug)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub prefix: Prefix,
    pub doc: &'static str,
    pub attributes: &'static [AttributeSpec],
    /// Example lines shown in hover and completion docs.
    pub examples: &'static [&'static str],
}

impl Directive {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Resolve a key (or alias) to its spec.
    pub fn attribute(&self, key: &str) -> Option<&'static AttributeSpec> {
        self.attributes.iter().find(|spec| spec.matches(key))
    }

    pub fn required(&self) -> impl Iterator<Item = &'static AttributeSpec> {
        self.attributes.iter().filter(|spec| spec.required)
    }

    /// Attributes editor diagnostics expect on every line: the required ones
    /// plus those marked [`AttributeSpec::required_in_editor`].
    pub fn editor_required(&self) -> impl Iterator<Item = &'static AttributeSpec> {
        self.attributes.iter().filter(|spec| spec.required || spec.editor_required)
    }
}

/// Key that holds a section's nested block. Not an ordinary attribute.
pub const ITEMS_KEY: &str = "items";

const TEXT_ANIMATIONS: &[&str] = &[
    "fadeIn", "fadeOut", "slideUp", "slideDown", "slideLeft", "slideRight", "typewriter", "scale", "none",
];
const MEDIA_ANIMATIONS: &[&str] = &["slide-up", "slide-down", "fade-in", "zoom-in", "none"];
const FIT_MODES: &[&str] = &["cover", "contain", "fill"];

static SCENE_ATTRS: &[AttributeSpec] = &[
    AttributeSpec::number("duration", 5.0, "Scene length in seconds.").range(0.1, 600.0),
    AttributeSpec::text("background", "transparent", "Background color or gradient."),
    AttributeSpec::text("title", "", "Scene title shown in the timeline.").alias(&["name"]),
];

static TEXT_ATTRS: &[AttributeSpec] = &[
    AttributeSpec::text("content", "", "Text to display.").required(),
    AttributeSpec::text("animation", "fadeIn", "Entrance animation.")
        .alias(&["animate"])
        .one_of(TEXT_ANIMATIONS),
    AttributeSpec::number("duration", 1.0, "Animation duration in seconds.").range(0.0, 60.0),
    AttributeSpec::number("delay", 0.0, "Delay before the animation starts, in seconds.").range(0.0, 60.0),
    AttributeSpec::number("fontSize", 60.0, "Font size in pixels.")
        .alias(&["size"])
        .range(8.0, 400.0)
        .required_in_editor(),
    AttributeSpec::text("fontWeight", "normal", "Font weight.").one_of(&["light", "normal", "bold"]),
    AttributeSpec::text("color", "white", "Text color."),
    AttributeSpec::text("position", "center", "Vertical placement.").one_of(&["top", "center", "bottom"]),
    AttributeSpec::text("align", "center", "Horizontal alignment.").one_of(&["left", "center", "right"]),
];

static IMAGE_ATTRS: &[AttributeSpec] = &[
    AttributeSpec::text("src", "", "Image URL or path.").required(),
    AttributeSpec::text("alt", "", "Alternative text."),
    AttributeSpec::text("animation", "slide-up", "Entrance animation.")
        .alias(&["animate"])
        .one_of(MEDIA_ANIMATIONS),
    AttributeSpec::number("duration", 1.0, "Animation duration in seconds.").range(0.0, 60.0),
    AttributeSpec::number("delay", 0.0, "Delay before the animation starts, in seconds.").range(0.0, 60.0),
    AttributeSpec::text("fit", "contain", "How the image fills its box.").one_of(FIT_MODES),
    AttributeSpec::number("scale", 1.0, "Scale factor.").range(0.1, 10.0),
    AttributeSpec::boolean("rounded", false, "Round the image corners."),
];

static VIDEO_ATTRS: &[AttributeSpec] = &[
    AttributeSpec::text("src", "", "Video URL or path.").required(),
    AttributeSpec::number("volume", 1.0, "Playback volume.").range(0.0, 1.0),
    AttributeSpec::boolean("muted", false, "Mute the audio track."),
    AttributeSpec::boolean("loop", false, "Loop playback."),
    AttributeSpec::number("startFrom", 0.0, "Trim start, in seconds.")
        .at_least(0.0)
        .frames("startFromFrames"),
    AttributeSpec::number("endAt", 0.0, "Trim end, in seconds (0 plays to the end).")
        .at_least(0.0)
        .frames("endAtFrames"),
    AttributeSpec::number("playbackRate", 1.0, "Playback speed multiplier.").range(0.25, 4.0),
    AttributeSpec::text("fit", "cover", "How the video fills its box.").one_of(FIT_MODES),
    AttributeSpec::text("animation", "fade-in", "Entrance animation.")
        .alias(&["animate"])
        .one_of(&["fade-in", "zoom-in", "none"]),
];

static TRANSITION_ATTRS: &[AttributeSpec] = &[
    AttributeSpec::text("type", "fade", "Transition effect.").one_of(&["fade", "slide", "wipe", "zoom", "flip", "none"]),
    AttributeSpec::number("duration", 0.5, "Transition length in seconds.").range(0.1, 5.0),
    AttributeSpec::text("direction", "left", "Direction for slide and wipe.").one_of(&["left", "right", "up", "down"]),
    AttributeSpec::text("easing", "ease-in-out", "Timing curve.")
        .one_of(&["linear", "ease-in", "ease-out", "ease-in-out", "spring"]),
];

static SECTION_ATTRS: &[AttributeSpec] = &[
    AttributeSpec::text("direction", "row", "Main axis for children.").one_of(&["row", "column"]),
    AttributeSpec::number("gap", 0.0, "Space between children, in pixels.").at_least(0.0),
    AttributeSpec::number("cols", 1.0, "Grid columns.").range(1.0, 12.0),
    AttributeSpec::number("rows", 1.0, "Grid rows.").range(1.0, 12.0),
    AttributeSpec::number("padding", 0.0, "Inner padding, in pixels.").at_least(0.0),
    AttributeSpec::text("align", "stretch", "Cross-axis alignment.").one_of(&["start", "center", "end", "stretch"]),
    AttributeSpec::list("ratios", &[], "Relative child sizes, e.g. `[1,2,1]`."),
];

/// The directive table, one entry per [`DirectiveKind`].
pub static DIRECTIVES: &[Directive] = &[
    Directive {
        kind: DirectiveKind::Scene,
        prefix: Prefix::Scene,
        doc: "Scene-level settings. One per file, on the first directive line.",
        attributes: SCENE_ATTRS,
        examples: &["# !!scene --duration=5 --background=black --title=\"Intro\""],
    },
    Directive {
        kind: DirectiveKind::Text,
        prefix: Prefix::Inline,
        doc: "Animated text block.",
        attributes: TEXT_ATTRS,
        examples: &["!text --content=\"Hello\" --animation=fadeIn --size=72"],
    },
    Directive {
        kind: DirectiveKind::Image,
        prefix: Prefix::Inline,
        doc: "Still image.",
        attributes: IMAGE_ATTRS,
        examples: &["!image --src=\"logo.png\" --animation=zoom-in"],
    },
    Directive {
        kind: DirectiveKind::Video,
        prefix: Prefix::Inline,
        doc: "Video clip, trimmed in seconds.",
        attributes: VIDEO_ATTRS,
        examples: &["!video --src=\"clip.mp4\" --startFrom=2 --endAt=6 --muted=true"],
    },
    Directive {
        kind: DirectiveKind::Transition,
        prefix: Prefix::Inline,
        doc: "Transition into the next scene. At most one per scene.",
        attributes: TRANSITION_ATTRS,
        examples: &["!transition --type=slide --direction=left --duration=0.8"],
    },
    Directive {
        kind: DirectiveKind::Section,
        prefix: Prefix::Inline,
        doc: "Layout container. Children go in `--items=(...)`.",
        attributes: SECTION_ATTRS,
        examples: &["!section --cols=2 --gap=16 --items=(!text --content=A, !image --src=\"b.png\")"],
    },
];

/// Declaration for `kind`.
pub fn directive(kind: DirectiveKind) -> &'static Directive {
    let idx = DirectiveKind::ALL
        .iter()
        .position(|k| *k == kind)
        .unwrap_or_default();
    &DIRECTIVES[idx]
}

/// Declaration for a directive name, if the table has one.
pub fn lookup(name: &str) -> Option<&'static Directive> {
    DirectiveKind::from_name(name).map(directive)
}

// ─── Load-time validation ────────────────────────────────────────────────

/// Check the table for internal consistency.
///
/// Catches a misdeclared directive at startup instead of on the first
/// keystroke that hits it.
pub fn validate_registry() -> Result<(), SdlError> {
    for (idx, kind) in DirectiveKind::ALL.into_iter().enumerate() {
        let dir = DIRECTIVES.get(idx).ok_or(SdlError::Schema {
            directive: kind.name(),
            attribute: "*",
            reason: "directive has no table entry".into(),
        })?;
        if dir.kind != kind {
            return Err(SdlError::Schema {
                directive: kind.name(),
                attribute: "*",
                reason: format!("table entry {idx} declares `{}`", dir.kind),
            });
        }
        validate_attributes(dir)?;
    }
    Ok(())
}

fn validate_attributes(dir: &Directive) -> Result<(), SdlError> {
    let mut seen = HashSet::new();
    let fail = |spec: &AttributeSpec, reason: String| SdlError::Schema {
        directive: dir.name(),
        attribute: spec.name,
        reason,
    };

    for spec in dir.attributes {
        if spec.name == ITEMS_KEY {
            return Err(fail(spec, format!("`{ITEMS_KEY}` is reserved for nested blocks")));
        }
        for key in std::iter::once(&spec.name).chain(spec.aliases) {
            if !seen.insert(*key) {
                return Err(fail(spec, format!("`{key}` is declared twice")));
            }
        }
        if spec.default.kind() != spec.kind {
            return Err(fail(
                spec,
                format!("default is a {}, attribute is a {}", spec.default.kind().label(), spec.kind.label()),
            ));
        }
        if (spec.min.is_some() || spec.max.is_some() || spec.frames.is_some()) && spec.kind != ValueKind::Number {
            return Err(fail(spec, "ranges and frame keys need a number attribute".into()));
        }
        if let DefaultValue::Number(n) = spec.default
            && (spec.min.is_some_and(|min| n < min) || spec.max.is_some_and(|max| n > max))
        {
            return Err(fail(spec, format!("default {n} is outside {}", spec.range_label())));
        }
        if let (Some(values), DefaultValue::Text(default)) = (spec.values, spec.default)
            && !values.contains(&default)
        {
            return Err(fail(spec, format!("default `{default}` is not an allowed value")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_is_valid() {
        assert_eq!(validate_registry(), Ok(()));
    }

    #[test]
    fn every_kind_resolves_to_itself() {
        for kind in DirectiveKind::ALL {
            assert_eq!(directive(kind).kind, kind);
        }
    }

    #[test]
    fn aliases_resolve() {
        let text = directive(DirectiveKind::Text);
        assert_eq!(text.attribute("animate").map(|s| s.name), Some("animation"));
        assert_eq!(text.attribute("size").map(|s| s.name), Some("fontSize"));
        assert!(text.attribute("src").is_none());
    }

    #[test]
    fn required_fields() {
        let names: Vec<_> = directive(DirectiveKind::Image).required().map(|s| s.name).collect();
        assert_eq!(names, vec!["src"]);
        assert_eq!(directive(DirectiveKind::Scene).required().count(), 0);
    }

    #[test]
    fn scene_prefix_is_double_bang() {
        assert_eq!(lookup("scene").map(|d| d.prefix), Some(Prefix::Scene));
        assert!(lookup("button").is_none());
    }

    #[test]
    fn rejects_out_of_range_default() {
        static BAD: &[AttributeSpec] = &[AttributeSpec::number("gap", -1.0, "").at_least(0.0)];
        let dir = Directive {
            kind: DirectiveKind::Section,
            prefix: Prefix::Inline,
            doc: "",
            attributes: BAD,
            examples: &[],
        };
        assert!(matches!(validate_attributes(&dir), Err(SdlError::Schema { attribute: "gap", .. })));
    }

    #[test]
    fn range_label_formats_open_ends() {
        let spec = AttributeSpec::number("gap", 0.0, "").at_least(0.0);
        assert_eq!(spec.range_label(), "0..…");
    }
}
