//! Scene composer: [`SceneConfig`] → canonical SDL text.
//!
//! Output re-parses to the same data. Records hold authored values: every
//! schema key present in a record is written, in schema order. Required keys
//! are always written. Missing optional keys are written with their default
//! only when [`SdlConfig::emit_defaults`] is set.

use crate::config::SdlConfig;
use crate::directive::authored_record;
use crate::model::{DirectiveKind, ParsedComponent, Record, SceneConfig, Value};
use crate::schema::{self, Directive, ITEMS_KEY};
use std::fmt::Write;

/// Characters that force a string value into double quotes.
const SPECIAL_CHARS: &str = "\"'`!@#$%^&*()[]{}\\|;:,.<>?/~";

/// Emit a scene as SDL text, one directive per line.
#[must_use]
pub fn compose(scene: &SceneConfig, config: &SdlConfig) -> String {
    let mut out = String::with_capacity(256);

    let props = &scene.scene_props;
    let _ = write!(out, "# !scene --duration={}", format_number(props.duration));
    if let Some(background) = &props.background {
        let _ = write!(out, " --background={}", quote_if_needed(background));
    }
    if let Some(name) = &props.name {
        let _ = write!(out, " --title={}", quote_if_needed(name));
    }
    out.push('\n');

    let components = &scene.components;
    let groups = [
        (DirectiveKind::Text, components.text.as_slice()),
        (DirectiveKind::Image, components.image.as_slice()),
        (DirectiveKind::Video, components.video.as_slice()),
        (DirectiveKind::Section, components.section.as_slice()),
        (DirectiveKind::Transition, components.transition.as_slice()),
    ];
    if components.transition.len() > 1 {
        log::warn!("{} transitions given; writing only the first", components.transition.len());
    }
    for (kind, records) in groups {
        let records = match kind {
            DirectiveKind::Transition => &records[..records.len().min(1)],
            _ => records,
        };
        for record in records {
            emit_component(&mut out, kind, record, config);
            out.push('\n');
        }
    }

    out
}

/// Emit one parsed component as a single directive, without a trailing
/// newline. Default-filled values are reduced to their authored form first.
#[must_use]
pub fn compose_component(component: &ParsedComponent, config: &SdlConfig) -> String {
    let mut out = String::new();
    let data = authored_record(schema::directive(component.kind), &component.data);
    emit_component(&mut out, component.kind, &data, config);
    out
}

fn emit_component(out: &mut String, kind: DirectiveKind, record: &Record, config: &SdlConfig) {
    let dir = schema::directive(kind);
    out.push_str(dir.prefix.as_str());
    out.push_str(dir.name());
    emit_attributes(out, dir, record, config);

    if kind == DirectiveKind::Section
        && let Some(items) = record.get(ITEMS_KEY).and_then(Value::as_items)
        && (!items.is_empty() || config.emit_defaults)
    {
        let _ = write!(out, " --{ITEMS_KEY}=(");
        for (idx, child) in items.iter().enumerate() {
            if idx > 0 {
                out.push_str(config.sibling_delimiter.separator());
            }
            emit_component(out, child.kind, &child.data, config);
        }
        out.push(')');
    }
}

fn emit_attributes(out: &mut String, dir: &Directive, record: &Record, config: &SdlConfig) {
    for spec in dir.attributes {
        let default = spec.default.to_value();
        let value = match record.get(spec.name) {
            Some(value) => value,
            None if spec.required || config.emit_defaults => &default,
            None => continue,
        };
        match format_value(value) {
            Some(text) => {
                let _ = write!(out, " --{}={text}", spec.name);
            }
            None => log::warn!("!{}: cannot write `{}` as an attribute value", dir.name(), spec.name),
        }
    }

    for key in record.keys() {
        let known = key == ITEMS_KEY && dir.kind == DirectiveKind::Section
            || dir.attributes.iter().any(|spec| spec.name == key || spec.frames == Some(key.as_str()));
        if !known {
            log::warn!("!{}: skipping unknown key `{key}`", dir.name());
        }
    }
}

// ─── Value formatting ────────────────────────────────────────────────────

/// Attribute value text, or `None` for nested items.
pub fn format_value(value: &Value) -> Option<String> {
    match value {
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(format_number(*n)),
        Value::Text(s) => Some(quote_if_needed(s)),
        Value::List(items) => {
            let parts: Option<Vec<String>> = items.iter().map(format_value).collect();
            parts.map(|parts| format!("[{}]", parts.join(",")))
        }
        Value::Items(_) => None,
    }
}

/// Shortest decimal text that parses back to `n`.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        // Avoid `-0`.
        return "0".into();
    }
    n.to_string()
}

/// Wrap `s` in double quotes iff it is empty or contains whitespace or a
/// special character. Quoted output escapes `\`, `"` and newlines.
pub fn quote_if_needed(s: &str) -> String {
    if !needs_quotes(s) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

pub fn needs_quotes(s: &str) -> bool {
    s.is_empty() || s.chars().any(|ch| ch.is_whitespace() || SPECIAL_CHARS.contains(ch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiblingDelimiter;
    use crate::parser::parse_document;
    use pretty_assertions::assert_eq;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn compose_minimal_scene() {
        let out = compose(&SceneConfig::new("s1"), &SdlConfig::default());
        assert_eq!(out, "# !scene --duration=5\n");
    }

    #[test]
    fn compose_quotes_only_when_needed() {
        let mut scene = SceneConfig::new("s1");
        scene.components.text.push(record(&[
            ("content", Value::from("Hi there")),
            ("animation", Value::from("fadeIn")),
        ]));
        let out = compose(&scene, &SdlConfig::default());
        assert_eq!(out, "# !scene --duration=5\n!text --content=\"Hi there\" --animation=fadeIn\n");

        let emit_all = SdlConfig {
            emit_defaults: true,
            ..SdlConfig::default()
        };
        let out = compose(&scene, &emit_all);
        let text_line = out.lines().nth(1).unwrap_or_default();
        assert_eq!(
            text_line,
            "!text --content=\"Hi there\" --animation=fadeIn --duration=1 --delay=0 --fontSize=60 \
             --fontWeight=normal --color=white --position=center --align=center"
        );
    }

    #[test]
    fn compose_fixed_component_order() {
        let mut scene = SceneConfig::new("s1");
        scene.scene_props.background = Some("#000".into());
        scene.scene_props.name = Some("Intro".into());
        scene.components.transition = vec![
            record(&[("type", Value::from("wipe"))]),
            record(&[("type", Value::from("fade"))]),
        ];
        scene.components.image.push(record(&[("src", Value::from("a.png"))]));
        scene.components.text.push(record(&[("content", Value::from("A"))]));

        let out = compose(&scene, &SdlConfig::default());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "# !scene --duration=5 --background=\"#000\" --title=Intro",
                "!text --content=A",
                "!image --src=\"a.png\"",
                "!transition --type=wipe",
            ]
        );
    }

    #[test]
    fn compose_required_field_even_when_missing() {
        let mut scene = SceneConfig::new("s1");
        scene.components.image.push(Record::new());
        let out = compose(&scene, &SdlConfig::default());
        assert!(out.contains("!image --src=\"\"\n"));
    }

    #[test]
    fn compose_nested_sections_with_each_delimiter() {
        let doc = parse_document(
            "!section --gap=8 --items=(!text --content=A, !section --items=(!image --src=x))",
            &SdlConfig::default(),
        );
        let component = &doc.components[0];

        let comma = compose_component(component, &SdlConfig::default());
        assert_eq!(
            comma,
            "!section --gap=8 --items=(!text --content=A, !section --items=(!image --src=x))"
        );

        let spaced = compose_component(
            component,
            &SdlConfig {
                sibling_delimiter: SiblingDelimiter::Whitespace,
                ..SdlConfig::default()
            },
        );
        assert_eq!(
            spaced,
            "!section --gap=8 --items=(!text --content=A !section --items=(!image --src=x))"
        );
    }

    #[test]
    fn compose_skips_derived_frames() {
        let doc = parse_document("!video --src=v --startFrom=2", &SdlConfig::default());
        let out = compose_component(&doc.components[0], &SdlConfig::default());
        assert_eq!(out, "!video --src=v --startFrom=2");
    }

    #[test]
    fn format_values() {
        assert_eq!(format_value(&Value::Number(0.5)).as_deref(), Some("0.5"));
        assert_eq!(format_value(&Value::Number(-0.0)).as_deref(), Some("0"));
        assert_eq!(format_value(&Value::Bool(true)).as_deref(), Some("true"));
        assert_eq!(
            format_value(&Value::List(vec![Value::Number(1.0), Value::Number(2.5)])).as_deref(),
            Some("[1,2.5]")
        );
        assert_eq!(format_value(&Value::Items(Vec::new())), None);
    }

    #[test]
    fn quoting_escapes() {
        assert_eq!(quote_if_needed("plain"), "plain");
        assert_eq!(quote_if_needed(""), "\"\"");
        assert_eq!(quote_if_needed(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(quote_if_needed("a\\b"), r#""a\\b""#);
        assert_eq!(quote_if_needed("two\nlines"), r#""two\nlines""#);
        assert_eq!(quote_if_needed("slide-up"), "slide-up");
    }
}
