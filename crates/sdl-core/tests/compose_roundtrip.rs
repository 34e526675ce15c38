//! Integration tests: parse → compose → re-parse round-trip.
//!
//! Verifies that no scene data is lost converting SDL text → SceneConfig → SDL text.

use pretty_assertions::assert_eq;
use sdl_core::model::*;
use sdl_core::{SdlConfig, SiblingDelimiter, compose, parse_document};

// ─── Helpers ─────────────────────────────────────────────────────────────

fn to_config(input: &str, config: &SdlConfig) -> SceneConfig {
    let doc = parse_document(input, config);
    assert!(
        !doc.has_structural_errors(),
        "structural errors in input: {:?}",
        doc.errors
    );
    SceneConfig::from_document("scene", &doc)
}

/// Parse, compose, re-parse, and compare the composer input on both sides.
fn assert_roundtrip(input: &str, config: &SdlConfig) -> String {
    let first = to_config(input, config);
    let emitted = compose(&first, config);
    let second = to_config(&emitted, config);
    assert_eq!(first, second, "round-trip changed the scene.\nEmitted:\n{emitted}");

    let doc = parse_document(&emitted, config);
    assert!(doc.errors.is_empty(), "composed text has errors: {:?}", doc.errors);
    emitted
}

// ─── Fixture-based tests ─────────────────────────────────────────────────

#[test]
fn roundtrip_intro_fixture() {
    assert_roundtrip(include_str!("fixtures/intro.sdl"), &SdlConfig::default());
}

#[test]
fn roundtrip_layout_fixture() {
    assert_roundtrip(include_str!("fixtures/layout.sdl"), &SdlConfig::default());
}

#[test]
fn roundtrip_layout_with_whitespace_delimiter() {
    let config = SdlConfig {
        sibling_delimiter: SiblingDelimiter::Whitespace,
        ..SdlConfig::default()
    };
    let emitted = assert_roundtrip(include_str!("fixtures/layout.sdl"), &config);
    assert!(!emitted.contains(", !"));
}

#[test]
fn roundtrip_with_every_default_written() {
    let config = SdlConfig {
        emit_defaults: true,
        ..SdlConfig::default()
    };
    let emitted = assert_roundtrip(include_str!("fixtures/intro.sdl"), &config);
    assert!(emitted.contains("--fontSize=60"));
}

#[test]
fn compose_is_idempotent() {
    let config = SdlConfig::default();
    let once = compose(&to_config(include_str!("fixtures/layout.sdl"), &config), &config);
    let twice = compose(&to_config(&once, &config), &config);
    assert_eq!(once, twice);
}

// ─── Content checks ──────────────────────────────────────────────────────

#[test]
fn intro_fixture_content() {
    let doc = parse_document(include_str!("fixtures/intro.sdl"), &SdlConfig::default());
    assert!(doc.errors.is_empty(), "{:?}", doc.errors);

    let scene = SceneConfig::from_document("intro", &doc);
    assert_eq!(scene.scene_props.duration, 6.0);
    assert_eq!(scene.scene_props.background.as_deref(), Some("#101820"));
    assert_eq!(scene.scene_props.name.as_deref(), Some("Product Tour"));
    assert_eq!(scene.components.text.len(), 2);
    assert_eq!(scene.components.text[0]["animation"], Value::from("slideUp"));
    assert_eq!(scene.components.text[0]["fontSize"], Value::Number(72.0));
    assert_eq!(scene.components.image[0]["rounded"], Value::Bool(true));
    assert_eq!(scene.components.transition.len(), 1);
    assert_eq!(scene.components.transition[0]["easing"], Value::from("spring"));
    assert!(!scene.components.text[1].contains_key("fontSize"));
}

#[test]
fn layout_fixture_nesting() {
    let doc = parse_document(include_str!("fixtures/layout.sdl"), &SdlConfig::default());
    assert!(doc.errors.is_empty(), "{:?}", doc.errors);
    assert_eq!(doc.components.len(), 2);

    let section = &doc.components[0];
    assert_eq!(section.kind, DirectiveKind::Section);
    assert_eq!(
        section.get("ratios"),
        Some(&Value::List(vec![Value::Number(2.0), Value::Number(1.0)]))
    );
    let kinds: Vec<DirectiveKind> = section.items().iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![DirectiveKind::Text, DirectiveKind::Section, DirectiveKind::Video]
    );
    assert_eq!(section.items()[1].items().len(), 2);

    let video = &section.items()[2];
    assert_eq!(video.get("startFromFrames"), Some(&Value::Number(45.0)));
    assert_eq!(video.get("endAtFrames"), Some(&Value::Number(270.0)));
}

#[test]
fn broken_fixture_reports_every_block() {
    let doc = parse_document(include_str!("fixtures/broken.sdl"), &SdlConfig::default());

    let summary: Vec<(usize, bool)> = doc.errors.iter().map(|e| (e.line(), e.is_structural())).collect();
    assert_eq!(
        summary,
        vec![(0, false), (2, true), (3, false), (4, false), (5, true)]
    );
    assert_eq!(
        doc.errors[0].to_string(),
        "line 1: Invalid number for duration: forever"
    );

    let kinds: Vec<DirectiveKind> = doc.components.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![DirectiveKind::Text, DirectiveKind::Image, DirectiveKind::Video]
    );
    assert_eq!(doc.scene["duration"], Value::Number(5.0));
    assert_eq!(doc.components[2].get("volume"), Some(&Value::Number(1.0)));
}

// ─── Serialization ───────────────────────────────────────────────────────

#[test]
fn scene_config_json_shape() {
    let scene = SceneConfig::from_document(
        "intro",
        &parse_document(include_str!("fixtures/intro.sdl"), &SdlConfig::default()),
    );
    let json = serde_json::to_value(&scene).unwrap();
    assert_eq!(json["sceneProps"]["duration"], 6.0);
    assert_eq!(json["components"]["text"][1]["position"], "bottom");
    assert!(json["components"].get("video").is_none());
    assert_eq!(json["components"]["transition"].as_array().map(Vec::len), Some(1));

    let back: SceneConfig = serde_json::from_value(json).unwrap();
    assert_eq!(back, scene);
}

#[test]
fn nested_items_serialize_as_components() {
    let doc = parse_document(
        "!section --items=(!text --content=A)",
        &SdlConfig::default(),
    );
    let json = serde_json::to_value(&doc.components[0]).unwrap();
    assert_eq!(json["type"], "section");
    assert_eq!(json["data"]["items"][0]["type"], "text");
    assert_eq!(json["data"]["items"][0]["data"]["content"], "A");
}
