//! Diagnostics: per-line adapter markers plus structural document errors.

use crate::position::{line_at, line_range};
use sdl_core::adapter::{AdapterSet, CommandContext, DiagnosticMarker};
use sdl_core::lexer::depth_after;
use sdl_core::{DocumentError, LintSeverity, SceneDocument};
use tower_lsp::lsp_types::*;

const SOURCE: &str = "sdl-lsp";

/// Compute diagnostics for a document and its parse result.
///
/// Adapters lint every line strictly. Each structural error from the parse
/// covers the line it points at. Recovered parse problems are not repeated
/// here; the adapters already report them.
pub fn compute_diagnostics(adapters: &AdapterSet, text: &str, doc: &SceneDocument) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    let mut depth = 0;
    for (line_number, line) in text.split('\n').enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let ctx = CommandContext::new(line, 0, line_number).in_block(depth);
        diags.extend(
            adapters
                .provide_diagnostics(&ctx)
                .into_iter()
                .map(|marker| to_lsp_diagnostic(marker, line)),
        );
        depth = depth_after(line, depth);
    }

    for error in &doc.errors {
        let DocumentError::Structural { line, error } = error else {
            continue;
        };
        let text_line = line_at(text, *line).unwrap_or_default();
        diags.push(Diagnostic {
            range: line_range(*line, text_line, 0..text_line.len()),
            severity: Some(DiagnosticSeverity::ERROR),
            source: Some(SOURCE.to_string()),
            message: error.to_string(),
            ..Default::default()
        });
    }

    diags
}

fn to_lsp_diagnostic(marker: DiagnosticMarker, line: &str) -> Diagnostic {
    Diagnostic {
        range: line_range(marker.line_span.start, line, marker.column_span),
        severity: Some(match marker.severity {
            LintSeverity::Error => DiagnosticSeverity::ERROR,
            LintSeverity::Warning => DiagnosticSeverity::WARNING,
        }),
        source: Some(SOURCE.to_string()),
        message: marker.message,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sdl_core::{SdlConfig, parse_document};

    fn diagnose(text: &str) -> Vec<Diagnostic> {
        let adapters = AdapterSet::new().unwrap();
        let doc = parse_document(text, &SdlConfig::default());
        compute_diagnostics(&adapters, text, &doc)
    }

    #[test]
    fn valid_document_produces_no_diagnostics() {
        let text = "# !!scene --duration=4\n!text --content=\"Hi\" --size=48 --animation=scale\n";
        assert!(diagnose(text).is_empty());
    }

    #[test]
    fn missing_required_spans_line() {
        let diags = diagnose("!!scene\n!image --fit=cover");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Missing required argument: --src");
        assert_eq!(diags[0].range.start, Position::new(1, 0));
        assert_eq!(diags[0].range.end, Position::new(1, 18));
    }

    #[test]
    fn loose_boolean_is_a_warning() {
        let diags = diagnose("!video --src=v.mp4 --loop=yes");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Some(DiagnosticSeverity::WARNING));
        assert_eq!(diags[0].range.start, Position::new(0, 26));
    }

    #[test]
    fn structural_error_is_reported_once() {
        let diags = diagnose("!text --content=a --size=40\n!section --items=(!sparkle)\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].range.start.line, 1);
        assert!(diags[0].message.contains("unknown directive `!sparkle`"));
    }

    #[test]
    fn multi_line_section_children_are_linted() {
        let text = "!section --items=(\n  !text --size=30,\n  !image --src=a.png\n)";
        let diags = diagnose(text);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].range.start, Position::new(1, 0));
    }
}
