//! Strict attribute validation for editor diagnostics.
//!
//! The counterpart of [`crate::directive`]'s lenient coercion. Both read the
//! same schema table, but nothing here substitutes defaults: every value
//! that the parsers would silently repair is reported.

use crate::directive::parse_number;
use crate::lexer::{RawValue, Span, Token, TokenKind};
use crate::schema::{AttributeSpec, Directive, ValueKind};
use std::collections::HashSet;

// ─── Diagnostic types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    Error,
    /// Accepted by the parsers, but probably not what the author meant.
    Warning,
}

/// What a diagnostic points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintTarget {
    /// The whole line the directive sits on.
    Line,
    /// A whole `--key=value` token.
    Attribute(Span),
    /// Just the value part of an attribute.
    Value(Span),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LintDiagnostic {
    pub message: String,
    pub severity: LintSeverity,
    /// Short rule identifier (e.g. "unknown-argument", "out-of-range").
    pub rule: &'static str,
    pub target: LintTarget,
}

/// A problem with one attribute value, before it is placed on a span.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueIssue {
    pub message: String,
    pub severity: LintSeverity,
    pub rule: &'static str,
}

impl ValueIssue {
    fn error(rule: &'static str, message: String) -> Self {
        Self {
            message,
            severity: LintSeverity::Error,
            rule,
        }
    }

    fn warning(rule: &'static str, message: String) -> Self {
        Self {
            message,
            severity: LintSeverity::Warning,
            rule,
        }
    }
}

// ─── Public API ───────────────────────────────────────────────────────────

/// Lint the attribute tokens that belong to one directive.
///
/// Missing required keys come first, then per-attribute findings in source
/// order.
#[must_use]
pub fn lint_attributes(dir: &Directive, attributes: &[&Token]) -> Vec<LintDiagnostic> {
    let mut diags = Vec::new();
    let present: Vec<&str> = attributes
        .iter()
        .filter_map(|token| match &token.kind {
            TokenKind::Attribute { key, .. } => Some(key.as_str()),
            _ => None,
        })
        .collect();

    lint_missing_required(dir, &present, &mut diags);

    let mut seen = HashSet::new();
    for token in attributes {
        let TokenKind::Attribute {
            key,
            value,
            value_span,
            ..
        } = &token.kind
        else {
            continue;
        };

        let Some(spec) = dir.attribute(key) else {
            diags.push(LintDiagnostic {
                message: format!("Unknown argument: --{key}"),
                severity: LintSeverity::Error,
                rule: "unknown-argument",
                target: LintTarget::Attribute(token.span.clone()),
            });
            continue;
        };

        if !seen.insert(spec.name) {
            diags.push(LintDiagnostic {
                message: format!("Duplicate argument: --{} (the last value wins)", spec.name),
                severity: LintSeverity::Warning,
                rule: "duplicate-argument",
                target: LintTarget::Attribute(token.span.clone()),
            });
        }

        let issue = match value {
            Some(raw) => check_value(spec, key, raw),
            None => Some(ValueIssue::warning(
                "missing-value",
                format!("Missing value for --{key}; the default is used"),
            )),
        };
        if let Some(issue) = issue {
            diags.push(LintDiagnostic {
                message: issue.message,
                severity: issue.severity,
                rule: issue.rule,
                target: LintTarget::Value(value_span.clone()),
            });
        }
    }

    diags
}

/// Check a single value against its attribute spec.
///
/// `key` is the spelling used on the line (possibly an alias).
#[must_use]
pub fn check_value(spec: &AttributeSpec, key: &str, raw: &RawValue) -> Option<ValueIssue> {
    match (spec.kind, raw) {
        (ValueKind::Text, RawValue::List(_)) => Some(ValueIssue::error(
            "type-mismatch",
            format!("Expected text for --{key}, found a list"),
        )),
        (ValueKind::Text, RawValue::Bare(s) | RawValue::Quoted(s)) => {
            let allowed = spec.values?;
            (!allowed.contains(&s.as_str())).then(|| {
                ValueIssue::error(
                    "invalid-value",
                    format!("Invalid value for --{key}: {s} (expected one of: {})", allowed.join(", ")),
                )
            })
        }
        (ValueKind::Number, RawValue::Bare(s) | RawValue::Quoted(s)) => check_number(spec, key, s),
        (ValueKind::Number, RawValue::List(_)) => Some(ValueIssue::error(
            "type-mismatch",
            format!("Expected a number for --{key}, found a list"),
        )),
        (ValueKind::Boolean, RawValue::Bare(s) | RawValue::Quoted(s)) => {
            (s != "true" && s != "false").then(|| {
                ValueIssue::warning(
                    "boolean-spelling",
                    format!("Expected true or false for --{key}: {s} is read as false"),
                )
            })
        }
        (ValueKind::Boolean, RawValue::List(_)) => Some(ValueIssue::warning(
            "boolean-spelling",
            format!("Expected true or false for --{key}: a list is read as false"),
        )),
        (ValueKind::List, RawValue::List(items)) => items
            .iter()
            .find(|item| parse_number(item).is_none())
            .map(|item| ValueIssue::error("not-a-number", format!("Expected numbers in --{key}: {item}"))),
        (ValueKind::List, _) => Some(ValueIssue::error(
            "type-mismatch",
            format!("Expected a [..] list for --{key}: {raw}"),
        )),
    }
}

// ─── Rules ────────────────────────────────────────────────────────────────

fn lint_missing_required(dir: &Directive, present: &[&str], diags: &mut Vec<LintDiagnostic>) {
    for spec in dir.editor_required() {
        if !present.iter().any(|key| spec.matches(key)) {
            diags.push(LintDiagnostic {
                message: format!("Missing required argument: --{}", spec.name),
                severity: LintSeverity::Error,
                rule: "missing-required",
                target: LintTarget::Line,
            });
        }
    }
}

fn check_number(spec: &AttributeSpec, key: &str, s: &str) -> Option<ValueIssue> {
    let Some(n) = parse_number(s) else {
        return Some(ValueIssue::error(
            "not-a-number",
            format!("Expected a number for --{key}: {s}"),
        ));
    };
    let below = spec.min.is_some_and(|min| n < min);
    let above = spec.max.is_some_and(|max| n > max);
    (below || above).then(|| {
        ValueIssue::error(
            "out-of-range",
            format!("Value out of range for --{key}: {s} (expected {})", spec.range_label()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::model::DirectiveKind;
    use crate::scanner::segments;
    use crate::schema;
    use pretty_assertions::assert_eq;

    fn lint(line: &str) -> Vec<LintDiagnostic> {
        let tokens = tokenize(line);
        let seg = &segments(&tokens)[0];
        let kind = DirectiveKind::from_name(seg.name).unwrap();
        lint_attributes(schema::directive(kind), &seg.attributes)
    }

    fn rules(diags: &[LintDiagnostic]) -> Vec<&'static str> {
        diags.iter().map(|d| d.rule).collect()
    }

    #[test]
    fn clean_line_has_no_findings() {
        assert!(lint(r#"!text --content="Hi" --animation=slideUp --size=48"#).is_empty());
    }

    #[test]
    fn missing_required_targets_line() {
        let diags = lint("!text --size=40");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Missing required argument: --content");
        assert_eq!(diags[0].target, LintTarget::Line);
    }

    #[test]
    fn editor_requires_text_size() {
        let diags = lint("!text --animation=fadeIn");
        let messages: Vec<&str> = diags.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["Missing required argument: --content", "Missing required argument: --fontSize"]
        );
        assert!(diags.iter().all(|d| d.target == LintTarget::Line));
    }

    #[test]
    fn unknown_key_targets_token() {
        let line = "!image --src=a.png --glow=1";
        let diags = lint(line);
        assert_eq!(rules(&diags), vec!["unknown-argument"]);
        let LintTarget::Attribute(span) = &diags[0].target else {
            panic!("expected attribute target");
        };
        assert_eq!(&line[span.clone()], "--glow=1");
    }

    #[test]
    fn invalid_enum_is_strict() {
        let line = "!image --src=a.png --animation=invalid-type";
        let diags = lint(line);
        assert_eq!(rules(&diags), vec!["invalid-value"]);
        let LintTarget::Value(span) = &diags[0].target else {
            panic!("expected value target");
        };
        assert_eq!(&line[span.clone()], "invalid-type");
    }

    #[test]
    fn numbers_checked_against_range() {
        let diags = lint("!transition --duration=9");
        assert_eq!(
            diags[0].message,
            "Value out of range for --duration: 9 (expected 0.1..5)"
        );
        assert_eq!(rules(&lint("!transition --duration=soon")), vec!["not-a-number"]);
    }

    #[test]
    fn loose_booleans_are_warnings() {
        let diags = lint("!video --src=a.mp4 --muted=yes");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, LintSeverity::Warning);
    }

    #[test]
    fn duplicates_and_aliases() {
        let diags = lint("!text --content=a --size=40 --animate=fadeIn --animation=scale");
        assert_eq!(rules(&diags), vec!["duplicate-argument"]);
    }

    #[test]
    fn list_values() {
        assert!(lint("!section --ratios=[1,2]").is_empty());
        assert_eq!(rules(&lint("!section --ratios=[1,x]")), vec!["not-a-number"]);
        assert_eq!(rules(&lint("!section --ratios=2")), vec!["type-mismatch"]);
    }
}
