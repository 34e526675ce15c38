//! Property adapters: per-directive completions and diagnostics.
//!
//! Each [`PropertyAdapter`] wraps one entry of the schema table. Given the
//! line under the cursor it decides which of three completion contexts
//! applies (a directive name being typed, an argument name, or an argument
//! value) and lints every occurrence of its directive on the line.
//! Adapters hold nothing but their compiled patterns, so one [`AdapterSet`]
//! can serve any number of documents.
//!
//! All positions here are byte offsets into the line.

use crate::emitter::{format_value, quote_if_needed};
use crate::error::{SdlError, SdlResult};
use crate::lexer::{Token, TokenKind, depth_after, tokenize_in_block};
use crate::lint::{LintSeverity, LintTarget, lint_attributes};
use crate::model::DirectiveKind;
use crate::scanner::segments;
use crate::schema::{self, AttributeSpec, Directive, ITEMS_KEY, ValueKind};
use regex::Regex;
use std::ops::Range;

// ─── Context ─────────────────────────────────────────────────────────────

/// The editor state an adapter sees on each keystroke.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    pub line_content: &'a str,
    /// Byte offset of the cursor in `line_content`.
    pub cursor: usize,
    /// Zero-based line number in the document.
    pub line_number: usize,
    /// `--key=(` blocks already open when the line starts.
    pub block_depth: usize,
}

impl<'a> CommandContext<'a> {
    /// Context for `line`, with the cursor clamped to a char boundary.
    pub fn new(line_content: &'a str, cursor: usize, line_number: usize) -> Self {
        let mut cursor = cursor.min(line_content.len());
        while !line_content.is_char_boundary(cursor) {
            cursor -= 1;
        }
        Self {
            line_content,
            cursor,
            line_number,
            block_depth: 0,
        }
    }

    pub fn in_block(self, block_depth: usize) -> Self {
        Self { block_depth, ..self }
    }

    /// Context for a line of a full document, or `None` past the last line.
    /// Blocks left open by earlier lines set [`Self::block_depth`].
    pub fn from_document(document: &'a str, line_number: usize, cursor: usize) -> Option<Self> {
        let mut depth = 0;
        for (idx, line) in document.split('\n').enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if idx == line_number {
                return Some(Self::new(line, cursor, line_number).in_block(depth));
            }
            depth = depth_after(line, depth);
        }
        None
    }

    fn tokens(&self) -> Vec<Token> {
        tokenize_in_block(self.line_content, self.block_depth)
    }

    pub fn before_cursor(&self) -> &'a str {
        &self.line_content[..self.cursor]
    }
}

/// Which completion method applies at the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionContext {
    /// `!` or `!par` at the cursor. `range` covers the prefix and partial name.
    PropertyStart { partial: String, range: Range<usize> },
    /// `--par` at the cursor, no `=` yet.
    ArgumentName { partial: String, range: Range<usize> },
    /// `--key=par` at the cursor. `range` covers the partial value.
    ArgumentValue {
        key: String,
        partial: String,
        range: Range<usize>,
    },
}

/// Nesting depth at the cursor and the directive that owns it, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorScope {
    pub depth: usize,
    /// Index of the owning directive token.
    pub owner: Option<usize>,
}

/// Find the directive the cursor belongs to, for tokens that start inside
/// `block_depth` open blocks.
///
/// Follows the same ownership rules as [`segments`]: a directive owns the
/// attributes after it at its own depth until a delimiter or the next
/// directive at that depth.
pub fn scope_at(tokens: &[Token], cursor: usize, block_depth: usize) -> CursorScope {
    let mut owners: Vec<Option<usize>> = vec![None; block_depth + 1];
    let mut depth = block_depth;

    for (idx, token) in tokens.iter().enumerate() {
        if token.span.start >= cursor {
            break;
        }
        match &token.kind {
            TokenKind::Directive { .. } => owners[depth] = Some(idx),
            TokenKind::BlockOpen { .. } if token.span.end <= cursor => {
                depth += 1;
                owners.push(None);
            }
            TokenKind::BlockClose if depth > 0 => {
                owners.truncate(depth);
                depth -= 1;
            }
            TokenKind::Delimiter => owners[depth] = None,
            _ => {}
        }
    }

    CursorScope {
        depth,
        owner: owners[depth],
    }
}

// ─── Output types ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    Directive,
    Argument,
    Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionItem {
    pub label: String,
    pub insert_text: String,
    /// Byte range in the line that `insert_text` replaces.
    pub replace_range: Range<usize>,
    pub documentation: String,
    pub kind: CompletionKind,
    /// Ask the editor to open completions again after inserting.
    pub retrigger: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticMarker {
    pub message: String,
    pub severity: LintSeverity,
    /// Zero-based, end-exclusive.
    pub line_span: Range<usize>,
    /// Byte columns within the line.
    pub column_span: Range<usize>,
}

// ─── Adapter ─────────────────────────────────────────────────────────────

/// Completions and diagnostics for one directive.
#[derive(Debug)]
pub struct PropertyAdapter {
    directive: &'static Directive,
    /// The directive anywhere on a line.
    pattern: Regex,
    property_start: Regex,
    argument_name: Regex,
    argument_value: Regex,
}

impl PropertyAdapter {
    /// # Errors
    /// [`SdlError::Pattern`] if a pattern built from the directive name fails to compile.
    pub fn new(directive: &'static Directive) -> SdlResult<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| SdlError::Pattern {
                directive: directive.name(),
                reason: e.to_string(),
            })
        };
        Ok(Self {
            directive,
            pattern: compile(&format!(
                r"(?:^|[\s(,#])!!?{}(?:$|[\s,)])",
                regex::escape(directive.name())
            ))?,
            property_start: compile(r"(?:^|[\s(,#])(!!?)([\w-]*)$")?,
            argument_name: compile(r"(?:^|\s)--([\w-]*)$")?,
            argument_value: compile(r#"(?:^|\s)--([\w-]+)="?([^\s"(),]*)$"#)?,
        })
    }

    pub fn directive(&self) -> &'static Directive {
        self.directive
    }

    pub fn kind(&self) -> DirectiveKind {
        self.directive.kind
    }

    /// Whether the directive appears on the line at all.
    pub fn matches_line(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }

    /// Classify the cursor position. Value context wins over argument
    /// context, which wins over property start. Inside an open quote only
    /// the value context applies.
    pub fn classify(&self, ctx: &CommandContext<'_>) -> Option<CompletionContext> {
        let before = ctx.before_cursor();
        let quoted = in_open_quote(before);

        if let Some(caps) = self.argument_value.captures(before)
            && let (Some(key), Some(partial)) = (caps.get(1), caps.get(2))
        {
            return Some(CompletionContext::ArgumentValue {
                key: key.as_str().to_string(),
                partial: partial.as_str().to_string(),
                range: partial.start()..ctx.cursor,
            });
        }
        if quoted {
            return None;
        }
        if let Some(caps) = self.argument_name.captures(before)
            && let Some(partial) = caps.get(1)
        {
            return Some(CompletionContext::ArgumentName {
                partial: partial.as_str().to_string(),
                range: partial.start() - 2..ctx.cursor,
            });
        }
        if let Some(caps) = self.property_start.captures(before)
            && let (Some(bang), Some(partial)) = (caps.get(1), caps.get(2))
        {
            return Some(CompletionContext::PropertyStart {
                partial: partial.as_str().to_string(),
                range: bang.start()..ctx.cursor,
            });
        }
        None
    }

    /// Completion items for this directive at the cursor. Empty when the
    /// cursor belongs to another directive.
    pub fn provide_completions(&self, ctx: &CommandContext<'_>) -> Vec<CompletionItem> {
        let Some(context) = self.classify(ctx) else {
            return Vec::new();
        };
        let tokens = ctx.tokens();
        let scope = scope_at(&tokens, ctx.cursor, ctx.block_depth);

        match context {
            CompletionContext::PropertyStart { partial, range } => {
                // After `#` only the scene directive is live.
                let commented = ctx.before_cursor().trim_start().starts_with('#');
                if commented && self.kind() != DirectiveKind::Scene {
                    return Vec::new();
                }
                self.property_completion(&partial, range, scope.depth).into_iter().collect()
            }
            CompletionContext::ArgumentName { partial, range } => {
                if !self.owns(&tokens, scope) {
                    return Vec::new();
                }
                self.argument_completions(&tokens, scope, ctx.cursor, &partial, range)
            }
            CompletionContext::ArgumentValue { key, partial, range } => {
                if !self.owns(&tokens, scope) {
                    return Vec::new();
                }
                self.directive
                    .attribute(&key)
                    .map(|spec| value_completions(spec, &partial, range))
                    .unwrap_or_default()
            }
        }
    }

    /// One marker per finding for every occurrence of this directive on the line.
    pub fn provide_diagnostics(&self, ctx: &CommandContext<'_>) -> Vec<DiagnosticMarker> {
        if !self.matches_line(ctx.line_content) {
            return Vec::new();
        }
        let tokens = ctx.tokens();
        let line_span = ctx.line_number..ctx.line_number + 1;

        segments(&tokens)
            .iter()
            .filter(|seg| seg.name == self.directive.name())
            .flat_map(|seg| lint_attributes(self.directive, &seg.attributes))
            .map(|diag| DiagnosticMarker {
                message: diag.message,
                severity: diag.severity,
                line_span: line_span.clone(),
                column_span: match diag.target {
                    LintTarget::Line => 0..ctx.line_content.len(),
                    LintTarget::Attribute(span) | LintTarget::Value(span) => span,
                },
            })
            .collect()
    }

    fn owns(&self, tokens: &[Token], scope: CursorScope) -> bool {
        scope
            .owner
            .and_then(|idx| tokens.get(idx))
            .and_then(Token::directive_name)
            .is_some_and(|name| name == self.directive.name())
    }

    fn property_completion(&self, partial: &str, range: Range<usize>, depth: usize) -> Option<CompletionItem> {
        let dir = self.directive;
        let name = dir.name();
        if (depth > 0 && !dir.kind.nests_in_section()) || !name.starts_with(partial) {
            return None;
        }
        let label = format!("{}{name}", dir.prefix.as_str());
        Some(CompletionItem {
            insert_text: format!("{label} "),
            label,
            replace_range: range,
            documentation: directive_documentation(dir),
            kind: CompletionKind::Directive,
            retrigger: true,
        })
    }

    fn argument_completions(
        &self,
        tokens: &[Token],
        scope: CursorScope,
        cursor: usize,
        partial: &str,
        range: Range<usize>,
    ) -> Vec<CompletionItem> {
        let owner = scope.owner.and_then(|idx| tokens.get(idx));
        let segs = segments(tokens);
        let Some(segment) = segs
            .iter()
            .find(|seg| owner.is_some_and(|owner| std::ptr::eq(seg.directive, owner)))
        else {
            return Vec::new();
        };

        // Keys already on the line, minus the one being typed.
        let present: Vec<&str> = segment
            .attributes
            .iter()
            .filter(|token| !(token.span.start < cursor && cursor <= token.span.end))
            .filter_map(|token| match &token.kind {
                TokenKind::Attribute { key, .. } => Some(key.as_str()),
                _ => None,
            })
            .collect();

        let mut items: Vec<CompletionItem> = self
            .directive
            .attributes
            .iter()
            .filter(|spec| !present.iter().any(|key| spec.matches(key)))
            .filter(|spec| spec.name.starts_with(partial) || spec.aliases.iter().any(|a| a.starts_with(partial)))
            .map(|spec| CompletionItem {
                label: format!("--{}", spec.name),
                insert_text: format!("--{}=", spec.name),
                replace_range: range.clone(),
                documentation: attribute_documentation(spec),
                kind: CompletionKind::Argument,
                retrigger: true,
            })
            .collect();

        if self.directive.kind == DirectiveKind::Section
            && ITEMS_KEY.starts_with(partial)
            && !has_block(tokens, scope)
        {
            items.push(CompletionItem {
                label: format!("--{ITEMS_KEY}"),
                insert_text: format!("--{ITEMS_KEY}=("),
                replace_range: range,
                documentation: "Nested components, separated by commas.".into(),
                kind: CompletionKind::Argument,
                retrigger: true,
            });
        }
        items
    }
}

/// Whether `before` ends inside a `"..."` value that has not been closed.
fn in_open_quote(before: &str) -> bool {
    let mut open = false;
    let mut escaped = false;
    for ch in before.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if open => escaped = true,
            '"' => open = !open,
            _ => {}
        }
    }
    open
}

/// Whether the owning directive already has a `--items=(` block.
fn has_block(tokens: &[Token], scope: CursorScope) -> bool {
    let Some(owner) = scope.owner else {
        return false;
    };
    let mut depth = scope.depth;
    for token in &tokens[owner + 1..] {
        match &token.kind {
            TokenKind::BlockOpen { .. } if depth == scope.depth => return true,
            TokenKind::BlockOpen { .. } => depth += 1,
            TokenKind::BlockClose if depth == scope.depth => return false,
            TokenKind::BlockClose => depth -= 1,
            TokenKind::Directive { .. } | TokenKind::Delimiter if depth == scope.depth => return false,
            _ => {}
        }
    }
    false
}

fn value_completions(spec: &AttributeSpec, partial: &str, range: Range<usize>) -> Vec<CompletionItem> {
    let default = format_value(&spec.default.to_value()).unwrap_or_default();
    let candidates: Vec<(String, String)> = match (spec.kind, spec.values) {
        (ValueKind::Text, Some(values)) => values
            .iter()
            .map(|v| {
                let doc = if quote_if_needed(v) == default { "default" } else { "" };
                (v.to_string(), doc.to_string())
            })
            .collect(),
        (ValueKind::Text, None) if !spec.default.to_value().as_str().unwrap_or_default().is_empty() => {
            vec![(default.clone(), "default".into())]
        }
        (ValueKind::Number, _) => {
            let mut out = vec![(default.clone(), "default".to_string())];
            for (bound, label) in [(spec.min, "minimum"), (spec.max, "maximum")] {
                if let Some(n) = bound
                    && let Some(text) = format_value(&n.into())
                    && !out.iter().any(|(v, _)| *v == text)
                {
                    out.push((text, label.into()));
                }
            }
            out
        }
        (ValueKind::Boolean, _) => ["true", "false"]
            .iter()
            .map(|v| (v.to_string(), if *v == default { "default" } else { "" }.to_string()))
            .collect(),
        _ => Vec::new(),
    };

    candidates
        .into_iter()
        .filter(|(value, _)| value.starts_with(partial))
        .map(|(value, doc)| CompletionItem {
            insert_text: value.clone(),
            label: value,
            replace_range: range.clone(),
            documentation: doc,
            kind: CompletionKind::Value,
            retrigger: false,
        })
        .collect()
}

/// Markdown shown for a directive in completions and hover.
pub fn directive_documentation(dir: &Directive) -> String {
    let mut doc = format!("{}\n", dir.doc);
    for example in dir.examples {
        doc.push_str(&format!("\n    {example}"));
    }
    doc
}

/// Markdown shown for an attribute in completions and hover.
pub fn attribute_documentation(spec: &AttributeSpec) -> String {
    let mut doc = format!("{}\n\n*{}*", spec.doc, spec.kind.label());
    if spec.required || spec.editor_required {
        doc.push_str(", required");
    }
    if let Some(default) = format_value(&spec.default.to_value()) {
        doc.push_str(&format!(", default `{default}`"));
    }
    if spec.min.is_some() || spec.max.is_some() {
        doc.push_str(&format!(", range `{}`", spec.range_label()));
    }
    if let Some(values) = spec.values {
        doc.push_str(&format!("\n\nOne of: {}", values.join(", ")));
    }
    if !spec.aliases.is_empty() {
        doc.push_str(&format!("\n\nAlso accepted as: {}", spec.aliases.join(", ")));
    }
    doc
}

// ─── Adapter set ─────────────────────────────────────────────────────────

/// One adapter per directive kind.
#[derive(Debug)]
pub struct AdapterSet {
    adapters: Vec<PropertyAdapter>,
}

impl AdapterSet {
    /// Validate the schema table and build every adapter.
    ///
    /// # Errors
    /// The first schema or pattern problem found.
    pub fn new() -> SdlResult<Self> {
        schema::validate_registry()?;
        let adapters = schema::DIRECTIVES
            .iter()
            .map(PropertyAdapter::new)
            .collect::<SdlResult<Vec<_>>>()?;
        log::debug!("built {} property adapters", adapters.len());
        Ok(Self { adapters })
    }

    pub fn get(&self, kind: DirectiveKind) -> Option<&PropertyAdapter> {
        self.adapters.iter().find(|adapter| adapter.kind() == kind)
    }

    /// The adapter whose directive owns the cursor.
    pub fn adapter_at(&self, ctx: &CommandContext<'_>) -> Option<&PropertyAdapter> {
        let tokens = ctx.tokens();
        let scope = scope_at(&tokens, ctx.cursor, ctx.block_depth);
        let kind = scope
            .owner
            .and_then(|idx| tokens.get(idx))
            .and_then(Token::directive_name)
            .and_then(DirectiveKind::from_name)?;
        self.get(kind)
    }

    pub fn provide_completions(&self, ctx: &CommandContext<'_>) -> Vec<CompletionItem> {
        self.adapters
            .iter()
            .flat_map(|adapter| adapter.provide_completions(ctx))
            .collect()
    }

    pub fn provide_diagnostics(&self, ctx: &CommandContext<'_>) -> Vec<DiagnosticMarker> {
        self.adapters
            .iter()
            .flat_map(|adapter| adapter.provide_diagnostics(ctx))
            .collect()
    }
}
