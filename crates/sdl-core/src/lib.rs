//! Scene Description Language engine.
//!
//! Text → [`SceneDocument`] via [`parse_document`], back to canonical text
//! via [`compose`], and per-keystroke editor support via [`AdapterSet`].

pub mod adapter;
pub mod config;
pub mod directive;
pub mod emitter;
pub mod error;
pub mod lexer;
pub mod lint;
pub mod model;
pub mod parser;
pub mod scanner;
pub mod schema;
pub mod section;

pub use adapter::{AdapterSet, CommandContext, CompletionItem, DiagnosticMarker, PropertyAdapter};
pub use config::{SdlConfig, SiblingDelimiter};
pub use directive::{ParseResult, parse_image, parse_scene_meta, parse_text, parse_transition, parse_video};
pub use emitter::{compose, compose_component};
pub use error::{SdlError, SdlResult};
pub use lint::{LintDiagnostic, LintSeverity};
pub use model::*;
pub use parser::{ComponentResult, parse_component, parse_document};
pub use scanner::scan;
pub use section::parse_section;
