//! Engine configuration shared by the parsers, the composer and the LSP.

use serde::{Deserialize, Serialize};

/// How the composer separates siblings inside `--items=(...)`.
///
/// The parser accepts both forms regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiblingDelimiter {
    /// `(!text --content=A, !text --content=B)`
    #[default]
    Comma,
    /// `(!text --content=A !text --content=B)`
    Whitespace,
}

impl SiblingDelimiter {
    pub fn separator(self) -> &'static str {
        match self {
            SiblingDelimiter::Comma => ", ",
            SiblingDelimiter::Whitespace => " ",
        }
    }
}

/// Configuration for parsing and composing.
///
/// Deserializable from LSP `initializationOptions`; every field is optional
/// there and falls back to [`SdlConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SdlConfig {
    /// Frames per second used for seconds → frame conversions. Default: **30**.
    pub fps: f64,

    /// Sibling delimiter written by the composer. Default: **comma**.
    pub sibling_delimiter: SiblingDelimiter,

    /// Write every attribute, not just required ones and non-defaults.
    /// Default: **false**.
    pub emit_defaults: bool,
}

impl Default for SdlConfig {
    fn default() -> Self {
        Self {
            fps: 30.0,
            sibling_delimiter: SiblingDelimiter::Comma,
            emit_defaults: false,
        }
    }
}

impl SdlConfig {
    /// Frame rate, or 30 when `fps` is non-finite or below 1.
    pub fn effective_fps(&self) -> f64 {
        if self.fps.is_finite() && self.fps >= 1.0 {
            self.fps
        } else {
            30.0
        }
    }
}
