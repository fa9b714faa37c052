//! Rich-text mirror triple used by description/body/answer fields.

use serde::{Deserialize, Serialize};

/// One rich-text value in its three persisted mirrors.
///
/// The editor owns the `json` document shape; the core treats it as an
/// opaque string and never inspects it. `plain` is the canonical text used
/// for previews and search, `html` for rendering outside the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    pub plain: String,
    pub html: String,
    pub json: String,
}

impl RichText {
    /// Builds a value whose only populated mirror is plain text.
    pub fn from_plain(plain: impl Into<String>) -> Self {
        Self {
            plain: plain.into(),
            html: String::new(),
            json: String::new(),
        }
    }

    /// Returns whether every mirror is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.plain.trim().is_empty() && self.html.trim().is_empty() && self.json.trim().is_empty()
    }
}
