//! The encode/obfuscate transform
//!
//! `transform` is pure: the same text and config always give the same
//! wrapper, and nothing is remembered between calls.

use crate::codec::{self, Mode};
use crate::{minify, protect, wrapper};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Options recognised by the transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformConfig {
    pub mode: Mode,
    pub minify: bool,
    pub protect: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Percent,
            minify: true,
            protect: true,
        }
    }
}

impl TransformConfig {
    pub fn new(mode: Mode, minify: bool, protect: bool) -> Self {
        Self {
            mode,
            minify,
            protect,
        }
    }
}

/// Text of one source file and where it came from
#[derive(Debug, Clone)]
pub struct SourceDocument {
    path: PathBuf,
    text: String,
}

impl SourceDocument {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Wrapper page produced by the transform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedDocument {
    html: String,
}

impl EncodedDocument {
    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn into_string(self) -> String {
        self.html
    }

    /// Mode and payload literal carried by the wrapper
    pub fn payload(&self) -> Option<(Mode, String)> {
        wrapper::extract_payload(&self.html)
    }
}

/// Minify, protect, encode and wrap `html`
pub fn transform(html: &str, config: &TransformConfig) -> EncodedDocument {
    let title = wrapper::extract_title(html);
    let page = prepare(html, config);
    let payload = codec::encode(&page, config.mode);

    EncodedDocument {
        html: wrapper::wrap(title, &payload, config.mode),
    }
}

/// Transform a document read from disk
pub fn transform_document(source: &SourceDocument, config: &TransformConfig) -> EncodedDocument {
    transform(source.text(), config)
}

/// The page text that ends up in the payload, before encoding
pub fn prepare(html: &str, config: &TransformConfig) -> String {
    let page = if config.minify {
        minify::minify(html)
    } else {
        html.to_string()
    };

    if config.protect {
        protect::inject(&page)
    } else {
        page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PROTECT_SCRIPT;

    #[test]
    fn test_default_config_matches_cli_defaults() {
        let config = TransformConfig::default();
        assert_eq!(config.mode, Mode::Percent);
        assert!(config.minify);
        assert!(config.protect);
    }

    #[test]
    fn test_prepare_order_minify_then_protect() {
        let config = TransformConfig::new(Mode::Percent, true, true);
        let page = prepare("<body>\n  <p>a</p>\n</body>", &config);
        // The snippet is injected after minifying, so it survives intact
        assert_eq!(page, format!("<body>\n<p>a</p>\n{}</body>", PROTECT_SCRIPT));
    }

    #[test]
    fn test_prepare_passthrough() {
        let config = TransformConfig::new(Mode::Dual, false, false);
        let html = "  <p>  spaced  </p>  ";
        assert_eq!(prepare(html, &config), html);
    }

    #[test]
    fn test_transform_deterministic() {
        let config = TransformConfig::default();
        let html = "<html><head><title>x</title></head><body>y</body></html>";
        assert_eq!(transform(html, &config), transform(html, &config));
    }

    #[test]
    fn test_transform_document_uses_text() {
        let source = SourceDocument::new("pages/a.html", "<p>hi</p>");
        let config = TransformConfig::new(Mode::Base64, false, false);
        assert_eq!(source.path(), Path::new("pages/a.html"));
        assert_eq!(
            transform_document(&source, &config),
            transform("<p>hi</p>", &config)
        );
    }
}
