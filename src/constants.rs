//! Centralized constants for DualCrypt
//!
//! Defaults shared by the CLI, the interactive menu and the batch driver,
//! plus the fixed text the pipeline emits.

// ============================================================================
// BATCH DEFAULTS
// ============================================================================

/// Glob pattern used to enumerate sources, relative to the source directory.
pub const DEFAULT_GLOB: &str = "**/*.html";

/// Source directory offered by the interactive menu when nothing is remembered.
pub const DEFAULT_SRC_DIR: &str = "src";

/// Destination directory offered by the interactive menu when nothing is remembered.
pub const DEFAULT_DST_DIR: &str = "dist";

/// File extensions accepted as HTML sources (compared case-insensitively).
pub const HTML_EXTENSIONS: &[&str] = &["html", "htm"];

/// Extension given to every wrapper written to the destination.
pub const OUTPUT_EXTENSION: &str = "html";

// ============================================================================
// SETTINGS FILE
// ============================================================================

/// Directory name under the platform config dir.
pub const SETTINGS_DIR_NAME: &str = "dualcrypt";

/// File holding the remembered interactive settings.
pub const SETTINGS_FILE_NAME: &str = "settings.toml";

// ============================================================================
// WRAPPER TEXT
// ============================================================================

/// Title used when the source has no `<title>` in its `<head>`.
pub const FALLBACK_TITLE: &str = "<title>Protected App</title>";

/// Injected before `</body>` when protection is enabled.
///
/// Cancels the context menu and swallows Ctrl+U and F12. Nothing else.
pub const PROTECT_SCRIPT: &str = concat!(
    "<script>",
    "document.addEventListener('contextmenu',function(e){e.preventDefault();return false;});",
    "document.addEventListener('keydown',function(e){var k=(e.key||'').toLowerCase();",
    "if((e.ctrlKey&&k==='u')||e.key==='F12'){e.preventDefault();return false;}});",
    "</script>"
);

// ============================================================================
// EXIT CODES
// ============================================================================

/// Every attempted file failed, or the batch could not start.
pub const EXIT_FAILURE: i32 = 1;

/// The run was interrupted before all files were launched.
pub const EXIT_CANCELLED: i32 = 130;
