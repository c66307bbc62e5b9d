//! Payload encodings
//!
//! `encode` produces the string literal embedded in the wrapper; `decode`
//! performs the same inverse steps the wrapper's bootstrap runs in the
//! browser, so the two can be checked against each other.

use crate::error::{DualCryptError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bytes left as-is by percent encoding: letters, digits and `-_.~`.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Payload encoding scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Percent-encode every byte outside the unreserved set
    #[default]
    Percent,
    /// Standard padded Base64 of the UTF-8 bytes
    Base64,
    /// Percent-encode, then Base64 the result
    Dual,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Percent, Mode::Base64, Mode::Dual];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Percent => "percent",
            Mode::Base64 => "base64",
            Mode::Dual => "dual",
        }
    }

    /// Label shown in menus and summaries
    pub fn describe(&self) -> &'static str {
        match self {
            Mode::Percent => "Percent-encode",
            Mode::Base64 => "Base64",
            Mode::Dual => "Dual (Base64 + Percent)",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "percent" => Ok(Mode::Percent),
            "base64" => Ok(Mode::Base64),
            "dual" => Ok(Mode::Dual),
            other => Err(format!(
                "Unknown mode '{}' (expected percent, base64 or dual)",
                other
            )),
        }
    }
}

/// Percent-encode the UTF-8 bytes of `text`
pub fn percent_encode(text: &str) -> String {
    utf8_percent_encode(text, UNRESERVED).to_string()
}

/// Encode `text` for embedding in the wrapper's script
///
/// The result is plain ASCII without quotes, angle brackets or backslashes,
/// so it can sit inside a single-quoted JavaScript string literal.
pub fn encode(text: &str, mode: Mode) -> String {
    match mode {
        Mode::Percent => percent_encode(text),
        Mode::Base64 => BASE64.encode(text.as_bytes()),
        Mode::Dual => BASE64.encode(percent_encode(text).as_bytes()),
    }
}

/// Reverse `encode`, following the same order as the browser bootstrap
///
/// # Errors
///
/// Returns `DualCryptError::Encoding` if the payload is not valid for the
/// mode or does not decode to UTF-8 text.
pub fn decode(payload: &str, mode: Mode) -> Result<String> {
    match mode {
        Mode::Percent => percent_decode(payload),
        Mode::Base64 => base64_decode(payload),
        Mode::Dual => percent_decode(&base64_decode(payload)?),
    }
}

fn base64_decode(payload: &str) -> Result<String> {
    let bytes = BASE64
        .decode(payload)
        .map_err(|e| DualCryptError::encoding(format!("invalid Base64 payload: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| DualCryptError::encoding(format!("Base64 payload is not UTF-8: {}", e)))
}

fn percent_decode(payload: &str) -> Result<String> {
    // decodeURIComponent rejects stray '%' and raw non-ASCII, so do we
    let bytes = payload.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if !b.is_ascii() {
            return Err(DualCryptError::encoding("percent payload is not ASCII"));
        }
        if b == b'%' {
            let well_formed = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !well_formed {
                return Err(DualCryptError::encoding(format!(
                    "malformed percent escape at offset {}",
                    i
                )));
            }
        }
    }

    percent_decode_str(payload)
        .decode_utf8()
        .map(|text| text.into_owned())
        .map_err(|e| DualCryptError::encoding(format!("percent payload is not UTF-8: {}", e)))
}
