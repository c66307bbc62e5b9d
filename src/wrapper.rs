//! Self-decoding wrapper page
//!
//! The wrapper's `<body>` holds a single script. It carries the encoded page
//! as a string literal and, on load, decodes it and writes it over the
//! current document.

use crate::codec::Mode;
use crate::constants::FALLBACK_TITLE;
use regex::Regex;
use std::sync::LazyLock;

static HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<head\b[^>]*>(.*?)</head\s*>").expect("static head pattern"));

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>.*?</title\s*>").expect("static title pattern"));

static BOOTSTRAP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^<script data-dualcrypt="(percent|base64|dual)">var p='([A-Za-z0-9+/=%._~-]*)';"#)
        .expect("static bootstrap pattern")
});

/// The `<title>` element from the source's `<head>`, or the fallback title
pub fn extract_title(html: &str) -> &str {
    HEAD.captures(html)
        .and_then(|head| head.get(1))
        .and_then(|head| TITLE.find(head.as_str()))
        .map(|title| title.as_str())
        .unwrap_or(FALLBACK_TITLE)
}

/// Decode statement for each mode. Leaves the page text in `h`.
fn decoder(mode: Mode) -> &'static str {
    match mode {
        Mode::Percent => "var h=decodeURIComponent(p);",
        // atob yields one char per byte; TextDecoder restores UTF-8 text
        Mode::Base64 => concat!(
            "var b=atob(p),u=new Uint8Array(b.length);",
            "for(var i=0;i<b.length;i++){u[i]=b.charCodeAt(i);}",
            "var h=new TextDecoder('utf-8').decode(u);"
        ),
        Mode::Dual => "var h=decodeURIComponent(atob(p));",
    }
}

/// Build the wrapper document around an already-encoded payload
pub fn wrap(title: &str, payload: &str, mode: Mode) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>\n",
            "<html>\n",
            "<head>\n",
            "<meta charset=\"utf-8\">\n",
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
            "{title}\n",
            "</head>\n",
            "<body>\n",
            "<script data-dualcrypt=\"{mode}\">var p='{payload}';{decoder}",
            "document.open();document.write(h);document.close();</script>\n",
            "</body>\n",
            "</html>\n"
        ),
        title = title,
        mode = mode.as_str(),
        payload = payload,
        decoder = decoder(mode),
    )
}

/// Recover the mode and payload literal from a wrapper built by [`wrap`]
///
/// Only the script opening the wrapper's `<body>` counts. The copied title
/// sits in the head and cannot contain `</head>`, so text in it never matches.
pub fn extract_payload(document: &str) -> Option<(Mode, String)> {
    let head_end = document.find("</head>")?;
    let body = head_end + document[head_end..].find("<body>")? + "<body>".len();
    let caps = BOOTSTRAP.captures(document[body..].trim_start())?;
    let mode = caps.get(1)?.as_str().parse().ok()?;
    Some((mode, caps.get(2)?.as_str().to_string()))
}
