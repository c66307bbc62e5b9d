//! Protection snippet injection

use crate::constants::PROTECT_SCRIPT;

const BODY_CLOSE: &str = "</body>";

/// Insert the protection script before the last `</body>` tag
///
/// The tag is matched case-insensitively. Without one, the script is
/// appended at the end of the document.
pub fn inject(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + PROTECT_SCRIPT.len());

    // ASCII lowercasing keeps byte offsets aligned with `html`
    match html.to_ascii_lowercase().rfind(BODY_CLOSE) {
        Some(pos) => {
            out.push_str(&html[..pos]);
            out.push_str(PROTECT_SCRIPT);
            out.push_str(&html[pos..]);
        }
        None => {
            out.push_str(html);
            out.push_str(PROTECT_SCRIPT);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_before_body_close() {
        let out = inject("<html><body><p>x</p></body></html>");
        assert_eq!(
            out,
            format!("<html><body><p>x</p>{}</body></html>", PROTECT_SCRIPT)
        );
    }

    #[test]
    fn test_case_insensitive_tag() {
        let out = inject("<BODY>x</BODY>");
        assert_eq!(out, format!("<BODY>x{}</BODY>", PROTECT_SCRIPT));
    }

    #[test]
    fn test_last_body_close_wins() {
        let html = "<body><code>&lt;/body&gt;</code><p></body></p></body>";
        let out = inject(html);
        assert!(out.ends_with(&format!("{}</body>", PROTECT_SCRIPT)));
        assert_eq!(out.matches(PROTECT_SCRIPT).count(), 1);
    }

    #[test]
    fn test_appended_without_body() {
        assert_eq!(inject("<p>fragment</p>"), format!("<p>fragment</p>{}", PROTECT_SCRIPT));
        assert_eq!(inject(""), PROTECT_SCRIPT);
    }

    #[test]
    fn test_snippet_handles_expected_keys() {
        assert!(PROTECT_SCRIPT.contains("'contextmenu'"));
        assert!(PROTECT_SCRIPT.contains("'keydown'"));
        assert!(PROTECT_SCRIPT.contains("k==='u'"));
        assert!(PROTECT_SCRIPT.contains("'F12'"));
        assert_eq!(PROTECT_SCRIPT.matches("<script>").count(), 1);
    }
}
