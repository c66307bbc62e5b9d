//! Light textual HTML minifier
//!
//! Not DOM-aware. Comments are removed, and outside `<pre>`, `<script>` and
//! `<style>` blocks every line is trimmed, inner whitespace runs become a
//! single space and blank lines disappear. Raw blocks are copied verbatim,
//! and whitespace touching one shrinks to a single space instead of
//! vanishing. Only HTML whitespace counts; U+00A0 is content.

use regex::Regex;
use std::sync::LazyLock;

/// Comments and raw blocks, in document order. Everything between matches is
/// ordinary markup.
static SPECIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?is)<!--.*?-->",
        r"|<pre\b[^>]*>.*?</pre\s*>",
        r"|<script\b[^>]*>.*?</script\s*>",
        r"|<style\b[^>]*>.*?</style\s*>",
    ))
    .expect("static minify pattern")
});

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\n\x0C\r]+").expect("static whitespace pattern"));

fn is_html_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0C' | '\r')
}

/// Minify `html`. `minify(&minify(h)) == minify(h)` for every input.
pub fn minify(html: &str) -> String {
    // Removing a comment can splice text into a new comment or raw-block
    // opener, so repeat until nothing changes. Each pass only deletes text or
    // turns whitespace into spaces, which bounds the loop.
    let mut current = minify_pass(html);
    loop {
        let next = minify_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn minify_pass(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut markup = String::new();
    let mut last = 0;
    let mut after_raw = false;

    for m in SPECIAL.find_iter(html) {
        markup.push_str(&html[last..m.start()]);
        last = m.end();

        if m.as_str().starts_with("<!--") {
            // Text on both sides of a comment is one run of markup
            continue;
        }

        out.push_str(&collapse(&markup, after_raw, true));
        markup.clear();
        out.push_str(m.as_str());
        after_raw = true;
    }

    markup.push_str(&html[last..]);
    out.push_str(&collapse(&markup, after_raw, false));
    out
}

/// Collapse one run of markup. An edge that touches a raw block keeps a
/// single space if it had any whitespace; document edges are trimmed.
fn collapse(markup: &str, raw_before: bool, raw_after: bool) -> String {
    let body = markup
        .lines()
        .map(|line| WHITESPACE_RUN.replace_all(line.trim_matches(is_html_space), " "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if body.is_empty() {
        return if raw_before && raw_after && !markup.is_empty() {
            " ".to_string()
        } else {
            String::new()
        };
    }

    let lead = raw_before && markup.starts_with(is_html_space);
    let trail = raw_after && markup.ends_with(is_html_space);
    let mut out = String::with_capacity(body.len() + 2);
    if lead {
        out.push(' ');
    }
    out.push_str(&body);
    if trail {
        out.push(' ');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_comments() {
        assert_eq!(minify("<p>a<!-- note -->b</p>"), "<p>ab</p>");
        assert_eq!(
            minify("<!-- multi\nline -->\n<div></div>"),
            "<div></div>"
        );
    }

    #[test]
    fn test_collapses_and_trims_lines() {
        let html = "  <ul>\n\t\t<li>one   two</li>\n\n   <li>three</li>  \n</ul>\n";
        assert_eq!(minify(html), "<ul>\n<li>one two</li>\n<li>three</li>\n</ul>");
    }

    #[test]
    fn test_crlf_lines() {
        assert_eq!(minify("<p>\r\n  x  \r\n</p>\r\n"), "<p>\nx\n</p>");
    }

    #[test]
    fn test_raw_blocks_untouched() {
        let pre = "<pre>\n  keep   this\n\n</pre>";
        let script = "<SCRIPT type=\"module\">\n  if (a  <  b) { x(); } // <!-- not a comment -->\n</SCRIPT>";
        let style = "<style>\n  p  {  color: red; }\n</style >";
        let html = format!("<body>\n  {}\n  {}\n  {}\n</body>", pre, script, style);

        let out = minify(&html);
        assert!(out.contains(pre));
        assert!(out.contains(script));
        assert!(out.contains(style));
    }

    #[test]
    fn test_comment_between_words_keeps_single_space() {
        assert_eq!(minify("a <!-- x --> b"), "a b");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "",
            "   ",
            "plain text\n\n  with   gaps",
            "<html>\n<head><title> T </title></head>\n<body>\n<p>a <!-- c --> b</p>\n</body></html>",
            "<!<!-- x -->-- y -->tail",
            "<scr<!-- -->ipt>  a   b  </script>",
            "<pre>x</pre>  <!-- -->  <pre>  y  </pre>",
            "<!-- unterminated <p>  a  </p>",
            "<p>Copyright <script>y()</script> Acme</p>",
            "x \n <pre>a</pre>\n \n<style>b</style> \u{a0} tail",
        ];
        for sample in samples {
            let once = minify(sample);
            assert_eq!(minify(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_space_next_to_raw_block_kept() {
        assert_eq!(
            minify("<p>Copyright <script>y()</script> Acme</p>"),
            "<p>Copyright <script>y()</script> Acme</p>"
        );
        assert_eq!(
            minify("<p>a\n   <script>y()</script>\n\n  b</p>"),
            "<p>a <script>y()</script> b</p>"
        );
        assert_eq!(minify("<pre>x</pre>  <!-- -->  <pre>y</pre>"), "<pre>x</pre> <pre>y</pre>");
        // Nothing to keep apart at the document edges
        assert_eq!(minify("  <style>p{}</style>  "), "<style>p{}</style>");
        assert_eq!(minify("<b>x</b><pre>y</pre><i>z</i>"), "<b>x</b><pre>y</pre><i>z</i>");
    }

    #[test]
    fn test_nbsp_is_content() {
        let html = "<td>\u{a0}</td><p>a\u{a0}\u{a0}b</p>";
        assert_eq!(minify(html), html);
        assert_eq!(minify("  \u{a0}x\u{a0}  "), "\u{a0}x\u{a0}");
    }

    #[test]
    fn test_spliced_comment_removed() {
        assert_eq!(minify("<!<!-- x -->-- y -->tail"), "tail");
    }

    #[test]
    fn test_opaque_text() {
        assert_eq!(minify("just   some\ttext"), "just some text");
        assert_eq!(minify(""), "");
    }
}
