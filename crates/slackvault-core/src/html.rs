//! Plain-text rendering of canvas HTML.

use std::sync::LazyLock;

use regex::Regex;

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("invalid canvas html regex")
}

static H1: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)<h1[^>]*>(.*?)</h1>"));
static H2: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)<h2[^>]*>(.*?)</h2>"));
static H3: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)<h3[^>]*>(.*?)</h3>"));
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)<li[^>]*>(.*?)</li>"));
static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)<br\s*/?>"));
static BLOCK_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)</(?:p|div|ul|ol|h[1-6]|blockquote|table|tr)>"));
static TAG: LazyLock<Regex> = LazyLock::new(|| pattern(r"<[^>]*>"));
static MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| pattern(r"[^\S\n]{2,}"));
static MULTI_BLANK: LazyLock<Regex> = LazyLock::new(|| pattern(r"\n{3,}"));

const ENTITIES: [(&str, &str); 7] = [
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    // Last, so `&amp;lt;` decodes to `&lt;` rather than `<`.
    ("&amp;", "&"),
];

/// Convert canvas HTML to readable plain text.
///
/// Headings become `#`-prefixed lines, list items become `- ` lines, and
/// block boundaries become blank lines. Remaining tags are dropped.
///
/// Entities are decoded in a single pass, so escaped entity text such as
/// `&amp;lt;` comes out as the literal `&lt;`, not `<`.
pub fn html_to_text(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let s = H1.replace_all(html, "\n\n# $1\n\n");
    let s = H2.replace_all(&s, "\n\n## $1\n\n");
    let s = H3.replace_all(&s, "\n\n### $1\n\n");
    let s = LIST_ITEM.replace_all(&s, "\n- $1");
    let s = LINE_BREAK.replace_all(&s, "\n");
    let s = BLOCK_CLOSE.replace_all(&s, "\n\n");
    let mut s = TAG.replace_all(&s, "").into_owned();

    for (entity, decoded) in ENTITIES {
        s = s.replace(entity, decoded);
    }

    let s = MULTI_SPACE.replace_all(&s, " ");
    let s = s.split('\n').map(str::trim).collect::<Vec<_>>().join("\n");
    MULTI_BLANK.replace_all(&s, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_and_lists() {
        let html = "<h1>Plan</h1><p>Intro text</p><ul><li>one</li><li>two</li></ul><h2>Next</h2>";
        assert_eq!(
            html_to_text(html),
            "# Plan\n\nIntro text\n\n- one\n- two\n\n## Next"
        );
    }

    #[test]
    fn breaks_entities_and_spacing() {
        let html = "<div>a&nbsp;&amp;&nbsp;b<br/>c   d &lt;tag&gt; &quot;q&quot; it&#39;s</div>";
        assert_eq!(html_to_text(html), "a & b\nc d <tag> \"q\" it's");
    }

    #[test]
    fn escaped_entities_decode_once() {
        assert_eq!(html_to_text("<p>&amp;lt;</p>"), "&lt;");
    }

    #[test]
    fn blank_runs_collapse() {
        let html = "<p>one</p><p></p><p></p><p>two</p>";
        assert_eq!(html_to_text(html), "one\n\ntwo");
    }

    #[test]
    fn empty_input() {
        assert_eq!(html_to_text(""), "");
        assert_eq!(html_to_text("<div></div>"), "");
    }
}
