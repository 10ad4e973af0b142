use once_cell::sync::Lazy;
use regex::Regex;

// Matches the numbered heading the backend prefixes replies with. This rule
// must run before the generic bold rule, otherwise bold consumes the
// delimiters and the heading never fires.
static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*Response (\d+):\*\*").unwrap());
static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static ITALIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.+?)\*").unwrap());
static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`(.+?)`").unwrap());

/// Neutralize markup-significant characters so no substring of the input can
/// become a tag boundary in the rendered output.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Convert raw backend text into display-safe markup: escape unconditionally,
/// then reintroduce a limited set of styles on top of the escaped text.
pub fn format_bot_text(raw: &str) -> String {
    let escaped = escape_html(raw);

    let with_headings = HEADING_RE.replace_all(
        &escaped,
        "<div class=\"response-heading\">Response $1:</div>",
    );
    let with_bold = BOLD_RE.replace_all(&with_headings, "<strong>$1</strong>");
    let with_italic = ITALIC_RE.replace_all(&with_bold, "<em>$1</em>");
    let with_code = CODE_RE.replace_all(&with_italic, "<code>$1</code>");

    with_code.replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_script_tags() {
        let markup = format_bot_text("<script>alert('x')</script>");
        assert!(!markup.contains("<script>"));
        assert!(markup.contains("&lt;script&gt;"));
    }

    #[test]
    fn bold_italic_code() {
        assert_eq!(format_bot_text("**hi**"), "<strong>hi</strong>");
        assert_eq!(format_bot_text("*hi*"), "<em>hi</em>");
        assert_eq!(format_bot_text("`hi`"), "<code>hi</code>");
    }

    #[test]
    fn response_heading_takes_precedence_over_bold() {
        let markup = format_bot_text("**Response 2:** body");
        assert_eq!(
            markup,
            "<div class=\"response-heading\">Response 2:</div> body"
        );
        assert!(!markup.contains("<strong>Response"));
    }

    #[test]
    fn heading_requires_digits() {
        let markup = format_bot_text("**Response:**");
        assert_eq!(markup, "<strong>Response:</strong>");
    }

    #[test]
    fn newlines_become_line_breaks() {
        assert_eq!(format_bot_text("a\nb"), "a<br>b");
    }

    #[test]
    fn escaped_entities_are_not_reinterpreted() {
        // The ampersands introduced by escaping must survive the styling pass.
        assert_eq!(format_bot_text("*<b>*"), "<em>&lt;b&gt;</em>");
        assert_eq!(format_bot_text("a & b"), "a &amp; b");
    }

    #[test]
    fn shortest_span_wins() {
        assert_eq!(
            format_bot_text("**a** and **b**"),
            "<strong>a</strong> and <strong>b</strong>"
        );
        assert_eq!(format_bot_text("`a` or `b`"), "<code>a</code> or <code>b</code>");
    }

    #[test]
    fn unpaired_delimiters_pass_through() {
        assert_eq!(format_bot_text("2 ** 3"), "2 ** 3");
    }
}
