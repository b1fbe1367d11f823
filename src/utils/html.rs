//! HTML text helpers.

use scraper::{Html, Selector};

/// Plain-text content of an HTML fragment, whitespace-normalized.
pub fn strip_tags(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Plain-text content of an HTML fragment with its line structure kept.
///
/// Trailing spaces are dropped from every line and leading/trailing blank
/// lines are trimmed; inner newlines stay.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    lines.join("\n").trim_matches('\n').to_string()
}

/// `src` attributes of every `<img>` in a fragment, in document order.
pub fn image_sources(html: &str) -> Vec<String> {
    let Ok(img_selector) = Selector::parse("img") else {
        return Vec::new();
    };
    Html::parse_fragment(html)
        .select(&img_selector)
        .filter_map(|img| img.value().attr("src"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<p>...this one <b>weird</b> trick.</p>"), "...this one weird trick.");
        assert_eq!(strip_tags("Jekyll: Test"), "Jekyll: Test");
        assert_eq!(strip_tags("Fish &amp; Chips"), "Fish & Chips");
        assert_eq!(strip_tags(""), "");
    }

    #[test]
    fn test_html_to_text_keeps_lines() {
        let html = "<p>First line</p>\n<p>Second <b>line</b>  </p>\n\n<p>Third</p>\n";
        assert_eq!(html_to_text(html), "First line\nSecond line\n\nThird");
        assert_eq!(html_to_text("a &lt; b"), "a < b");
    }

    #[test]
    fn test_image_sources() {
        let html = r#"<p><img src="http://x/a.png"> text <img alt="no src"><img src='/b.jpg'/></p>"#;
        assert_eq!(image_sources(html), vec!["http://x/a.png", "/b.jpg"]);
    }
}
