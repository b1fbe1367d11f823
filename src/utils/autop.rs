// src/utils/autop.rs

//! Paragraph reflow for legacy plain-text bodies.
//!
//! The classic `wpautop` transform: blank-line separated text becomes
//! `<p>` paragraphs, remaining single newlines optionally become `<br />`,
//! and block-level tags are left unwrapped. `<pre>` blocks pass through
//! untouched.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Block-level tag names that must never be wrapped in a paragraph.
const ALL_BLOCKS: &str = "(?i:table|thead|tfoot|caption|col|colgroup|tbody|tr|td|th|div|dl|dd|dt|ul|ol|li|pre|select|option|form|map|area|blockquote|address|math|style|p|h[1-6]|hr|fieldset|noscript|legend|section|article|aside|hgroup|header|footer|nav|figure|figcaption|details|menu|summary)";

struct Patterns {
    double_br: Regex,
    block_open: Regex,
    block_close: Regex,
    param: Regex,
    embed_close: Regex,
    paragraph_split: Regex,
    empty_paragraph: Regex,
    unclosed_container: Regex,
    wrapped_block: Regex,
    wrapped_li: Regex,
    blockquote_open: Regex,
    leading_block: Regex,
    trailing_block: Regex,
    script_or_style: Regex,
    bare_newline: Regex,
    block_then_br: Regex,
    br_then_block: Regex,
    newline_before_close: Regex,
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| {
    let re = |pattern: String| Regex::new(&pattern).expect("static reflow pattern");
    Patterns {
        double_br: re(r"<br />\s*<br />".into()),
        block_open: re(format!(r"(<{ALL_BLOCKS}[^>]*>)")),
        block_close: re(format!(r"(</{ALL_BLOCKS}>)")),
        param: re(r"\s*<param([^>]*)>\s*".into()),
        embed_close: re(r"\s*</embed>\s*".into()),
        paragraph_split: re(r"\n\s*\n".into()),
        empty_paragraph: re(r"<p>\s*</p>".into()),
        unclosed_container: re(r"<p>([^<]+)</(div|address|form)>".into()),
        wrapped_block: re(format!(r"<p>\s*(</?{ALL_BLOCKS}[^>]*>)\s*</p>")),
        wrapped_li: re(r"<p>(<li.+?)</p>".into()),
        blockquote_open: re(r"(?i)<p><blockquote([^>]*)>".into()),
        leading_block: re(format!(r"<p>\s*(</?{ALL_BLOCKS}[^>]*>)")),
        trailing_block: re(format!(r"(</?{ALL_BLOCKS}[^>]*>)\s*</p>")),
        script_or_style: re(r"(?s)<script.*?</script>|<style.*?</style>".into()),
        bare_newline: re(r"\s*\n".into()),
        block_then_br: re(format!(r"(</?{ALL_BLOCKS}[^>]*>)\s*<br />")),
        br_then_block: re(r"<br />(\s*</?(?:p|li|div|dl|dd|dt|th|pre|td|ul|ol)[^>]*>)".into()),
        newline_before_close: re(r"\n</p>$".into()),
    }
});

/// Marker that keeps newlines inside `<script>`/`<style>` out of `<br />` conversion.
const PRESERVE_NEWLINE: &str = "<WPPreserveNewline />";

/// Reflow loosely formatted text into paragraph markup.
///
/// When `br` is set, single newlines left inside paragraphs become `<br />`.
pub fn wpautop(text: &str, br: bool) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let p = &*PATTERNS;
    let mut pee = format!("{text}\n");

    let pre_tags = extract_pre_blocks(&mut pee);

    pee = p.double_br.replace_all(&pee, "\n\n").into_owned();
    pee = p.block_open.replace_all(&pee, "\n$1").into_owned();
    pee = p.block_close.replace_all(&pee, "$1\n\n").into_owned();
    pee = pee.replace("\r\n", "\n").replace('\r', "\n");

    if pee.contains("<object") {
        pee = p.param.replace_all(&pee, "<param$1>").into_owned();
        pee = p.embed_close.replace_all(&pee, "</embed>").into_owned();
    }

    let mut chunks: Vec<&str> = p.paragraph_split.split(&pee).collect();
    while chunks.last().is_some_and(|c| c.is_empty()) {
        chunks.pop();
    }
    pee = chunks
        .iter()
        .map(|chunk| format!("<p>{}</p>\n", chunk.strip_suffix('\n').unwrap_or(chunk)))
        .collect();

    pee = p.empty_paragraph.replace_all(&pee, "").into_owned();
    pee = p
        .unclosed_container
        .replace_all(&pee, "<p>$1</p></$2>")
        .into_owned();
    pee = p.wrapped_block.replace_all(&pee, "$1").into_owned();
    pee = p.wrapped_li.replace_all(&pee, "$1").into_owned();
    pee = p
        .blockquote_open
        .replace_all(&pee, "<blockquote$1><p>")
        .into_owned();
    pee = pee.replace("</blockquote></p>", "</p></blockquote>");
    pee = p.leading_block.replace_all(&pee, "$1").into_owned();
    pee = p.trailing_block.replace_all(&pee, "$1").into_owned();

    if br {
        pee = p
            .script_or_style
            .replace_all(&pee, |caps: &Captures| caps[0].replace('\n', PRESERVE_NEWLINE))
            .into_owned();
        pee = convert_line_breaks(&pee);
        pee = pee.replace(PRESERVE_NEWLINE, "\n");
    }

    pee = p.block_then_br.replace_all(&pee, "$1").into_owned();
    pee = p.br_then_block.replace_all(&pee, "$1").into_owned();
    pee = p.newline_before_close.replace_all(&pee, "</p>").into_owned();

    for (placeholder, original) in &pre_tags {
        pee = pee.replace(placeholder, original);
    }

    pee
}

/// Swap every `<pre>...</pre>` span for a placeholder and return the originals.
fn extract_pre_blocks(pee: &mut String) -> Vec<(String, String)> {
    let mut pre_tags = Vec::new();
    if !pee.contains("<pre") {
        return pre_tags;
    }

    let mut parts: Vec<&str> = pee.split("</pre>").collect();
    while parts.last().is_some_and(|part| part.is_empty()) {
        parts.pop();
    }
    let Some(last) = parts.pop() else {
        return pre_tags;
    };

    let mut rebuilt = String::with_capacity(pee.len());
    for (i, part) in parts.iter().enumerate() {
        match part.find("<pre") {
            Some(start) => {
                let placeholder = format!("<pre wp-pre-tag-{i}></pre>");
                pre_tags.push((placeholder.clone(), format!("{}</pre>", &part[start..])));
                rebuilt.push_str(&part[..start]);
                rebuilt.push_str(&placeholder);
            }
            None => rebuilt.push_str(part),
        }
    }
    rebuilt.push_str(last);

    *pee = rebuilt;
    pre_tags
}

/// Turn newlines into `<br />\n` unless one already precedes them.
fn convert_line_breaks(pee: &str) -> String {
    let p = &*PATTERNS;
    let mut out = String::with_capacity(pee.len() + 64);
    let mut last = 0;

    for m in p.bare_newline.find_iter(pee) {
        out.push_str(&pee[last..m.start()]);
        if pee[..m.start()].ends_with("<br />") {
            out.push_str(m.as_str());
        } else {
            out.push_str("<br />\n");
        }
        last = m.end();
    }
    out.push_str(&pee[last..]);
    out
}
