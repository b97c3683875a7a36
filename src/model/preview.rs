//! Preview derivation: short plain-text excerpts of Markdown bodies.
//!
//! List entries arrive with the first few hundred characters of the note as
//! their `preview`, and detail responses only carry the body. Both go through
//! [`excerpt`]: the Markdown is parsed with `pulldown-cmark`, only the text
//! of each block is kept (headings, paragraphs, list items, code, table
//! cells), front matter is skipped, whitespace is collapsed and the result is
//! cut at a char boundary.

use std::borrow::Cow;
use std::sync::LazyLock;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use regex::Regex;

/// Default excerpt length in characters.
pub const DEFAULT_PREVIEW_CHARS: usize = 200;

/// Obsidian wiki links: `[[target]]` or `[[target|alias]]`.
static WIKI_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\]|]+)(?:\|([^\]]+))?\]\]").expect("wiki link regex must compile")
});

/// Parser options shared by excerpts and terminal rendering.
pub fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS
}

/// Replace wiki links with their alias (or target) so they read as text.
pub fn resolve_wiki_links(markdown: &str) -> Cow<'_, str> {
    WIKI_LINK_RE.replace_all(markdown, |caps: &regex::Captures<'_>| {
        caps.get(2)
            .or_else(|| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Plain-text excerpt of `markdown`, at most `max_chars` characters.
///
/// An ellipsis is appended when the text had to be cut; it counts toward
/// the limit.
pub fn excerpt(markdown: &str, max_chars: usize) -> String {
    let text = text_blocks(markdown).join(" ");
    truncate_chars(&text, max_chars)
}

/// Text of the first non-empty block (usually the title heading).
///
/// Used as the one-line description of harbor files.
pub fn first_line(markdown: &str) -> String {
    text_blocks(markdown).into_iter().next().unwrap_or_default()
}

/// Plain text of every block, in document order, whitespace collapsed.
fn text_blocks(markdown: &str) -> Vec<String> {
    let source = resolve_wiki_links(markdown);
    let mut blocks = Vec::new();
    let mut current = String::new();
    let mut in_metadata = false;

    let mut flush = |current: &mut String| {
        let block = current.split_whitespace().collect::<Vec<_>>().join(" ");
        if !block.is_empty() {
            blocks.push(block);
        }
        current.clear();
    };

    for event in Parser::new_ext(&source, markdown_options()) {
        match event {
            Event::Start(Tag::MetadataBlock(_)) => in_metadata = true,
            Event::End(TagEnd::MetadataBlock(_)) => in_metadata = false,
            Event::Text(text) | Event::Code(text) if !in_metadata => current.push_str(&text),
            Event::SoftBreak | Event::HardBreak => current.push(' '),
            Event::Start(Tag::Item) | Event::Start(Tag::List(_)) => flush(&mut current),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::CodeBlock
                | TagEnd::TableCell
                | TagEnd::Item,
            ) => flush(&mut current),
            _ => {}
        }
    }
    flush(&mut current);

    blocks
}

/// Cut `text` to `max_chars` characters, appending `…` when shortened.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }

    let kept: String = text.chars().take(max_chars - 1).collect();
    format!("{}…", kept.trim_end())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
