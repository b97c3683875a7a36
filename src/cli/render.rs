//! Terminal rendering of a view: list panel, detail panel, inline errors.
//!
//! Everything renders into a `String` so the shell decides when to print and
//! tests can inspect the output.

use std::fmt::Write as _;

use colored::{ColoredString, Colorize};
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

use crate::config::schema::DisplayConfig;
use crate::gateway::wire::TodayData;
use crate::model::preview::{self, excerpt};
use crate::model::{CardType, Record};
use crate::view::{DetailPhase, ViewProfile, ViewState};

/// Limits applied while rendering.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub preview_chars: usize,
    pub list_limit: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from(&DisplayConfig::default())
    }
}

impl From<&DisplayConfig> for RenderOptions {
    fn from(display: &DisplayConfig) -> Self {
        Self {
            preview_chars: display.preview_chars,
            list_limit: display.list_limit,
        }
    }
}

/// Render the whole view: header, list panel, then the detail panel.
pub fn render_view(
    profile: &ViewProfile,
    state: &ViewState,
    subtitle: Option<&str>,
    opts: RenderOptions,
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", profile.title.bold().cyan());
    if let Some(subtitle) = subtitle {
        let _ = writeln!(out, "{}", subtitle.dimmed());
    }
    let _ = writeln!(out, "{}", "=".repeat(50));

    out.push_str(&render_list(profile, state, opts));

    if let Some(error) = &state.error {
        let _ = writeln!(out, "  {} {}", "✗".red().bold(), error.red());
    }

    let detail = render_detail(state);
    if !detail.is_empty() {
        let _ = writeln!(out);
        out.push_str(&detail);
    }

    out
}

/// The list panel.
pub fn render_list(profile: &ViewProfile, state: &ViewState, opts: RenderOptions) -> String {
    let mut out = String::new();

    if state.is_list_loading {
        let _ = writeln!(out, "  {}", "Loading…".dimmed());
        return out;
    }

    if state.records.is_empty() {
        if state.error.is_none() {
            let _ = writeln!(out, "  {}", profile.empty_message.yellow());
        }
        return out;
    }

    for record in state.records.iter().take(opts.list_limit) {
        let selected = state.selection.as_deref() == Some(record.identity.as_str());
        let marker = if selected { "▸".green().bold() } else { " ".normal() };
        let name = if selected {
            record.display_name.bold()
        } else {
            record.display_name.normal()
        };

        let _ = match badge(record) {
            Some(badge) => writeln!(out, "{marker} [{badge}] {name}  {}", record.identity.dimmed()),
            None => writeln!(out, "{marker} {name}  {}", record.identity.dimmed()),
        };

        let preview = excerpt(&record.preview_text, opts.preview_chars);
        if !preview.is_empty() {
            let _ = writeln!(out, "    {}", preview.dimmed());
        }
    }

    let hidden = state.records.len().saturating_sub(opts.list_limit);
    if hidden > 0 {
        let _ = writeln!(out, "  {}", format!("… {hidden} more").dimmed());
    }

    out
}

/// The detail panel, empty when nothing is selected.
pub fn render_detail(state: &ViewState) -> String {
    let mut out = String::new();

    match state.detail_phase() {
        DetailPhase::NoSelection => {}
        DetailPhase::DetailLoading => {
            let id = state.selection.as_deref().unwrap_or_default();
            let _ = writeln!(out, "{} {}", id.bold(), "Loading…".dimmed());
        }
        DetailPhase::DetailReady => {
            if let Some(record) = state.selected_record() {
                let _ = writeln!(out, "{}", record.display_name.bold().cyan());
                let mut meta = Vec::new();
                if let Some(date) = &record.date {
                    meta.push(date.clone());
                }
                if let Some(category) = &record.category {
                    meta.push(category.clone());
                }
                if !meta.is_empty() {
                    let _ = writeln!(out, "{}", meta.join(" · ").dimmed());
                }
                let _ = writeln!(out, "{}", "-".repeat(50));
                out.push_str(&render_markdown(record.full_content.as_deref().unwrap_or_default()));
            }
        }
    }

    out
}

/// Render Markdown for the terminal.
///
/// Headings are bold (level 1 and 2 also cyan), quotes get a dimmed bar,
/// list items a bullet or number, code blocks are indented, and table rows
/// are joined with `│`. Link targets follow the link text in parentheses.
pub fn render_markdown(markdown: &str) -> String {
    let source = preview::resolve_wiki_links(markdown);
    let mut term = Terminal::default();

    for event in Parser::new_ext(&source, preview::markdown_options()) {
        term.event(event);
    }
    term.finish()
}

/// Line-oriented writer driven by parser events.
#[derive(Default)]
struct Terminal {
    out: String,
    line: String,
    /// `None` for bullets, `Some(n)` for the next number of an ordered list.
    lists: Vec<Option<u64>>,
    quote_depth: usize,
    heading: Option<HeadingLevel>,
    strong: bool,
    emphasis: bool,
    in_code_block: bool,
    in_metadata: bool,
    links: Vec<String>,
    cells: Vec<String>,
}

impl Terminal {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(_) if self.in_metadata => {}
            Event::Text(text) if self.in_code_block => {
                for line in text.lines() {
                    self.line.push_str("    ");
                    self.line.push_str(&line.dimmed().to_string());
                    self.flush_line();
                }
            }
            Event::Text(text) => {
                let styled = self.style(&text);
                self.line.push_str(&styled.to_string());
            }
            Event::Code(code) => self.line.push_str(&code.yellow().to_string()),
            Event::Html(html) | Event::InlineHtml(html) => self.line.push_str(&html),
            Event::SoftBreak => self.flush_line(),
            Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.line.push_str(&"-".repeat(40).dimmed().to_string());
                self.flush_block();
            }
            Event::TaskListMarker(done) => self.line.push_str(if done { "[x] " } else { "[ ] " }),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => self.heading = Some(level),
            Tag::BlockQuote { .. } => self.quote_depth += 1,
            Tag::CodeBlock(_) => self.in_code_block = true,
            Tag::List(first) => {
                self.flush_line();
                self.lists.push(first);
            }
            Tag::Item => {
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.line.push_str(&marker);
            }
            Tag::Strong => self.strong = true,
            Tag::Emphasis => self.emphasis = true,
            Tag::Link { dest_url, .. } => self.links.push(dest_url.to_string()),
            Tag::TableCell => self.cells.push(String::new()),
            Tag::MetadataBlock { .. } => self.in_metadata = true,
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::Heading(_) => {
                self.heading = None;
                self.flush_block();
            }
            TagEnd::BlockQuote { .. } => self.quote_depth = self.quote_depth.saturating_sub(1),
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.blank_line();
            }
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Item => self.flush_line(),
            TagEnd::Strong => self.strong = false,
            TagEnd::Emphasis => self.emphasis = false,
            TagEnd::Link => {
                if let Some(url) = self.links.pop() {
                    self.line.push_str(&format!(" ({url})").dimmed().to_string());
                }
            }
            TagEnd::TableCell => {
                let cell = std::mem::take(&mut self.line);
                if let Some(last) = self.cells.last_mut() {
                    *last = cell.trim().to_string();
                }
            }
            TagEnd::TableHead | TagEnd::TableRow => {
                let separator = " │ ".dimmed().to_string();
                self.line = std::mem::take(&mut self.cells).join(separator.as_str());
                self.flush_line();
            }
            TagEnd::Table => self.blank_line(),
            TagEnd::MetadataBlock { .. } => self.in_metadata = false,
            _ => {}
        }
    }

    fn style(&self, text: &str) -> ColoredString {
        let mut styled = match self.heading {
            Some(HeadingLevel::H1 | HeadingLevel::H2) => text.bold().cyan(),
            Some(_) => text.bold(),
            None => text.normal(),
        };
        if self.strong {
            styled = styled.bold();
        }
        if self.emphasis {
            styled = styled.italic();
        }
        if self.quote_depth > 0 {
            styled = styled.dimmed();
        }
        styled
    }

    /// Emit the pending line with quote bars and list indentation.
    fn flush_line(&mut self) {
        if self.line.is_empty() {
            return;
        }
        let quote = "│ ".repeat(self.quote_depth);
        let indent = "  ".repeat(self.lists.len().saturating_sub(1));
        self.out.push_str(&quote.dimmed().to_string());
        self.out.push_str(&indent);
        self.out.push_str(&std::mem::take(&mut self.line));
        self.out.push('\n');
    }

    fn flush_block(&mut self) {
        self.flush_line();
        if self.lists.is_empty() {
            self.blank_line();
        }
    }

    fn blank_line(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn finish(mut self) -> String {
        self.flush_line();
        while self.out.ends_with("\n\n") {
            self.out.pop();
        }
        self.out
    }
}

/// Today's sounding, shown above the navigation view.
pub fn render_sounding(today: &TodayData) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Today's Sounding".bold().cyan());
    let _ = writeln!(out, "{}", today.date.dimmed());
    match today.sounding.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(sounding) => out.push_str(&render_markdown(sounding)),
        None => {
            let _ = writeln!(out, "  {}", "No sounding for today.".yellow());
        }
    }
    out
}

fn badge(record: &Record) -> Option<&'static str> {
    record
        .category
        .as_deref()
        .and_then(CardType::parse)
        .map(CardType::badge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::ViewKind;

    fn state(records: Vec<Record>, selection: Option<&str>) -> ViewState {
        ViewState {
            records,
            selection: selection.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn empty_list_shows_profile_message() {
        let profile = ViewKind::Harbor.profile();
        let out = render_list(&profile, &ViewState::default(), RenderOptions::default());
        assert!(out.contains("No files in this category."));
    }

    #[test]
    fn loading_replaces_list() {
        let profile = ViewKind::Chart.profile();
        let mut view = state(vec![Record::new("2024-05-01", "May 1")], None);
        view.is_list_loading = true;
        let out = render_list(&profile, &view, RenderOptions::default());
        assert!(out.contains("Loading…"));
        assert!(!out.contains("May 1"));
    }

    #[test]
    fn list_limit_hides_overflow() {
        let profile = ViewKind::Template.profile();
        let records = (0..5)
            .map(|i| Record::new(format!("t{i}.md"), format!("t{i}")))
            .collect();
        let opts = RenderOptions {
            preview_chars: 20,
            list_limit: 3,
        };
        let out = render_list(&profile, &state(records, None), opts);
        assert!(out.contains("t2.md"));
        assert!(!out.contains("t3.md"));
        assert!(out.contains("2 more"));
    }

    #[test]
    fn card_badges_follow_type() {
        let profile = ViewKind::Logbook.profile();
        let records = vec![
            Record::new("2024-05-01/a.md", "a").with_category("insights"),
            Record::new("2024-05-01/b.md", "b").with_category("fleeting"),
        ];
        let out = render_list(&profile, &state(records, None), RenderOptions::default());
        assert!(out.contains("[I]"));
        assert!(out.contains("[F]"));
    }

    #[test]
    fn multiline_preview_renders_as_one_indented_line() {
        let profile = ViewKind::Logbook.profile();
        let records = vec![
            Record::new("2024-05-01/a.md", "a").with_preview("# Title\n\nfirst para\n- bullet"),
        ];
        let out = render_list(&profile, &state(records, None), RenderOptions::default());
        assert_eq!(out.lines().count(), 2);
        assert!(out.contains("Title first para bullet"));
        assert!(!out.contains('#'));
    }

    #[test]
    fn markdown_is_rendered_from_parsed_blocks() {
        colored::control::set_override(false);
        let md = "Weekly Review\n=====\n\n```rust\nlet x = 1;\n```\n\n- one\n- [x] two\n\n\
                  | a | b |\n|---|---|\n| c | d |\n\nSee [docs](http://x).";
        assert_eq!(
            render_markdown(md),
            "Weekly Review\n\n    let x = 1;\n\n• one\n• [x] two\n\na │ b\nc │ d\n\nSee docs (http://x).\n"
        );
        assert_eq!(render_markdown("> calm seas"), "│ calm seas\n");
        assert_eq!(render_markdown("1. first\n2. second"), "1. first\n2. second\n");
    }

    #[test]
    fn detail_shows_selected_body() {
        let records = vec![Record::new("a.md", "Alpha").with_content("# Alpha\n\nbody text")];
        let out = render_detail(&state(records, Some("a.md")));
        assert!(out.contains("Alpha"));
        assert!(out.contains("body text"));
    }

    #[test]
    fn error_is_rendered_inline() {
        let profile = ViewKind::Chart.profile();
        let mut view = ViewState::default();
        view.error = Some("vault offline".to_string());
        let out = render_view(&profile, &view, None, RenderOptions::default());
        assert!(out.contains("vault offline"));
        assert!(!out.contains("No soundings yet."));
    }

    #[test]
    fn missing_sounding_has_placeholder() {
        let today: TodayData = serde_json::from_value(serde_json::json!({
            "date": "2024-05-01",
            "cards": {"insights": [], "fleeting": []}
        }))
        .unwrap();
        assert!(render_sounding(&today).contains("No sounding for today."));
    }
}
