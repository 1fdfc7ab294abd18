//! Response text normalization and markdown rendering.
//!
//! The generation endpoint returns markdown with inconsistent line endings
//! and sometimes literal `\n` escape sequences instead of real line breaks.
//! `normalize` cleans those up, `render_markdown` turns the result into
//! styled lines for the response panel.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Structural classification of rendered markdown content.
///
/// The response panel styles text exclusively through [`style_for`], so the
/// visual mapping lives in one table instead of per-element callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MdTag {
    H1,
    H2,
    H3,
    Paragraph,
    ListBullet,
    ListNumber,
    CodeBlock,
    CodeInline,
    CodeFence,
    Emphasis,
    Strong,
    BlockQuote,
    Rule,
}

/// Maps a structural tag to its terminal style.
pub fn style_for(tag: MdTag) -> Style {
    match tag {
        MdTag::H1 => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        MdTag::H2 => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        MdTag::H3 => Style::default().fg(Color::Cyan),
        MdTag::Paragraph => Style::default(),
        MdTag::ListBullet | MdTag::ListNumber => Style::default().fg(Color::Green),
        MdTag::CodeBlock => Style::default().fg(Color::Yellow),
        MdTag::CodeInline => Style::default().fg(Color::Yellow).bg(Color::DarkGray),
        MdTag::CodeFence | MdTag::Rule => Style::default().fg(Color::DarkGray),
        MdTag::Emphasis => Style::default().add_modifier(Modifier::ITALIC),
        MdTag::Strong => Style::default().add_modifier(Modifier::BOLD),
        MdTag::BlockQuote => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    }
}

/// Normalizes raw answer text before structural parsing.
///
/// Replaces literal `\n` escape sequences with real line breaks and CRLF
/// pairs with a single LF. Nothing else is touched, and a second pass is a
/// no-op since neither sequence survives the first.
pub fn normalize(raw: &str) -> String {
    raw.replace("\\n", "\n").replace("\r\n", "\n")
}

/// Renders normalized markdown into styled lines.
///
/// Headings get three distinct weights, lists become bulleted/numbered
/// blocks indented by nesting depth, fenced code keeps its exact text
/// between dim fence markers. Wrapping is left to the paragraph widget.
pub fn render_markdown(text: &str) -> Vec<Line<'static>> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut doc = DocBuilder::new();
    for event in Parser::new(text) {
        doc.process_event(event);
    }
    doc.finish()
}

#[derive(Debug, Clone)]
struct ListLevel {
    /// None for unordered, Some(n) for ordered starting at n.
    ordered: Option<u64>,
    current_item: u64,
}

struct DocBuilder {
    lines: Vec<Line<'static>>,
    /// Spans of the block currently being collected.
    current: Vec<Span<'static>>,
    /// Inline style nesting; the top entry styles incoming text.
    tag_stack: Vec<MdTag>,
    list_stack: Vec<ListLevel>,
    code_lang: Option<String>,
}

impl DocBuilder {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            current: Vec::new(),
            tag_stack: vec![MdTag::Paragraph],
            list_stack: Vec::new(),
            code_lang: None,
        }
    }

    fn current_tag(&self) -> MdTag {
        self.tag_stack.last().copied().unwrap_or(MdTag::Paragraph)
    }

    fn push_tag(&mut self, tag: MdTag) {
        self.tag_stack.push(tag);
    }

    fn pop_tag(&mut self) {
        if self.tag_stack.len() > 1 {
            self.tag_stack.pop();
        }
    }

    fn process_event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start_tag(&tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.add_text(&text),
            Event::Code(code) => {
                self.current
                    .push(Span::styled(code.to_string(), style_for(MdTag::CodeInline)));
            }
            Event::SoftBreak => {
                self.current
                    .push(Span::styled(" ".to_string(), style_for(self.current_tag())));
            }
            Event::HardBreak => self.flush_block(),
            Event::Rule => {
                self.flush_block();
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(40),
                    style_for(MdTag::Rule),
                )));
            }
            // HTML is skipped rather than echoed into the terminal.
            Event::Html(_) | Event::InlineHtml(_) => {}
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: &Tag) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_block();
                let tag = match level {
                    HeadingLevel::H1 => MdTag::H1,
                    HeadingLevel::H2 => MdTag::H2,
                    _ => MdTag::H3,
                };
                self.push_tag(tag);
            }
            Tag::CodeBlock(kind) => {
                self.flush_block();
                self.code_lang = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    _ => None,
                };
                self.push_tag(MdTag::CodeBlock);
            }
            Tag::List(start) => {
                // A list opening inside an item closes that item's text,
                // which still needs its marker
                if self.list_stack.is_empty() {
                    self.flush_block();
                } else {
                    self.flush_list_item();
                }
                self.list_stack.push(ListLevel {
                    ordered: *start,
                    current_item: start.unwrap_or(1),
                });
            }
            Tag::Item => self.flush_block(),
            Tag::BlockQuote(_) => {
                self.flush_block();
                self.push_tag(MdTag::BlockQuote);
            }
            Tag::Emphasis => self.push_tag(MdTag::Emphasis),
            Tag::Strong => self.push_tag(MdTag::Strong),
            Tag::Paragraph => {}
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                // Loose list items wrap their text in paragraphs; those
                // still flush with a marker, and without a trailing blank
                if self.list_stack.is_empty() {
                    self.flush_block();
                    self.lines.push(Line::default());
                } else {
                    self.flush_list_item();
                }
            }
            TagEnd::Heading(_) => {
                self.flush_block();
                self.pop_tag();
                self.lines.push(Line::default());
            }
            TagEnd::CodeBlock => {
                self.flush_code_block();
                self.pop_tag();
                self.lines.push(Line::default());
            }
            TagEnd::List(_) => {
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.lines.push(Line::default());
                }
            }
            TagEnd::Item => {
                self.flush_list_item();
                if let Some(level) = self.list_stack.last_mut() {
                    level.current_item += 1;
                }
            }
            TagEnd::BlockQuote(_) => {
                self.flush_block();
                self.pop_tag();
            }
            TagEnd::Emphasis | TagEnd::Strong => self.pop_tag(),
            _ => {}
        }
    }

    fn add_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.current
            .push(Span::styled(text.to_string(), style_for(self.current_tag())));
    }

    fn flush_block(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    /// Emits the collected code block text verbatim between fence markers,
    /// one styled line per source line.
    fn flush_code_block(&mut self) {
        let spans = std::mem::take(&mut self.current);
        let full_text: String = spans.iter().map(|s| s.content.as_ref()).collect();

        let fence = match self.code_lang.take() {
            Some(lang) => format!("```{}", lang),
            None => "```".to_string(),
        };
        self.lines
            .push(Line::from(Span::styled(fence, style_for(MdTag::CodeFence))));

        for line in full_text.trim_end_matches('\n').split('\n') {
            self.lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(line.to_string(), style_for(MdTag::CodeBlock)),
            ]));
        }

        self.lines.push(Line::from(Span::styled(
            "```".to_string(),
            style_for(MdTag::CodeFence),
        )));
    }

    fn flush_list_item(&mut self) {
        if self.current.is_empty() {
            return;
        }

        let (marker, marker_tag) = match self.list_stack.last() {
            Some(level) if level.ordered.is_some() => {
                (format!("{}. ", level.current_item), MdTag::ListNumber)
            }
            _ => ("• ".to_string(), MdTag::ListBullet),
        };
        let indent = "  ".repeat(self.list_stack.len().saturating_sub(1));

        let mut spans = vec![
            Span::raw(indent),
            Span::styled(marker, style_for(marker_tag)),
        ];
        spans.append(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush_block();
        while self
            .lines
            .last()
            .map(|l| l.spans.is_empty())
            .unwrap_or(false)
        {
            self.lines.pop();
        }
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn normalize_replaces_escaped_newlines() {
        assert_eq!(normalize("a\\nb"), "a\nb");
    }

    #[test]
    fn normalize_replaces_crlf() {
        assert_eq!(normalize("a\r\nb"), "a\nb");
    }

    #[test]
    fn normalize_leaves_real_newlines_alone() {
        assert_eq!(normalize("a\nb"), "a\nb");
    }

    #[test]
    fn normalize_is_idempotent() {
        for input in ["a\\nb", "a\r\nb", "a\nb", "", "plain", "x\\ny\r\nz\n"] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn normalize_does_not_trim_or_collapse() {
        assert_eq!(normalize("  a   b  "), "  a   b  ");
    }

    #[test]
    fn renders_single_paragraph() {
        let lines = render_markdown("Recursion is...");
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "Recursion is...");
    }

    #[test]
    fn renders_heading_then_bullet_list() {
        let lines = render_markdown("# Title\n\n- item1\n- item2");
        let texts: Vec<String> = lines.iter().map(line_text).collect();

        assert_eq!(texts[0], "Title");
        assert_eq!(lines[0].spans[0].style, style_for(MdTag::H1));

        let bullets: Vec<&String> = texts.iter().filter(|t| t.starts_with("• ")).collect();
        assert_eq!(bullets.len(), 2);
        assert_eq!(bullets[0].as_str(), "• item1");
        assert_eq!(bullets[1].as_str(), "• item2");
    }

    #[test]
    fn heading_levels_get_distinct_styles() {
        let h1 = style_for(MdTag::H1);
        let h2 = style_for(MdTag::H2);
        let h3 = style_for(MdTag::H3);
        assert_ne!(h1, h2);
        assert_ne!(h2, h3);
        assert_ne!(h1, h3);
    }

    #[test]
    fn renders_ordered_list_with_numbers() {
        let lines = render_markdown("1. first\n2. second");
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert!(texts.iter().any(|t| t == "1. first"));
        assert!(texts.iter().any(|t| t == "2. second"));
    }

    #[test]
    fn loose_list_items_keep_markers() {
        let lines = render_markdown("- item1\n\n- item2");
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert!(texts.iter().any(|t| t == "• item1"));
        assert!(texts.iter().any(|t| t == "• item2"));
    }

    #[test]
    fn nested_list_items_are_indented() {
        let lines = render_markdown("- outer\n  - inner");
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert!(texts.iter().any(|t| t == "• outer"));
        assert!(texts.iter().any(|t| t == "  • inner"));
    }

    #[test]
    fn renders_fenced_code_block_with_language() {
        let lines = render_markdown("```rust\nfn main() {}\n```");
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts[0], "```rust");
        assert_eq!(texts[1], "  fn main() {}");
        assert_eq!(texts[2], "```");

        // Code text keeps the code block style, not paragraph style
        assert_eq!(lines[1].spans[1].style, style_for(MdTag::CodeBlock));
    }

    #[test]
    fn renders_inline_code_as_styled_span() {
        let lines = render_markdown("use `cargo test` here");
        let code_span = lines[0]
            .spans
            .iter()
            .find(|s| s.content == "cargo test")
            .expect("inline code span");
        assert_eq!(code_span.style, style_for(MdTag::CodeInline));
    }

    #[test]
    fn same_input_renders_same_document() {
        let text = "# A\n\npara with `code`\n\n- x\n- y";
        assert_eq!(render_markdown(text), render_markdown(text));
    }

    #[test]
    fn empty_input_renders_empty_document() {
        assert!(render_markdown("").is_empty());
    }

    #[test]
    fn html_is_not_echoed() {
        let lines = render_markdown("before\n\n<script>alert(1)</script>\n\nafter");
        let all: String = lines.iter().map(|l| line_text(l)).collect();
        assert!(!all.contains("<script>"));
    }
}
