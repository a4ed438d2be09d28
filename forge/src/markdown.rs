//! Markdown helpers shared by the wizard and the exporters
//!
//! Model output is opaque Markdown. These helpers give it just enough
//! structure: section titles for validation, HTML for export, and a plain
//! text reduction for comparisons.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html};
use tracing::trace;

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Render Markdown to an HTML fragment
///
/// Raw HTML in the source is emitted as escaped text, so model output can
/// never open or close elements of the surrounding document.
pub fn to_html(markdown: &str) -> String {
    trace!(len = markdown.len(), "to_html: called");
    let parser = Parser::new_ext(markdown, options()).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Reduce Markdown to its visible text, one line per block
///
/// Matches what [`to_html`] shows: raw HTML counts as text, image alt text
/// does not.
pub fn to_plain_text(markdown: &str) -> String {
    trace!(len = markdown.len(), "to_plain_text: called");
    let mut out = String::new();
    let mut image_depth = 0usize;
    for event in Parser::new_ext(markdown, options()) {
        match event {
            Event::Start(Tag::Image { .. }) => image_depth += 1,
            Event::End(TagEnd::Image) => image_depth = image_depth.saturating_sub(1),
            _ if image_depth > 0 => {}
            Event::Text(text) | Event::Code(text) | Event::Html(text) | Event::InlineHtml(text) => out.push_str(&text),
            Event::SoftBreak => out.push(' '),
            Event::HardBreak | Event::Rule => out.push('\n'),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::Item
                | TagEnd::CodeBlock
                | TagEnd::TableRow
                | TagEnd::TableHead,
            ) => out.push('\n'),
            Event::End(TagEnd::TableCell) => out.push(' '),
            _ => {}
        }
    }
    out.trim_end().to_string()
}

/// Titles that open a section
///
/// Headings count, and so does bold text that starts a paragraph or list
/// item (`**Key Features**`), since models use both styles.
pub fn section_titles(markdown: &str) -> Vec<String> {
    let mut titles = Vec::new();
    let mut heading: Option<String> = None;
    let mut strong: Option<String> = None;
    let mut at_block_start = false;

    for event in Parser::new_ext(markdown, options()) {
        match event {
            Event::Start(Tag::Heading { .. }) => heading = Some(String::new()),
            Event::End(TagEnd::Heading(_)) => {
                if let Some(text) = heading.take() {
                    titles.push(text.trim().to_string());
                }
            }
            Event::Start(Tag::Paragraph | Tag::Item) => at_block_start = true,
            Event::Start(Tag::Strong) if heading.is_none() && at_block_start => strong = Some(String::new()),
            Event::End(TagEnd::Strong) => {
                if let Some(text) = strong.take() {
                    titles.push(text.trim().to_string());
                }
                at_block_start = false;
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(h) = heading.as_mut() {
                    h.push_str(&text);
                } else if let Some(s) = strong.as_mut() {
                    s.push_str(&text);
                } else if !text.trim().is_empty() {
                    at_block_start = false;
                }
            }
            _ => {}
        }
    }
    titles
}

/// Whether some section title mentions `title` (case-insensitive)
pub fn has_section(markdown: &str, title: &str) -> bool {
    let wanted = title.to_lowercase();
    section_titles(markdown)
        .iter()
        .any(|t| t.to_lowercase().contains(&wanted))
}
