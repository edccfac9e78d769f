//! Plain-text extraction from markdown bodies
//!
//! Rendering to HTML belongs to the site generator. The store only needs
//! enough of the markdown structure to build excerpts and reading times.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

/// Marker separating a post's excerpt from the rest of the body
pub const MORE_MARKER: &str = "<!-- more -->";

fn options() -> Options {
    // No YAML metadata blocks: front-matter is split off before we get here
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Split the excerpt (before `<!-- more -->`) from the body
pub fn split_excerpt(content: &str) -> Option<&str> {
    content
        .find(MORE_MARKER)
        .map(|pos| content[..pos].trim())
        .filter(|excerpt| !excerpt.is_empty())
}

/// Flatten markdown to prose, skipping fenced and indented code blocks
pub fn plain_text(markdown: &str) -> String {
    let mut out = String::new();
    let mut in_code_block = false;

    for event in Parser::new_ext(markdown, options()) {
        match event {
            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(TagEnd::CodeBlock) => in_code_block = false,
            Event::Text(text) | Event::Code(text) if !in_code_block => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item) => {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }

    out.trim().to_string()
}

/// Text of the first paragraph, if the body has one
pub fn first_paragraph(markdown: &str) -> Option<String> {
    let mut text = String::new();
    let mut in_paragraph = false;

    for event in Parser::new_ext(markdown, options()) {
        match event {
            Event::Start(Tag::Paragraph) => in_paragraph = true,
            Event::End(TagEnd::Paragraph) if in_paragraph => {
                let text = text.trim();
                return (!text.is_empty()).then(|| text.to_string());
            }
            Event::Text(t) | Event::Code(t) if in_paragraph => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak if in_paragraph => text.push(' '),
            _ => {}
        }
    }

    None
}

/// Headings as (level, text), in document order
pub fn headings(markdown: &str) -> Vec<(u8, String)> {
    let mut result = Vec::new();
    let mut current: Option<(u8, String)> = None;

    for event in Parser::new_ext(markdown, options()) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some((level as u8, String::new()));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(heading) = current.take() {
                    result.push(heading);
                }
            }
            Event::Text(t) | Event::Code(t) => {
                if let Some((_, text)) = current.as_mut() {
                    text.push_str(&t);
                }
            }
            _ => {}
        }
    }

    result
}

/// Number of words of prose
pub fn word_count(markdown: &str) -> usize {
    plain_text(markdown).split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_excerpt() {
        let content = "This is excerpt.\n<!-- more -->\nThis is more content.";
        assert_eq!(split_excerpt(content), Some("This is excerpt."));
        assert_eq!(split_excerpt("No marker here."), None);
        assert_eq!(split_excerpt("\n<!-- more -->\nrest"), None);
    }

    #[test]
    fn test_plain_text_skips_code_blocks() {
        let md = "# Title\n\nUse `std::move` here.\n\n```cpp\nint x = 0;\n```\n\nDone.";
        let text = plain_text(md);
        assert!(text.contains("Title"));
        assert!(text.contains("Use std::move here."));
        assert!(!text.contains("int x"));
        assert!(text.contains("Done."));
    }

    #[test]
    fn test_first_paragraph() {
        let md = "## Heading\n\nFirst *para*\ncontinues.\n\nSecond.";
        assert_eq!(first_paragraph(md), Some("First para continues.".to_string()));
        assert_eq!(first_paragraph("```\ncode\n```"), None);
    }

    #[test]
    fn test_headings() {
        let md = "# One\n\ntext\n\n## Two `code`\n";
        assert_eq!(
            headings(md),
            vec![(1, "One".to_string()), (2, "Two code".to_string())]
        );
    }

    #[test]
    fn test_word_count() {
        let md = "One two three.\n\n```\nnot counted at all\n```\n\n- four\n- five";
        assert_eq!(word_count(md), 5);
    }

    #[test]
    fn test_non_ascii_content() {
        let md = "---\n第一条内容\n\n第二条内容\n";
        let text = plain_text(md);
        assert!(text.contains("第一条内容"));
        assert!(text.contains("第二条内容"));
    }
}
