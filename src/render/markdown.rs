//! Markdown rendering

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::embeds::{Embed, EmbedContext, PLAIN_TEXT};

/// Markdown renderer; fenced code goes through the `CodeBlock` embed
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    fn options() -> Options {
        // Front-matter is split off before a body gets here
        Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_DEFINITION_LIST
            | Options::ENABLE_GFM
    }

    /// Render a Markdown run to HTML
    pub fn render(&self, markdown: &str, ctx: &mut EmbedContext<'_>) -> String {
        let parser = Parser::new_ext(markdown, Self::options());

        let mut events: Vec<Event> = Vec::new();
        let mut code_block: Option<(String, String)> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let language = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .unwrap_or(PLAIN_TEXT)
                            .to_string(),
                        CodeBlockKind::Indented => PLAIN_TEXT.to_string(),
                    };
                    code_block = Some((language, String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((language, code)) = code_block.take() {
                        let embed = Embed::CodeBlock { language, code };
                        events.push(Event::Html(CowStr::from(embed.render(ctx))));
                    }
                }
                Event::Text(text) if code_block.is_some() => {
                    if let Some((_, code)) = code_block.as_mut() {
                        code.push_str(&text);
                    }
                }
                _ => events.push(event),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CarbonConfig;
    use crate::embeds::{CodeHighlighter, UnknownEmbedPolicy};

    fn render(markdown: &str) -> String {
        let highlighter = CodeHighlighter::new("base16-ocean.dark", false);
        let carbon = CarbonConfig::default();
        let mut ctx = EmbedContext::new(&highlighter, &carbon, UnknownEmbedPolicy::Skip);
        MarkdownRenderer.render(markdown, &mut ctx)
    }

    #[test]
    fn test_render_basic_markdown() {
        let html = render("# Hello World\n\nThis is a test.");
        assert!(html.contains("<h1>Hello World</h1>"));
        assert!(html.contains("<p>This is a test.</p>"));
    }

    #[test]
    fn test_fenced_code_is_highlighted() {
        let html = render("```rust\nfn main() {}\n```");
        assert!(html.contains(r#"<figure class="highlight language-rust">"#));
        assert!(!html.contains("<code class=\"language-rust\">"));
    }

    #[test]
    fn test_indented_code_is_plain_text() {
        let html = render("Intro\n\n    let x = 1;\n");
        assert!(html.contains("language-text"));
    }

    #[test]
    fn test_gfm_table() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
    }
}
