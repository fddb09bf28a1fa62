//! Rich-text body rendering

use super::MarkdownRenderer;
use crate::config::{CarbonConfig, SiteConfig};
use crate::content::{RichTextDocument, RichTextNode};
use crate::embeds::{CodeHighlighter, EmbedContext, EmbedRegistry, UnknownEmbedPolicy};

/// Renders document bodies, dispatching embeds through the registry
pub struct RichTextRenderer {
    markdown: MarkdownRenderer,
    registry: EmbedRegistry,
    highlighter: CodeHighlighter,
    carbon: CarbonConfig,
    unknown: UnknownEmbedPolicy,
}

impl RichTextRenderer {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            markdown: MarkdownRenderer,
            registry: EmbedRegistry::standard(),
            highlighter: CodeHighlighter::new(
                &config.highlight.theme,
                config.highlight.line_number,
            ),
            carbon: config.embeds.carbon.clone(),
            unknown: config.embeds.unknown,
        }
    }

    /// Replace the embed registry
    pub fn with_registry(mut self, registry: EmbedRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Render one body; embed state (e.g. the ad slot) is scoped to this call
    pub fn render(&self, document: &RichTextDocument) -> String {
        let mut ctx = EmbedContext::new(&self.highlighter, &self.carbon, self.unknown);
        let mut html = String::new();
        for node in &document.children {
            match node {
                RichTextNode::Markdown { text } => html.push_str(&self.markdown.render(text, &mut ctx)),
                RichTextNode::Embed(embed) => {
                    let rendered = self.registry.render(embed, &mut ctx);
                    if !rendered.is_empty() {
                        html.push_str(&rendered);
                        html.push('\n');
                    }
                }
            }
        }
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeds::EmbedKind;

    fn config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.embeds.carbon.serve = "CKYI5KQY".to_string();
        config.embeds.carbon.placement = "blog".to_string();
        config
    }

    #[test]
    fn test_markdown_and_embeds_in_order() {
        let source = "Intro text\n\n<ScriptEmbed src=\"https://example.com/a.js\" />\n\n## After\n";
        let html = RichTextRenderer::new(&config()).render(&RichTextDocument::parse(source));
        let intro = html.find("Intro text").unwrap();
        let script = html.find(r#"<script async src="https://example.com/a.js"></script>"#).unwrap();
        let after = html.find("<h2>After</h2>").unwrap();
        assert!(intro < script && script < after);
    }

    #[test]
    fn test_code_block_embed_without_language() {
        let source = "<CodeBlock children={`SELECT 1;`} />\n";
        let html = RichTextRenderer::new(&config()).render(&RichTextDocument::parse(source));
        assert!(html.contains("language-text"));
        assert!(html.contains("SELECT 1;"));
    }

    #[test]
    fn test_carbon_ad_once_per_body() {
        let source = "<CarbonAd />\n\nText\n\n<CarbonAd />\n";
        let renderer = RichTextRenderer::new(&config());
        let doc = RichTextDocument::parse(source);
        let html = renderer.render(&doc);
        assert_eq!(html.matches("carbon-ad").count(), 1);
        // A fresh page gets its own slot
        assert_eq!(renderer.render(&doc).matches("carbon-ad").count(), 1);
    }

    #[test]
    fn test_unknown_embed_skipped() {
        let source = "<Tweet id=\"1\" />\n\nAfter\n";
        let html = RichTextRenderer::new(&config()).render(&RichTextDocument::parse(source));
        assert!(!html.contains("Tweet"));
        assert!(html.contains("After"));
    }

    #[test]
    fn test_custom_registry() {
        let source = "<Snippet children=\"x = 1\" language=\"python\" />\n";
        let renderer = RichTextRenderer::new(&config())
            .with_registry(EmbedRegistry::standard().register("Snippet", EmbedKind::CodeBlock));
        let html = renderer.render(&RichTextDocument::parse(source));
        assert!(html.contains("language-python"));
    }
}
