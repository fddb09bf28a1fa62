//! Code highlighting with syntect

use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::helpers::html_escape;

/// Language used when a code block declares none
pub const PLAIN_TEXT: &str = "text";

/// Syntax highlighter shared by `CodeBlock` embeds and fenced code
pub struct CodeHighlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    line_numbers: bool,
}

impl CodeHighlighter {
    pub fn new(theme: &str, line_numbers: bool) -> Self {
        let theme_set = ThemeSet::load_defaults();
        if !theme_set.themes.contains_key(theme) {
            tracing::warn!("Unknown highlight theme `{}`, using the first available", theme);
        }
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set,
            theme_name: theme.to_string(),
            line_numbers,
        }
    }

    /// Highlight a code snippet; unknown languages use plain-text syntax
    pub fn highlight(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.map(str::trim).filter(|l| !l.is_empty()).unwrap_or(PLAIN_TEXT);
        let lang_attr = html_escape(lang);

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let theme = self
            .theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next());

        let highlighted = theme.and_then(|theme| {
            highlighted_html_for_string(code, &self.syntax_set, syntax, theme)
                .map_err(|e| tracing::warn!("Failed to highlight {} code: {}", lang, e))
                .ok()
        });

        match highlighted {
            Some(html) if self.line_numbers => add_line_numbers(&html, code, &lang_attr),
            Some(html) => format!(
                r#"<figure class="highlight language-{}">{}</figure>"#,
                lang_attr, html
            ),
            None => format!(
                r#"<figure class="highlight language-{}"><pre><code>{}</code></pre></figure>"#,
                lang_attr,
                html_escape(code)
            ),
        }
    }
}

/// Wrap highlighted code in a table with a line-number gutter
fn add_line_numbers(html: &str, code: &str, lang: &str) -> String {
    let line_count = code.lines().count().max(1);
    let gutter = (1..=line_count)
        .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<figure class="highlight language-{}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code">{}</td></tr></table></figure>"#,
        lang, gutter, html
    )
}
