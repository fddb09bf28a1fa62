//! Rich-text bodies: Markdown runs interleaved with embed blocks
//!
//! Authors insert embeds as JSX-style tags on their own line:
//!
//! ```text
//! <CodeBlock language="rust" children={`fn main() {}`} />
//!
//! <JSFiddleEmbed src="https://jsfiddle.net/x/embedded/" height={400} />
//!
//! <CodeBlock language="sh">
//!   cargo run
//! </CodeBlock>
//! ```
//!
//! Tags inside fenced code blocks are left alone. A tag that cannot be
//! parsed stays in the surrounding Markdown.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

lazy_static! {
    static ref EMBED_START: Regex = Regex::new(r"^<[A-Z][A-Za-z0-9]*[\s/>]").unwrap();
}

/// A parsed document body
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RichTextDocument {
    pub children: Vec<RichTextNode>,
}

/// A top-level node of a body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RichTextNode {
    Markdown { text: String },
    Embed(EmbedNode),
}

impl RichTextNode {
    /// The node's type tag; embeds report their component name
    pub fn node_type(&self) -> &str {
        match self {
            RichTextNode::Markdown { .. } => "markdown",
            RichTextNode::Embed(embed) => &embed.name,
        }
    }
}

/// An author-inserted block that needs a custom renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedNode {
    pub name: String,
    pub props: IndexMap<String, Value>,
    /// Source text of the tag
    #[serde(skip)]
    pub raw: String,
}

impl EmbedNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            props: IndexMap::new(),
            raw: String::new(),
        }
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// String prop; numbers and booleans are not coerced
    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_str)
    }

    pub fn prop_bool(&self, key: &str) -> Option<bool> {
        match self.props.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Non-negative integer prop, accepting numeric strings such as `"300"`
    pub fn prop_u32(&self, key: &str) -> Option<u32> {
        match self.props.get(key)? {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().trim_end_matches("px").parse().ok(),
            _ => None,
        }
    }
}

impl RichTextDocument {
    /// Parse a body into Markdown and embed nodes
    pub fn parse(source: &str) -> Self {
        let mut children = Vec::new();
        let mut markdown = String::new();
        let mut fence: Option<String> = None;
        let mut rest = source;

        while !rest.is_empty() {
            let line_end = rest.find('\n').map(|i| i + 1).unwrap_or(rest.len());
            let line = &rest[..line_end];

            if let Some(marker) = &fence {
                if closes_fence(line, marker) {
                    fence = None;
                }
                markdown.push_str(line);
                rest = &rest[line_end..];
                continue;
            }

            if let Some(marker) = opens_fence(line) {
                fence = Some(marker);
                markdown.push_str(line);
                rest = &rest[line_end..];
                continue;
            }

            if EMBED_START.is_match(line) {
                if let Some((node, consumed)) = parse_embed(rest) {
                    flush_markdown(&mut markdown, &mut children);
                    children.push(RichTextNode::Embed(node));
                    rest = &rest[consumed..];
                    continue;
                }
                tracing::debug!("Unparseable embed tag kept as text: {}", line.trim_end());
            }

            markdown.push_str(line);
            rest = &rest[line_end..];
        }

        flush_markdown(&mut markdown, &mut children);
        Self { children }
    }

    /// True when the body has no content at all
    pub fn is_empty(&self) -> bool {
        self.children.iter().all(|node| match node {
            RichTextNode::Markdown { text } => text.trim().is_empty(),
            RichTextNode::Embed(_) => false,
        })
    }

    /// All embed nodes in document order
    pub fn embeds(&self) -> impl Iterator<Item = &EmbedNode> {
        self.children.iter().filter_map(|node| match node {
            RichTextNode::Embed(embed) => Some(embed),
            RichTextNode::Markdown { .. } => None,
        })
    }
}

fn flush_markdown(markdown: &mut String, children: &mut Vec<RichTextNode>) {
    if !markdown.trim().is_empty() {
        children.push(RichTextNode::Markdown {
            text: std::mem::take(markdown),
        });
    }
    markdown.clear();
}

/// Returns the fence marker if `line` opens a fenced code block
fn opens_fence(line: &str) -> Option<String> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let trimmed = line.trim_start();
    let fence_char = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let count = trimmed.chars().take_while(|c| *c == fence_char).count();
    if count < 3 {
        return None;
    }
    // A backtick fence's info string may not contain backticks
    if fence_char == '`' && trimmed[count..].contains('`') {
        return None;
    }
    Some(std::iter::repeat(fence_char).take(count).collect())
}

fn closes_fence(line: &str, marker: &str) -> bool {
    let trimmed = line.trim();
    let Some(fence_char) = marker.chars().next() else {
        return false;
    };
    trimmed.starts_with(marker) && trimmed.chars().all(|c| c == fence_char)
}

/// Cursor over ASCII-delimited tag syntax
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, s: &str) -> bool {
        if self.src[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    /// Read a quoted string; the opening quote has been consumed
    fn quoted(&mut self, quote: char, escapes: bool) -> Option<String> {
        let mut out = String::new();
        loop {
            match self.bump()? {
                c if c == quote => return Some(out),
                '\\' if escapes => match self.bump()? {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    other => out.push(other),
                },
                c => out.push(c),
            }
        }
    }
}

/// Parse an embed tag at the start of `input`, returning it and the bytes consumed
fn parse_embed(input: &str) -> Option<(EmbedNode, usize)> {
    let mut cur = Cursor { src: input, pos: 0 };
    if !cur.eat("<") {
        return None;
    }

    let name = cur.take_while(|c| c.is_ascii_alphanumeric());
    if name.is_empty() {
        return None;
    }
    let mut node = EmbedNode::new(name);

    let self_closing = loop {
        cur.skip_whitespace();
        if cur.eat("/>") {
            break true;
        }
        if cur.eat(">") {
            break false;
        }

        let key = cur.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if key.is_empty() {
            return None;
        }
        cur.skip_whitespace();

        let value = if cur.eat("=") {
            cur.skip_whitespace();
            parse_attr_value(&mut cur)?
        } else {
            Value::Bool(true)
        };
        node.props.insert(key.to_string(), value);
    };

    if !self_closing {
        let closing = format!("</{}>", node.name);
        let inner_start = cur.pos;
        let inner_len = input[inner_start..].find(&closing)?;
        let inner = &input[inner_start..inner_start + inner_len];
        cur.pos = inner_start + inner_len + closing.len();

        let children = dedent(inner.trim_start_matches(['\n', '\r']).trim_end());
        node.props
            .entry("children".to_string())
            .or_insert(Value::String(children));
    }

    // Whatever trails the tag on its line belongs to it if it is blank
    let tail_end = input[cur.pos..]
        .find('\n')
        .map(|i| cur.pos + i + 1)
        .unwrap_or(input.len());
    if input[cur.pos..tail_end].trim().is_empty() {
        cur.pos = tail_end;
    }

    node.raw = input[..cur.pos].trim_end().to_string();
    Some((node, cur.pos))
}

fn parse_attr_value(cur: &mut Cursor<'_>) -> Option<Value> {
    match cur.bump()? {
        '"' => cur.quoted('"', false).map(Value::String),
        '\'' => cur.quoted('\'', false).map(Value::String),
        '{' => {
            cur.skip_whitespace();
            let value = match cur.peek()? {
                '"' | '\'' | '`' => {
                    let quote = cur.bump()?;
                    Value::String(cur.quoted(quote, true)?)
                }
                _ => {
                    let expr = cur.take_while(|c| c != '}').trim();
                    expression_value(expr)
                }
            };
            cur.skip_whitespace();
            if !cur.eat("}") {
                return None;
            }
            Some(value)
        }
        _ => None,
    }
}

/// Interpret a bare `{expression}` as a literal where possible
fn expression_value(expr: &str) -> Value {
    match expr {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => {
            if let Ok(n) = expr.parse::<i64>() {
                Value::from(n)
            } else if let Some(n) = expr
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
            {
                Value::Number(n)
            } else {
                Value::String(expr.to_string())
            }
        }
    }
}

/// Strip the indentation shared by all non-blank lines
fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    text.lines()
        .map(|line| line.get(indent..).unwrap_or_else(|| line.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_markdown() {
        let doc = RichTextDocument::parse("# Title\n\nSome *text*.\n");
        assert_eq!(doc.children.len(), 1);
        assert_eq!(doc.children[0].node_type(), "markdown");
        assert!(!doc.is_empty());
    }

    #[test]
    fn test_self_closing_embed() {
        let source = "Intro\n\n<ScriptEmbed src=\"https://example.com/a.js\" />\n\nOutro\n";
        let doc = RichTextDocument::parse(source);
        assert_eq!(doc.children.len(), 3);
        let embed = doc.embeds().next().unwrap();
        assert_eq!(embed.name, "ScriptEmbed");
        assert_eq!(embed.prop_str("src"), Some("https://example.com/a.js"));
        assert_eq!(embed.raw, "<ScriptEmbed src=\"https://example.com/a.js\" />");
        match &doc.children[2] {
            RichTextNode::Markdown { text } => assert!(text.contains("Outro")),
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn test_expression_props() {
        let source = "<JSFiddleEmbed\n  src={\"https://jsfiddle.net/a/embedded/\"}\n  height={420}\n  allowFullscreen\n/>\n";
        let doc = RichTextDocument::parse(source);
        let embed = doc.embeds().next().unwrap();
        assert_eq!(embed.prop_str("src"), Some("https://jsfiddle.net/a/embedded/"));
        assert_eq!(embed.prop_u32("height"), Some(420));
        assert_eq!(embed.prop_bool("allowFullscreen"), Some(true));
    }

    #[test]
    fn test_template_literal_children() {
        let source = "<CodeBlock language=\"rust\" children={`fn main() {\n    println!(\"hi\");\n}`} />\n";
        let doc = RichTextDocument::parse(source);
        let embed = doc.embeds().next().unwrap();
        assert_eq!(embed.prop_str("language"), Some("rust"));
        assert_eq!(
            embed.prop_str("children"),
            Some("fn main() {\n    println!(\"hi\");\n}")
        );
    }

    #[test]
    fn test_paired_tag_children() {
        let source = "<CodeBlock language=\"sh\">\n  cargo build\n  cargo test\n</CodeBlock>\nAfter\n";
        let doc = RichTextDocument::parse(source);
        let embed = doc.embeds().next().unwrap();
        assert_eq!(embed.prop_str("children"), Some("cargo build\ncargo test"));
        assert_eq!(doc.children.len(), 2);
    }

    #[test]
    fn test_tags_inside_fences_are_code() {
        let source = "```jsx\n<CarbonAd />\n```\n";
        let doc = RichTextDocument::parse(source);
        assert_eq!(doc.embeds().count(), 0);
        assert_eq!(doc.children.len(), 1);
    }

    #[test]
    fn test_inline_code_span_is_not_a_fence() {
        let source = "```inline``` is a code span\n\n<ScriptEmbed src=\"https://example.com/a.js\" />\n";
        let doc = RichTextDocument::parse(source);
        assert_eq!(doc.embeds().count(), 1);
        assert_eq!(doc.embeds().next().unwrap().name, "ScriptEmbed");

        // Tildes may carry backticks in the info string
        let source = "~~~ a`b\n<CarbonAd />\n~~~\n";
        assert_eq!(RichTextDocument::parse(source).embeds().count(), 0);
    }

    #[test]
    fn test_unterminated_tag_stays_markdown() {
        let source = "<CodeBlock language=\"rust\">\nno closing tag\n";
        let doc = RichTextDocument::parse(source);
        assert_eq!(doc.embeds().count(), 0);
        match &doc.children[0] {
            RichTextNode::Markdown { text } => assert!(text.contains("no closing tag")),
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn test_lowercase_html_is_markdown() {
        let doc = RichTextDocument::parse("<div>inline html</div>\n");
        assert_eq!(doc.embeds().count(), 0);
    }

    #[test]
    fn test_empty_body() {
        assert!(RichTextDocument::parse("\n\n  \n").is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let doc = RichTextDocument::parse("<CarbonAd />\n");
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["children"][0]["type"], "embed");
        assert_eq!(json["children"][0]["name"], "CarbonAd");
    }
}
