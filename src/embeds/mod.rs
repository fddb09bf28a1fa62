//! Embed block renderers
//!
//! Rich-text bodies may contain author-inserted blocks (`<CodeBlock>`,
//! `<ScriptEmbed>`, `<JSFiddleEmbed>`, `<CarbonAd>`). The registry maps a
//! block's name to an [`EmbedKind`], props are parsed into an [`Embed`] and
//! each variant renders itself. Names the registry does not know follow the
//! configured [`UnknownEmbedPolicy`].

mod highlight;

pub use highlight::{CodeHighlighter, PLAIN_TEXT};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::config::CarbonConfig;
use crate::content::EmbedNode;
use crate::helpers::html_escape;

/// Default iframe height of a JSFiddle embed, in pixels
pub const DEFAULT_FIDDLE_HEIGHT: u32 = 300;

const CARBON_SCRIPT: &str = "//cdn.carbonads.com/carbon.js";

/// What to do with an embed whose name is not registered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownEmbedPolicy {
    /// Render nothing
    #[default]
    Skip,
    /// Render the tag source as escaped text
    RawText,
}

/// Known embed renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbedKind {
    CodeBlock,
    ScriptEmbed,
    JsFiddleEmbed,
    CarbonAd,
}

impl EmbedKind {
    /// Name authors use for this embed
    pub fn name(self) -> &'static str {
        match self {
            EmbedKind::CodeBlock => "CodeBlock",
            EmbedKind::ScriptEmbed => "ScriptEmbed",
            EmbedKind::JsFiddleEmbed => "JSFiddleEmbed",
            EmbedKind::CarbonAd => "CarbonAd",
        }
    }

    pub const ALL: [EmbedKind; 4] = [
        EmbedKind::CodeBlock,
        EmbedKind::ScriptEmbed,
        EmbedKind::JsFiddleEmbed,
        EmbedKind::CarbonAd,
    ];
}

/// How an external script is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptLoading {
    Async,
    Defer,
}

/// An embed with its props parsed
#[derive(Debug, Clone, PartialEq)]
pub enum Embed {
    CodeBlock { language: String, code: String },
    ScriptEmbed { src: String, loading: ScriptLoading },
    JsFiddleEmbed { src: String, height: u32 },
    CarbonAd,
    Unknown { name: String, raw: String },
}

/// An embed node missing a required prop
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{embed} is missing required prop `{prop}`")]
pub struct MalformedEmbed {
    pub embed: &'static str,
    pub prop: &'static str,
}

impl Embed {
    /// Parse a node's props for a known kind
    pub fn parse(kind: EmbedKind, node: &EmbedNode) -> Result<Self, MalformedEmbed> {
        let required_src = || {
            node.prop_str("src")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or(MalformedEmbed {
                    embed: kind.name(),
                    prop: "src",
                })
        };

        let embed = match kind {
            EmbedKind::CodeBlock => Embed::CodeBlock {
                language: node
                    .prop_str("language")
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .unwrap_or(PLAIN_TEXT)
                    .to_string(),
                code: node.prop_str("children").unwrap_or_default().to_string(),
            },
            EmbedKind::ScriptEmbed => Embed::ScriptEmbed {
                src: required_src()?,
                loading: if node.prop_bool("defer").unwrap_or(false) {
                    ScriptLoading::Defer
                } else {
                    ScriptLoading::Async
                },
            },
            EmbedKind::JsFiddleEmbed => Embed::JsFiddleEmbed {
                src: required_src()?,
                height: node.prop_u32("height").unwrap_or(DEFAULT_FIDDLE_HEIGHT),
            },
            EmbedKind::CarbonAd => Embed::CarbonAd,
        };
        Ok(embed)
    }

    /// Render to HTML
    pub fn render(&self, ctx: &mut EmbedContext<'_>) -> String {
        match self {
            Embed::CodeBlock { language, code } => ctx.highlighter.highlight(code, Some(language)),
            Embed::ScriptEmbed { src, loading } => {
                let attr = match loading {
                    ScriptLoading::Async => "async",
                    ScriptLoading::Defer => "defer",
                };
                format!(r#"<script {} src="{}"></script>"#, attr, html_escape(src))
            }
            Embed::JsFiddleEmbed { src, height } => format!(
                concat!(
                    r#"<iframe class="jsfiddle-embed" src="{}" width="100%" height="{}" "#,
                    r#"loading="lazy" sandbox="allow-scripts allow-same-origin allow-popups allow-forms" "#,
                    r#"allowfullscreen="allowfullscreen" frameborder="0" title="JSFiddle"></iframe>"#
                ),
                html_escape(src),
                height
            ),
            Embed::CarbonAd => ctx.carbon_ad(),
            Embed::Unknown { raw, .. } => match ctx.unknown {
                UnknownEmbedPolicy::Skip => String::new(),
                UnknownEmbedPolicy::RawText => format!("<p>{}</p>", html_escape(raw)),
            },
        }
    }
}

/// Per-page rendering state
pub struct EmbedContext<'a> {
    highlighter: &'a CodeHighlighter,
    carbon: &'a CarbonConfig,
    unknown: UnknownEmbedPolicy,
    carbon_inserted: bool,
}

impl<'a> EmbedContext<'a> {
    pub fn new(
        highlighter: &'a CodeHighlighter,
        carbon: &'a CarbonConfig,
        unknown: UnknownEmbedPolicy,
    ) -> Self {
        Self {
            highlighter,
            carbon,
            unknown,
            carbon_inserted: false,
        }
    }

    /// The ad loader, emitted at most once per page
    fn carbon_ad(&mut self) -> String {
        if self.carbon_inserted {
            return String::new();
        }
        self.carbon_inserted = true;

        let params: Vec<String> = [
            ("serve", &self.carbon.serve),
            ("placement", &self.carbon.placement),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{}={}", key, html_escape(value)))
        .collect();
        if self.carbon.serve.is_empty() {
            tracing::debug!("CarbonAd without embeds.carbon.serve loads the bare script");
        }

        let src = if params.is_empty() {
            CARBON_SCRIPT.to_string()
        } else {
            format!("{}?{}", CARBON_SCRIPT, params.join("&amp;"))
        };
        format!(
            r#"<div class="carbon-ad"><script async type="text/javascript" src="{}" id="_carbonads_js"></script></div>"#,
            src
        )
    }
}

/// Lookup table from embed name to renderer
#[derive(Debug, Clone)]
pub struct EmbedRegistry {
    kinds: HashMap<String, EmbedKind>,
}

impl Default for EmbedRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl EmbedRegistry {
    /// Registry with no entries; every embed is unknown
    pub fn empty() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// All built-in embeds under their standard names
    pub fn standard() -> Self {
        EmbedKind::ALL
            .into_iter()
            .fold(Self::empty(), |registry, kind| {
                registry.register(kind.name(), kind)
            })
    }

    /// Register `kind` under an additional (or replacement) name
    pub fn register(mut self, name: impl Into<String>, kind: EmbedKind) -> Self {
        self.kinds.insert(name.into(), kind);
        self
    }

    /// Remove a name from the registry
    pub fn without(mut self, name: &str) -> Self {
        self.kinds.remove(name);
        self
    }

    pub fn lookup(&self, name: &str) -> Option<EmbedKind> {
        self.kinds.get(name).copied()
    }

    /// Parse a node into an embed; `None` when its props are unusable
    pub fn resolve(&self, node: &EmbedNode) -> Option<Embed> {
        let Some(kind) = self.lookup(&node.name) else {
            tracing::debug!("Unknown embed `{}`", node.name);
            return Some(Embed::Unknown {
                name: node.name.clone(),
                raw: node.raw.clone(),
            });
        };

        match Embed::parse(kind, node) {
            Ok(embed) => Some(embed),
            Err(e) => {
                tracing::warn!("Skipping embed: {}", e);
                None
            }
        }
    }

    /// Render an embed node; never fails
    pub fn render(&self, node: &EmbedNode, ctx: &mut EmbedContext<'_>) -> String {
        self.resolve(node)
            .map(|embed| embed.render(ctx))
            .unwrap_or_default()
    }
}
