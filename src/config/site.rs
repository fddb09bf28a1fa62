//! Site configuration (_config.yml)

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::ConfigError;
use crate::content::CollectionKind;
use crate::embeds::UnknownEmbedPolicy;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub url: String,

    // Directory
    pub public_dir: String,
    pub static_dir: String,

    // Content
    pub collections: CollectionsConfig,
    /// Filename of the page served at `/`
    pub home_page: String,

    // Navigation (label -> path, in display order)
    pub menu: IndexMap<String, String>,

    // Rendering
    pub highlight: HighlightConfig,
    pub embeds: EmbedsConfig,

    // Serving
    pub fallback: FallbackMode,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let mut menu = IndexMap::new();
        menu.insert("Posts".to_string(), "/".to_string());
        menu.insert("About".to_string(), "/about".to_string());

        Self {
            title: "The Structured Thoughts Blog".to_string(),
            description: String::new(),
            url: "http://localhost:4000".to_string(),

            public_dir: "public".to_string(),
            static_dir: "static".to_string(),

            collections: CollectionsConfig::default(),
            home_page: "home".to_string(),

            menu,

            highlight: HighlightConfig::default(),
            embeds: EmbedsConfig::default(),

            fallback: FallbackMode::Blocking,
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Yaml(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let post = &self.collections.post;
        let page = &self.collections.page;

        if post.path.trim().is_empty() || page.path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "collection path must not be empty".to_string(),
            ));
        }
        if post.path.trim_end_matches('/') == page.path.trim_end_matches('/') {
            return Err(ConfigError::Validation(format!(
                "post and page collections share the directory `{}`",
                post.path
            )));
        }
        if self.home_page.contains('/') {
            return Err(ConfigError::Validation(format!(
                "home_page must be a filename, got `{}`",
                self.home_page
            )));
        }

        Ok(())
    }

    /// Collection settings for a content kind
    pub fn collection(&self, kind: CollectionKind) -> &CollectionConfig {
        match kind {
            CollectionKind::Post => &self.collections.post,
            CollectionKind::Page => &self.collections.page,
        }
    }
}

/// Authored format of a collection, which fixes its file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    Md,
    Mdx,
    Markdown,
}

impl ContentFormat {
    /// File extension without the leading dot
    pub fn extension(self) -> &'static str {
        match self {
            ContentFormat::Md => "md",
            ContentFormat::Mdx => "mdx",
            ContentFormat::Markdown => "markdown",
        }
    }
}

/// One content collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Directory relative to the site root
    pub path: String,
    pub format: ContentFormat,
}

/// Both collections the blog is built from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionsConfig {
    pub post: CollectionConfig,
    pub page: CollectionConfig,
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            post: CollectionConfig {
                path: "content/post".to_string(),
                format: ContentFormat::Mdx,
            },
            page: CollectionConfig {
                path: "content/page".to_string(),
                format: ContentFormat::Mdx,
            },
        }
    }
}

/// Syntax highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Name of a syntect default theme
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}

/// Embed block configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedsConfig {
    pub unknown: UnknownEmbedPolicy,
    pub carbon: CarbonConfig,
}

/// Carbon ad loader parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CarbonConfig {
    pub serve: String,
    pub placement: String,
}

/// What the server does with paths that were not generated at build time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    /// Generate on first request, then serve from disk
    #[default]
    Blocking,
    /// Respond 404 immediately
    Off,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "The Structured Thoughts Blog");
        assert_eq!(config.collections.post.path, "content/post");
        assert_eq!(config.collections.page.format, ContentFormat::Mdx);
        assert_eq!(config.home_page, "home");
        assert_eq!(config.fallback, FallbackMode::Blocking);
        let labels: Vec<_> = config.menu.keys().cloned().collect();
        assert_eq!(labels, vec!["Posts", "About"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
collections:
  post:
    path: content/post
    format: md
embeds:
  unknown: raw_text
  carbon:
    serve: CKYI5
    placement: example
fallback: "off"
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.collections.post.format, ContentFormat::Md);
        // Unspecified collection keeps its default
        assert_eq!(config.collections.page.path, "content/page");
        assert_eq!(config.embeds.unknown, UnknownEmbedPolicy::RawText);
        assert_eq!(config.embeds.carbon.serve, "CKYI5");
        assert_eq!(config.fallback, FallbackMode::Off);
    }

    #[test]
    fn test_reject_shared_collection_dir() {
        let mut config = SiteConfig::default();
        config.collections.page.path = "content/post/".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_format_fails_to_parse() {
        let yaml = "collections:\n  post:\n    path: content/post\n    format: json\n";
        assert!(serde_yaml::from_str::<SiteConfig>(yaml).is_err());
    }
}
