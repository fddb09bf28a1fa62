//! thoughts: a static generator and preview server for The Structured Thoughts Blog
//!
//! Posts and pages are Markdown/MDX files with YAML front-matter. URLs are
//! routed to documents by path (a post first, then a page), bodies are
//! rendered with a registry of embed blocks, and every routable document is
//! written to the public directory. The preview server generates paths it
//! has not seen on first request.

pub mod commands;
pub mod config;
pub mod content;
pub mod embeds;
pub mod generator;
pub mod helpers;
pub mod render;
pub mod routing;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// A blog site on disk
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Site root, where `_config.yml` lives
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Static assets copied verbatim
    pub static_dir: PathBuf,
}

impl Blog {
    /// Open the site rooted at `base_dir`; defaults apply without `_config.yml`
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    pub fn with_config(base_dir: PathBuf, config: config::SiteConfig) -> Self {
        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);
        Self {
            config,
            base_dir,
            public_dir,
            static_dir,
        }
    }

    /// Content store reading this site's collections
    pub fn store(&self) -> content::FsContentStore {
        content::FsContentStore::for_blog(self)
    }

    /// Generate the static site
    pub fn generate(&self) -> Result<generator::GenerateReport> {
        commands::generate::run(self)
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
