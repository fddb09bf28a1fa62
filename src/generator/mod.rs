//! Generator module - writes every routable document as static HTML

use anyhow::{Context as _, Result};
use chrono::Local;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use walkdir::WalkDir;

use crate::content::{CollectionKind, ContentStore, FsContentStore};
use crate::render::{PageRenderer, RenderedPage};
use crate::routing::{
    enumerate, resolve, PathResolver, Resolution, RouteParams, RoutePattern, RouteTable,
    StaticPath,
};
use crate::Blog;

/// Counts from one generation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateReport {
    pub posts: usize,
    pub pages: usize,
    /// Enumerated paths that no longer resolved
    pub not_found: usize,
    /// Paths whose rendering or writing failed
    pub failed: usize,
}

impl fmt::Display for GenerateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} posts, {} pages, {} not found, {} failed",
            self.posts, self.pages, self.not_found, self.failed
        )
    }
}

/// Static site generator
pub struct Generator<S: ContentStore> {
    blog: Blog,
    store: S,
    resolver: PathResolver,
    routes: RouteTable,
    renderer: PageRenderer,
}

impl Generator<FsContentStore> {
    /// Generator reading the site's own content directory
    pub fn for_blog(blog: &Blog) -> Result<Self> {
        Self::new(blog, blog.store())
    }
}

impl<S: ContentStore> Generator<S> {
    pub fn new(blog: &Blog, store: S) -> Result<Self> {
        Ok(Self {
            blog: blog.clone(),
            store,
            resolver: PathResolver::new(&blog.config.collections),
            routes: RouteTable::standard(&blog.config.home_page),
            renderer: PageRenderer::new(&blog.config)?,
        })
    }

    /// Generate the entire site
    ///
    /// A path that fails to render is logged and counted; the others are
    /// still written.
    pub fn generate(&self) -> Result<GenerateReport> {
        fs::create_dir_all(&self.blog.public_dir).with_context(|| {
            format!("Failed to create {}", self.blog.public_dir.display())
        })?;

        self.copy_static_assets()?;

        let mut report = GenerateReport::default();
        let config = &self.blog.config;

        for pattern in RoutePattern::STANDARD {
            let static_paths = enumerate(
                &self.store,
                &self.resolver,
                &pattern,
                &config.home_page,
                config.fallback,
            )?;

            for path in &static_paths.paths {
                // `/` is the index, written below
                if path.url == "/" {
                    continue;
                }
                match self.generate_path(path) {
                    Ok(Some(CollectionKind::Post)) => report.posts += 1,
                    Ok(Some(CollectionKind::Page)) => report.pages += 1,
                    Ok(None) => {
                        tracing::warn!("{} vanished during generation", path.url);
                        report.not_found += 1;
                    }
                    Err(e) => {
                        tracing::error!("Failed to generate {}: {:#}", path.url, e);
                        report.failed += 1;
                    }
                }
            }
        }

        self.write_index()?;
        self.write_not_found()?;

        Ok(report)
    }

    /// Resolve, render and write one enumerated path
    fn generate_path(&self, path: &StaticPath) -> Result<Option<CollectionKind>> {
        let resolution = resolve(&self.store, &self.resolver, &path.params);
        let Some(kind) = resolution.kind() else {
            return Ok(None);
        };

        let page = self.renderer.render_resolution(&self.store, &resolution)?;
        self.write(&path.params.segments(), &page)?;
        Ok(Some(kind))
    }

    /// Generate one URL on demand
    ///
    /// Returns `None` when the URL names no document. A found page is also
    /// written to the public directory, so later requests are served from
    /// disk.
    pub fn render_url(&self, url: &str) -> Result<Option<RenderedPage>> {
        if self.routes.is_root(url) {
            return self.write_index().map(Some);
        }

        let Some(route) = self.routes.match_url(url) else {
            tracing::debug!("{} does not name a document", url);
            return Ok(None);
        };

        let resolution = resolve(&self.store, &self.resolver, &route.params);
        match &resolution {
            Resolution::NotFound(_) => return Ok(None),
            // The home page lives at `/` only
            Resolution::Page(_) if self.is_home(&route.params) => {
                tracing::debug!("{} is the home page, served at /", url);
                return Ok(None);
            }
            _ => {}
        }

        let page = self.renderer.render_resolution(&self.store, &resolution)?;
        self.write(&route.params.segments(), &page)?;
        tracing::info!("Generated {} on demand ({})", url, route.pattern.name);
        Ok(Some(page))
    }

    fn is_home(&self, params: &RouteParams) -> bool {
        matches!(params, RouteParams::Single(name) if *name == self.blog.config.home_page)
    }

    fn write_index(&self) -> Result<RenderedPage> {
        let today = Local::now().date_naive();
        let page = self.renderer.render_index(&self.store, today)?;
        self.write(&[], &page)?;
        Ok(page)
    }

    fn write_not_found(&self) -> Result<()> {
        let page = self.renderer.render_not_found("/404.html")?;
        let output_path = self.blog.public_dir.join("404.html");
        write_atomic(&output_path, &page.html)?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }

    /// Write `page` to `<public>/<segments>/index.html`
    fn write(&self, segments: &[&str], page: &RenderedPage) -> Result<PathBuf> {
        let output_path = segments
            .iter()
            .fold(self.blog.public_dir.clone(), |dir, segment| dir.join(segment))
            .join("index.html");

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create dir {}", parent.display()))?;
        }
        write_atomic(&output_path, &page.html)?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(output_path)
    }

    /// Copy the static directory into the public directory verbatim
    fn copy_static_assets(&self) -> Result<()> {
        let static_dir = &self.blog.static_dir;
        if !static_dir.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(static_dir)?;
            let dest = self.blog.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)
                .with_context(|| format!("Failed to copy {}", path.display()))?;
        }

        Ok(())
    }
}

/// Write through a temporary sibling and rename it into place, so readers
/// never see a partial page
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    let file_name = path
        .file_name()
        .with_context(|| format!("No file name in {}", path.display()))?;
    let tmp_path = path.with_file_name(format!(
        ".{}.{}-{}.tmp",
        file_name.to_string_lossy(),
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    fs::write(&tmp_path, contents)
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e).with_context(|| format!("Failed to write {}", path.display()));
    }
    Ok(())
}
