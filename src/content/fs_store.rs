//! Filesystem content store - reads collections from the site directory

use chrono::Local;
use serde_json::json;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use super::store::{
    Connection, ConnectionArgs, ContentStore, Edge, QueryResponse, SortField, StoreError,
    PAGE_CONNECTION_QUERY, PAGE_QUERY, POST_CONNECTION_QUERY, POST_QUERY,
};
use super::{CollectionKind, FrontMatter, Page, Post, RichTextDocument, SystemInfo};
use crate::config::CollectionsConfig;
use crate::Blog;

/// Content store backed by Markdown/MDX files on disk.
///
/// Nothing is cached: each query reads the files it needs, so documents
/// added while the preview server runs are visible to the next request.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    base_dir: PathBuf,
    collections: CollectionsConfig,
}

impl FsContentStore {
    pub fn new<P: Into<PathBuf>>(base_dir: P, collections: CollectionsConfig) -> Self {
        Self {
            base_dir: base_dir.into(),
            collections,
        }
    }

    /// Store for a loaded site
    pub fn for_blog(blog: &Blog) -> Self {
        Self::new(&blog.base_dir, blog.config.collections.clone())
    }

    fn collection_path(&self, kind: CollectionKind) -> &str {
        match kind {
            CollectionKind::Post => &self.collections.post.path,
            CollectionKind::Page => &self.collections.page.path,
        }
    }

    fn extension(&self, kind: CollectionKind) -> &'static str {
        match kind {
            CollectionKind::Post => self.collections.post.format.extension(),
            CollectionKind::Page => self.collections.page.format.extension(),
        }
    }

    fn collection_dir(&self, kind: CollectionKind) -> PathBuf {
        self.base_dir.join(self.collection_path(kind))
    }

    /// Map a relative path to a file of the collection, or explain why not
    fn locate(&self, kind: CollectionKind, relative_path: &str) -> Result<PathBuf, StoreError> {
        let not_found = || StoreError::NotFound {
            collection: kind,
            relative_path: relative_path.to_string(),
        };

        let rel = Path::new(relative_path);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if relative_path.is_empty() || escapes {
            return Err(not_found());
        }

        let expected = self.extension(kind);
        if rel.extension().and_then(|e| e.to_str()) != Some(expected) {
            return Err(StoreError::FormatMismatch {
                collection: kind,
                relative_path: relative_path.to_string(),
                expected,
            });
        }

        let path = self.collection_dir(kind).join(rel);
        if path.is_file() {
            Ok(path)
        } else {
            Err(not_found())
        }
    }

    /// Relative paths of every document in a collection, sorted
    fn list(&self, kind: CollectionKind) -> Vec<String> {
        let dir = self.collection_dir(kind);
        if !dir.exists() {
            return Vec::new();
        }

        let extension = self.extension(kind);
        let mut paths: Vec<String> = WalkDir::new(&dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some(extension))
            .filter_map(|e| {
                e.path()
                    .strip_prefix(&dir)
                    .ok()
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
            })
            .collect();

        paths.sort();
        paths
    }

    fn read(&self, path: &Path) -> Result<String, StoreError> {
        fs::read_to_string(path).map_err(|e| StoreError::Io(path.to_path_buf(), e))
    }

    fn load_post(&self, relative_path: &str) -> Result<Post, StoreError> {
        let path = self.locate(CollectionKind::Post, relative_path)?;
        let content = self.read(&path)?;
        let (fm, body) = FrontMatter::parse(&content);

        let sys = SystemInfo::new(
            CollectionKind::Post,
            self.collection_path(CollectionKind::Post),
            relative_path,
        );

        let file_modified = fs::metadata(&path)
            .and_then(|m| m.modified())
            .ok()
            .map(chrono::DateTime::<Local>::from);

        let created_at = fm
            .parse_created()
            .unwrap_or_else(|| file_modified.unwrap_or_else(Local::now));
        let updated_at = fm.parse_updated();

        if fm.created_at.is_some() && fm.parse_created().is_none() {
            tracing::warn!("Unparseable created_at in {}, using file time", sys.path);
        }

        let parent = fm
            .parent
            .as_deref()
            .map(|p| self.normalize_reference(CollectionKind::Post, p))
            .filter(|p| !p.is_empty());

        Ok(Post {
            id: sys.path.clone(),
            title: fm.title.unwrap_or_else(|| sys.filename.clone()),
            created_at,
            updated_at,
            parent,
            body: RichTextDocument::parse(body),
            raw: body.to_string(),
            sys,
        })
    }

    fn load_page(&self, relative_path: &str) -> Result<Page, StoreError> {
        let path = self.locate(CollectionKind::Page, relative_path)?;
        let content = self.read(&path)?;
        let (fm, body) = FrontMatter::parse(&content);

        let sys = SystemInfo::new(
            CollectionKind::Page,
            self.collection_path(CollectionKind::Page),
            relative_path,
        );

        Ok(Page {
            id: sys.path.clone(),
            title: fm.title,
            body: RichTextDocument::parse(body),
            raw: body.to_string(),
            sys,
        })
    }

    /// Reduce a reference to its collection-relative form
    fn normalize_reference(&self, kind: CollectionKind, reference: &str) -> String {
        let reference = reference.trim().trim_start_matches("./").trim_start_matches('/');
        let prefix = format!("{}/", self.collection_path(kind).trim_matches('/'));
        reference
            .strip_prefix(&prefix)
            .unwrap_or(reference)
            .to_string()
    }
}

impl ContentStore for FsContentStore {
    fn post(&self, relative_path: &str) -> Result<QueryResponse<Post>, StoreError> {
        let post = self.load_post(relative_path)?;
        Ok(QueryResponse::new(
            post,
            POST_QUERY,
            json!({ "relativePath": relative_path }),
        ))
    }

    fn page(&self, relative_path: &str) -> Result<QueryResponse<Page>, StoreError> {
        let page = self.load_page(relative_path)?;
        Ok(QueryResponse::new(
            page,
            PAGE_QUERY,
            json!({ "relativePath": relative_path }),
        ))
    }

    fn post_connection(
        &self,
        args: &ConnectionArgs,
    ) -> Result<QueryResponse<Connection<Post>>, StoreError> {
        let mut posts = Vec::new();
        for relative_path in self.list(CollectionKind::Post) {
            match self.load_post(&relative_path) {
                Ok(post) => posts.push(post),
                Err(e) => tracing::warn!("Failed to load post {}: {}", relative_path, e),
            }
        }

        if let Some(filter) = &args.filter {
            posts.retain(|post| filter.accepts(post));
        }

        // Stable sorts keep path order among equal keys
        match args.sort {
            Some(SortField::CreatedAt) => posts.sort_by_key(|p| p.created_at),
            Some(SortField::UpdatedAt) => posts.sort_by_key(|p| p.updated_at.unwrap_or(p.created_at)),
            Some(SortField::Title) => posts.sort_by(|a, b| a.title.cmp(&b.title)),
            Some(SortField::Filename) => posts.sort_by(|a, b| a.sys.filename.cmp(&b.sys.filename)),
            None => {}
        }

        let total_count = posts.len();
        let edges = args
            .window(posts)
            .into_iter()
            .map(|node| Edge {
                cursor: node.sys.path.clone(),
                node,
            })
            .collect();

        let variables = serde_json::to_value(args).unwrap_or_else(|_| json!({}));
        Ok(QueryResponse::new(
            Connection { total_count, edges },
            POST_CONNECTION_QUERY,
            variables,
        ))
    }

    fn page_connection(&self) -> Result<QueryResponse<Connection<Page>>, StoreError> {
        let mut edges = Vec::new();
        for relative_path in self.list(CollectionKind::Page) {
            match self.load_page(&relative_path) {
                Ok(node) => edges.push(Edge {
                    cursor: node.sys.path.clone(),
                    node,
                }),
                Err(e) => tracing::warn!("Failed to load page {}: {}", relative_path, e),
            }
        }

        Ok(QueryResponse::new(
            Connection {
                total_count: edges.len(),
                edges,
            },
            PAGE_CONNECTION_QUERY,
            json!({}),
        ))
    }
}
