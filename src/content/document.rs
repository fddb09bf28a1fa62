//! Post and Page models

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;

use super::richtext::RichTextDocument;

/// The two content collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Post,
    Page,
}

impl CollectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CollectionKind::Post => "post",
            CollectionKind::Page => "page",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// System metadata the store attaches to every document (`_sys`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub collection: CollectionKind,
    /// File stem, e.g. `part-1`
    pub filename: String,
    /// File name with extension, e.g. `part-1.mdx`
    pub basename: String,
    /// Path segments below the collection root, extension stripped
    pub breadcrumbs: Vec<String>,
    /// Path from the site root, e.g. `content/post/series/part-1.mdx`
    pub path: String,
    /// Path below the collection root, e.g. `series/part-1.mdx`
    pub relative_path: String,
    /// Extension with its leading dot
    pub extension: String,
}

impl SystemInfo {
    /// Build metadata for a document at `relative_path` inside `collection_path`
    pub fn new(collection: CollectionKind, collection_path: &str, relative_path: &str) -> Self {
        let relative_path = relative_path.replace('\\', "/");
        let relative_path = relative_path.trim_start_matches('/').to_string();

        let basename = relative_path
            .rsplit('/')
            .next()
            .unwrap_or(relative_path.as_str())
            .to_string();

        let (filename, extension) = match basename.rfind('.') {
            Some(pos) if pos > 0 => (basename[..pos].to_string(), basename[pos..].to_string()),
            _ => (basename.clone(), String::new()),
        };

        let mut breadcrumbs: Vec<String> = relative_path.split('/').map(str::to_string).collect();
        if let Some(last) = breadcrumbs.last_mut() {
            *last = filename.clone();
        }

        let path = format!("{}/{}", collection_path.trim_end_matches('/'), relative_path);

        Self {
            collection,
            filename,
            basename,
            breadcrumbs,
            path,
            relative_path,
            extension,
        }
    }

    /// Whether the document lives below a sub-directory of its collection
    pub fn is_nested(&self) -> bool {
        self.breadcrumbs.len() > 1
    }
}

/// A blog post
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    /// Store-wide identifier (the site-relative path)
    pub id: String,

    /// Post title, the filename when front-matter has none
    pub title: String,

    /// Publication date
    pub created_at: DateTime<Local>,

    /// Last updated date
    pub updated_at: Option<DateTime<Local>>,

    /// Relative path of the parent post, for nested series
    pub parent: Option<String>,

    /// Parsed rich-text body
    pub body: RichTextDocument,

    /// Raw body source
    #[serde(skip)]
    pub raw: String,

    #[serde(rename = "_sys")]
    pub sys: SystemInfo,
}

/// A standalone page
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub id: String,

    pub title: Option<String>,

    pub body: RichTextDocument,

    #[serde(skip)]
    pub raw: String,

    #[serde(rename = "_sys")]
    pub sys: SystemInfo,
}

/// Either kind of document
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "__typename")]
pub enum ContentDocument {
    Post(Post),
    Page(Page),
}

impl ContentDocument {
    pub fn kind(&self) -> CollectionKind {
        match self {
            ContentDocument::Post(_) => CollectionKind::Post,
            ContentDocument::Page(_) => CollectionKind::Page,
        }
    }

    pub fn sys(&self) -> &SystemInfo {
        match self {
            ContentDocument::Post(post) => &post.sys,
            ContentDocument::Page(page) => &page.sys,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            ContentDocument::Post(post) => Some(post.title.as_str()),
            ContentDocument::Page(page) => page.title.as_deref(),
        }
    }

    pub fn body(&self) -> &RichTextDocument {
        match self {
            ContentDocument::Post(post) => &post.body,
            ContentDocument::Page(page) => &page.body,
        }
    }
}
