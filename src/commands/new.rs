//! Create a new post or page

use anyhow::{bail, Result};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use crate::content::{CollectionKind, ContentStore};
use crate::Blog;

/// Front-matter written for a new document
#[derive(Debug, Serialize)]
struct NewFrontMatter<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
}

/// Create a document and return its path
///
/// A post with a parent is placed in a directory named after the parent,
/// so it routes below the parent's URL.
pub fn create_document(
    blog: &Blog,
    title: &str,
    collection: CollectionKind,
    parent: Option<&str>,
) -> Result<PathBuf> {
    let slug = slug::slugify(title);
    if slug.is_empty() {
        bail!("Title {:?} does not produce a usable file name", title);
    }

    let config = blog.config.collection(collection);
    let extension = config.format.extension();
    let collection_dir = blog.base_dir.join(&config.path);

    let (relative_path, parent_ref) = match (collection, parent) {
        (CollectionKind::Page, Some(_)) => bail!("Only posts can have a parent"),
        (_, None) => (format!("{}.{}", slug, extension), None),
        (CollectionKind::Post, Some(parent)) => {
            let parent = parent.trim_start_matches(&format!("{}/", config.path));
            let parent = if parent.ends_with(&format!(".{}", extension)) {
                parent.to_string()
            } else {
                format!("{}.{}", parent, extension)
            };
            if let Err(e) = blog.store().post(&parent) {
                bail!("Parent post not found: {}", e);
            }
            let stem = parent.trim_end_matches(&format!(".{}", extension));
            (
                format!("{}/{}.{}", stem, slug, extension),
                Some(format!("{}/{}", config.path, parent)),
            )
        }
    };

    let file_path = collection_dir.join(&relative_path);
    if file_path.exists() {
        bail!("File already exists: {:?}", file_path);
    }

    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let front_matter = match collection {
        CollectionKind::Post => NewFrontMatter {
            title,
            created_at: Some(now.clone()),
            updated_at: Some(now),
            parent: parent_ref,
        },
        CollectionKind::Page => NewFrontMatter {
            title,
            created_at: None,
            updated_at: None,
            parent: None,
        },
    };
    let content = format!("---\n{}---\n\n", serde_yaml::to_string(&front_matter)?);

    if let Some(dir) = file_path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(&file_path, content)?;

    println!("Created: {:?}", file_path);

    Ok(file_path)
}
