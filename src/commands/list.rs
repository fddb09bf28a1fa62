//! List site content

use anyhow::Result;

use crate::content::{ConnectionArgs, ContentStore};
use crate::routing::{enumerate, PathResolver, RoutePattern};
use crate::Blog;

/// List site content by type
pub fn run(blog: &Blog, content_type: &str) -> Result<()> {
    let store = blog.store();

    match content_type {
        "post" | "posts" => {
            let posts = store.post_connection(&ConnectionArgs::newest_first())?;
            let posts: Vec<_> = posts.data.nodes().collect();
            println!("Posts ({}):", posts.len());
            for post in posts {
                println!(
                    "  {} - {} [{}]",
                    post.created_at.format("%Y-%m-%d"),
                    post.title,
                    post.sys.relative_path
                );
            }
        }
        "page" | "pages" => {
            let pages = store.page_connection()?;
            let pages: Vec<_> = pages.data.nodes().collect();
            println!("Pages ({}):", pages.len());
            for page in pages {
                println!(
                    "  {} [{}]",
                    page.title.as_deref().unwrap_or(&page.sys.filename),
                    page.sys.relative_path
                );
            }
        }
        "route" | "routes" => {
            let resolver = PathResolver::new(&blog.config.collections);
            let mut routes = Vec::new();
            for pattern in RoutePattern::STANDARD {
                let paths = enumerate(
                    &store,
                    &resolver,
                    &pattern,
                    &blog.config.home_page,
                    blog.config.fallback,
                )?;
                routes.extend(
                    paths
                        .paths
                        .into_iter()
                        .map(|path| (path.url, pattern.name, path.collection, path.relative_path)),
                );
            }
            routes.sort_by(|a, b| a.0.cmp(&b.0));
            println!("Routes ({}):", routes.len());
            for (url, pattern, collection, relative_path) in routes {
                println!(
                    "  {} -> {}/{} ({})",
                    url,
                    collection.as_str(),
                    relative_path,
                    pattern
                );
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, page, route",
                content_type
            );
        }
    }

    Ok(())
}
