//! Static path enumeration and URL matching

use std::collections::HashSet;

use super::{AddressMode, PathResolver, RouteParams};
use crate::config::FallbackMode;
use crate::content::{CollectionKind, ConnectionArgs, ContentStore, StoreError, SystemInfo};
use crate::helpers::{decode_segment, url_for_segments};

/// Which documents a route pattern accepts, by nesting depth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeFilter {
    All,
    /// Exactly one breadcrumb
    TopLevel,
    /// More than one breadcrumb
    Nested,
}

impl EdgeFilter {
    pub fn accepts(self, sys: &SystemInfo) -> bool {
        match self {
            EdgeFilter::All => true,
            EdgeFilter::TopLevel => sys.breadcrumbs.len() == 1,
            EdgeFilter::Nested => sys.breadcrumbs.len() > 1,
        }
    }
}

/// A dynamic route and the documents it serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePattern {
    pub name: &'static str,
    pub mode: AddressMode,
    pub filter: EdgeFilter,
}

impl RoutePattern {
    /// `/[filename]`: top-level documents
    pub const FILENAME: RoutePattern = RoutePattern {
        name: "[filename]",
        mode: AddressMode::Filename,
        filter: EdgeFilter::TopLevel,
    };

    /// `/[...filename]`: nested documents
    pub const CATCH_ALL: RoutePattern = RoutePattern {
        name: "[...filename]",
        mode: AddressMode::Breadcrumbs,
        filter: EdgeFilter::Nested,
    };

    /// Patterns that together route every document exactly once
    pub const STANDARD: [RoutePattern; 2] = [RoutePattern::FILENAME, RoutePattern::CATCH_ALL];
}

/// One path to pre-render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPath {
    pub params: RouteParams,
    pub collection: CollectionKind,
    pub relative_path: String,
    /// Public URL of the document
    pub url: String,
}

/// Paths of a route pattern plus what happens to the rest
#[derive(Debug, Clone)]
pub struct StaticPaths {
    pub paths: Vec<StaticPath>,
    pub fallback: FallbackMode,
}

/// Public URL of a document
///
/// The home page lives at `/`, everything else at its breadcrumbs.
pub fn document_url(sys: &SystemInfo, home_page: &str) -> String {
    if sys.collection == CollectionKind::Page && sys.breadcrumbs == [home_page] {
        return "/".to_string();
    }
    url_for_segments(&sys.breadcrumbs)
}

/// List every document `pattern` routes, posts before pages
///
/// A document whose params are already taken is dropped with a warning, so a
/// post shadows a page of the same name.
pub fn enumerate<S>(
    store: &S,
    resolver: &PathResolver,
    pattern: &RoutePattern,
    home_page: &str,
    fallback: FallbackMode,
) -> Result<StaticPaths, StoreError>
where
    S: ContentStore + ?Sized,
{
    let posts = store.post_connection(&ConnectionArgs::default())?;
    let pages = store.page_connection()?;

    let systems = posts
        .data
        .nodes()
        .map(|post| &post.sys)
        .chain(pages.data.nodes().map(|page| &page.sys));

    let mut seen = HashSet::new();
    let mut paths = Vec::new();

    for sys in systems.filter(|sys| pattern.filter.accepts(sys)) {
        let params = resolver.params_for(sys, pattern.mode);
        if !seen.insert(params.clone()) {
            tracing::warn!(
                "{} `{}` is shadowed by another document at /{}",
                sys.collection,
                sys.path,
                params.joined()
            );
            continue;
        }
        paths.push(StaticPath {
            params,
            collection: sys.collection,
            relative_path: sys.relative_path.clone(),
            url: document_url(sys, home_page),
        });
    }

    tracing::debug!("{}: {} static paths", pattern.name, paths.len());
    Ok(StaticPaths { paths, fallback })
}

/// A URL matched to a route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub pattern: RoutePattern,
    pub params: RouteParams,
}

/// Maps request URLs back to route patterns
#[derive(Debug, Clone)]
pub struct RouteTable {
    home_page: String,
}

impl RouteTable {
    pub fn standard(home_page: &str) -> Self {
        Self {
            home_page: home_page.to_string(),
        }
    }

    /// Whether `url` addresses the site index
    pub fn is_root(&self, url: &str) -> bool {
        normalize(url).is_empty()
    }

    /// Match a URL path; `None` when it cannot name a document
    pub fn match_url(&self, url: &str) -> Option<RouteMatch> {
        let path = normalize(url);

        if path.is_empty() {
            return Some(RouteMatch {
                pattern: RoutePattern::FILENAME,
                params: RouteParams::Single(self.home_page.clone()),
            });
        }

        let mut segments = Vec::new();
        for raw in path.split('/') {
            let segment = decode_segment(raw)?;
            if segment.is_empty()
                || segment == "."
                || segment == ".."
                || segment.contains(['/', '\\'])
            {
                return None;
            }
            segments.push(segment);
        }

        if segments.len() == 1 {
            let filename = segments.pop()?;
            Some(RouteMatch {
                pattern: RoutePattern::FILENAME,
                params: RouteParams::Single(filename),
            })
        } else {
            Some(RouteMatch {
                pattern: RoutePattern::CATCH_ALL,
                params: RouteParams::CatchAll(segments),
            })
        }
    }
}

/// Path part of a URL without slashes at either end or a trailing `index.html`
fn normalize(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let path = path.strip_suffix("index.html").unwrap_or(path);
    path.trim_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollectionsConfig;
    use crate::content::FsContentStore;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn site() -> (TempDir, FsContentStore) {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "content/post/getting-started.mdx", "---\ntitle: Getting Started\n---\nHi\n");
        write(root, "content/post/series/part-1.mdx", "---\ntitle: Part 1\n---\nOne\n");
        write(root, "content/post/about.mdx", "---\ntitle: About the post\n---\nShadow\n");
        write(root, "content/page/about.mdx", "---\ntitle: About\n---\nAbout\n");
        write(root, "content/page/home.mdx", "Home\n");
        let store = FsContentStore::new(root, CollectionsConfig::default());
        (tmp, store)
    }

    fn urls(paths: &StaticPaths) -> Vec<&str> {
        paths.paths.iter().map(|p| p.url.as_str()).collect()
    }

    #[test]
    fn test_flat_route_excludes_nested() {
        let (_tmp, store) = site();
        let resolver = PathResolver::new(&CollectionsConfig::default());
        let paths = enumerate(
            &store,
            &resolver,
            &RoutePattern::FILENAME,
            "home",
            FallbackMode::Blocking,
        )
        .unwrap();

        assert_eq!(urls(&paths), vec!["/about", "/getting-started", "/"]);
        assert!(paths
            .paths
            .iter()
            .all(|p| matches!(p.params, RouteParams::Single(_))));
        assert_eq!(paths.fallback, FallbackMode::Blocking);
    }

    #[test]
    fn test_post_shadows_page() {
        let (_tmp, store) = site();
        let resolver = PathResolver::new(&CollectionsConfig::default());
        let paths = enumerate(
            &store,
            &resolver,
            &RoutePattern::FILENAME,
            "home",
            FallbackMode::Blocking,
        )
        .unwrap();
        let about: Vec<_> = paths.paths.iter().filter(|p| p.url == "/about").collect();
        assert_eq!(about.len(), 1);
        assert_eq!(about[0].collection, CollectionKind::Post);
    }

    #[test]
    fn test_catch_all_route() {
        let (_tmp, store) = site();
        let resolver = PathResolver::new(&CollectionsConfig::default());
        let paths = enumerate(
            &store,
            &resolver,
            &RoutePattern::CATCH_ALL,
            "home",
            FallbackMode::Blocking,
        )
        .unwrap();
        assert_eq!(urls(&paths), vec!["/series/part-1"]);
        assert_eq!(
            paths.paths[0].params,
            RouteParams::CatchAll(vec!["series".to_string(), "part-1".to_string()])
        );
        assert_eq!(paths.paths[0].relative_path, "series/part-1.mdx");
    }

    #[test]
    fn test_patterns_partition_documents() {
        let (_tmp, store) = site();
        let resolver = PathResolver::new(&CollectionsConfig::default());
        let mut all = Vec::new();
        for pattern in RoutePattern::STANDARD {
            let paths = enumerate(&store, &resolver, &pattern, "home", FallbackMode::Blocking)
                .unwrap();
            all.extend(paths.paths.into_iter().map(|p| p.url));
        }
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_document_url() {
        let home = SystemInfo::new(CollectionKind::Page, "content/page", "home.mdx");
        assert_eq!(document_url(&home, "home"), "/");
        let post_named_home = SystemInfo::new(CollectionKind::Post, "content/post", "home.mdx");
        assert_eq!(document_url(&post_named_home, "home"), "/home");
        let nested = SystemInfo::new(CollectionKind::Post, "content/post", "series/part-1.mdx");
        assert_eq!(document_url(&nested, "home"), "/series/part-1");
    }

    #[test]
    fn test_match_url() {
        let table = RouteTable::standard("home");
        assert_eq!(
            table.match_url("/").unwrap().params,
            RouteParams::Single("home".to_string())
        );
        assert_eq!(
            table.match_url("/getting-started/").unwrap(),
            RouteMatch {
                pattern: RoutePattern::FILENAME,
                params: RouteParams::Single("getting-started".to_string()),
            }
        );
        assert_eq!(
            table.match_url("/series/part-1/index.html").unwrap(),
            RouteMatch {
                pattern: RoutePattern::CATCH_ALL,
                params: RouteParams::CatchAll(vec!["series".to_string(), "part-1".to_string()]),
            }
        );
        assert_eq!(
            table.match_url("/my%20post?x=1").unwrap().params,
            RouteParams::Single("my post".to_string())
        );
    }

    #[test]
    fn test_is_root() {
        let table = RouteTable::standard("home");
        assert!(table.is_root("/"));
        assert!(table.is_root("/index.html"));
        assert!(table.is_root("/?ref=x"));
        assert!(!table.is_root("/about"));
    }

    #[test]
    fn test_match_url_rejects_traversal() {
        let table = RouteTable::standard("home");
        assert!(table.match_url("/../secret").is_none());
        assert!(table.match_url("/a//b").is_none());
        assert!(table.match_url("/a%2Fb").is_none());
        assert!(table.match_url("/%2E%2E/x").is_none());
    }
}
