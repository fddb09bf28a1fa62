//! Route parameters to content paths and back

use serde::Serialize;

use crate::config::{CollectionsConfig, ContentFormat};
use crate::content::{CollectionKind, SystemInfo};

/// Parameters of a matched route
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum RouteParams {
    /// `[filename]`: one segment
    Single(String),
    /// `[...filename]`: any number of segments
    CatchAll(Vec<String>),
}

impl RouteParams {
    pub fn segments(&self) -> Vec<&str> {
        match self {
            RouteParams::Single(filename) => vec![filename.as_str()],
            RouteParams::CatchAll(segments) => segments.iter().map(String::as_str).collect(),
        }
    }

    /// Segments joined with `/`
    pub fn joined(&self) -> String {
        match self {
            RouteParams::Single(filename) => filename.clone(),
            RouteParams::CatchAll(segments) => segments.join("/"),
        }
    }
}

/// Which `_sys` field a route pattern is addressed by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    /// `_sys.filename`
    Filename,
    /// `_sys.breadcrumbs`
    Breadcrumbs,
}

/// Maps route parameters to collection-relative paths
#[derive(Debug, Clone, Copy)]
pub struct PathResolver {
    post_format: ContentFormat,
    page_format: ContentFormat,
}

impl PathResolver {
    pub fn new(collections: &CollectionsConfig) -> Self {
        Self {
            post_format: collections.post.format,
            page_format: collections.page.format,
        }
    }

    /// Relative path a collection would store the routed document under
    ///
    /// `Single("getting-started")` becomes `getting-started.mdx`,
    /// `CatchAll(["series", "part-1"])` becomes `series/part-1.mdx`.
    pub fn relative_path(&self, params: &RouteParams, kind: CollectionKind) -> String {
        let format = match kind {
            CollectionKind::Post => self.post_format,
            CollectionKind::Page => self.page_format,
        };
        format!("{}.{}", params.joined(), format.extension())
    }

    /// Route parameters that address a document
    pub fn params_for(&self, sys: &SystemInfo, mode: AddressMode) -> RouteParams {
        match mode {
            AddressMode::Filename => RouteParams::Single(sys.filename.clone()),
            AddressMode::Breadcrumbs => RouteParams::CatchAll(sys.breadcrumbs.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> PathResolver {
        PathResolver::new(&CollectionsConfig::default())
    }

    #[test]
    fn test_single_segment() {
        let params = RouteParams::Single("getting-started".to_string());
        assert_eq!(
            resolver().relative_path(&params, CollectionKind::Post),
            "getting-started.mdx"
        );
    }

    #[test]
    fn test_catch_all_joins_segments() {
        let params = RouteParams::CatchAll(vec!["series".to_string(), "part-1".to_string()]);
        assert_eq!(
            resolver().relative_path(&params, CollectionKind::Post),
            "series/part-1.mdx"
        );
    }

    #[test]
    fn test_extension_per_collection() {
        let mut collections = CollectionsConfig::default();
        collections.post.format = ContentFormat::Md;
        let resolver = PathResolver::new(&collections);
        let params = RouteParams::Single("about".to_string());
        assert_eq!(resolver.relative_path(&params, CollectionKind::Post), "about.md");
        assert_eq!(resolver.relative_path(&params, CollectionKind::Page), "about.mdx");
    }

    #[test]
    fn test_params_for_is_inverse() {
        let resolver = resolver();
        let sys = SystemInfo::new(CollectionKind::Post, "content/post", "series/part-1.mdx");

        let params = resolver.params_for(&sys, AddressMode::Breadcrumbs);
        assert_eq!(params.segments(), vec!["series", "part-1"]);
        assert_eq!(
            resolver.relative_path(&params, CollectionKind::Post),
            sys.relative_path
        );

        assert_eq!(
            resolver.params_for(&sys, AddressMode::Filename),
            RouteParams::Single("part-1".to_string())
        );
    }
}
