//! Content store query API
//!
//! Every query returns the data together with the query text and the
//! variables that produced it, so a rendered page can describe how to
//! re-fetch its own content.

use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use thiserror::Error;

use super::{CollectionKind, Page, Post};

pub const POST_QUERY: &str = "query post($relativePath: String!) { post(relativePath: $relativePath) { id title created_at updated_at parent body _sys { filename basename breadcrumbs path relativePath extension } } }";
pub const PAGE_QUERY: &str = "query page($relativePath: String!) { page(relativePath: $relativePath) { id title body _sys { filename basename breadcrumbs path relativePath extension } } }";
pub const POST_CONNECTION_QUERY: &str = "query postConnection($sort: String, $first: Float, $last: Float, $filter: PostFilter) { postConnection(sort: $sort, first: $first, last: $last, filter: $filter) { totalCount edges { cursor node { id title created_at updated_at parent _sys { filename breadcrumbs path relativePath } } } } }";
pub const PAGE_CONNECTION_QUERY: &str = "query pageConnection { pageConnection { totalCount edges { cursor node { id title _sys { filename breadcrumbs path relativePath } } } } }";

/// Errors a content query can fail with
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no {collection} at `{relative_path}`")]
    NotFound {
        collection: CollectionKind,
        relative_path: String,
    },

    #[error("`{relative_path}` is not a {collection} document (expected a .{expected} file)")]
    FormatMismatch {
        collection: CollectionKind,
        relative_path: String,
        expected: &'static str,
    },

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Query result plus the descriptor used to obtain it
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse<T> {
    pub data: T,
    pub query: String,
    pub variables: Value,
}

impl<T> QueryResponse<T> {
    pub fn new(data: T, query: &str, variables: Value) -> Self {
        Self {
            data,
            query: query.to_string(),
            variables,
        }
    }

    /// `{query, variables}` for client-side re-fetching
    pub fn descriptor(&self) -> Value {
        json!({
            "query": self.query,
            "variables": self.variables,
        })
    }
}

/// A list query result
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub total_count: usize,
    pub edges: Vec<Edge<T>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Edge<T> {
    pub cursor: String,
    pub node: T,
}

impl<T> Connection<T> {
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.edges.iter().map(|edge| &edge.node)
    }
}

/// Fields a post connection can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Title,
    Filename,
}

/// Filter for post connections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostFilter {
    /// Keep only children of this post (collection-relative path)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// `Some(true)`: nested posts only, `Some(false)`: top-level posts only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested: Option<bool>,
}

impl PostFilter {
    pub fn accepts(&self, post: &Post) -> bool {
        if let Some(parent) = &self.parent {
            if post.parent.as_deref() != Some(parent.as_str()) {
                return false;
            }
        }
        if let Some(nested) = self.nested {
            if post.sys.is_nested() != nested {
                return false;
            }
        }
        true
    }
}

/// Arguments of `post_connection`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<i64>,
    /// Take the last `n` (all when negative), returned in reverse order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<PostFilter>,
}

impl ConnectionArgs {
    /// Every post, newest first
    pub fn newest_first() -> Self {
        Self {
            sort: Some(SortField::CreatedAt),
            last: Some(-1),
            ..Default::default()
        }
    }

    /// Apply `first`/`last` to an already sorted list
    pub fn window<T>(&self, mut items: Vec<T>) -> Vec<T> {
        if let Some(first) = self.first {
            if first >= 0 {
                items.truncate(first as usize);
            }
        }
        if let Some(last) = self.last {
            if last >= 0 && (last as usize) < items.len() {
                items.drain(..items.len() - last as usize);
            }
            items.reverse();
        }
        items
    }
}

/// Read access to the content collections
pub trait ContentStore: Send + Sync {
    fn post(&self, relative_path: &str) -> Result<QueryResponse<Post>, StoreError>;

    fn page(&self, relative_path: &str) -> Result<QueryResponse<Page>, StoreError>;

    fn post_connection(
        &self,
        args: &ConnectionArgs,
    ) -> Result<QueryResponse<Connection<Post>>, StoreError>;

    fn page_connection(&self) -> Result<QueryResponse<Connection<Page>>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_last_all_reverses() {
        let args = ConnectionArgs::newest_first();
        assert_eq!(args.window(vec![1, 2, 3]), vec![3, 2, 1]);
    }

    #[test]
    fn test_window_last_n() {
        let args = ConnectionArgs {
            last: Some(2),
            ..Default::default()
        };
        assert_eq!(args.window(vec![1, 2, 3, 4]), vec![4, 3]);
    }

    #[test]
    fn test_window_first_n() {
        let args = ConnectionArgs {
            first: Some(2),
            ..Default::default()
        };
        assert_eq!(args.window(vec![1, 2, 3]), vec![1, 2]);
        assert_eq!(ConnectionArgs::default().window(vec![1, 2]), vec![1, 2]);
    }

    #[test]
    fn test_args_serialize_as_variables() {
        let value = serde_json::to_value(ConnectionArgs::newest_first()).unwrap();
        assert_eq!(value, json!({"sort": "created_at", "last": -1}));
    }

    #[test]
    fn test_not_found_display() {
        let err = StoreError::NotFound {
            collection: CollectionKind::Post,
            relative_path: "about.mdx".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "no post at `about.mdx`");
    }
}
