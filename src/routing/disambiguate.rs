//! Post-or-page resolution
//!
//! A routed path is fetched as a post first; only when that fails is it
//! fetched as a page. Both failing is an ordinary outcome, not an error.

use serde_json::Value;

use super::{PathResolver, RouteParams};
use crate::content::{
    CollectionKind, ContentDocument, ContentStore, Page, Post, QueryResponse, StoreError,
};

/// Outcome of resolving a path
#[derive(Debug)]
pub enum Resolution {
    Post(QueryResponse<Post>),
    Page(QueryResponse<Page>),
    NotFound(NotFound),
}

/// Why a path resolved to nothing
#[derive(Debug)]
pub struct NotFound {
    pub params: RouteParams,
    pub post_path: String,
    pub page_path: String,
    pub post_error: StoreError,
    pub page_error: StoreError,
}

/// States a resolution passes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveState {
    Requested,
    ResolvingPath,
    FetchingAsPost,
    FetchingAsPage,
    RenderPost,
    RenderPage,
    NotFound,
}

impl ResolveState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ResolveState::RenderPost | ResolveState::RenderPage | ResolveState::NotFound
        )
    }
}

impl Resolution {
    /// The terminal state this resolution ended in
    pub fn state(&self) -> ResolveState {
        match self {
            Resolution::Post(_) => ResolveState::RenderPost,
            Resolution::Page(_) => ResolveState::RenderPage,
            Resolution::NotFound(_) => ResolveState::NotFound,
        }
    }

    pub fn kind(&self) -> Option<CollectionKind> {
        match self {
            Resolution::Post(_) => Some(CollectionKind::Post),
            Resolution::Page(_) => Some(CollectionKind::Page),
            Resolution::NotFound(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, Resolution::NotFound(_))
    }

    /// The resolved document, dropping the query descriptor
    pub fn into_document(self) -> Option<ContentDocument> {
        match self {
            Resolution::Post(response) => Some(ContentDocument::Post(response.data)),
            Resolution::Page(response) => Some(ContentDocument::Page(response.data)),
            Resolution::NotFound(_) => None,
        }
    }

    /// `{query, variables}` of the successful fetch
    pub fn descriptor(&self) -> Option<Value> {
        match self {
            Resolution::Post(response) => Some(response.descriptor()),
            Resolution::Page(response) => Some(response.descriptor()),
            Resolution::NotFound(_) => None,
        }
    }
}

/// Machine state with the data each step carries
enum Step {
    Requested,
    ResolvingPath,
    FetchingAsPost {
        post_path: String,
        page_path: String,
    },
    FetchingAsPage {
        post_path: String,
        page_path: String,
        post_error: StoreError,
    },
    Done(Resolution),
}

impl Step {
    fn state(&self) -> ResolveState {
        match self {
            Step::Requested => ResolveState::Requested,
            Step::ResolvingPath => ResolveState::ResolvingPath,
            Step::FetchingAsPost { .. } => ResolveState::FetchingAsPost,
            Step::FetchingAsPage { .. } => ResolveState::FetchingAsPage,
            Step::Done(resolution) => resolution.state(),
        }
    }
}

/// Resolve route parameters to a post, a page or nothing
///
/// The page query is only issued after the post query has failed.
pub fn resolve<S>(store: &S, resolver: &PathResolver, params: &RouteParams) -> Resolution
where
    S: ContentStore + ?Sized,
{
    let mut step = Step::Requested;

    loop {
        step = match step {
            Step::Requested => Step::ResolvingPath,
            Step::ResolvingPath => Step::FetchingAsPost {
                post_path: resolver.relative_path(params, CollectionKind::Post),
                page_path: resolver.relative_path(params, CollectionKind::Page),
            },
            Step::FetchingAsPost {
                post_path,
                page_path,
            } => match store.post(&post_path) {
                Ok(response) => Step::Done(Resolution::Post(response)),
                Err(post_error) => {
                    tracing::debug!("`{}` is not a post: {}", post_path, post_error);
                    Step::FetchingAsPage {
                        post_path,
                        page_path,
                        post_error,
                    }
                }
            },
            Step::FetchingAsPage {
                post_path,
                page_path,
                post_error,
            } => match store.page(&page_path) {
                Ok(response) => Step::Done(Resolution::Page(response)),
                Err(page_error) => {
                    tracing::debug!("`{}` is not a page: {}", page_path, page_error);
                    Step::Done(Resolution::NotFound(NotFound {
                        params: params.clone(),
                        post_path,
                        page_path,
                        post_error,
                        page_error,
                    }))
                }
            },
            Step::Done(resolution) => return resolution,
        };

        tracing::trace!(path = %params.joined(), state = ?step.state(), "resolve");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollectionsConfig;
    use crate::content::{
        Connection, ConnectionArgs, RichTextDocument, SystemInfo, POST_QUERY, PAGE_QUERY,
    };
    use chrono::Local;
    use serde_json::json;
    use std::sync::Mutex;

    /// Store holding fixed paths that records every query
    struct RecordingStore {
        posts: Vec<&'static str>,
        pages: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingStore {
        fn new(posts: Vec<&'static str>, pages: Vec<&'static str>) -> Self {
            Self {
                posts,
                pages,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn not_found(collection: CollectionKind, relative_path: &str) -> StoreError {
            StoreError::NotFound {
                collection,
                relative_path: relative_path.to_string(),
            }
        }
    }

    impl ContentStore for RecordingStore {
        fn post(&self, relative_path: &str) -> Result<QueryResponse<Post>, StoreError> {
            self.calls.lock().unwrap().push(format!("post:{relative_path}"));
            if !self.posts.contains(&relative_path) {
                return Err(Self::not_found(CollectionKind::Post, relative_path));
            }
            let sys = SystemInfo::new(CollectionKind::Post, "content/post", relative_path);
            let post = Post {
                id: sys.path.clone(),
                title: sys.filename.clone(),
                created_at: Local::now(),
                updated_at: None,
                parent: None,
                body: RichTextDocument::parse("Hello"),
                raw: "Hello".to_string(),
                sys,
            };
            Ok(QueryResponse::new(
                post,
                POST_QUERY,
                json!({ "relativePath": relative_path }),
            ))
        }

        fn page(&self, relative_path: &str) -> Result<QueryResponse<Page>, StoreError> {
            self.calls.lock().unwrap().push(format!("page:{relative_path}"));
            if !self.pages.contains(&relative_path) {
                return Err(Self::not_found(CollectionKind::Page, relative_path));
            }
            let sys = SystemInfo::new(CollectionKind::Page, "content/page", relative_path);
            let page = Page {
                id: sys.path.clone(),
                title: None,
                body: RichTextDocument::default(),
                raw: String::new(),
                sys,
            };
            Ok(QueryResponse::new(
                page,
                PAGE_QUERY,
                json!({ "relativePath": relative_path }),
            ))
        }

        fn post_connection(
            &self,
            _args: &ConnectionArgs,
        ) -> Result<QueryResponse<Connection<Post>>, StoreError> {
            unreachable!("resolution never lists posts")
        }

        fn page_connection(&self) -> Result<QueryResponse<Connection<Page>>, StoreError> {
            unreachable!("resolution never lists pages")
        }
    }

    fn single(name: &str) -> RouteParams {
        RouteParams::Single(name.to_string())
    }

    #[test]
    fn test_post_resolves_without_page_fetch() {
        let store = RecordingStore::new(vec!["getting-started.mdx"], vec!["getting-started.mdx"]);
        let resolver = PathResolver::new(&CollectionsConfig::default());

        let resolution = resolve(&store, &resolver, &single("getting-started"));
        match &resolution {
            Resolution::Post(response) => {
                assert_eq!(response.data.title, "getting-started");
                assert!(!response.data.body.is_empty());
            }
            other => panic!("expected a post, got {other:?}"),
        }
        assert_eq!(resolution.state(), ResolveState::RenderPost);
        assert_eq!(store.calls(), vec!["post:getting-started.mdx"]);
    }

    #[test]
    fn test_page_resolves_after_post_miss() {
        let store = RecordingStore::new(vec![], vec!["about.mdx"]);
        let resolver = PathResolver::new(&CollectionsConfig::default());

        let resolution = resolve(&store, &resolver, &single("about"));
        assert_eq!(resolution.kind(), Some(CollectionKind::Page));
        assert_eq!(store.calls(), vec!["post:about.mdx", "page:about.mdx"]);
        assert_eq!(
            resolution.descriptor().unwrap()["variables"]["relativePath"],
            "about.mdx"
        );
    }

    #[test]
    fn test_neither_is_not_found() {
        let store = RecordingStore::new(vec![], vec![]);
        let resolver = PathResolver::new(&CollectionsConfig::default());

        let params = RouteParams::CatchAll(vec!["no".to_string(), "such".to_string()]);
        match resolve(&store, &resolver, &params) {
            Resolution::NotFound(not_found) => {
                assert_eq!(not_found.post_path, "no/such.mdx");
                assert_eq!(not_found.page_path, "no/such.mdx");
                assert!(not_found.post_error.is_not_found());
                assert!(not_found.page_error.is_not_found());
            }
            other => panic!("expected not found, got {other:?}"),
        }
        assert_eq!(store.calls().len(), 2);
    }

    #[test]
    fn test_page_fetch_uses_page_extension() {
        let mut collections = CollectionsConfig::default();
        collections.post.format = crate::config::ContentFormat::Md;
        let resolver = PathResolver::new(&collections);
        let store = RecordingStore::new(vec![], vec!["home.mdx"]);

        let resolution = resolve(&store, &resolver, &single("home"));
        assert!(resolution.is_found());
        assert_eq!(store.calls(), vec!["post:home.md", "page:home.mdx"]);
    }

    #[test]
    fn test_terminal_states() {
        assert!(ResolveState::NotFound.is_terminal());
        assert!(ResolveState::RenderPage.is_terminal());
        assert!(!ResolveState::FetchingAsPage.is_terminal());
    }
}
