//! Full-page rendering

use anyhow::Result;
use chrono::{Local, NaiveDate};
use serde_json::Value;
use tera::Context;

use super::RichTextRenderer;
use crate::config::SiteConfig;
use crate::content::{
    CollectionKind, ConnectionArgs, ContentStore, Page, Post, PostFilter, QueryResponse,
    SortField,
};
use crate::helpers::{date_xml, format_date, full_url_for, html_escape, listing_date};
use crate::routing::{document_url, PathResolver, Resolution, RouteParams};
use crate::templates::{NavLink, PostData, PostListItem, SiteData, TemplateRenderer};

/// HTTP status a rendered page should be served with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Ok,
    NotFound,
}

#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub html: String,
    pub status: PageStatus,
}

impl RenderedPage {
    fn ok(html: String) -> Self {
        Self {
            html,
            status: PageStatus::Ok,
        }
    }
}

/// Renders resolved documents into complete HTML pages
pub struct PageRenderer {
    config: SiteConfig,
    site: SiteData,
    templates: TemplateRenderer,
    richtext: RichTextRenderer,
    resolver: PathResolver,
}

impl PageRenderer {
    pub fn new(config: &SiteConfig) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            site: SiteData::from_config(config),
            templates: TemplateRenderer::new()?,
            richtext: RichTextRenderer::new(config),
            resolver: PathResolver::new(&config.collections),
        })
    }

    fn base_context(&self, title: Option<&str>, url: &str) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        if let Some(title) = title {
            context.insert("page_title", &html_escape(title));
        }
        context.insert("canonical_url", &html_escape(&full_url_for(&self.config, url)));
        context
    }

    /// Render whatever a path resolved to
    pub fn render_resolution<S>(&self, store: &S, resolution: &Resolution) -> Result<RenderedPage>
    where
        S: ContentStore + ?Sized,
    {
        match resolution {
            Resolution::Post(response) => self.render_post(store, response),
            Resolution::Page(response) => self.render_page(response),
            Resolution::NotFound(not_found) => {
                self.render_not_found(&format!("/{}", not_found.params.joined()))
            }
        }
    }

    pub fn render_post<S>(&self, store: &S, response: &QueryResponse<Post>) -> Result<RenderedPage>
    where
        S: ContentStore + ?Sized,
    {
        let post = &response.data;
        let url = document_url(&post.sys, &self.config.home_page);
        let today = Local::now().date_naive();

        let mut context = self.base_context(Some(&post.title), &url);
        context.insert("post", &self.post_data(post));
        context.insert("body", &self.richtext.render(&post.body));
        context.insert("children", &self.children(store, post, today));
        if let Some(parent) = self.parent(store, post) {
            context.insert("parent", &parent);
        }
        context.insert("content_query", &hydration_island(&response.descriptor()));

        Ok(RenderedPage::ok(self.templates.render("post.html", &context)?))
    }

    pub fn render_page(&self, response: &QueryResponse<Page>) -> Result<RenderedPage> {
        let page = &response.data;
        let url = document_url(&page.sys, &self.config.home_page);

        let mut context = self.base_context(page.title.as_deref(), &url);
        context.insert("body", &self.richtext.render(&page.body));
        context.insert("content_query", &hydration_island(&response.descriptor()));

        Ok(RenderedPage::ok(self.templates.render("page.html", &context)?))
    }

    /// Render `/`: the home page body, then every post newest first
    pub fn render_index<S>(&self, store: &S, today: NaiveDate) -> Result<RenderedPage>
    where
        S: ContentStore + ?Sized,
    {
        let home_params = RouteParams::Single(self.config.home_page.clone());
        let home_path = self.resolver.relative_path(&home_params, CollectionKind::Page);
        let home = match store.page(&home_path) {
            Ok(response) => Some(response.data),
            Err(e) => {
                tracing::debug!("No home page: {}", e);
                None
            }
        };

        let posts = store.post_connection(&ConnectionArgs::newest_first())?;
        let items: Vec<PostListItem> = posts
            .data
            .nodes()
            .map(|post| self.list_item(post, today))
            .collect();

        let title = home.as_ref().and_then(|page| page.title.as_deref());
        let mut context = self.base_context(title, "/");
        if let Some(home) = &home {
            context.insert("body", &self.richtext.render(&home.body));
        }
        context.insert("posts", &items);
        context.insert("content_query", &hydration_island(&posts.descriptor()));

        Ok(RenderedPage::ok(self.templates.render("index.html", &context)?))
    }

    /// The "Not Found" page for a request path
    pub fn render_not_found(&self, request_path: &str) -> Result<RenderedPage> {
        let mut context = Context::new();
        context.insert("site", &self.site);
        context.insert("page_title", "Not Found");
        context.insert("request_path", &html_escape(request_path));

        Ok(RenderedPage {
            html: self.templates.render("not_found.html", &context)?,
            status: PageStatus::NotFound,
        })
    }

    fn post_data(&self, post: &Post) -> PostData {
        PostData {
            title: html_escape(&post.title),
            date: format_date(&post.created_at, "D MMMM YYYY"),
            date_xml: date_xml(&post.created_at),
            updated: post
                .updated_at
                .as_ref()
                .map(|d| format_date(d, "D MMMM YYYY")),
            updated_xml: post.updated_at.as_ref().map(date_xml),
        }
    }

    fn list_item(&self, post: &Post, today: NaiveDate) -> PostListItem {
        PostListItem {
            title: html_escape(&post.title),
            url: document_url(&post.sys, &self.config.home_page),
            date: listing_date(&post.created_at, today),
        }
    }

    /// Link back to the parent post, when the reference resolves
    fn parent<S>(&self, store: &S, post: &Post) -> Option<NavLink>
    where
        S: ContentStore + ?Sized,
    {
        let reference = post.parent.as_deref()?;
        match store.post(reference) {
            Ok(parent) => Some(NavLink {
                title: html_escape(&parent.data.title),
                url: document_url(&parent.data.sys, &self.config.home_page),
            }),
            Err(e) => {
                tracing::warn!("{}: parent `{}` not found: {}", post.sys.path, reference, e);
                None
            }
        }
    }

    /// Posts that name this one as their parent, oldest first
    fn children<S>(&self, store: &S, post: &Post, today: NaiveDate) -> Vec<PostListItem>
    where
        S: ContentStore + ?Sized,
    {
        let args = ConnectionArgs {
            sort: Some(SortField::CreatedAt),
            filter: Some(PostFilter {
                parent: Some(post.sys.relative_path.clone()),
                nested: None,
            }),
            ..Default::default()
        };

        match store.post_connection(&args) {
            Ok(response) => response
                .data
                .nodes()
                .map(|child| self.list_item(child, today))
                .collect(),
            Err(e) => {
                tracing::warn!("Failed to list children of {}: {}", post.sys.path, e);
                Vec::new()
            }
        }
    }
}

/// Serialize a query descriptor for a `<script type="application/json">` island
fn hydration_island(descriptor: &Value) -> String {
    descriptor
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FsContentStore;
    use crate::routing::resolve;
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
        write(
            root,
            "content/post/series.mdx",
            "---\ntitle: A Series\ncreated_at: 2022-01-01 10:00:00\n---\nThe series.\n",
        );
        write(
            root,
            "content/post/series/part-1.mdx",
            "---\ntitle: Part <1>\ncreated_at: 2022-02-01 10:00:00\nupdated_at: 2022-03-01 10:00:00\nparent: content/post/series.mdx\n---\nFirst part.\n",
        );
        write(root, "content/page/home.mdx", "---\ntitle: Welcome\n---\nHello from home.\n");
        write(root, "content/page/about.mdx", "About **us**.\n");
        let store = FsContentStore::new(root, Default::default());
        (tmp, store)
    }

    fn renderer() -> PageRenderer {
        PageRenderer::new(&SiteConfig::default()).unwrap()
    }

    #[test]
    fn test_render_post_with_parent_and_dates() {
        let (_tmp, store) = site();
        let response = store.post("series/part-1.mdx").unwrap();
        let page = renderer().render_post(&store, &response).unwrap();
        assert_eq!(page.status, PageStatus::Ok);
        assert!(page.html.contains("<title>Part &lt;1&gt; | The Structured Thoughts Blog</title>"));
        assert!(page.html.contains(r#"<a href="/series">&larr; A Series</a>"#));
        assert!(page.html.contains("1 February 2022"));
        assert!(page.html.contains("1 March 2022"));
        assert!(page.html.contains("<p>First part.</p>"));
    }

    #[test]
    fn test_render_post_lists_children() {
        let (_tmp, store) = site();
        let response = store.post("series.mdx").unwrap();
        let page = renderer().render_post(&store, &response).unwrap();
        assert!(page.html.contains("In this series"));
        assert!(page.html.contains(r#"<a href="/series/part-1">Part &lt;1&gt;</a>"#));
        assert!(!page.html.contains("post-parent"));
    }

    #[test]
    fn test_hydration_island() {
        let (_tmp, store) = site();
        let response = store.page("about.mdx").unwrap();
        let page = renderer().render_page(&response).unwrap();
        assert!(page.html.contains(r#"<script type="application/json" id="__CONTENT_QUERY__">"#));
        assert!(page.html.contains(r#""variables":{"relativePath":"about.mdx"}"#));
        // Untitled pages use the site title alone
        assert!(page.html.contains("<title>The Structured Thoughts Blog</title>"));
    }

    #[test]
    fn test_hydration_island_escapes_markup() {
        let island = hydration_island(&serde_json::json!({"query": "</script>"}));
        assert!(!island.contains("</script>"));
        assert!(island.contains("\\u003c/script\\u003e"));
    }

    #[test]
    fn test_render_index() {
        let (_tmp, store) = site();
        let today = NaiveDate::from_ymd_opt(2022, 6, 1).unwrap();
        let page = renderer().render_index(&store, today).unwrap();
        assert!(page.html.contains("Hello from home."));
        let newest = page.html.find("/series/part-1").unwrap();
        let oldest = page.html.find(r#"href="/series""#).unwrap();
        assert!(newest < oldest);
        assert!(page.html.contains("(1 Feb)"));
        assert!(page.html.contains(r#""last":-1"#));
    }

    #[test]
    fn test_render_index_other_year_dates() {
        let (_tmp, store) = site();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let page = renderer().render_index(&store, today).unwrap();
        assert!(page.html.contains("(1 Jan 2022)"));
    }

    #[test]
    fn test_render_not_found_resolution() {
        let (_tmp, store) = site();
        let resolver = PathResolver::new(&Default::default());
        let resolution = resolve(
            &store,
            &resolver,
            &RouteParams::Single("missing".to_string()),
        );
        let page = renderer().render_resolution(&store, &resolution).unwrap();
        assert_eq!(page.status, PageStatus::NotFound);
        assert!(page.html.contains("Not Found"));
        assert!(page.html.contains("<code>/missing</code>"));
    }
}
