//! Content module - documents, rich-text bodies and the content store

mod document;
mod frontmatter;
mod fs_store;
pub mod richtext;
mod store;

pub use document::{CollectionKind, ContentDocument, Page, Post, SystemInfo};
pub use frontmatter::{parse_date_string, FrontMatter};
pub use fs_store::FsContentStore;
pub use richtext::{EmbedNode, RichTextDocument, RichTextNode};
pub use store::{
    Connection, ConnectionArgs, ContentStore, Edge, PostFilter, QueryResponse, SortField,
    StoreError, PAGE_CONNECTION_QUERY, PAGE_QUERY, POST_CONNECTION_QUERY, POST_QUERY,
};
