//! Rendering - Markdown, rich-text bodies and complete pages

mod markdown;
mod page;
mod richtext;

pub use markdown::MarkdownRenderer;
pub use page::{PageRenderer, PageStatus, RenderedPage};
pub use richtext::RichTextRenderer;
