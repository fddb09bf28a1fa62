//! Routing - from URLs to content documents
//!
//! * [`resolver`] turns route parameters into collection-relative paths
//! * [`disambiguate`] fetches a path as a post, then as a page
//! * [`paths`] enumerates the paths to pre-render and matches URLs

pub mod disambiguate;
pub mod paths;
pub mod resolver;

pub use disambiguate::{resolve, NotFound, Resolution, ResolveState};
pub use paths::{
    document_url, enumerate, EdgeFilter, RouteMatch, RoutePattern, RouteTable, StaticPath,
    StaticPaths,
};
pub use resolver::{AddressMode, PathResolver, RouteParams};
