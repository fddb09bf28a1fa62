//! Configuration module

mod error;
mod site;

pub use error::ConfigError;
pub use site::CarbonConfig;
pub use site::CollectionConfig;
pub use site::CollectionsConfig;
pub use site::ContentFormat;
pub use site::EmbedsConfig;
pub use site::FallbackMode;
pub use site::HighlightConfig;
pub use site::SiteConfig;
