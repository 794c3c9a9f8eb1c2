//! Crawl configuration.
//!
//! `CrawlConfig` is immutable for the life of one crawl. Construct it through
//! the validating [`builder`](CrawlConfig::builder); invalid bounds are
//! rejected at build time rather than checked in the hot path.

pub mod builder;
pub mod types;

pub use builder::CrawlConfigBuilder;
pub use types::{CrawlConfig, DEFAULT_USER_AGENT};
