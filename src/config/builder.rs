//! Fluent builder for [`CrawlConfig`] with validation at `build()`.

use std::collections::BTreeSet;

use crate::error::CrawlError;

use super::types::CrawlConfig;

/// Builder for [`CrawlConfig`]. All fields default to the values of
/// [`CrawlConfig::default`]; `build()` rejects out-of-range combinations.
#[derive(Debug, Clone)]
pub struct CrawlConfigBuilder {
    config: CrawlConfig,
}

impl Default for CrawlConfigBuilder {
    fn default() -> Self {
        Self {
            config: CrawlConfig::default(),
        }
    }
}

impl CrawlConfigBuilder {
    #[must_use]
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Politeness delay bounds in seconds.
    #[must_use]
    pub fn delay_range(mut self, delay_min: f64, delay_max: f64) -> Self {
        self.config.delay_min = delay_min;
        self.config.delay_max = delay_max;
        self
    }

    /// Navigation timeout in milliseconds.
    #[must_use]
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.timeout_ms = timeout_ms;
        self
    }

    #[must_use]
    pub fn respect_robots(mut self, respect_robots: bool) -> Self {
        self.config.respect_robots = respect_robots;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Replace the set of blocked resource kinds.
    #[must_use]
    pub fn blocked_resource_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.blocked_resource_kinds =
            kinds.into_iter().map(Into::into).collect::<BTreeSet<_>>();
        self
    }

    #[must_use]
    pub fn chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self.config.chunk_overlap = chunk_overlap;
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    /// Validate and produce the immutable config.
    pub fn build(self) -> Result<CrawlConfig, CrawlError> {
        let c = &self.config;
        if c.max_pages == 0 {
            return Err(CrawlError::Config("max_pages must be > 0".into()));
        }
        if !c.delay_min.is_finite() || !c.delay_max.is_finite() || c.delay_min < 0.0 {
            return Err(CrawlError::Config(
                "delay bounds must be finite and non-negative".into(),
            ));
        }
        if c.delay_min > c.delay_max {
            return Err(CrawlError::Config(format!(
                "delay_min ({}) must not exceed delay_max ({})",
                c.delay_min, c.delay_max
            )));
        }
        if c.timeout_ms == 0 {
            return Err(CrawlError::Config("timeout must be > 0 ms".into()));
        }
        if c.chunk_size == 0 {
            return Err(CrawlError::Config("chunk_size must be > 0".into()));
        }
        if c.chunk_overlap >= c.chunk_size {
            return Err(CrawlError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                c.chunk_overlap, c.chunk_size
            )));
        }
        if c.user_agent.trim().is_empty() {
            return Err(CrawlError::Config("user_agent must not be empty".into()));
        }
        Ok(self.config)
    }
}
