//! Bounded breadth-first frontier scheduler.
//!
//! Pure state machine driving traversal order: a FIFO queue of
//! `(url, depth)` entries plus a monotonic visited set. Each entry moves
//! `queued -> visiting -> visited`, or is skipped terminally when it was
//! already visited or lies deeper than `max_depth`. Strict FIFO ordering
//! guarantees shallow pages are always claimed before deeper ones, with
//! discovery order breaking ties among same-depth URLs.

use std::collections::{HashSet, VecDeque};

use url::Url;

/// Extensions that never lead to crawlable pages; dropped during expansion.
const ASSET_EXTENSIONS: &[&str] = &[".pdf", ".jpg", ".png", ".gif", ".css", ".js"];

/// One pending traversal step. Exclusively owned by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: usize,
}

/// FIFO frontier with depth and page limits.
#[derive(Debug)]
pub struct FrontierScheduler {
    queue: VecDeque<FrontierEntry>,
    visited: HashSet<String>,
    max_pages: usize,
    max_depth: usize,
    skipped: usize,
}

impl FrontierScheduler {
    #[must_use]
    pub fn new(max_pages: usize, max_depth: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            visited: HashSet::new(),
            max_pages,
            max_depth,
            skipped: 0,
        }
    }

    /// Seed one URL, typically `(root_url, 0)` for full-site mode.
    pub fn seed(&mut self, url: impl Into<String>, depth: usize) {
        self.queue.push_back(FrontierEntry {
            url: url.into(),
            depth,
        });
    }

    /// Claim the next URL for fetching.
    ///
    /// Pops the queue head, discarding entries that were already visited or
    /// exceed `max_depth`, and marks the claimed URL visited before returning
    /// it. Returns `None` when the queue is drained or `max_pages` URLs have
    /// been claimed.
    pub fn next_url(&mut self) -> Option<FrontierEntry> {
        while self.visited.len() < self.max_pages {
            let entry = self.queue.pop_front()?;
            let canonical = canonicalize(&entry.url);
            if entry.depth > self.max_depth || self.visited.contains(&canonical) {
                self.skipped += 1;
                continue;
            }
            self.visited.insert(canonical);
            return Some(entry);
        }
        None
    }

    /// Enqueue links discovered on a fetched page at `depth`.
    ///
    /// Filters out asset URLs, already-visited URLs, and duplicates within the
    /// batch; surviving links keep their discovery order.
    pub fn push_links<I, S>(&mut self, links: I, depth: usize)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut batch_seen = HashSet::new();
        for link in links {
            let url = link.into();
            if is_asset_url(&url) {
                continue;
            }
            let canonical = canonicalize(&url);
            if self.visited.contains(&canonical) || !batch_seen.insert(canonical) {
                continue;
            }
            self.queue.push_back(FrontierEntry { url, depth });
        }
    }

    /// Number of URLs that entered the visiting state.
    #[must_use]
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Entries discarded for depth or duplicate violations.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Canonical form used for visited-set membership: parsed URL with the
/// fragment stripped, falling back to the raw string for unparseable input.
#[must_use]
pub fn canonicalize(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}

/// True when the URL ends in a non-page asset extension.
#[must_use]
pub fn is_asset_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    ASSET_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}
