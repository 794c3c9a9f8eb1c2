//! DOM stability polling for JavaScript-heavy pages.

use chromiumoxide::Page;
use std::time::Duration;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(500);
const MAX_POLLS: u32 = 10;
const STABLE_READINGS: u32 = 3;

/// Tracks consecutive unchanged size readings.
struct StabilityTracker {
    last_size: i64,
    stable: u32,
}

impl StabilityTracker {
    fn new() -> Self {
        Self {
            last_size: -1,
            stable: 0,
        }
    }

    /// Record a reading; true once [`STABLE_READINGS`] consecutive readings
    /// matched the one before them.
    fn observe(&mut self, size: i64) -> bool {
        if size == self.last_size {
            self.stable += 1;
        } else {
            self.stable = 0;
            self.last_size = size;
        }
        self.stable >= STABLE_READINGS
    }
}

/// Wait until `document.body.innerHTML.length` stops changing.
///
/// The DOM counts as stable after three consecutive unchanged readings at
/// half-second intervals. Pages still mutating after five seconds proceed
/// anyway; a busy page is extracted as-is rather than failed.
pub async fn wait_for_stable_dom(page: &Page) {
    let mut tracker = StabilityTracker::new();
    for _ in 0..MAX_POLLS {
        tokio::time::sleep(POLL_INTERVAL).await;
        let size: i64 = match page
            .evaluate("document.body ? document.body.innerHTML.length : 0")
            .await
        {
            Ok(result) => result.into_value().unwrap_or(0),
            Err(e) => {
                debug!("stability probe failed: {e}");
                return;
            }
        };
        if tracker.observe(size) {
            debug!(size, "DOM stable");
            return;
        }
    }
    debug!("DOM still changing after {MAX_POLLS} polls, proceeding");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_unchanged_readings_are_required() {
        let mut tracker = StabilityTracker::new();
        assert!(!tracker.observe(100)); // baseline
        assert!(!tracker.observe(100)); // 1 unchanged
        assert!(!tracker.observe(100)); // 2 unchanged
        assert!(tracker.observe(100)); // 3 unchanged
    }

    #[test]
    fn a_change_resets_the_count() {
        let mut tracker = StabilityTracker::new();
        tracker.observe(100);
        tracker.observe(100);
        tracker.observe(100);
        assert!(!tracker.observe(250));
        assert!(!tracker.observe(250));
        assert!(!tracker.observe(250));
        assert!(tracker.observe(250));
    }
}
