//! Frontier scheduling behavior: ordering, dedupe, and bounds.

use seocrawl::FrontierScheduler;

#[test]
fn breadth_first_ordering() {
    let mut frontier = FrontierScheduler::new(100, 5);
    frontier.seed("https://example.com/", 0);

    let root = frontier.next_url().unwrap();
    assert_eq!(root.depth, 0);

    frontier.push_links(
        ["https://example.com/a", "https://example.com/b"],
        1,
    );
    let a = frontier.next_url().unwrap();
    frontier.push_links(["https://example.com/a/deep"], 2);
    let b = frontier.next_url().unwrap();

    // /b was queued before /a's children, so it comes out first.
    assert_eq!(a.url, "https://example.com/a");
    assert_eq!(b.url, "https://example.com/b");
    assert_eq!(frontier.next_url().unwrap().url, "https://example.com/a/deep");
}

#[test]
fn max_pages_caps_claims() {
    let mut frontier = FrontierScheduler::new(2, 5);
    frontier.seed("https://example.com/", 0);
    frontier.push_links(
        [
            "https://example.com/1",
            "https://example.com/2",
            "https://example.com/3",
        ],
        1,
    );

    assert!(frontier.next_url().is_some());
    assert!(frontier.next_url().is_some());
    assert!(frontier.next_url().is_none());
    assert_eq!(frontier.visited_count(), 2);
}

#[test]
fn entries_beyond_max_depth_are_skipped() {
    let mut frontier = FrontierScheduler::new(100, 1);
    frontier.seed("https://example.com/", 0);
    assert!(frontier.next_url().is_some());

    frontier.push_links(["https://example.com/ok"], 1);
    frontier.push_links(["https://example.com/too-deep"], 2);

    assert_eq!(frontier.next_url().unwrap().url, "https://example.com/ok");
    assert!(frontier.next_url().is_none());
    assert_eq!(frontier.skipped_count(), 1);
}

#[test]
fn fragment_variants_count_as_one_visit() {
    let mut frontier = FrontierScheduler::new(100, 5);
    frontier.seed("https://example.com/page", 0);
    assert!(frontier.next_url().is_some());

    frontier.push_links(
        [
            "https://example.com/page#section",
            "https://example.com/page#other",
        ],
        1,
    );
    assert!(frontier.next_url().is_none());
    assert_eq!(frontier.visited_count(), 1);
}

#[test]
fn asset_urls_never_enqueue() {
    let mut frontier = FrontierScheduler::new(100, 5);
    frontier.seed("https://example.com/", 0);
    assert!(frontier.next_url().is_some());

    frontier.push_links(
        [
            "https://example.com/style.css",
            "https://example.com/photo.JPG",
            "https://example.com/doc.pdf",
            "https://example.com/app.js",
            "https://example.com/real-page",
        ],
        1,
    );
    assert_eq!(frontier.pending(), 1);
    assert_eq!(frontier.next_url().unwrap().url, "https://example.com/real-page");
}

#[test]
fn duplicate_links_within_a_batch_collapse() {
    let mut frontier = FrontierScheduler::new(100, 5);
    frontier.seed("https://example.com/", 0);
    assert!(frontier.next_url().is_some());

    frontier.push_links(
        [
            "https://example.com/dup",
            "https://example.com/dup",
            "https://example.com/dup#frag",
        ],
        1,
    );
    assert_eq!(frontier.pending(), 1);
}
