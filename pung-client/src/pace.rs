use std::time::Duration;
use tokio::time::Instant;

/// Minimum request-start to next-request-start intervals for the paginated
/// fetchers. Defaults follow the request rate the forum tolerates.
#[derive(Debug, Clone)]
pub struct Pacing {
    /// Between "my comments" listing pages.
    pub comment_pages: Duration,
    /// Between "my posts" listing pages.
    pub post_pages: Duration,
    /// Between per-article comment feed pages.
    pub feed_pages: Duration,
    /// Between an article's edit-form GET and its update POST.
    pub edit_form: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            comment_pages: Duration::from_millis(500),
            post_pages: Duration::from_millis(600),
            feed_pages: Duration::from_millis(500),
            edit_form: Duration::from_millis(800),
        }
    }
}

impl Pacing {
    /// All-zero intervals, for tests that should not sleep.
    pub fn none() -> Self {
        Self {
            comment_pages: Duration::ZERO,
            post_pages: Duration::ZERO,
            feed_pages: Duration::ZERO,
            edit_form: Duration::ZERO,
        }
    }
}

/// Sleep out the remainder of `min_interval` measured from `started`.
///
/// Returns immediately when the work since `started` already covers the
/// interval, so a slow response is not penalized twice.
pub async fn pace(started: Instant, min_interval: Duration) {
    tokio::time::sleep_until(started + min_interval).await;
}
