use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};

use pung_client::comments::fetch_article_comments;
use pung_client::explode::{explode_article, explode_comment};
use pung_client::listing::{fetch_owned_posts, fetch_recent_comments};
use pung_client::pace::pace;
use pung_client::profile::fetch_profile;
use pung_client::remove::remove_comment;
use pung_client::{ClientError, CommentRef, ForumClient, Pacing, PostRef, Profile, Session};

use crate::group::group_by_board;
use crate::report::{CleanupReport, PhaseReport};

pub const DEFAULT_BASE_URL: &str = "https://quasarzone.com/";

/// Boards that refuse edits after a grace period; exploding there only
/// produces failures.
pub const DEFAULT_BLACKLIST: [&str; 2] = ["qsz_qna", "qm_temporary"];

/// Backoff applied when a deletion answers 429.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Wait before re-attempting the same comment.
    pub delay: Duration,
    /// Attempts on one comment before counting it as failed. `None` keeps
    /// retrying until the limiter relents.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            max_attempts: None,
        }
    }
}

/// Options for configuring a cleanup run
pub struct CleanupOptions {
    pub base_url: String,
    /// Boards whose articles and comment sweeps are never touched.
    pub blacklist: BTreeSet<String>,
    pub retry: RetryPolicy,
    pub pacing: Pacing,
    /// Minimum spacing between deletion attempts.
    pub remove_spacing: Duration,
    /// Minimum spacing after a comment explode.
    pub explode_comment_spacing: Duration,
    /// Minimum envelope around one article explode, form fetch included.
    pub explode_article_spacing: Duration,
    /// Settling pause between phases.
    pub phase_cooldown: Duration,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            blacklist: DEFAULT_BLACKLIST.iter().map(|s| s.to_string()).collect(),
            retry: RetryPolicy::default(),
            pacing: Pacing::default(),
            remove_spacing: Duration::from_millis(800),
            explode_comment_spacing: Duration::from_millis(400),
            explode_article_spacing: Duration::from_millis(1600),
            phase_cooldown: Duration::from_millis(2000),
        }
    }
}

impl CleanupOptions {
    /// Options pointed at `base_url` with every sleep zeroed and retries
    /// bounded, for tests.
    pub fn unpaced(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            retry: RetryPolicy {
                delay: Duration::ZERO,
                max_attempts: Some(3),
            },
            pacing: Pacing::none(),
            remove_spacing: Duration::ZERO,
            explode_comment_spacing: Duration::ZERO,
            explode_article_spacing: Duration::ZERO,
            phase_cooldown: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Callback for reporting cleanup progress
pub type CleanupProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Shared state threaded through the passes.
struct PassContext<'a> {
    client: &'a ForumClient,
    profile: &'a Profile,
    retry: &'a RetryPolicy,
    remove_spacing: Duration,
    explode_comment_spacing: Duration,
    progress: &'a CleanupProgressCallback,
}

/// How one comment ended up after deletion and fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentFate {
    Deleted,
    Exploded,
    Failed,
    /// The parent article is already gone; nothing left to act on.
    ArticleGone,
}

fn tally(report: &mut PhaseReport, fate: CommentFate) {
    match fate {
        CommentFate::Deleted => report.deleted += 1,
        CommentFate::Exploded => report.exploded += 1,
        CommentFate::Failed => report.failed += 1,
        CommentFate::ArticleGone => report.skipped += 1,
    }
}

/// Execute a full cleanup with the given options
/// Returns the final report
pub async fn execute_cleanup(
    options: CleanupOptions,
    session: Session,
    progress_callback: Option<CleanupProgressCallback>,
) -> Result<CleanupReport, ClientError> {
    let CleanupOptions {
        base_url,
        blacklist,
        retry,
        pacing,
        remove_spacing,
        explode_comment_spacing,
        explode_article_spacing,
        phase_cooldown,
    } = options;

    // No-op callback when the caller does not want progress lines.
    let progress: CleanupProgressCallback =
        progress_callback.unwrap_or_else(|| Arc::new(|_message: String| {}));

    let started_at = Local::now();
    let client = ForumClient::with_pacing(&base_url, pacing)?;

    let (profile, session) = fetch_profile(&client, &session).await?;
    progress(format!(
        "Signed in as {} ({})",
        profile.nickname, profile.planet
    ));
    info!(nickname = %profile.nickname, planet = %profile.planet, "session verified");

    let ctx = PassContext {
        client: &client,
        profile: &profile,
        retry: &retry,
        remove_spacing,
        explode_comment_spacing,
        progress: &progress,
    };

    // Recent comments first; the sweep later skips the articles this
    // listing already covered.
    let (recent, session, comment_pass) =
        match fetch_recent_comments(&client, &session, &profile.user_id).await {
            Ok((recent, session)) => {
                progress(format!("Found {} recent comments", recent.len()));
                let (pass, session) = run_comment_pass(&ctx, &recent, session).await;
                (recent, session, pass)
            }
            Err(err) => (
                Vec::new(),
                session,
                PhaseReport::aborted_with(err.to_string()),
            ),
        };

    // The article and sweep passes both start from the owned-posts listing;
    // without it neither can run.
    let (article_pass, sweep_pass, listed_posts) =
        match fetch_owned_posts(&client, &session).await {
            Ok((posts, session)) => {
                progress(format!("Found {} owned posts", posts.len()));
                sleep(phase_cooldown).await;
                let (article_pass, session) =
                    run_article_pass(&ctx, &blacklist, explode_article_spacing, &posts, session)
                        .await;
                sleep(phase_cooldown).await;
                let (sweep_pass, _session) =
                    run_sweep_pass(&ctx, &blacklist, &posts, &recent, session).await;
                (article_pass, sweep_pass, posts.len())
            }
            Err(err) => {
                let reason = err.to_string();
                (
                    PhaseReport::aborted_with(reason.clone()),
                    PhaseReport::aborted_with(reason),
                    0,
                )
            }
        };

    let report = CleanupReport {
        nickname: profile.nickname.clone(),
        planet: profile.planet.clone(),
        listed_comments: recent.len(),
        listed_posts,
        started_at,
        finished_at: Local::now(),
        comment_pass,
        article_pass,
        sweep_pass,
    };
    info!(
        handled = report.total_handled(),
        failed = report.total_failed(),
        "cleanup finished"
    );

    Ok(report)
}

/// Delete one comment, backing off on rate limits and falling back to an
/// explode when the forum refuses to delete a replied-to comment.
async fn remove_with_fallback(
    ctx: &PassContext<'_>,
    comment: &CommentRef,
    session: &Session,
) -> Result<(CommentFate, Session), ClientError> {
    let mut session = session.clone();
    let mut attempts: u32 = 0;

    loop {
        let started = Instant::now();
        let (outcome, updated) = remove_comment(ctx.client, &session, comment).await?;
        session = updated;
        pace(started, ctx.remove_spacing).await;

        if outcome.rate_limited {
            attempts += 1;
            if let Some(max) = ctx.retry.max_attempts
                && attempts >= max
            {
                warn!(comment = %comment.comment_id, attempts, "rate limit retries exhausted");
                return Ok((CommentFate::Failed, session));
            }
            (ctx.progress)(format!(
                "[!] Rate limited, retrying comment {} in {}ms",
                comment.comment_id,
                ctx.retry.delay.as_millis()
            ));
            sleep(ctx.retry.delay).await;
            continue;
        }

        if outcome.success {
            return Ok((CommentFate::Deleted, session));
        }

        if outcome.must_edit {
            let started = Instant::now();
            let (exploded, updated) =
                explode_comment(ctx.client, &session, &ctx.profile.csrf_token, comment).await?;
            session = updated;
            pace(started, ctx.explode_comment_spacing).await;

            if !exploded {
                warn!(comment = %comment.comment_id, "comment explosion failed");
                (ctx.progress)(format!(
                    "[!] Comment {} explosion failed",
                    comment.comment_id
                ));
                return Ok((CommentFate::Failed, session));
            }
            return Ok((CommentFate::Exploded, session));
        }

        if outcome.article_removed {
            debug!(comment = %comment.comment_id, "parent article already removed");
            return Ok((CommentFate::ArticleGone, session));
        }

        let reason = outcome.fail_reason.as_deref().unwrap_or("unknown reason");
        warn!(comment = %comment.comment_id, reason, "comment deletion failed");
        (ctx.progress)(format!(
            "[!] Comment {} deletion failed: {}",
            comment.comment_id, reason
        ));
        return Ok((CommentFate::Failed, session));
    }
}

/// Delete every listed comment in listing order.
async fn run_comment_pass(
    ctx: &PassContext<'_>,
    comments: &[CommentRef],
    session: Session,
) -> (PhaseReport, Session) {
    let mut report = PhaseReport::default();
    let mut session = session;

    for (idx, comment) in comments.iter().enumerate() {
        (ctx.progress)(format!("Removing comment {}/{}", idx + 1, comments.len()));

        match remove_with_fallback(ctx, comment, &session).await {
            Ok((fate, updated)) => {
                session = updated;
                tally(&mut report, fate);
            }
            Err(err) => {
                error!(error = %err, "comment pass aborted");
                report.aborted = Some(err.to_string());
                break;
            }
        }
    }

    (report, session)
}

/// Explode every owned article, one board at a time.
async fn run_article_pass(
    ctx: &PassContext<'_>,
    blacklist: &BTreeSet<String>,
    explode_article_spacing: Duration,
    posts: &[PostRef],
    session: Session,
) -> (PhaseReport, Session) {
    let mut report = PhaseReport::default();
    let mut session = session;

    let groups = group_by_board(
        posts
            .iter()
            .filter(|post| !post.is_comment)
            .map(|post| (post.board.as_str(), post.article_id.as_str())),
    );
    let total: usize = groups
        .iter()
        .filter(|(board, _)| !blacklist.contains(board.as_str()))
        .map(|(_, ids)| ids.len())
        .sum();
    let mut position = 0usize;

    'boards: for (board, article_ids) in &groups {
        if blacklist.contains(board.as_str()) {
            debug!(board = %board, articles = article_ids.len(), "skipping blacklisted board");
            report.skipped += article_ids.len();
            continue;
        }

        for article_id in article_ids {
            position += 1;
            (ctx.progress)(format!(
                "Exploding article {position}/{total} ({board}/{article_id})"
            ));

            let started = Instant::now();
            match explode_article(ctx.client, &session, board, article_id).await {
                Ok((true, updated)) => {
                    session = updated;
                    report.exploded += 1;
                }
                Ok((false, updated)) => {
                    session = updated;
                    report.failed += 1;
                    warn!(board = %board, article = %article_id, "article explosion failed");
                    (ctx.progress)(format!(
                        "[!] Article {article_id} explosion failed ({board})"
                    ));
                }
                Err(err) => {
                    error!(error = %err, "article pass aborted");
                    report.aborted = Some(err.to_string());
                    break 'boards;
                }
            }
            pace(started, explode_article_spacing).await;
        }
    }

    (report, session)
}

/// Walk the articles the account commented on and explode any comment in
/// their feeds still attributed to it.
async fn run_sweep_pass(
    ctx: &PassContext<'_>,
    blacklist: &BTreeSet<String>,
    posts: &[PostRef],
    recent: &[CommentRef],
    session: Session,
) -> (PhaseReport, Session) {
    let mut report = PhaseReport::default();
    let mut session = session;

    // Articles the recent-comments pass already went through.
    let already_handled = group_by_board(
        recent
            .iter()
            .map(|comment| (comment.board.as_str(), comment.article_id.as_str())),
    );
    let groups = group_by_board(
        posts
            .iter()
            .filter(|post| post.is_comment)
            .map(|post| (post.board.as_str(), post.article_id.as_str())),
    );

    let mut swept = 0usize;

    'boards: for (board, article_ids) in &groups {
        if blacklist.contains(board.as_str()) {
            report.skipped += article_ids.len();
            continue;
        }
        let handled_here = already_handled.get(board);

        for article_id in article_ids {
            if handled_here.is_some_and(|set| set.contains(article_id)) {
                report.skipped += 1;
                continue;
            }

            let (feed, updated) =
                match fetch_article_comments(ctx.client, &session, board, article_id).await {
                    Ok(result) => result,
                    Err(err) => {
                        error!(error = %err, "sweep pass aborted");
                        report.aborted = Some(err.to_string());
                        break 'boards;
                    }
                };
            session = updated;

            for entry in &feed {
                if entry.user_id != ctx.profile.user_id {
                    continue;
                }
                swept += 1;
                (ctx.progress)(format!(
                    "Sweeping comment {swept} ({board}/{article_id})"
                ));

                let comment = CommentRef::from_feed(board, article_id, entry.id);
                match remove_with_fallback(ctx, &comment, &session).await {
                    Ok((fate, updated)) => {
                        session = updated;
                        tally(&mut report, fate);
                    }
                    Err(err) => {
                        error!(error = %err, "sweep pass aborted");
                        report.aborted = Some(err.to_string());
                        break 'boards;
                    }
                }
            }
        }
    }

    (report, session)
}
