use scraper::{ElementRef, Html, Selector};
use tokio::time::Instant;
use tracing::debug;

use crate::error::Result;
use crate::http::ForumClient;
use crate::pace::pace;
use crate::session::Session;

/// Listing pages hold this many rows; a shorter page is the final page.
///
/// A full final page therefore costs one extra request that comes back
/// empty before the loop stops. Accepted, the degraded case is harmless.
const FULL_PAGE_ROWS: usize = 10;

/// Type cell text marking a "my posts" row as a comment rather than a
/// top-level article.
const COMMENT_TYPE_LABEL: &str = "댓글";

/// One authored comment from the "my comments" listing or the per-article
/// feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRef {
    pub board: String,
    pub article_id: String,
    /// Listing page the comment appeared on. `None` when the reference came
    /// from the per-article feed, which carries no page.
    pub page: Option<String>,
    pub comment_id: String,
    /// Article title as rendered in the listing, for log lines only.
    pub title: Option<String>,
}

impl CommentRef {
    /// Build a reference from the per-article comment feed, where only the
    /// board, article and comment ids are known.
    pub fn from_feed(board: &str, article_id: &str, comment_id: i64) -> Self {
        Self {
            board: board.to_string(),
            article_id: article_id.to_string(),
            page: None,
            comment_id: comment_id.to_string(),
            title: None,
        }
    }
}

/// One authored item from the "my posts" listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRef {
    pub board: String,
    pub article_id: String,
    pub category: String,
    /// True when the row is a comment the user wrote on someone else's
    /// article, false for a top-level article of their own.
    pub is_comment: bool,
    pub title: Option<String>,
}

/// Fetch every page of the user's recent-comments listing.
///
/// Pages are 1-indexed and fetched strictly in order; a page with fewer than
/// ten rows ends the listing. Consecutive fetches keep the configured
/// minimum spacing measured request-start to request-start.
pub async fn fetch_recent_comments(
    client: &ForumClient,
    session: &Session,
    user_id: &str,
) -> Result<(Vec<CommentRef>, Session)> {
    let listing_path = format!("users/board/{user_id}/comment");
    let mut comments = Vec::new();
    let mut session = session.clone();
    let mut page: u32 = 1;

    loop {
        let started = Instant::now();
        let path = format!("{listing_path}?page={page}");
        let response = client.get(&path, Some(&listing_path), &session).await?;
        session = session.merge(&response.cookies);

        let (rows, mut parsed) = parse_comment_listing(&response.body);
        debug!(page, rows, parsed = parsed.len(), "comment listing page");
        comments.append(&mut parsed);

        if rows < FULL_PAGE_ROWS {
            break;
        }
        pace(started, client.pacing().comment_pages).await;
        page += 1;
    }

    Ok((comments, session))
}

/// Fetch every page of the user's posts listing. Same pagination policy as
/// the comment listing, with its own spacing.
pub async fn fetch_owned_posts(
    client: &ForumClient,
    session: &Session,
) -> Result<(Vec<PostRef>, Session)> {
    let mut posts = Vec::new();
    let mut session = session.clone();
    let mut page: u32 = 1;

    loop {
        let started = Instant::now();
        let path = format!("users/posts?page={page}");
        let response = client.get(&path, Some(&path), &session).await?;
        session = session.merge(&response.cookies);

        let (rows, mut parsed) = parse_post_listing(&response.body);
        debug!(page, rows, parsed = parsed.len(), "post listing page");
        posts.append(&mut parsed);

        if rows < FULL_PAGE_ROWS {
            break;
        }
        pace(started, client.pacing().post_pages).await;
        page += 1;
    }

    Ok((posts, session))
}

/// Parse one comment-listing page, returning the raw row count (which drives
/// the stop rule) and the rows that parsed. Malformed rows are skipped.
fn parse_comment_listing(body: &str) -> (usize, Vec<CommentRef>) {
    let row_selector = Selector::parse("table > tbody tr").unwrap();
    let anchor_selector = Selector::parse("a").unwrap();
    let document = Html::parse_document(body);

    let mut rows = 0;
    let mut comments = Vec::new();
    for row in document.select(&row_selector) {
        rows += 1;
        if let Some(comment) = parse_comment_row(&row, &anchor_selector) {
            comments.push(comment);
        }
    }
    (rows, comments)
}

fn parse_comment_row(row: &ElementRef, anchor_selector: &Selector) -> Option<CommentRef> {
    let anchor = row.select(anchor_selector).next()?;
    let href = anchor.value().attr("href")?;
    let args = parse_href_args(href)?;
    let [board, article_id, page, comment_id] = args.as_slice() else {
        return None;
    };

    let title = anchor.text().collect::<String>().trim().to_string();
    Some(CommentRef {
        board: board.to_string(),
        article_id: article_id.to_string(),
        page: Some(page.to_string()),
        comment_id: comment_id.to_string(),
        title: (!title.is_empty()).then_some(title),
    })
}

fn parse_post_listing(body: &str) -> (usize, Vec<PostRef>) {
    let row_selector = Selector::parse("table > tbody tr").unwrap();
    let anchor_selector = Selector::parse("a").unwrap();
    let category_selector = Selector::parse(".cate1").unwrap();
    let type_selector = Selector::parse(".cate2").unwrap();
    let document = Html::parse_document(body);

    let mut rows = 0;
    let mut posts = Vec::new();
    for row in document.select(&row_selector) {
        rows += 1;

        let Some(anchor) = row.select(&anchor_selector).next() else {
            continue;
        };
        let Some(args) = anchor.value().attr("href").and_then(parse_href_args) else {
            continue;
        };
        let [board, article_id, ..] = args.as_slice() else {
            continue;
        };

        let category = row
            .select(&category_selector)
            .next()
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .unwrap_or_default();
        let is_comment = row
            .select(&type_selector)
            .next()
            .map(|cell| cell.text().collect::<String>().trim() == COMMENT_TYPE_LABEL)
            .unwrap_or(false);
        let title = anchor.text().collect::<String>().trim().to_string();

        posts.push(PostRef {
            board: board.to_string(),
            article_id: article_id.to_string(),
            category,
            is_comment,
            title: (!title.is_empty()).then_some(title),
        });
    }
    (rows, posts)
}

/// Extract the single-quoted argument list packed into a listing anchor's
/// `href`. The slice between the first and last quote, split on `', '`,
/// yields the reference fields.
fn parse_href_args(href: &str) -> Option<Vec<&str>> {
    let first = href.find('\'')?;
    let last = href.rfind('\'')?;
    if last <= first {
        return None;
    }
    Some(href[first + 1..last].split("', '").collect())
}
