use serde::Deserialize;
use tokio::time::Instant;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::http::ForumClient;
use crate::pace::pace;
use crate::session::Session;

/// One comment row from the per-article feed. The feed also carries best /
/// cider / sponsor sections, which never hold user-deletable rows and are
/// ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ArticleComment {
    pub id: i64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_nick: String,
}

#[derive(Debug, Deserialize)]
struct CommentFeed {
    #[serde(default)]
    comm_cnt: i64,
    comm_list: Option<CommentFeedList>,
}

#[derive(Debug, Deserialize)]
struct CommentFeedList {
    comments: Option<CommentFeedPage>,
}

#[derive(Debug, Deserialize)]
struct CommentFeedPage {
    #[serde(default)]
    data: Vec<ArticleComment>,
    #[serde(default = "missing_last_page")]
    last_page: i64,
}

/// A feed without pagination info stops after the page in hand.
fn missing_last_page() -> i64 {
    -1
}

/// Fetch every page of an article's comment feed, oldest-first.
///
/// Pagination follows the feed's own `last_page` field: the loop stops once
/// `last_page <= page`, so a malformed or empty feed stops after one
/// request. Pages keep the configured minimum spacing.
pub async fn fetch_article_comments(
    client: &ForumClient,
    session: &Session,
    board: &str,
    article_id: &str,
) -> Result<(Vec<ArticleComment>, Session)> {
    let referer = format!("bbs/{board}/views/{article_id}");
    let mut comments = Vec::new();
    let mut session = session.clone();
    let mut page: i64 = 1;

    loop {
        let started = Instant::now();
        let path = format!(
            "comments/{board}/getComment?boardName={board}&writeId={article_id}&page={page}&order=old"
        );
        let response = client.get(&path, Some(&referer), &session).await?;
        session = session.merge(&response.cookies);

        if !response.status.is_success() {
            return Err(ClientError::UnexpectedStatus {
                endpoint: format!("comment feed for {board}/{article_id}"),
                status: response.status,
            });
        }

        let feed: CommentFeed = serde_json::from_str(&response.body).map_err(|err| {
            ClientError::ParseError(format!("comment feed for {board}/{article_id}: {err}"))
        })?;
        let (mut data, last_page) = match feed.comm_list.and_then(|list| list.comments) {
            Some(block) => (block.data, block.last_page),
            None => (Vec::new(), missing_last_page()),
        };
        debug!(
            board,
            article_id,
            page,
            rows = data.len(),
            total = feed.comm_cnt,
            "comment feed page"
        );
        comments.append(&mut data);

        if last_page <= page {
            break;
        }
        pace(started, client.pacing().feed_pages).await;
        page += 1;
    }

    Ok((comments, session))
}
