use scraper::{Html, Selector};
use tokio::time::Instant;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::http::ForumClient;
use crate::listing::CommentRef;
use crate::pace::pace;
use crate::session::Session;

/// Replacement subject for an exploded article.
pub const PUNG: &str = "펑";
/// Replacement body for an exploded comment.
pub const REMOVED_COMMENT_BODY: &str = "<p>펑</p>";
/// An exploded article keeps an empty paragraph as its body.
const EMPTY_PARAGRAPH: &str = "<p></p>";

/// Hidden fields recovered from an article's edit form, required by the
/// update endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditForm {
    pub uid: String,
    pub category: String,
    pub token: String,
}

/// Overwrite a comment's body with the placeholder. Success iff the update
/// endpoint answers 200.
pub async fn explode_comment(
    client: &ForumClient,
    session: &Session,
    csrf_token: &str,
    comment: &CommentRef,
) -> Result<(bool, Session)> {
    let article_view = format!("bbs/{}/views/{}", comment.board, comment.article_id);
    let request_uri = format!("/bbs/{}/views/{}", comment.board, comment.article_id);
    let path = format!("bbs/{}/comments/update", comment.board);
    debug!(
        board = %comment.board,
        article = %comment.article_id,
        comment = %comment.comment_id,
        "exploding comment"
    );

    let fields = [
        ("_token", csrf_token),
        ("writeId", comment.article_id.as_str()),
        ("commentId", comment.comment_id.as_str()),
        ("commentSort", "old"),
        ("page", ""),
        ("requestUri", request_uri.as_str()),
        ("_method", "PUT"),
        ("content", REMOVED_COMMENT_BODY),
        ("files", ""),
    ];
    let response = client
        .post_form(&path, Some(&article_view), session, &fields)
        .await?;

    Ok((
        response.status == reqwest::StatusCode::OK,
        session.merge(&response.cookies),
    ))
}

/// Overwrite an article's title and body with the placeholder.
///
/// The edit form is fetched first for its hidden fields; the update POST is
/// held back until the configured interval from that fetch has passed.
/// Success iff the update endpoint redirects.
pub async fn explode_article(
    client: &ForumClient,
    session: &Session,
    board: &str,
    article_id: &str,
) -> Result<(bool, Session)> {
    let article_view = format!("bbs/{board}/views/{article_id}");
    let edit_path = format!("bbs/{board}/edit/{article_id}");
    let update_path = format!("bbs/{board}/update/{article_id}");
    debug!(board, article_id, "exploding article");

    let started = Instant::now();
    let response = client.get(&edit_path, Some(&article_view), session).await?;
    if !response.status.is_success() {
        return Err(ClientError::UnexpectedStatus {
            endpoint: format!("edit form for {board}/{article_id}"),
            status: response.status,
        });
    }
    let session = session.merge(&response.cookies);
    pace(started, client.pacing().edit_form).await;

    let form = parse_edit_form(&response.body).map_err(|err| match err {
        ClientError::ParseError(detail) => {
            ClientError::ParseError(format!("edit form for {board}/{article_id}: {detail}"))
        }
        other => other,
    })?;

    let multipart = reqwest::multipart::Form::new()
        .text("queryString", "")
        .text("_method", "put")
        .text("type", "update")
        .text("writeId", article_id.to_string())
        .text("uid", form.uid)
        .text("_token", form.token)
        .text("ca_name", form.category)
        .text("prevent_best", "1")
        .text("widget_prevent_best", "1")
        .text("html", "html1")
        .text("subject", PUNG)
        .text("content", EMPTY_PARAGRAPH)
        .text("files", "");
    let update = client
        .post_multipart(&update_path, Some(&edit_path), &session, multipart)
        .await?;

    Ok((update.is_redirect(), session.merge(&update.cookies)))
}

/// Pull the hidden update fields out of edit-form markup.
///
/// The category select may carry no `selected` option in static markup, in
/// which case the first option is what the browser would submit.
pub fn parse_edit_form(body: &str) -> Result<EditForm> {
    let document = Html::parse_document(body);

    let uid_selector = Selector::parse("#uid").unwrap();
    let uid = document
        .select(&uid_selector)
        .next()
        .and_then(|el| el.value().attr("value"))
        .map(str::to_string)
        .ok_or_else(|| ClientError::ParseError("no #uid field".to_string()))?;

    let selected = Selector::parse("#ca_name option[selected]").unwrap();
    let any_option = Selector::parse("#ca_name option").unwrap();
    let category_option = document
        .select(&selected)
        .next()
        .or_else(|| document.select(&any_option).next())
        .ok_or_else(|| ClientError::ParseError("no #ca_name option".to_string()))?;
    let category = match category_option.value().attr("value") {
        Some(value) => value.to_string(),
        None => category_option.text().collect::<String>().trim().to_string(),
    };

    let token_selector = Selector::parse("input[name='_token']").unwrap();
    let token = document
        .select(&token_selector)
        .next()
        .and_then(|el| el.value().attr("value"))
        .map(str::to_string)
        .ok_or_else(|| ClientError::ParseError("no _token field".to_string()))?;

    Ok(EditForm {
        uid,
        category,
        token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pace::Pacing;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const EDIT_PAGE: &str = r#"
        <html><body>
        <form>
            <input type="hidden" id="uid" value="90210">
            <input type="hidden" name="_token" value="fresh-token">
            <select id="ca_name">
                <option value="free">자유</option>
                <option value="info" selected>정보</option>
            </select>
        </form>
        </body></html>
    "#;

    fn sample_comment() -> CommentRef {
        CommentRef {
            board: "qna".to_string(),
            article_id: "10".to_string(),
            page: Some("1".to_string()),
            comment_id: "5".to_string(),
            title: None,
        }
    }

    // ========================================================================
    // edit form parsing
    // ========================================================================

    #[test]
    fn test_parse_edit_form_takes_selected_category() {
        let form = parse_edit_form(EDIT_PAGE).unwrap();

        assert_eq!(form.uid, "90210");
        assert_eq!(form.category, "info");
        assert_eq!(form.token, "fresh-token");
    }

    #[test]
    fn test_parse_edit_form_falls_back_to_first_option() {
        let body = r#"
            <input id="uid" value="1"><input name="_token" value="t">
            <select id="ca_name"><option value="first">a</option><option value="second">b</option></select>
        "#;
        let form = parse_edit_form(body).unwrap();
        assert_eq!(form.category, "first");
    }

    #[test]
    fn test_parse_edit_form_uses_option_text_without_value_attr() {
        let body = r#"
            <input id="uid" value="1"><input name="_token" value="t">
            <select id="ca_name"><option selected> 자유게시판 </option></select>
        "#;
        let form = parse_edit_form(body).unwrap();
        assert_eq!(form.category, "자유게시판");
    }

    #[test]
    fn test_parse_edit_form_requires_uid() {
        let body = r#"<input name="_token" value="t"><select id="ca_name"><option>a</option></select>"#;
        assert!(matches!(
            parse_edit_form(body),
            Err(ClientError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_edit_form_requires_token() {
        let body = r#"<input id="uid" value="1"><select id="ca_name"><option>a</option></select>"#;
        assert!(matches!(
            parse_edit_form(body),
            Err(ClientError::ParseError(_))
        ));
    }

    // ========================================================================
    // requests
    // ========================================================================

    #[tokio::test]
    async fn test_explode_comment_posts_replacement_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bbs/qna/comments/update"))
            .and(body_string_contains("_method=PUT"))
            .and(body_string_contains("commentId=5"))
            .and(body_string_contains("writeId=10"))
            .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "sid=bump"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ForumClient::with_pacing(&mock_server.uri(), Pacing::none()).unwrap();
        let (success, session) =
            explode_comment(&client, &Session::new(), "csrf-tok", &sample_comment())
                .await
                .unwrap();

        assert!(success);
        assert_eq!(session.get("sid"), Some("bump"));
    }

    #[tokio::test]
    async fn test_explode_comment_non_200_is_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bbs/qna/comments/update"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;

        let client = ForumClient::with_pacing(&mock_server.uri(), Pacing::none()).unwrap();
        let (success, _) = explode_comment(&client, &Session::new(), "csrf-tok", &sample_comment())
            .await
            .unwrap();

        assert!(!success);
    }

    #[tokio::test]
    async fn test_explode_article_fetches_form_then_updates() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/bbs/tips/edit/42"))
            .respond_with(ResponseTemplate::new(200).set_body_string(EDIT_PAGE))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/bbs/tips/update/42"))
            .respond_with(ResponseTemplate::new(302).insert_header("set-cookie", "sid=updated"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ForumClient::with_pacing(&mock_server.uri(), Pacing::none()).unwrap();
        let (success, session) = explode_article(&client, &Session::new(), "tips", "42")
            .await
            .unwrap();

        assert!(success);
        assert_eq!(session.get("sid"), Some("updated"));
    }

    #[tokio::test]
    async fn test_explode_article_surfaces_missing_edit_form() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/bbs/tips/edit/42"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>권한 없음</html>"))
            .mount(&mock_server)
            .await;

        let client = ForumClient::with_pacing(&mock_server.uri(), Pacing::none()).unwrap();
        let result = explode_article(&client, &Session::new(), "tips", "42").await;

        assert!(matches!(result, Err(ClientError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_explode_article_rejects_unexpected_edit_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/bbs/tips/edit/42"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/login"))
            .mount(&mock_server)
            .await;

        let client = ForumClient::with_pacing(&mock_server.uri(), Pacing::none()).unwrap();
        let result = explode_article(&client, &Session::new(), "tips", "42").await;

        assert!(matches!(result, Err(ClientError::UnexpectedStatus { .. })));
    }
}
