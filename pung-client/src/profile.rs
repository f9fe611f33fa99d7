use scraper::{Html, Selector};
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::http::ForumClient;
use crate::session::Session;

/// Identity snapshot scraped once per run from the profile-edit page.
///
/// `csrf_token` is the per-session anti-forgery value reused by every
/// state-changing POST for the rest of the run; no refresh mechanism exists.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user_id: String,
    pub user_num: String,
    pub nickname: String,
    pub avatar: Option<String>,
    pub planet: String,
    pub exp: u64,
    pub csrf_token: String,
}

/// Fetch and parse the profile-edit page, returning the profile and the
/// session updated with any rotated cookies.
pub async fn fetch_profile(client: &ForumClient, session: &Session) -> Result<(Profile, Session)> {
    let response = client.get("users/edit", None, session).await?;
    if !response.status.is_success() {
        return Err(ClientError::LoginError(format!(
            "profile page returned {}, session is not authenticated",
            response.status
        )));
    }

    let profile = parse_profile(&response.body)?;
    debug!(user_id = %profile.user_id, nickname = %profile.nickname, "profile loaded");

    Ok((profile, session.merge(&response.cookies)))
}

/// Extract the profile fields from the edit-page markup.
///
/// The user id and CSRF token are required; the decorative fields (avatar,
/// planet rank, experience) default when absent.
pub fn parse_profile(body: &str) -> Result<Profile> {
    let document = Html::parse_document(body);

    let nick_selector = Selector::parse(".user-nick-wrap").unwrap();
    let nick_area = document.select(&nick_selector).next().ok_or_else(|| {
        ClientError::ParseError("profile page has no .user-nick-wrap block".to_string())
    })?;

    let user_id = nick_area
        .value()
        .attr("data-id")
        .map(str::to_string)
        .ok_or_else(|| ClientError::ParseError("profile block has no data-id".to_string()))?;
    let user_num = nick_area
        .value()
        .attr("data-row")
        .unwrap_or_default()
        .to_string();

    // The rendered nickname carries two trailing decoration characters.
    let rendered: String = nick_area.text().collect();
    let rendered = rendered.trim();
    let keep = rendered.chars().count().saturating_sub(2);
    let nickname: String = rendered.chars().take(keep).collect();

    let avatar_selector = Selector::parse(".thumb-pic > img").unwrap();
    let avatar = document
        .select(&avatar_selector)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string);

    // The util area renders as "<label> <planet> <exp>" with the experience
    // value formatted with separators.
    let util_selector = Selector::parse(".util-area").unwrap();
    let util_text = document
        .select(&util_selector)
        .next()
        .map(|area| area.text().collect::<String>())
        .unwrap_or_default();
    let util_words: Vec<&str> = util_text.split_whitespace().collect();
    let planet = util_words.get(1).copied().unwrap_or_default().to_string();
    let exp = util_words
        .get(2)
        .map(|raw| {
            raw.chars()
                .filter(|c| c.is_ascii_digit())
                .collect::<String>()
        })
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0);

    let csrf_selector = Selector::parse("meta[name='csrf-token']").unwrap();
    let csrf_token = document
        .select(&csrf_selector)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(str::to_string)
        .ok_or_else(|| ClientError::ParseError("profile page has no csrf-token meta".to_string()))?;

    Ok(Profile {
        user_id,
        user_num,
        nickname,
        avatar,
        planet,
        exp,
        csrf_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PROFILE_PAGE: &str = r#"
        <html>
        <head><meta name="csrf-token" content="tok-123"></head>
        <body>
            <div class="thumb-pic"><img src="/images/avatar.png"></div>
            <div class="user-nick-wrap" data-row="8841" data-id="tester01">tester드림</div>
            <div class="util-area"> 행성 지구 1,234 </div>
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_profile_extracts_identity_fields() {
        let profile = parse_profile(PROFILE_PAGE).unwrap();

        assert_eq!(profile.user_id, "tester01");
        assert_eq!(profile.user_num, "8841");
        assert_eq!(profile.nickname, "tester");
        assert_eq!(profile.avatar.as_deref(), Some("/images/avatar.png"));
        assert_eq!(profile.planet, "지구");
        assert_eq!(profile.exp, 1234);
        assert_eq!(profile.csrf_token, "tok-123");
    }

    #[test]
    fn test_parse_profile_requires_user_block() {
        let result = parse_profile("<html><body></body></html>");
        assert!(matches!(result, Err(ClientError::ParseError(_))));
    }

    #[test]
    fn test_parse_profile_requires_csrf_meta() {
        let body = r#"<div class="user-nick-wrap" data-id="tester01">tester드림</div>"#;
        let result = parse_profile(body);
        assert!(matches!(result, Err(ClientError::ParseError(_))));
    }

    #[test]
    fn test_parse_profile_defaults_decorative_fields() {
        let body = r#"
            <html>
            <head><meta name="csrf-token" content="tok"></head>
            <body><div class="user-nick-wrap" data-id="tester01">ab</div></body>
            </html>
        "#;

        let profile = parse_profile(body).unwrap();

        assert_eq!(profile.nickname, "");
        assert_eq!(profile.user_num, "");
        assert!(profile.avatar.is_none());
        assert_eq!(profile.planet, "");
        assert_eq!(profile.exp, 0);
    }

    #[tokio::test]
    async fn test_fetch_profile_merges_rotated_cookies() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/edit"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "sid=rotated; Path=/")
                    .set_body_string(PROFILE_PAGE),
            )
            .mount(&mock_server)
            .await;

        let client = ForumClient::new(&mock_server.uri()).unwrap();
        let session = Session::from_pairs([("sid", "stale"), ("lang", "ko")]);

        let (profile, session) = fetch_profile(&client, &session).await.unwrap();

        assert_eq!(profile.user_id, "tester01");
        assert_eq!(session.get("sid"), Some("rotated"));
        assert_eq!(session.get("lang"), Some("ko"));
    }

    #[tokio::test]
    async fn test_fetch_profile_rejects_unauthenticated_session() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/edit"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/login"))
            .mount(&mock_server)
            .await;

        let client = ForumClient::new(&mock_server.uri()).unwrap();

        let result = fetch_profile(&client, &Session::new()).await;

        assert!(matches!(result, Err(ClientError::LoginError(_))));
    }
}
