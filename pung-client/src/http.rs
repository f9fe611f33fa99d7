use reqwest::header;
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::error::{ClientError, Result};
use crate::pace::Pacing;
use crate::session::Session;

/// Desktop Chrome identity presented on every request. The forum serves
/// reduced markup to unrecognized agents.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";

/// A forum response reduced to what the cleanup flow inspects: raw status,
/// newly issued cookies, and the body text.
#[derive(Debug)]
pub struct ForumResponse {
    pub status: StatusCode,
    pub cookies: Session,
    pub body: String,
}

impl ForumResponse {
    pub fn is_redirect(&self) -> bool {
        self.status.is_redirection()
    }
}

/// Thin wrapper over `reqwest` for the forum's HTTP surface.
///
/// Redirects are never followed and non-2xx statuses never error here; the
/// outcome classifiers need the raw status. Cookies travel in the explicit
/// `Session` argument, not a client-side jar.
#[derive(Debug, Clone)]
pub struct ForumClient {
    client: Client,
    base_url: Url,
    pacing: Pacing,
}

impl ForumClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_pacing(base_url, Pacing::default())
    }

    pub fn with_pacing(base_url: &str, pacing: Pacing) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|err| ClientError::InvalidUrl(format!("{base_url}: {err}")))?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .build()
            .map_err(ClientError::HttpError)?;

        Ok(Self {
            client,
            base_url,
            pacing,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn pacing(&self) -> &Pacing {
        &self.pacing
    }

    /// Join a forum-relative path against the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|err| ClientError::InvalidUrl(format!("{path}: {err}")))
    }

    pub(crate) async fn get(
        &self,
        path: &str,
        referer: Option<&str>,
        session: &Session,
    ) -> Result<ForumResponse> {
        let mut request = self
            .client
            .get(self.endpoint(path)?)
            .header(header::COOKIE, session.header_value());
        if let Some(referer) = referer {
            request = request.header(header::REFERER, self.endpoint(referer)?.to_string());
        }

        Self::read(request.send().await?).await
    }

    pub(crate) async fn post_form(
        &self,
        path: &str,
        referer: Option<&str>,
        session: &Session,
        fields: &[(&str, &str)],
    ) -> Result<ForumResponse> {
        let mut request = self
            .client
            .post(self.endpoint(path)?)
            .header(header::COOKIE, session.header_value())
            .form(fields);
        if let Some(referer) = referer {
            request = request.header(header::REFERER, self.endpoint(referer)?.to_string());
        }

        Self::read(request.send().await?).await
    }

    pub(crate) async fn post_multipart(
        &self,
        path: &str,
        referer: Option<&str>,
        session: &Session,
        form: reqwest::multipart::Form,
    ) -> Result<ForumResponse> {
        let mut request = self
            .client
            .post(self.endpoint(path)?)
            .header(header::COOKIE, session.header_value())
            .multipart(form);
        if let Some(referer) = referer {
            request = request.header(header::REFERER, self.endpoint(referer)?.to_string());
        }

        Self::read(request.send().await?).await
    }

    async fn read(response: reqwest::Response) -> Result<ForumResponse> {
        let status = response.status();
        // set-cookie values must be captured before text() consumes the
        // response.
        let set_cookies: Vec<String> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();
        let body = response.text().await?;
        let cookies = Session::from_set_cookie_headers(set_cookies.iter().map(String::as_str));

        Ok(ForumResponse {
            status,
            cookies,
            body,
        })
    }
}
