use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions};
use tracing::{debug, info};
use url::Url;

use crate::error::{ClientError, Result};
use crate::http::USER_AGENT;
use crate::session::Session;

/// Upper bound for the interactive login, generous enough to type
/// credentials and clear any challenge by hand.
pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(600);

const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Open a visible browser window on the forum's login page, wait for the
/// human to finish, and harvest the resulting cookies as a `Session`.
///
/// The browser work is synchronous, so it runs on the blocking pool.
pub async fn browser_login(base_url: &str, timeout: Duration) -> Result<Session> {
    let base = Url::parse(base_url)
        .map_err(|err| ClientError::InvalidUrl(format!("{base_url}: {err}")))?;
    let login_url = base
        .join("login")
        .map_err(|err| ClientError::InvalidUrl(format!("login: {err}")))?
        .to_string();

    tokio::task::spawn_blocking(move || login_blocking(&login_url, timeout)).await?
}

fn login_blocking(login_url: &str, timeout: Duration) -> Result<Session> {
    let options = LaunchOptions::default_builder()
        .headless(false)
        .window_size(Some((1024, 1024)))
        .idle_browser_timeout(timeout)
        .build()
        .map_err(|err| ClientError::LoginError(err.to_string()))?;
    let browser = Browser::new(options).map_err(|err| ClientError::LoginError(err.to_string()))?;
    let tab = browser
        .new_tab()
        .map_err(|err| ClientError::LoginError(err.to_string()))?;
    tab.set_user_agent(USER_AGENT, None, None)
        .map_err(|err| ClientError::LoginError(err.to_string()))?;
    tab.navigate_to(login_url)
        .map_err(|err| ClientError::LoginError(err.to_string()))?;

    info!("waiting for the login to be completed in the browser window");
    let deadline = std::time::Instant::now() + timeout;
    loop {
        std::thread::sleep(POLL_INTERVAL);
        if login_finished(&tab.get_url()) {
            break;
        }
        if std::time::Instant::now() >= deadline {
            return Err(ClientError::LoginError(
                "login window timed out before authentication finished".to_string(),
            ));
        }
    }

    let cookies = tab
        .get_cookies()
        .map_err(|err| ClientError::LoginError(err.to_string()))?;
    let session = Session::from_pairs(cookies.into_iter().map(|c| (c.name, c.value)));
    debug!(%session, "login session captured");

    if session.is_empty() {
        return Err(ClientError::LoginError(
            "no cookies were issued by the login flow".to_string(),
        ));
    }
    Ok(session)
}

/// Login is done once the window has navigated away from the login page.
fn login_finished(current_url: &str) -> bool {
    !current_url.contains("/login")
}
