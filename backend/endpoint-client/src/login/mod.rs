//! One-shot credential exchange against the server's `/login` route.
//!
//! The password goes out exactly once, in the JSON body of a single POST.
//! The returned cookie is wrapped so it cannot leak through logs either.

use crate::LOGIN_PATH;
use crate::error::login::LoginError;
use crate::options::{Credentials, TlsPolicy};
use crate::tls;

use common::{HttpStatusCode, RedactedSecret};

use log::{debug, warn};
use reqwest::Client;
use reqwest::header::SET_COOKIE;
use url::Url;

/// Opaque cookie returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie(RedactedSecret);

impl SessionCookie {
    pub fn new(value: impl Into<String>) -> Self {
        Self(RedactedSecret::new(value))
    }

    /// Cookie value for the `Cookie` request header.
    pub fn expose(&self) -> &str {
        self.0.expose()
    }
}

/// `{base_url}/login`, keeping any path prefix the base URL carries.
pub fn login_url(base_url: &Url) -> Result<Url, LoginError> {
    let base = base_url.as_str().trim_end_matches('/');
    Ok(Url::parse(&format!("{base}/{LOGIN_PATH}"))?)
}

/// Log in and return the first `Set-Cookie` value of the response.
///
/// # Errors
///
/// - [`LoginError::Authentication`] for any status other than 200
/// - [`LoginError::Protocol`] if the response carries no usable `Set-Cookie` header
/// - [`LoginError::Http`] if the request itself fails, including a rejected certificate
/// - [`LoginError::Tls`] if no TLS configuration can be built for `tls_policy`
pub async fn fetch_session_cookie(
    base_url: &Url,
    credentials: &Credentials,
    tls_policy: TlsPolicy,
) -> Result<SessionCookie, LoginError> {
    let url = login_url(base_url)?;

    let client = Client::builder()
        .tls_backend_preconfigured(tls::client_config(tls_policy)?)
        .build()?;

    let body = serde_json::json!({
        "username": credentials.username,
        "password": credentials.password.expose(),
    });

    debug!("Logging in to {url} as {}", credentials.username);

    let response = client.post(url).json(&body).send().await?;

    let status = HttpStatusCode::from(response.status().as_u16());
    if !status.is_ok() {
        if status.is_server_error() {
            warn!("Login endpoint failed with server error {status}");
        }
        return Err(LoginError::authentication(status));
    }

    let cookie = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .next()
        .ok_or_else(|| LoginError::protocol("Login response has no Set-Cookie header"))?;

    let cookie = cookie
        .to_str()
        .map_err(|e| LoginError::protocol(format!("Set-Cookie header is not valid text: {e}")))?;

    debug!("Login succeeded, received session cookie ({} chars)", cookie.len());

    Ok(SessionCookie::new(cookie))
}
