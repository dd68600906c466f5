//! Explicit authentication session handed to the submission client
//!
//! The session is built once (from a token, the environment, or a login
//! call) and passed in at construction. Nothing here reads or writes
//! persistent storage.

use std::env;
use std::fmt;
use std::str::FromStr;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::endpoint_url;
use super::error::{parse_error_body, SubmissionError};

/// Path of the login endpoint relative to the API base URL
pub const LOGIN_PATH: &str = "auth/login/";

/// Path of the token refresh endpoint relative to the API base URL
pub const REFRESH_PATH: &str = "auth/token/refresh/";

/// Authorization header scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthScheme {
    /// `Authorization: Bearer <token>` (JWT)
    #[default]
    Bearer,
    /// `Authorization: Token <token>` (DRF token auth)
    Token,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthScheme::Bearer => "Bearer",
            AuthScheme::Token => "Token",
        }
    }
}

impl FromStr for AuthScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bearer" => Ok(AuthScheme::Bearer),
            "token" => Ok(AuthScheme::Token),
            other => Err(format!("unknown auth scheme '{}'", other)),
        }
    }
}

/// Credentials for an already-authenticated reporter
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSession {
    access_token: String,
    refresh_token: Option<String>,
    scheme: AuthScheme,
}

impl AuthSession {
    pub fn new(access_token: impl Into<String>, scheme: AuthScheme) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            scheme,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Read the access token from an environment variable
    pub fn from_env(var: &str, scheme: AuthScheme) -> Option<Self> {
        match env::var(var) {
            Ok(token) if !token.trim().is_empty() => Some(Self::new(token.trim(), scheme)),
            _ => None,
        }
    }

    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Value for the `Authorization` header
    pub fn authorization(&self) -> String {
        format!("{} {}", self.scheme.as_str(), self.access_token)
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("scheme", &self.scheme)
            .finish()
    }
}

/// Login identifier: the API accepts either a username or an email
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginIdentity {
    Username(String),
    Email(String),
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenPair {
    access: String,
    refresh: Option<String>,
}

/// Login reply: nested `tokens`, flat JWT pair, or a token-auth `key`
#[derive(Debug, Deserialize)]
struct LoginResponse {
    tokens: Option<TokenPair>,
    access: Option<String>,
    refresh: Option<String>,
    key: Option<String>,
}

impl LoginResponse {
    fn into_tokens(self) -> Option<TokenPair> {
        let Self {
            tokens,
            access,
            refresh,
            key,
        } = self;
        tokens
            .or_else(|| access.map(|access| TokenPair { access, refresh }))
            .or_else(|| {
                key.map(|access| TokenPair {
                    access,
                    refresh: None,
                })
            })
    }
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: Option<String>,
    refresh: Option<String>,
}

/// Map a non-2xx auth endpoint reply
fn auth_failure(status: reqwest::StatusCode, body: &str) -> SubmissionError {
    let (message, field_errors) = parse_error_body(body);
    match status.as_u16() {
        401 => SubmissionError::Unauthorized { message },
        403 => SubmissionError::Forbidden { message },
        code => SubmissionError::rejected(
            code,
            message.unwrap_or_else(|| status.to_string()),
            field_errors,
        ),
    }
}

async fn post_json<T: Serialize + ?Sized>(
    client: &Client,
    url: &str,
    body: &T,
) -> Result<String, SubmissionError> {
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| SubmissionError::network(e.to_string()))?;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if !status.is_success() {
        return Err(auth_failure(status, &body));
    }
    Ok(body)
}

fn parse_reply<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, SubmissionError> {
    serde_json::from_str(body).map_err(|e| SubmissionError::InvalidResponse {
        message: format!("Parse error: {}", e),
    })
}

/// Exchange credentials for a session. Tokens are returned, never stored.
pub async fn login(
    client: &Client,
    base_url: &str,
    identity: &LoginIdentity,
    password: &str,
    scheme: AuthScheme,
) -> Result<AuthSession, SubmissionError> {
    let url = endpoint_url(base_url, LOGIN_PATH);
    let request = match identity {
        LoginIdentity::Username(name) => LoginRequest {
            username: Some(name.as_str()),
            email: None,
            password,
        },
        LoginIdentity::Email(email) => LoginRequest {
            username: None,
            email: Some(email.as_str()),
            password,
        },
    };

    debug!(url = %url, "Logging in");

    let body = post_json(client, &url, &request).await?;
    let tokens = parse_reply::<LoginResponse>(&body)?
        .into_tokens()
        .ok_or_else(|| SubmissionError::InvalidResponse {
            message: "No access token in login response".to_string(),
        })?;

    info!("Login successful");

    let session = AuthSession::new(tokens.access, scheme);
    Ok(match tokens.refresh {
        Some(refresh) => session.with_refresh_token(refresh),
        None => session,
    })
}

impl AuthSession {
    /// Trade the refresh token for a new access token.
    ///
    /// The refresh token is kept unless the server rotates it.
    pub async fn refresh(&self, client: &Client, base_url: &str) -> Result<Self, SubmissionError> {
        let Some(refresh_token) = self.refresh_token.as_deref() else {
            return Err(SubmissionError::Unauthorized {
                message: Some("No refresh token available".to_string()),
            });
        };

        let url = endpoint_url(base_url, REFRESH_PATH);
        debug!(url = %url, "Refreshing access token");

        let body = post_json(
            client,
            &url,
            &RefreshRequest {
                refresh: refresh_token,
            },
        )
        .await?;
        let reply: RefreshResponse = parse_reply(&body)?;
        let access = reply.access.ok_or_else(|| SubmissionError::InvalidResponse {
            message: "No access token in refresh response".to_string(),
        })?;

        info!("Access token refreshed");

        Ok(Self {
            access_token: access,
            refresh_token: Some(reply.refresh.unwrap_or_else(|| refresh_token.to_string())),
            scheme: self.scheme,
        })
    }
}
