//! Auth endpoint payloads and calls
//!
//! The registration and login endpoints accept JSON credentials and
//! return either a token+user pair or an error string. The error string
//! is classified here, at the boundary, into a structured
//! [`AuthRejection`], so nothing downstream ever branches on raw server
//! text.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::core::session::{Credentials, Session};
use crate::utils::url::construct_api_url;

/// The exact error text the backend emits when a registration hits an
/// existing account. Compared once, verbatim, in
/// [`AuthRejection::classify`].
pub const ACCOUNT_EXISTS_SENTINEL: &str = "username or email already exists";

/// Timeout on the auth calls so a dead backend cannot wedge the submit
/// flow indefinitely.
const AUTH_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthFailure {
    error: String,
}

/// Why the server rejected an authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    /// Registration hit an account that already exists.
    AccountExists,
    /// The server refused the credentials outright.
    InvalidCredentials,
    /// Anything else; carries the server's display text.
    Unknown(String),
}

impl AuthRejection {
    /// Classify a rejection from the response status and error body.
    pub fn classify(status: StatusCode, error: &str) -> Self {
        if error == ACCOUNT_EXISTS_SENTINEL {
            AuthRejection::AccountExists
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            AuthRejection::InvalidCredentials
        } else {
            AuthRejection::Unknown(error.to_string())
        }
    }
}

impl fmt::Display for AuthRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthRejection::AccountExists => write!(f, "{ACCOUNT_EXISTS_SENTINEL}"),
            AuthRejection::InvalidCredentials => write!(f, "invalid email or password"),
            AuthRejection::Unknown(text) => write!(f, "{text}"),
        }
    }
}

/// Failure of an authentication call.
#[derive(Debug)]
pub enum AuthError {
    /// The server answered and said no.
    Rejected(AuthRejection),
    /// The request never produced a usable answer.
    Transport(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Rejected(rejection) => write!(f, "{rejection}"),
            AuthError::Transport(detail) => write!(f, "request failed: {detail}"),
        }
    }
}

impl Error for AuthError {}

/// Shared HTTP client for the auth calls.
pub fn build_client() -> Result<Client, reqwest::Error> {
    Client::builder().timeout(AUTH_REQUEST_TIMEOUT).build()
}

/// `POST /api/users`
pub async fn register(
    client: &Client,
    base_url: &str,
    credentials: &Credentials,
) -> Result<Session, AuthError> {
    let body = RegisterRequest {
        username: &credentials.username,
        email: &credentials.email,
        password: &credentials.password,
    };
    post_auth(client, construct_api_url(base_url, "api/users"), &body).await
}

/// `POST /api/users/existing`
pub async fn login(
    client: &Client,
    base_url: &str,
    email: &str,
    password: &str,
) -> Result<Session, AuthError> {
    let body = LoginRequest { email, password };
    post_auth(
        client,
        construct_api_url(base_url, "api/users/existing"),
        &body,
    )
    .await
}

async fn post_auth<B: Serialize>(
    client: &Client,
    url: String,
    body: &B,
) -> Result<Session, AuthError> {
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| AuthError::Transport(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return response
            .json::<Session>()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()));
    }

    let error_text = match response.json::<AuthFailure>().await {
        Ok(failure) => failure.error,
        Err(_) => format!("authentication failed ({status})"),
    };
    Err(AuthError::Rejected(AuthRejection::classify(
        status,
        &error_text,
    )))
}
