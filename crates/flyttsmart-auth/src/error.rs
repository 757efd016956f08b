use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised by a single step of the authentication handshake.
///
/// These never escape the public [`AuthClient`](crate::AuthClient) step methods; they are
/// converted into an error [`StatusEvent`](crate::StatusEvent) whose text is the `Display`
/// output of the error.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("HTTP error! status: {}", .0.as_u16())]
    Http(StatusCode),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error("An auth code is required before requesting an access token")]
    MissingAuthCode,
    #[error("An access token is required before logging in")]
    MissingAccessToken,
    #[error("The login response did not contain a session token")]
    MissingSessionToken,
}
