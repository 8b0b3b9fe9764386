// Error type shared by the library modules. Every pre-flight failure
// (token, template, range) and every transport failure maps onto one of
// these variants; the binary turns them into a message and a non-zero
// exit code.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The bearer token did not have exactly three dot-separated segments.
    #[error("invalid JWT token format: expected 3 segments, found {segments}")]
    MalformedToken { segments: usize },

    /// The claims segment was not valid base64 or not valid JSON.
    #[error("error decoding JWT payload: {0}")]
    Decode(String),

    #[error("JWT token missing '{0}' claim")]
    MissingClaim(&'static str),

    #[error("aud claim does not contain '{marker}': {audience}")]
    InvalidAudience { marker: &'static str, audience: String },

    /// Bad email template or numeric range.
    #[error("{0}")]
    Validation(String),

    /// Non-success status from the management API.
    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    /// The API answered with a success status but a body we cannot use.
    #[error("unexpected API response: {0}")]
    UnexpectedResponse(String),

    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
