//! Error handling for catalog API operations.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::mock::MockDataError;

/// Common error type for catalog API operations.
///
/// Consumers of the gateway treat every variant the same way ("no data"),
/// the variants only exist to produce useful messages and logs.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("catalog url cannot be used as a base for requests: {0}")]
    Url(String),
    #[error("request to catalog failed")]
    Request(#[source] reqwest::Error),
    #[error("{}", fmt_status(.status, .message.as_deref()))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },
    #[error("failed to parse catalog response")]
    Decode(#[source] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

impl FetchError {
    pub(crate) fn status(status: u16, message: Option<String>) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        FetchError::Status { status, message }
    }
}

/// Errors constructing a [crate::Client].
#[derive(Debug, Error)]
pub enum ClientInitError {
    #[error("failed to build catalog http client")]
    Http(#[source] FetchError),
    #[error("failed to load mock catalog data")]
    MockData(#[source] MockDataError),
}

/// Error body returned by the catalog API, e.g. `{ "message": "Product not found" }`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Extension trait for turning unsuccessful responses into [FetchError]s.
pub(crate) trait ResponseExt: Sized {
    /// Returns the response unchanged if it has a success status,
    /// otherwise consumes the body looking for an error message.
    fn error_for_fetch(self) -> impl std::future::Future<Output = Result<Self, FetchError>> + Send;
}

impl ResponseExt for reqwest::Response {
    async fn error_for_fetch(self) -> Result<Self, FetchError> {
        let status = self.status();
        if status.is_success() {
            return Ok(self);
        }

        // The body may be HTML garbage from a proxy, only keep it if it parses.
        let message = match self.bytes().await {
            Ok(body) => serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .map(|body| body.message),
            Err(_) => None,
        };

        Err(FetchError::Status { status, message })
    }
}

fn fmt_status(status: &StatusCode, message: Option<&str>) -> String {
    match message {
        Some(message) => format!("{status}: {message}"),
        None => format!("{status}"),
    }
}
