//! Error types for remote API operations.
//!
//! Every failure surfaces as a single human-readable line. HTTP-level
//! failures keep the status and the flattened JSON:API error body so the
//! caller can show the remote diagnostics verbatim.

use thiserror::Error;

/// Errors that can occur while talking to the remote API.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure (connection, DNS, TLS, timeout).
    #[error("network error: {message}")]
    Network {
        /// Detailed error message from the failed transport operation
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Flattened text of the JSON:API `errors` array, or the raw body
        message: String,
    },

    /// Response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid connection settings (malformed URL, empty token).
    #[error("invalid connection: {0}")]
    Connection(String),
}

impl Error {
    /// Build an [`Error::Api`] from a status code and response body.
    ///
    /// JSON:API error bodies carry an `errors` array of objects with
    /// `title`/`detail` fields; those are joined into one line. Anything
    /// else is passed through trimmed.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = flatten_errors(body).unwrap_or_else(|| body.trim().to_string());
        Error::Api { status, message }
    }

    /// The HTTP status of an API error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Join the `errors` array of a JSON:API error document into one line.
fn flatten_errors(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let errors = value.get("errors")?.as_array()?;

    let parts: Vec<String> = errors
        .iter()
        .filter_map(|e| {
            let title = e.get("title").and_then(|t| t.as_str());
            let detail = e.get("detail").and_then(|d| d.as_str());
            match (title, detail) {
                (Some(t), Some(d)) => Some(format!("{t}: {d}")),
                (Some(t), None) => Some(t.to_string()),
                (None, Some(d)) => Some(d.to_string()),
                (None, None) => None,
            }
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

impl From<ureq::Error> for Error {
    fn from(e: ureq::Error) -> Self {
        Error::Network {
            message: e.to_string(),
        }
    }
}

/// Result type for remote API operations.
pub type Result<T> = std::result::Result<T, Error>;
