// ── Core error types ──
//
// The flat taxonomy callers match on. Transport failures from jamf-api
// are translated by the `From<jamf_api::Error>` impl so consumers never
// need to know about HTTP details beyond an optional status code.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum JssError {
    // ── Lookup / lifecycle ───────────────────────────────────────────
    #[error("No such item: {0}")]
    NoSuchItem(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Not managed: {0}")]
    Unmanaged(String),

    // ── Connection / server ──────────────────────────────────────────
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("API error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Api {
        status: Option<u16>,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T, E = JssError> = std::result::Result<T, E>;

// ── Conversion from transport-layer errors ───────────────────────────

impl From<jamf_api::Error> for JssError {
    fn from(err: jamf_api::Error) -> Self {
        match err {
            jamf_api::Error::Authentication { message } => {
                JssError::InvalidConnection(format!("authentication failed: {message}"))
            }
            jamf_api::Error::NotFound { resource } => JssError::NoSuchItem(resource),
            jamf_api::Error::Conflict { message } => JssError::Conflict(message),
            jamf_api::Error::Api { status, message } => JssError::Api {
                status: Some(status),
                message,
            },
            jamf_api::Error::Transport(ref e) => {
                if e.is_connect() || e.is_timeout() {
                    JssError::InvalidConnection(e.to_string())
                } else {
                    JssError::Api {
                        status: e.status().map(|s| s.as_u16()),
                        message: e.to_string(),
                    }
                }
            }
            jamf_api::Error::InvalidUrl(e) => {
                JssError::InvalidConnection(format!("invalid URL: {e}"))
            }
            jamf_api::Error::Tls(msg) => JssError::InvalidConnection(format!("TLS error: {msg}")),
            jamf_api::Error::Deserialization { message, body: _ } => JssError::Api {
                status: None,
                message: format!("unreadable response: {message}"),
            },
            jamf_api::Error::Xml(message) => JssError::Api {
                status: None,
                message: format!("unreadable XML: {message}"),
            },
            jamf_api::Error::Io(e) => JssError::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_becomes_no_such_item() {
        let err: JssError = jamf_api::Error::NotFound {
            resource: "policies/id/9".into(),
        }
        .into();
        assert!(matches!(err, JssError::NoSuchItem(ref r) if r == "policies/id/9"));
    }

    #[test]
    fn auth_failure_is_invalid_connection() {
        let err: JssError = jamf_api::Error::Authentication {
            message: "bad password".into(),
        }
        .into();
        assert!(matches!(err, JssError::InvalidConnection(_)));
        assert!(err.to_string().contains("bad password"));
    }

    #[test]
    fn api_status_is_rendered() {
        let err: JssError = jamf_api::Error::Api {
            status: 500,
            message: "boom".into(),
        }
        .into();
        assert_eq!(err.to_string(), "API error (HTTP 500): boom");
    }
}
