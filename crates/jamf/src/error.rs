//! CLI error types with miette diagnostics.
//!
//! Maps `JssError` and `ConfigError` into user-facing errors with
//! actionable help text and process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use jamf_config::ConfigError;
use jamf_core::JssError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not talk to the server: {message}")]
    #[diagnostic(
        code(jamf::connection_failed),
        help(
            "Check the server address, port and credentials.\n\
             Self-signed certificate? Try --insecure (-k) or set ca_cert in your profile."
        )
    )]
    ConnectionFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(jamf::no_credentials),
        help(
            "Configure credentials with: jamf config init\n\
             Or set JAMF_USERNAME and JAMF_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(jamf::not_found),
        help("Run: jamf list RESOURCE to see what exists")
    )]
    NotFound { message: String },

    #[error("{0}")]
    #[diagnostic(code(jamf::conflict))]
    Conflict(String),

    #[error("{0}")]
    #[diagnostic(code(jamf::not_managed))]
    Unmanaged(String),

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    #[diagnostic(code(jamf::api_error))]
    ApiError { status: Option<u16>, message: String },

    // ── Unsupported ──────────────────────────────────────────────────
    #[error("{0}")]
    #[diagnostic(code(jamf::unsupported))]
    Unsupported(String),

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(jamf::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(jamf::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: jamf config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No server configured")]
    #[diagnostic(
        code(jamf::no_config),
        help(
            "Create a profile with: jamf config init\n\
             Or pass --server. Config file: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(jamf::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(jamf::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {0}")]
    #[diagnostic(code(jamf::serialization))]
    Serialization(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict(_) => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } | Self::NoConfig { .. } => {
                exit_code::USAGE
            }
            Self::Unsupported(_) | Self::Unmanaged(_) => exit_code::UNSUPPORTED,
            _ => exit_code::GENERAL,
        }
    }
}

// ── JssError → CliError mapping ──────────────────────────────────────

impl From<JssError> for CliError {
    fn from(err: JssError) -> Self {
        match err {
            JssError::NoSuchItem(message) => Self::NotFound { message },
            JssError::AlreadyExists(message) | JssError::Conflict(message) => {
                Self::Conflict(message)
            }
            JssError::InvalidData(reason) | JssError::MissingData(reason) => Self::Validation {
                field: "input".into(),
                reason,
            },
            JssError::Unsupported(message) => Self::Unsupported(message),
            JssError::Unmanaged(message) => Self::Unmanaged(message),
            JssError::InvalidConnection(message) => Self::ConnectionFailed { message },
            JssError::Api { status, message } => Self::ApiError { status, message },
            JssError::Io(e) => Self::Io(e),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let cases = [
            (JssError::NoSuchItem("no computer matches 'x'".into()), exit_code::NOT_FOUND),
            (JssError::AlreadyExists("taken".into()), exit_code::CONFLICT),
            (JssError::InvalidData("bad".into()), exit_code::USAGE),
            (JssError::Unmanaged("kiosk".into()), exit_code::UNSUPPORTED),
            (JssError::InvalidConnection("refused".into()), exit_code::CONNECTION),
            (
                JssError::Api {
                    status: Some(500),
                    message: "boom".into(),
                },
                exit_code::GENERAL,
            ),
        ];
        for (err, code) in cases {
            assert_eq!(CliError::from(err).exit_code(), code);
        }
    }

    #[test]
    fn missing_credentials_are_auth_errors() {
        let err = CliError::from(ConfigError::NoCredentials {
            profile: "prod".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }
}
