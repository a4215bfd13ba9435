// ── Runtime connection configuration ──
//
// These types describe *how* to reach a Jamf Pro server. They carry
// credentials and connection tuning, but never touch disk. The CLI (or
// any other consumer) builds a `ConnectionConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Credentials sent with every Classic API request.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// HTTP basic auth with a JSS user account.
    Basic {
        username: String,
        password: SecretString,
    },
}

impl AuthCredentials {
    pub fn username(&self) -> &str {
        match self {
            Self::Basic { username, .. } => username,
        }
    }
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file, e.g. the JSS built-in CA.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed test servers).
    DangerAcceptInvalid,
}

/// Configuration for connecting to a single JSS.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server root, e.g. `https://jss.example.com:8443/`.
    pub url: Url,
    pub auth: AuthCredentials,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
}

impl ConnectionConfig {
    /// Config with basic auth, system TLS roots and a 60 second timeout.
    pub fn basic(url: Url, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            url,
            auth: AuthCredentials::Basic {
                username: username.into(),
                password,
            },
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(60),
        }
    }
}
