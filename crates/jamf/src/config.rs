//! CLI configuration — thin wrapper around `jamf_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--server, --username, --password, ...).

use std::time::Duration;

use secrecy::SecretString;

use jamf_core::{AuthCredentials, ConnectionConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use jamf_config::{
    Config, DEFAULT_PORT, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// "a, b" or "(none)" for help text.
pub fn available_profiles(config: &Config) -> String {
    let names = config.profile_names();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Build a `ConnectionConfig` from the config file, profile, and flags.
pub fn build_connection_config(global: &GlobalOpts) -> Result<ConnectionConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, global);
    }

    // A profile named explicitly must exist.
    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(&cfg),
        });
    }

    // No profile -- build from flags / env vars alone.
    let server = global.server.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let url = jamf_config::normalize_server(server, DEFAULT_PORT)?;

    let (Some(username), Some(password)) = (&global.username, &global.password) else {
        return Err(CliError::NoCredentials {
            profile: profile_name,
        });
    };

    let tls = if global.insecure || cfg.defaults.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(ConnectionConfig {
        url,
        auth: AuthCredentials::Basic {
            username: username.clone(),
            password: SecretString::from(password.clone()),
        },
        tls,
        timeout: Duration::from_secs(global.timeout),
    })
}

/// Translate a `Profile` + global flags into a `ConnectionConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<ConnectionConfig, CliError> {
    // 1. Server (flag > env > profile)
    let url = match global.server.as_deref() {
        Some(server) => jamf_config::normalize_server(server, profile.port)?,
        None => jamf_config::server_url(profile)?,
    };

    // 2. Credentials (flag > profile chain)
    let username = match global.username.clone() {
        Some(user) => user,
        None => jamf_config::resolve_username(profile, profile_name)?,
    };
    let password = match global.password.clone() {
        Some(pw) => SecretString::from(pw),
        None => jamf_config::resolve_password(profile, profile_name)?,
    };

    // 3. TLS verification
    let tls = jamf_config::profile_tls(profile, global.insecure);

    // 4. Timeout: the profile's, unless the flag moved off its default
    let timeout = profile
        .timeout
        .filter(|_| global.timeout == jamf_config::Defaults::default().timeout)
        .unwrap_or(global.timeout);

    Ok(ConnectionConfig {
        url,
        auth: AuthCredentials::Basic { username, password },
        tls,
        timeout: Duration::from_secs(timeout),
    })
}
