// ── JSS connection ──
//
// The handle every operation goes through. Wraps the Classic API client
// and the process-wide memo caches: per-resource summary lists, the LDAP
// server objects, and the master distribution point. Caches are filled
// lazily and dropped on explicit refresh or by writes that change them.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use tracing::{debug, info};

use jamf_api::transport::{TlsMode, TransportConfig};
use jamf_api::ClassicClient;

use crate::config::{AuthCredentials, ConnectionConfig, TlsVerification};
use crate::error::{JssError, Result};
use crate::json;
use crate::lookup::ListEntry;
use crate::resources::{DistributionPoint, LdapServer};

/// A connection to one Jamf Pro server.
///
/// Cheaply cloneable via `Arc<JssInner>`; clones share caches.
#[derive(Clone)]
pub struct Jss {
    inner: Arc<JssInner>,
}

struct JssInner {
    api: ClassicClient,
    lists: DashMap<&'static str, Arc<Vec<ListEntry>>>,
    ldap_servers: ArcSwapOption<Vec<LdapServer>>,
    master_dp: ArcSwapOption<DistributionPoint>,
    server_version: ArcSwapOption<String>,
}

impl std::fmt::Debug for Jss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jss")
            .field("api", &self.inner.api)
            .field("cached_lists", &self.inner.lists.len())
            .finish_non_exhaustive()
    }
}

impl Jss {
    /// Build a connection from runtime config. Does not contact the
    /// server; call [`connect()`](Self::connect) to verify credentials.
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        let transport = build_transport(config);
        let AuthCredentials::Basic { username, password } = &config.auth;
        let api = ClassicClient::new(&config.url, username.clone(), password.clone(), &transport)?;
        Ok(Self::with_client(api))
    }

    /// Wrap an existing Classic API client.
    pub fn with_client(api: ClassicClient) -> Self {
        Self {
            inner: Arc::new(JssInner {
                api,
                lists: DashMap::new(),
                ldap_servers: ArcSwapOption::empty(),
                master_dp: ArcSwapOption::empty(),
                server_version: ArcSwapOption::empty(),
            }),
        }
    }

    /// The raw Classic API client.
    pub fn api(&self) -> &ClassicClient {
        &self.inner.api
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Verify the credentials by reading the API user's own record.
    ///
    /// Records the server version when the server reports one.
    pub async fn connect(&self) -> Result<()> {
        let value = self.api().get_json("jssuser").await.map_err(|e| {
            if e.is_not_found() {
                JssError::InvalidConnection(format!(
                    "{} does not look like a Jamf Pro server",
                    self.api().api_url()
                ))
            } else {
                e.into()
            }
        })?;

        let user = json::at(&value, "user");
        if let Some(version) = json::opt_str(user, "version") {
            debug!(%version, "server version");
            self.inner.server_version.store(Some(Arc::new(version)));
        }
        info!(
            user = self.api().username(),
            url = %self.api().api_url(),
            "connected"
        );
        Ok(())
    }

    /// Server version reported during [`connect()`](Self::connect).
    pub fn server_version(&self) -> Option<String> {
        self.inner.server_version.load_full().map(|v| v.as_ref().clone())
    }

    /// Drop every memoized list and object.
    pub fn flush_caches(&self) {
        self.inner.lists.clear();
        self.inner.ldap_servers.store(None);
        self.inner.master_dp.store(None);
        debug!("caches flushed");
    }

    // ── Cache plumbing (crate-internal) ──────────────────────────────

    pub(crate) fn cached_list(&self, key: &'static str) -> Option<Arc<Vec<ListEntry>>> {
        self.inner.lists.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub(crate) fn store_list(&self, key: &'static str, list: Arc<Vec<ListEntry>>) {
        self.inner.lists.insert(key, list);
    }

    pub(crate) fn forget_list(&self, key: &'static str) {
        if self.inner.lists.remove(key).is_some() {
            debug!(list = key, "list cache invalidated");
        }
    }

    pub(crate) fn cached_ldap_servers(&self) -> Option<Arc<Vec<LdapServer>>> {
        self.inner.ldap_servers.load_full()
    }

    pub(crate) fn store_ldap_servers(&self, servers: Arc<Vec<LdapServer>>) {
        self.inner.ldap_servers.store(Some(servers));
    }

    pub(crate) fn cached_master_dp(&self) -> Option<Arc<DistributionPoint>> {
        self.inner.master_dp.load_full()
    }

    pub(crate) fn store_master_dp(&self, dp: Arc<DistributionPoint>) {
        self.inner.master_dp.store(Some(dp));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn build_transport(config: &ConnectionConfig) -> TransportConfig {
    TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        },
        timeout: config.timeout,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn transport_mirrors_tls_choice() {
        let mut config = ConnectionConfig::basic(
            "https://jss.example.com:8443/".parse().unwrap(),
            "admin",
            "pw".to_string().into(),
        );
        config.tls = TlsVerification::DangerAcceptInvalid;
        config.timeout = Duration::from_secs(5);

        let transport = build_transport(&config);
        assert!(matches!(transport.tls, TlsMode::DangerAcceptInvalid));
        assert_eq!(transport.timeout, Duration::from_secs(5));
    }

    #[test]
    fn new_connection_has_empty_caches() {
        let config = ConnectionConfig::basic(
            "https://jss.example.com:8443/".parse().unwrap(),
            "admin",
            "pw".to_string().into(),
        );
        let jss = Jss::new(&config).unwrap();
        assert!(jss.cached_list("buildings").is_none());
        assert!(jss.server_version().is_none());
        assert!(jss.api().api_url().as_str().ends_with("/JSSResource/"));
    }
}
