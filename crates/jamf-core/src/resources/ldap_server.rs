// ── LDAP servers ──
//
// Read-only here: servers are configured in the web UI. Their value to
// API clients is the directory lookups the server proxies: does a user
// or group exist, and is a user in a group. The server objects are
// memoized on the connection because scope validation consults them for
// every LDAP user it adds.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use jamf_api::encode_segment;

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::json;
use crate::object::{ApiObject, ObjectCore};

/// One directory entry as the server reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LdapUser {
    pub uid: Option<String>,
    pub username: String,
    pub realname: Option<String>,
    pub email_address: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub building: Option<String>,
    pub room: Option<String>,
}

impl LdapUser {
    fn from_json(v: &Value) -> Self {
        Self {
            uid: json::opt_str(v, "uid"),
            username: json::string(v, "username"),
            realname: json::opt_str(v, "realname"),
            email_address: json::opt_str(v, "email_address"),
            phone: json::opt_str(v, "phone"),
            position: json::opt_str(v, "position"),
            department: json::opt_str(v, "department"),
            building: json::opt_str(v, "building"),
            room: json::opt_str(v, "room"),
        }
    }
}

/// Entries under `key`, unwrapping the per-item `singular` wrapper the
/// server sometimes adds.
fn lookup_results<'a>(v: &'a Value, key: &str, singular: &str) -> Vec<&'a Value> {
    match json::at(v, key) {
        Value::Array(items) => items
            .iter()
            .map(|item| item.get(singular).unwrap_or(item))
            .collect(),
        Value::Object(map) => match map.get(singular) {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(single) => vec![single],
            None => Vec::new(),
        },
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapServer {
    core: ObjectCore,
    hostname: String,
    port: Option<i64>,
    server_type: Option<String>,
    use_ssl: bool,
    authentication_type: Option<String>,
    user_search_base: Option<String>,
    group_search_base: Option<String>,
}

impl LdapServer {
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn port(&self) -> Option<i64> {
        self.port
    }

    /// e.g. "Active Directory", "Open Directory".
    pub fn server_type(&self) -> Option<&str> {
        self.server_type.as_deref()
    }

    pub fn use_ssl(&self) -> bool {
        self.use_ssl
    }

    pub fn authentication_type(&self) -> Option<&str> {
        self.authentication_type.as_deref()
    }

    pub fn user_search_base(&self) -> Option<&str> {
        self.user_search_base.as_deref()
    }

    pub fn group_search_base(&self) -> Option<&str> {
        self.group_search_base.as_deref()
    }
}

impl ApiObject for LdapServer {
    const RSRC_BASE: &'static str = "ldapservers";
    const RSRC_LIST_KEY: &'static str = "ldap_servers";
    const RSRC_OBJECT_KEY: &'static str = "ldap_server";

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn from_json(record: &Value) -> Result<Self> {
        let conn = json::at(record, "connection");
        let mappings = json::at(record, "mappings_for_users");
        Ok(Self {
            core: ObjectCore::from_json(conn)?,
            hostname: json::string(conn, "hostname"),
            port: json::opt_i64(conn, "port"),
            server_type: json::opt_str(conn, "server_type"),
            use_ssl: json::bool(conn, "use_ssl"),
            authentication_type: json::opt_str(conn, "authentication_type"),
            user_search_base: json::opt_str(json::at(mappings, "user_mappings"), "search_base"),
            group_search_base: json::opt_str(
                json::at(mappings, "user_group_mappings"),
                "search_base",
            ),
        })
    }
}

impl Jss {
    /// Every LDAP server, fetched in full and memoized until `refresh`.
    pub async fn ldap_servers(&self, refresh: bool) -> Result<Arc<Vec<LdapServer>>> {
        if !refresh {
            if let Some(servers) = self.cached_ldap_servers() {
                return Ok(servers);
            }
        }
        let mut servers = Vec::new();
        for id in self.all_ids::<LdapServer>(refresh).await? {
            servers.push(self.fetch_by_id::<LdapServer>(id).await?);
        }
        debug!(count = servers.len(), "LDAP servers loaded");
        let servers = Arc::new(servers);
        self.store_ldap_servers(Arc::clone(&servers));
        Ok(servers)
    }

    async fn require_ldap_servers(&self) -> Result<Arc<Vec<LdapServer>>> {
        let servers = self.ldap_servers(false).await?;
        if servers.is_empty() {
            return Err(JssError::MissingData("no LDAP servers are configured".into()));
        }
        Ok(servers)
    }

    /// Look a user up on each LDAP server in turn; the first hit wins.
    pub async fn ldap_user(&self, username: &str) -> Result<Option<LdapUser>> {
        let user = encode_segment(username.trim());
        for server in self.require_ldap_servers().await?.iter() {
            let rsrc = format!("{}/id/{}/user/{user}", LdapServer::RSRC_BASE, server.id());
            let value = self.api().get_json(&rsrc).await?;
            let found = lookup_results(&value, "ldap_users", "ldap_user")
                .into_iter()
                .map(LdapUser::from_json)
                .find(|u| u.username.eq_ignore_ascii_case(username.trim()));
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }

    pub async fn ldap_user_exists(&self, username: &str) -> Result<bool> {
        Ok(self.ldap_user(username).await?.is_some())
    }

    pub async fn ldap_group_exists(&self, group: &str) -> Result<bool> {
        let encoded = encode_segment(group.trim());
        for server in self.require_ldap_servers().await?.iter() {
            let rsrc = format!("{}/id/{}/group/{encoded}", LdapServer::RSRC_BASE, server.id());
            let value = self.api().get_json(&rsrc).await?;
            let hit = lookup_results(&value, "ldap_groups", "ldap_group")
                .into_iter()
                .any(|g| json::string(g, "groupname").eq_ignore_ascii_case(group.trim()));
            if hit {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether any LDAP server reports the user as a member of the group.
    pub async fn ldap_user_in_group(&self, username: &str, group: &str) -> Result<bool> {
        let user = encode_segment(username.trim());
        let group = encode_segment(group.trim());
        for server in self.require_ldap_servers().await?.iter() {
            let rsrc = format!(
                "{}/id/{}/group/{group}/user/{user}",
                LdapServer::RSRC_BASE,
                server.id()
            );
            let value = self.api().get_json(&rsrc).await?;
            if !lookup_results(&value, "ldap_users", "ldap_user").is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_connection_and_mappings() {
        let s = LdapServer::from_json(&json!({
            "connection": {
                "id": 1, "name": "Corp AD", "hostname": "ad.example.com", "port": 636,
                "server_type": "Active Directory", "use_ssl": true
            },
            "mappings_for_users": {
                "user_mappings": { "search_base": "OU=Staff,DC=example,DC=com" },
                "user_group_mappings": { "search_base": "OU=Groups,DC=example,DC=com" }
            }
        }))
        .unwrap();
        assert_eq!(s.id(), 1);
        assert_eq!(s.port(), Some(636));
        assert!(s.use_ssl());
        assert_eq!(s.group_search_base(), Some("OU=Groups,DC=example,DC=com"));
    }

    #[test]
    fn lookup_results_unwrap_both_shapes() {
        let wrapped = json!({ "ldap_users": [{ "ldap_user": { "username": "jdoe" } }] });
        let nested = json!({ "ldap_users": { "ldap_user": [{ "username": "a" }, { "username": "b" }] } });
        let empty = json!({ "ldap_users": [] });
        assert_eq!(
            LdapUser::from_json(lookup_results(&wrapped, "ldap_users", "ldap_user")[0]).username,
            "jdoe"
        );
        assert_eq!(lookup_results(&nested, "ldap_users", "ldap_user").len(), 2);
        assert!(lookup_results(&empty, "ldap_users", "ldap_user").is_empty());
    }
}
