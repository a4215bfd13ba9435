// ── Patch sources ──
//
// Where patch definitions come from. The internal source is Jamf's own
// feed and cannot be edited; external sources are self-hosted feeds.
// Both list the software titles they offer, which is what a new patch
// title needs (source id and name id).

use serde::Serialize;
use serde_json::Value;

use jamf_api::XmlElement;

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::json;
use crate::object::{ApiObject, Creatable, Deletable, ObjectCore, Updatable, Writable};

pub const DEFAULT_PORT: i64 = 443;

/// One title a source offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableTitle {
    pub name_id: String,
    pub app_name: String,
    pub publisher: Option<String>,
    pub current_version: Option<String>,
    pub last_modified: Option<String>,
}

impl AvailableTitle {
    fn from_json(v: &Value) -> Self {
        Self {
            name_id: json::string(v, "name_id"),
            app_name: json::string(v, "app_name"),
            publisher: json::opt_str(v, "publisher"),
            current_version: json::opt_str(v, "current_version"),
            last_modified: json::opt_str(v, "last_modified"),
        }
    }
}

/// Connection details shared by both source kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEndpoint {
    pub enabled: bool,
    pub host_name: Option<String>,
    pub port: i64,
    pub ssl_enabled: bool,
}

impl Default for SourceEndpoint {
    fn default() -> Self {
        Self {
            enabled: true,
            host_name: None,
            port: DEFAULT_PORT,
            ssl_enabled: true,
        }
    }
}

impl SourceEndpoint {
    fn from_json(v: &Value) -> Self {
        Self {
            enabled: json::bool(v, "enabled"),
            host_name: json::opt_str(v, "host_name"),
            port: json::i64_or(v, "port", DEFAULT_PORT),
            ssl_enabled: json::bool(v, "ssl_enabled"),
        }
    }

    fn append_xml(&self, xml: XmlElement) -> XmlElement {
        xml.bool_child("enabled", self.enabled)
            .opt_child("host_name", self.host_name.as_deref())
            .text_child("port", self.port)
            .bool_child("ssl_enabled", self.ssl_enabled)
    }
}

// ── Internal ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchInternalSource {
    core: ObjectCore,
    endpoint: SourceEndpoint,
}

impl PatchInternalSource {
    pub fn endpoint(&self) -> &SourceEndpoint {
        &self.endpoint
    }
}

impl ApiObject for PatchInternalSource {
    const RSRC_BASE: &'static str = "patchinternalsources";
    const RSRC_LIST_KEY: &'static str = "patch_internal_sources";
    const RSRC_OBJECT_KEY: &'static str = "patch_internal_source";

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn from_json(record: &Value) -> Result<Self> {
        Ok(Self {
            core: ObjectCore::from_json(record)?,
            endpoint: SourceEndpoint::from_json(record),
        })
    }
}

// ── External ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchExternalSource {
    core: ObjectCore,
    endpoint: SourceEndpoint,
}

impl PatchExternalSource {
    pub fn endpoint(&self) -> &SourceEndpoint {
        &self.endpoint
    }

    pub fn set_host_name(&mut self, host: &str) -> Result<()> {
        let host = host.trim();
        if host.is_empty() || host.contains('/') {
            return Err(JssError::InvalidData(format!(
                "'{host}' is not a host name; give the host without a scheme or path"
            )));
        }
        self.endpoint.host_name = Some(host.to_owned());
        self.core.touch();
        Ok(())
    }

    pub fn set_port(&mut self, port: i64) -> Result<()> {
        if !(1..=65535).contains(&port) {
            return Err(JssError::InvalidData(format!("port {port} is out of range")));
        }
        self.endpoint.port = port;
        self.core.touch();
        Ok(())
    }

    pub fn set_ssl_enabled(&mut self, enabled: bool) {
        self.endpoint.ssl_enabled = enabled;
        self.core.touch();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.endpoint.enabled = enabled;
        self.core.touch();
    }
}

impl ApiObject for PatchExternalSource {
    const RSRC_BASE: &'static str = "patchexternalsources";
    const RSRC_LIST_KEY: &'static str = "patch_external_sources";
    const RSRC_OBJECT_KEY: &'static str = "patch_external_source";

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn from_json(record: &Value) -> Result<Self> {
        Ok(Self {
            core: ObjectCore::from_json(record)?,
            endpoint: SourceEndpoint::from_json(record),
        })
    }
}

impl Writable for PatchExternalSource {
    fn rest_xml(&self) -> XmlElement {
        self.endpoint
            .append_xml(XmlElement::new(Self::RSRC_OBJECT_KEY).text_child("name", self.name()))
    }
}

impl Creatable for PatchExternalSource {
    fn new_unsaved(name: &str) -> Self {
        Self {
            core: ObjectCore::new(name),
            endpoint: SourceEndpoint::default(),
        }
    }

    fn validate_for_create(&self) -> Result<()> {
        if self.endpoint.host_name.is_none() {
            return Err(JssError::MissingData(
                "an external patch source needs a host name".into(),
            ));
        }
        Ok(())
    }
}

impl Updatable for PatchExternalSource {}
impl Deletable for PatchExternalSource {}

impl Jss {
    /// Titles offered by the patch source with this id, internal or
    /// external.
    pub async fn available_patch_titles(&self, source_id: i64) -> Result<Vec<AvailableTitle>> {
        let rsrc = format!("patchavailabletitles/sourceid/{source_id}");
        let value = self.api().get_json(&rsrc).await.map_err(|e| {
            if e.is_not_found() {
                JssError::NoSuchItem(format!("no patch source with id {source_id}"))
            } else {
                e.into()
            }
        })?;
        let titles = json::at(&value, "patch_available_titles");
        let items = match json::at(titles, "available_titles") {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            Value::Object(map) => match map.get("available_title") {
                Some(Value::Array(items)) => items.iter().collect(),
                Some(single) => vec![single],
                None => Vec::new(),
            },
            _ => Vec::new(),
        };
        Ok(items.into_iter().map(AvailableTitle::from_json).collect())
    }

    /// Whether any patch source, internal or external, has this id.
    pub async fn valid_patch_source(&self, source_id: i64) -> Result<bool> {
        Ok(self
            .all_ids::<PatchInternalSource>(false)
            .await?
            .contains(&source_id)
            || self
                .all_ids::<PatchExternalSource>(false)
                .await?
                .contains(&source_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn external_source_xml() {
        let mut s = PatchExternalSource::new_unsaved("Community feed");
        assert!(s.validate_for_create().is_err());
        s.set_host_name("patch.example.org").unwrap();
        s.set_port(8443).unwrap();
        let xml = s.rest_xml();
        assert_eq!(xml.find_text("host_name"), Some("patch.example.org"));
        assert_eq!(xml.find_text("port"), Some("8443"));
        assert_eq!(xml.find_text("ssl_enabled"), Some("true"));
    }

    #[test]
    fn host_name_rejects_urls() {
        let mut s = PatchExternalSource::new_unsaved("Bad");
        assert!(s.set_host_name("https://patch.example.org/feed").is_err());
        assert!(s.set_port(0).is_err());
    }

    #[test]
    fn internal_source_reads_endpoint() {
        let s = PatchInternalSource::from_json(&json!({
            "id": 1, "name": "Jamf", "enabled": true,
            "host_name": "jamf-patch.jamfcloud.com", "port": 443, "ssl_enabled": true
        }))
        .unwrap();
        assert_eq!(s.endpoint().host_name.as_deref(), Some("jamf-patch.jamfcloud.com"));
        assert!(s.endpoint().ssl_enabled);
    }
}
