// ── macOS configuration profiles ──
//
// The payload is an XML property list kept as an opaque string; the
// profile's metadata, scope and Self Service settings are structured.
// Whether the profile installs automatically or from Self Service lives
// in `general/distribution_method` and is driven by the Self Service
// flag.

use std::fmt;

use serde_json::Value;

use jamf_api::XmlElement;

use crate::error::{JssError, Result};
use crate::json;
use crate::mixins::scope::ScopeKind;
use crate::mixins::self_service::SelfServiceFlavor;
use crate::mixins::{
    Categorizable, CategoryRef, CategoryStyle, Scopable, Scope, SelfServable, SelfService,
    Sitable, SiteRef, Uploadable,
};
use crate::object::{ApiObject, Creatable, Deletable, ObjectCore, Updatable, Writable};

/// Whether a profile installs into the computer or user keychain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProfileLevel {
    #[default]
    Computer,
    User,
}

impl ProfileLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Computer => "computer",
            Self::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "computer" | "system" => Some(Self::Computer),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

impl fmt::Display for ProfileLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OsxConfigurationProfile {
    core: ObjectCore,
    description: Option<String>,
    level: ProfileLevel,
    uuid: Option<String>,
    redeploy_on_update: Option<String>,
    payloads: Option<String>,
    category: CategoryRef,
    site: SiteRef,
    scope: Scope,
    self_service: SelfService,
}

impl OsxConfigurationProfile {
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn level(&self) -> ProfileLevel {
        self.level
    }

    pub fn uuid(&self) -> Option<&str> {
        self.uuid.as_deref()
    }

    /// The raw payload plist.
    pub fn payloads(&self) -> Option<&str> {
        self.payloads.as_deref()
    }

    pub fn set_description(&mut self, description: Option<&str>) {
        self.description = description.map(str::to_owned);
        self.core.touch();
    }

    /// Level is fixed once the profile exists on the server.
    pub fn set_level(&mut self, level: ProfileLevel) -> Result<()> {
        if self.core.in_jss && level != self.level {
            return Err(JssError::Unsupported(
                "the level of an existing profile cannot change".into(),
            ));
        }
        self.level = level;
        self.core.touch();
        Ok(())
    }

    /// Replace the payload plist. It must be an XML property list.
    pub fn set_payloads(&mut self, plist: &str) -> Result<()> {
        if !plist.contains("<plist") {
            return Err(JssError::InvalidData(
                "payloads must be an XML property list".into(),
            ));
        }
        self.payloads = Some(plist.to_owned());
        self.core.touch();
        Ok(())
    }

    /// Redeploy to all scoped machines or only new ones when saved.
    pub fn set_redeploy_on_update(&mut self, all: bool) {
        self.redeploy_on_update = Some(if all { "All" } else { "Newly Assigned" }.to_owned());
        self.core.touch();
    }
}

impl ApiObject for OsxConfigurationProfile {
    const RSRC_BASE: &'static str = "osxconfigurationprofiles";
    const RSRC_LIST_KEY: &'static str = "os_x_configuration_profiles";
    const RSRC_OBJECT_KEY: &'static str = "os_x_configuration_profile";

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn from_json(record: &Value) -> Result<Self> {
        let general = json::at(record, "general");
        Ok(Self {
            core: ObjectCore::from_json(general)?,
            description: json::opt_str(general, "description"),
            level: ProfileLevel::parse(&json::string(general, "level")).unwrap_or_default(),
            uuid: json::opt_str(general, "uuid"),
            redeploy_on_update: json::opt_str(general, "redeploy_on_update"),
            payloads: json::opt_str(general, "payloads"),
            category: CategoryRef::from_json(json::at(general, "category")),
            site: SiteRef::from_json(json::at(general, "site")),
            scope: Scope::new(ScopeKind::Computer).parse_into(json::at(record, "scope")),
            self_service: SelfService::from_json(SelfServiceFlavor::MacProfile, record),
        })
    }
}

impl Writable for OsxConfigurationProfile {
    fn rest_xml(&self) -> XmlElement {
        let mut general = XmlElement::new("general")
            .text_child("name", self.name())
            .opt_child("description", self.description.as_deref())
            .text_child("level", self.level)
            .opt_child("redeploy_on_update", self.redeploy_on_update.as_deref())
            .child(self.category_xml())
            .child(self.site.to_xml());
        if let Some(payloads) = &self.payloads {
            general.push(XmlElement::with_text("payloads", payloads));
        }
        if let Some(deploy) = self.self_service.general_xml() {
            general.push(deploy);
        }
        XmlElement::new(Self::RSRC_OBJECT_KEY)
            .child(general)
            .child(self.scope.to_xml())
            .child(self.self_service.to_xml())
    }
}

impl Creatable for OsxConfigurationProfile {
    fn new_unsaved(name: &str) -> Self {
        Self {
            core: ObjectCore::new(name),
            description: None,
            level: ProfileLevel::default(),
            uuid: None,
            redeploy_on_update: None,
            payloads: None,
            category: CategoryRef::default(),
            site: SiteRef::default(),
            scope: Scope::new(ScopeKind::Computer),
            self_service: SelfService::new(SelfServiceFlavor::MacProfile),
        }
    }

    fn validate_for_create(&self) -> Result<()> {
        if self.payloads.is_none() {
            return Err(JssError::MissingData("a profile needs payloads".into()));
        }
        Ok(())
    }

    fn duplicate(&self, new_name: &str) -> Self {
        let mut copy = self.clone();
        copy.core = ObjectCore::new(new_name);
        copy.uuid = None;
        copy
    }
}

impl Updatable for OsxConfigurationProfile {}
impl Deletable for OsxConfigurationProfile {}

impl Categorizable for OsxConfigurationProfile {
    const CATEGORY_STYLE: CategoryStyle = CategoryStyle::Hash;

    fn category(&self) -> &CategoryRef {
        &self.category
    }

    fn category_mut(&mut self) -> &mut CategoryRef {
        &mut self.category
    }
}

impl Sitable for OsxConfigurationProfile {
    fn site(&self) -> &SiteRef {
        &self.site
    }

    fn site_mut(&mut self) -> &mut SiteRef {
        &mut self.site
    }
}

impl Scopable for OsxConfigurationProfile {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }
}

impl SelfServable for OsxConfigurationProfile {
    fn self_service(&self) -> &SelfService {
        &self.self_service
    }

    fn self_service_mut(&mut self) -> &mut SelfService {
        &mut self.self_service
    }
}

impl Uploadable for OsxConfigurationProfile {
    const UPLOAD_TYPES: &'static [(&'static str, &'static str)] =
        &[("icon", "osxconfigurationprofiles")];
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    const PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?><plist version="1"><dict/></plist>"#;

    fn profile() -> OsxConfigurationProfile {
        OsxConfigurationProfile::from_json(&json!({
            "general": {
                "id": 12, "name": "Wi-Fi", "level": "System", "uuid": "ABC-123",
                "distribution_method": "Make Available in Self Service",
                "category": { "id": 3, "name": "Networking" },
                "payloads": PLIST
            },
            "scope": { "all_computers": false },
            "self_service": { "self_service_display_name": "Corporate Wi-Fi" }
        }))
        .unwrap()
    }

    #[test]
    fn self_service_drives_distribution_method() {
        let mut p = profile();
        assert!(p.in_self_service());
        assert_eq!(p.level(), ProfileLevel::Computer);
        assert_eq!(
            p.rest_xml().find_text("general/distribution_method"),
            Some("Make Available in Self Service")
        );
        p.remove_from_self_service();
        assert_eq!(
            p.rest_xml().find_text("general/distribution_method"),
            Some("Install Automatically")
        );
        assert_eq!(p.rest_xml().find_text("general/category/id"), Some("3"));
    }

    #[test]
    fn level_is_fixed_after_creation() {
        let mut p = profile();
        assert!(p.set_level(ProfileLevel::User).is_err());
        p.set_level(ProfileLevel::Computer).unwrap();
    }

    #[test]
    fn payloads_must_be_a_plist() {
        let mut p = OsxConfigurationProfile::new_unsaved("Dock");
        assert!(p.validate_for_create().is_err());
        assert!(p.set_payloads("{}").is_err());
        p.set_payloads(PLIST).unwrap();
        p.validate_for_create().unwrap();
    }

    #[test]
    fn duplicate_drops_uuid() {
        let copy = profile().duplicate("Wi-Fi 2");
        assert_eq!(copy.uuid(), None);
        assert!(!copy.in_jss());
        assert_eq!(copy.payloads(), Some(PLIST));
    }
}
