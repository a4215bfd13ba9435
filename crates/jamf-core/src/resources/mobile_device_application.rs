// ── Mobile device applications ──
//
// App Store apps and in-house apps (`.ipa`) for iOS devices. In-house
// apps are uploaded as an `app` file and may be hosted externally; App
// Store apps carry an iTunes URL and VPP license settings. Managed app
// configuration is an opaque preferences plist.

use serde_json::Value;

use jamf_api::XmlElement;

use crate::error::{JssError, Result};
use crate::json;
use crate::mixins::scope::ScopeKind;
use crate::mixins::self_service::SelfServiceFlavor;
use crate::mixins::{
    Categorizable, CategoryRef, CategoryStyle, Scopable, Scope, SelfServable, SelfService,
    Sitable, SiteRef, Uploadable, Vpp, Vppable,
};
use crate::object::{ApiObject, Creatable, Deletable, ObjectCore, Updatable, Writable};

#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct MobileDeviceApplication {
    core: ObjectCore,
    display_name: Option<String>,
    description: Option<String>,
    bundle_id: Option<String>,
    version: Option<String>,
    internal_app: bool,
    itunes_store_url: Option<String>,
    external_url: Option<String>,
    host_externally: bool,
    deploy_as_managed_app: bool,
    remove_app_when_mdm_profile_is_removed: bool,
    prevent_backup_of_app_data: bool,
    keep_description_and_icon_up_to_date: bool,
    take_over_management: bool,
    configuration: Option<String>,
    category: CategoryRef,
    site: SiteRef,
    scope: Scope,
    self_service: SelfService,
    vpp: Vpp,
}

impl MobileDeviceApplication {
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn bundle_id(&self) -> Option<&str> {
        self.bundle_id.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// In-house app rather than App Store.
    pub fn internal_app(&self) -> bool {
        self.internal_app
    }

    pub fn itunes_store_url(&self) -> Option<&str> {
        self.itunes_store_url.as_deref()
    }

    pub fn external_url(&self) -> Option<&str> {
        self.external_url.as_deref()
    }

    pub fn host_externally(&self) -> bool {
        self.host_externally
    }

    pub fn deploy_as_managed_app(&self) -> bool {
        self.deploy_as_managed_app
    }

    pub fn remove_app_when_mdm_profile_is_removed(&self) -> bool {
        self.remove_app_when_mdm_profile_is_removed
    }

    pub fn prevent_backup_of_app_data(&self) -> bool {
        self.prevent_backup_of_app_data
    }

    pub fn keep_description_and_icon_up_to_date(&self) -> bool {
        self.keep_description_and_icon_up_to_date
    }

    pub fn take_over_management(&self) -> bool {
        self.take_over_management
    }

    /// Managed app configuration plist.
    pub fn configuration(&self) -> Option<&str> {
        self.configuration.as_deref()
    }

    pub fn set_display_name(&mut self, name: Option<&str>) {
        self.display_name = name.map(str::to_owned);
        self.core.touch();
    }

    pub fn set_description(&mut self, description: Option<&str>) {
        self.description = description.map(str::to_owned);
        self.core.touch();
    }

    pub fn set_bundle_id(&mut self, bundle_id: &str) -> Result<()> {
        let bundle_id = bundle_id.trim();
        if bundle_id.is_empty() || !bundle_id.contains('.') {
            return Err(JssError::InvalidData(format!(
                "'{bundle_id}' is not a reverse-DNS bundle id"
            )));
        }
        self.bundle_id = Some(bundle_id.to_owned());
        self.core.touch();
        Ok(())
    }

    pub fn set_version(&mut self, version: &str) {
        self.version = Some(version.trim().to_owned());
        self.core.touch();
    }

    pub fn set_internal_app(&mut self, value: bool) {
        self.internal_app = value;
        self.core.touch();
    }

    pub fn set_itunes_store_url(&mut self, url: Option<&str>) -> Result<()> {
        if let Some(u) = url {
            if !u.starts_with("https://") {
                return Err(JssError::InvalidData(format!("'{u}' is not an https URL")));
            }
        }
        self.itunes_store_url = url.map(str::to_owned);
        self.core.touch();
        Ok(())
    }

    /// Host the `.ipa` at `url` instead of on the server. `None` stops
    /// external hosting.
    pub fn set_external_url(&mut self, url: Option<&str>) {
        self.host_externally = url.is_some();
        self.external_url = url.map(str::to_owned);
        self.core.touch();
    }

    pub fn set_deploy_as_managed_app(&mut self, value: bool) {
        self.deploy_as_managed_app = value;
        self.core.touch();
    }

    pub fn set_remove_app_when_mdm_profile_is_removed(&mut self, value: bool) {
        self.remove_app_when_mdm_profile_is_removed = value;
        self.core.touch();
    }

    pub fn set_prevent_backup_of_app_data(&mut self, value: bool) {
        self.prevent_backup_of_app_data = value;
        self.core.touch();
    }

    pub fn set_keep_description_and_icon_up_to_date(&mut self, value: bool) {
        self.keep_description_and_icon_up_to_date = value;
        self.core.touch();
    }

    pub fn set_take_over_management(&mut self, value: bool) {
        self.take_over_management = value;
        self.core.touch();
    }

    pub fn set_configuration(&mut self, plist: Option<&str>) {
        self.configuration = plist.map(str::to_owned);
        self.core.touch();
    }

    fn general_xml(&self) -> XmlElement {
        let mut general = XmlElement::new("general")
            .text_child("name", self.name())
            .opt_child("display_name", self.display_name.as_deref())
            .opt_child("description", self.description.as_deref())
            .opt_child("bundle_id", self.bundle_id.as_deref())
            .opt_child("version", self.version.as_deref())
            .bool_child("internal_app", self.internal_app)
            .opt_child("itunes_store_url", self.itunes_store_url.as_deref())
            .bool_child("host_externally", self.host_externally)
            .opt_child("external_url", self.external_url.as_deref())
            .bool_child("deploy_as_managed_app", self.deploy_as_managed_app)
            .bool_child(
                "remove_app_when_mdm_profile_is_removed",
                self.remove_app_when_mdm_profile_is_removed,
            )
            .bool_child("prevent_backup_of_app_data", self.prevent_backup_of_app_data)
            .bool_child(
                "keep_description_and_icon_up_to_date",
                self.keep_description_and_icon_up_to_date,
            )
            .bool_child("take_over_management", self.take_over_management)
            .child(self.category_xml())
            .child(self.site.to_xml());
        if let Some(deploy) = self.self_service.general_xml() {
            general.push(deploy);
        }
        general
    }
}

impl ApiObject for MobileDeviceApplication {
    const RSRC_BASE: &'static str = "mobiledeviceapplications";
    const RSRC_LIST_KEY: &'static str = "mobile_device_applications";
    const RSRC_OBJECT_KEY: &'static str = "mobile_device_application";
    const OTHER_LOOKUP_KEYS: &'static [&'static str] = &["bundle_id"];

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
            display_name: json::opt_str(general, "display_name"),
            description: json::opt_str(general, "description"),
            bundle_id: json::opt_str(general, "bundle_id"),
            version: json::opt_str(general, "version"),
            internal_app: json::bool(general, "internal_app"),
            itunes_store_url: json::opt_str(general, "itunes_store_url"),
            external_url: json::opt_str(general, "external_url"),
            host_externally: json::bool(general, "host_externally"),
            deploy_as_managed_app: json::bool(general, "deploy_as_managed_app"),
            remove_app_when_mdm_profile_is_removed: json::bool(
                general,
                "remove_app_when_mdm_profile_is_removed",
            ),
            prevent_backup_of_app_data: json::bool(general, "prevent_backup_of_app_data"),
            keep_description_and_icon_up_to_date: json::bool(
                general,
                "keep_description_and_icon_up_to_date",
            ),
            take_over_management: json::bool(general, "take_over_management"),
            configuration: json::opt_str(json::at(record, "app_configuration"), "preferences"),
            category: CategoryRef::from_json(json::at(general, "category")),
            site: SiteRef::from_json(json::at(general, "site")),
            scope: Scope::new(ScopeKind::MobileDevice).parse_into(json::at(record, "scope")),
            self_service: SelfService::from_json(SelfServiceFlavor::MobileApp, record),
            vpp: Vpp::from_json(json::at(record, "vpp")),
        })
    }
}

impl Writable for MobileDeviceApplication {
    fn rest_xml(&self) -> XmlElement {
        XmlElement::new(Self::RSRC_OBJECT_KEY)
            .child(self.general_xml())
            .child(self.scope.to_xml())
            .child(self.self_service.to_xml())
            .child(self.vpp.to_xml())
            .child(
                XmlElement::new("app_configuration")
                    .opt_child("preferences", self.configuration.as_deref()),
            )
    }
}

impl Creatable for MobileDeviceApplication {
    fn new_unsaved(name: &str) -> Self {
        Self {
            core: ObjectCore::new(name),
            display_name: None,
            description: None,
            bundle_id: None,
            version: None,
            internal_app: false,
            itunes_store_url: None,
            external_url: None,
            host_externally: false,
            deploy_as_managed_app: true,
            remove_app_when_mdm_profile_is_removed: false,
            prevent_backup_of_app_data: false,
            keep_description_and_icon_up_to_date: false,
            take_over_management: false,
            configuration: None,
            category: CategoryRef::default(),
            site: SiteRef::default(),
            scope: Scope::new(ScopeKind::MobileDevice),
            self_service: SelfService::new(SelfServiceFlavor::MobileApp),
            vpp: Vpp::default(),
        }
    }

    fn validate_for_create(&self) -> Result<()> {
        if self.bundle_id.is_none() || self.version.is_none() {
            return Err(JssError::MissingData(
                "a mobile device app needs a bundle id and version".into(),
            ));
        }
        Ok(())
    }
}

impl Updatable for MobileDeviceApplication {}
impl Deletable for MobileDeviceApplication {}

impl Categorizable for MobileDeviceApplication {
    const CATEGORY_STYLE: CategoryStyle = CategoryStyle::Hash;

    fn category(&self) -> &CategoryRef {
        &self.category
    }

    fn category_mut(&mut self) -> &mut CategoryRef {
        &mut self.category
    }
}

impl Sitable for MobileDeviceApplication {
    fn site(&self) -> &SiteRef {
        &self.site
    }

    fn site_mut(&mut self) -> &mut SiteRef {
        &mut self.site
    }
}

impl Scopable for MobileDeviceApplication {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }
}

impl SelfServable for MobileDeviceApplication {
    fn self_service(&self) -> &SelfService {
        &self.self_service
    }

    fn self_service_mut(&mut self) -> &mut SelfService {
        &mut self.self_service
    }
}

impl Vppable for MobileDeviceApplication {
    fn vpp(&self) -> &Vpp {
        &self.vpp
    }

    fn vpp_mut(&mut self) -> &mut Vpp {
        &mut self.vpp
    }
}

impl Uploadable for MobileDeviceApplication {
    const UPLOAD_TYPES: &'static [(&'static str, &'static str)] = &[
        ("icon", "mobiledeviceapplicationsicon"),
        ("app", "mobiledeviceapplicationsipa"),
    ];
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn app() -> MobileDeviceApplication {
        MobileDeviceApplication::from_json(&json!({
            "general": {
                "id": 21, "name": "Pages", "bundle_id": "com.apple.Pages", "version": "13.2",
                "itunes_store_url": "https://apps.apple.com/app/id361309726",
                "deployment_type": "Install Automatically/Prompt Users to Install",
                "deploy_as_managed_app": true,
                "category": { "id": -1, "name": "No category assigned" }
            },
            "scope": { "all_mobile_devices": true },
            "vpp": { "assign_vpp_device_based_licenses": true, "vpp_admin_account_id": 2,
                     "total_vpp_licenses": 50, "used_vpp_licenses": 12 },
            "app_configuration": { "preferences": "" }
        }))
        .unwrap()
    }

    #[test]
    fn reads_vpp_and_scope() {
        let a = app();
        assert_eq!(a.vpp().total_vpp_licenses, 50);
        assert!(a.vpp().assign_vpp_device_based_licenses);
        assert!(a.scope().all_targets());
        assert!(!a.in_self_service());
        assert_eq!(a.category_name(), None);
        assert_eq!(
            a.rest_xml().find_text("scope/all_mobile_devices"),
            Some("true")
        );
    }

    #[test]
    fn self_service_sets_deployment_type() {
        let mut a = app();
        a.add_to_self_service();
        assert!(a.need_to_update());
        assert_eq!(
            a.rest_xml().find_text("general/deployment_type"),
            Some("Make Available in Self Service")
        );
    }

    #[test]
    fn external_hosting_follows_url() {
        let mut a = MobileDeviceApplication::new_unsaved("Field Notes");
        a.set_internal_app(true);
        a.set_external_url(Some("https://cdn.example.com/FieldNotes.ipa"));
        assert!(a.host_externally());
        a.set_external_url(None);
        assert!(!a.host_externally());
        assert!(a.set_bundle_id("nodots").is_err());
        assert!(a.validate_for_create().is_err());
    }
}
