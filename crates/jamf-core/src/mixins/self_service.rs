// ── Self Service ──
//
// Display metadata for objects users can install from the Self Service
// app. Policies, macOS profiles and mobile apps keep the same concepts
// under slightly different keys, and only some of them support every
// setting; `SelfServiceFlavor` carries those differences.

use serde_json::Value;

use jamf_api::XmlElement;

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::json;
use crate::lookup::Ident;
use crate::object::ApiObject;
use crate::resources::Category;

const SELF_SERVICE_DEPLOYMENT: &str = "Make Available in Self Service";

/// Which kind of object the self-service data belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfServiceFlavor {
    Policy,
    MacProfile,
    MobileApp,
}

impl SelfServiceFlavor {
    /// General-subset element and value used to put the object in Self Service.
    fn deployment_tag(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Policy => None,
            Self::MacProfile => Some(("distribution_method", "Install Automatically")),
            Self::MobileApp => Some(("deployment_type", "Install Automatically/Prompt Users to Install")),
        }
    }

    fn supports_display_name(self) -> bool {
        matches!(self, Self::Policy | Self::MacProfile)
    }

    fn supports_button_text(self) -> bool {
        matches!(self, Self::Policy | Self::MacProfile)
    }

    fn supports_reinstall_button(self) -> bool {
        self == Self::Policy
    }

    fn supports_notification_type(self) -> bool {
        self == Self::Policy
    }

    fn supports_user_removal(self) -> bool {
        self == Self::MacProfile
    }
}

/// Where a Self Service notification appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationType {
    #[default]
    SelfService,
    NotificationCenter,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SelfService => "Self Service",
            Self::NotificationCenter => "Notification Center",
        }
    }

    fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("Notification Center") {
            Self::NotificationCenter
        } else {
            Self::SelfService
        }
    }
}

/// Whether users may remove an installed profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRemovability {
    Always,
    WithAuthorization,
    Never,
}

impl UserRemovability {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Always => "Always",
            Self::WithAuthorization => "With Authorization",
            Self::Never => "Never",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        [Self::Always, Self::WithAuthorization, Self::Never]
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelfServiceIcon {
    pub id: Option<i64>,
    pub filename: Option<String>,
    pub uri: Option<String>,
}

/// A Self Service category the object is listed or featured in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfServiceCategory {
    pub id: i64,
    pub name: String,
    pub display_in: bool,
    pub feature_in: bool,
}

impl SelfServiceCategory {
    fn from_json(v: &Value) -> Self {
        Self {
            id: json::i64_or(v, "id", 0),
            name: json::string(v, "name"),
            display_in: json::bool(v, "display_in"),
            feature_in: json::bool(v, "feature_in"),
        }
    }

    fn to_xml(&self) -> XmlElement {
        XmlElement::new("category")
            .text_child("id", self.id)
            .text_child("name", &self.name)
            .bool_child("display_in", self.display_in)
            .bool_child("feature_in", self.feature_in)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct SelfService {
    flavor: SelfServiceFlavor,
    pub in_self_service: bool,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<SelfServiceIcon>,
    pub feature_on_main_page: bool,
    pub categories: Vec<SelfServiceCategory>,
    pub install_button_text: Option<String>,
    pub reinstall_button_text: Option<String>,
    pub force_users_to_view_description: bool,
    pub notify: bool,
    pub notification_type: NotificationType,
    pub notification_subject: Option<String>,
    pub notification_message: Option<String>,
    pub user_removable: Option<UserRemovability>,
}

impl SelfService {
    pub fn new(flavor: SelfServiceFlavor) -> Self {
        Self {
            flavor,
            in_self_service: false,
            display_name: None,
            description: None,
            icon: None,
            feature_on_main_page: false,
            categories: Vec::new(),
            install_button_text: None,
            reinstall_button_text: None,
            force_users_to_view_description: false,
            notify: false,
            notification_type: NotificationType::default(),
            notification_subject: None,
            notification_message: None,
            user_removable: None,
        }
    }

    /// Read from a whole record; some flags live in its `general` subset.
    pub fn from_json(flavor: SelfServiceFlavor, record: &Value) -> Self {
        let ss = json::at(record, "self_service");
        let general = json::at(record, "general");

        let in_self_service = match flavor {
            SelfServiceFlavor::Policy => json::bool(ss, "use_for_self_service"),
            SelfServiceFlavor::MacProfile => {
                json::string(general, "distribution_method") == SELF_SERVICE_DEPLOYMENT
            }
            SelfServiceFlavor::MobileApp => {
                json::string(general, "deployment_type") == SELF_SERVICE_DEPLOYMENT
            }
        };

        let icon_v = json::at(ss, "self_service_icon");
        let icon = icon_v.is_object().then(|| SelfServiceIcon {
            id: json::opt_i64(icon_v, "id"),
            filename: json::opt_str(icon_v, "filename"),
            uri: json::opt_str(icon_v, "uri"),
        });

        Self {
            flavor,
            in_self_service,
            display_name: json::opt_str(ss, "self_service_display_name"),
            description: json::opt_str(ss, "self_service_description"),
            icon,
            feature_on_main_page: json::bool(ss, "feature_on_main_page"),
            categories: json::array(ss, "self_service_categories")
                .iter()
                .map(SelfServiceCategory::from_json)
                .collect(),
            install_button_text: json::opt_str(ss, "install_button_text"),
            reinstall_button_text: json::opt_str(ss, "reinstall_button_text"),
            force_users_to_view_description: json::bool(ss, "force_users_to_view_description"),
            notify: json::bool(ss, "notification"),
            notification_type: NotificationType::parse(&json::string(ss, "notification_type")),
            notification_subject: json::opt_str(ss, "notification_subject"),
            notification_message: json::opt_str(ss, "notification_message"),
            user_removable: json::opt_str(ss, "removal_disallowed")
                .and_then(|s| UserRemovability::parse(&s)),
        }
    }

    pub fn flavor(&self) -> SelfServiceFlavor {
        self.flavor
    }

    /// The element the resource adds to its `general` subset, if any.
    pub fn general_xml(&self) -> Option<XmlElement> {
        self.flavor.deployment_tag().map(|(tag, automatic)| {
            let value = if self.in_self_service {
                SELF_SERVICE_DEPLOYMENT
            } else {
                automatic
            };
            XmlElement::with_text(tag, value)
        })
    }

    pub fn to_xml(&self) -> XmlElement {
        let f = self.flavor;
        let mut ss = XmlElement::new("self_service");
        if f == SelfServiceFlavor::Policy {
            ss.push(XmlElement::with_text("use_for_self_service", self.in_self_service));
        }
        if f.supports_display_name() {
            ss.push(opt_text("self_service_display_name", &self.display_name));
        }
        if f.supports_button_text() {
            ss.push(opt_text("install_button_text", &self.install_button_text));
        }
        if f.supports_reinstall_button() {
            ss.push(opt_text("reinstall_button_text", &self.reinstall_button_text));
        }
        ss.push(opt_text("self_service_description", &self.description));
        if f.supports_button_text() {
            ss.push(XmlElement::with_text(
                "force_users_to_view_description",
                self.force_users_to_view_description,
            ));
        }
        ss.push(XmlElement::with_text("feature_on_main_page", self.feature_on_main_page));
        ss.push(
            XmlElement::new("self_service_categories")
                .extend(self.categories.iter().map(SelfServiceCategory::to_xml)),
        );
        ss.push(XmlElement::with_text("notification", self.notify));
        if f.supports_notification_type() {
            ss.push(XmlElement::with_text("notification_type", self.notification_type.as_str()));
        }
        ss.push(opt_text("notification_subject", &self.notification_subject));
        ss.push(opt_text("notification_message", &self.notification_message));
        if let (true, Some(removal)) = (f.supports_user_removal(), self.user_removable) {
            ss.push(XmlElement::with_text("removal_disallowed", removal.as_str()));
        }
        ss
    }
}

fn opt_text(tag: &str, value: &Option<String>) -> XmlElement {
    match value {
        Some(v) => XmlElement::with_text(tag, v),
        None => XmlElement::new(tag),
    }
}

fn unsupported(what: &str, flavor: SelfServiceFlavor) -> JssError {
    JssError::Unsupported(format!("{what} is not available for {flavor:?} self service items"))
}

fn clean(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

// ── SelfServable ─────────────────────────────────────────────────────

/// Objects that can be offered in Self Service.
pub trait SelfServable: ApiObject {
    fn self_service(&self) -> &SelfService;
    fn self_service_mut(&mut self) -> &mut SelfService;

    fn in_self_service(&self) -> bool {
        self.self_service().in_self_service
    }

    fn add_to_self_service(&mut self) {
        if !self.self_service().in_self_service {
            self.self_service_mut().in_self_service = true;
            self.core_mut().touch();
        }
    }

    fn remove_from_self_service(&mut self) {
        if self.self_service().in_self_service {
            self.self_service_mut().in_self_service = false;
            self.core_mut().touch();
        }
    }

    fn set_self_service_display_name(&mut self, name: Option<&str>) -> Result<()> {
        let flavor = self.self_service().flavor();
        if !flavor.supports_display_name() {
            return Err(unsupported("a display name", flavor));
        }
        self.self_service_mut().display_name = clean(name);
        self.core_mut().touch();
        Ok(())
    }

    fn set_self_service_description(&mut self, description: Option<&str>) {
        self.self_service_mut().description = clean(description);
        self.core_mut().touch();
    }

    fn set_feature_on_main_page(&mut self, feature: bool) {
        self.self_service_mut().feature_on_main_page = feature;
        self.core_mut().touch();
    }

    fn set_install_button_text(&mut self, text: Option<&str>) -> Result<()> {
        let flavor = self.self_service().flavor();
        if !flavor.supports_button_text() {
            return Err(unsupported("install button text", flavor));
        }
        self.self_service_mut().install_button_text = clean(text);
        self.core_mut().touch();
        Ok(())
    }

    fn set_reinstall_button_text(&mut self, text: Option<&str>) -> Result<()> {
        let flavor = self.self_service().flavor();
        if !flavor.supports_reinstall_button() {
            return Err(unsupported("reinstall button text", flavor));
        }
        self.self_service_mut().reinstall_button_text = clean(text);
        self.core_mut().touch();
        Ok(())
    }

    fn set_force_users_to_view_description(&mut self, force: bool) -> Result<()> {
        let flavor = self.self_service().flavor();
        if !flavor.supports_button_text() {
            return Err(unsupported("forcing the description", flavor));
        }
        self.self_service_mut().force_users_to_view_description = force;
        self.core_mut().touch();
        Ok(())
    }

    /// Turn notifications on with a subject and message, or off with `None`.
    fn set_self_service_notification(
        &mut self,
        notification: Option<(NotificationType, &str, &str)>,
    ) -> Result<()> {
        let flavor = self.self_service().flavor();
        let ss = self.self_service_mut();
        match notification {
            None => ss.notify = false,
            Some((kind, subject, message)) => {
                if kind != NotificationType::SelfService && !flavor.supports_notification_type() {
                    return Err(unsupported("choosing the notification type", flavor));
                }
                ss.notify = true;
                ss.notification_type = kind;
                ss.notification_subject = clean(Some(subject));
                ss.notification_message = clean(Some(message));
            }
        }
        self.core_mut().touch();
        Ok(())
    }

    fn set_user_removable(&mut self, removable: UserRemovability) -> Result<()> {
        let flavor = self.self_service().flavor();
        if !flavor.supports_user_removal() {
            return Err(unsupported("user removability", flavor));
        }
        self.self_service_mut().user_removable = Some(removable);
        self.core_mut().touch();
        Ok(())
    }

    /// Drop a category by name or id. Returns whether it was present.
    fn remove_self_service_category(&mut self, ident: &str) -> bool {
        let ident = ident.trim();
        let cats = &mut self.self_service_mut().categories;
        let before = cats.len();
        cats.retain(|c| !(c.name.eq_ignore_ascii_case(ident) || c.id.to_string() == ident));
        let changed = cats.len() != before;
        if changed {
            self.core_mut().touch();
        }
        changed
    }
}

impl Jss {
    /// List (and optionally feature) the object in a Self Service category.
    ///
    /// The category must exist. Featuring requires displaying.
    pub async fn add_self_service_category<T: SelfServable>(
        &self,
        obj: &mut T,
        category: &str,
        display_in: bool,
        feature_in: bool,
    ) -> Result<()> {
        if feature_in && !display_in {
            return Err(JssError::InvalidData(
                "a category can only be featured in when it is also displayed in".into(),
            ));
        }
        let entry = self
            .lookup_entry::<Category>(Ident::from(category))
            .await?
            .ok_or_else(|| JssError::NoSuchItem(format!("no category matches '{category}'")))?;
        let new_cat = SelfServiceCategory {
            id: entry.id().unwrap_or_default(),
            name: entry.name().unwrap_or(category).to_owned(),
            display_in,
            feature_in,
        };

        let cats = &mut obj.self_service_mut().categories;
        match cats.iter_mut().find(|c| c.id == new_cat.id) {
            Some(existing) if *existing == new_cat => return Ok(()),
            Some(existing) => *existing = new_cat,
            None => cats.push(new_cat),
        }
        obj.core_mut().touch();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn policy_flavor_reads_use_for_self_service() {
        let record = json!({
            "self_service": {
                "use_for_self_service": true,
                "self_service_display_name": "Install Zoom",
                "install_button_text": "Get",
                "self_service_categories": [{ "id": 2, "name": "Apps", "display_in": true, "feature_in": false }],
                "notification": "true",
                "notification_type": "Notification Center",
                "self_service_icon": { "id": 9, "filename": "zoom.png", "uri": "https://x/zoom.png" }
            }
        });
        let ss = SelfService::from_json(SelfServiceFlavor::Policy, &record);
        assert!(ss.in_self_service);
        assert_eq!(ss.display_name.as_deref(), Some("Install Zoom"));
        assert_eq!(ss.categories[0].name, "Apps");
        assert_eq!(ss.notification_type, NotificationType::NotificationCenter);
        assert_eq!(ss.icon.as_ref().unwrap().id, Some(9));
        assert!(ss.general_xml().is_none());
    }

    #[test]
    fn app_flavor_uses_deployment_type() {
        let record = json!({
            "general": { "deployment_type": "Make Available in Self Service" },
            "self_service": { "self_service_description": "Notes app" }
        });
        let mut ss = SelfService::from_json(SelfServiceFlavor::MobileApp, &record);
        assert!(ss.in_self_service);
        ss.in_self_service = false;
        assert_eq!(
            ss.general_xml().unwrap().text(),
            Some("Install Automatically/Prompt Users to Install")
        );
        let xml = ss.to_xml();
        assert!(xml.find("install_button_text").is_none());
        assert_eq!(xml.find_text("self_service_description"), Some("Notes app"));
    }

    #[test]
    fn profile_xml_carries_removal_setting() {
        let mut ss = SelfService::new(SelfServiceFlavor::MacProfile);
        ss.user_removable = Some(UserRemovability::WithAuthorization);
        assert_eq!(
            ss.to_xml().find_text("removal_disallowed"),
            Some("With Authorization")
        );
        assert!(ss.to_xml().find("use_for_self_service").is_none());
    }

    #[test]
    fn removability_parses_case_insensitively() {
        assert_eq!(UserRemovability::parse("never"), Some(UserRemovability::Never));
        assert_eq!(UserRemovability::parse("sometimes"), None);
    }
}
