// ── Patch software titles ──
//
// A title ties a definition from a patch source (source id + name id)
// to the packages that install each of its versions. Versions come from
// the source; only their package assignment is editable here.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use jamf_api::{XmlElement, encode_segment};

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::json;
use crate::lookup::Ident;
use crate::mixins::{Categorizable, CategoryRef, CategoryStyle, Sitable, SiteRef};
use crate::object::{ApiObject, Creatable, Deletable, ObjectCore, ObjectRef, Updatable, Writable};
use crate::resources::Package;

/// One known version and the package, if any, that installs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchVersion {
    pub software_version: String,
    pub package: Option<ObjectRef>,
}

impl PatchVersion {
    fn from_json(v: &Value) -> Self {
        let pkg = json::at(v, "package");
        Self {
            software_version: json::string(v, "software_version"),
            package: json::opt_i64(pkg, "id")
                .filter(|id| *id > 0)
                .map(|id| ObjectRef::new(id, json::string(pkg, "name"))),
        }
    }

    fn to_xml(&self) -> XmlElement {
        XmlElement::new("version")
            .text_child("software_version", &self.software_version)
            .child(
                XmlElement::new("package")
                    .text_child("id", self.package.as_ref().map_or(-1, |p| p.id)),
            )
    }
}

/// Computers per installed version of a title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    pub total_computers: i64,
    pub total_versions: i64,
    pub versions: Vec<PatchReportVersion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchReportVersion {
    pub software_version: String,
    pub computers: Vec<String>,
}

impl PatchReport {
    fn from_json(v: &Value) -> Self {
        let versions = match json::at(v, "versions") {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            Value::Object(map) => map.values().collect(),
            _ => Vec::new(),
        };
        Self {
            total_computers: json::i64_or(v, "total_computers", 0),
            total_versions: json::i64_or(v, "total_versions", 0),
            versions: versions
                .into_iter()
                .map(|ver| {
                    let ver = ver.get("version").unwrap_or(ver);
                    PatchReportVersion {
                        software_version: json::string(ver, "software_version"),
                        computers: json::array(ver, "computers")
                            .iter()
                            .map(|c| json::string(c, "name"))
                            .collect(),
                    }
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchTitle {
    core: ObjectCore,
    source_id: Option<i64>,
    name_id: Option<String>,
    web_notification: bool,
    email_notification: bool,
    category: CategoryRef,
    site: SiteRef,
    versions: Vec<PatchVersion>,
}

impl PatchTitle {
    pub fn source_id(&self) -> Option<i64> {
        self.source_id
    }

    /// The title's identifier within its source, e.g. `Firefox`.
    pub fn name_id(&self) -> Option<&str> {
        self.name_id.as_deref()
    }

    pub fn web_notification(&self) -> bool {
        self.web_notification
    }

    pub fn email_notification(&self) -> bool {
        self.email_notification
    }

    pub fn versions(&self) -> &[PatchVersion] {
        &self.versions
    }

    pub fn version_names(&self) -> Vec<&str> {
        self.versions
            .iter()
            .map(|v| v.software_version.as_str())
            .collect()
    }

    /// Versions that have a package assigned.
    pub fn versions_with_packages(&self) -> impl Iterator<Item = &PatchVersion> {
        self.versions.iter().filter(|v| v.package.is_some())
    }

    pub fn package_for_version(&self, version: &str) -> Option<&ObjectRef> {
        self.find_version(version).and_then(|v| v.package.as_ref())
    }

    fn find_version(&self, version: &str) -> Option<&PatchVersion> {
        self.versions.iter().find(|v| v.software_version == version)
    }

    pub fn set_web_notification(&mut self, value: bool) {
        self.web_notification = value;
        self.core.touch();
    }

    pub fn set_email_notification(&mut self, value: bool) {
        self.email_notification = value;
        self.core.touch();
    }

    /// Point a new title at its source. Fixed once the title exists.
    pub fn set_source(&mut self, source_id: i64, name_id: &str) -> Result<()> {
        if self.core.in_jss {
            return Err(JssError::Unsupported(
                "the source of an existing patch title cannot change".into(),
            ));
        }
        self.source_id = Some(source_id);
        self.name_id = Some(name_id.trim().to_owned());
        self.core.touch();
        Ok(())
    }

    /// Detach the package from a version.
    pub fn clear_package_for_version(&mut self, version: &str) -> Result<()> {
        let entry = self.version_mut(version)?;
        if entry.package.take().is_some() {
            self.core.touch();
        }
        Ok(())
    }

    fn version_mut(&mut self, version: &str) -> Result<&mut PatchVersion> {
        let title = self.core.name.clone();
        self.versions
            .iter_mut()
            .find(|v| v.software_version == version)
            .ok_or_else(|| {
                JssError::NoSuchItem(format!("patch title '{title}' has no version '{version}'"))
            })
    }
}

impl ApiObject for PatchTitle {
    const RSRC_BASE: &'static str = "patchsoftwaretitles";
    const RSRC_LIST_KEY: &'static str = "patch_software_titles";
    const RSRC_OBJECT_KEY: &'static str = "patch_software_title";

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn from_json(record: &Value) -> Result<Self> {
        let notifications = json::at(record, "notifications");
        Ok(Self {
            core: ObjectCore::from_json(record)?,
            source_id: json::opt_i64(record, "source_id"),
            name_id: json::opt_str(record, "name_id"),
            web_notification: json::bool(notifications, "web_notification"),
            email_notification: json::bool(notifications, "email_notification"),
            category: CategoryRef::from_json(json::at(record, "category")),
            site: SiteRef::from_json(json::at(record, "site")),
            versions: json::array(record, "versions")
                .iter()
                .map(|v| PatchVersion::from_json(v.get("version").unwrap_or(v)))
                .collect(),
        })
    }
}

impl Writable for PatchTitle {
    fn rest_xml(&self) -> XmlElement {
        XmlElement::new(Self::RSRC_OBJECT_KEY)
            .text_child("name", self.name())
            .opt_child("source_id", self.source_id)
            .opt_child("name_id", self.name_id.as_deref())
            .child(
                XmlElement::new("notifications")
                    .bool_child("web_notification", self.web_notification)
                    .bool_child("email_notification", self.email_notification),
            )
            .child(self.category_xml())
            .child(self.site.to_xml())
            .child(XmlElement::new("versions").extend(self.versions.iter().map(PatchVersion::to_xml)))
    }
}

impl Creatable for PatchTitle {
    fn new_unsaved(name: &str) -> Self {
        Self {
            core: ObjectCore::new(name),
            source_id: None,
            name_id: None,
            web_notification: false,
            email_notification: false,
            category: CategoryRef::default(),
            site: SiteRef::default(),
            versions: Vec::new(),
        }
    }

    fn validate_for_create(&self) -> Result<()> {
        if self.source_id.is_none() || self.name_id.as_deref().is_none_or(str::is_empty) {
            return Err(JssError::MissingData(
                "a patch title needs a source id and name id".into(),
            ));
        }
        Ok(())
    }
}

impl Updatable for PatchTitle {}
impl Deletable for PatchTitle {}

impl Categorizable for PatchTitle {
    const CATEGORY_STYLE: CategoryStyle = CategoryStyle::Hash;

    fn category(&self) -> &CategoryRef {
        &self.category
    }

    fn category_mut(&mut self) -> &mut CategoryRef {
        &mut self.category
    }
}

impl Sitable for PatchTitle {
    fn site(&self) -> &SiteRef {
        &self.site
    }

    fn site_mut(&mut self) -> &mut SiteRef {
        &mut self.site
    }
}

impl Jss {
    /// Set a new title's source after checking the source offers `name_id`.
    pub async fn set_patch_title_source(
        &self,
        title: &mut PatchTitle,
        source_id: i64,
        name_id: &str,
    ) -> Result<()> {
        if !self.valid_patch_source(source_id).await? {
            return Err(JssError::NoSuchItem(format!("no patch source with id {source_id}")));
        }
        let offered = self
            .available_patch_titles(source_id)
            .await?
            .iter()
            .any(|t| t.name_id == name_id.trim());
        if !offered {
            return Err(JssError::NoSuchItem(format!(
                "patch source {source_id} offers no title '{name_id}'"
            )));
        }
        title.set_source(source_id, name_id)
    }

    /// Assign the package that installs one version of a title.
    pub async fn set_package_for_version(
        &self,
        title: &mut PatchTitle,
        version: &str,
        package: impl Into<Ident>,
    ) -> Result<()> {
        let ident = package.into();
        let entry = self
            .lookup_entry::<Package>(ident.clone())
            .await?
            .ok_or_else(|| JssError::NoSuchItem(format!("no package matches {ident}")))?;
        let new_ref = ObjectRef::new(
            entry.id().unwrap_or_default(),
            entry.name().unwrap_or_default(),
        );
        let slot = title.version_mut(version)?;
        if slot.package.as_ref() != Some(&new_ref) {
            debug!(version, package = %new_ref.name, "assigning patch package");
            slot.package = Some(new_ref);
            title.core.touch();
        }
        Ok(())
    }

    /// Patch report for a title, optionally limited to one version.
    pub async fn patch_report(&self, title_id: i64, version: Option<&str>) -> Result<PatchReport> {
        let mut rsrc = format!("patchreports/patchsoftwaretitleid/{title_id}");
        if let Some(version) = version {
            rsrc.push_str("/version/");
            rsrc.push_str(&encode_segment(version));
        }
        let value = self.api().get_json(&rsrc).await?;
        Ok(PatchReport::from_json(json::at(&value, "patch_report")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn title() -> PatchTitle {
        PatchTitle::from_json(&json!({
            "id": 5, "name": "Firefox", "name_id": "Firefox", "source_id": 1,
            "notifications": { "web_notification": true, "email_notification": false },
            "category": { "id": -1, "name": "No category assigned" },
            "versions": [
                { "software_version": "120.0", "package": { "id": 31, "name": "Firefox-120.pkg" } },
                { "software_version": "119.0", "package": { "id": -1, "name": "" } }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn versions_and_packages() {
        let t = title();
        assert_eq!(t.version_names(), vec!["120.0", "119.0"]);
        assert_eq!(t.package_for_version("120.0").unwrap().id, 31);
        assert_eq!(t.package_for_version("119.0"), None);
        assert_eq!(t.versions_with_packages().count(), 1);
        assert_eq!(
            t.rest_xml().find_text("versions/version/package/id"),
            Some("31")
        );
    }

    #[test]
    fn clearing_unknown_version_fails() {
        let mut t = title();
        assert!(matches!(
            t.clear_package_for_version("1.0"),
            Err(JssError::NoSuchItem(_))
        ));
        t.clear_package_for_version("120.0").unwrap();
        assert!(t.need_to_update());
        assert_eq!(t.package_for_version("120.0"), None);
    }

    #[test]
    fn source_is_fixed_after_creation() {
        let mut t = title();
        assert!(matches!(t.set_source(2, "Chrome"), Err(JssError::Unsupported(_))));

        let mut fresh = PatchTitle::new_unsaved("Chrome");
        assert!(fresh.validate_for_create().is_err());
        fresh.set_source(2, "GoogleChrome").unwrap();
        fresh.validate_for_create().unwrap();
    }

    #[test]
    fn report_parses_versions() {
        let r = PatchReport::from_json(&json!({
            "total_computers": 2, "total_versions": 1,
            "versions": [{ "software_version": "120.0", "computers": [{ "id": 1, "name": "Mac-01" }, { "id": 2, "name": "Mac-02" }] }]
        }));
        assert_eq!(r.versions[0].computers, vec!["Mac-01", "Mac-02"]);
    }
}
