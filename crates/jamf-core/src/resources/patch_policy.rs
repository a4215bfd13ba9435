// ── Patch policies ──
//
// A patch policy updates scoped computers to one version of a patch
// title. It belongs to the title: it is created under the title's
// configuration and its target version must be one the title knows
// and has a package for.

use std::fmt;

use serde_json::Value;

use jamf_api::XmlElement;

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::json;
use crate::lookup::{Ident, ListEntry};
use crate::mixins::scope::ScopeKind;
use crate::mixins::{Scopable, Scope};
use crate::object::{ApiObject, Creatable, Deletable, ObjectCore, Updatable, Writable};
use crate::resources::PatchTitle;

/// Deadline bounds accepted by the server, in days.
pub const MIN_DEADLINE_DAYS: i64 = 1;
pub const MAX_DEADLINE_DAYS: i64 = 365;
pub const DEFAULT_GRACE_MINUTES: i64 = 15;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DistributionMethod {
    /// Installs automatically at check-in.
    #[default]
    Prompt,
    /// Offered in Self Service.
    SelfService,
}

impl DistributionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::SelfService => "selfservice",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace([' ', '_'], "").as_str() {
            "prompt" => Some(Self::Prompt),
            "selfservice" => Some(Self::SelfService),
            _ => None,
        }
    }
}

impl fmt::Display for DistributionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An app the installer quits before patching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillApp {
    pub name: String,
    pub bundle_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatchPolicy {
    core: ObjectCore,
    title_id: Option<i64>,
    enabled: bool,
    target_version: Option<String>,
    release_date: Option<String>,
    allow_downgrade: bool,
    patch_unknown: bool,
    kill_apps: Vec<KillApp>,
    distribution_method: DistributionMethod,
    deadline_days: Option<i64>,
    grace_period_minutes: i64,
    scope: Scope,
}

impl PatchPolicy {
    /// The patch title this policy belongs to.
    pub fn title_id(&self) -> Option<i64> {
        self.title_id
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn target_version(&self) -> Option<&str> {
        self.target_version.as_deref()
    }

    pub fn release_date(&self) -> Option<&str> {
        self.release_date.as_deref()
    }

    pub fn allow_downgrade(&self) -> bool {
        self.allow_downgrade
    }

    /// Whether computers with an unrecognized version are patched too.
    pub fn patch_unknown(&self) -> bool {
        self.patch_unknown
    }

    pub fn kill_apps(&self) -> &[KillApp] {
        &self.kill_apps
    }

    pub fn distribution_method(&self) -> DistributionMethod {
        self.distribution_method
    }

    /// Days until installation is enforced, if a deadline is set.
    pub fn deadline_days(&self) -> Option<i64> {
        self.deadline_days
    }

    pub fn grace_period_minutes(&self) -> i64 {
        self.grace_period_minutes
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.core.touch();
    }

    pub fn set_allow_downgrade(&mut self, value: bool) {
        self.allow_downgrade = value;
        self.core.touch();
    }

    pub fn set_patch_unknown(&mut self, value: bool) {
        self.patch_unknown = value;
        self.core.touch();
    }

    pub fn set_distribution_method(&mut self, method: DistributionMethod) {
        self.distribution_method = method;
        self.core.touch();
    }

    pub fn set_deadline_days(&mut self, days: Option<i64>) -> Result<()> {
        if let Some(d) = days {
            if !(MIN_DEADLINE_DAYS..=MAX_DEADLINE_DAYS).contains(&d) {
                return Err(JssError::InvalidData(format!(
                    "deadline must be {MIN_DEADLINE_DAYS}-{MAX_DEADLINE_DAYS} days, not {d}"
                )));
            }
        }
        self.deadline_days = days;
        self.core.touch();
        Ok(())
    }

    pub fn set_grace_period_minutes(&mut self, minutes: i64) -> Result<()> {
        if minutes < 0 {
            return Err(JssError::InvalidData("grace period cannot be negative".into()));
        }
        self.grace_period_minutes = minutes;
        self.core.touch();
        Ok(())
    }

    /// Add an app to quit before installing. Returns false if already listed.
    pub fn add_kill_app(&mut self, name: &str, bundle_id: &str) -> bool {
        if self.kill_apps.iter().any(|k| k.bundle_id == bundle_id) {
            return false;
        }
        self.kill_apps.push(KillApp {
            name: name.to_owned(),
            bundle_id: bundle_id.to_owned(),
        });
        self.core.touch();
        true
    }

    pub fn remove_kill_app(&mut self, bundle_id: &str) -> bool {
        let before = self.kill_apps.len();
        self.kill_apps.retain(|k| k.bundle_id != bundle_id);
        let changed = self.kill_apps.len() != before;
        if changed {
            self.core.touch();
        }
        changed
    }

    fn general_xml(&self) -> XmlElement {
        let kill_apps = XmlElement::new("kill_apps").extend(self.kill_apps.iter().map(|k| {
            XmlElement::new("kill_app")
                .text_child("kill_app_name", &k.name)
                .text_child("kill_app_bundle_id", &k.bundle_id)
        }));
        XmlElement::new("general")
            .text_child("name", self.name())
            .bool_child("enabled", self.enabled)
            .opt_child("target_version", self.target_version.as_deref())
            .bool_child("allow_downgrade", self.allow_downgrade)
            .bool_child("patch_unknown", self.patch_unknown)
            .text_child("distribution_method", self.distribution_method)
            .child(kill_apps)
    }

    fn user_interaction_xml(&self) -> XmlElement {
        XmlElement::new("user_interaction")
            .child(
                XmlElement::new("deadlines")
                    .bool_child("deadline_enabled", self.deadline_days.is_some())
                    .opt_child("deadline_period", self.deadline_days),
            )
            .child(
                XmlElement::new("grace_period")
                    .text_child("grace_period_duration", self.grace_period_minutes),
            )
    }
}

impl ApiObject for PatchPolicy {
    const RSRC_BASE: &'static str = "patchpolicies";
    const RSRC_LIST_KEY: &'static str = "patch_policies";
    const RSRC_OBJECT_KEY: &'static str = "patch_policy";

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn from_json(record: &Value) -> Result<Self> {
        let general = json::at(record, "general");
        let interaction = json::at(record, "user_interaction");
        let deadlines = json::at(interaction, "deadlines");
        Ok(Self {
            core: ObjectCore::from_json(general)?,
            title_id: json::opt_i64(record, "software_title_configuration_id"),
            enabled: json::bool(general, "enabled"),
            target_version: json::opt_str(general, "target_version"),
            release_date: json::opt_str(general, "release_date"),
            allow_downgrade: json::bool(general, "allow_downgrade"),
            patch_unknown: json::bool(general, "patch_unknown"),
            kill_apps: json::array(general, "kill_apps")
                .iter()
                .map(|k| {
                    let k = k.get("kill_app").unwrap_or(k);
                    KillApp {
                        name: json::string(k, "kill_app_name"),
                        bundle_id: json::string(k, "kill_app_bundle_id"),
                    }
                })
                .collect(),
            distribution_method: DistributionMethod::parse(&json::string(
                general,
                "distribution_method",
            ))
            .unwrap_or_default(),
            deadline_days: json::bool(deadlines, "deadline_enabled")
                .then(|| json::opt_i64(deadlines, "deadline_period"))
                .flatten(),
            grace_period_minutes: json::i64_or(
                json::at(interaction, "grace_period"),
                "grace_period_duration",
                DEFAULT_GRACE_MINUTES,
            ),
            scope: Scope::new(ScopeKind::Computer).parse_into(json::at(record, "scope")),
        })
    }
}

impl Writable for PatchPolicy {
    fn rest_xml(&self) -> XmlElement {
        XmlElement::new(Self::RSRC_OBJECT_KEY)
            .child(self.general_xml())
            .child(self.scope.to_xml())
            .child(self.user_interaction_xml())
            .opt_child("software_title_configuration_id", self.title_id)
    }
}

impl Creatable for PatchPolicy {
    fn new_unsaved(name: &str) -> Self {
        Self {
            core: ObjectCore::new(name),
            title_id: None,
            enabled: false,
            target_version: None,
            release_date: None,
            allow_downgrade: false,
            patch_unknown: false,
            kill_apps: Vec::new(),
            distribution_method: DistributionMethod::default(),
            deadline_days: None,
            grace_period_minutes: DEFAULT_GRACE_MINUTES,
            scope: Scope::new(ScopeKind::Computer),
        }
    }

    fn validate_for_create(&self) -> Result<()> {
        if self.title_id.is_none() {
            return Err(JssError::MissingData("a patch policy needs a patch title".into()));
        }
        if self.target_version.is_none() {
            return Err(JssError::MissingData("a patch policy needs a target version".into()));
        }
        Ok(())
    }

    /// Created under the title's configuration, not the base path.
    fn create_rsrc(&self) -> String {
        format!(
            "{}/softwaretitleconfig/id/{}",
            Self::RSRC_BASE,
            self.title_id.unwrap_or_default()
        )
    }
}

impl Updatable for PatchPolicy {}
impl Deletable for PatchPolicy {}

impl Scopable for PatchPolicy {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }
}

impl Jss {
    /// Tie a new patch policy to a title and pick its target version.
    ///
    /// The version must be one the title knows, with a package assigned.
    pub async fn set_patch_policy_target(
        &self,
        policy: &mut PatchPolicy,
        title: impl Into<Ident>,
        version: &str,
    ) -> Result<()> {
        let title: PatchTitle = self.fetch(title).await?;
        if policy.core.in_jss && policy.title_id != Some(title.id()) {
            return Err(JssError::Unsupported(
                "an existing patch policy cannot move to another title".into(),
            ));
        }
        if !title.versions().iter().any(|v| v.software_version == version) {
            return Err(JssError::NoSuchItem(format!(
                "patch title '{}' has no version '{version}'",
                title.name()
            )));
        }
        if title.package_for_version(version).is_none() {
            return Err(JssError::MissingData(format!(
                "version '{version}' of '{}' has no package assigned",
                title.name()
            )));
        }
        policy.title_id = Some(title.id());
        policy.target_version = Some(version.to_owned());
        policy.core.touch();
        Ok(())
    }

    /// Summary entries of the patch policies under one title.
    pub async fn patch_policies_for_title(&self, title: impl Into<Ident>) -> Result<Vec<ListEntry>> {
        let title_id = self.require_id::<PatchTitle>(title).await?;
        let rsrc = format!("{}/softwaretitleconfig/id/{title_id}", PatchPolicy::RSRC_BASE);
        let value = self.api().get_json(&rsrc).await?;
        Ok(json::array(&value, PatchPolicy::RSRC_LIST_KEY)
            .iter()
            .filter_map(|v| v.get("patch_policy").unwrap_or(v).as_object().cloned())
            .map(ListEntry::from)
            .collect())
    }
}
