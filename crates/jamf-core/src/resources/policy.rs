// ── Policies ──
//
// A policy runs packages, scripts and maintenance tasks on scoped
// computers when one of its triggers fires. Packages and scripts are
// referenced by id and name; adding one checks that it exists.

use std::fmt;

use serde_json::Value;
use tracing::info;

use jamf_api::{XmlElement, encode_segment};

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::json;
use crate::lookup::Ident;
use crate::mixins::{
    Categorizable, CategoryRef, CategoryStyle, Scopable, Scope, SelfServable, SelfService,
    Sitable, SiteRef, Uploadable,
};
use crate::mixins::scope::ScopeKind;
use crate::mixins::self_service::SelfServiceFlavor;
use crate::object::{ApiObject, Creatable, Deletable, ObjectCore, Updatable, Writable};
use crate::resources::script::{FIRST_PARAMETER, LAST_PARAMETER, ScriptPriority};
use crate::resources::{Package, Script};

/// Retention intervals accepted by the log flush endpoints.
pub const LOG_FLUSH_INTERVALS: &[&str] = &[
    "Zero Days",
    "One Day",
    "One Week",
    "Two Weeks",
    "One Month",
    "Three Months",
    "Six Months",
    "One Year",
];

/// Canonical spelling of a flush interval, or `InvalidData`.
pub(crate) fn flush_interval(interval: &str) -> Result<&'static str> {
    LOG_FLUSH_INTERVALS
        .iter()
        .find(|i| i.eq_ignore_ascii_case(interval.trim()))
        .copied()
        .ok_or_else(|| {
            JssError::InvalidData(format!(
                "'{interval}' is not a flush interval; use one of {}",
                LOG_FLUSH_INTERVALS.join(", ")
            ))
        })
}

// ── General ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Frequency {
    #[default]
    OncePerComputer,
    OncePerUserPerComputer,
    OncePerUser,
    Daily,
    Weekly,
    Monthly,
    Ongoing,
}

impl Frequency {
    pub const ALL: [Frequency; 7] = [
        Self::OncePerComputer,
        Self::OncePerUserPerComputer,
        Self::OncePerUser,
        Self::Daily,
        Self::Weekly,
        Self::Monthly,
        Self::Ongoing,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OncePerComputer => "Once per computer",
            Self::OncePerUserPerComputer => "Once per user per computer",
            Self::OncePerUser => "Once per user",
            Self::Daily => "Once every day",
            Self::Weekly => "Once every week",
            Self::Monthly => "Once every month",
            Self::Ongoing => "Ongoing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Built-in events a policy can run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Trigger {
    Checkin,
    EnrollmentComplete,
    Login,
    Logout,
    NetworkStateChanged,
    Startup,
}

impl Trigger {
    pub const ALL: [Trigger; 6] = [
        Self::Checkin,
        Self::EnrollmentComplete,
        Self::Login,
        Self::Logout,
        Self::NetworkStateChanged,
        Self::Startup,
    ];

    fn tag(self) -> &'static str {
        match self {
            Self::Checkin => "trigger_checkin",
            Self::EnrollmentComplete => "trigger_enrollment_complete",
            Self::Login => "trigger_login",
            Self::Logout => "trigger_logout",
            Self::NetworkStateChanged => "trigger_network_state_changed",
            Self::Startup => "trigger_startup",
        }
    }
}

// ── Packages and scripts ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackageAction {
    #[default]
    Install,
    Cache,
    InstallCached,
    Uninstall,
}

impl PackageAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Install => "Install",
            Self::Cache => "Cache",
            Self::InstallCached => "Install Cached",
            Self::Uninstall => "Uninstall",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "install" => Some(Self::Install),
            "cache" => Some(Self::Cache),
            "install cached" | "install_cached" => Some(Self::InstallCached),
            "uninstall" => Some(Self::Uninstall),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyPackage {
    pub id: i64,
    pub name: String,
    pub action: PackageAction,
    /// Fill user templates.
    pub fut: bool,
    /// Fill existing users.
    pub feu: bool,
}

impl PolicyPackage {
    fn from_json(v: &Value) -> Self {
        Self {
            id: json::i64_or(v, "id", 0),
            name: json::string(v, "name"),
            action: PackageAction::parse(&json::string(v, "action")).unwrap_or_default(),
            fut: json::bool(v, "fut"),
            feu: json::bool(v, "feu"),
        }
    }

    fn to_xml(&self) -> XmlElement {
        XmlElement::new("package")
            .text_child("id", self.id)
            .text_child("name", &self.name)
            .text_child("action", self.action.as_str())
            .bool_child("fut", self.fut)
            .bool_child("feu", self.feu)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyScript {
    pub id: i64,
    pub name: String,
    pub priority: ScriptPriority,
    /// Values for parameters 4 through 11.
    pub parameters: [Option<String>; LAST_PARAMETER - FIRST_PARAMETER + 1],
}

impl PolicyScript {
    fn from_json(v: &Value) -> Self {
        Self {
            id: json::i64_or(v, "id", 0),
            name: json::string(v, "name"),
            priority: ScriptPriority::parse(&json::string(v, "priority")).unwrap_or_default(),
            parameters: std::array::from_fn(|i| {
                json::opt_str(v, &format!("parameter{}", i + FIRST_PARAMETER))
            }),
        }
    }

    fn to_xml(&self) -> XmlElement {
        let el = XmlElement::new("script")
            .text_child("id", self.id)
            .text_child("name", &self.name)
            .text_child("priority", self.priority);
        self.parameters.iter().enumerate().fold(el, |el, (i, value)| {
            el.opt_child(&format!("parameter{}", i + FIRST_PARAMETER), value.as_deref())
        })
    }
}

// ── Maintenance, files and processes ─────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Maintenance {
    /// Update inventory when the policy finishes.
    pub recon: bool,
    pub reset_name: bool,
    pub install_all_cached_packages: bool,
    pub heal: bool,
    pub prebindings: bool,
    pub permissions: bool,
    pub byhost: bool,
    pub system_cache: bool,
    pub user_cache: bool,
    pub verify: bool,
}

impl Maintenance {
    fn from_json(v: &Value) -> Self {
        Self {
            recon: json::bool(v, "recon"),
            reset_name: json::bool(v, "reset_name"),
            install_all_cached_packages: json::bool(v, "install_all_cached_packages"),
            heal: json::bool(v, "heal"),
            prebindings: json::bool(v, "prebindings"),
            permissions: json::bool(v, "permissions"),
            byhost: json::bool(v, "byhost"),
            system_cache: json::bool(v, "system_cache"),
            user_cache: json::bool(v, "user_cache"),
            verify: json::bool(v, "verify"),
        }
    }

    fn to_xml(&self) -> XmlElement {
        XmlElement::new("maintenance")
            .bool_child("recon", self.recon)
            .bool_child("reset_name", self.reset_name)
            .bool_child("install_all_cached_packages", self.install_all_cached_packages)
            .bool_child("heal", self.heal)
            .bool_child("prebindings", self.prebindings)
            .bool_child("permissions", self.permissions)
            .bool_child("byhost", self.byhost)
            .bool_child("system_cache", self.system_cache)
            .bool_child("user_cache", self.user_cache)
            .bool_child("verify", self.verify)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilesProcesses {
    pub search_by_path: Option<String>,
    pub delete_file: bool,
    pub locate_file: Option<String>,
    pub update_locate_database: bool,
    pub spotlight_search: Option<String>,
    pub search_for_process: Option<String>,
    pub kill_process: bool,
    /// Shell command run as root.
    pub run_command: Option<String>,
}

impl FilesProcesses {
    fn from_json(v: &Value) -> Self {
        Self {
            search_by_path: json::opt_str(v, "search_by_path"),
            delete_file: json::bool(v, "delete_file"),
            locate_file: json::opt_str(v, "locate_file"),
            update_locate_database: json::bool(v, "update_locate_database"),
            spotlight_search: json::opt_str(v, "spotlight_search"),
            search_for_process: json::opt_str(v, "search_for_process"),
            kill_process: json::bool(v, "kill_process"),
            run_command: json::opt_str(v, "run_command"),
        }
    }

    fn to_xml(&self) -> XmlElement {
        XmlElement::new("files_processes")
            .opt_child("search_by_path", self.search_by_path.as_deref())
            .bool_child("delete_file", self.delete_file)
            .opt_child("locate_file", self.locate_file.as_deref())
            .bool_child("update_locate_database", self.update_locate_database)
            .opt_child("spotlight_search", self.spotlight_search.as_deref())
            .opt_child("search_for_process", self.search_for_process.as_deref())
            .bool_child("kill_process", self.kill_process)
            .opt_child("run_command", self.run_command.as_deref())
    }
}

// ── Policy ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    core: ObjectCore,
    enabled: bool,
    frequency: Frequency,
    triggers: Vec<Trigger>,
    custom_trigger: Option<String>,
    category: CategoryRef,
    site: SiteRef,
    scope: Scope,
    self_service: SelfService,
    packages: Vec<PolicyPackage>,
    scripts: Vec<PolicyScript>,
    maintenance: Maintenance,
    files_processes: FilesProcesses,
}

fn clean(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

impl Policy {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    /// The custom event name (`jamf policy -event NAME`).
    pub fn custom_trigger(&self) -> Option<&str> {
        self.custom_trigger.as_deref()
    }

    pub fn packages(&self) -> &[PolicyPackage] {
        &self.packages
    }

    pub fn scripts(&self) -> &[PolicyScript] {
        &self.scripts
    }

    pub fn maintenance(&self) -> &Maintenance {
        &self.maintenance
    }

    pub fn files_processes(&self) -> &FilesProcesses {
        &self.files_processes
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.core.touch();
        }
    }

    pub fn set_frequency(&mut self, frequency: Frequency) {
        if self.frequency != frequency {
            self.frequency = frequency;
            self.core.touch();
        }
    }

    pub fn set_trigger(&mut self, trigger: Trigger, on: bool) {
        let present = self.triggers.contains(&trigger);
        if on && !present {
            self.triggers.push(trigger);
            self.triggers.sort();
        } else if !on && present {
            self.triggers.retain(|t| *t != trigger);
        } else {
            return;
        }
        self.core.touch();
    }

    pub fn set_custom_trigger(&mut self, event: Option<&str>) -> Result<()> {
        let event = clean(event);
        if event.as_deref().is_some_and(|e| e.contains(char::is_whitespace)) {
            return Err(JssError::InvalidData(
                "custom trigger names cannot contain whitespace".into(),
            ));
        }
        self.custom_trigger = event;
        self.core.touch();
        Ok(())
    }

    /// Edit the maintenance tasks in place.
    pub fn edit_maintenance(&mut self, edit: impl FnOnce(&mut Maintenance)) {
        let before = self.maintenance.clone();
        edit(&mut self.maintenance);
        if self.maintenance != before {
            self.core.touch();
        }
    }

    pub fn set_run_command(&mut self, command: Option<&str>) {
        self.files_processes.run_command = clean(command);
        self.core.touch();
    }

    /// Search for a process by name, optionally killing it.
    pub fn set_search_for_process(&mut self, process: Option<&str>, kill: bool) -> Result<()> {
        let process = clean(process);
        if process.is_none() && kill {
            return Err(JssError::MissingData("a process name is needed to kill it".into()));
        }
        self.files_processes.search_for_process = process;
        self.files_processes.kill_process = kill;
        self.core.touch();
        Ok(())
    }

    /// Search for a file by path, optionally deleting it.
    pub fn set_search_by_path(&mut self, path: Option<&str>, delete: bool) -> Result<()> {
        let path = clean(path);
        if path.is_none() && delete {
            return Err(JssError::MissingData("a path is needed to delete a file".into()));
        }
        self.files_processes.search_by_path = path;
        self.files_processes.delete_file = delete;
        self.core.touch();
        Ok(())
    }

    pub fn set_spotlight_search(&mut self, term: Option<&str>) {
        self.files_processes.spotlight_search = clean(term);
        self.core.touch();
    }

    pub fn set_locate_file(&mut self, name: Option<&str>, update_database: bool) {
        self.files_processes.locate_file = clean(name);
        self.files_processes.update_locate_database = update_database;
        self.core.touch();
    }

    /// Drop a package by id or name. Returns whether it was present.
    pub fn remove_package(&mut self, ident: &str) -> bool {
        let ident = ident.trim();
        let before = self.packages.len();
        self.packages
            .retain(|p| !(p.name.eq_ignore_ascii_case(ident) || p.id.to_string() == ident));
        let changed = self.packages.len() != before;
        if changed {
            self.core.touch();
        }
        changed
    }

    /// Drop a script by id or name. Returns whether it was present.
    pub fn remove_script(&mut self, ident: &str) -> bool {
        let ident = ident.trim();
        let before = self.scripts.len();
        self.scripts
            .retain(|s| !(s.name.eq_ignore_ascii_case(ident) || s.id.to_string() == ident));
        let changed = self.scripts.len() != before;
        if changed {
            self.core.touch();
        }
        changed
    }

    fn general_xml(&self) -> XmlElement {
        let mut general = XmlElement::new("general")
            .text_child("name", self.name())
            .bool_child("enabled", self.enabled)
            .text_child("frequency", self.frequency)
            .text_child("trigger", if self.triggers.is_empty() { "USER_INITIATED" } else { "EVENT" });
        for trigger in Trigger::ALL {
            general.push(XmlElement::with_text(trigger.tag(), self.triggers.contains(&trigger)));
        }
        general
            .opt_child("trigger_other", self.custom_trigger.as_deref())
            .child(self.category_xml())
            .child(self.site.to_xml())
    }
}

impl ApiObject for Policy {
    const RSRC_BASE: &'static str = "policies";
    const RSRC_LIST_KEY: &'static str = "policies";
    const RSRC_OBJECT_KEY: &'static str = "policy";

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn from_json(record: &Value) -> Result<Self> {
        let general = json::at(record, "general");
        let triggers = Trigger::ALL
            .into_iter()
            .filter(|t| json::bool(general, t.tag()))
            .collect();
        Ok(Self {
            core: ObjectCore::from_json(general)?,
            enabled: json::bool(general, "enabled"),
            frequency: Frequency::parse(&json::string(general, "frequency")).unwrap_or_default(),
            triggers,
            custom_trigger: json::opt_str(general, "trigger_other"),
            category: CategoryRef::from_json(json::at(general, "category")),
            site: SiteRef::from_json(json::at(general, "site")),
            scope: Scope::new(ScopeKind::Computer).parse_into(json::at(record, "scope")),
            self_service: SelfService::from_json(SelfServiceFlavor::Policy, record),
            packages: json::array(json::at(record, "package_configuration"), "packages")
                .iter()
                .map(PolicyPackage::from_json)
                .collect(),
            scripts: json::array(record, "scripts")
                .iter()
                .map(PolicyScript::from_json)
                .collect(),
            maintenance: Maintenance::from_json(json::at(record, "maintenance")),
            files_processes: FilesProcesses::from_json(json::at(record, "files_processes")),
        })
    }
}

impl Writable for Policy {
    fn rest_xml(&self) -> XmlElement {
        let packages = XmlElement::new("packages")
            .text_child("size", self.packages.len())
            .extend(self.packages.iter().map(PolicyPackage::to_xml));
        let scripts = XmlElement::new("scripts")
            .text_child("size", self.scripts.len())
            .extend(self.scripts.iter().map(PolicyScript::to_xml));
        XmlElement::new(Self::RSRC_OBJECT_KEY)
            .child(self.general_xml())
            .child(self.scope.to_xml())
            .child(self.self_service.to_xml())
            .child(XmlElement::new("package_configuration").child(packages))
            .child(scripts)
            .child(self.maintenance.to_xml())
            .child(self.files_processes.to_xml())
    }
}

impl Creatable for Policy {
    fn new_unsaved(name: &str) -> Self {
        Self {
            core: ObjectCore::new(name),
            enabled: false,
            frequency: Frequency::default(),
            triggers: Vec::new(),
            custom_trigger: None,
            category: CategoryRef::default(),
            site: SiteRef::default(),
            scope: Scope::new(ScopeKind::Computer),
            self_service: SelfService::new(SelfServiceFlavor::Policy),
            packages: Vec::new(),
            scripts: Vec::new(),
            maintenance: Maintenance::default(),
            files_processes: FilesProcesses::default(),
        }
    }
}

impl Updatable for Policy {}
impl Deletable for Policy {}

impl Categorizable for Policy {
    const CATEGORY_STYLE: CategoryStyle = CategoryStyle::Name;

    fn category(&self) -> &CategoryRef {
        &self.category
    }

    fn category_mut(&mut self) -> &mut CategoryRef {
        &mut self.category
    }
}

impl Sitable for Policy {
    fn site(&self) -> &SiteRef {
        &self.site
    }

    fn site_mut(&mut self) -> &mut SiteRef {
        &mut self.site
    }
}

impl Scopable for Policy {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }
}

impl SelfServable for Policy {
    fn self_service(&self) -> &SelfService {
        &self.self_service
    }

    fn self_service_mut(&mut self) -> &mut SelfService {
        &mut self.self_service
    }
}

impl Uploadable for Policy {
    const UPLOAD_TYPES: &'static [(&'static str, &'static str)] = &[("icon", "policies")];
}

// ── Server-validated edits ───────────────────────────────────────────

impl Jss {
    /// Add a package to a policy, or change its action if already there.
    ///
    /// `Uninstall` is only accepted for packages that allow it.
    pub async fn add_policy_package(
        &self,
        policy: &mut Policy,
        package: impl Into<Ident>,
        action: PackageAction,
        position: Option<usize>,
    ) -> Result<()> {
        let ident = package.into();
        let id = self.require_id::<Package>(ident).await?;
        let pkg: Package = self.fetch_by_id(id).await?;
        if action == PackageAction::Uninstall && !pkg.allow_uninstalled() {
            return Err(JssError::InvalidData(format!(
                "package '{}' cannot be uninstalled",
                pkg.name()
            )));
        }

        let entry = PolicyPackage {
            id,
            name: pkg.name().to_owned(),
            action,
            fut: pkg.fill_user_template(),
            feu: pkg.fill_existing_users(),
        };
        match policy.packages.iter_mut().find(|p| p.id == id) {
            Some(existing) if *existing == entry => return Ok(()),
            Some(existing) => *existing = entry,
            None => {
                let at = position.unwrap_or(policy.packages.len()).min(policy.packages.len());
                policy.packages.insert(at, entry);
            }
        }
        policy.core.touch();
        Ok(())
    }

    /// Add a script to a policy with parameter values keyed 4 to 11.
    pub async fn add_policy_script(
        &self,
        policy: &mut Policy,
        script: impl Into<Ident>,
        priority: ScriptPriority,
        parameters: &[(usize, &str)],
    ) -> Result<()> {
        let mut values: [Option<String>; LAST_PARAMETER - FIRST_PARAMETER + 1] =
            Default::default();
        for &(number, value) in parameters {
            if !(FIRST_PARAMETER..=LAST_PARAMETER).contains(&number) {
                return Err(JssError::InvalidData(format!(
                    "script parameters are numbered {FIRST_PARAMETER} to {LAST_PARAMETER}, not {number}"
                )));
            }
            values[number - FIRST_PARAMETER] = clean(Some(value));
        }

        let ident = script.into();
        let entry = self
            .lookup_entry::<Script>(ident.clone())
            .await?
            .ok_or_else(|| JssError::NoSuchItem(format!("no script matches {ident}")))?;
        let id = entry.id().unwrap_or_default();
        let new_script = PolicyScript {
            id,
            name: entry.name().unwrap_or_default().to_owned(),
            priority,
            parameters: values,
        };
        match policy.scripts.iter_mut().find(|s| s.id == id) {
            Some(existing) if *existing == new_script => return Ok(()),
            Some(existing) => *existing = new_script,
            None => policy.scripts.push(new_script),
        }
        policy.core.touch();
        Ok(())
    }

    /// Flush a policy's logs older than `interval`, e.g. `"One Week"`.
    pub async fn flush_policy_logs(&self, policy: impl Into<Ident>, interval: &str) -> Result<()> {
        let interval = flush_interval(interval)?;
        let id = self.require_id::<Policy>(policy).await?;
        let rsrc = format!("logflush/policy/id/{id}/interval/{}", encode_segment(interval));
        self.api().delete(&rsrc).await?;
        info!(policy = id, interval, "policy logs flushed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mixins::scope::ScopeKey;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Policy {
        Policy::from_json(&json!({
            "general": {
                "id": 21, "name": "Install Office", "enabled": true,
                "frequency": "Once every week",
                "trigger_checkin": true, "trigger_login": "true", "trigger_other": "office",
                "category": { "id": 2, "name": "Productivity" },
                "site": { "id": -1, "name": "None" }
            },
            "scope": {
                "all_computers": false,
                "computer_groups": [{ "id": 5, "name": "Staff Macs" }],
                "exclusions": { "computers": [{ "id": 9, "name": "Kiosk" }] }
            },
            "self_service": { "use_for_self_service": true, "install_button_text": "Get" },
            "package_configuration": { "packages": [
                { "id": 30, "name": "Office.pkg", "action": "Cache", "fut": false, "feu": false }
            ] },
            "scripts": [{ "id": 12, "name": "Set Dock", "priority": "After", "parameter4": "full" }],
            "maintenance": { "recon": true },
            "files_processes": { "run_command": "touch /tmp/x" }
        }))
        .unwrap()
    }

    #[test]
    fn parses_general_and_subsets() {
        let p = sample();
        assert_eq!(p.name(), "Install Office");
        assert_eq!(p.frequency(), Frequency::Weekly);
        assert_eq!(p.triggers(), [Trigger::Checkin, Trigger::Login]);
        assert_eq!(p.custom_trigger(), Some("office"));
        assert_eq!(p.category_name(), Some("Productivity"));
        assert_eq!(p.site_name(), None);
        assert_eq!(p.scope().targets(ScopeKey::ComputerGroups).len(), 1);
        assert_eq!(p.scope().exclusions(ScopeKey::Computers)[0].name, "Kiosk");
        assert!(p.in_self_service());
        assert_eq!(p.packages()[0].action, PackageAction::Cache);
        assert_eq!(p.scripts()[0].parameters[0].as_deref(), Some("full"));
        assert!(p.maintenance().recon);
        assert_eq!(p.files_processes().run_command.as_deref(), Some("touch /tmp/x"));
    }

    #[test]
    fn xml_carries_triggers_and_lists() {
        let p = sample();
        let xml = p.rest_xml();
        assert_eq!(xml.find_text("general/trigger"), Some("EVENT"));
        assert_eq!(xml.find_text("general/trigger_checkin"), Some("true"));
        assert_eq!(xml.find_text("general/trigger_startup"), Some("false"));
        assert_eq!(xml.find_text("general/frequency"), Some("Once every week"));
        assert_eq!(xml.find_text("package_configuration/packages/size"), Some("1"));
        assert_eq!(xml.find_text("scripts/script/parameter4"), Some("full"));
        assert_eq!(xml.find_text("maintenance/recon"), Some("true"));
        assert_eq!(xml.find_text("self_service/use_for_self_service"), Some("true"));
    }

    #[test]
    fn trigger_toggles_only_touch_on_change() {
        let mut p = sample();
        p.set_trigger(Trigger::Checkin, true);
        assert!(!p.need_to_update());
        p.set_trigger(Trigger::Startup, true);
        assert!(p.need_to_update());
        assert_eq!(p.triggers().last(), Some(&Trigger::Startup));
    }

    #[test]
    fn file_and_process_actions_need_targets() {
        let mut p = Policy::new_unsaved("Cleanup");
        assert!(matches!(
            p.set_search_for_process(None, true),
            Err(JssError::MissingData(_))
        ));
        p.set_search_by_path(Some("/tmp/junk"), true).unwrap();
        assert!(p.files_processes().delete_file);
        assert!(p.set_custom_trigger(Some("two words")).is_err());
    }

    #[test]
    fn removing_packages_and_scripts() {
        let mut p = sample();
        assert!(p.remove_package("office.pkg"));
        assert!(!p.remove_package("office.pkg"));
        assert!(p.remove_script("12"));
        assert!(p.packages().is_empty() && p.scripts().is_empty());
    }

    #[test]
    fn maintenance_edits_touch_when_changed() {
        let mut p = sample();
        p.edit_maintenance(|m| m.recon = true);
        assert!(!p.need_to_update());
        p.edit_maintenance(|m| m.heal = true);
        assert!(p.need_to_update());
    }

    #[test]
    fn flush_intervals_are_canonicalized() {
        assert_eq!(flush_interval("one week").unwrap(), "One Week");
        assert!(flush_interval("Fortnight").is_err());
    }
}
