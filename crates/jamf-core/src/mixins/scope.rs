// ── Scope ──
//
// Which computers or mobile devices an object (policy, profile, app,
// restricted software, patch policy) applies to. A scope has targets,
// limitations that narrow the targets, and exclusions that remove
// from them. Items are stored as `{id, name}` references; LDAP users
// are name-only.
//
// The data type validates keys and cross-list conflicts. Checking that
// an item exists needs the server, so adding items goes through `Jss`.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use jamf_api::XmlElement;

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::json;
use crate::lookup::{Ident, ListEntry};
use crate::object::ApiObject;
use crate::resources::{
    Building, Computer, ComputerGroup, Department, MobileDevice, MobileDeviceGroup,
    NetworkSegment, UserGroup,
};

// ── Keys ─────────────────────────────────────────────────────────────

/// One list within a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScopeKey {
    Computers,
    ComputerGroups,
    MobileDevices,
    MobileDeviceGroups,
    Buildings,
    Departments,
    NetworkSegments,
    Users,
    UserGroups,
}

impl ScopeKey {
    pub const ALL: [ScopeKey; 9] = [
        Self::Computers,
        Self::ComputerGroups,
        Self::MobileDevices,
        Self::MobileDeviceGroups,
        Self::Buildings,
        Self::Departments,
        Self::NetworkSegments,
        Self::Users,
        Self::UserGroups,
    ];

    /// Plural element name, e.g. `computer_groups`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Computers => "computers",
            Self::ComputerGroups => "computer_groups",
            Self::MobileDevices => "mobile_devices",
            Self::MobileDeviceGroups => "mobile_device_groups",
            Self::Buildings => "buildings",
            Self::Departments => "departments",
            Self::NetworkSegments => "network_segments",
            Self::Users => "users",
            Self::UserGroups => "user_groups",
        }
    }

    /// Element name of one item, e.g. `computer_group`.
    pub fn item_tag(self) -> &'static str {
        match self {
            Self::Computers => "computer",
            Self::ComputerGroups => "computer_group",
            Self::MobileDevices => "mobile_device",
            Self::MobileDeviceGroups => "mobile_device_group",
            Self::Buildings => "building",
            Self::Departments => "department",
            Self::NetworkSegments => "network_segment",
            Self::Users => "user",
            Self::UserGroups => "user_group",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys valid as limitations, and as exclusions in addition to targets.
pub const LIMITATION_KEYS: [ScopeKey; 3] =
    [ScopeKey::NetworkSegments, ScopeKey::Users, ScopeKey::UserGroups];

/// What kind of device a scope targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Computer,
    MobileDevice,
}

impl ScopeKind {
    pub fn target_keys(self) -> &'static [ScopeKey] {
        match self {
            Self::Computer => &[
                ScopeKey::Computers,
                ScopeKey::ComputerGroups,
                ScopeKey::Buildings,
                ScopeKey::Departments,
            ],
            Self::MobileDevice => &[
                ScopeKey::MobileDevices,
                ScopeKey::MobileDeviceGroups,
                ScopeKey::Buildings,
                ScopeKey::Departments,
            ],
        }
    }

    /// Element holding the "everything" flag.
    pub fn all_targets_tag(self) -> &'static str {
        match self {
            Self::Computer => "all_computers",
            Self::MobileDevice => "all_mobile_devices",
        }
    }
}

/// Which list of a scope an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Targets,
    Limitations,
    Exclusions,
}

impl Section {
    fn as_str(self) -> &'static str {
        match self {
            Self::Targets => "target",
            Self::Limitations => "limitation",
            Self::Exclusions => "exclusion",
        }
    }
}

// ── ScopeItem ────────────────────────────────────────────────────────

/// One scoped object. LDAP users have no id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeItem {
    pub id: Option<i64>,
    pub name: String,
}

impl ScopeItem {
    fn from_json(v: &Value) -> Self {
        Self {
            id: json::opt_i64(v, "id"),
            name: json::string(v, "name"),
        }
    }

    fn from_entry(entry: &ListEntry, fallback: &str) -> Self {
        Self {
            id: entry.id(),
            name: entry.name().unwrap_or(fallback).to_owned(),
        }
    }

    /// Whether a user-supplied identifier names this item.
    pub fn matches(&self, ident: &str) -> bool {
        let ident = ident.trim();
        self.name.eq_ignore_ascii_case(ident)
            || self.id.is_some_and(|id| ident.parse::<i64>() == Ok(id))
    }

    fn same_as(&self, other: &ScopeItem) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            _ => self.name.eq_ignore_ascii_case(&other.name),
        }
    }

    fn to_xml(&self, tag: &str) -> XmlElement {
        let mut el = XmlElement::new(tag);
        if let Some(id) = self.id {
            el.push(XmlElement::with_text("id", id));
        }
        el.push(XmlElement::with_text("name", &self.name));
        el
    }
}

// ── Scope ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    kind: ScopeKind,
    allows_limitations: bool,
    all_targets: bool,
    targets: BTreeMap<ScopeKey, Vec<ScopeItem>>,
    limitations: BTreeMap<ScopeKey, Vec<ScopeItem>>,
    exclusions: BTreeMap<ScopeKey, Vec<ScopeItem>>,
}

impl Scope {
    /// An empty scope targeting nothing.
    pub fn new(kind: ScopeKind) -> Self {
        Self {
            kind,
            allows_limitations: true,
            all_targets: false,
            targets: BTreeMap::new(),
            limitations: BTreeMap::new(),
            exclusions: BTreeMap::new(),
        }
    }

    /// A scope without limitations (restricted software).
    pub fn without_limitations(kind: ScopeKind) -> Self {
        Self {
            allows_limitations: false,
            ..Self::new(kind)
        }
    }

    /// Read the `scope` subset of a record into a scope shaped like `self`.
    pub fn parse_into(mut self, v: &Value) -> Self {
        self.all_targets = json::bool(v, self.kind.all_targets_tag());
        for &key in self.kind.target_keys() {
            self.targets.insert(key, read_items(v, key));
        }
        if self.allows_limitations {
            let lims = json::at(v, "limitations");
            for key in LIMITATION_KEYS {
                self.limitations.insert(key, read_items(lims, key));
            }
        }
        let excl = json::at(v, "exclusions");
        for key in self.exclusion_keys() {
            self.exclusions.insert(key, read_items(excl, key));
        }
        self
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn all_targets(&self) -> bool {
        self.all_targets
    }

    pub fn targets(&self, key: ScopeKey) -> &[ScopeItem] {
        self.targets.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn limitations(&self, key: ScopeKey) -> &[ScopeItem] {
        self.limitations.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn exclusions(&self, key: ScopeKey) -> &[ScopeItem] {
        self.exclusions.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn exclusion_keys(&self) -> Vec<ScopeKey> {
        let mut keys = self.kind.target_keys().to_vec();
        keys.extend(LIMITATION_KEYS);
        keys
    }

    fn valid_keys(&self, section: Section) -> Vec<ScopeKey> {
        match section {
            Section::Targets => self.kind.target_keys().to_vec(),
            Section::Limitations if self.allows_limitations => LIMITATION_KEYS.to_vec(),
            Section::Limitations => Vec::new(),
            Section::Exclusions => self.exclusion_keys(),
        }
    }

    fn check_key(&self, section: Section, key: ScopeKey) -> Result<()> {
        if self.valid_keys(section).contains(&key) {
            Ok(())
        } else {
            Err(JssError::InvalidData(format!(
                "{key} is not a valid {} for this scope",
                section.as_str()
            )))
        }
    }

    fn list_mut(&mut self, section: Section, key: ScopeKey) -> &mut Vec<ScopeItem> {
        let map = match section {
            Section::Targets => &mut self.targets,
            Section::Limitations => &mut self.limitations,
            Section::Exclusions => &mut self.exclusions,
        };
        map.entry(key).or_default()
    }

    fn list(&self, section: Section, key: ScopeKey) -> &[ScopeItem] {
        match section {
            Section::Targets => self.targets(key),
            Section::Limitations => self.limitations(key),
            Section::Exclusions => self.exclusions(key),
        }
    }

    /// Add an item. Returns false when it was already present.
    fn insert(&mut self, section: Section, key: ScopeKey, item: ScopeItem) -> Result<bool> {
        self.check_key(section, key)?;

        let conflict = match section {
            Section::Targets | Section::Limitations => Section::Exclusions,
            Section::Exclusions if self.kind.target_keys().contains(&key) => Section::Targets,
            Section::Exclusions => Section::Limitations,
        };
        if self.list(conflict, key).iter().any(|i| i.same_as(&item)) {
            return Err(JssError::InvalidData(format!(
                "'{}' is already a {} in {key}; it cannot also be a {}",
                item.name,
                conflict.as_str(),
                section.as_str()
            )));
        }

        let list = self.list_mut(section, key);
        if list.iter().any(|i| i.same_as(&item)) {
            return Ok(false);
        }
        list.push(item);
        if section == Section::Targets {
            self.all_targets = false;
        }
        Ok(true)
    }

    /// Remove an item by name or id. Returns whether anything changed.
    fn remove(&mut self, section: Section, key: ScopeKey, ident: &str) -> Result<bool> {
        self.check_key(section, key)?;
        let list = self.list_mut(section, key);
        let before = list.len();
        list.retain(|i| !i.matches(ident));
        Ok(list.len() != before)
    }

    fn replace(&mut self, section: Section, key: ScopeKey, items: Vec<ScopeItem>) -> Result<()> {
        self.check_key(section, key)?;
        *self.list_mut(section, key) = Vec::new();
        for item in items {
            self.insert(section, key, item)?;
        }
        Ok(())
    }

    pub fn add_target(&mut self, key: ScopeKey, item: ScopeItem) -> Result<bool> {
        self.insert(Section::Targets, key, item)
    }

    pub fn add_limitation(&mut self, key: ScopeKey, item: ScopeItem) -> Result<bool> {
        self.insert(Section::Limitations, key, item)
    }

    pub fn add_exclusion(&mut self, key: ScopeKey, item: ScopeItem) -> Result<bool> {
        self.insert(Section::Exclusions, key, item)
    }

    pub fn remove_target(&mut self, key: ScopeKey, ident: &str) -> Result<bool> {
        self.remove(Section::Targets, key, ident)
    }

    pub fn remove_limitation(&mut self, key: ScopeKey, ident: &str) -> Result<bool> {
        self.remove(Section::Limitations, key, ident)
    }

    pub fn remove_exclusion(&mut self, key: ScopeKey, ident: &str) -> Result<bool> {
        self.remove(Section::Exclusions, key, ident)
    }

    /// Target every device and drop the explicit targets.
    ///
    /// Returns whether anything changed.
    pub fn include_all(&mut self) -> bool {
        let had_targets = self.targets.values().any(|v| !v.is_empty());
        let changed = !self.all_targets || had_targets;
        self.all_targets = true;
        self.targets.values_mut().for_each(Vec::clear);
        changed
    }

    pub fn to_xml(&self) -> XmlElement {
        let mut scope = XmlElement::new("scope")
            .bool_child(self.kind.all_targets_tag(), self.all_targets);
        for &key in self.kind.target_keys() {
            scope.push(items_xml(key, self.targets(key)));
        }
        if self.allows_limitations {
            let mut lims = XmlElement::new("limitations");
            for key in LIMITATION_KEYS {
                lims.push(items_xml(key, self.limitations(key)));
            }
            scope.push(lims);
        }
        let mut excl = XmlElement::new("exclusions");
        for key in self.exclusion_keys() {
            excl.push(items_xml(key, self.exclusions(key)));
        }
        scope.push(excl);
        scope
    }
}

fn read_items(v: &Value, key: ScopeKey) -> Vec<ScopeItem> {
    json::array(v, key.as_str())
        .iter()
        .map(ScopeItem::from_json)
        .collect()
}

fn items_xml(key: ScopeKey, items: &[ScopeItem]) -> XmlElement {
    XmlElement::new(key.as_str()).extend(items.iter().map(|i| i.to_xml(key.item_tag())))
}

// ── Scopable ─────────────────────────────────────────────────────────

/// Objects with a scope.
pub trait Scopable: ApiObject {
    fn scope(&self) -> &Scope;
    fn scope_mut(&mut self) -> &mut Scope;

    fn remove_scope_target(&mut self, key: ScopeKey, ident: &str) -> Result<bool> {
        let changed = self.scope_mut().remove_target(key, ident)?;
        if changed {
            self.core_mut().touch();
        }
        Ok(changed)
    }

    fn remove_scope_limitation(&mut self, key: ScopeKey, ident: &str) -> Result<bool> {
        let changed = self.scope_mut().remove_limitation(key, ident)?;
        if changed {
            self.core_mut().touch();
        }
        Ok(changed)
    }

    fn remove_scope_exclusion(&mut self, key: ScopeKey, ident: &str) -> Result<bool> {
        let changed = self.scope_mut().remove_exclusion(key, ident)?;
        if changed {
            self.core_mut().touch();
        }
        Ok(changed)
    }

    /// Scope to all computers or all mobile devices.
    fn set_all_targets(&mut self) {
        if self.scope_mut().include_all() {
            self.core_mut().touch();
        }
    }
}

impl Jss {
    /// Look up a scope item on the server.
    async fn resolve_scope_item(&self, key: ScopeKey, ident: &str) -> Result<ScopeItem> {
        let ident_str = ident.trim();
        let entry = match key {
            ScopeKey::Users => {
                return if self.ldap_user_exists(ident_str).await? {
                    Ok(ScopeItem {
                        id: None,
                        name: ident_str.to_owned(),
                    })
                } else {
                    Err(JssError::NoSuchItem(format!(
                        "no LDAP user named '{ident_str}'"
                    )))
                };
            }
            ScopeKey::Computers => self.lookup_entry::<Computer>(ident_str).await?,
            ScopeKey::ComputerGroups => self.lookup_entry::<ComputerGroup>(ident_str).await?,
            ScopeKey::MobileDevices => self.lookup_entry::<MobileDevice>(ident_str).await?,
            ScopeKey::MobileDeviceGroups => {
                self.lookup_entry::<MobileDeviceGroup>(ident_str).await?
            }
            ScopeKey::Buildings => self.lookup_entry::<Building>(ident_str).await?,
            ScopeKey::Departments => self.lookup_entry::<Department>(ident_str).await?,
            ScopeKey::NetworkSegments => self.lookup_entry::<NetworkSegment>(ident_str).await?,
            ScopeKey::UserGroups => self.lookup_entry::<UserGroup>(ident_str).await?,
        };
        entry
            .map(|e| ScopeItem::from_entry(&e, ident_str))
            .ok_or_else(|| {
                JssError::NoSuchItem(format!("no {} matches {}", key.item_tag(), Ident::from(ident_str)))
            })
    }

    async fn add_to_scope<T: Scopable>(
        &self,
        obj: &mut T,
        section: Section,
        key: ScopeKey,
        ident: &str,
    ) -> Result<bool> {
        obj.scope().check_key(section, key)?;
        let item = self.resolve_scope_item(key, ident).await?;
        let changed = obj.scope_mut().insert(section, key, item)?;
        if changed {
            obj.core_mut().touch();
        }
        Ok(changed)
    }

    /// Add a target after checking it exists.
    pub async fn add_scope_target<T: Scopable>(
        &self,
        obj: &mut T,
        key: ScopeKey,
        ident: &str,
    ) -> Result<bool> {
        self.add_to_scope(obj, Section::Targets, key, ident).await
    }

    /// Add a limitation after checking it exists.
    pub async fn add_scope_limitation<T: Scopable>(
        &self,
        obj: &mut T,
        key: ScopeKey,
        ident: &str,
    ) -> Result<bool> {
        self.add_to_scope(obj, Section::Limitations, key, ident).await
    }

    /// Add an exclusion after checking it exists.
    pub async fn add_scope_exclusion<T: Scopable>(
        &self,
        obj: &mut T,
        key: ScopeKey,
        ident: &str,
    ) -> Result<bool> {
        self.add_to_scope(obj, Section::Exclusions, key, ident).await
    }

    /// Replace every target under `key`. All items are checked first.
    pub async fn set_scope_targets<T: Scopable>(
        &self,
        obj: &mut T,
        key: ScopeKey,
        idents: &[&str],
    ) -> Result<()> {
        obj.scope().check_key(Section::Targets, key)?;
        let mut items = Vec::with_capacity(idents.len());
        for ident in idents {
            items.push(self.resolve_scope_item(key, ident).await?);
        }

        let mut scope = obj.scope().clone();
        scope.replace(Section::Targets, key, items)?;
        if scope != *obj.scope() {
            *obj.scope_mut() = scope;
            obj.core_mut().touch();
        }
        Ok(())
    }
}
