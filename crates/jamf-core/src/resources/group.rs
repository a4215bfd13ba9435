// ── Groups ──
//
// Computer, mobile device and user groups share one shape: smart groups
// are defined by criteria and the server computes their members; static
// groups list members explicitly. `GroupKind` supplies the paths and
// element names that differ between the three.
//
// Membership can be edited locally and saved with the whole group, or
// changed immediately with `change_group_membership`, which PUTs only
// the additions and deletions.

use std::marker::PhantomData;

use serde_json::Value;
use tracing::info;

use jamf_api::XmlElement;

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::json;
use crate::lookup::Ident;
use crate::mixins::{Criteria, Criteriable, Sitable, SiteRef};
use crate::object::{ApiObject, Creatable, Deletable, ObjectCore, ObjectRef, Updatable, Writable};
use crate::resources::{Computer, MobileDevice, User};

/// What a group contains.
pub trait GroupKind: Send + Sync + 'static {
    type Member: ApiObject;

    const RSRC_BASE: &'static str;
    const RSRC_LIST_KEY: &'static str;
    const RSRC_OBJECT_KEY: &'static str;
    /// Array of members in the record, e.g. `computers`.
    const MEMBERS_KEY: &'static str;
    /// One member element, e.g. `computer`.
    const MEMBER_TAG: &'static str;
    /// Field of a member entry holding its display name.
    const MEMBER_NAME_KEY: &'static str = "name";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputerMembers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MobileDeviceMembers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserMembers;

impl GroupKind for ComputerMembers {
    type Member = Computer;
    const RSRC_BASE: &'static str = "computergroups";
    const RSRC_LIST_KEY: &'static str = "computer_groups";
    const RSRC_OBJECT_KEY: &'static str = "computer_group";
    const MEMBERS_KEY: &'static str = "computers";
    const MEMBER_TAG: &'static str = "computer";
}

impl GroupKind for MobileDeviceMembers {
    type Member = MobileDevice;
    const RSRC_BASE: &'static str = "mobiledevicegroups";
    const RSRC_LIST_KEY: &'static str = "mobile_device_groups";
    const RSRC_OBJECT_KEY: &'static str = "mobile_device_group";
    const MEMBERS_KEY: &'static str = "mobile_devices";
    const MEMBER_TAG: &'static str = "mobile_device";
}

impl GroupKind for UserMembers {
    type Member = User;
    const RSRC_BASE: &'static str = "usergroups";
    const RSRC_LIST_KEY: &'static str = "user_groups";
    const RSRC_OBJECT_KEY: &'static str = "user_group";
    const MEMBERS_KEY: &'static str = "users";
    const MEMBER_TAG: &'static str = "user";
    const MEMBER_NAME_KEY: &'static str = "username";
}

pub type ComputerGroup = Group<ComputerMembers>;
pub type MobileDeviceGroup = Group<MobileDeviceMembers>;
pub type UserGroup = Group<UserMembers>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group<K> {
    core: ObjectCore,
    is_smart: bool,
    criteria: Criteria,
    members: Vec<ObjectRef>,
    site: SiteRef,
    kind: PhantomData<K>,
}

fn read_members<K: GroupKind>(record: &Value) -> Vec<ObjectRef> {
    json::array(record, K::MEMBERS_KEY)
        .iter()
        .map(|m| ObjectRef::new(json::i64_or(m, "id", 0), json::string(m, K::MEMBER_NAME_KEY)))
        .collect()
}

fn member_matches(member: &ObjectRef, ident: &str) -> bool {
    let ident = ident.trim();
    member.name.eq_ignore_ascii_case(ident) || member.id.to_string() == ident
}

impl<K: GroupKind> Group<K> {
    pub fn is_smart(&self) -> bool {
        self.is_smart
    }

    pub fn members(&self) -> &[ObjectRef] {
        &self.members
    }

    pub fn member_ids(&self) -> Vec<i64> {
        self.members.iter().map(|m| m.id).collect()
    }

    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn is_member(&self, ident: &str) -> bool {
        self.members.iter().any(|m| member_matches(m, ident))
    }

    /// Choose smart or static. Only possible before the group is created.
    pub fn set_smart(&mut self, smart: bool) -> Result<()> {
        if self.in_jss() {
            return Err(JssError::Unsupported(
                "a saved group cannot switch between smart and static".into(),
            ));
        }
        self.is_smart = smart;
        if smart {
            self.members.clear();
        } else {
            self.criteria = Criteria::default();
        }
        self.core.touch();
        Ok(())
    }

    /// Drop a member by id or name. Returns whether it was present.
    pub fn remove_member(&mut self, ident: &str) -> Result<bool> {
        self.require_static()?;
        let before = self.members.len();
        self.members.retain(|m| !member_matches(m, ident));
        let changed = self.members.len() != before;
        if changed {
            self.core.touch();
        }
        Ok(changed)
    }

    /// Remove every member.
    pub fn clear_members(&mut self) -> Result<()> {
        self.require_static()?;
        if !self.members.is_empty() {
            self.members.clear();
            self.core.touch();
        }
        Ok(())
    }

    fn require_static(&self) -> Result<()> {
        if self.is_smart {
            return Err(JssError::Unsupported(format!(
                "members of smart {} '{}' come from its criteria",
                K::RSRC_OBJECT_KEY,
                self.name()
            )));
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.is_smart {
            self.criteria.validate()
        } else if !self.criteria.is_empty() {
            Err(JssError::InvalidData(format!(
                "static {} '{}' cannot have criteria",
                K::RSRC_OBJECT_KEY,
                self.name()
            )))
        } else {
            Ok(())
        }
    }
}

impl<K: GroupKind> ApiObject for Group<K> {
    const RSRC_BASE: &'static str = K::RSRC_BASE;
    const RSRC_LIST_KEY: &'static str = K::RSRC_LIST_KEY;
    const RSRC_OBJECT_KEY: &'static str = K::RSRC_OBJECT_KEY;

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn from_json(record: &Value) -> Result<Self> {
        Ok(Self {
            core: ObjectCore::from_json(record)?,
            is_smart: json::bool(record, "is_smart"),
            criteria: Criteria::from_json(json::at(record, "criteria")),
            members: read_members::<K>(record),
            site: SiteRef::from_json(json::at(record, "site")),
            kind: PhantomData,
        })
    }
}

impl<K: GroupKind> Writable for Group<K> {
    fn rest_xml(&self) -> XmlElement {
        let mut xml = XmlElement::new(K::RSRC_OBJECT_KEY)
            .text_child("name", self.name())
            .bool_child("is_smart", self.is_smart)
            .child(self.site.to_xml());
        if self.is_smart {
            xml.push(self.criteria.to_xml());
        } else {
            xml.push(
                XmlElement::new(K::MEMBERS_KEY).extend(
                    self.members
                        .iter()
                        .map(|m| XmlElement::new(K::MEMBER_TAG).text_child("id", m.id)),
                ),
            );
        }
        xml
    }
}

impl<K: GroupKind> Creatable for Group<K> {
    fn new_unsaved(name: &str) -> Self {
        Self {
            core: ObjectCore::new(name),
            is_smart: false,
            criteria: Criteria::default(),
            members: Vec::new(),
            site: SiteRef::default(),
            kind: PhantomData,
        }
    }

    fn validate_for_create(&self) -> Result<()> {
        self.validate()
    }
}

impl<K: GroupKind> Updatable for Group<K> {
    fn validate_for_update(&self) -> Result<()> {
        self.validate()
    }
}

impl<K: GroupKind> Deletable for Group<K> {}

impl<K: GroupKind> Criteriable for Group<K> {
    fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    fn criteria_mut(&mut self) -> &mut Criteria {
        &mut self.criteria
    }
}

impl<K: GroupKind> Sitable for Group<K> {
    fn site(&self) -> &SiteRef {
        &self.site
    }

    fn site_mut(&mut self) -> &mut SiteRef {
        &mut self.site
    }
}

// ── Membership on the server ─────────────────────────────────────────

impl Jss {
    async fn member_ref<K: GroupKind>(&self, ident: Ident) -> Result<ObjectRef> {
        let entry = self
            .lookup_entry::<K::Member>(ident.clone())
            .await?
            .ok_or_else(|| {
                JssError::NoSuchItem(format!(
                    "no {} matches {ident}",
                    <K::Member as ApiObject>::RSRC_OBJECT_KEY
                ))
            })?;
        Ok(ObjectRef::new(
            entry.id().unwrap_or_default(),
            entry.name().unwrap_or_default(),
        ))
    }

    /// Add a member to a static group locally; saved with the group.
    pub async fn add_group_member<K: GroupKind>(
        &self,
        group: &mut Group<K>,
        member: impl Into<Ident>,
    ) -> Result<bool> {
        group.require_static()?;
        let member = self.member_ref::<K>(member.into()).await?;
        if group.members.iter().any(|m| m.id == member.id) {
            return Ok(false);
        }
        group.members.push(member);
        group.core.touch();
        Ok(true)
    }

    /// Add and remove members of a saved static group right away.
    ///
    /// Unknown identifiers fail before anything is sent. The group's
    /// member list is reloaded afterwards.
    pub async fn change_group_membership<K: GroupKind>(
        &self,
        group: &mut Group<K>,
        add: &[Ident],
        remove: &[Ident],
    ) -> Result<()> {
        group.require_static()?;
        if !group.in_jss() {
            return Err(JssError::NoSuchItem(format!(
                "{} '{}' must be created before its membership can change",
                K::RSRC_OBJECT_KEY,
                group.name()
            )));
        }
        if add.is_empty() && remove.is_empty() {
            return Ok(());
        }

        let mut additions = Vec::with_capacity(add.len());
        for ident in add {
            additions.push(self.member_ref::<K>(ident.clone()).await?);
        }
        let mut deletions = Vec::with_capacity(remove.len());
        for ident in remove {
            deletions.push(self.member_ref::<K>(ident.clone()).await?);
        }

        let member_list = |tag: String, refs: &[ObjectRef]| {
            XmlElement::new(tag).extend(
                refs.iter()
                    .map(|r| XmlElement::new(K::MEMBER_TAG).text_child("id", r.id)),
            )
        };
        let xml = XmlElement::new(K::RSRC_OBJECT_KEY)
            .child(member_list(format!("{}_additions", K::MEMBER_TAG), &additions))
            .child(member_list(format!("{}_deletions", K::MEMBER_TAG), &deletions));
        self.api()
            .put_xml(&group.rest_rsrc(), xml.to_document())
            .await?;
        info!(
            kind = K::RSRC_OBJECT_KEY,
            id = group.id(),
            added = additions.len(),
            removed = deletions.len(),
            "group membership changed"
        );

        self.refresh_group_members(group).await
    }

    /// Reload the member list from the server, keeping local edits to
    /// other fields.
    pub async fn refresh_group_members<K: GroupKind>(&self, group: &mut Group<K>) -> Result<()> {
        if !group.in_jss() {
            return Ok(());
        }
        let record = self.fetch_record::<Group<K>>(group.id()).await?;
        group.members = read_members::<K>(&record);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mixins::{AndOr, Criterion};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn static_group() -> ComputerGroup {
        ComputerGroup::from_json(&json!({
            "id": 5, "name": "Staff Macs", "is_smart": false,
            "site": { "id": -1, "name": "None" },
            "criteria": [],
            "computers": [
                { "id": 7, "name": "Mac-07", "serial_number": "C02X1" },
                { "id": 8, "name": "Mac-08" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn static_group_lists_members() {
        let g = static_group();
        assert!(!g.is_smart());
        assert_eq!(g.member_ids(), vec![7, 8]);
        assert!(g.is_member("mac-08"));
        let xml = g.rest_xml();
        assert_eq!(xml.find("computers").unwrap().children().len(), 2);
        assert!(xml.find("criteria").is_none());
    }

    #[test]
    fn user_group_members_are_named_by_username() {
        let g = UserGroup::from_json(&json!({
            "id": 2, "name": "Teachers", "is_smart": false,
            "users": [{ "id": 11, "username": "jdoe", "full_name": "Jane Doe" }]
        }))
        .unwrap();
        assert_eq!(g.member_names(), vec!["jdoe"]);
        assert_eq!(g.rest_xml().find_text("users/user/id"), Some("11"));
    }

    #[test]
    fn removing_members_touches_only_on_change() {
        let mut g = static_group();
        assert!(!g.remove_member("nope").unwrap());
        assert!(!g.need_to_update());
        assert!(g.remove_member("7").unwrap());
        assert!(g.need_to_update());
        assert_eq!(g.member_names(), vec!["Mac-08"]);
    }

    #[test]
    fn smart_groups_refuse_member_edits_and_need_balanced_criteria() {
        let mut g = MobileDeviceGroup::new_unsaved("Low Battery");
        g.set_smart(true).unwrap();
        assert!(matches!(g.remove_member("x"), Err(JssError::Unsupported(_))));

        let c = Criterion::new(AndOr::And, "Battery Level", "less than", "20")
            .unwrap()
            .with_parens(true, false);
        g.append_criterion(c);
        assert!(matches!(g.validate_for_create(), Err(JssError::InvalidData(_))));
    }

    #[test]
    fn static_groups_with_criteria_are_invalid() {
        let mut g = static_group();
        g.append_criterion(Criterion::new(AndOr::And, "Model", "like", "MacBook").unwrap());
        assert!(matches!(g.validate_for_update(), Err(JssError::InvalidData(_))));
    }

    #[test]
    fn saved_groups_cannot_switch_kind() {
        let mut g = static_group();
        assert!(g.set_smart(true).is_err());
    }
}
