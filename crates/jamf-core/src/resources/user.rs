// Users, as Jamf Pro tracks them for device assignment.

use serde_json::Value;

use jamf_api::XmlElement;

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::json;
use crate::lookup::Ident;
use crate::mixins::{Extendable, ExtensionAttributes};
use crate::object::{ApiObject, Creatable, Deletable, ObjectCore, ObjectRef, Updatable, Writable};
use crate::resources::{LdapServer, Site, UserExtensionAttribute};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    core: ObjectCore,
    full_name: Option<String>,
    email: Option<String>,
    phone_number: Option<String>,
    position: Option<String>,
    ldap_server: Option<ObjectRef>,
    sites: Vec<ObjectRef>,
    computers: Vec<ObjectRef>,
    mobile_devices: Vec<ObjectRef>,
    ext_attrs: ExtensionAttributes,
}

fn clean(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

impl User {
    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    pub fn position(&self) -> Option<&str> {
        self.position.as_deref()
    }

    pub fn ldap_server(&self) -> Option<&ObjectRef> {
        self.ldap_server.as_ref()
    }

    pub fn sites(&self) -> &[ObjectRef] {
        &self.sites
    }

    /// Computers assigned to this user (read-only).
    pub fn computers(&self) -> &[ObjectRef] {
        &self.computers
    }

    pub fn mobile_devices(&self) -> &[ObjectRef] {
        &self.mobile_devices
    }

    pub fn set_full_name(&mut self, value: Option<&str>) {
        self.full_name = clean(value);
        self.core.touch();
    }

    pub fn set_email(&mut self, value: Option<&str>) -> Result<()> {
        let value = clean(value);
        if value.as_deref().is_some_and(|v| !v.contains('@')) {
            return Err(JssError::InvalidData(format!(
                "'{}' is not an email address",
                value.unwrap_or_default()
            )));
        }
        self.email = value;
        self.core.touch();
        Ok(())
    }

    pub fn set_phone_number(&mut self, value: Option<&str>) {
        self.phone_number = clean(value);
        self.core.touch();
    }

    pub fn set_position(&mut self, value: Option<&str>) {
        self.position = clean(value);
        self.core.touch();
    }

    /// Drop a site by id or name. Returns whether it was present.
    pub fn remove_site(&mut self, ident: &str) -> bool {
        let ident = ident.trim();
        let before = self.sites.len();
        self.sites
            .retain(|s| !(s.name.eq_ignore_ascii_case(ident) || s.id.to_string() == ident));
        let changed = self.sites.len() != before;
        if changed {
            self.core.touch();
        }
        changed
    }
}

impl ApiObject for User {
    const RSRC_BASE: &'static str = "users";
    const RSRC_LIST_KEY: &'static str = "users";
    const RSRC_OBJECT_KEY: &'static str = "user";

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn from_json(record: &Value) -> Result<Self> {
        let ldap = json::at(record, "ldap_server");
        let links = json::at(record, "links");
        Ok(Self {
            core: ObjectCore::from_json(record)?,
            full_name: json::opt_str(record, "full_name"),
            email: json::opt_str(record, "email")
                .or_else(|| json::opt_str(record, "email_address")),
            phone_number: json::opt_str(record, "phone_number"),
            position: json::opt_str(record, "position"),
            ldap_server: json::opt_i64(ldap, "id")
                .filter(|id| *id > 0)
                .map(|id| ObjectRef::new(id, json::string(ldap, "name"))),
            sites: ObjectRef::list_from_json(record, "sites"),
            computers: ObjectRef::list_from_json(links, "computers"),
            mobile_devices: ObjectRef::list_from_json(links, "mobile_devices"),
            ext_attrs: ExtensionAttributes::from_json(json::at(record, "extension_attributes")),
        })
    }
}

impl Writable for User {
    fn rest_xml(&self) -> XmlElement {
        let ldap = XmlElement::new("ldap_server")
            .text_child("id", self.ldap_server.as_ref().map_or(-1, |l| l.id));
        XmlElement::new(Self::RSRC_OBJECT_KEY)
            .text_child("name", self.name())
            .opt_child("full_name", self.full_name.as_deref())
            .opt_child("email", self.email.as_deref())
            .opt_child("email_address", self.email.as_deref())
            .opt_child("phone_number", self.phone_number.as_deref())
            .opt_child("position", self.position.as_deref())
            .child(ldap)
            .child(ObjectRef::list_to_xml(&self.sites, "sites", "site"))
            .child(self.ext_attrs.to_xml())
    }

    fn on_saved(&mut self) {
        self.ext_attrs.clear_changes();
    }
}

impl Creatable for User {
    fn new_unsaved(name: &str) -> Self {
        Self {
            core: ObjectCore::new(name),
            full_name: None,
            email: None,
            phone_number: None,
            position: None,
            ldap_server: None,
            sites: Vec::new(),
            computers: Vec::new(),
            mobile_devices: Vec::new(),
            ext_attrs: ExtensionAttributes::default(),
        }
    }
}

impl Updatable for User {}
impl Deletable for User {}

impl Extendable for User {
    type Definition = UserExtensionAttribute;

    fn ext_attrs(&self) -> &ExtensionAttributes {
        &self.ext_attrs
    }

    fn ext_attrs_mut(&mut self) -> &mut ExtensionAttributes {
        &mut self.ext_attrs
    }
}

impl Jss {
    /// Tie a user to an LDAP server, or detach it with `None`.
    pub async fn set_user_ldap_server(&self, user: &mut User, server: Option<&str>) -> Result<()> {
        let new_ref = match server {
            None => None,
            Some(ident) => {
                let entry = self
                    .lookup_entry::<LdapServer>(ident)
                    .await?
                    .ok_or_else(|| JssError::NoSuchItem(format!("no LDAP server matches '{ident}'")))?;
                Some(ObjectRef::new(
                    entry.id().unwrap_or_default(),
                    entry.name().unwrap_or(ident),
                ))
            }
        };
        if user.ldap_server != new_ref {
            user.ldap_server = new_ref;
            user.core.touch();
        }
        Ok(())
    }

    /// Give a user access to a site.
    pub async fn add_user_site(&self, user: &mut User, site: impl Into<Ident>) -> Result<bool> {
        let ident = site.into();
        let entry = self
            .lookup_entry::<Site>(ident.clone())
            .await?
            .ok_or_else(|| JssError::NoSuchItem(format!("no site matches {ident}")))?;
        let id = entry.id().unwrap_or_default();
        if user.sites.iter().any(|s| s.id == id) {
            return Ok(false);
        }
        user.sites
            .push(ObjectRef::new(id, entry.name().unwrap_or_default()));
        user.core.touch();
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_links_and_ldap() {
        let u = User::from_json(&json!({
            "id": 11, "name": "jdoe", "full_name": "Jane Doe", "email": "jdoe@example.com",
            "ldap_server": { "id": 1, "name": "Corp AD" },
            "sites": [{ "id": 2, "name": "Schools" }],
            "links": { "computers": [{ "id": 7, "name": "Mac-07" }], "mobile_devices": [] },
            "extension_attributes": [{ "id": 3, "name": "Badge", "type": "String", "value": "42" }]
        }))
        .unwrap();
        assert_eq!(u.full_name(), Some("Jane Doe"));
        assert_eq!(u.ldap_server().unwrap().name, "Corp AD");
        assert_eq!(u.computers()[0].id, 7);
        assert_eq!(u.ext_attr("badge"), Some("42"));
        assert_eq!(u.rest_xml().find_text("sites/site/name"), Some("Schools"));
    }

    #[test]
    fn email_needs_an_at_sign() {
        let mut u = User::new_unsaved("jdoe");
        assert!(u.set_email(Some("not-an-address")).is_err());
        u.set_email(Some(" jdoe@example.com ")).unwrap();
        assert_eq!(u.email(), Some("jdoe@example.com"));
        assert_eq!(u.rest_xml().find_text("ldap_server/id"), Some("-1"));
    }
}
