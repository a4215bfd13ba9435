// Directory bindings: the settings a policy uses to bind a Mac to a
// directory service.

use serde_json::Value;

use jamf_api::XmlElement;

use crate::error::{JssError, Result};
use crate::json;
use crate::object::{ApiObject, Creatable, Deletable, ObjectCore, Updatable, Writable};

pub const MIN_BINDING_PRIORITY: i64 = 1;
pub const MAX_BINDING_PRIORITY: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryBinding {
    core: ObjectCore,
    priority: i64,
    domain: Option<String>,
    username: Option<String>,
    password: Option<String>,
    computer_ou: Option<String>,
    binding_type: Option<String>,
}

impl DirectoryBinding {
    pub fn priority(&self) -> i64 {
        self.priority
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn computer_ou(&self) -> Option<&str> {
        self.computer_ou.as_deref()
    }

    /// e.g. "Active Directory", "Centrify".
    pub fn binding_type(&self) -> Option<&str> {
        self.binding_type.as_deref()
    }

    pub fn set_priority(&mut self, priority: i64) -> Result<()> {
        if !(MIN_BINDING_PRIORITY..=MAX_BINDING_PRIORITY).contains(&priority) {
            return Err(JssError::InvalidData(format!(
                "binding priority must be between {MIN_BINDING_PRIORITY} and \
                 {MAX_BINDING_PRIORITY}, not {priority}"
            )));
        }
        self.priority = priority;
        self.core.touch();
        Ok(())
    }

    pub fn set_domain(&mut self, domain: &str) {
        self.domain = Some(domain.trim().to_owned());
        self.core.touch();
    }

    /// Account used to bind. The server never returns the password, so
    /// it is only sent when set here.
    pub fn set_credentials(&mut self, username: &str, password: &str) {
        self.username = Some(username.to_owned());
        self.password = Some(password.to_owned());
        self.core.touch();
    }

    pub fn set_computer_ou(&mut self, ou: Option<&str>) {
        self.computer_ou = ou.map(str::to_owned);
        self.core.touch();
    }

    pub fn set_binding_type(&mut self, kind: &str) {
        self.binding_type = Some(kind.to_owned());
        self.core.touch();
    }
}

impl ApiObject for DirectoryBinding {
    const RSRC_BASE: &'static str = "directorybindings";
    const RSRC_LIST_KEY: &'static str = "directory_bindings";
    const RSRC_OBJECT_KEY: &'static str = "directory_binding";

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn from_json(record: &Value) -> Result<Self> {
        Ok(Self {
            core: ObjectCore::from_json(record)?,
            priority: json::i64_or(record, "priority", MIN_BINDING_PRIORITY),
            domain: json::opt_str(record, "domain"),
            username: json::opt_str(record, "username"),
            password: None,
            computer_ou: json::opt_str(record, "computer_ou"),
            binding_type: json::opt_str(record, "type"),
        })
    }
}

impl Writable for DirectoryBinding {
    fn rest_xml(&self) -> XmlElement {
        let mut xml = XmlElement::new(Self::RSRC_OBJECT_KEY)
            .text_child("name", self.name())
            .text_child("priority", self.priority)
            .opt_child("domain", self.domain.as_deref())
            .opt_child("username", self.username.as_deref())
            .opt_child("computer_ou", self.computer_ou.as_deref())
            .opt_child("type", self.binding_type.as_deref());
        if let Some(password) = &self.password {
            xml.push(XmlElement::with_text("password", password));
        }
        xml
    }

    fn on_saved(&mut self) {
        self.password = None;
    }
}

impl Creatable for DirectoryBinding {
    fn new_unsaved(name: &str) -> Self {
        Self {
            core: ObjectCore::new(name),
            priority: MIN_BINDING_PRIORITY,
            domain: None,
            username: None,
            password: None,
            computer_ou: None,
            binding_type: None,
        }
    }

    fn validate_for_create(&self) -> Result<()> {
        if self.domain.as_deref().is_none_or(str::is_empty) {
            return Err(JssError::MissingData("a directory binding needs a domain".into()));
        }
        Ok(())
    }
}

impl Updatable for DirectoryBinding {}
impl Deletable for DirectoryBinding {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn password_is_write_only() {
        let mut b = DirectoryBinding::from_json(&json!({
            "id": 2, "name": "Corp AD", "priority": 1, "domain": "corp.example.com",
            "username": "binder", "password": "", "type": "Active Directory"
        }))
        .unwrap();
        assert!(b.rest_xml().find("password").is_none());

        b.set_credentials("binder", "s3cret");
        assert_eq!(b.rest_xml().find_text("password"), Some("s3cret"));
        b.on_saved();
        assert!(b.rest_xml().find("password").is_none());
    }

    #[test]
    fn priority_range_is_enforced() {
        let mut b = DirectoryBinding::new_unsaved("Lab");
        assert!(b.set_priority(11).is_err());
        b.set_priority(3).unwrap();
        assert_eq!(b.priority(), 3);
        assert!(matches!(b.validate_for_create(), Err(JssError::MissingData(_))));
    }
}
