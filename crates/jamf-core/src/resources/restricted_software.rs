// Restricted software: processes the client watches for and acts on.
// Its scope has targets and exclusions but no limitations.

use serde_json::Value;

use jamf_api::XmlElement;

use crate::error::{JssError, Result};
use crate::json;
use crate::mixins::scope::ScopeKind;
use crate::mixins::{Scopable, Scope, Sitable, SiteRef};
use crate::object::{ApiObject, Creatable, Deletable, ObjectCore, Updatable, Writable};

#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct RestrictedSoftware {
    core: ObjectCore,
    process_name: Option<String>,
    match_exact_process_name: bool,
    send_notification: bool,
    kill_process: bool,
    delete_executable: bool,
    display_message: Option<String>,
    site: SiteRef,
    scope: Scope,
}

impl RestrictedSoftware {
    pub fn process_name(&self) -> Option<&str> {
        self.process_name.as_deref()
    }

    pub fn match_exact_process_name(&self) -> bool {
        self.match_exact_process_name
    }

    pub fn send_notification(&self) -> bool {
        self.send_notification
    }

    pub fn kill_process(&self) -> bool {
        self.kill_process
    }

    pub fn delete_executable(&self) -> bool {
        self.delete_executable
    }

    pub fn display_message(&self) -> Option<&str> {
        self.display_message.as_deref()
    }

    pub fn set_process_name(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(JssError::InvalidData("process name cannot be empty".into()));
        }
        self.process_name = Some(name.to_owned());
        self.core.touch();
        Ok(())
    }

    pub fn set_match_exact_process_name(&mut self, value: bool) {
        self.match_exact_process_name = value;
        self.core.touch();
    }

    pub fn set_send_notification(&mut self, value: bool) {
        self.send_notification = value;
        self.core.touch();
    }

    pub fn set_kill_process(&mut self, value: bool) {
        self.kill_process = value;
        self.core.touch();
    }

    pub fn set_delete_executable(&mut self, value: bool) {
        self.delete_executable = value;
        self.core.touch();
    }

    pub fn set_display_message(&mut self, message: Option<&str>) {
        self.display_message = message.map(str::to_owned);
        self.core.touch();
    }
}

impl ApiObject for RestrictedSoftware {
    const RSRC_BASE: &'static str = "restrictedsoftware";
    const RSRC_LIST_KEY: &'static str = "restricted_software";
    const RSRC_OBJECT_KEY: &'static str = "restricted_software";

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
            process_name: json::opt_str(general, "process_name"),
            match_exact_process_name: json::bool(general, "match_exact_process_name"),
            send_notification: json::bool(general, "send_notification"),
            kill_process: json::bool(general, "kill_process"),
            delete_executable: json::bool(general, "delete_executable"),
            display_message: json::opt_str(general, "display_message"),
            site: SiteRef::from_json(json::at(general, "site")),
            scope: Scope::without_limitations(ScopeKind::Computer)
                .parse_into(json::at(record, "scope")),
        })
    }
}

impl Writable for RestrictedSoftware {
    fn rest_xml(&self) -> XmlElement {
        let general = XmlElement::new("general")
            .text_child("name", self.name())
            .opt_child("process_name", self.process_name.as_deref())
            .bool_child("match_exact_process_name", self.match_exact_process_name)
            .bool_child("send_notification", self.send_notification)
            .bool_child("kill_process", self.kill_process)
            .bool_child("delete_executable", self.delete_executable)
            .opt_child("display_message", self.display_message.as_deref())
            .child(self.site.to_xml());
        XmlElement::new(Self::RSRC_OBJECT_KEY)
            .child(general)
            .child(self.scope.to_xml())
    }
}

impl Creatable for RestrictedSoftware {
    fn new_unsaved(name: &str) -> Self {
        Self {
            core: ObjectCore::new(name),
            process_name: None,
            match_exact_process_name: false,
            send_notification: false,
            kill_process: false,
            delete_executable: false,
            display_message: None,
            site: SiteRef::default(),
            scope: Scope::without_limitations(ScopeKind::Computer),
        }
    }

    fn validate_for_create(&self) -> Result<()> {
        if self.process_name.is_none() {
            return Err(JssError::MissingData(
                "restricted software needs a process name".into(),
            ));
        }
        Ok(())
    }
}

impl Updatable for RestrictedSoftware {}
impl Deletable for RestrictedSoftware {}

impl Sitable for RestrictedSoftware {
    fn site(&self) -> &SiteRef {
        &self.site
    }

    fn site_mut(&mut self) -> &mut SiteRef {
        &mut self.site
    }
}

impl Scopable for RestrictedSoftware {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mixins::{ScopeItem, ScopeKey};
    use serde_json::json;

    #[test]
    fn scope_has_no_limitations() {
        let mut r = RestrictedSoftware::new_unsaved("No Steam");
        r.set_process_name("Steam.app").unwrap();
        r.set_kill_process(true);
        let xml = r.rest_xml();
        assert!(xml.find("scope/limitations").is_none());
        assert!(xml.find("scope/exclusions").is_some());
        assert_eq!(xml.find_text("general/kill_process"), Some("true"));

        assert!(
            r.scope_mut()
                .add_limitation(ScopeKey::Users, ScopeItem { id: None, name: "jdoe".into() })
                .is_err()
        );
    }

    #[test]
    fn reads_general_subset() {
        let r = RestrictedSoftware::from_json(&json!({
            "general": {
                "id": 4, "name": "No Steam", "process_name": "Steam.app",
                "match_exact_process_name": true, "display_message": "Not on work Macs",
                "site": { "id": -1, "name": "None" }
            },
            "scope": { "all_computers": true, "exclusions": { "computers": [{ "id": 9, "name": "Lab-9" }] } }
        }))
        .unwrap();
        assert!(r.match_exact_process_name());
        assert!(r.scope().all_targets());
        assert_eq!(r.scope().exclusions(ScopeKey::Computers).len(), 1);
        assert_eq!(r.site_name(), None);
    }
}
