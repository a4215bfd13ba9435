// Extension attribute definitions for computers, mobile devices and users.
//
// The three resources share one shape; `EaTarget` supplies the paths
// and the few rules that differ between them.

use std::marker::PhantomData;

use serde_json::Value;

use jamf_api::XmlElement;

use crate::error::{JssError, Result};
use crate::json;
use crate::mixins::{EaDataType, EaInputType, ExtAttrDefinition};
use crate::object::{ApiObject, Creatable, Deletable, ObjectCore, Updatable, Writable};

/// Inventory tabs a value can be shown on.
pub const INVENTORY_DISPLAY_CHOICES: &[&str] = &[
    "General",
    "Hardware",
    "Operating System",
    "User and Location",
    "Purchasing",
    "Extension Attributes",
];

/// What kind of record a definition applies to.
pub trait EaTarget: Send + Sync + 'static {
    const RSRC_BASE: &'static str;
    const RSRC_LIST_KEY: &'static str;
    const RSRC_OBJECT_KEY: &'static str;
    /// Only computers run inventory scripts.
    const ALLOWS_SCRIPT: bool;
    const HAS_INVENTORY_DISPLAY: bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputerTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MobileDeviceTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserTarget;

impl EaTarget for ComputerTarget {
    const RSRC_BASE: &'static str = "computerextensionattributes";
    const RSRC_LIST_KEY: &'static str = "computer_extension_attributes";
    const RSRC_OBJECT_KEY: &'static str = "computer_extension_attribute";
    const ALLOWS_SCRIPT: bool = true;
    const HAS_INVENTORY_DISPLAY: bool = true;
}

impl EaTarget for MobileDeviceTarget {
    const RSRC_BASE: &'static str = "mobiledeviceextensionattributes";
    const RSRC_LIST_KEY: &'static str = "mobile_device_extension_attributes";
    const RSRC_OBJECT_KEY: &'static str = "mobile_device_extension_attribute";
    const ALLOWS_SCRIPT: bool = false;
    const HAS_INVENTORY_DISPLAY: bool = true;
}

impl EaTarget for UserTarget {
    const RSRC_BASE: &'static str = "userextensionattributes";
    const RSRC_LIST_KEY: &'static str = "user_extension_attributes";
    const RSRC_OBJECT_KEY: &'static str = "user_extension_attribute";
    const ALLOWS_SCRIPT: bool = false;
    const HAS_INVENTORY_DISPLAY: bool = false;
}

pub type ComputerExtensionAttribute = ExtensionAttributeDef<ComputerTarget>;
pub type MobileDeviceExtensionAttribute = ExtensionAttributeDef<MobileDeviceTarget>;
pub type UserExtensionAttribute = ExtensionAttributeDef<UserTarget>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionAttributeDef<K> {
    core: ObjectCore,
    description: Option<String>,
    data_type: EaDataType,
    input_type: EaInputType,
    inventory_display: Option<String>,
    enabled: bool,
    target: PhantomData<K>,
}

impl<K: EaTarget> ExtensionAttributeDef<K> {
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn inventory_display(&self) -> Option<&str> {
        self.inventory_display.as_deref()
    }

    /// Disabled script attributes are not run during inventory.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_description(&mut self, description: Option<&str>) {
        self.description = description.map(str::to_owned);
        self.core.touch();
    }

    pub fn set_data_type(&mut self, data_type: EaDataType) {
        if self.data_type != data_type {
            self.data_type = data_type;
            self.core.touch();
        }
    }

    pub fn set_input_type(&mut self, input_type: EaInputType) -> Result<()> {
        check_input_type::<K>(&input_type)?;
        if self.input_type != input_type {
            self.input_type = input_type;
            self.core.touch();
        }
        Ok(())
    }

    pub fn set_inventory_display(&mut self, tab: &str) -> Result<()> {
        if !K::HAS_INVENTORY_DISPLAY {
            return Err(JssError::Unsupported(format!(
                "{} definitions have no inventory display",
                K::RSRC_OBJECT_KEY
            )));
        }
        let tab = INVENTORY_DISPLAY_CHOICES
            .iter()
            .find(|c| c.eq_ignore_ascii_case(tab.trim()))
            .ok_or_else(|| {
                JssError::InvalidData(format!(
                    "inventory display must be one of {}",
                    INVENTORY_DISPLAY_CHOICES.join(", ")
                ))
            })?;
        self.inventory_display = Some((*tab).to_owned());
        self.core.touch();
        Ok(())
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.core.touch();
        }
    }
}

fn check_input_type<K: EaTarget>(input: &EaInputType) -> Result<()> {
    match input {
        EaInputType::Script(_) if !K::ALLOWS_SCRIPT => Err(JssError::Unsupported(format!(
            "{} definitions cannot use script input",
            K::RSRC_OBJECT_KEY
        ))),
        EaInputType::Script(code) if code.trim().is_empty() => {
            Err(JssError::MissingData("script input needs script code".into()))
        }
        EaInputType::PopUp(choices) if choices.is_empty() => Err(JssError::MissingData(
            "a pop-up menu needs at least one choice".into(),
        )),
        _ => Ok(()),
    }
}

impl<K: EaTarget> ApiObject for ExtensionAttributeDef<K> {
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
            description: json::opt_str(record, "description"),
            data_type: EaDataType::parse(&json::string(record, "data_type")),
            input_type: EaInputType::from_json(json::at(record, "input_type")),
            inventory_display: json::opt_str(record, "inventory_display"),
            enabled: record.get("enabled").is_none() || json::bool(record, "enabled"),
            target: PhantomData,
        })
    }
}

impl<K: EaTarget> Writable for ExtensionAttributeDef<K> {
    fn rest_xml(&self) -> XmlElement {
        let mut xml = XmlElement::new(K::RSRC_OBJECT_KEY)
            .text_child("name", self.name())
            .opt_child("description", self.description.as_deref())
            .text_child("data_type", self.data_type.as_str())
            .child(self.input_type.to_xml());
        if K::HAS_INVENTORY_DISPLAY {
            xml.push(XmlElement::with_text(
                "inventory_display",
                self.inventory_display.as_deref().unwrap_or("Extension Attributes"),
            ));
        }
        if K::ALLOWS_SCRIPT {
            xml.push(XmlElement::with_text("enabled", self.enabled));
        }
        xml
    }
}

impl<K: EaTarget> Creatable for ExtensionAttributeDef<K> {
    fn new_unsaved(name: &str) -> Self {
        Self {
            core: ObjectCore::new(name),
            description: None,
            data_type: EaDataType::String,
            input_type: EaInputType::TextField,
            inventory_display: None,
            enabled: true,
            target: PhantomData,
        }
    }

    fn validate_for_create(&self) -> Result<()> {
        check_input_type::<K>(&self.input_type)
    }
}

impl<K: EaTarget> Updatable for ExtensionAttributeDef<K> {
    fn validate_for_update(&self) -> Result<()> {
        check_input_type::<K>(&self.input_type)
    }
}

impl<K: EaTarget> Deletable for ExtensionAttributeDef<K> {}

impl<K: EaTarget> ExtAttrDefinition for ExtensionAttributeDef<K> {
    fn data_type(&self) -> EaDataType {
        self.data_type
    }

    fn input_type(&self) -> &EaInputType {
        &self.input_type
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_popup_definition() {
        let def = MobileDeviceExtensionAttribute::from_json(&json!({
            "id": 4, "name": "Cart", "data_type": "String",
            "input_type": { "type": "Pop-up Menu", "popup_choices": ["A", "B"] },
            "inventory_display": "General"
        }))
        .unwrap();
        assert_eq!(def.input_type(), &EaInputType::PopUp(vec!["A".into(), "B".into()]));
        assert_eq!(def.inventory_display(), Some("General"));
        assert_eq!(def.rest_rsrc(), "mobiledeviceextensionattributes/id/4");
    }

    #[test]
    fn scripts_only_for_computers() {
        let script = EaInputType::Script("#!/bin/sh\necho 1".into());
        let mut user_def = UserExtensionAttribute::new_unsaved("Badge");
        assert!(matches!(
            user_def.set_input_type(script.clone()),
            Err(JssError::Unsupported(_))
        ));
        let mut mac_def = ComputerExtensionAttribute::new_unsaved("Uptime");
        mac_def.set_input_type(script).unwrap();
        assert_eq!(mac_def.rest_xml().find_text("input_type/type"), Some("script"));
        assert_eq!(mac_def.rest_xml().find_text("enabled"), Some("true"));
    }

    #[test]
    fn user_definitions_have_no_inventory_tab() {
        let mut def = UserExtensionAttribute::new_unsaved("Badge");
        assert!(def.set_inventory_display("General").is_err());
        assert!(def.rest_xml().find("inventory_display").is_none());
    }

    #[test]
    fn inventory_tab_is_validated() {
        let mut def = ComputerExtensionAttribute::new_unsaved("Owner");
        def.set_inventory_display("purchasing").unwrap();
        assert_eq!(def.inventory_display(), Some("Purchasing"));
        assert!(def.set_inventory_display("Sidebar").is_err());
    }
}
