// ── Extension attributes ──
//
// Values of custom inventory fields on computers, mobile devices and
// users. Each value belongs to a definition object; setting a value is
// checked against that definition (input type, popup choices, data
// type). Only values changed since the last save are written back, so
// an update never clobbers script-populated values.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde_json::Value;

use jamf_api::XmlElement;

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::json;
use crate::lookup::Ident;
use crate::object::ApiObject;

/// Declared type of an attribute's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EaDataType {
    #[default]
    String,
    Integer,
    Date,
}

impl EaDataType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Date => "Date",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "integer" | "number" => Self::Integer,
            "date" => Self::Date,
            _ => Self::String,
        }
    }

    /// Check a user-supplied value. Empty always passes (it clears).
    pub fn validate(self, value: &str) -> Result<()> {
        let v = value.trim();
        if v.is_empty() {
            return Ok(());
        }
        let ok = match self {
            Self::String => true,
            Self::Integer => v.parse::<i64>().is_ok(),
            Self::Date => parse_ea_date(v).is_some(),
        };
        if ok {
            Ok(())
        } else {
            Err(JssError::InvalidData(format!(
                "'{value}' is not a valid {} value",
                self.as_str().to_ascii_lowercase()
            )))
        }
    }
}

/// Accepts `YYYY-MM-DD` and `YYYY-MM-DD hh:mm:ss`.
fn parse_ea_date(v: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(v, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// How values of an attribute are entered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EaInputType {
    #[default]
    TextField,
    PopUp(Vec<String>),
    /// Populated by a script at inventory time.
    Script(String),
    /// Read from an LDAP attribute.
    LdapMapping(String),
}

impl EaInputType {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::TextField => "Text Field",
            Self::PopUp(_) => "Pop-up Menu",
            Self::Script(_) => "script",
            Self::LdapMapping(_) => "LDAP Attribute Mapping",
        }
    }

    pub fn from_json(v: &Value) -> Self {
        let kind = json::string(v, "type");
        match kind.to_ascii_lowercase().as_str() {
            "pop-up menu" => Self::PopUp(json::strings(v, "popup_choices")),
            "script" => Self::Script(json::string(v, "script")),
            "ldap attribute mapping" => {
                Self::LdapMapping(json::string(v, "attribute_mapping"))
            }
            _ => Self::TextField,
        }
    }

    pub fn to_xml(&self) -> XmlElement {
        let input = XmlElement::new("input_type").text_child("type", self.type_name());
        match self {
            Self::TextField => input,
            Self::PopUp(choices) => input.child(
                XmlElement::new("popup_choices")
                    .extend(choices.iter().map(|c| XmlElement::with_text("choice", c))),
            ),
            Self::Script(code) => input.text_child("script", code),
            Self::LdapMapping(attr) => input.text_child("attribute_mapping", attr),
        }
    }
}

/// What a definition object exposes to value setters.
pub trait ExtAttrDefinition: ApiObject {
    fn data_type(&self) -> EaDataType;
    fn input_type(&self) -> &EaInputType;
}

// ── Values ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtAttrValue {
    pub id: i64,
    pub name: String,
    pub data_type: EaDataType,
    pub value: String,
}

/// The attribute values of one object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionAttributes {
    values: Vec<ExtAttrValue>,
    changed: BTreeSet<i64>,
}

impl ExtensionAttributes {
    /// Read the `extension_attributes` array.
    pub fn from_json(v: &Value) -> Self {
        let values = v
            .as_array()
            .map(|a| a.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|ea| ExtAttrValue {
                id: json::i64_or(ea, "id", 0),
                name: json::string(ea, "name"),
                data_type: EaDataType::parse(&json::string(ea, "type")),
                value: match json::at(ea, "value") {
                    Value::Array(items) => items
                        .iter()
                        .filter_map(json::scalar_string)
                        .collect::<Vec<_>>()
                        .join(", "),
                    other => json::scalar_string(other).unwrap_or_default(),
                },
            })
            .collect();
        Self {
            values,
            changed: BTreeSet::new(),
        }
    }

    /// The current value of an attribute, by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(name))
            .map(|v| v.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtAttrValue> {
        self.values.iter()
    }

    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Names of attributes changed since the last save.
    pub fn changed_names(&self) -> Vec<&str> {
        self.values
            .iter()
            .filter(|v| self.changed.contains(&v.id))
            .map(|v| v.name.as_str())
            .collect()
    }

    /// Store a value and mark it changed. Returns false if it was already set.
    pub fn set(&mut self, id: i64, name: &str, data_type: EaDataType, value: &str) -> bool {
        let value = value.trim();
        match self.values.iter_mut().find(|v| v.id == id) {
            Some(existing) if existing.value == value => return false,
            Some(existing) => existing.value = value.to_owned(),
            None => self.values.push(ExtAttrValue {
                id,
                name: name.to_owned(),
                data_type,
                value: value.to_owned(),
            }),
        }
        self.changed.insert(id);
        true
    }

    pub fn clear_changes(&mut self) {
        self.changed.clear();
    }

    /// `<extension_attributes>` with only the changed values.
    pub fn to_xml(&self) -> XmlElement {
        XmlElement::new("extension_attributes").extend(
            self.values
                .iter()
                .filter(|v| self.changed.contains(&v.id))
                .map(|v| {
                    XmlElement::new("extension_attribute")
                        .text_child("id", v.id)
                        .text_child("name", &v.name)
                        .text_child("value", &v.value)
                }),
        )
    }
}

/// Objects carrying extension attribute values.
pub trait Extendable: ApiObject {
    /// The definition resource for this object's attributes.
    type Definition: ExtAttrDefinition;

    fn ext_attrs(&self) -> &ExtensionAttributes;
    fn ext_attrs_mut(&mut self) -> &mut ExtensionAttributes;

    fn ext_attr(&self, name: &str) -> Option<&str> {
        self.ext_attrs().get(name)
    }
}

impl Jss {
    /// Set an attribute value after checking it against its definition.
    pub async fn set_ext_attr<T: Extendable>(
        &self,
        obj: &mut T,
        name: &str,
        value: &str,
    ) -> Result<()> {
        let def: T::Definition = self
            .fetch(Ident::Name(name.to_owned()))
            .await
            .map_err(|e| match e {
                JssError::NoSuchItem(_) => JssError::NoSuchItem(format!(
                    "no {} named '{name}'",
                    <T::Definition as ApiObject>::RSRC_OBJECT_KEY
                )),
                other => other,
            })?;

        match def.input_type() {
            EaInputType::Script(_) => {
                return Err(JssError::Unsupported(format!(
                    "'{name}' is populated by a script and cannot be set"
                )));
            }
            EaInputType::LdapMapping(_) => {
                return Err(JssError::Unsupported(format!(
                    "'{name}' is mapped from LDAP and cannot be set"
                )));
            }
            EaInputType::PopUp(choices) => {
                let v = value.trim();
                if !v.is_empty() && !choices.iter().any(|c| c == v) {
                    return Err(JssError::InvalidData(format!(
                        "'{v}' is not one of the choices for '{name}': {}",
                        choices.join(", ")
                    )));
                }
            }
            EaInputType::TextField => {}
        }
        def.data_type().validate(value)?;

        if obj
            .ext_attrs_mut()
            .set(def.id(), def.name(), def.data_type(), value)
        {
            obj.core_mut().touch();
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> ExtensionAttributes {
        ExtensionAttributes::from_json(&json!([
            { "id": 1, "name": "Asset Owner", "type": "String", "value": "IT" },
            { "id": 2, "name": "Battery Cycles", "type": "Number", "value": "312" },
            { "id": 3, "name": "Tags", "type": "String", "value": ["a", "b"] }
        ]))
    }

    #[test]
    fn values_are_read_by_name() {
        let eas = sample();
        assert_eq!(eas.get("asset owner"), Some("IT"));
        assert_eq!(eas.get("Tags"), Some("a, b"));
        assert_eq!(eas.iter().nth(1).unwrap().data_type, EaDataType::Integer);
        assert!(eas.get("missing").is_none());
    }

    #[test]
    fn only_changed_values_are_serialized() {
        let mut eas = sample();
        assert!(eas.to_xml().children().is_empty());

        assert!(eas.set(2, "Battery Cycles", EaDataType::Integer, "400"));
        assert!(!eas.set(1, "Asset Owner", EaDataType::String, "IT"));
        let xml = eas.to_xml();
        assert_eq!(xml.children().len(), 1);
        assert_eq!(xml.find_text("extension_attribute/value"), Some("400"));
        assert_eq!(eas.changed_names(), vec!["Battery Cycles"]);

        eas.clear_changes();
        assert!(!eas.has_changes());
    }

    #[test]
    fn data_types_validate_values() {
        EaDataType::Integer.validate("42").unwrap();
        assert!(EaDataType::Integer.validate("forty").is_err());
        EaDataType::Date.validate("2024-01-31").unwrap();
        EaDataType::Date.validate("2024-01-31 13:45:00").unwrap();
        assert!(EaDataType::Date.validate("31/01/2024").is_err());
        EaDataType::Date.validate("").unwrap();
    }

    #[test]
    fn input_types_round_trip_through_xml() {
        let popup = EaInputType::from_json(&json!({
            "type": "Pop-up Menu", "popup_choices": ["Yes", "No"]
        }));
        assert_eq!(popup, EaInputType::PopUp(vec!["Yes".into(), "No".into()]));
        let xml = popup.to_xml();
        assert_eq!(xml.find_text("type"), Some("Pop-up Menu"));
        assert_eq!(xml.find("popup_choices").unwrap().children().len(), 2);

        let script = EaInputType::from_json(&json!({ "type": "script", "script": "#!/bin/sh" }));
        assert!(matches!(script, EaInputType::Script(_)));
    }
}
