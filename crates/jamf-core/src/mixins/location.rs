// User and location data for computers and mobile devices.

use serde_json::Value;

use jamf_api::XmlElement;

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::json;
use crate::lookup::Ident;
use crate::object::ApiObject;
use crate::resources::{Building, Department};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub username: Option<String>,
    pub real_name: Option<String>,
    pub email_address: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub building: Option<String>,
    pub room: Option<String>,
}

impl Location {
    pub fn from_json(v: &Value) -> Self {
        Self {
            username: json::opt_str(v, "username"),
            real_name: json::opt_str(v, "realname").or_else(|| json::opt_str(v, "real_name")),
            email_address: json::opt_str(v, "email_address"),
            position: json::opt_str(v, "position"),
            phone: json::opt_str(v, "phone").or_else(|| json::opt_str(v, "phone_number")),
            department: json::opt_str(v, "department"),
            building: json::opt_str(v, "building"),
            room: json::opt_str(v, "room"),
        }
    }

    pub fn to_xml(&self) -> XmlElement {
        XmlElement::new("location")
            .opt_child("username", self.username.as_deref())
            .opt_child("realname", self.real_name.as_deref())
            .opt_child("real_name", self.real_name.as_deref())
            .opt_child("email_address", self.email_address.as_deref())
            .opt_child("position", self.position.as_deref())
            .opt_child("phone", self.phone.as_deref())
            .opt_child("phone_number", self.phone.as_deref())
            .opt_child("department", self.department.as_deref())
            .opt_child("building", self.building.as_deref())
            .opt_child("room", self.room.as_deref())
    }
}

fn clean(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

/// Objects with an assigned user and location.
pub trait Locatable: ApiObject {
    fn location(&self) -> &Location;
    fn location_mut(&mut self) -> &mut Location;

    fn set_username(&mut self, value: Option<&str>) {
        self.location_mut().username = clean(value);
        self.core_mut().touch();
    }

    fn set_real_name(&mut self, value: Option<&str>) {
        self.location_mut().real_name = clean(value);
        self.core_mut().touch();
    }

    fn set_email_address(&mut self, value: Option<&str>) {
        self.location_mut().email_address = clean(value);
        self.core_mut().touch();
    }

    fn set_position(&mut self, value: Option<&str>) {
        self.location_mut().position = clean(value);
        self.core_mut().touch();
    }

    fn set_phone(&mut self, value: Option<&str>) {
        self.location_mut().phone = clean(value);
        self.core_mut().touch();
    }

    fn set_room(&mut self, value: Option<&str>) {
        self.location_mut().room = clean(value);
        self.core_mut().touch();
    }

    /// Drop every location field.
    fn clear_location(&mut self) {
        *self.location_mut() = Location::default();
        self.core_mut().touch();
    }
}

impl Jss {
    /// Set the building by name; it must exist. `None` clears it.
    pub async fn set_location_building<T: Locatable>(
        &self,
        obj: &mut T,
        building: Option<&str>,
    ) -> Result<()> {
        let name = match clean(building) {
            None => None,
            Some(name) => Some(
                self.lookup_entry::<Building>(Ident::Name(name.clone()))
                    .await?
                    .and_then(|e| e.name().map(str::to_owned))
                    .ok_or_else(|| JssError::NoSuchItem(format!("no building named '{name}'")))?,
            ),
        };
        obj.location_mut().building = name;
        obj.core_mut().touch();
        Ok(())
    }

    /// Set the department by name; it must exist. `None` clears it.
    pub async fn set_location_department<T: Locatable>(
        &self,
        obj: &mut T,
        department: Option<&str>,
    ) -> Result<()> {
        let name = match clean(department) {
            None => None,
            Some(name) => Some(
                self.lookup_entry::<Department>(Ident::Name(name.clone()))
                    .await?
                    .and_then(|e| e.name().map(str::to_owned))
                    .ok_or_else(|| {
                        JssError::NoSuchItem(format!("no department named '{name}'"))
                    })?,
            ),
        };
        obj.location_mut().department = name;
        obj.core_mut().touch();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_computer_and_device_key_variants() {
        let computer = Location::from_json(&json!({ "realname": "Jane Doe", "phone": "555" }));
        let device = Location::from_json(&json!({ "real_name": "Jane Doe", "phone_number": "555" }));
        assert_eq!(computer, device);
        assert_eq!(computer.real_name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn empty_fields_render_as_empty_elements() {
        let loc = Location {
            username: Some("jdoe".into()),
            ..Location::default()
        };
        let xml = loc.to_xml();
        assert_eq!(xml.find_text("username"), Some("jdoe"));
        assert!(xml.find("building").unwrap().text().is_none());
    }
}
