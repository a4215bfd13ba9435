// Buildings.

use serde_json::Value;

use jamf_api::XmlElement;

use crate::error::Result;
use crate::object::{ApiObject, Creatable, Deletable, ObjectCore, Updatable, Writable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Building {
    core: ObjectCore,
}

impl ApiObject for Building {
    const RSRC_BASE: &'static str = "buildings";
    const RSRC_LIST_KEY: &'static str = "buildings";
    const RSRC_OBJECT_KEY: &'static str = "building";

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn from_json(record: &Value) -> Result<Self> {
        Ok(Self {
            core: ObjectCore::from_json(record)?,
        })
    }
}

impl Writable for Building {
    fn rest_xml(&self) -> XmlElement {
        XmlElement::new(Self::RSRC_OBJECT_KEY).text_child("name", self.name())
    }
}

impl Creatable for Building {
    fn new_unsaved(name: &str) -> Self {
        Self {
            core: ObjectCore::new(name),
        }
    }
}

impl Updatable for Building {}
impl Deletable for Building {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::object::ObjectState;
    use serde_json::json;

    #[test]
    fn loaded_building_is_clean() {
        let b = Building::from_json(&json!({ "id": 4, "name": "Annex" })).unwrap();
        assert_eq!(b.state(), ObjectState::Clean);
        assert_eq!(b.rest_rsrc(), "buildings/id/4");
        assert_eq!(b.rest_xml().to_xml_string(), "<building><name>Annex</name></building>");
    }

    #[test]
    fn duplicate_is_unsaved() {
        let b = Building::from_json(&json!({ "id": 4, "name": "Annex" })).unwrap();
        let copy = b.duplicate("Annex 2");
        assert_eq!(copy.state(), ObjectState::New);
        assert_eq!(copy.id(), 0);
        assert_eq!(copy.name(), "Annex 2");
    }
}
