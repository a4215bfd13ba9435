// Sites, used to partition objects between groups of administrators.

use serde_json::Value;

use jamf_api::XmlElement;

use crate::error::Result;
use crate::object::{ApiObject, Creatable, Deletable, ObjectCore, Updatable, Writable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    core: ObjectCore,
}

impl ApiObject for Site {
    const RSRC_BASE: &'static str = "sites";
    const RSRC_LIST_KEY: &'static str = "sites";
    const RSRC_OBJECT_KEY: &'static str = "site";

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

impl Writable for Site {
    fn rest_xml(&self) -> XmlElement {
        XmlElement::new(Self::RSRC_OBJECT_KEY).text_child("name", self.name())
    }
}

impl Creatable for Site {
    fn new_unsaved(name: &str) -> Self {
        Self {
            core: ObjectCore::new(name),
        }
    }
}

impl Updatable for Site {}
impl Deletable for Site {}
