// Categories group policies, packages, scripts and profiles.

use serde_json::Value;

use jamf_api::XmlElement;

use crate::error::{JssError, Result};
use crate::json;
use crate::object::{ApiObject, Creatable, Deletable, ObjectCore, Updatable, Writable};

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 20;
pub const DEFAULT_PRIORITY: u8 = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    core: ObjectCore,
    priority: u8,
}

impl Category {
    /// Sort order in Self Service, 1 (first) to 20.
    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: u8) -> Result<()> {
        check_priority(priority)?;
        if priority != self.priority {
            self.priority = priority;
            self.core.touch();
        }
        Ok(())
    }
}

/// Priorities shared by categories and packages.
pub(crate) fn check_priority(priority: u8) -> Result<()> {
    if (MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
        Ok(())
    } else {
        Err(JssError::InvalidData(format!(
            "priority must be between {MIN_PRIORITY} and {MAX_PRIORITY}, not {priority}"
        )))
    }
}

impl ApiObject for Category {
    const RSRC_BASE: &'static str = "categories";
    const RSRC_LIST_KEY: &'static str = "categories";
    const RSRC_OBJECT_KEY: &'static str = "category";

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn from_json(record: &Value) -> Result<Self> {
        Ok(Self {
            core: ObjectCore::from_json(record)?,
            priority: json::opt_i64(record, "priority")
                .and_then(|p| u8::try_from(p).ok())
                .unwrap_or(DEFAULT_PRIORITY),
        })
    }
}

impl Writable for Category {
    fn rest_xml(&self) -> XmlElement {
        XmlElement::new(Self::RSRC_OBJECT_KEY)
            .text_child("name", self.name())
            .text_child("priority", self.priority)
    }
}

impl Creatable for Category {
    fn new_unsaved(name: &str) -> Self {
        Self {
            core: ObjectCore::new(name),
            priority: DEFAULT_PRIORITY,
        }
    }
}

impl Updatable for Category {}
impl Deletable for Category {}
