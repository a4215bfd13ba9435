// Scripts run by policies.

use std::fmt;

use serde_json::Value;

use jamf_api::XmlElement;

use crate::error::{JssError, Result};
use crate::json;
use crate::mixins::{Categorizable, CategoryRef, CategoryStyle};
use crate::object::{ApiObject, Creatable, Deletable, ObjectCore, Updatable, Writable};

/// Parameters 1-3 are reserved (mount point, computer name, username).
pub const FIRST_PARAMETER: usize = 4;
pub const LAST_PARAMETER: usize = 11;
const PARAMETER_COUNT: usize = LAST_PARAMETER - FIRST_PARAMETER + 1;

/// When a policy runs the script relative to its other actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptPriority {
    Before,
    #[default]
    After,
    AtReboot,
}

impl ScriptPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "Before",
            Self::After => "After",
            Self::AtReboot => "At Reboot",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "before" => Some(Self::Before),
            "after" => Some(Self::After),
            "at reboot" | "at_reboot" | "reboot" => Some(Self::AtReboot),
            _ => None,
        }
    }
}

impl fmt::Display for ScriptPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    core: ObjectCore,
    category: CategoryRef,
    filename: String,
    info: Option<String>,
    notes: Option<String>,
    priority: ScriptPriority,
    parameters: [Option<String>; PARAMETER_COUNT],
    os_requirements: Vec<String>,
    contents: Option<String>,
}

fn parameter_index(number: usize) -> Result<usize> {
    if (FIRST_PARAMETER..=LAST_PARAMETER).contains(&number) {
        Ok(number - FIRST_PARAMETER)
    } else {
        Err(JssError::InvalidData(format!(
            "script parameters are numbered {FIRST_PARAMETER} to {LAST_PARAMETER}, not {number}"
        )))
    }
}

impl Script {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn info(&self) -> Option<&str> {
        self.info.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn priority(&self) -> ScriptPriority {
        self.priority
    }

    pub fn os_requirements(&self) -> &[String] {
        &self.os_requirements
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    /// The label of parameter 4 through 11.
    pub fn parameter(&self, number: usize) -> Result<Option<&str>> {
        Ok(self.parameters[parameter_index(number)?].as_deref())
    }

    pub fn set_filename(&mut self, filename: &str) -> Result<()> {
        let filename = filename.trim();
        if filename.is_empty() || filename.contains('/') {
            return Err(JssError::InvalidData(format!("'{filename}' is not a valid file name")));
        }
        self.filename = filename.to_owned();
        self.core.touch();
        Ok(())
    }

    pub fn set_info(&mut self, info: Option<&str>) {
        self.info = info.map(str::to_owned);
        self.core.touch();
    }

    pub fn set_notes(&mut self, notes: Option<&str>) {
        self.notes = notes.map(str::to_owned);
        self.core.touch();
    }

    pub fn set_priority(&mut self, priority: ScriptPriority) {
        self.priority = priority;
        self.core.touch();
    }

    /// Label parameter 4 through 11; `None` clears it.
    pub fn set_parameter(&mut self, number: usize, label: Option<&str>) -> Result<()> {
        let idx = parameter_index(number)?;
        self.parameters[idx] = label.map(str::trim).filter(|l| !l.is_empty()).map(str::to_owned);
        self.core.touch();
        Ok(())
    }

    /// Required macOS versions, e.g. `["10.15.x", "11.x"]`.
    pub fn set_os_requirements(&mut self, reqs: &[&str]) {
        self.os_requirements = reqs.iter().map(|r| r.trim().to_owned()).collect();
        self.core.touch();
    }

    pub fn set_contents(&mut self, contents: &str) {
        self.contents = Some(contents.to_owned());
        self.core.touch();
    }
}

impl ApiObject for Script {
    const RSRC_BASE: &'static str = "scripts";
    const RSRC_LIST_KEY: &'static str = "scripts";
    const RSRC_OBJECT_KEY: &'static str = "script";

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn from_json(record: &Value) -> Result<Self> {
        let params = json::at(record, "parameters");
        let parameters = std::array::from_fn(|i| {
            json::opt_str(params, &format!("parameter{}", i + FIRST_PARAMETER))
        });
        Ok(Self {
            core: ObjectCore::from_json(record)?,
            category: CategoryRef::from_json(json::at(record, "category")),
            filename: json::string(record, "filename"),
            info: json::opt_str(record, "info"),
            notes: json::opt_str(record, "notes"),
            priority: ScriptPriority::parse(&json::string(record, "priority")).unwrap_or_default(),
            parameters,
            os_requirements: split_list(&json::string(record, "os_requirements")),
            contents: json::opt_str(record, "script_contents"),
        })
    }
}

impl Writable for Script {
    fn rest_xml(&self) -> XmlElement {
        let params = XmlElement::new("parameters").extend(self.parameters.iter().enumerate().map(
            |(i, label)| {
                let tag = format!("parameter{}", i + FIRST_PARAMETER);
                match label {
                    Some(l) => XmlElement::with_text(tag, l),
                    None => XmlElement::new(tag),
                }
            },
        ));
        XmlElement::new(Self::RSRC_OBJECT_KEY)
            .text_child("name", self.name())
            .child(self.category_xml())
            .text_child("filename", &self.filename)
            .opt_child("info", self.info.as_deref())
            .opt_child("notes", self.notes.as_deref())
            .text_child("priority", self.priority)
            .child(params)
            .text_child("os_requirements", self.os_requirements.join(", "))
            .opt_child("script_contents", self.contents.as_deref())
    }
}

/// Comma-separated server lists, e.g. `"10.15.x, 11.x"`.
pub(crate) fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .collect()
}

impl Creatable for Script {
    fn new_unsaved(name: &str) -> Self {
        Self {
            core: ObjectCore::new(name),
            category: CategoryRef::default(),
            filename: name.to_owned(),
            info: None,
            notes: None,
            priority: ScriptPriority::default(),
            parameters: Default::default(),
            os_requirements: Vec::new(),
            contents: None,
        }
    }
}

impl Updatable for Script {}
impl Deletable for Script {}

impl Categorizable for Script {
    const CATEGORY_STYLE: CategoryStyle = CategoryStyle::Name;

    fn category(&self) -> &CategoryRef {
        &self.category
    }

    fn category_mut(&mut self) -> &mut CategoryRef {
        &mut self.category
    }
}
