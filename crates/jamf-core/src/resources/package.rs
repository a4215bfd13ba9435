// Packages installed by policies and patch titles.

use serde_json::Value;

use jamf_api::XmlElement;

use crate::error::{JssError, Result};
use crate::json;
use crate::mixins::{Categorizable, CategoryRef, CategoryStyle};
use crate::object::{ApiObject, Creatable, Deletable, ObjectCore, Updatable, Writable};
use crate::resources::category::{DEFAULT_PRIORITY, check_priority};
use crate::resources::script::split_list;

/// CPU architecture a package is limited to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequiredProcessor {
    #[default]
    None,
    X86,
    Ppc,
}

impl RequiredProcessor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::X86 => "x86",
            Self::Ppc => "ppc",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "x86" | "intel" => Ok(Self::X86),
            "ppc" | "powerpc" => Ok(Self::Ppc),
            other => Err(JssError::InvalidData(format!("unknown processor '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Package {
    core: ObjectCore,
    category: CategoryRef,
    filename: String,
    info: Option<String>,
    notes: Option<String>,
    priority: u8,
    reboot_required: bool,
    fill_user_template: bool,
    fill_existing_users: bool,
    boot_volume_required: bool,
    allow_uninstalled: bool,
    os_requirements: Vec<String>,
    required_processor: RequiredProcessor,
    install_if_reported_available: bool,
    send_notification: bool,
}

impl Package {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn info(&self) -> Option<&str> {
        self.info.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn reboot_required(&self) -> bool {
        self.reboot_required
    }

    pub fn fill_user_template(&self) -> bool {
        self.fill_user_template
    }

    pub fn fill_existing_users(&self) -> bool {
        self.fill_existing_users
    }

    pub fn boot_volume_required(&self) -> bool {
        self.boot_volume_required
    }

    pub fn allow_uninstalled(&self) -> bool {
        self.allow_uninstalled
    }

    pub fn os_requirements(&self) -> &[String] {
        &self.os_requirements
    }

    pub fn required_processor(&self) -> RequiredProcessor {
        self.required_processor
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

    /// Install order when several packages run together, 1 to 20.
    pub fn set_priority(&mut self, priority: u8) -> Result<()> {
        check_priority(priority)?;
        self.priority = priority;
        self.core.touch();
        Ok(())
    }

    pub fn set_reboot_required(&mut self, value: bool) {
        self.reboot_required = value;
        self.core.touch();
    }

    /// Fill the user template (FUT) with the package's user-level files.
    pub fn set_fill_user_template(&mut self, value: bool) {
        self.fill_user_template = value;
        self.core.touch();
    }

    /// Fill existing user homes (FEU).
    pub fn set_fill_existing_users(&mut self, value: bool) {
        self.fill_existing_users = value;
        self.core.touch();
    }

    pub fn set_boot_volume_required(&mut self, value: bool) {
        self.boot_volume_required = value;
        self.core.touch();
    }

    /// Allow uninstalling via policies; only indexed packages support it.
    pub fn set_allow_uninstalled(&mut self, value: bool) {
        self.allow_uninstalled = value;
        self.core.touch();
    }

    pub fn set_os_requirements(&mut self, reqs: &[&str]) {
        self.os_requirements = reqs.iter().map(|r| r.trim().to_owned()).collect();
        self.core.touch();
    }

    pub fn set_required_processor(&mut self, processor: RequiredProcessor) {
        self.required_processor = processor;
        self.core.touch();
    }
}

impl ApiObject for Package {
    const RSRC_BASE: &'static str = "packages";
    const RSRC_LIST_KEY: &'static str = "packages";
    const RSRC_OBJECT_KEY: &'static str = "package";

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn from_json(record: &Value) -> Result<Self> {
        Ok(Self {
            core: ObjectCore::from_json(record)?,
            category: CategoryRef::from_json(json::at(record, "category")),
            filename: json::string(record, "filename"),
            info: json::opt_str(record, "info"),
            notes: json::opt_str(record, "notes"),
            priority: json::opt_i64(record, "priority")
                .and_then(|p| u8::try_from(p).ok())
                .unwrap_or(DEFAULT_PRIORITY),
            reboot_required: json::bool(record, "reboot_required"),
            fill_user_template: json::bool(record, "fill_user_template"),
            fill_existing_users: json::bool(record, "fill_existing_users"),
            boot_volume_required: json::bool(record, "boot_volume_required"),
            allow_uninstalled: json::bool(record, "allow_uninstalled"),
            os_requirements: split_list(&json::string(record, "os_requirements")),
            required_processor: RequiredProcessor::parse(&json::string(
                record,
                "required_processor",
            ))
            .unwrap_or_default(),
            install_if_reported_available: json::bool(record, "install_if_reported_available"),
            send_notification: json::bool(record, "send_notification"),
        })
    }
}

impl Writable for Package {
    fn rest_xml(&self) -> XmlElement {
        XmlElement::new(Self::RSRC_OBJECT_KEY)
            .text_child("name", self.name())
            .child(self.category_xml())
            .text_child("filename", &self.filename)
            .opt_child("info", self.info.as_deref())
            .opt_child("notes", self.notes.as_deref())
            .text_child("priority", self.priority)
            .bool_child("reboot_required", self.reboot_required)
            .bool_child("fill_user_template", self.fill_user_template)
            .bool_child("fill_existing_users", self.fill_existing_users)
            .bool_child("boot_volume_required", self.boot_volume_required)
            .bool_child("allow_uninstalled", self.allow_uninstalled)
            .text_child("os_requirements", self.os_requirements.join(", "))
            .text_child("required_processor", self.required_processor.as_str())
            .bool_child("install_if_reported_available", self.install_if_reported_available)
            .bool_child("send_notification", self.send_notification)
    }
}

impl Creatable for Package {
    fn new_unsaved(name: &str) -> Self {
        Self {
            core: ObjectCore::new(name),
            category: CategoryRef::default(),
            filename: name.to_owned(),
            info: None,
            notes: None,
            priority: DEFAULT_PRIORITY,
            reboot_required: false,
            fill_user_template: false,
            fill_existing_users: false,
            boot_volume_required: true,
            allow_uninstalled: false,
            os_requirements: Vec::new(),
            required_processor: RequiredProcessor::None,
            install_if_reported_available: false,
            send_notification: false,
        }
    }

    fn validate_for_create(&self) -> Result<()> {
        if self.filename.is_empty() {
            return Err(JssError::MissingData("a package needs a file name".into()));
        }
        Ok(())
    }
}

impl Updatable for Package {}
impl Deletable for Package {}

impl Categorizable for Package {
    const CATEGORY_STYLE: CategoryStyle = CategoryStyle::Name;

    fn category(&self) -> &CategoryRef {
        &self.category
    }

    fn category_mut(&mut self) -> &mut CategoryRef {
        &mut self.category
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_flags_and_processor() {
        let pkg = Package::from_json(&json!({
            "id": 30, "name": "Office.pkg", "category": "Unknown", "filename": "Office.pkg",
            "priority": 10, "reboot_required": true, "fill_user_template": "false",
            "required_processor": "x86", "os_requirements": ""
        }))
        .unwrap();
        assert!(pkg.reboot_required());
        assert!(!pkg.fill_user_template());
        assert_eq!(pkg.required_processor(), RequiredProcessor::X86);
        assert_eq!(pkg.category_name(), None);
        assert!(pkg.os_requirements().is_empty());
    }

    #[test]
    fn new_package_defaults() {
        let pkg = Package::new_unsaved("Tool.pkg");
        assert_eq!(pkg.filename(), "Tool.pkg");
        assert_eq!(pkg.priority(), DEFAULT_PRIORITY);
        assert!(pkg.boot_volume_required());
        pkg.validate_for_create().unwrap();
        assert_eq!(pkg.rest_xml().find_text("required_processor"), Some("None"));
    }

    #[test]
    fn bad_processor_is_invalid() {
        assert!(RequiredProcessor::parse("arm64e").is_err());
    }
}
