// Printers that policies can map on client Macs.

use serde_json::Value;

use jamf_api::XmlElement;

use crate::error::{JssError, Result};
use crate::json;
use crate::mixins::{Categorizable, CategoryRef, CategoryStyle};
use crate::object::{ApiObject, Creatable, Deletable, ObjectCore, Updatable, Writable};

const URI_SCHEMES: &[&str] = &[
    "lpd://", "ipp://", "ipps://", "http://", "https://", "smb://", "socket://", "dnssd://",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Printer {
    core: ObjectCore,
    uri: Option<String>,
    cups_name: Option<String>,
    location: Option<String>,
    model: Option<String>,
    info: Option<String>,
    notes: Option<String>,
    make_default: bool,
    use_generic: bool,
    ppd: Option<String>,
    ppd_path: Option<String>,
    os_requirements: Option<String>,
    category: CategoryRef,
}

impl Printer {
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Queue name on the client.
    pub fn cups_name(&self) -> Option<&str> {
        self.cups_name.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn info(&self) -> Option<&str> {
        self.info.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn make_default(&self) -> bool {
        self.make_default
    }

    pub fn use_generic(&self) -> bool {
        self.use_generic
    }

    pub fn ppd(&self) -> Option<&str> {
        self.ppd.as_deref()
    }

    pub fn ppd_path(&self) -> Option<&str> {
        self.ppd_path.as_deref()
    }

    pub fn os_requirements(&self) -> Option<&str> {
        self.os_requirements.as_deref()
    }

    pub fn set_uri(&mut self, uri: &str) -> Result<()> {
        let uri = uri.trim();
        if !URI_SCHEMES.iter().any(|s| uri.to_ascii_lowercase().starts_with(s)) {
            return Err(JssError::InvalidData(format!(
                "'{uri}' does not use a printer URI scheme ({})",
                URI_SCHEMES.join(", ")
            )));
        }
        self.uri = Some(uri.to_owned());
        self.core.touch();
        Ok(())
    }

    /// CUPS queue names cannot contain spaces, slashes or '#'.
    pub fn set_cups_name(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() || name.contains([' ', '/', '#']) {
            return Err(JssError::InvalidData(format!("'{name}' is not a valid CUPS queue name")));
        }
        self.cups_name = Some(name.to_owned());
        self.core.touch();
        Ok(())
    }

    pub fn set_location(&mut self, location: Option<&str>) {
        self.location = location.map(str::to_owned);
        self.core.touch();
    }

    pub fn set_model(&mut self, model: Option<&str>) {
        self.model = model.map(str::to_owned);
        self.core.touch();
    }

    pub fn set_info(&mut self, info: Option<&str>) {
        self.info = info.map(str::to_owned);
        self.core.touch();
    }

    pub fn set_notes(&mut self, notes: Option<&str>) {
        self.notes = notes.map(str::to_owned);
        self.core.touch();
    }

    pub fn set_make_default(&mut self, value: bool) {
        self.make_default = value;
        self.core.touch();
    }

    /// Use the generic PPD, or a specific one at `path` on the client.
    pub fn set_driver(&mut self, ppd: Option<(&str, &str)>) {
        match ppd {
            None => {
                self.use_generic = true;
                self.ppd = None;
                self.ppd_path = None;
            }
            Some((name, path)) => {
                self.use_generic = false;
                self.ppd = Some(name.to_owned());
                self.ppd_path = Some(path.to_owned());
            }
        }
        self.core.touch();
    }

    pub fn set_os_requirements(&mut self, reqs: Option<&str>) {
        self.os_requirements = reqs.map(str::to_owned);
        self.core.touch();
    }
}

impl ApiObject for Printer {
    const RSRC_BASE: &'static str = "printers";
    const RSRC_LIST_KEY: &'static str = "printers";
    const RSRC_OBJECT_KEY: &'static str = "printer";

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn from_json(record: &Value) -> Result<Self> {
        Ok(Self {
            core: ObjectCore::from_json(record)?,
            uri: json::opt_str(record, "uri"),
            cups_name: json::opt_str(record, "CUPS_name"),
            location: json::opt_str(record, "location"),
            model: json::opt_str(record, "model"),
            info: json::opt_str(record, "info"),
            notes: json::opt_str(record, "notes"),
            make_default: json::bool(record, "make_default"),
            use_generic: json::bool(record, "use_generic"),
            ppd: json::opt_str(record, "ppd"),
            ppd_path: json::opt_str(record, "ppd_path"),
            os_requirements: json::opt_str(record, "os_requirements"),
            category: CategoryRef::from_json(json::at(record, "category")),
        })
    }
}

impl Writable for Printer {
    fn rest_xml(&self) -> XmlElement {
        XmlElement::new(Self::RSRC_OBJECT_KEY)
            .text_child("name", self.name())
            .child(self.category_xml())
            .opt_child("uri", self.uri.as_deref())
            .opt_child("CUPS_name", self.cups_name.as_deref())
            .opt_child("location", self.location.as_deref())
            .opt_child("model", self.model.as_deref())
            .opt_child("info", self.info.as_deref())
            .opt_child("notes", self.notes.as_deref())
            .bool_child("make_default", self.make_default)
            .bool_child("use_generic", self.use_generic)
            .opt_child("ppd", self.ppd.as_deref())
            .opt_child("ppd_path", self.ppd_path.as_deref())
            .opt_child("os_requirements", self.os_requirements.as_deref())
    }
}

impl Creatable for Printer {
    fn new_unsaved(name: &str) -> Self {
        Self {
            core: ObjectCore::new(name),
            uri: None,
            cups_name: None,
            location: None,
            model: None,
            info: None,
            notes: None,
            make_default: false,
            use_generic: true,
            ppd: None,
            ppd_path: None,
            os_requirements: None,
            category: CategoryRef::default(),
        }
    }

    fn validate_for_create(&self) -> Result<()> {
        if self.uri.is_none() || self.cups_name.is_none() {
            return Err(JssError::MissingData("a printer needs a URI and CUPS name".into()));
        }
        Ok(())
    }
}

impl Updatable for Printer {}
impl Deletable for Printer {}

impl Categorizable for Printer {
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
    fn reads_cups_fields() {
        let p = Printer::from_json(&json!({
            "id": 3, "name": "Office Laser", "category": "Printers",
            "uri": "lpd://10.1.1.50/", "CUPS_name": "Office_Laser",
            "use_generic": true, "ppd": "", "make_default": false
        }))
        .unwrap();
        assert_eq!(p.cups_name(), Some("Office_Laser"));
        assert_eq!(p.category_name(), Some("Printers"));
        assert_eq!(p.rest_xml().find_text("category"), Some("Printers"));
        assert_eq!(p.rest_xml().find_text("CUPS_name"), Some("Office_Laser"));
    }

    #[test]
    fn validation() {
        let mut p = Printer::new_unsaved("Lab");
        assert!(p.set_uri("fax://nowhere").is_err());
        assert!(p.set_cups_name("Lab Printer").is_err());
        assert!(p.validate_for_create().is_err());
        p.set_uri("ipp://print.example.com/printers/lab").unwrap();
        p.set_cups_name("Lab_Printer").unwrap();
        p.validate_for_create().unwrap();

        p.set_driver(Some(("HP LaserJet", "/Library/Printers/PPDs/hp.ppd.gz")));
        assert!(!p.use_generic());
        assert_eq!(p.rest_xml().find_text("use_generic"), Some("false"));
    }
}
