// ── Computers ──
//
// Computer records are created by enrollment, never through the API, so
// `Computer` is updatable and deletable but not creatable. Only the
// fields an admin can edit (name, asset data, location, purchasing,
// extension attributes, site) are written back; hardware and
// management status are read-only inventory.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

use jamf_api::XmlElement;

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::json;
use crate::lookup::Ident;
use crate::mixins::history::HistoryFlavor;
use crate::mixins::{
    Extendable, ExtensionAttributes, HasManagementHistory, Locatable, Location,
    ManagementHistory, Matchable, Purchasable, Purchasing, Sitable, SiteRef, Uploadable,
};
use crate::object::{ApiObject, Deletable, ObjectCore, Updatable, Writable};
use crate::resources::ComputerExtensionAttribute;

/// Read-only hardware inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputerHardware {
    pub make: Option<String>,
    pub model: Option<String>,
    pub model_identifier: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub os_build: Option<String>,
    pub processor_type: Option<String>,
    pub processor_architecture: Option<String>,
    pub total_ram_mb: Option<i64>,
}

impl ComputerHardware {
    fn from_json(v: &Value) -> Self {
        Self {
            make: json::opt_str(v, "make"),
            model: json::opt_str(v, "model"),
            model_identifier: json::opt_str(v, "model_identifier"),
            os_name: json::opt_str(v, "os_name"),
            os_version: json::opt_str(v, "os_version"),
            os_build: json::opt_str(v, "os_build"),
            processor_type: json::opt_str(v, "processor_type"),
            processor_architecture: json::opt_str(v, "processor_architecture"),
            total_ram_mb: json::opt_i64(v, "total_ram"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Computer {
    core: ObjectCore,
    udid: Option<String>,
    serial_number: Option<String>,
    mac_address: Option<String>,
    alt_mac_address: Option<String>,
    ip_address: Option<String>,
    last_reported_ip: Option<String>,
    asset_tag: Option<String>,
    barcode_1: Option<String>,
    barcode_2: Option<String>,
    jamf_version: Option<String>,
    managed: bool,
    management_username: Option<String>,
    mdm_capable: bool,
    unmanage_requested: bool,
    report_date: Option<DateTime<Utc>>,
    last_contact: Option<DateTime<Utc>>,
    hardware: ComputerHardware,
    site: SiteRef,
    location: Location,
    purchasing: Purchasing,
    ext_attrs: ExtensionAttributes,
}

impl Computer {
    pub fn udid(&self) -> Option<&str> {
        self.udid.as_deref()
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.serial_number.as_deref()
    }

    pub fn mac_address(&self) -> Option<&str> {
        self.mac_address.as_deref()
    }

    pub fn alt_mac_address(&self) -> Option<&str> {
        self.alt_mac_address.as_deref()
    }

    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    pub fn last_reported_ip(&self) -> Option<&str> {
        self.last_reported_ip.as_deref()
    }

    pub fn asset_tag(&self) -> Option<&str> {
        self.asset_tag.as_deref()
    }

    pub fn barcodes(&self) -> (Option<&str>, Option<&str>) {
        (self.barcode_1.as_deref(), self.barcode_2.as_deref())
    }

    pub fn jamf_version(&self) -> Option<&str> {
        self.jamf_version.as_deref()
    }

    pub fn managed(&self) -> bool {
        self.managed
    }

    pub fn management_username(&self) -> Option<&str> {
        self.management_username.as_deref()
    }

    pub fn mdm_capable(&self) -> bool {
        self.mdm_capable
    }

    pub fn report_date(&self) -> Option<DateTime<Utc>> {
        self.report_date
    }

    pub fn last_contact(&self) -> Option<DateTime<Utc>> {
        self.last_contact
    }

    pub fn hardware(&self) -> &ComputerHardware {
        &self.hardware
    }

    pub fn set_asset_tag(&mut self, tag: Option<&str>) {
        self.asset_tag = tag.map(str::to_owned);
        self.core.touch();
    }

    pub fn set_barcode_1(&mut self, barcode: Option<&str>) {
        self.barcode_1 = barcode.map(str::to_owned);
        self.core.touch();
    }

    pub fn set_barcode_2(&mut self, barcode: Option<&str>) {
        self.barcode_2 = barcode.map(str::to_owned);
        self.core.touch();
    }

    /// Mark the computer unmanaged; takes effect on the next update.
    ///
    /// Profiles and the management account are left on the machine; send
    /// `ComputerCommand::UnmanageDevice` to remove MDM as well.
    pub fn make_unmanaged(&mut self) -> Result<()> {
        if !self.managed {
            return Err(JssError::Unmanaged(format!(
                "computer '{}' is already unmanaged",
                self.name()
            )));
        }
        self.managed = false;
        self.unmanage_requested = true;
        self.core.touch();
        Ok(())
    }
}

impl ApiObject for Computer {
    const RSRC_BASE: &'static str = "computers";
    const RSRC_LIST_KEY: &'static str = "computers";
    const RSRC_OBJECT_KEY: &'static str = "computer";
    const RSRC_LIST_PATH: &'static str = "computers/subset/basic";
    const OTHER_LOOKUP_KEYS: &'static [&'static str] = &["udid", "serial_number", "mac_address"];

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn from_json(record: &Value) -> Result<Self> {
        let general = json::at(record, "general");
        let remote = json::at(general, "remote_management");
        Ok(Self {
            core: ObjectCore::from_json(general)?,
            udid: json::opt_str(general, "udid"),
            serial_number: json::opt_str(general, "serial_number"),
            mac_address: json::opt_str(general, "mac_address"),
            alt_mac_address: json::opt_str(general, "alt_mac_address"),
            ip_address: json::opt_str(general, "ip_address"),
            last_reported_ip: json::opt_str(general, "last_reported_ip"),
            asset_tag: json::opt_str(general, "asset_tag"),
            barcode_1: json::opt_str(general, "barcode_1"),
            barcode_2: json::opt_str(general, "barcode_2"),
            jamf_version: json::opt_str(general, "jamf_version"),
            managed: json::bool(remote, "managed"),
            management_username: json::opt_str(remote, "management_username"),
            mdm_capable: json::bool(general, "mdm_capable"),
            unmanage_requested: false,
            report_date: json::epoch(general, "report_date_epoch"),
            last_contact: json::epoch(general, "last_contact_time_epoch"),
            hardware: ComputerHardware::from_json(json::at(record, "hardware")),
            site: SiteRef::from_json(json::at(general, "site")),
            location: Location::from_json(json::at(record, "location")),
            purchasing: Purchasing::from_json(json::at(record, "purchasing")),
            ext_attrs: ExtensionAttributes::from_json(json::at(record, "extension_attributes")),
        })
    }
}

impl Writable for Computer {
    fn rest_xml(&self) -> XmlElement {
        let mut general = XmlElement::new("general")
            .text_child("name", self.name())
            .opt_child("asset_tag", self.asset_tag.as_deref())
            .opt_child("barcode_1", self.barcode_1.as_deref())
            .opt_child("barcode_2", self.barcode_2.as_deref())
            .child(self.site.to_xml());
        if self.unmanage_requested {
            general.push(XmlElement::new("remote_management").bool_child("managed", false));
        }
        XmlElement::new(Self::RSRC_OBJECT_KEY)
            .child(general)
            .child(self.location.to_xml())
            .child(self.purchasing.to_xml())
            .child(self.ext_attrs.to_xml())
    }

    fn on_saved(&mut self) {
        self.ext_attrs.clear_changes();
        self.unmanage_requested = false;
    }
}

impl Updatable for Computer {}
impl Deletable for Computer {}
impl Matchable for Computer {}

impl Sitable for Computer {
    fn site(&self) -> &SiteRef {
        &self.site
    }

    fn site_mut(&mut self) -> &mut SiteRef {
        &mut self.site
    }
}

impl Locatable for Computer {
    fn location(&self) -> &Location {
        &self.location
    }

    fn location_mut(&mut self) -> &mut Location {
        &mut self.location
    }
}

impl Purchasable for Computer {
    fn purchasing(&self) -> &Purchasing {
        &self.purchasing
    }

    fn purchasing_mut(&mut self) -> &mut Purchasing {
        &mut self.purchasing
    }
}

impl Extendable for Computer {
    type Definition = ComputerExtensionAttribute;

    fn ext_attrs(&self) -> &ExtensionAttributes {
        &self.ext_attrs
    }

    fn ext_attrs_mut(&mut self) -> &mut ExtensionAttributes {
        &mut self.ext_attrs
    }
}

impl Uploadable for Computer {
    const UPLOAD_TYPES: &'static [(&'static str, &'static str)] = &[("attachment", "computers")];
}

impl HasManagementHistory for Computer {
    const HISTORY_FLAVOR: HistoryFlavor = HistoryFlavor::Computer;
    const HISTORY_RSRC: &'static str = "computerhistory";
    const HISTORY_KEY: &'static str = "computer_history";
}

impl Jss {
    pub async fn computer_history(&self, computer: impl Into<Ident>) -> Result<ManagementHistory> {
        self.management_history::<Computer>(computer).await
    }

    /// Everything the server currently applies to a computer: policies,
    /// profiles, group memberships, pending installs.
    pub async fn computer_management_data(&self, computer: impl Into<Ident>) -> Result<Value> {
        let id = self.require_id::<Computer>(computer).await?;
        let rsrc = format!("computermanagement/id/{id}");
        let mut value = self.api().get_json(&rsrc).await?;
        match value.get_mut("computer_management") {
            Some(data) => Ok(data.take()),
            None => Err(JssError::MissingData(format!(
                "response for {rsrc} has no 'computer_management'"
            ))),
        }
    }

    /// Unmanage a computer in one step.
    pub async fn unmanage_computer(&self, computer: impl Into<Ident>) -> Result<()> {
        let mut obj: Computer = self.fetch(computer).await?;
        obj.make_unmanaged()?;
        self.update(&mut obj).await?;
        info!(computer = obj.id(), "computer unmanaged");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_record() -> Value {
        json!({
            "general": {
                "id": 7, "name": "Mac-07", "udid": "55900BDC", "serial_number": "C02X1",
                "mac_address": "A4:83:E7:00:11:22", "asset_tag": "IT-0007",
                "remote_management": { "managed": true, "management_username": "jamfadmin" },
                "report_date_epoch": 1_700_000_000_000_i64,
                "site": { "id": -1, "name": "None" }
            },
            "hardware": { "model": "MacBook Pro", "os_version": "14.4", "total_ram": 16384 },
            "location": { "username": "jdoe", "realname": "Jane Doe", "building": "HQ" },
            "purchasing": { "is_purchased": true, "po_date": "2023-05-01" },
            "extension_attributes": [
                { "id": 1, "name": "Asset Owner", "type": "String", "value": "IT" }
            ]
        })
    }

    #[test]
    fn parses_inventory() {
        let c = Computer::from_json(&sample_record()).unwrap();
        assert_eq!(c.id(), 7);
        assert_eq!(c.serial_number(), Some("C02X1"));
        assert!(c.managed());
        assert_eq!(c.hardware().total_ram_mb, Some(16384));
        assert_eq!(c.location().real_name.as_deref(), Some("Jane Doe"));
        assert!(c.purchasing().is_purchased);
        assert_eq!(c.ext_attr("asset owner"), Some("IT"));
        assert!(c.report_date().is_some());
    }

    #[test]
    fn xml_contains_only_editable_fields() {
        let c = Computer::from_json(&sample_record()).unwrap();
        let xml = c.rest_xml();
        assert_eq!(xml.find_text("general/asset_tag"), Some("IT-0007"));
        assert!(xml.find("general/remote_management").is_none());
        assert!(xml.find("hardware").is_none());
        assert!(xml.find("extension_attributes").unwrap().children().is_empty());
    }

    #[test]
    fn make_unmanaged_is_sent_once() {
        let mut c = Computer::from_json(&sample_record()).unwrap();
        c.make_unmanaged().unwrap();
        assert!(c.need_to_update());
        assert_eq!(
            c.rest_xml().find_text("general/remote_management/managed"),
            Some("false")
        );
        c.on_saved();
        assert!(c.rest_xml().find("general/remote_management").is_none());
        assert!(matches!(c.make_unmanaged(), Err(JssError::Unmanaged(_))));
    }
}
