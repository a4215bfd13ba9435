// Mobile devices (iPhone, iPad, Apple TV).
//
// Like computers, device records come from enrollment and cannot be
// created through the API. The display name, asset tag, location,
// purchasing, extension attributes and site are writable.

use chrono::{DateTime, Utc};
use serde_json::Value;

use jamf_api::XmlElement;

use crate::connection::Jss;
use crate::error::Result;
use crate::json;
use crate::lookup::Ident;
use crate::mixins::history::HistoryFlavor;
use crate::mixins::{
    Extendable, ExtensionAttributes, HasManagementHistory, Locatable, Location,
    ManagementHistory, Matchable, Purchasable, Purchasing, Sitable, SiteRef, Uploadable,
};
use crate::object::{ApiObject, Deletable, ObjectCore, Updatable, Writable};
use crate::resources::MobileDeviceExtensionAttribute;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MobileDevice {
    core: ObjectCore,
    device_name: Option<String>,
    udid: Option<String>,
    serial_number: Option<String>,
    wifi_mac_address: Option<String>,
    bluetooth_mac_address: Option<String>,
    ip_address: Option<String>,
    phone_number: Option<String>,
    asset_tag: Option<String>,
    model: Option<String>,
    model_identifier: Option<String>,
    os_type: Option<String>,
    os_version: Option<String>,
    os_build: Option<String>,
    managed: bool,
    supervised: bool,
    capacity_mb: Option<i64>,
    available_mb: Option<i64>,
    battery_level: Option<i64>,
    last_inventory_update: Option<DateTime<Utc>>,
    site: SiteRef,
    location: Location,
    purchasing: Purchasing,
    ext_attrs: ExtensionAttributes,
}

impl MobileDevice {
    /// The name the device itself reports; the record name is the
    /// display name shown in Jamf.
    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }

    pub fn udid(&self) -> Option<&str> {
        self.udid.as_deref()
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.serial_number.as_deref()
    }

    pub fn wifi_mac_address(&self) -> Option<&str> {
        self.wifi_mac_address.as_deref()
    }

    pub fn bluetooth_mac_address(&self) -> Option<&str> {
        self.bluetooth_mac_address.as_deref()
    }

    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    pub fn asset_tag(&self) -> Option<&str> {
        self.asset_tag.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn model_identifier(&self) -> Option<&str> {
        self.model_identifier.as_deref()
    }

    pub fn os_type(&self) -> Option<&str> {
        self.os_type.as_deref()
    }

    pub fn os_version(&self) -> Option<&str> {
        self.os_version.as_deref()
    }

    pub fn os_build(&self) -> Option<&str> {
        self.os_build.as_deref()
    }

    pub fn managed(&self) -> bool {
        self.managed
    }

    pub fn supervised(&self) -> bool {
        self.supervised
    }

    pub fn capacity_mb(&self) -> Option<i64> {
        self.capacity_mb
    }

    pub fn available_mb(&self) -> Option<i64> {
        self.available_mb
    }

    pub fn battery_level(&self) -> Option<i64> {
        self.battery_level
    }

    pub fn last_inventory_update(&self) -> Option<DateTime<Utc>> {
        self.last_inventory_update
    }

    pub fn set_asset_tag(&mut self, tag: Option<&str>) {
        self.asset_tag = tag.map(str::to_owned);
        self.core.touch();
    }
}

impl ApiObject for MobileDevice {
    const RSRC_BASE: &'static str = "mobiledevices";
    const RSRC_LIST_KEY: &'static str = "mobile_devices";
    const RSRC_OBJECT_KEY: &'static str = "mobile_device";
    const OTHER_LOOKUP_KEYS: &'static [&'static str] =
        &["udid", "serial_number", "wifi_mac_address"];

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn from_json(record: &Value) -> Result<Self> {
        let general = json::at(record, "general");
        Ok(Self {
            core: ObjectCore::from_json(general)?,
            device_name: json::opt_str(general, "device_name"),
            udid: json::opt_str(general, "udid"),
            serial_number: json::opt_str(general, "serial_number"),
            wifi_mac_address: json::opt_str(general, "wifi_mac_address"),
            bluetooth_mac_address: json::opt_str(general, "bluetooth_mac_address"),
            ip_address: json::opt_str(general, "ip_address"),
            phone_number: json::opt_str(general, "phone_number"),
            asset_tag: json::opt_str(general, "asset_tag"),
            model: json::opt_str(general, "model"),
            model_identifier: json::opt_str(general, "model_identifier"),
            os_type: json::opt_str(general, "os_type"),
            os_version: json::opt_str(general, "os_version"),
            os_build: json::opt_str(general, "os_build"),
            managed: json::bool(general, "managed"),
            supervised: json::bool(general, "supervised"),
            capacity_mb: json::opt_i64(general, "capacity_mb"),
            available_mb: json::opt_i64(general, "available_mb"),
            battery_level: json::opt_i64(general, "battery_level"),
            last_inventory_update: json::epoch(general, "last_inventory_update_epoch"),
            site: SiteRef::from_json(json::at(general, "site")),
            location: Location::from_json(json::at(record, "location")),
            purchasing: Purchasing::from_json(json::at(record, "purchasing")),
            ext_attrs: ExtensionAttributes::from_json(json::at(record, "extension_attributes")),
        })
    }
}

impl Writable for MobileDevice {
    fn rest_xml(&self) -> XmlElement {
        let general = XmlElement::new("general")
            .text_child("display_name", self.name())
            .opt_child("asset_tag", self.asset_tag.as_deref())
            .child(self.site.to_xml());
        XmlElement::new(Self::RSRC_OBJECT_KEY)
            .child(general)
            .child(self.location.to_xml())
            .child(self.purchasing.to_xml())
            .child(self.ext_attrs.to_xml())
    }

    fn on_saved(&mut self) {
        self.ext_attrs.clear_changes();
    }
}

impl Updatable for MobileDevice {}
impl Deletable for MobileDevice {}
impl Matchable for MobileDevice {}

impl Sitable for MobileDevice {
    fn site(&self) -> &SiteRef {
        &self.site
    }

    fn site_mut(&mut self) -> &mut SiteRef {
        &mut self.site
    }
}

impl Locatable for MobileDevice {
    fn location(&self) -> &Location {
        &self.location
    }

    fn location_mut(&mut self) -> &mut Location {
        &mut self.location
    }
}

impl Purchasable for MobileDevice {
    fn purchasing(&self) -> &Purchasing {
        &self.purchasing
    }

    fn purchasing_mut(&mut self) -> &mut Purchasing {
        &mut self.purchasing
    }
}

impl Extendable for MobileDevice {
    type Definition = MobileDeviceExtensionAttribute;

    fn ext_attrs(&self) -> &ExtensionAttributes {
        &self.ext_attrs
    }

    fn ext_attrs_mut(&mut self) -> &mut ExtensionAttributes {
        &mut self.ext_attrs
    }
}

impl Uploadable for MobileDevice {
    const UPLOAD_TYPES: &'static [(&'static str, &'static str)] =
        &[("attachment", "mobiledevices")];
}

impl HasManagementHistory for MobileDevice {
    const HISTORY_FLAVOR: HistoryFlavor = HistoryFlavor::MobileDevice;
    const HISTORY_RSRC: &'static str = "mobiledevicehistory";
    const HISTORY_KEY: &'static str = "mobile_device_history";
}

impl Jss {
    pub async fn mobile_device_history(
        &self,
        device: impl Into<Ident>,
    ) -> Result<ManagementHistory> {
        self.management_history::<MobileDevice>(device).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_device_and_writes_display_name() {
        let d = MobileDevice::from_json(&json!({
            "general": {
                "id": 40, "name": "Cart iPad 3", "device_name": "iPad",
                "serial_number": "DMPX1", "wifi_mac_address": "F0:18:98:00:00:01",
                "managed": true, "supervised": "true", "battery_level": 87,
                "os_version": "17.4", "site": { "id": 2, "name": "Schools" }
            },
            "location": { "real_name": "Cart 3", "phone_number": "555-0100" },
            "extension_attributes": []
        }))
        .unwrap();
        assert_eq!(d.device_name(), Some("iPad"));
        assert!(d.supervised());
        assert_eq!(d.battery_level(), Some(87));
        assert_eq!(d.site_name(), Some("Schools"));
        assert_eq!(d.location().phone.as_deref(), Some("555-0100"));

        let xml = d.rest_xml();
        assert_eq!(xml.find_text("general/display_name"), Some("Cart iPad 3"));
        assert_eq!(xml.find_text("general/site/id"), Some("2"));
        assert_eq!(d.rest_rsrc(), "mobiledevices/id/40");
    }
}
