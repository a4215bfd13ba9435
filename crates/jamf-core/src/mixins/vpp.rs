// Volume Purchase Program license assignment for App Store apps.

use serde_json::Value;

use jamf_api::XmlElement;

use crate::json;
use crate::object::ApiObject;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vpp {
    pub assign_vpp_device_based_licenses: bool,
    pub vpp_admin_account_id: Option<i64>,
    pub total_vpp_licenses: i64,
    pub remaining_vpp_licenses: i64,
    pub used_vpp_licenses: i64,
}

impl Vpp {
    pub fn from_json(v: &Value) -> Self {
        Self {
            assign_vpp_device_based_licenses: json::bool(v, "assign_vpp_device_based_licenses"),
            vpp_admin_account_id: json::opt_i64(v, "vpp_admin_account_id").filter(|id| *id > 0),
            total_vpp_licenses: json::i64_or(v, "total_vpp_licenses", 0),
            remaining_vpp_licenses: json::i64_or(v, "remaining_vpp_licenses", 0),
            used_vpp_licenses: json::i64_or(v, "used_vpp_licenses", 0),
        }
    }

    /// License counts are read-only; only the assignment is written.
    pub fn to_xml(&self) -> XmlElement {
        XmlElement::new("vpp")
            .bool_child(
                "assign_vpp_device_based_licenses",
                self.assign_vpp_device_based_licenses,
            )
            .text_child("vpp_admin_account_id", self.vpp_admin_account_id.unwrap_or(-1))
    }
}

/// Objects licensed through VPP.
pub trait Vppable: ApiObject {
    fn vpp(&self) -> &Vpp;
    fn vpp_mut(&mut self) -> &mut Vpp;

    fn set_assign_vpp_device_based_licenses(&mut self, assign: bool) {
        self.vpp_mut().assign_vpp_device_based_licenses = assign;
        self.core_mut().touch();
    }

    fn set_vpp_admin_account_id(&mut self, id: Option<i64>) {
        self.vpp_mut().vpp_admin_account_id = id.filter(|id| *id > 0);
        self.core_mut().touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_are_read_but_not_written() {
        let vpp = Vpp::from_json(&json!({
            "assign_vpp_device_based_licenses": true,
            "vpp_admin_account_id": -1,
            "total_vpp_licenses": 50,
            "used_vpp_licenses": 12
        }));
        assert_eq!(vpp.vpp_admin_account_id, None);
        assert_eq!(vpp.used_vpp_licenses, 12);
        let xml = vpp.to_xml();
        assert_eq!(xml.find_text("vpp_admin_account_id"), Some("-1"));
        assert!(xml.find("total_vpp_licenses").is_none());
    }
}
