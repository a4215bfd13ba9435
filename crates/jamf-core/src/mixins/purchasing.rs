// Purchasing and warranty data for computers and mobile devices.

use chrono::NaiveDate;
use serde_json::Value;

use jamf_api::XmlElement;

use crate::error::{JssError, Result};
use crate::json;
use crate::object::ApiObject;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Purchasing {
    pub is_purchased: bool,
    pub is_leased: bool,
    pub po_number: Option<String>,
    pub vendor: Option<String>,
    pub applecare_id: Option<String>,
    pub purchase_price: Option<String>,
    pub purchasing_account: Option<String>,
    pub purchasing_contact: Option<String>,
    pub po_date: Option<NaiveDate>,
    pub warranty_expires: Option<NaiveDate>,
    pub lease_expires: Option<NaiveDate>,
    pub life_expectancy: Option<u32>,
}

impl Purchasing {
    pub fn from_json(v: &Value) -> Self {
        Self {
            is_purchased: json::bool(v, "is_purchased"),
            is_leased: json::bool(v, "is_leased"),
            po_number: json::opt_str(v, "po_number"),
            vendor: json::opt_str(v, "vendor"),
            applecare_id: json::opt_str(v, "applecare_id"),
            purchase_price: json::opt_str(v, "purchase_price"),
            purchasing_account: json::opt_str(v, "purchasing_account"),
            purchasing_contact: json::opt_str(v, "purchasing_contact"),
            po_date: read_date(v, "po_date"),
            warranty_expires: read_date(v, "warranty_expires"),
            lease_expires: read_date(v, "lease_expires"),
            life_expectancy: json::opt_i64(v, "life_expectancy")
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| *n > 0),
        }
    }

    pub fn to_xml(&self) -> XmlElement {
        XmlElement::new("purchasing")
            .bool_child("is_purchased", self.is_purchased)
            .bool_child("is_leased", self.is_leased)
            .opt_child("po_number", self.po_number.as_deref())
            .opt_child("vendor", self.vendor.as_deref())
            .opt_child("applecare_id", self.applecare_id.as_deref())
            .opt_child("purchase_price", self.purchase_price.as_deref())
            .opt_child("purchasing_account", self.purchasing_account.as_deref())
            .opt_child("purchasing_contact", self.purchasing_contact.as_deref())
            .opt_child("po_date", self.po_date)
            .opt_child("warranty_expires", self.warranty_expires)
            .opt_child("lease_expires", self.lease_expires)
            .opt_child("life_expectancy", self.life_expectancy)
    }
}

/// Dates arrive as `YYYY-MM-DD`, sometimes followed by a time.
fn read_date(v: &Value, key: &str) -> Option<NaiveDate> {
    let s = json::opt_str(v, key)?;
    NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok()
}

/// Parse a user-supplied `YYYY-MM-DD` date; empty clears.
pub fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| JssError::InvalidData(format!("'{s}' is not a YYYY-MM-DD date"))),
    }
}

fn clean(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

/// Objects with purchasing data.
pub trait Purchasable: ApiObject {
    fn purchasing(&self) -> &Purchasing;
    fn purchasing_mut(&mut self) -> &mut Purchasing;

    fn set_purchased(&mut self, purchased: bool) {
        self.purchasing_mut().is_purchased = purchased;
        self.core_mut().touch();
    }

    fn set_leased(&mut self, leased: bool) {
        self.purchasing_mut().is_leased = leased;
        self.core_mut().touch();
    }

    fn set_po_number(&mut self, value: Option<&str>) {
        self.purchasing_mut().po_number = clean(value);
        self.core_mut().touch();
    }

    fn set_vendor(&mut self, value: Option<&str>) {
        self.purchasing_mut().vendor = clean(value);
        self.core_mut().touch();
    }

    fn set_applecare_id(&mut self, value: Option<&str>) {
        self.purchasing_mut().applecare_id = clean(value);
        self.core_mut().touch();
    }

    fn set_purchase_price(&mut self, value: Option<&str>) {
        self.purchasing_mut().purchase_price = clean(value);
        self.core_mut().touch();
    }

    fn set_purchasing_account(&mut self, value: Option<&str>) {
        self.purchasing_mut().purchasing_account = clean(value);
        self.core_mut().touch();
    }

    fn set_purchasing_contact(&mut self, value: Option<&str>) {
        self.purchasing_mut().purchasing_contact = clean(value);
        self.core_mut().touch();
    }

    fn set_life_expectancy(&mut self, years: Option<u32>) {
        self.purchasing_mut().life_expectancy = years;
        self.core_mut().touch();
    }

    fn set_po_date(&mut self, date: Option<&str>) -> Result<()> {
        self.purchasing_mut().po_date = parse_date(date)?;
        self.core_mut().touch();
        Ok(())
    }

    fn set_warranty_expires(&mut self, date: Option<&str>) -> Result<()> {
        self.purchasing_mut().warranty_expires = parse_date(date)?;
        self.core_mut().touch();
        Ok(())
    }

    fn set_lease_expires(&mut self, date: Option<&str>) -> Result<()> {
        self.purchasing_mut().lease_expires = parse_date(date)?;
        self.core_mut().touch();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_dates_with_or_without_time() {
        let p = Purchasing::from_json(&json!({
            "is_purchased": true,
            "po_number": "PO-1",
            "po_date": "2023-02-01",
            "warranty_expires": "2026-02-01 00:00:00",
            "lease_expires": "",
            "life_expectancy": 0
        }));
        assert!(p.is_purchased);
        assert_eq!(p.po_date, NaiveDate::from_ymd_opt(2023, 2, 1));
        assert_eq!(p.warranty_expires, NaiveDate::from_ymd_opt(2026, 2, 1));
        assert_eq!(p.lease_expires, None);
        assert_eq!(p.life_expectancy, None);
    }

    #[test]
    fn user_dates_must_be_iso() {
        assert!(parse_date(Some("02/01/2023")).is_err());
        assert_eq!(parse_date(Some("")).unwrap(), None);
        assert_eq!(
            parse_date(Some("2024-12-31")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31)
        );
    }

    #[test]
    fn xml_writes_empty_elements_for_unset_fields() {
        let p = Purchasing {
            vendor: Some("Apple".into()),
            po_date: NaiveDate::from_ymd_opt(2023, 2, 1),
            ..Purchasing::default()
        };
        let xml = p.to_xml();
        assert_eq!(xml.find_text("vendor"), Some("Apple"));
        assert_eq!(xml.find_text("po_date"), Some("2023-02-01"));
        assert!(xml.find("po_number").unwrap().text().is_none());
    }
}
