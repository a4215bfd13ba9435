// ── Network segments ──
//
// An inclusive IPv4 address range. Segments drive location overrides
// (building, department) and which distribution point and software
// update server a machine uses. The summary list carries each range,
// so "which segments contain this address" needs no per-record fetches
// until the matches are known.

use std::net::Ipv4Addr;

use serde_json::Value;

use jamf_api::XmlElement;

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::json;
use crate::lookup::{Ident, ListEntry};
use crate::object::{ApiObject, Creatable, Deletable, ObjectCore, Updatable, Writable};
use crate::resources::{Building, Department, DistributionPoint};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSegment {
    core: ObjectCore,
    starting_address: Ipv4Addr,
    ending_address: Ipv4Addr,
    distribution_point: Option<String>,
    url: Option<String>,
    swu_server: Option<String>,
    building: Option<String>,
    department: Option<String>,
    override_buildings: bool,
    override_departments: bool,
}

fn parse_ip(s: &str) -> Result<Ipv4Addr> {
    s.trim()
        .parse()
        .map_err(|_| JssError::InvalidData(format!("'{s}' is not an IPv4 address")))
}

fn range_of(entry: &ListEntry) -> Option<(Ipv4Addr, Ipv4Addr)> {
    let start = entry.get_str("starting_address")?.parse().ok()?;
    let end = entry.get_str("ending_address")?.parse().ok()?;
    Some((start, end))
}

/// Parse `a.b.c.d/nn` into its first and last address.
pub fn cidr_range(cidr: &str) -> Result<(Ipv4Addr, Ipv4Addr)> {
    let (addr, bits) = cidr
        .trim()
        .split_once('/')
        .ok_or_else(|| JssError::InvalidData(format!("'{cidr}' is not in a.b.c.d/nn form")))?;
    let addr = u32::from(parse_ip(addr)?);
    let bits: u32 = bits
        .parse()
        .ok()
        .filter(|b| *b <= 32)
        .ok_or_else(|| JssError::InvalidData(format!("'{cidr}' has an invalid prefix length")))?;
    let mask = u32::MAX.checked_shl(32 - bits).unwrap_or(0);
    let start = addr & mask;
    let end = start | !mask;
    Ok((Ipv4Addr::from(start), Ipv4Addr::from(end)))
}

fn none_if_sentinel(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.eq_ignore_ascii_case("none") && !s.eq_ignore_ascii_case("default"))
}

impl NetworkSegment {
    pub fn starting_address(&self) -> Ipv4Addr {
        self.starting_address
    }

    pub fn ending_address(&self) -> Ipv4Addr {
        self.ending_address
    }

    /// Number of addresses in the range.
    pub fn size(&self) -> u64 {
        let start = u64::from(u32::from(self.starting_address));
        let end = u64::from(u32::from(self.ending_address));
        end.saturating_sub(start) + 1
    }

    pub fn includes(&self, ip: Ipv4Addr) -> bool {
        (self.starting_address..=self.ending_address).contains(&ip)
    }

    /// Whether two ranges share at least one address.
    pub fn overlaps(&self, start: Ipv4Addr, end: Ipv4Addr) -> bool {
        self.starting_address <= end && start <= self.ending_address
    }

    pub fn distribution_point(&self) -> Option<&str> {
        self.distribution_point.as_deref()
    }

    /// Override URL for HTTP package downloads.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn swu_server(&self) -> Option<&str> {
        self.swu_server.as_deref()
    }

    pub fn building(&self) -> Option<&str> {
        self.building.as_deref()
    }

    pub fn department(&self) -> Option<&str> {
        self.department.as_deref()
    }

    pub fn override_buildings(&self) -> bool {
        self.override_buildings
    }

    pub fn override_departments(&self) -> bool {
        self.override_departments
    }

    pub fn set_range(&mut self, start: Ipv4Addr, end: Ipv4Addr) -> Result<()> {
        if start > end {
            return Err(JssError::InvalidData(format!(
                "starting address {start} is after ending address {end}"
            )));
        }
        self.starting_address = start;
        self.ending_address = end;
        self.core.touch();
        Ok(())
    }

    /// Set the range from CIDR notation, e.g. `10.1.0.0/22`.
    pub fn set_cidr(&mut self, cidr: &str) -> Result<()> {
        let (start, end) = cidr_range(cidr)?;
        self.set_range(start, end)
    }

    pub fn set_url(&mut self, url: Option<&str>) {
        self.url = url.map(str::to_owned);
        self.core.touch();
    }

    pub fn set_swu_server(&mut self, server: Option<&str>) {
        self.swu_server = server.map(str::to_owned);
        self.core.touch();
    }

    pub fn set_override_buildings(&mut self, value: bool) {
        self.override_buildings = value;
        self.core.touch();
    }

    pub fn set_override_departments(&mut self, value: bool) {
        self.override_departments = value;
        self.core.touch();
    }
}

impl ApiObject for NetworkSegment {
    const RSRC_BASE: &'static str = "networksegments";
    const RSRC_LIST_KEY: &'static str = "network_segments";
    const RSRC_OBJECT_KEY: &'static str = "network_segment";

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn from_json(record: &Value) -> Result<Self> {
        let starting_address = parse_ip(&json::string(record, "starting_address"))?;
        let ending_address = parse_ip(&json::string(record, "ending_address"))?;
        if starting_address > ending_address {
            return Err(JssError::InvalidData(format!(
                "network segment range {starting_address} - {ending_address} is reversed"
            )));
        }
        Ok(Self {
            core: ObjectCore::from_json(record)?,
            starting_address,
            ending_address,
            distribution_point: none_if_sentinel(json::opt_str(record, "distribution_point")),
            url: json::opt_str(record, "url"),
            swu_server: none_if_sentinel(json::opt_str(record, "swu_server")),
            building: json::opt_str(record, "building"),
            department: json::opt_str(record, "department"),
            override_buildings: json::bool(record, "override_buildings"),
            override_departments: json::bool(record, "override_departments"),
        })
    }
}

impl Writable for NetworkSegment {
    fn rest_xml(&self) -> XmlElement {
        XmlElement::new(Self::RSRC_OBJECT_KEY)
            .text_child("name", self.name())
            .text_child("starting_address", self.starting_address)
            .text_child("ending_address", self.ending_address)
            .opt_child("distribution_point", self.distribution_point.as_deref())
            .opt_child("url", self.url.as_deref())
            .opt_child("swu_server", self.swu_server.as_deref())
            .opt_child("building", self.building.as_deref())
            .opt_child("department", self.department.as_deref())
            .bool_child("override_buildings", self.override_buildings)
            .bool_child("override_departments", self.override_departments)
    }
}

impl Creatable for NetworkSegment {
    fn new_unsaved(name: &str) -> Self {
        Self {
            core: ObjectCore::new(name),
            starting_address: Ipv4Addr::UNSPECIFIED,
            ending_address: Ipv4Addr::UNSPECIFIED,
            distribution_point: None,
            url: None,
            swu_server: None,
            building: None,
            department: None,
            override_buildings: false,
            override_departments: false,
        }
    }

    fn validate_for_create(&self) -> Result<()> {
        if self.starting_address.is_unspecified() || self.ending_address.is_unspecified() {
            return Err(JssError::MissingData(
                "a network segment needs a starting and ending address".into(),
            ));
        }
        Ok(())
    }
}

impl Updatable for NetworkSegment {}
impl Deletable for NetworkSegment {}

impl Jss {
    /// Every segment whose range includes `ip`, fetched in full.
    pub async fn network_segments_for_ip(
        &self,
        ip: Ipv4Addr,
        refresh: bool,
    ) -> Result<Vec<NetworkSegment>> {
        let ids: Vec<i64> = self
            .all::<NetworkSegment>(refresh)
            .await?
            .iter()
            .filter(|e| range_of(e).is_some_and(|(start, end)| (start..=end).contains(&ip)))
            .filter_map(ListEntry::id)
            .collect();
        let mut segments = Vec::with_capacity(ids.len());
        for id in ids {
            segments.push(self.fetch_by_id(id).await?);
        }
        Ok(segments)
    }

    /// Summary entries of other segments sharing addresses with `segment`.
    pub async fn overlapping_segments(&self, segment: &NetworkSegment) -> Result<Vec<ListEntry>> {
        Ok(self
            .all::<NetworkSegment>(true)
            .await?
            .iter()
            .filter(|e| e.id() != Some(segment.id()) || !segment.in_jss())
            .filter(|e| {
                range_of(e).is_some_and(|(start, end)| segment.overlaps(start, end))
            })
            .cloned()
            .collect())
    }

    pub async fn set_segment_building(
        &self,
        segment: &mut NetworkSegment,
        building: Option<&str>,
    ) -> Result<()> {
        segment.building = match building {
            None => None,
            Some(name) => Some(self.canonical_name::<Building>(name).await?),
        };
        segment.core.touch();
        Ok(())
    }

    pub async fn set_segment_department(
        &self,
        segment: &mut NetworkSegment,
        department: Option<&str>,
    ) -> Result<()> {
        segment.department = match department {
            None => None,
            Some(name) => Some(self.canonical_name::<Department>(name).await?),
        };
        segment.core.touch();
        Ok(())
    }

    pub async fn set_segment_distribution_point(
        &self,
        segment: &mut NetworkSegment,
        dp: Option<&str>,
    ) -> Result<()> {
        segment.distribution_point = match dp {
            None => None,
            Some(name) => Some(self.canonical_name::<DistributionPoint>(name).await?),
        };
        segment.core.touch();
        Ok(())
    }

    async fn canonical_name<T: ApiObject>(&self, name: &str) -> Result<String> {
        let entry = self
            .lookup_entry::<T>(Ident::Name(name.trim().to_owned()))
            .await?
            .ok_or_else(|| {
                JssError::NoSuchItem(format!("no {} named '{name}'", T::RSRC_OBJECT_KEY))
            })?;
        Ok(entry.name().unwrap_or(name).to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn segment() -> NetworkSegment {
        NetworkSegment::from_json(&json!({
            "id": 3, "name": "HQ Wired",
            "starting_address": "10.1.0.0", "ending_address": "10.1.3.255",
            "distribution_point": "None", "building": "HQ"
        }))
        .unwrap()
    }

    #[test]
    fn membership_and_size() {
        let s = segment();
        assert!(s.includes("10.1.2.17".parse().unwrap()));
        assert!(!s.includes("10.1.4.0".parse().unwrap()));
        assert_eq!(s.size(), 1024);
        assert_eq!(s.distribution_point(), None);
    }

    #[test]
    fn cidr_sets_range() {
        let mut s = segment();
        s.set_cidr("192.168.10.77/24").unwrap();
        assert_eq!(s.starting_address(), Ipv4Addr::new(192, 168, 10, 0));
        assert_eq!(s.ending_address(), Ipv4Addr::new(192, 168, 10, 255));
        assert!(s.need_to_update());

        assert_eq!(
            cidr_range("10.0.0.5/32").unwrap(),
            (Ipv4Addr::new(10, 0, 0, 5), Ipv4Addr::new(10, 0, 0, 5))
        );
        assert_eq!(
            cidr_range("0.0.0.0/0").unwrap().1,
            Ipv4Addr::new(255, 255, 255, 255)
        );
        assert!(cidr_range("10.0.0.0/33").is_err());
        assert!(cidr_range("10.0.0.0").is_err());
    }

    #[test]
    fn reversed_range_is_invalid() {
        let mut s = segment();
        let err = s
            .set_range(Ipv4Addr::new(10, 0, 0, 9), Ipv4Addr::new(10, 0, 0, 1))
            .unwrap_err();
        assert!(matches!(err, JssError::InvalidData(_)));
    }

    #[test]
    fn reversed_record_is_rejected() {
        let err = NetworkSegment::from_json(&json!({
            "id": 4, "name": "Backwards",
            "starting_address": "10.0.0.9", "ending_address": "10.0.0.1"
        }))
        .unwrap_err();
        assert!(matches!(err, JssError::InvalidData(_)), "got {err:?}");
    }

    #[test]
    fn size_of_whole_address_space() {
        let mut s = segment();
        s.set_cidr("0.0.0.0/0").unwrap();
        assert_eq!(s.size(), 1 << 32);
        s.set_cidr("10.0.0.5/32").unwrap();
        assert_eq!(s.size(), 1);
    }

    #[test]
    fn overlap_is_inclusive() {
        let s = segment();
        assert!(s.overlaps(Ipv4Addr::new(10, 1, 3, 255), Ipv4Addr::new(10, 1, 9, 0)));
        assert!(!s.overlaps(Ipv4Addr::new(10, 1, 4, 0), Ipv4Addr::new(10, 1, 9, 0)));
    }

    #[test]
    fn new_segment_needs_addresses() {
        let s = NetworkSegment::new_unsaved("Lab");
        assert!(matches!(s.validate_for_create(), Err(JssError::MissingData(_))));
    }
}
