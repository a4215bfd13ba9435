// File share distribution points. Read-only.

use std::net::Ipv4Addr;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::json;
use crate::lookup::Ident;
use crate::object::{ApiObject, ObjectCore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionPoint {
    core: ObjectCore,
    ip_address: String,
    is_master: bool,
    failover_point: Option<String>,
    connection_type: Option<String>,
    share_name: Option<String>,
    share_port: Option<i64>,
    workgroup_or_domain: Option<String>,
    read_only_username: Option<String>,
    read_write_username: Option<String>,
    http_downloads_enabled: bool,
    http_url: Option<String>,
}

impl DistributionPoint {
    /// Host name or address of the file server.
    pub fn ip_address(&self) -> &str {
        &self.ip_address
    }

    pub fn is_master(&self) -> bool {
        self.is_master
    }

    pub fn failover_point(&self) -> Option<&str> {
        self.failover_point.as_deref()
    }

    /// `SMB` or `AFP`.
    pub fn connection_type(&self) -> Option<&str> {
        self.connection_type.as_deref()
    }

    pub fn share_name(&self) -> Option<&str> {
        self.share_name.as_deref()
    }

    pub fn share_port(&self) -> Option<i64> {
        self.share_port
    }

    pub fn workgroup_or_domain(&self) -> Option<&str> {
        self.workgroup_or_domain.as_deref()
    }

    pub fn read_only_username(&self) -> Option<&str> {
        self.read_only_username.as_deref()
    }

    pub fn read_write_username(&self) -> Option<&str> {
        self.read_write_username.as_deref()
    }

    pub fn http_downloads_enabled(&self) -> bool {
        self.http_downloads_enabled
    }

    pub fn http_url(&self) -> Option<&str> {
        self.http_url.as_deref()
    }

    /// `smb://host/share` style URL of the file share.
    pub fn share_url(&self) -> Option<String> {
        let share = self.share_name.as_deref()?;
        let scheme = self
            .connection_type
            .as_deref()
            .unwrap_or("smb")
            .to_ascii_lowercase();
        Some(format!("{scheme}://{}/{share}", self.ip_address))
    }
}

impl ApiObject for DistributionPoint {
    const RSRC_BASE: &'static str = "distributionpoints";
    const RSRC_LIST_KEY: &'static str = "distribution_points";
    const RSRC_OBJECT_KEY: &'static str = "distribution_point";

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn from_json(record: &Value) -> Result<Self> {
        Ok(Self {
            core: ObjectCore::from_json(record)?,
            ip_address: json::opt_str(record, "ip_address")
                .or_else(|| json::opt_str(record, "ip"))
                .unwrap_or_default(),
            is_master: json::bool(record, "is_master"),
            failover_point: json::opt_str(record, "failover_point")
                .filter(|f| !f.eq_ignore_ascii_case("none")),
            connection_type: json::opt_str(record, "connection_type"),
            share_name: json::opt_str(record, "share_name"),
            share_port: json::opt_i64(record, "share_port"),
            workgroup_or_domain: json::opt_str(record, "workgroup_or_domain"),
            read_only_username: json::opt_str(record, "read_only_username"),
            read_write_username: json::opt_str(record, "read_write_username"),
            http_downloads_enabled: json::bool(record, "http_downloads_enabled"),
            http_url: json::opt_str(record, "http_url"),
        })
    }
}

impl Jss {
    /// The master distribution point, memoized until `refresh`.
    pub async fn master_distribution_point(&self, refresh: bool) -> Result<Arc<DistributionPoint>> {
        if !refresh {
            if let Some(dp) = self.cached_master_dp() {
                return Ok(dp);
            }
        }
        for id in self.all_ids::<DistributionPoint>(refresh).await? {
            let dp: DistributionPoint = self.fetch_by_id(id).await?;
            if dp.is_master() {
                debug!(id, name = dp.name(), "master distribution point found");
                let dp = Arc::new(dp);
                self.store_master_dp(Arc::clone(&dp));
                return Ok(dp);
            }
        }
        Err(JssError::NoSuchItem("no master distribution point is defined".into()))
    }

    /// The distribution point a machine at `ip` should use: the one
    /// named by the smallest network segment containing it, else the
    /// master.
    pub async fn distribution_point_for_ip(&self, ip: Ipv4Addr) -> Result<Arc<DistributionPoint>> {
        let segments = self.network_segments_for_ip(ip, false).await?;
        let named = segments
            .iter()
            .filter_map(|s| s.distribution_point().map(|dp| (s.size(), dp)))
            .min_by_key(|(size, _)| *size);
        if let Some((_, name)) = named {
            if let Some(id) = self
                .valid_id::<DistributionPoint>(Ident::Name(name.to_owned()))
                .await?
            {
                return Ok(Arc::new(self.fetch_by_id(id).await?));
            }
        }
        self.master_distribution_point(false).await
    }
}
