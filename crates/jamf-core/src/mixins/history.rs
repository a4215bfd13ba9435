// ── Management history ──
//
// The read-only history the server keeps per computer and mobile
// device: MDM commands by status, policy runs, audit events, user and
// location changes, and app installs. Timestamps are taken from the
// `*_epoch` fields (milliseconds, UTC).

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::json;
use crate::lookup::Ident;
use crate::object::ApiObject;

/// Status bucket of a command or install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Completed,
    Pending,
    Failed,
}

impl HistoryStatus {
    const ALL: [HistoryStatus; 3] = [Self::Completed, Self::Pending, Self::Failed];

    fn key(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MdmCommandRecord {
    pub name: String,
    pub status: HistoryStatus,
    pub issued: Option<DateTime<Utc>>,
    pub last_push: Option<DateTime<Utc>>,
    pub completed: Option<DateTime<Utc>>,
    pub failed: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyLogEntry {
    pub policy_id: i64,
    pub policy_name: String,
    pub username: Option<String>,
    pub date_completed: Option<DateTime<Utc>>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEvent {
    pub event: String,
    pub username: String,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserLocationChange {
    pub date: Option<DateTime<Utc>>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub email_address: Option<String>,
    pub phone_number: Option<String>,
    pub department: Option<String>,
    pub building: Option<String>,
    pub room: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppInstallRecord {
    pub name: String,
    pub version: Option<String>,
    pub status: HistoryStatus,
}

/// Everything the server reports for one device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManagementHistory {
    pub commands: Vec<MdmCommandRecord>,
    pub policy_logs: Vec<PolicyLogEntry>,
    pub audits: Vec<AuditEvent>,
    pub user_location: Vec<UserLocationChange>,
    pub app_installs: Vec<AppInstallRecord>,
}

/// Which history document a resource has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryFlavor {
    Computer,
    MobileDevice,
}

impl HistoryFlavor {
    fn commands_key(self) -> &'static str {
        match self {
            Self::Computer => "commands",
            Self::MobileDevice => "management_commands",
        }
    }

    fn apps_key(self) -> &'static str {
        match self {
            Self::Computer => "mac_app_store_applications",
            Self::MobileDevice => "applications",
        }
    }
}

impl ManagementHistory {
    /// Parse the unwrapped history record.
    pub fn from_json(flavor: HistoryFlavor, v: &Value) -> Self {
        let commands_v = json::at(v, flavor.commands_key());
        let commands = HistoryStatus::ALL
            .into_iter()
            .flat_map(|status| {
                json::array(commands_v, status.key())
                    .iter()
                    .map(move |c| MdmCommandRecord {
                        name: json::string(c, "name"),
                        status,
                        issued: json::epoch(c, "issued_epoch"),
                        last_push: json::epoch(c, "last_push_epoch"),
                        completed: json::epoch(c, "completed_epoch"),
                        failed: json::epoch(c, "failed_epoch"),
                        error: json::opt_str(c, "error"),
                    })
            })
            .collect();

        let apps_v = json::at(v, flavor.apps_key());
        let app_installs = HistoryStatus::ALL
            .into_iter()
            .flat_map(|status| {
                json::array(apps_v, status.key())
                    .iter()
                    .map(move |a| AppInstallRecord {
                        name: json::string(a, "name"),
                        version: json::opt_str(a, "version"),
                        status,
                    })
            })
            .collect();

        Self {
            commands,
            policy_logs: json::array(v, "policy_logs")
                .iter()
                .map(|p| PolicyLogEntry {
                    policy_id: json::i64_or(p, "policy_id", 0),
                    policy_name: json::string(p, "policy_name"),
                    username: json::opt_str(p, "username"),
                    date_completed: json::epoch(p, "date_completed_epoch"),
                    status: json::string(p, "status"),
                })
                .collect(),
            audits: json::array(v, "audits")
                .iter()
                .map(|a| AuditEvent {
                    event: json::string(a, "event"),
                    username: json::string(a, "username"),
                    date: json::epoch(a, "date_time_epoch"),
                })
                .collect(),
            user_location: json::array(v, "user_location")
                .iter()
                .map(|u| UserLocationChange {
                    date: json::epoch(u, "date_time_epoch"),
                    username: json::opt_str(u, "username"),
                    full_name: json::opt_str(u, "full_name"),
                    email_address: json::opt_str(u, "email_address"),
                    phone_number: json::opt_str(u, "phone_number"),
                    department: json::opt_str(u, "department"),
                    building: json::opt_str(u, "building"),
                    room: json::opt_str(u, "room"),
                    position: json::opt_str(u, "position"),
                })
                .collect(),
            app_installs,
        }
    }

    pub fn commands_with_status(
        &self,
        status: HistoryStatus,
    ) -> impl Iterator<Item = &MdmCommandRecord> {
        self.commands.iter().filter(move |c| c.status == status)
    }

    pub fn completed_commands(&self) -> impl Iterator<Item = &MdmCommandRecord> {
        self.commands_with_status(HistoryStatus::Completed)
    }

    pub fn pending_commands(&self) -> impl Iterator<Item = &MdmCommandRecord> {
        self.commands_with_status(HistoryStatus::Pending)
    }

    pub fn failed_commands(&self) -> impl Iterator<Item = &MdmCommandRecord> {
        self.commands_with_status(HistoryStatus::Failed)
    }

    /// The most recently completed command.
    pub fn last_completed_command(&self) -> Option<&MdmCommandRecord> {
        self.completed_commands().max_by_key(|c| c.completed)
    }
}

/// Resources with a management history document.
pub trait HasManagementHistory: ApiObject {
    const HISTORY_FLAVOR: HistoryFlavor;
    /// e.g. `computerhistory`
    const HISTORY_RSRC: &'static str;
    /// e.g. `computer_history`
    const HISTORY_KEY: &'static str;
}

impl Jss {
    /// Fetch the management history of a computer or mobile device.
    pub async fn management_history<T: HasManagementHistory>(
        &self,
        ident: impl Into<Ident>,
    ) -> Result<ManagementHistory> {
        let id = self.require_id::<T>(ident).await?;
        let rsrc = format!("{}/id/{id}", T::HISTORY_RSRC);
        let value = self.api().get_json(&rsrc).await?;
        let record = value.get(T::HISTORY_KEY).ok_or_else(|| {
            JssError::MissingData(format!("response for {rsrc} has no '{}'", T::HISTORY_KEY))
        })?;
        Ok(ManagementHistory::from_json(T::HISTORY_FLAVOR, record))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_computer_history() {
        let v = json!({
            "commands": {
                "completed": [
                    { "name": "BlankPush", "completed_epoch": 1_700_000_000_000_i64 },
                    { "name": "DeviceLock", "completed_epoch": 1_700_000_100_000_i64 }
                ],
                "pending": [{ "name": "EraseDevice", "issued_epoch": 1_700_000_200_000_i64 }],
                "failed": []
            },
            "policy_logs": [
                { "policy_id": 3, "policy_name": "Install Office", "username": "jdoe",
                  "date_completed_epoch": 1_700_000_000_000_i64, "status": "Completed" }
            ],
            "audits": [{ "event": "Computer Enrolled", "username": "admin", "date_time_epoch": 0 }],
            "mac_app_store_applications": { "installed": [], "pending": [{ "name": "Xcode", "version": "15" }], "failed": [] }
        });
        let h = ManagementHistory::from_json(HistoryFlavor::Computer, &v);
        assert_eq!(h.completed_commands().count(), 2);
        assert_eq!(h.pending_commands().next().unwrap().name, "EraseDevice");
        assert_eq!(h.failed_commands().count(), 0);
        assert_eq!(h.last_completed_command().unwrap().name, "DeviceLock");
        assert_eq!(h.policy_logs[0].policy_name, "Install Office");
        assert_eq!(h.audits[0].date, None);
        assert_eq!(h.app_installs[0].status, HistoryStatus::Pending);
    }

    #[test]
    fn mobile_history_uses_its_own_keys() {
        let v = json!({
            "management_commands": { "failed": [{ "name": "DeviceName", "error": "Not supervised" }] },
            "applications": { "installed": [{ "name": "Notes", "version": "1.0" }] }
        });
        let h = ManagementHistory::from_json(HistoryFlavor::MobileDevice, &v);
        assert_eq!(h.failed_commands().next().unwrap().error.as_deref(), Some("Not supervised"));
        assert_eq!(h.app_installs.len(), 1);
        assert!(h.policy_logs.is_empty());
    }

    #[test]
    fn status_parses_from_cli_text() {
        assert_eq!("Pending".parse::<HistoryStatus>().unwrap(), HistoryStatus::Pending);
        assert_eq!(HistoryStatus::Failed.to_string(), "failed");
    }
}
