// ── MDM commands ──
//
// Sending MDM commands to computers and mobile devices. Computer
// commands are encoded entirely in the resource path; mobile device
// commands are an XML document. Targets are resolved through the
// summary lists and must be managed.

use std::fmt;

use serde::Serialize;
use tracing::info;

use jamf_api::{XmlElement, collect_text, encode_segment};

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::lookup::Ident;
use crate::object::ApiObject;
use crate::resources::policy::flush_interval;
use crate::resources::{Computer, MobileDevice};

// ── Computer commands ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComputerCommand {
    BlankPush,
    /// Lock the screen behind a six-digit passcode.
    DeviceLock { passcode: String },
    /// Wipe the computer; the passcode unlocks the firmware afterwards.
    EraseDevice { passcode: String },
    UnmanageDevice,
    EnableRemoteDesktop,
    DisableRemoteDesktop,
    SettingsEnableBluetooth,
    SettingsDisableBluetooth,
}

impl ComputerCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BlankPush => "BlankPush",
            Self::DeviceLock { .. } => "DeviceLock",
            Self::EraseDevice { .. } => "EraseDevice",
            Self::UnmanageDevice => "UnmanageDevice",
            Self::EnableRemoteDesktop => "EnableRemoteDesktop",
            Self::DisableRemoteDesktop => "DisableRemoteDesktop",
            Self::SettingsEnableBluetooth => "SettingsEnableBluetooth",
            Self::SettingsDisableBluetooth => "SettingsDisableBluetooth",
        }
    }

    /// Destructive commands the CLI asks about before sending.
    pub fn is_destructive(&self) -> bool {
        matches!(self, Self::EraseDevice { .. } | Self::UnmanageDevice)
    }

    /// `computercommands/command/NAME[/passcode/NNNNNN]/id/1,2,3`
    pub fn rsrc(&self, ids: &[i64]) -> Result<String> {
        let mut rsrc = format!("computercommands/command/{}", self.name());
        if let Self::DeviceLock { passcode } | Self::EraseDevice { passcode } = self {
            validate_passcode(passcode)?;
            rsrc.push_str("/passcode/");
            rsrc.push_str(passcode);
        }
        rsrc.push_str("/id/");
        rsrc.push_str(&join_ids(ids));
        Ok(rsrc)
    }
}

impl fmt::Display for ComputerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn validate_passcode(passcode: &str) -> Result<()> {
    if passcode.len() == 6 && passcode.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(JssError::InvalidData("the passcode must be exactly six digits".into()))
    }
}

// ── Mobile device commands ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MobileDeviceCommand {
    BlankPush,
    UpdateInventory,
    DeviceLock { message: Option<String> },
    EraseDevice { preserve_data_plan: bool },
    ClearPasscode,
    ClearRestrictionsPassword,
    UnmanageDevice,
    EnableLostMode {
        message: Option<String>,
        phone: Option<String>,
        footnote: Option<String>,
        play_sound: bool,
    },
    DisableLostMode,
    PlayLostModeSound,
    EnableDataRoaming,
    DisableDataRoaming,
    EnableVoiceRoaming,
    DisableVoiceRoaming,
    ShutDownDevice,
    RestartDevice,
    DeviceName { name: String },
}

impl MobileDeviceCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BlankPush => "BlankPush",
            Self::UpdateInventory => "UpdateInventory",
            Self::DeviceLock { .. } => "DeviceLock",
            Self::EraseDevice { .. } => "EraseDevice",
            Self::ClearPasscode => "ClearPasscode",
            Self::ClearRestrictionsPassword => "ClearRestrictionsPassword",
            Self::UnmanageDevice => "UnmanageDevice",
            Self::EnableLostMode { .. } => "EnableLostMode",
            Self::DisableLostMode => "DisableLostMode",
            Self::PlayLostModeSound => "PlayLostModeSound",
            Self::EnableDataRoaming => "SettingsEnableDataRoaming",
            Self::DisableDataRoaming => "SettingsDisableDataRoaming",
            Self::EnableVoiceRoaming => "SettingsEnableVoiceRoaming",
            Self::DisableVoiceRoaming => "SettingsDisableVoiceRoaming",
            Self::ShutDownDevice => "ShutDownDevice",
            Self::RestartDevice => "RestartDevice",
            Self::DeviceName { .. } => "DeviceName",
        }
    }

    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            Self::EraseDevice { .. } | Self::UnmanageDevice | Self::ClearPasscode
        )
    }

    /// The command document POSTed to `mobiledevicecommands/command`.
    pub fn to_xml(&self, ids: &[i64]) -> Result<XmlElement> {
        let mut general = XmlElement::new("general").text_child("command", self.name());
        match self {
            Self::DeviceLock { message: Some(msg) } => {
                general.push(XmlElement::with_text("lock_message", msg));
            }
            Self::EraseDevice { preserve_data_plan } => {
                general.push(XmlElement::with_text("preserve_data_plan", preserve_data_plan));
            }
            Self::EnableLostMode {
                message,
                phone,
                footnote,
                play_sound,
            } => {
                if message.is_none() && phone.is_none() {
                    return Err(JssError::MissingData(
                        "lost mode needs a message or a phone number".into(),
                    ));
                }
                if let Some(msg) = message {
                    general.push(XmlElement::with_text("lost_mode_message", msg));
                }
                if let Some(phone) = phone {
                    general.push(XmlElement::with_text("lost_mode_phone", phone));
                }
                if let Some(note) = footnote {
                    general.push(XmlElement::with_text("lost_mode_footnote", note));
                }
                general.push(XmlElement::with_text("lost_mode_with_sound", play_sound));
            }
            Self::DeviceName { name } => {
                if name.trim().is_empty() {
                    return Err(JssError::MissingData("a device name is required".into()));
                }
                general.push(XmlElement::with_text("device_name", name.trim()));
            }
            _ => {}
        }

        let devices = XmlElement::new("mobile_devices").extend(
            ids.iter()
                .map(|id| XmlElement::new("mobile_device").text_child("id", id)),
        );
        Ok(XmlElement::new("mobile_device_command")
            .child(general)
            .child(devices))
    }
}

impl fmt::Display for MobileDeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Receipts ─────────────────────────────────────────────────────────

/// What the server acknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandReceipt {
    pub command: &'static str,
    pub targets: Vec<i64>,
    /// Command UUIDs, when the server reports them.
    pub uuids: Vec<String>,
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",")
}

fn receipt_uuids(body: &str) -> Vec<String> {
    let mut uuids = collect_text(body, "command_uuid");
    uuids.extend(collect_text(body, "uuid"));
    uuids
}

impl Jss {
    /// Resolve targets to ids, requiring each to exist and be managed.
    async fn managed_ids<T: ApiObject>(&self, targets: &[Ident]) -> Result<Vec<i64>> {
        if targets.is_empty() {
            return Err(JssError::MissingData("no targets given".into()));
        }
        let mut ids = Vec::with_capacity(targets.len());
        for ident in targets {
            let entry = self.lookup_entry::<T>(ident.clone()).await?.ok_or_else(|| {
                JssError::NoSuchItem(format!("no {} matches {ident}", T::RSRC_OBJECT_KEY))
            })?;
            let name = entry.name().unwrap_or_default().to_owned();
            if !entry.get_bool("managed") {
                return Err(JssError::Unmanaged(format!(
                    "{} '{name}' is not managed",
                    T::RSRC_OBJECT_KEY
                )));
            }
            if let Some(id) = entry.id() {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        Ok(ids)
    }

    /// Send an MDM command to one or more computers.
    pub async fn send_computer_command(
        &self,
        targets: &[Ident],
        command: ComputerCommand,
    ) -> Result<CommandReceipt> {
        let ids = self.managed_ids::<Computer>(targets).await?;
        let rsrc = command.rsrc(&ids)?;
        let body = self.api().post_xml(&rsrc, String::new()).await?;
        info!(command = command.name(), targets = ?ids, "computer command sent");
        Ok(CommandReceipt {
            command: command.name(),
            targets: ids,
            uuids: receipt_uuids(&body),
        })
    }

    /// Send an MDM command to one or more mobile devices.
    pub async fn send_mobile_command(
        &self,
        targets: &[Ident],
        command: MobileDeviceCommand,
    ) -> Result<CommandReceipt> {
        let ids = self.managed_ids::<MobileDevice>(targets).await?;
        let xml = command.to_xml(&ids)?;
        let body = self
            .api()
            .post_xml("mobiledevicecommands/command", xml.to_document())
            .await?;
        info!(command = command.name(), targets = ?ids, "mobile device command sent");
        Ok(CommandReceipt {
            command: command.name(),
            targets: ids,
            uuids: receipt_uuids(&body),
        })
    }

    /// Flush policy logs for one computer, e.g. interval `"Zero Days"`.
    pub async fn flush_computer_policy_logs(
        &self,
        computer: impl Into<Ident>,
        interval: &str,
    ) -> Result<()> {
        let interval = flush_interval(interval)?;
        let id = self.require_id::<Computer>(computer).await?;
        let rsrc = format!("logflush/computer/id/{id}/interval/{}", encode_segment(interval));
        self.api().delete(&rsrc).await?;
        info!(computer = id, interval, "policy logs flushed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn computer_command_paths() {
        assert_eq!(
            ComputerCommand::BlankPush.rsrc(&[1, 2]).unwrap(),
            "computercommands/command/BlankPush/id/1,2"
        );
        let lock = ComputerCommand::DeviceLock {
            passcode: "123456".into(),
        };
        assert_eq!(
            lock.rsrc(&[7]).unwrap(),
            "computercommands/command/DeviceLock/passcode/123456/id/7"
        );
    }

    #[test]
    fn passcodes_must_be_six_digits() {
        for bad in ["12345", "1234567", "12a456", ""] {
            let cmd = ComputerCommand::EraseDevice {
                passcode: bad.into(),
            };
            assert!(matches!(cmd.rsrc(&[1]), Err(JssError::InvalidData(_))), "{bad}");
        }
    }

    #[test]
    fn mobile_command_document() {
        let xml = MobileDeviceCommand::DeviceName {
            name: "Cart iPad 3".into(),
        }
        .to_xml(&[4, 5])
        .unwrap();
        assert_eq!(xml.find_text("general/command"), Some("DeviceName"));
        assert_eq!(xml.find_text("general/device_name"), Some("Cart iPad 3"));
        assert_eq!(xml.find("mobile_devices").unwrap().children().len(), 2);
    }

    #[test]
    fn lost_mode_needs_contact_details() {
        let cmd = MobileDeviceCommand::EnableLostMode {
            message: None,
            phone: None,
            footnote: None,
            play_sound: false,
        };
        assert!(matches!(cmd.to_xml(&[1]), Err(JssError::MissingData(_))));
    }

    #[test]
    fn roaming_commands_use_settings_names() {
        assert_eq!(
            MobileDeviceCommand::EnableDataRoaming.name(),
            "SettingsEnableDataRoaming"
        );
    }
}
