use tabled::Tabled;

use jamf_core::mixins::CommandReceipt;
use jamf_core::{ComputerCommand, Jss, MobileDeviceCommand};

use crate::cli::{ComputerCommandName, GlobalOpts, MdmArgs, MdmCommand, MobileCommandName};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct ReceiptRow {
    #[tabled(rename = "Command")]
    command: String,
    #[tabled(rename = "Target")]
    target: i64,
    #[tabled(rename = "UUID")]
    uuid: String,
}

fn receipt_rows(receipt: &CommandReceipt) -> Vec<ReceiptRow> {
    receipt
        .targets
        .iter()
        .enumerate()
        .map(|(i, &target)| ReceiptRow {
            command: receipt.command.to_owned(),
            target,
            uuid: receipt.uuids.get(i).cloned().unwrap_or_default(),
        })
        .collect()
}

fn require(value: Option<String>, field: &str, command: &str) -> Result<String, CliError> {
    value.ok_or_else(|| CliError::Validation {
        field: field.into(),
        reason: format!("required by {command}"),
    })
}

fn computer_command(
    name: ComputerCommandName,
    passcode: Option<String>,
) -> Result<ComputerCommand, CliError> {
    Ok(match name {
        ComputerCommandName::BlankPush => ComputerCommand::BlankPush,
        ComputerCommandName::DeviceLock => ComputerCommand::DeviceLock {
            passcode: require(passcode, "passcode", "device-lock")?,
        },
        ComputerCommandName::EraseDevice => ComputerCommand::EraseDevice {
            passcode: require(passcode, "passcode", "erase-device")?,
        },
        ComputerCommandName::UnmanageDevice => ComputerCommand::UnmanageDevice,
        ComputerCommandName::EnableRemoteDesktop => ComputerCommand::EnableRemoteDesktop,
        ComputerCommandName::DisableRemoteDesktop => ComputerCommand::DisableRemoteDesktop,
        ComputerCommandName::EnableBluetooth => ComputerCommand::SettingsEnableBluetooth,
        ComputerCommandName::DisableBluetooth => ComputerCommand::SettingsDisableBluetooth,
    })
}

struct MobileOptions {
    message: Option<String>,
    phone: Option<String>,
    footnote: Option<String>,
    sound: bool,
    preserve_data_plan: bool,
    name: Option<String>,
}

fn mobile_command(
    name: MobileCommandName,
    opts: MobileOptions,
) -> Result<MobileDeviceCommand, CliError> {
    use MobileCommandName as N;
    use MobileDeviceCommand as C;

    Ok(match name {
        N::BlankPush => C::BlankPush,
        N::UpdateInventory => C::UpdateInventory,
        N::DeviceLock => C::DeviceLock {
            message: opts.message,
        },
        N::EraseDevice => C::EraseDevice {
            preserve_data_plan: opts.preserve_data_plan,
        },
        N::ClearPasscode => C::ClearPasscode,
        N::ClearRestrictionsPassword => C::ClearRestrictionsPassword,
        N::UnmanageDevice => C::UnmanageDevice,
        N::EnableLostMode => C::EnableLostMode {
            message: opts.message,
            phone: opts.phone,
            footnote: opts.footnote,
            play_sound: opts.sound,
        },
        N::DisableLostMode => C::DisableLostMode,
        N::PlayLostModeSound => C::PlayLostModeSound,
        N::EnableDataRoaming => C::EnableDataRoaming,
        N::DisableDataRoaming => C::DisableDataRoaming,
        N::EnableVoiceRoaming => C::EnableVoiceRoaming,
        N::DisableVoiceRoaming => C::DisableVoiceRoaming,
        N::ShutDownDevice => C::ShutDownDevice,
        N::RestartDevice => C::RestartDevice,
        N::DeviceName => C::DeviceName {
            name: require(opts.name, "name", "device-name")?,
        },
    })
}

pub async fn handle(jss: &Jss, args: MdmArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let receipt = match args.command {
        MdmCommand::Computer {
            command,
            targets,
            passcode,
        } => {
            let command = computer_command(command, passcode)?;
            if command.is_destructive() {
                let prompt = format!("Send {} to {} computer(s)?", command.name(), targets.len());
                if !util::confirm(&prompt, command.name(), global.yes)? {
                    return Ok(());
                }
            }
            jss.send_computer_command(&util::idents(&targets), command)
                .await?
        }
        MdmCommand::Mobile {
            command,
            targets,
            message,
            phone,
            footnote,
            sound,
            preserve_data_plan,
            name,
        } => {
            let opts = MobileOptions {
                message,
                phone,
                footnote,
                sound,
                preserve_data_plan,
                name,
            };
            let command = mobile_command(command, opts)?;
            if command.is_destructive() {
                let prompt = format!(
                    "Send {} to {} mobile device(s)?",
                    command.name(),
                    targets.len()
                );
                if !util::confirm(&prompt, command.name(), global.yes)? {
                    return Ok(());
                }
            }
            jss.send_mobile_command(&util::idents(&targets), command)
                .await?
        }
    };

    output::success(
        global,
        &format!(
            "{} sent to {} device(s)",
            receipt.command,
            receipt.targets.len()
        ),
    );
    let out = output::render_single(
        &global.output,
        &receipt,
        |r| output::render_table(&receipt_rows(r)),
        |r| r.uuids.join("\n"),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn no_opts() -> MobileOptions {
        MobileOptions {
            message: None,
            phone: None,
            footnote: None,
            sound: false,
            preserve_data_plan: false,
            name: None,
        }
    }

    #[test]
    fn device_lock_needs_a_passcode() {
        let err = computer_command(ComputerCommandName::DeviceLock, None).unwrap_err();
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "passcode"));

        let cmd = computer_command(ComputerCommandName::DeviceLock, Some("123456".into())).unwrap();
        assert_eq!(
            cmd,
            ComputerCommand::DeviceLock {
                passcode: "123456".into()
            }
        );
    }

    #[test]
    fn bluetooth_names_map_to_settings_commands() {
        let cmd = computer_command(ComputerCommandName::EnableBluetooth, None).unwrap();
        assert_eq!(cmd.name(), "SettingsEnableBluetooth");
    }

    #[test]
    fn lost_mode_carries_its_options() {
        let opts = MobileOptions {
            message: Some("Call me".into()),
            phone: Some("555-0100".into()),
            sound: true,
            ..no_opts()
        };
        let cmd = mobile_command(MobileCommandName::EnableLostMode, opts).unwrap();
        assert_eq!(
            cmd,
            MobileDeviceCommand::EnableLostMode {
                message: Some("Call me".into()),
                phone: Some("555-0100".into()),
                footnote: None,
                play_sound: true,
            }
        );
    }

    #[test]
    fn device_name_needs_a_name() {
        assert!(mobile_command(MobileCommandName::DeviceName, no_opts()).is_err());
    }

    #[test]
    fn receipt_rows_pair_targets_with_uuids() {
        let receipt = CommandReceipt {
            command: "BlankPush",
            targets: vec![7, 8],
            uuids: vec!["A-1".into()],
        };
        let rows = receipt_rows(&receipt);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].uuid, "A-1");
        assert_eq!(rows[1].uuid, "");
    }
}
