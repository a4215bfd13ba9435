//! Clap derive structures for the `jamf` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Only depends on clap so the build script can render man pages from it.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// jamf -- command-line access to a Jamf Pro server
#[derive(Debug, Parser)]
#[command(
    name = "jamf",
    version,
    about = "Manage Jamf Pro servers from the command line",
    long_about = "Inspect and manage the objects of a Jamf Pro server through its\n\
        Classic API: list and show records, edit static group membership,\n\
        send MDM commands and read management history.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "JAMF_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server host or URL (overrides profile)
    #[arg(long, short = 's', env = "JAMF_SERVER", global = true)]
    pub server: Option<String>,

    /// API username (overrides profile)
    #[arg(long, short = 'u', env = "JAMF_USERNAME", global = true)]
    pub username: Option<String>,

    /// API password
    #[arg(long, env = "JAMF_PASSWORD", global = true, hide = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "JAMF_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "JAMF_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "JAMF_TIMEOUT", default_value = "60", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the objects of a resource type
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one object in full
    #[command(alias = "get")]
    Show(ShowArgs),

    /// Delete objects
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// Inspect and change static group membership
    #[command(alias = "g")]
    Group(GroupArgs),

    /// Send MDM commands
    Mdm(MdmArgs),

    /// Read the management history of a device
    History(HistoryArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Resources ────────────────────────────────────────────────────────

/// Resource types reachable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Resource {
    #[value(alias = "advancedcomputersearches")]
    AdvancedComputerSearches,
    Buildings,
    Categories,
    #[value(alias = "computerextensionattributes")]
    ComputerExtensionAttributes,
    #[value(alias = "computergroups")]
    ComputerGroups,
    Computers,
    Departments,
    #[value(alias = "directorybindings")]
    DirectoryBindings,
    #[value(alias = "distributionpoints")]
    DistributionPoints,
    #[value(alias = "ldapservers")]
    LdapServers,
    #[value(alias = "mobiledeviceapplications")]
    MobileDeviceApplications,
    #[value(alias = "mobiledeviceextensionattributes")]
    MobileDeviceExtensionAttributes,
    #[value(alias = "mobiledevicegroups")]
    MobileDeviceGroups,
    #[value(alias = "mobiledevices")]
    MobileDevices,
    #[value(alias = "networksegments")]
    NetworkSegments,
    #[value(alias = "osxconfigurationprofiles", alias = "profiles")]
    OsxConfigurationProfiles,
    Packages,
    #[value(alias = "patchexternalsources")]
    PatchExternalSources,
    #[value(alias = "patchinternalsources")]
    PatchInternalSources,
    #[value(alias = "patchpolicies")]
    PatchPolicies,
    #[value(alias = "patchsoftwaretitles", alias = "patch-software-titles")]
    PatchTitles,
    Policies,
    Printers,
    #[value(alias = "restrictedsoftware")]
    RestrictedSoftware,
    Scripts,
    Sites,
    #[value(alias = "userextensionattributes")]
    UserExtensionAttributes,
    #[value(alias = "usergroups")]
    UserGroups,
    Users,
    Webhooks,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Resource type
    pub resource: Resource,

    /// Only names containing this text (case-insensitive)
    #[arg(long, short = 'f')]
    pub filter: Option<String>,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Resource type
    pub resource: Resource,

    /// Id, name, or alternate key such as a serial number
    pub ident: String,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Resource type
    pub resource: Resource,

    /// Ids, names, or alternate keys
    #[arg(required = true)]
    pub idents: Vec<String>,
}

// ── Groups ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GroupKind {
    Computer,
    #[value(alias = "mobile-device")]
    Mobile,
    User,
}

#[derive(Debug, Args)]
pub struct GroupArgs {
    #[command(subcommand)]
    pub command: GroupCommand,
}

#[derive(Debug, Subcommand)]
pub enum GroupCommand {
    /// Add members to a static group
    Add {
        kind: GroupKind,
        /// Group id or name
        group: String,
        /// Members to add
        #[arg(required = true)]
        members: Vec<String>,
    },

    /// Remove members from a static group
    Remove {
        kind: GroupKind,
        /// Group id or name
        group: String,
        /// Members to remove
        #[arg(required = true)]
        members: Vec<String>,
    },

    /// List the members of a group
    Members {
        kind: GroupKind,
        /// Group id or name
        group: String,
    },
}

// ── MDM ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ComputerCommandName {
    BlankPush,
    DeviceLock,
    EraseDevice,
    UnmanageDevice,
    EnableRemoteDesktop,
    DisableRemoteDesktop,
    EnableBluetooth,
    DisableBluetooth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MobileCommandName {
    BlankPush,
    UpdateInventory,
    DeviceLock,
    EraseDevice,
    ClearPasscode,
    ClearRestrictionsPassword,
    UnmanageDevice,
    EnableLostMode,
    DisableLostMode,
    PlayLostModeSound,
    EnableDataRoaming,
    DisableDataRoaming,
    EnableVoiceRoaming,
    DisableVoiceRoaming,
    ShutDownDevice,
    RestartDevice,
    DeviceName,
}

#[derive(Debug, Args)]
pub struct MdmArgs {
    #[command(subcommand)]
    pub command: MdmCommand,
}

#[derive(Debug, Subcommand)]
pub enum MdmCommand {
    /// Send a command to computers
    Computer {
        command: ComputerCommandName,

        /// Computer ids, names or serial numbers
        #[arg(required = true)]
        targets: Vec<String>,

        /// Six-digit passcode for device-lock and erase-device
        #[arg(long)]
        passcode: Option<String>,
    },

    /// Send a command to mobile devices
    Mobile {
        command: MobileCommandName,

        /// Device ids, names or serial numbers
        #[arg(required = true)]
        targets: Vec<String>,

        /// Lock or lost mode message
        #[arg(long)]
        message: Option<String>,

        /// Lost mode phone number
        #[arg(long)]
        phone: Option<String>,

        /// Lost mode footnote
        #[arg(long)]
        footnote: Option<String>,

        /// Play a sound when lost mode is enabled
        #[arg(long)]
        sound: bool,

        /// Keep the data plan when erasing
        #[arg(long)]
        preserve_data_plan: bool,

        /// New device name for device-name
        #[arg(long)]
        name: Option<String>,
    },
}

// ── History ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusFilter {
    Completed,
    Pending,
    Failed,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub command: HistoryCommand,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// MDM command history of a computer
    Computer {
        /// Computer id, name or serial number
        ident: String,
        /// Only commands with this status
        #[arg(long)]
        status: Option<StatusFilter>,
    },

    /// MDM command history of a mobile device
    Mobile {
        /// Device id, name or serial number
        ident: String,
        /// Only commands with this status
        #[arg(long)]
        status: Option<StatusFilter>,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key, e.g. "server" or "timeout"
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the active profile's password in the system keyring
    SetPassword,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
