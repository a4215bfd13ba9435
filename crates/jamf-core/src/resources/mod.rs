// ── Resource types ──
//
// One module per Classic API resource. Each type implements `ApiObject`
// plus the persistence and capability traits its resource supports;
// resource-specific operations that need the server are `Jss` methods
// defined alongside the type.

pub mod advanced_computer_search;
pub mod building;
pub mod category;
pub mod computer;
pub mod department;
pub mod directory_binding;
pub mod distribution_point;
pub mod ext_attr_def;
pub mod group;
pub mod ldap_server;
pub mod mobile_device;
pub mod mobile_device_application;
pub mod network_segment;
pub mod osx_configuration_profile;
pub mod package;
pub mod patch_policy;
pub mod patch_source;
pub mod patch_title;
pub mod policy;
pub mod printer;
pub mod restricted_software;
pub mod script;
pub mod site;
pub mod user;
pub mod webhook;

// ── Re-exports ──────────────────────────────────────────────────────

// Sites, locations and organization
pub use building::Building;
pub use category::Category;
pub use department::Department;
pub use site::Site;

// Inventory
pub use computer::{Computer, ComputerHardware};
pub use mobile_device::MobileDevice;
pub use user::User;

// Groups and searches
pub use advanced_computer_search::AdvancedComputerSearch;
pub use group::{
    ComputerGroup, ComputerMembers, Group, GroupKind, MobileDeviceGroup, MobileDeviceMembers,
    UserGroup, UserMembers,
};

// Extension attribute definitions
pub use ext_attr_def::{
    ComputerExtensionAttribute, ComputerTarget, EaTarget, ExtensionAttributeDef,
    MobileDeviceExtensionAttribute, MobileDeviceTarget, UserExtensionAttribute, UserTarget,
};

// Deployment
pub use mobile_device_application::MobileDeviceApplication;
pub use osx_configuration_profile::{OsxConfigurationProfile, ProfileLevel};
pub use package::{Package, RequiredProcessor};
pub use policy::{
    FilesProcesses, Frequency, Maintenance, PackageAction, Policy, PolicyPackage, PolicyScript,
    Trigger,
};
pub use printer::Printer;
pub use restricted_software::RestrictedSoftware;
pub use script::{Script, ScriptPriority};

// Patch management
pub use patch_policy::{DistributionMethod, KillApp, PatchPolicy};
pub use patch_source::{AvailableTitle, PatchExternalSource, PatchInternalSource, SourceEndpoint};
pub use patch_title::{PatchReport, PatchReportVersion, PatchTitle, PatchVersion};

// Infrastructure
pub use directory_binding::DirectoryBinding;
pub use distribution_point::DistributionPoint;
pub use ldap_server::{LdapServer, LdapUser};
pub use network_segment::NetworkSegment;
pub use webhook::{ContentType, Webhook, WebhookEvent};
