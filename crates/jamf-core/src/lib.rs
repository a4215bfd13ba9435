// jamf-core: Typed objects, lookups and persistence on top of jamf-api.

pub mod config;
pub mod connection;
pub mod error;
pub mod lookup;
pub mod mixins;
pub mod object;
pub mod resources;

mod json;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{AuthCredentials, ConnectionConfig, TlsVerification};
pub use connection::Jss;
pub use error::{JssError, Result};
pub use lookup::{Ident, ListEntry};
pub use object::{
    ApiObject, Creatable, Deletable, ObjectCore, ObjectRef, ObjectState, Updatable, Writable,
};

// Capability traits, so `use jamf_core::*` brings their methods into scope.
pub use mixins::{
    Categorizable, Criteriable, Extendable, HasManagementHistory, Locatable, Matchable,
    Purchasable, Scopable, SelfServable, Sitable, Uploadable, Vppable,
};
pub use mixins::{ComputerCommand, MobileDeviceCommand, ScopeKey, ScopeKind};

// Resource types at the crate root.
pub use resources::{
    // Organization
    Building, Category, Department, Site,
    // Inventory
    Computer, MobileDevice, User,
    // Groups and searches
    AdvancedComputerSearch, ComputerGroup, MobileDeviceGroup, UserGroup,
    // Extension attribute definitions
    ComputerExtensionAttribute, MobileDeviceExtensionAttribute, UserExtensionAttribute,
    // Deployment
    MobileDeviceApplication, OsxConfigurationProfile, Package, Policy, Printer,
    RestrictedSoftware, Script,
    // Patch management
    PatchExternalSource, PatchInternalSource, PatchPolicy, PatchTitle,
    // Infrastructure
    DirectoryBinding, DistributionPoint, LdapServer, NetworkSegment, Webhook,
};
