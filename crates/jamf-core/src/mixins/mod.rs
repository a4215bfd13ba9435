// Capability traits shared across resource types.
//
// Each module owns one JSON subtree (read on fetch) and one XML subtree
// (written on save). Operations that need the server to validate input
// are `Jss` methods bounded by the capability trait.

pub mod category;
pub mod criteria;
pub mod extension_attributes;
pub mod history;
pub mod location;
pub mod matchable;
pub mod mdm;
pub mod purchasing;
pub mod scope;
pub mod self_service;
pub mod site;
pub mod upload;
pub mod vpp;

pub use category::{Categorizable, CategoryRef, CategoryStyle, NO_CATEGORY};
pub use criteria::{AndOr, Criteria, Criteriable, Criterion, SEARCH_TYPES};
pub use extension_attributes::{
    EaDataType, EaInputType, ExtAttrDefinition, ExtAttrValue, Extendable, ExtensionAttributes,
};
pub use history::{
    AppInstallRecord, AuditEvent, HasManagementHistory, HistoryFlavor, HistoryStatus,
    ManagementHistory, MdmCommandRecord, PolicyLogEntry, UserLocationChange,
};
pub use location::{Locatable, Location};
pub use matchable::Matchable;
pub use mdm::{CommandReceipt, ComputerCommand, MobileDeviceCommand};
pub use purchasing::{Purchasable, Purchasing};
pub use scope::{Scopable, Scope, ScopeItem, ScopeKey, ScopeKind};
pub use self_service::{
    NotificationType, SelfServable, SelfService, SelfServiceCategory, SelfServiceFlavor,
    SelfServiceIcon, UserRemovability,
};
pub use site::{SiteRef, Sitable, NO_SITE};
pub use upload::Uploadable;
pub use vpp::{Vpp, Vppable};
