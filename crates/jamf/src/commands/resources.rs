//! Generic resource handlers: list, show, delete.

use serde::Serialize;
use tabled::Tabled;

use jamf_core::lookup::ListEntry;
use jamf_core::{
    AdvancedComputerSearch, ApiObject, Building, Category, Computer, ComputerExtensionAttribute,
    ComputerGroup, Deletable, Department, DirectoryBinding, DistributionPoint, Jss, LdapServer,
    MobileDevice, MobileDeviceApplication, MobileDeviceExtensionAttribute, MobileDeviceGroup,
    NetworkSegment, OsxConfigurationProfile, Package, PatchExternalSource, PatchInternalSource,
    PatchPolicy, PatchTitle, Policy, Printer, RestrictedSoftware, Script, Site, User,
    UserExtensionAttribute, UserGroup, Webhook,
};

use crate::cli::{DeleteArgs, GlobalOpts, ListArgs, Resource, ShowArgs};
use crate::error::CliError;
use crate::output;

use super::util;

// Expand `$handler::<T>(args...)` for the type behind a `Resource`.
macro_rules! with_resource {
    ($resource:expr, $handler:ident($($arg:expr),*)) => {
        match $resource {
            Resource::AdvancedComputerSearches => $handler::<AdvancedComputerSearch>($($arg),*).await,
            Resource::Buildings => $handler::<Building>($($arg),*).await,
            Resource::Categories => $handler::<Category>($($arg),*).await,
            Resource::ComputerExtensionAttributes => $handler::<ComputerExtensionAttribute>($($arg),*).await,
            Resource::ComputerGroups => $handler::<ComputerGroup>($($arg),*).await,
            Resource::Computers => $handler::<Computer>($($arg),*).await,
            Resource::Departments => $handler::<Department>($($arg),*).await,
            Resource::DirectoryBindings => $handler::<DirectoryBinding>($($arg),*).await,
            Resource::DistributionPoints => $handler::<DistributionPoint>($($arg),*).await,
            Resource::LdapServers => $handler::<LdapServer>($($arg),*).await,
            Resource::MobileDeviceApplications => $handler::<MobileDeviceApplication>($($arg),*).await,
            Resource::MobileDeviceExtensionAttributes => $handler::<MobileDeviceExtensionAttribute>($($arg),*).await,
            Resource::MobileDeviceGroups => $handler::<MobileDeviceGroup>($($arg),*).await,
            Resource::MobileDevices => $handler::<MobileDevice>($($arg),*).await,
            Resource::NetworkSegments => $handler::<NetworkSegment>($($arg),*).await,
            Resource::OsxConfigurationProfiles => $handler::<OsxConfigurationProfile>($($arg),*).await,
            Resource::Packages => $handler::<Package>($($arg),*).await,
            Resource::PatchExternalSources => $handler::<PatchExternalSource>($($arg),*).await,
            Resource::PatchInternalSources => $handler::<PatchInternalSource>($($arg),*).await,
            Resource::PatchPolicies => $handler::<PatchPolicy>($($arg),*).await,
            Resource::PatchTitles => $handler::<PatchTitle>($($arg),*).await,
            Resource::Policies => $handler::<Policy>($($arg),*).await,
            Resource::Printers => $handler::<Printer>($($arg),*).await,
            Resource::RestrictedSoftware => $handler::<RestrictedSoftware>($($arg),*).await,
            Resource::Scripts => $handler::<Script>($($arg),*).await,
            Resource::Sites => $handler::<Site>($($arg),*).await,
            Resource::UserExtensionAttributes => $handler::<UserExtensionAttribute>($($arg),*).await,
            Resource::UserGroups => $handler::<UserGroup>($($arg),*).await,
            Resource::Users => $handler::<User>($($arg),*).await,
            Resource::Webhooks => $handler::<Webhook>($($arg),*).await,
        }
    };
}

// Same, for resources the server lets clients delete.
macro_rules! with_deletable {
    ($resource:expr, $handler:ident($($arg:expr),*)) => {
        match $resource {
            Resource::AdvancedComputerSearches => $handler::<AdvancedComputerSearch>($($arg),*).await,
            Resource::Buildings => $handler::<Building>($($arg),*).await,
            Resource::Categories => $handler::<Category>($($arg),*).await,
            Resource::ComputerExtensionAttributes => $handler::<ComputerExtensionAttribute>($($arg),*).await,
            Resource::ComputerGroups => $handler::<ComputerGroup>($($arg),*).await,
            Resource::Computers => $handler::<Computer>($($arg),*).await,
            Resource::Departments => $handler::<Department>($($arg),*).await,
            Resource::DirectoryBindings => $handler::<DirectoryBinding>($($arg),*).await,
            Resource::MobileDeviceApplications => $handler::<MobileDeviceApplication>($($arg),*).await,
            Resource::MobileDeviceExtensionAttributes => $handler::<MobileDeviceExtensionAttribute>($($arg),*).await,
            Resource::MobileDeviceGroups => $handler::<MobileDeviceGroup>($($arg),*).await,
            Resource::MobileDevices => $handler::<MobileDevice>($($arg),*).await,
            Resource::NetworkSegments => $handler::<NetworkSegment>($($arg),*).await,
            Resource::OsxConfigurationProfiles => $handler::<OsxConfigurationProfile>($($arg),*).await,
            Resource::Packages => $handler::<Package>($($arg),*).await,
            Resource::PatchExternalSources => $handler::<PatchExternalSource>($($arg),*).await,
            Resource::PatchPolicies => $handler::<PatchPolicy>($($arg),*).await,
            Resource::PatchTitles => $handler::<PatchTitle>($($arg),*).await,
            Resource::Policies => $handler::<Policy>($($arg),*).await,
            Resource::Printers => $handler::<Printer>($($arg),*).await,
            Resource::RestrictedSoftware => $handler::<RestrictedSoftware>($($arg),*).await,
            Resource::Scripts => $handler::<Script>($($arg),*).await,
            Resource::Sites => $handler::<Site>($($arg),*).await,
            Resource::UserExtensionAttributes => $handler::<UserExtensionAttribute>($($arg),*).await,
            Resource::UserGroups => $handler::<UserGroup>($($arg),*).await,
            Resource::Users => $handler::<User>($($arg),*).await,
            Resource::Webhooks => $handler::<Webhook>($($arg),*).await,
            Resource::DistributionPoints | Resource::LdapServers | Resource::PatchInternalSources => {
                Err(CliError::Unsupported(format!(
                    "{:?} are read-only through the Classic API",
                    $resource
                )))
            }
        }
    };
}

// ── Handlers ─────────────────────────────────────────────────────────

pub async fn list(jss: &Jss, args: ListArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let filter = args.filter.map(|f| f.to_lowercase());
    with_resource!(args.resource, list_entries(jss, filter.as_deref(), global))
}

pub async fn show(jss: &Jss, args: ShowArgs, global: &GlobalOpts) -> Result<(), CliError> {
    with_resource!(args.resource, show_record(jss, &args.ident, global))
}

pub async fn delete(jss: &Jss, args: DeleteArgs, global: &GlobalOpts) -> Result<(), CliError> {
    with_deletable!(args.resource, delete_objects(jss, &args.idents, global))
}

// ── Generic implementations ──────────────────────────────────────────

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
}

impl From<&ListEntry> for EntryRow {
    fn from(e: &ListEntry) -> Self {
        Self {
            id: e.id().map(|id| id.to_string()).unwrap_or_default(),
            name: e.name().unwrap_or_default().to_owned(),
        }
    }
}

fn name_matches(entry: &ListEntry, filter: Option<&str>) -> bool {
    filter.is_none_or(|f| {
        entry
            .name()
            .is_some_and(|name| name.to_lowercase().contains(f))
    })
}

async fn list_entries<T: ApiObject>(
    jss: &Jss,
    filter: Option<&str>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let entries = jss.all::<T>(false).await?;
    let shown: Vec<&ListEntry> = entries.iter().filter(|e| name_matches(e, filter)).collect();

    let out = output::render_list(
        &global.output,
        &shown,
        |e| EntryRow::from(*e),
        |e| e.id().map(|id| id.to_string()).unwrap_or_default(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn show_record<T: ApiObject>(
    jss: &Jss,
    ident: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let id = jss.require_id::<T>(ident).await?;
    let record = jss.fetch_record::<T>(id).await?;

    let out = output::render_single(&global.output, &record, output::render_record, |_| {
        id.to_string()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct DeleteReport {
    deleted: Vec<i64>,
    skipped: Vec<i64>,
}

impl DeleteReport {
    /// Split the requested ids by whether the server still had them.
    fn new(requested: Vec<i64>, skipped: Vec<i64>) -> Self {
        let deleted = requested
            .into_iter()
            .filter(|id| !skipped.contains(id))
            .collect();
        Self { deleted, skipped }
    }
}

async fn delete_objects<T: Deletable>(
    jss: &Jss,
    idents: &[String],
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // Resolve everything first so a typo deletes nothing.
    let mut ids = Vec::with_capacity(idents.len());
    for ident in util::idents(idents) {
        let id = jss.require_id::<T>(ident).await?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    let noun = T::RSRC_LIST_KEY.replace('_', " ");
    let prompt = format!("Delete {} {noun} ({})?", ids.len(), join(&ids));
    if !util::confirm(&prompt, &format!("delete {noun}"), global.yes)? {
        return Ok(());
    }

    let skipped = jss.delete_ids::<T>(&ids).await?;
    let report = DeleteReport::new(ids, skipped);
    if !report.skipped.is_empty() {
        tracing::warn!(ids = %join(&report.skipped), "already gone from the server; skipped");
    }
    output::success(global, &format!("Deleted {} {noun}", report.deleted.len()));

    if !matches!(global.output, crate::cli::OutputFormat::Table) {
        let out = output::render_single(
            &global.output,
            &report,
            |_| String::new(),
            |r| join(&r.deleted).replace(", ", "\n"),
        )?;
        output::print_output(&out, global.quiet);
    }
    Ok(())
}

fn join(ids: &[i64]) -> String {
    ids.iter().map(i64::to_string).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn delete_report_leaves_out_skipped_ids() {
        let report = DeleteReport::new(vec![4, 9, 12], vec![9]);
        assert_eq!(
            report,
            DeleteReport {
                deleted: vec![4, 12],
                skipped: vec![9],
            }
        );
        assert_eq!(join(&report.deleted), "4, 12");
    }
}
