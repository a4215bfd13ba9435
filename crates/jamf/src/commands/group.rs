//! Static group membership commands.

use serde::Serialize;
use tabled::Tabled;

use jamf_core::resources::{
    ComputerMembers, Group, GroupKind as Members, MobileDeviceMembers, UserMembers,
};
use jamf_core::{ApiObject, Jss, ObjectRef};

use crate::cli::{GlobalOpts, GroupArgs, GroupCommand, GroupKind};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled, Serialize)]
struct MemberRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
}

impl From<&ObjectRef> for MemberRow {
    fn from(r: &ObjectRef) -> Self {
        Self {
            id: r.id,
            name: r.name.clone(),
        }
    }
}

pub async fn handle(jss: &Jss, args: GroupArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let kind = match &args.command {
        GroupCommand::Add { kind, .. }
        | GroupCommand::Remove { kind, .. }
        | GroupCommand::Members { kind, .. } => *kind,
    };
    match kind {
        GroupKind::Computer => run::<ComputerMembers>(jss, args.command, global).await,
        GroupKind::Mobile => run::<MobileDeviceMembers>(jss, args.command, global).await,
        GroupKind::User => run::<UserMembers>(jss, args.command, global).await,
    }
}

async fn run<K: Members>(
    jss: &Jss,
    command: GroupCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match command {
        GroupCommand::Members { group, .. } => {
            let group: Group<K> = jss.fetch(group).await?;
            let rows: Vec<MemberRow> = group.members().iter().map(MemberRow::from).collect();
            let out = output::render_list(
                &global.output,
                &rows,
                |r| MemberRow {
                    id: r.id,
                    name: r.name.clone(),
                },
                |r| r.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
        GroupCommand::Add { group, members, .. } => {
            let mut group: Group<K> = jss.fetch(group).await?;
            jss.change_group_membership(&mut group, &util::idents(&members), &[])
                .await?;
            output::success(
                global,
                &format!(
                    "Added {} member(s) to '{}' ({} total)",
                    members.len(),
                    group.name(),
                    group.members().len()
                ),
            );
            Ok(())
        }
        GroupCommand::Remove { group, members, .. } => {
            let mut group: Group<K> = jss.fetch(group).await?;
            let prompt = format!(
                "Remove {} member(s) from '{}'?",
                members.len(),
                group.name()
            );
            if !util::confirm(&prompt, "remove group members", global.yes)? {
                return Ok(());
            }
            jss.change_group_membership(&mut group, &[], &util::idents(&members))
                .await?;
            output::success(
                global,
                &format!(
                    "Removed {} member(s) from '{}' ({} left)",
                    members.len(),
                    group.name(),
                    group.members().len()
                ),
            );
            Ok(())
        }
    }
}
