//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod config_cmd;
pub mod group;
pub mod history;
pub mod mdm;
pub mod resources;
pub mod util;

use jamf_core::Jss;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, jss: &Jss, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::List(args) => resources::list(jss, args, global).await,
        Command::Show(args) => resources::show(jss, args, global).await,
        Command::Delete(args) => resources::delete(jss, args, global).await,
        Command::Group(args) => group::handle(jss, args, global).await,
        Command::Mdm(args) => mdm::handle(jss, args, global).await,
        Command::History(args) => history::handle(jss, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
