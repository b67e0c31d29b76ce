//! Command dispatch: bridges CLI args -> core planning -> output formatting.

pub mod bgp;
pub mod config_cmd;
pub mod intent;
pub mod links;
pub mod router;
pub mod subnet;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

use self::util::Workspace;

/// Dispatch a snapshot-bound command to the appropriate handler.
pub fn dispatch(cmd: Command, ws: &mut Workspace, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Links(args) => links::handle(ws, args, global),
        Command::Router(args) => router::handle(ws, args, global),
        Command::Bgp(args) => bgp::handle(ws, args, global),
        Command::Intent(args) => intent::handle(ws, args, global),
        // Subnet, Config and Completions are handled before dispatch
        Command::Subnet(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
