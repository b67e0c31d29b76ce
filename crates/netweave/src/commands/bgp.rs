//! BGP command handlers.

use netweave_core::BgpConfig;

use crate::cli::{BgpArgs, BgpCommand, GlobalOpts};
use crate::error::CliError;

use super::util::{self, Workspace};

pub fn handle(ws: &mut Workspace, args: BgpArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        BgpCommand::Check {
            router,
            from_file,
            apply,
        } => {
            let batch = {
                let service = ws.service();
                let config: BgpConfig = match (router, from_file) {
                    (_, Some(path)) => util::read_document(&path)?,
                    (Some(router), None) => {
                        let router = util::resolve_router(&service, &router)?;
                        router
                            .id
                            .and_then(|id| service.snapshot().bgp_of_router(id))
                            .cloned()
                            .ok_or_else(|| CliError::NotFound {
                                resource_type: "BGP configuration".into(),
                                identifier: router.name.clone(),
                                list_command: "bgp check --from-file <FILE>".into(),
                            })?
                    }
                    (None, None) => {
                        return Err(CliError::Validation {
                            field: "router".into(),
                            reason: "pass a router or --from-file".into(),
                        });
                    }
                };
                service.plan_bgp(&config)?
            };
            util::print_batch(&batch, global)?;
            if apply.apply {
                ws.apply(&batch, global)?;
            }
            Ok(())
        }
    }
}
