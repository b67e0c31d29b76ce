//! Router command handlers.

use tabled::Tabled;

use netweave_core::{RouterInterface, RouterLinkRequest};

use crate::cli::{GlobalOpts, RouterArgs, RouterCommand};
use crate::error::CliError;
use crate::output;

use super::util::{self, Workspace};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct InterfaceRow {
    #[tabled(rename = "Interface")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Switch")]
    switch: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(ws: &mut Workspace, args: RouterArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        RouterCommand::Interfaces { router } => {
            let service = ws.service();
            let router = util::resolve_router(&service, &router)?;
            let interfaces = match router.id {
                Some(id) => service.router_interfaces(id),
                None => Vec::new(),
            };
            let switches = &service.snapshot().switches;
            let out = output::render_list(
                global.output_format(),
                &interfaces,
                |i: &RouterInterface| InterfaceRow {
                    name: i.name.clone(),
                    address: i.address.clone().unwrap_or_default(),
                    switch: switches
                        .name_of(i.switch_id)
                        .map_or_else(|| i.switch_id.to_string(), str::to_owned),
                },
                |i| i.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RouterCommand::CheckConfig { router } => {
            let service = ws.service();
            let router = util::resolve_router(&service, &router)?;
            let checked = service.check_router(router)?;
            let color = output::should_color(global.color_mode());
            let out = output::render_single(
                global.output_format(),
                &checked,
                |c| {
                    output::status(
                        &format!(
                            "Router {}: {} user(s), {} route(s) valid",
                            router.name,
                            c.users.len(),
                            c.routes.len()
                        ),
                        true,
                        color,
                    )
                },
                |_| router.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RouterCommand::PlanLink {
            router,
            switch,
            addresses,
            apply,
        } => {
            let plan = {
                let service = ws.service();
                let router = util::resolve_router(&service, &router)?;
                let switch = util::resolve_switch(&service, &switch)?;
                let request = RouterLinkRequest {
                    entries: util::interface_entries(&addresses)?,
                    peer: addresses.peer.clone(),
                };
                service.plan_router_link(router, switch, &request)?
            };
            util::print_plan(&plan, global)?;
            if apply.apply {
                ws.apply(&plan.batch, global)?;
            }
            Ok(())
        }
    }
}
