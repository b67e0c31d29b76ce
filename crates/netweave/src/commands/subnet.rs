//! Subnet Table command handlers. These need no snapshot.

use serde::Serialize;
use tabled::Tabled;

use netweave_core::SubnetMask;

use crate::cli::{GlobalOpts, SubnetArgs, SubnetCommand};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct SubnetEntry {
    prefix: u8,
    mask: &'static str,
}

impl From<SubnetMask> for SubnetEntry {
    fn from(mask: SubnetMask) -> Self {
        Self {
            prefix: mask.prefix(),
            mask: mask.dotted(),
        }
    }
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SubnetRow {
    #[tabled(rename = "Prefix")]
    prefix: String,
    #[tabled(rename = "Mask")]
    mask: &'static str,
}

impl From<&SubnetEntry> for SubnetRow {
    fn from(e: &SubnetEntry) -> Self {
        Self {
            prefix: format!("/{}", e.prefix),
            mask: e.mask,
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: SubnetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SubnetCommand::List => {
            let table: Vec<SubnetEntry> = SubnetMask::all().map(SubnetEntry::from).collect();
            let out = output::render_list(
                global.output_format(),
                &table,
                |e| SubnetRow::from(e),
                |e| format!("/{} {}", e.prefix, e.mask),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SubnetCommand::Lookup { value } => {
            let entry = SubnetEntry::from(SubnetMask::parse(&value)?);
            // A dotted query answers with the prefix, a prefix query with the mask.
            let wants_prefix = value.contains('.');
            let out = output::render_single(
                global.output_format(),
                &entry,
                |e| format!("/{} = {}", e.prefix, e.mask),
                |e| {
                    if wants_prefix {
                        e.prefix.to_string()
                    } else {
                        e.mask.to_owned()
                    }
                },
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
