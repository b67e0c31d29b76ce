//! Config subcommand handlers.

use std::path::PathBuf;

use dialoguer::Input;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: add or replace a profile ──────────────────────────
        ConfigCommand::Init => {
            let mut cfg = config::load_config()?;
            let profile_name = global.profile.clone().unwrap_or_else(|| "default".into());

            let snapshot = match &global.snapshot {
                Some(path) => path.clone(),
                None => {
                    let raw: String = Input::new()
                        .with_prompt("Topology snapshot file (JSON or YAML)")
                        .interact_text()
                        .map_err(prompt_err)?;
                    PathBuf::from(raw.trim())
                }
            };
            let snapshot = std::path::absolute(&snapshot)?;

            if cfg.profiles.contains_key(&profile_name)
                && !util::confirm(&format!("Replace profile '{profile_name}'?"), global.yes)?
            {
                return Ok(());
            }

            cfg.profiles.insert(
                profile_name.clone(),
                Profile {
                    snapshot,
                    project: global.project,
                },
            );
            if cfg.default_profile.is_none() || cfg.profiles.len() == 1 {
                cfg.default_profile = Some(profile_name.clone());
            }

            let path = config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Configuration written to {}", path.display());
                eprintln!("  Profile: {profile_name}");
            }
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let active = config::active_profile_name(global, &cfg);
            let out = output::render_single(
                global.output_format(),
                &cfg,
                |c| render_toml(c, &active),
                |_| active.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}

fn render_toml(cfg: &Config, active: &str) -> String {
    let body = toml::to_string_pretty(cfg).unwrap_or_else(|e| format!("# unrenderable: {e}\n"));
    format!("# active profile: {active}\n{body}")
}
