//! CLI configuration: thin wrapper around `netweave_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--snapshot, --project, etc.).

use std::path::PathBuf;

use clap::ValueEnum;
use netweave_core::EntityId;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use netweave_config::{Config, ConfigError, Profile, config_path, load_config, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Fill `--output` and `--color` from the config defaults when no flag
/// or environment variable set them.
pub fn apply_defaults(global: &mut GlobalOpts, config: &Config) -> Result<(), CliError> {
    if global.output.is_none() {
        global.output = Some(parse_value::<OutputFormat>(
            "defaults.output",
            &config.defaults.output,
        )?);
    }
    if global.color.is_none() {
        global.color = Some(parse_value::<ColorMode>(
            "defaults.color",
            &config.defaults.color,
        )?);
    }
    Ok(())
}

fn parse_value<T: ValueEnum>(field: &str, raw: &str) -> Result<T, CliError> {
    T::from_str(raw, true).map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("unknown value '{raw}'"),
    })
}

/// Where a command reads its topology from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub snapshot: PathBuf,
    pub project: Option<EntityId>,
}

/// Resolve the snapshot file and project filter.
///
/// Flags (and their environment variables) win over the active profile.
/// An explicitly named profile must exist; the default one may be absent.
pub fn resolve_target(global: &GlobalOpts, config: &Config) -> Result<Target, CliError> {
    let profile = match config.profile(global.profile.as_deref()) {
        Ok(profile) => profile.map(|(_, p)| p),
        Err(ConfigError::UnknownProfile { profile }) => {
            let mut names: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
            names.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name: profile,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
            });
        }
        Err(e) => return Err(e.into()),
    };

    let snapshot = match (&global.snapshot, profile) {
        (Some(path), _) => path.clone(),
        (None, Some(profile)) => profile.snapshot_path(&config_path()),
        (None, None) => {
            return Err(CliError::NoSnapshot {
                path: config_path().display().to_string(),
            });
        }
    };
    let project = global
        .project
        .or_else(|| profile.and_then(|p| p.project))
        .map(EntityId::new);

    tracing::debug!(snapshot = %snapshot.display(), project = ?project, "resolved target");
    Ok(Target { snapshot, project })
}
