//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use netweave_config::ConfigError;
use netweave_core::{CoreError, ErrorKind, SubmitFailure};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Rejections ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(netweave::validation))]
    Validation { field: String, reason: String },

    #[error("Unknown subnet mask '{value}'")]
    #[diagnostic(
        code(netweave::unknown_mask),
        help("Masks must be a prefix length between 8 and 30 or its dotted form.\nRun: netweave subnet list")
    )]
    UnknownMask { value: String },

    #[error("Interface allocation failed: {reason}")]
    #[diagnostic(code(netweave::allocation))]
    Allocation { reason: String },

    #[error("Invalid path: {message}")]
    #[diagnostic(
        code(netweave::invalid_path),
        help("Run: netweave intent next-hops <SOURCE> ... to see which nodes can follow")
    )]
    InvalidPath { kind: ErrorKind, message: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(netweave::not_found),
        help("Run: netweave {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Persistence ──────────────────────────────────────────────────

    #[error("Snapshot update failed: {message}")]
    #[diagnostic(
        code(netweave::submit_failed),
        help("{rolled_back} write(s) were rolled back, {stranded} left applied.\n{detail}")
    )]
    Submit {
        message: String,
        rolled_back: usize,
        stranded: usize,
        detail: String,
    },

    #[error("Backend rejected the operation: {message}")]
    #[diagnostic(code(netweave::backend))]
    Backend { message: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("No topology snapshot configured")]
    #[diagnostic(
        code(netweave::no_snapshot),
        help(
            "Pass --snapshot <FILE>, set NETWEAVE_SNAPSHOT, or create a profile with:\n\
             netweave --snapshot <FILE> config init\n\
             Config file: {path}"
        )
    )]
    NoSnapshot { path: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(netweave::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: netweave --profile {name} --snapshot <FILE> config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(netweave::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Confirmation required: {action}")]
    #[diagnostic(
        code(netweave::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON in {path}: {source}")]
    #[diagnostic(code(netweave::json), help("Check the file contents and try again."))]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid YAML in {path}: {source}")]
    #[diagnostic(code(netweave::yaml), help("Check the file contents and try again."))]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(netweave::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Allocation { .. } | Self::InvalidPath { .. } | Self::Submit { .. } => {
                exit_code::CONFLICT
            }
            Self::Validation { .. }
            | Self::UnknownMask { .. }
            | Self::NoSnapshot { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        match err {
            CoreError::Validation { field, reason } => CliError::Validation { field, reason },

            CoreError::UnknownMask { value } => CliError::UnknownMask { value },

            CoreError::EmptyInterface => CliError::Validation {
                field: "ip".into(),
                reason: "a router interface needs at least one address (pass --ip ADDRESS/MASK)"
                    .into(),
            },

            CoreError::Allocation { reason } => CliError::Allocation { reason },

            CoreError::EmptyChain { .. }
            | CoreError::DuplicateNode { .. }
            | CoreError::UnreachableHop { .. } => CliError::InvalidPath { kind, message },

            CoreError::Backend { message: reason } => CliError::Backend { message: reason },
        }
    }
}

impl From<SubmitFailure> for CliError {
    fn from(failure: SubmitFailure) -> Self {
        let detail = failure
            .stranded
            .iter()
            .map(|cmd| format!("needs manual cleanup: {} {}", cmd.verb(), cmd.target()))
            .collect::<Vec<_>>()
            .join("\n");
        CliError::Submit {
            message: failure.error.to_string(),
            rolled_back: failure.rolled_back.len(),
            stranded: failure.stranded.len(),
            detail,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(Box::new(other)),
        }
    }
}
