//! Clap derive structures for the `netweave` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// netweave -- offline consistency checks for network topology inventories
#[derive(Debug, Parser)]
#[command(
    name = "netweave",
    version,
    about = "Check and plan network topology changes from the command line",
    long_about = "Validates routers, switches, links and intents against a topology \
        snapshot and prints the persistence commands a change needs.\n\n\
        Switch-to-switch links are planned as mirrored pairs. Nothing is written \
        unless --apply is given.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Topology snapshot file, JSON or YAML (overrides profile)
    #[arg(long, short = 'f', env = "NETWEAVE_SNAPSHOT", global = true)]
    pub snapshot: Option<PathBuf>,

    /// Configuration profile to use
    #[arg(long, env = "NETWEAVE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Restrict to one project (overrides profile)
    #[arg(long, short = 'p', env = "NETWEAVE_PROJECT", global = true)]
    pub project: Option<u64>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "NETWEAVE_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: from config, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

impl GlobalOpts {
    pub fn output_format(&self) -> &OutputFormat {
        self.output.as_ref().unwrap_or(&OutputFormat::Table)
    }

    pub fn color_mode(&self) -> &ColorMode {
        self.color.as_ref().unwrap_or(&ColorMode::Auto)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Look up subnet masks in the built-in prefix table
    #[command(alias = "sn")]
    Subnet(SubnetArgs),

    /// Inspect and plan router, switch and host links
    #[command(alias = "link", alias = "l")]
    Links(LinksArgs),

    /// Router interfaces, configuration checks and link planning
    #[command(alias = "r")]
    Router(RouterArgs),

    /// Check BGP peering configuration
    Bgp(BgpArgs),

    /// Validate custom intent paths and explore the adjacency
    #[command(alias = "i")]
    Intent(IntentArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arg Groups ────────────────────────────────────────────────

/// Connection kinds as typed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LinkKind {
    /// Router to switch
    RouterSwitch,
    /// Switch to switch (planned as a mirrored pair)
    SwitchSwitch,
    /// Switch to host
    SwitchHost,
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Write the planned commands to the snapshot file
    #[arg(long)]
    pub apply: bool,
}

#[derive(Debug, Args)]
pub struct AddressArgs {
    /// Interface address as ADDRESS/MASK (repeatable), e.g. 10.0.0.1/30
    #[arg(long = "ip", value_name = "ADDRESS/MASK")]
    pub ips: Vec<String>,

    /// Peer address on the far side of the link
    #[arg(long)]
    pub peer: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SUBNET
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SubnetArgs {
    #[command(subcommand)]
    pub command: SubnetCommand,
}

#[derive(Debug, Subcommand)]
pub enum SubnetCommand {
    /// List every prefix length with its dotted mask
    #[command(alias = "ls")]
    List,

    /// Translate a prefix length into its mask, or a mask into its prefix
    Lookup {
        /// Prefix (`24`, `/24`) or dotted mask (`255.255.255.0`)
        value: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LINKS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LinksArgs {
    #[command(subcommand)]
    pub command: LinksCommand,
}

#[derive(Debug, Subcommand)]
pub enum LinksCommand {
    /// List stored links
    #[command(alias = "ls")]
    List {
        /// Only show links of this kind
        #[arg(long)]
        kind: Option<LinkKind>,
    },

    /// Plan a new link between two devices
    PlanCreate {
        /// Link kind
        kind: LinkKind,

        /// First endpoint: router or switch (name or id)
        a: String,

        /// Second endpoint: switch or host (name or id)
        b: String,

        #[command(flatten)]
        addresses: AddressArgs,

        #[command(flatten)]
        apply: ApplyArgs,
    },

    /// Plan an edit of a stored link
    PlanUpdate {
        /// Link key as printed by `links list` (kind/project/a/b)
        key: String,

        /// Move the first endpoint to this device
        #[arg(long)]
        src: Option<String>,

        /// Move the second endpoint to this device
        #[arg(long)]
        dst: Option<String>,

        #[command(flatten)]
        addresses: AddressArgs,

        #[command(flatten)]
        apply: ApplyArgs,
    },

    /// Plan the removal of a stored link (and its mirror)
    PlanDelete {
        /// Link key as printed by `links list` (kind/project/a/b)
        key: String,

        #[command(flatten)]
        apply: ApplyArgs,
    },

    /// Report switch links that break the mirroring rules
    Audit {
        /// Print the commands that would restore symmetry
        #[arg(long)]
        repair: bool,

        /// Write the repair commands to the snapshot file
        #[arg(long, requires = "repair")]
        apply: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ROUTER
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RouterArgs {
    #[command(subcommand)]
    pub command: RouterCommand,
}

#[derive(Debug, Subcommand)]
pub enum RouterCommand {
    /// List the interfaces a router has through its switch links
    Interfaces {
        /// Router name or id
        router: String,
    },

    /// Check a router's users and static routes
    CheckConfig {
        /// Router name or id
        router: String,
    },

    /// Plan a router-switch link (an edit when the two are already linked)
    PlanLink {
        /// Router name or id
        router: String,

        /// Switch name or id
        switch: String,

        #[command(flatten)]
        addresses: AddressArgs,

        #[command(flatten)]
        apply: ApplyArgs,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  BGP
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct BgpArgs {
    #[command(subcommand)]
    pub command: BgpCommand,
}

#[derive(Debug, Subcommand)]
pub enum BgpCommand {
    /// Check a BGP configuration and plan its save
    Check {
        /// Router name or id (checks its stored configuration)
        #[arg(required_unless_present = "from_file")]
        router: Option<String>,

        /// Check this configuration file (JSON or YAML) instead
        #[arg(long, conflicts_with = "router")]
        from_file: Option<PathBuf>,

        #[command(flatten)]
        apply: ApplyArgs,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  INTENT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct IntentArgs {
    #[command(subcommand)]
    pub command: IntentCommand,
}

#[derive(Debug, Subcommand)]
pub enum IntentCommand {
    /// Validate a node chain, or a full intent from a file
    Check {
        /// Nodes from source to destination
        #[arg(required_unless_present = "from_file", num_args = 1..)]
        nodes: Vec<String>,

        /// Validate this intent file (JSON or YAML) and plan its save
        #[arg(long, conflicts_with = "nodes")]
        from_file: Option<PathBuf>,

        #[command(flatten)]
        apply: ApplyArgs,
    },

    /// Nodes that can extend a partial chain
    NextHops {
        /// Chain so far, starting at the source
        #[arg(required = true, num_args = 1..)]
        nodes: Vec<String>,
    },

    /// Destinations reachable from the end of a partial chain
    Destinations {
        /// Chain so far, starting at the source
        #[arg(required = true, num_args = 1..)]
        nodes: Vec<String>,
    },

    /// Enumerate loop-free paths between two nodes
    Paths {
        /// Source node
        source: String,

        /// Destination node
        destination: String,

        /// Longest path to search, in hops [default: from config]
        #[arg(long)]
        max_hops: Option<usize>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or extend the config file with a profile
    ///
    /// Uses --snapshot, --profile and --project when given and prompts
    /// for the snapshot path otherwise.
    Init,

    /// Show the loaded configuration
    Show,

    /// Print the config file path
    Path,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
