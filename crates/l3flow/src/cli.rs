//! Command-line surface.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use l3flow_core::FallbackAction;

/// Reactive L3 flow installer for ONOS-style SDN controllers.
#[derive(Debug, Parser)]
#[command(
    name = "l3flow",
    version,
    about = "Turn packet-in events into per-switch forwarding rules",
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

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "L3FLOW_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Controller profile to use
    #[arg(long, short = 'p', env = "L3FLOW_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller URL (overrides profile)
    #[arg(long, short = 'c', env = "L3FLOW_CONTROLLER", global = true)]
    pub controller: Option<String>,

    /// Basic-auth username (overrides profile)
    #[arg(long, short = 'u', env = "L3FLOW_USERNAME", global = true)]
    pub username: Option<String>,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "L3FLOW_INSECURE", global = true)]
    pub insecure: bool,

    /// Per-request timeout in seconds
    #[arg(long, env = "L3FLOW_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the reactive loop until interrupted
    Run(RunArgs),

    /// Remove all flow rules from devices
    Clear(ClearArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Action for packets whose destination is not known
    #[arg(long, value_enum)]
    pub fallback: Option<FallbackArg>,

    /// Keep this controller address reachable with a permanent rule
    #[arg(long)]
    pub controller_ip: Option<Ipv4Addr>,

    /// Refresh the host cache every N poll cycles
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub refresh_every: Option<u32>,

    /// Print the final counters as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FallbackArg {
    Controller,
    Flood,
}

impl From<FallbackArg> for FallbackAction {
    fn from(arg: FallbackArg) -> Self {
        match arg {
            FallbackArg::Controller => FallbackAction::Controller,
            FallbackArg::Flood => FallbackAction::Flood,
        }
    }
}

#[derive(Debug, Args)]
pub struct ClearArgs {
    /// Device to clear (repeatable); every known device when omitted
    #[arg(long = "device", short = 'd', value_name = "DEVICE_ID")]
    pub devices: Vec<String>,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: Shell,
}
