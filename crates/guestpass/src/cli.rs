//! Clap derive structures for the `guestpass` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// guestpass -- rotate a captive-portal guest password on a schedule
#[derive(Debug, Parser)]
#[command(
    name = "guestpass",
    version,
    about = "Rotate a guest Wi-Fi password and publish it with a join code",
    long_about = "Rotates the password of one guest account on the captive-portal controller,\n\
        then writes the new credential and a scannable Wi-Fi join code for a display page.",
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
    /// Path to the configuration file
    #[arg(long, env = "GUESTPASS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one rotation attempt now
    Rotate,

    /// Rotate on the configured schedule until stopped
    Run,

    /// Validate configuration and credentials without contacting the controller
    Check,

    /// Store the controller API key in the configured secret store.
    ///
    /// The key secret is taken from GUESTPASS_KEY_SECRET, else prompted for
    /// on a terminal, else read as the first line of stdin.
    SetKey(SetKeyArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rotate => "rotate",
            Self::Run => "run",
            Self::Check => "check",
            Self::SetKey(_) => "set-key",
        }
    }
}

#[derive(Debug, Args)]
pub struct SetKeyArgs {
    /// API key identifier
    #[arg(long)]
    pub key_id: String,
}
