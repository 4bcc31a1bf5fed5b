use clap::{Args, Subcommand};

use devmux_client::ClientConfig;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod list;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enumerate attached devices and their names.
    List(ListArgs),
    /// Stream attach/detach notifications until interrupted.
    Watch(WatchArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, config: ClientConfig, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::List(args) => list::run(args, config, format),
        Command::Watch(args) => watch::run(args, config, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show devices attached over USB.
    #[arg(long)]
    pub usb: bool,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Exit after printing N events.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
