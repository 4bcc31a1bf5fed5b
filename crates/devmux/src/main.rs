mod cmd;
mod exit;
mod logging;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use devmux_client::{ClientConfig, DEFAULT_SOCKET_PATH};

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "devmux", version, about = "Device multiplexer client CLI")]
struct Cli {
    /// Daemon socket path.
    #[arg(
        long,
        value_name = "PATH",
        env = "DEVMUX_SOCKET",
        default_value = DEFAULT_SOCKET_PATH,
        global = true
    )]
    socket: PathBuf,

    /// I/O timeout in seconds for daemon traffic (0 disables).
    #[arg(long, value_name = "SECS", default_value_t = 0, global = true)]
    timeout: u64,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            socket_path: self.socket.clone(),
            io_timeout: match self.timeout {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            ..ClientConfig::default()
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let config = cli.client_config();
    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);

    match cmd::run(cli.command, config, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_list_with_usb_filter() {
        let cli = Cli::try_parse_from(["devmux", "list", "--usb"]).expect("list args should parse");
        match cli.command {
            Command::List(args) => assert!(args.usb),
            other => panic!("wrong command: {other:?}"),
        }
    }

    #[test]
    fn parses_watch_with_count() {
        let cli = Cli::try_parse_from(["devmux", "watch", "--count", "3"])
            .expect("watch args should parse");
        match cli.command {
            Command::Watch(args) => assert_eq!(args.count, Some(3)),
            other => panic!("wrong command: {other:?}"),
        }
    }

    #[test]
    fn socket_flag_overrides_the_default() {
        let cli = Cli::try_parse_from(["devmux", "--socket", "/tmp/test-daemon.sock", "list"])
            .expect("socket flag should parse");
        assert_eq!(cli.socket, PathBuf::from("/tmp/test-daemon.sock"));
    }

    #[test]
    fn timeout_zero_disables_io_timeout() {
        let cli = Cli::try_parse_from(["devmux", "list"]).expect("defaults should parse");
        assert_eq!(cli.client_config().io_timeout, None);

        let cli = Cli::try_parse_from(["devmux", "--timeout", "5", "list"])
            .expect("timeout should parse");
        assert_eq!(
            cli.client_config().io_timeout,
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn rejects_unknown_format() {
        let err = Cli::try_parse_from(["devmux", "--format", "xml", "list"])
            .expect_err("unknown format should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
