use devmux_client::{ClientConfig, DeviceEnumerator, EnumerateMode};
use tracing::debug;

use crate::cmd::ListArgs;
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_devices, OutputFormat};

pub fn run(args: ListArgs, config: ClientConfig, format: OutputFormat) -> CliResult<i32> {
    let mode = if args.usb {
        EnumerateMode::Usb
    } else {
        EnumerateMode::All
    };
    debug!(?mode, socket = ?config.socket_path, "listing devices");

    let devices = DeviceEnumerator::new(config)
        .enumerate(mode)
        .map_err(|err| client_error("enumeration failed", err))?;

    print_devices(&devices, format);
    Ok(SUCCESS)
}
