use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use devmux_client::{ClientConfig, NotificationListener};
use tracing::info;

use crate::cmd::WatchArgs;
use crate::exit::{client_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_event, OutputFormat};

pub fn run(args: WatchArgs, config: ClientConfig, format: OutputFormat) -> CliResult<i32> {
    let events = NotificationListener::new(config)
        .subscribe()
        .map_err(|err| client_error("subscribe failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    info!("watching for device events");

    let mut seen = 0usize;
    for event in events {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        let event = event.map_err(|err| client_error("notification stream failed", err))?;
        print_event(&event, format);

        seen = seen.saturating_add(1);
        if let Some(count) = args.count {
            if seen >= count {
                break;
            }
        }
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
