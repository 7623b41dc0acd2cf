use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use console::Term;

/// Install the Ctrl+C handler and return the flag it raises.
///
/// The first Ctrl+C asks the running pass to stop at the next page or record
/// boundary. A second one exits immediately with status 130.
pub(crate) fn install_stop_flag() -> Arc<AtomicBool> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Could not install Ctrl+C handler: {}", e);
            return;
        }

        let is_tty = Term::stdout().is_term();
        if is_tty {
            eprintln!("\n\nStop requested, finishing the current step and saving...");
            eprintln!("Press Ctrl+C again to force quit.");
        } else {
            tracing::warn!("Stop requested, finishing the current step");
        }

        flag.store(true, Ordering::SeqCst);

        if tokio::signal::ctrl_c().await.is_ok() {
            if is_tty {
                eprintln!("Force quit!");
            }
            std::process::exit(130);
        }
    });

    stop
}
