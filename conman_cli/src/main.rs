mod ui;

use clap::Parser;
use conman_core::utils::logging::{default_log_file, init_logging};
use log::info;

use crate::ui::cli;

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();
    let log_file = match (&args.log_file, args.log_to_file) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => default_log_file(),
        (None, false) => None,
    };
    if let Err(e) = init_logging(log_file.as_deref()) {
        eprintln!("Logging disabled: {e}");
    }
    info!("Application started");

    if let Err(e) = cli::run_cli(args).await {
        eprintln!("conman: {e:#}");
        std::process::exit(1);
    }
}
