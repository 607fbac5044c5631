mod args;
mod rank;

use clap::Parser;
use log::{info, warn};
use snafu::ErrorCompat;
use std::error::Error;

use crate::args::Args;
use crate::rank::shutdown::{wait_for_signal, Shutdown};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let (trigger, shutdown) = Shutdown::channel();
    tokio::spawn(async move {
        wait_for_signal().await;
        warn!("Shutdown requested, cancelling the run");
        let _ = trigger.send(true);
    });

    match rank::run_command(&args, &shutdown).await {
        Ok(output) => {
            info!("Run completed");
            print!("{}", output);
        }
        Err(e) => {
            warn!("Error occured {:?}", e);
            eprintln!("An error occured: {}", e);
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            if let Some(bt) = ErrorCompat::backtrace(&e) {
                eprintln!("trace: {}", bt);
            }
            std::process::exit(1);
        }
    }
}
