//! ProtonWallet.Shell - Supervising Process
//!
//! This process manages:
//! - Single instance lock (a second launch focuses this one and exits)
//! - Engine child process (JSON lines over stdio)
//! - UI host thread (session cache, 100 ms refresh)
//! - Startup readiness, message relay and the quit sequence
//!
//! Window, tray and UI events come from the stdin console unless `--headless`.

mod cli;
mod console;
mod crash;
mod launcher;
mod logging;
mod surface;

use anyhow::{Context, Result};
use crossbeam_channel::unbounded;
use proton_wallet_core::config::{ensure_directories, get_data_directory};
use proton_wallet_core::instance::{self, InstanceLock};
use proton_wallet_core::price::{CoinGeckoSource, PriceSource};
use proton_wallet_core::supervisor::{shell_channel, SupervisorOptions};
use proton_wallet_core::window::HeadlessWindow;
use proton_wallet_core::{ProcessSupervisor, ShellEvent};
use std::sync::Arc;

use crate::crash::ErrorDialog;

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("Fatal: {:#}", e);
            crash::StderrDialog.show_error(crash::ERROR_TITLE, &crash::report_text(&format!("{e:#}")));
            1
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let flags = cli::parse_args(std::env::args().skip(1))?;

    let data_dir = match &flags.data_dir {
        Some(dir) => {
            ensure_directories(dir)?;
            dir.clone()
        }
        None => get_data_directory()?,
    };

    logging::init_logging(&data_dir)?;
    crash::install_panic_hook(Arc::new(crash::StderrDialog));

    tracing::info!("ProtonWallet.Shell starting...");
    tracing::info!("Startup flags: {:?}", flags);

    let (events_tx, events_rx) = shell_channel();

    let activate = events_tx.clone();
    let _instance = match instance::acquire(instance::instance_port(), move || {
        let _ = activate.send(ShellEvent::SecondInstance);
    })? {
        InstanceLock::Primary(guard) => guard,
        InstanceLock::Secondary => return Ok(0),
    };

    let engine = flags.engine_command()?;
    let price: Option<Arc<dyn PriceSource>> = match CoinGeckoSource::new() {
        Ok(source) => Some(Arc::new(source)),
        Err(e) => {
            tracing::warn!("Fiat prices disabled: {}", e);
            None
        }
    };

    let (commands_tx, commands_rx) = unbounded();
    let mut launcher = launcher::ShellLauncher::new(engine, commands_rx, price);

    let supervisor = ProcessSupervisor::start(
        SupervisorOptions::new(data_dir),
        &mut launcher,
        Box::new(HeadlessWindow::new()),
        (events_tx, events_rx),
    )?;

    if !flags.headless {
        console::spawn_console(supervisor.event_sender(), commands_tx)
            .context("Failed to start console")?;
    }

    supervisor.run()
}
