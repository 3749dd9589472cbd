//! Starts the real engine child and the UI host thread

use crate::surface::LogSurface;
use anyhow::{Context, Result};
use crossbeam_channel::{never, Receiver, Sender};
use proton_wallet_core::engine::{spawn_engine, EngineCommand};
use proton_wallet_core::price::PriceSource;
use proton_wallet_core::supervisor::{LaunchedProcess, Launcher};
use proton_wallet_core::ui::{spawn_ui_host, UiCommand};
use proton_wallet_core::ShellEvent;
use std::sync::Arc;

pub struct ShellLauncher {
    engine: EngineCommand,
    commands: Option<Receiver<UiCommand>>,
    price: Option<Arc<dyn PriceSource>>,
}

impl ShellLauncher {
    pub fn new(
        engine: EngineCommand,
        commands: Receiver<UiCommand>,
        price: Option<Arc<dyn PriceSource>>,
    ) -> Self {
        Self {
            engine,
            commands: Some(commands),
            price,
        }
    }
}

impl Launcher for ShellLauncher {
    fn launch_engine(&mut self, events: Sender<ShellEvent>) -> Result<LaunchedProcess> {
        Ok(spawn_engine(&self.engine, events)?)
    }

    fn launch_ui(&mut self, events: Sender<ShellEvent>) -> Result<LaunchedProcess> {
        let commands = self.commands.take().unwrap_or_else(never);
        spawn_ui_host(LogSurface::new(), commands, self.price.clone(), events)
            .context("Failed to spawn UI host thread")
    }
}
