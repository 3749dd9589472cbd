//! Process supervisor
//!
//! Owns the lifecycle of the shell: starts the engine, the UI host and the
//! config load, opens the relay once all three report in, routes messages,
//! reacts to window/tray/instance events and sequences shutdown.
//!
//! Everything runs on one event loop. Collaborators (engine reader thread, UI
//! host, instance listener, window/tray glue) only post [`ShellEvent`]s.

use crate::address_book::AddressBook;
use crate::config::{ConfigError, ConfigStore};
use crate::ipc::{ConfigPayload, ProcessRole, RelayMessage};
use crate::readiness::{ReadinessGate, ReadySignal};
use crate::relay::{Endpoint, MessageRelayer};
use crate::shutdown::{ShutdownOutcome, ShutdownRace, STOP_TIMEOUT};
use crate::tray::TrayMenuAction;
use crate::window::{CloseDecision, MainWindow, PlatformPolicy, WindowEvent};
use anyhow::{Context, Result};
use crossbeam_channel::{select, unbounded, Receiver, Sender};
use serde_json::Value;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Everything the supervisor reacts to
#[derive(Debug)]
pub enum ShellEvent {
    /// A process finished loading
    ContentLoaded(ProcessRole),
    /// Background config load finished
    ConfigLoaded(Result<ConfigStore, ConfigError>),
    FromEngine(RelayMessage),
    FromUi(RelayMessage),
    Window(WindowEvent),
    Tray(TrayMenuAction),
    /// A later launch asked this instance to come forward
    SecondInstance,
    /// The application is about to quit
    BeforeQuit,
    /// UI flipped the close-to-tray setting
    CloseToTrayToggle(bool),
    /// UI finished its first render
    FrontReady,
    ProcessExited(ProcessRole),
}

/// Lifecycle phases, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellPhase {
    Starting,
    WaitingReady,
    Running,
    Stopping,
    Terminated,
}

impl ShellPhase {
    fn can_move_to(self, next: ShellPhase) -> bool {
        use ShellPhase::*;
        matches!(
            (self, next),
            (Starting, WaitingReady)
                | (Starting, Terminated)
                | (WaitingReady, Running)
                | (WaitingReady, Terminated)
                | (Running, Stopping)
                | (Running, Terminated)
                | (Stopping, Terminated)
        )
    }
}

/// Something the supervisor can stop
pub trait ProcessHandle: Send {
    /// Stop the process if it is still running and release its resources
    fn terminate(&mut self);
}

/// A started process: where to send it messages and how to stop it
pub struct LaunchedProcess {
    pub endpoint: Box<dyn Endpoint>,
    pub handle: Box<dyn ProcessHandle>,
}

/// Starts the two supervised processes
pub trait Launcher {
    fn launch_engine(&mut self, events: Sender<ShellEvent>) -> Result<LaunchedProcess>;
    fn launch_ui(&mut self, events: Sender<ShellEvent>) -> Result<LaunchedProcess>;
}

#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    pub data_dir: PathBuf,
    pub policy: PlatformPolicy,
    pub stop_timeout: Duration,
}

impl SupervisorOptions {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            policy: PlatformPolicy::current(),
            stop_timeout: STOP_TIMEOUT,
        }
    }
}

/// Channel every collaborator posts into
pub fn shell_channel() -> (Sender<ShellEvent>, Receiver<ShellEvent>) {
    unbounded()
}

enum Step {
    Event(ShellEvent),
    StopTimeout,
    Disconnected,
}

pub struct ProcessSupervisor {
    phase: ShellPhase,
    options: SupervisorOptions,
    gate: ReadinessGate,
    window: Box<dyn MainWindow>,
    config: Option<ConfigStore>,
    engine_endpoint: Option<Box<dyn Endpoint>>,
    ui_endpoint: Option<Box<dyn Endpoint>>,
    engine: Option<Box<dyn ProcessHandle>>,
    ui: Option<Box<dyn ProcessHandle>>,
    relayer: Option<MessageRelayer>,
    shutdown: ShutdownRace,
    force_quit: bool,
    events_tx: Sender<ShellEvent>,
    events: Receiver<ShellEvent>,
}

impl ProcessSupervisor {
    /// Start the config load, the engine and the UI host
    pub fn start(
        options: SupervisorOptions,
        launcher: &mut dyn Launcher,
        window: Box<dyn MainWindow>,
        channel: (Sender<ShellEvent>, Receiver<ShellEvent>),
    ) -> Result<Self> {
        let (events_tx, events) = channel;
        let mut supervisor = Self {
            phase: ShellPhase::Starting,
            options,
            gate: ReadinessGate::new(),
            window,
            config: None,
            engine_endpoint: None,
            ui_endpoint: None,
            engine: None,
            ui: None,
            relayer: None,
            shutdown: ShutdownRace::new(),
            force_quit: false,
            events_tx,
            events,
        };

        spawn_config_load(supervisor.options.data_dir.clone(), supervisor.events_tx.clone())
            .context("Failed to start config load")?;

        let engine = launcher
            .launch_engine(supervisor.events_tx.clone())
            .context("Failed to start engine")?;
        supervisor.engine_endpoint = Some(engine.endpoint);
        supervisor.engine = Some(engine.handle);

        match launcher.launch_ui(supervisor.events_tx.clone()) {
            Ok(ui) => {
                supervisor.ui_endpoint = Some(ui.endpoint);
                supervisor.ui = Some(ui.handle);
            }
            Err(e) => {
                supervisor.stop_processes();
                return Err(e.context("Failed to start UI host"));
            }
        }

        supervisor.transition(ShellPhase::WaitingReady);
        Ok(supervisor)
    }

    /// Sender for window, tray and instance glue
    pub fn event_sender(&self) -> Sender<ShellEvent> {
        self.events_tx.clone()
    }

    pub fn phase(&self) -> ShellPhase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    pub fn force_quit(&self) -> bool {
        self.force_quit
    }

    pub fn config(&self) -> Option<&ConfigStore> {
        self.config.as_ref()
    }

    pub fn window(&self) -> &dyn MainWindow {
        self.window.as_ref()
    }

    /// Run until terminated and return the process exit code
    pub fn run(mut self) -> Result<i32> {
        info!("Supervisor event loop started");

        while self.phase != ShellPhase::Terminated {
            let events = self.events.clone();
            let deadline = self.shutdown.deadline();
            let step = select! {
                recv(events) -> event => match event {
                    Ok(event) => Step::Event(event),
                    Err(_) => Step::Disconnected,
                },
                recv(deadline) -> _ => Step::StopTimeout,
            };

            match step {
                Step::Event(event) => {
                    if let Err(e) = self.handle_event(event) {
                        error!("Supervisor failed: {:#}", e);
                        self.stop_processes();
                        return Err(e);
                    }
                }
                Step::StopTimeout => self.on_stop_timeout(),
                Step::Disconnected => {
                    warn!("Event channel closed, shutting down");
                    self.terminate();
                }
            }
        }

        info!("Supervisor finished");
        Ok(0)
    }

    pub fn handle_event(&mut self, event: ShellEvent) -> Result<()> {
        match event {
            ShellEvent::ContentLoaded(role) => {
                let signal = match role {
                    ProcessRole::Ui => ReadySignal::Frontend,
                    ProcessRole::Engine => ReadySignal::Backend,
                };
                if self.gate.is_set(signal) {
                    debug!("{} reported loaded again", role);
                } else {
                    debug!("{} finished loading", role);
                }
                let opened = self.gate.mark(signal);
                if opened {
                    self.on_ready()?;
                }
            }
            ShellEvent::ConfigLoaded(result) => {
                let store = result.context("Failed to load config")?;
                info!("Config loaded from {}", store.path().display());
                self.config = Some(store);
                if self.gate.mark_config_ready() {
                    self.on_ready()?;
                }
            }
            ShellEvent::FromEngine(message) => self.route_from_engine(message),
            ShellEvent::FromUi(message) => self.route_from_ui(message),
            ShellEvent::Window(WindowEvent::CloseRequested) => {
                let close_to_tray = self.config.as_ref().is_some_and(ConfigStore::close_to_tray);
                match self.options.policy.decide_close(self.force_quit, close_to_tray) {
                    CloseDecision::Hide => self.window.hide(),
                    CloseDecision::Close if self.keeps_running_without_window() => {
                        debug!("Main window closed, application stays open");
                        self.window.hide();
                    }
                    CloseDecision::Close => {
                        debug!("Main window closed");
                        self.request_quit();
                    }
                }
            }
            ShellEvent::Window(WindowEvent::AllClosed) => {
                if self.keeps_running_without_window() {
                    debug!("All windows closed, application stays open");
                } else {
                    self.request_quit();
                }
            }
            ShellEvent::Tray(TrayMenuAction::RestoreWindow)
            | ShellEvent::SecondInstance
            | ShellEvent::FrontReady => self.show_main_window(),
            ShellEvent::Tray(TrayMenuAction::Quit) => {
                info!("Quit selected from tray");
                self.request_quit();
            }
            ShellEvent::BeforeQuit => self.force_quit = true,
            ShellEvent::CloseToTrayToggle(enabled) => self.set_close_to_tray(enabled),
            ShellEvent::ProcessExited(role) => self.on_process_exited(role),
        }
        Ok(())
    }

    fn on_ready(&mut self) -> Result<()> {
        if !self.transition(ShellPhase::Running) {
            return Ok(());
        }

        let engine = self
            .engine_endpoint
            .take()
            .context("Engine endpoint missing at startup")?;
        let ui = self
            .ui_endpoint
            .take()
            .context("UI endpoint missing at startup")?;
        let relayer = MessageRelayer::new(engine, ui).context("Failed to start relay")?;

        if let Some(config) = &self.config {
            relayer.send_to_engine(RelayMessage::Config(ConfigPayload {
                config: config.snapshot(),
                config_path: None,
            }));
            relayer.send_to_ui(RelayMessage::Config(ConfigPayload {
                config: config.snapshot(),
                config_path: Some(config.path().display().to_string()),
            }));
        }
        self.relayer = Some(relayer);
        Ok(())
    }

    fn route_from_engine(&mut self, message: RelayMessage) {
        if message == RelayMessage::BackendStopped {
            self.on_backend_stopped();
            return;
        }
        if !message.is_ui_bound() {
            debug!("Ignoring {} from engine", message.message_type());
            return;
        }
        match &self.relayer {
            Some(relayer) => relayer.send_to_ui(message),
            None => debug!("Dropping {} from engine, relay not open", message.message_type()),
        }
    }

    fn route_from_ui(&mut self, message: RelayMessage) {
        match message {
            RelayMessage::StopRequest => self.request_quit(),
            RelayMessage::Config(payload) => {
                if let Some(config) = self.config.as_mut() {
                    if let Err(e) = config.replace(payload.config.clone()) {
                        warn!("Failed to save config from UI: {}", e);
                    }
                }
                self.forward_to_engine(RelayMessage::Config(payload));
            }
            message if message.is_engine_bound() => self.forward_to_engine(message),
            message => debug!("Ignoring {} from UI", message.message_type()),
        }
    }

    fn forward_to_engine(&self, message: RelayMessage) {
        match &self.relayer {
            Some(relayer) => relayer.send_to_engine(message),
            None => debug!("Dropping {} from UI, relay not open", message.message_type()),
        }
    }

    /// Platforms with the close-to-tray convention only quit on an explicit quit
    fn keeps_running_without_window(&self) -> bool {
        self.options.policy.close_hides_window && !self.force_quit
    }

    fn show_main_window(&mut self) {
        self.window.show();
        self.window.focus();
    }

    fn set_close_to_tray(&mut self, enabled: bool) {
        match self.config.as_mut() {
            Some(config) => {
                if let Err(e) = config.set("closeToTray", Value::Bool(enabled)) {
                    warn!("Failed to save closeToTray: {}", e);
                }
            }
            None => debug!("closeToTray toggled before config loaded, ignoring"),
        }
    }

    /// Quit path shared by the tray, the UI and window-all-closed
    fn request_quit(&mut self) {
        self.force_quit = true;
        match self.phase {
            ShellPhase::Starting | ShellPhase::WaitingReady => {
                info!("Quit requested before startup finished");
                self.terminate();
            }
            ShellPhase::Running => {
                if !self.transition(ShellPhase::Stopping) {
                    return;
                }
                if let Some(relayer) = &self.relayer {
                    relayer.send_to_engine(RelayMessage::StopRequest);
                }
                self.shutdown.arm(self.options.stop_timeout);
                info!(
                    "Stop requested, waiting up to {:?} for the engine",
                    self.options.stop_timeout
                );
            }
            ShellPhase::Stopping => debug!("Already stopping"),
            ShellPhase::Terminated => debug!("Quit after termination ignored"),
        }
    }

    fn on_backend_stopped(&mut self) {
        match self.phase {
            ShellPhase::Stopping => {
                if self.shutdown.resolve(ShutdownOutcome::Acknowledged).is_some() {
                    info!("Engine acknowledged stop");
                    self.terminate();
                }
            }
            ShellPhase::Running => {
                info!("Engine stopped on its own");
                self.terminate();
            }
            phase => debug!("backendStopped ignored in {:?}", phase),
        }
    }

    fn on_stop_timeout(&mut self) {
        if self.shutdown.resolve(ShutdownOutcome::TimedOut).is_some() {
            warn!(
                "Engine did not acknowledge stop within {:?}, forcing exit",
                self.options.stop_timeout
            );
            self.terminate();
        }
    }

    fn on_process_exited(&mut self, role: ProcessRole) {
        match (role, self.phase) {
            (_, ShellPhase::Terminated) => {}
            (ProcessRole::Engine, ShellPhase::Stopping) => {
                if self.shutdown.resolve(ShutdownOutcome::Acknowledged).is_some() {
                    info!("Engine exited while stopping");
                    self.terminate();
                }
            }
            (ProcessRole::Engine, _) => {
                warn!("Engine exited unexpectedly");
                self.terminate();
            }
            (ProcessRole::Ui, _) => {
                warn!("UI host exited");
                self.request_quit();
            }
        }
    }

    fn transition(&mut self, next: ShellPhase) -> bool {
        if !self.phase.can_move_to(next) {
            warn!("Rejected phase change {:?} -> {:?}", self.phase, next);
            return false;
        }
        debug!("Phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
        true
    }

    fn terminate(&mut self) {
        if self.transition(ShellPhase::Terminated) {
            self.stop_processes();
        }
    }

    fn stop_processes(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.terminate();
        }
        if let Some(relayer) = self.relayer.take() {
            relayer.shutdown();
        }
        self.engine_endpoint.take();
        self.ui_endpoint.take();
        if let Some(mut ui) = self.ui.take() {
            ui.terminate();
        }
    }
}

fn spawn_config_load(data_dir: PathBuf, events: Sender<ShellEvent>) -> std::io::Result<()> {
    thread::Builder::new()
        .name("config-load".into())
        .spawn(move || {
            let result = ConfigStore::load_from_dir(&data_dir);
            match AddressBook::load_from_dir(&data_dir) {
                Ok(book) => debug!("Address book has {} entries", book.len()),
                Err(e) => warn!("Failed to load address book: {}", e),
            }
            let _ = events.send(ShellEvent::ConfigLoaded(result));
        })
        .map(|_| ())
}
