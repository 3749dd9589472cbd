//! UI host
//!
//! The UI side of the shell. Owns the [`SessionStateCache`], applies relayed
//! engine messages to it, refreshes the [`UiSurface`] every 100 ms and turns
//! the surface's commands into relay requests or shell events.

use crate::config::ConfigRecord;
use crate::ipc::{ConfigPayload, ProcessRole, RelayMessage, SaveWalletRequest};
use crate::price::{FiatPriceFeed, PriceSource, PriceUpdate, PRICE_REFRESH_INTERVAL};
use crate::relay::ChannelEndpoint;
use crate::session::SessionStateCache;
use crate::supervisor::{LaunchedProcess, ProcessHandle, ShellEvent};
use crossbeam_channel::{never, select, tick, unbounded, Receiver, Sender};
use serde_json::Value;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How often the surface is refreshed from the cache
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One-off things the surface should tell the user about
#[derive(Debug, Clone, PartialEq)]
pub enum UiNotice {
    ConfigChanged,
    WalletSaved(bool),
    WalletActive(bool),
    TransactionSent { hash: Option<String> },
    TransactionFailed { message: String },
}

/// Named events the surface emits
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    /// First render done
    FrontReady,
    SetCloseToTray(bool),
    /// Change one setting
    UpdateConfig { key: String, value: Value },
    OpenWallet(Option<String>),
    SaveWalletAs { save_path: String, notify: bool },
    /// Save the wallet and quit
    Quit,
}

/// Whatever draws the wallet; reads the cache on every poll
pub trait UiSurface: Send {
    fn refresh(&mut self, session: &SessionStateCache, config: &ConfigRecord);
    fn notify(&mut self, notice: UiNotice);
}

enum Step {
    Inbound(RelayMessage),
    Command(UiCommand),
    CommandsClosed,
    Refresh,
    FetchPrice,
    Price(PriceUpdate),
    Stop,
}

pub struct UiHost<S: UiSurface> {
    session: SessionStateCache,
    surface: S,
    config: ConfigRecord,
    config_path: Option<String>,
    wallet_active: bool,
    price: Option<FiatPriceFeed>,
    shell: Sender<ShellEvent>,
}

impl<S: UiSurface> UiHost<S> {
    pub fn new(surface: S, shell: Sender<ShellEvent>, price: Option<Arc<dyn PriceSource>>) -> Self {
        Self {
            session: SessionStateCache::new(),
            surface,
            config: ConfigRecord::new(),
            config_path: None,
            wallet_active: false,
            price: price.map(FiatPriceFeed::new),
            shell,
        }
    }

    pub fn session(&self) -> &SessionStateCache {
        &self.session
    }

    pub fn config(&self) -> &ConfigRecord {
        &self.config
    }

    pub fn config_path(&self) -> Option<&str> {
        self.config_path.as_deref()
    }

    pub fn wallet_active(&self) -> bool {
        self.wallet_active
    }

    /// Event loop; returns when `inbound` closes or `stop` is dropped
    pub fn run(
        mut self,
        inbound: Receiver<RelayMessage>,
        commands: Receiver<UiCommand>,
        stop: Receiver<()>,
    ) {
        let _ = self.shell.send(ShellEvent::ContentLoaded(ProcessRole::Ui));
        info!("UI host running");

        let refresh = tick(POLL_INTERVAL);
        let price_refresh = match self.price {
            Some(_) => tick(PRICE_REFRESH_INTERVAL),
            None => never(),
        };
        let price_updates = match &self.price {
            Some(feed) => feed.updates(),
            None => never(),
        };
        let mut commands = commands;

        loop {
            let step = select! {
                recv(inbound) -> message => match message {
                    Ok(message) => Step::Inbound(message),
                    Err(_) => Step::Stop,
                },
                recv(commands) -> command => match command {
                    Ok(command) => Step::Command(command),
                    Err(_) => Step::CommandsClosed,
                },
                recv(refresh) -> _ => Step::Refresh,
                recv(price_refresh) -> _ => Step::FetchPrice,
                recv(price_updates) -> update => match update {
                    Ok(update) => Step::Price(update),
                    Err(_) => Step::Stop,
                },
                recv(stop) -> _ => Step::Stop,
            };

            match step {
                Step::Inbound(message) => self.apply(message),
                Step::Command(command) => self.handle_command(command),
                Step::CommandsClosed => commands = never(),
                Step::Refresh => self.surface.refresh(&self.session, &self.config),
                Step::FetchPrice => self.request_price(),
                Step::Price(update) => {
                    if let Some(feed) = self.price.as_mut() {
                        feed.apply(update, &mut self.session);
                    }
                }
                Step::Stop => break,
            }
        }
        info!("UI host stopped");
    }

    /// Apply one relayed message
    pub fn apply(&mut self, message: RelayMessage) {
        match message {
            RelayMessage::Config(payload) => {
                let incoming_fiat = payload.config.get("selectedFiat").and_then(Value::as_str);
                let fiat_changed = self.selected_fiat() != incoming_fiat;
                self.config = payload.config;
                if payload.config_path.is_some() {
                    self.config_path = payload.config_path;
                }
                self.surface.notify(UiNotice::ConfigChanged);
                if fiat_changed || self.session.fiat_price().is_none() {
                    self.request_price();
                }
            }
            RelayMessage::SaveWalletResponse(saved) => self.surface.notify(UiNotice::WalletSaved(saved)),
            RelayMessage::WalletActiveStatus(active) => {
                self.wallet_active = active;
                self.surface.notify(UiNotice::WalletActive(active));
            }
            RelayMessage::PrimaryAddress(address) => self.session.set_primary_address(address),
            RelayMessage::TransactionList(transactions) => self.session.set_transactions(transactions),
            RelayMessage::SyncStatus(status) => self.session.set_sync_status(status),
            RelayMessage::Balance(balance) => self.session.set_balance(balance),
            RelayMessage::NodeFee(fee) => self.session.set_node_fee(fee),
            RelayMessage::SendTransactionResponse(response) => {
                let notice = if response.is_success() {
                    UiNotice::TransactionSent {
                        hash: response.hash.clone(),
                    }
                } else {
                    UiNotice::TransactionFailed {
                        message: response
                            .error_message()
                            .unwrap_or("Transaction failed")
                            .to_string(),
                    }
                };
                self.surface.notify(notice);
            }
            RelayMessage::BackendLogLine(line) => self.session.append_log_line(line),
            other => debug!("UI ignoring {}", other.message_type()),
        }
    }

    pub fn handle_command(&mut self, command: UiCommand) {
        let event = match command {
            UiCommand::FrontReady => ShellEvent::FrontReady,
            UiCommand::SetCloseToTray(enabled) => {
                self.config.insert("closeToTray".into(), Value::Bool(enabled));
                ShellEvent::CloseToTrayToggle(enabled)
            }
            UiCommand::UpdateConfig { key, value } => {
                let fiat_changed = key == "selectedFiat";
                self.config.insert(key, value);
                if fiat_changed {
                    self.request_price();
                }
                ShellEvent::FromUi(RelayMessage::Config(ConfigPayload {
                    config: self.config.clone(),
                    config_path: None,
                }))
            }
            UiCommand::OpenWallet(path) => ShellEvent::FromUi(RelayMessage::OpenNewWallet(path)),
            UiCommand::SaveWalletAs { save_path, notify } => {
                ShellEvent::FromUi(RelayMessage::SaveWalletAs(SaveWalletRequest { notify, save_path }))
            }
            UiCommand::Quit => ShellEvent::FromUi(RelayMessage::StopRequest),
        };
        if self.shell.send(event).is_err() {
            debug!("Supervisor gone, UI command dropped");
        }
    }

    fn selected_fiat(&self) -> Option<&str> {
        self.config.get("selectedFiat").and_then(Value::as_str)
    }

    fn request_price(&mut self) {
        let fiat = self.selected_fiat().unwrap_or("usd").to_string();
        if let Some(feed) = self.price.as_mut() {
            feed.request(&fiat);
        }
    }
}

/// Handle the supervisor uses to stop the UI host
pub struct UiHostHandle {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ProcessHandle for UiHostHandle {
    fn terminate(&mut self) {
        self.stop.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("UI host thread panicked");
            }
        }
    }
}

/// Start a UI host thread. `commands` carries the surface's events.
pub fn spawn_ui_host<S>(
    surface: S,
    commands: Receiver<UiCommand>,
    price: Option<Arc<dyn PriceSource>>,
    shell: Sender<ShellEvent>,
) -> std::io::Result<LaunchedProcess>
where
    S: UiSurface + 'static,
{
    let (inbound_tx, inbound) = unbounded();
    let (stop_tx, stop) = unbounded();
    let exit_events = shell.clone();
    let host = UiHost::new(surface, shell, price);

    let thread = thread::Builder::new().name("ui-host".into()).spawn(move || {
        host.run(inbound, commands, stop);
        let _ = exit_events.send(ShellEvent::ProcessExited(ProcessRole::Ui));
    })?;

    Ok(LaunchedProcess {
        endpoint: Box::new(ChannelEndpoint::new(ProcessRole::Ui, inbound_tx)),
        handle: Box::new(UiHostHandle {
            stop: Some(stop_tx),
            thread: Some(thread),
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::SendTransactionResponse;
    use crate::types::{Balance, SyncStatus, Transaction};
    use parking_lot::Mutex;

    #[derive(Clone, Default)]
    struct RecordingSurface {
        notices: Arc<Mutex<Vec<UiNotice>>>,
        refreshes: Arc<Mutex<Vec<f64>>>,
    }

    impl UiSurface for RecordingSurface {
        fn refresh(&mut self, session: &SessionStateCache, _config: &ConfigRecord) {
            self.refreshes.lock().push(session.sync_percentage());
        }

        fn notify(&mut self, notice: UiNotice) {
            self.notices.lock().push(notice);
        }
    }

    fn host() -> (UiHost<RecordingSurface>, RecordingSurface, Receiver<ShellEvent>) {
        let surface = RecordingSurface::default();
        let (tx, rx) = unbounded();
        (UiHost::new(surface.clone(), tx, None), surface, rx)
    }

    #[test]
    fn test_engine_messages_update_cache() {
        let (mut host, _surface, _events) = host();
        host.apply(RelayMessage::SyncStatus(SyncStatus::new(1000, 1000, 1010)));
        host.apply(RelayMessage::Balance(Balance::new(12345, 100)));
        host.apply(RelayMessage::TransactionList(vec![Transaction::new(0, "aa", -5)]));
        host.apply(RelayMessage::NodeFee(10));
        host.apply(RelayMessage::PrimaryAddress("TRTLxyz".into()));
        host.apply(RelayMessage::BackendLogLine("synced block".into()));

        let session = host.session();
        assert_eq!(session.sync_percentage(), 99.01);
        assert_eq!(session.unlocked_balance(), 12345);
        assert_eq!(session.locked_balance(), 100);
        assert_eq!(session.transactions().len(), 1);
        assert_eq!(session.node_fee(), 10);
        assert_eq!(session.primary_address(), "TRTLxyz");
        assert_eq!(session.log_lines().collect::<Vec<_>>(), vec!["synced block"]);
    }

    #[test]
    fn test_notices_for_wallet_and_transactions() {
        let (mut host, surface, _events) = host();
        host.apply(RelayMessage::WalletActiveStatus(true));
        host.apply(RelayMessage::SaveWalletResponse(false));
        host.apply(RelayMessage::SendTransactionResponse(SendTransactionResponse {
            status: "SUCCESS".into(),
            hash: Some("beef".into()),
            error: None,
        }));
        host.apply(RelayMessage::SendTransactionResponse(SendTransactionResponse {
            status: "FAILURE".into(),
            hash: None,
            error: None,
        }));

        assert!(host.wallet_active());
        assert_eq!(
            *surface.notices.lock(),
            vec![
                UiNotice::WalletActive(true),
                UiNotice::WalletSaved(false),
                UiNotice::TransactionSent {
                    hash: Some("beef".into())
                },
                UiNotice::TransactionFailed {
                    message: "Transaction failed".into()
                },
            ]
        );
    }

    #[test]
    fn test_config_message_keeps_path() {
        let (mut host, _surface, _events) = host();
        let mut config = ConfigRecord::new();
        config.insert("darkMode".into(), Value::Bool(true));
        host.apply(RelayMessage::Config(ConfigPayload {
            config: config.clone(),
            config_path: Some("/home/u/.protonwallet/config.json".into()),
        }));
        host.apply(RelayMessage::Config(ConfigPayload {
            config,
            config_path: None,
        }));
        assert_eq!(host.config()["darkMode"], true);
        assert_eq!(host.config_path(), Some("/home/u/.protonwallet/config.json"));
    }

    #[test]
    fn test_commands_become_shell_events() {
        let (mut host, _surface, events) = host();
        host.handle_command(UiCommand::FrontReady);
        host.handle_command(UiCommand::SetCloseToTray(true));
        host.handle_command(UiCommand::SaveWalletAs {
            save_path: "/tmp/a.wallet".into(),
            notify: true,
        });
        host.handle_command(UiCommand::UpdateConfig {
            key: "darkMode".into(),
            value: Value::Bool(true),
        });
        host.handle_command(UiCommand::Quit);

        let events: Vec<ShellEvent> = events.try_iter().collect();
        assert!(matches!(events[0], ShellEvent::FrontReady));
        assert!(matches!(events[1], ShellEvent::CloseToTrayToggle(true)));
        assert!(matches!(
            &events[2],
            ShellEvent::FromUi(RelayMessage::SaveWalletAs(request)) if request.notify && request.save_path == "/tmp/a.wallet"
        ));
        match &events[3] {
            ShellEvent::FromUi(RelayMessage::Config(payload)) => {
                assert_eq!(payload.config["darkMode"], true);
                assert_eq!(payload.config["closeToTray"], true);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(events[4], ShellEvent::FromUi(RelayMessage::StopRequest)));
    }

    #[test]
    fn test_spawned_host_reports_loaded_and_polls() {
        let surface = RecordingSurface::default();
        let (shell_tx, shell_rx) = unbounded();
        let (_commands_tx, commands) = unbounded();
        let mut launched = spawn_ui_host(surface.clone(), commands, None, shell_tx).unwrap();

        let first = shell_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(first, ShellEvent::ContentLoaded(ProcessRole::Ui)));

        launched
            .endpoint
            .deliver(RelayMessage::SyncStatus(SyncStatus::new(100, 100, 101)))
            .unwrap();
        thread::sleep(POLL_INTERVAL * 4);
        assert!(surface.refreshes.lock().contains(&100.0));

        launched.handle.terminate();
        let last = shell_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(last, ShellEvent::ProcessExited(ProcessRole::Ui)));
    }
}
