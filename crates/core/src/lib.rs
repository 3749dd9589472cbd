//! Proton Wallet Core Library
//!
//! Coordination layer shared by the shell binary
//!
//! Architecture:
//! - Supervisor owns the lifecycle: engine child, UI host, config, tray and window events
//! - Engine process speaks JSON lines over stdio (engine module)
//! - UI host owns the session cache and polls it for the surface (ui, session modules)
//! - Relay forwards typed messages both ways once startup is complete (ipc, relay modules)

pub mod address_book;
pub mod amount;
pub mod config;
pub mod engine;
pub mod instance;
pub mod ipc;
pub mod price;
pub mod readiness;
pub mod relay;
pub mod session;
pub mod shutdown;
pub mod supervisor;
pub mod sync;
pub mod tray;
pub mod types;
pub mod ui;
pub mod window;

pub use crate::supervisor::{ProcessSupervisor, ShellEvent, ShellPhase};
