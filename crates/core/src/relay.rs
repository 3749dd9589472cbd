//! Message relayer
//!
//! Two independent FIFO queues, one per direction. Each queue is drained by a
//! forwarder thread that hands messages to an [`Endpoint`]. A message whose
//! destination has gone away is dropped and logged; it is never retried.

use crate::ipc::{ProcessRole, RelayMessage};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{0} endpoint is gone")]
    Disconnected(ProcessRole),

    #[error("failed to write to {role}: {source}")]
    Io {
        role: ProcessRole,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {message_type}: {source}")]
    Encode {
        message_type: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to start relay thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Somewhere a relayed message can be delivered
pub trait Endpoint: Send {
    fn deliver(&mut self, message: RelayMessage) -> Result<(), RelayError>;
}

/// In-process destination, used for the UI host
pub struct ChannelEndpoint {
    role: ProcessRole,
    sender: Sender<RelayMessage>,
}

impl ChannelEndpoint {
    pub fn new(role: ProcessRole, sender: Sender<RelayMessage>) -> Self {
        Self { role, sender }
    }
}

impl Endpoint for ChannelEndpoint {
    fn deliver(&mut self, message: RelayMessage) -> Result<(), RelayError> {
        self.sender
            .send(message)
            .map_err(|_| RelayError::Disconnected(self.role))
    }
}

/// Routes messages between the engine and the UI.
///
/// Only constructed once the readiness gate has opened, so nothing is ever
/// delivered to a process that has not finished loading.
pub struct MessageRelayer {
    to_engine: Option<Sender<RelayMessage>>,
    to_ui: Option<Sender<RelayMessage>>,
    forwarders: Vec<JoinHandle<()>>,
}

impl MessageRelayer {
    pub fn new(
        engine: Box<dyn Endpoint>,
        ui: Box<dyn Endpoint>,
    ) -> Result<Self, RelayError> {
        let (to_engine, engine_rx) = unbounded();
        let (to_ui, ui_rx) = unbounded();

        let forwarders = vec![
            spawn_forwarder(ProcessRole::Engine, engine_rx, engine)?,
            spawn_forwarder(ProcessRole::Ui, ui_rx, ui)?,
        ];
        info!("Message relayer started");

        Ok(Self {
            to_engine: Some(to_engine),
            to_ui: Some(to_ui),
            forwarders,
        })
    }

    /// Queue a message for the engine. Never blocks.
    pub fn send_to_engine(&self, message: RelayMessage) {
        Self::enqueue(ProcessRole::Engine, self.to_engine.as_ref(), message);
    }

    /// Queue a message for the UI. Never blocks.
    pub fn send_to_ui(&self, message: RelayMessage) {
        Self::enqueue(ProcessRole::Ui, self.to_ui.as_ref(), message);
    }

    fn enqueue(role: ProcessRole, queue: Option<&Sender<RelayMessage>>, message: RelayMessage) {
        let message_type = message.message_type();
        let sent = queue.is_some_and(|queue| queue.send(message).is_ok());
        if !sent {
            debug!("Dropping {} for {}: relay is closed", message_type, role);
        }
    }

    /// Close both queues and wait for what is already queued to be handed off
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.to_engine.take();
        self.to_ui.take();
        for forwarder in self.forwarders.drain(..) {
            let _ = forwarder.join();
        }
    }
}

impl Drop for MessageRelayer {
    fn drop(&mut self) {
        self.close();
    }
}

fn spawn_forwarder(
    role: ProcessRole,
    queue: Receiver<RelayMessage>,
    mut endpoint: Box<dyn Endpoint>,
) -> Result<JoinHandle<()>, RelayError> {
    thread::Builder::new()
        .name(format!("relay-to-{role}"))
        .spawn(move || {
            for message in queue.iter() {
                let message_type = message.message_type();
                if let Err(e) = endpoint.deliver(message) {
                    debug!("Dropping {}: {}", message_type, e);
                }
            }
            debug!("Relay queue to {} closed", role);
        })
        .map_err(RelayError::Spawn)
}
