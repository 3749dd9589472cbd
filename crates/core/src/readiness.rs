//! Startup readiness gate
//!
//! One-shot AND barrier over the three independent startup signals: the UI
//! finished loading, the engine finished loading, and the config was read.
//! Each flag flips once; the gate opens once and stays open.

use std::fmt;

/// The independent startup signals the gate waits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadySignal {
    Frontend,
    Backend,
    Config,
}

type ReadyCallback = Box<dyn FnOnce() + Send>;

#[derive(Default)]
pub struct ReadinessGate {
    frontend_ready: bool,
    backend_ready: bool,
    config_ready: bool,
    opened: bool,
    callbacks: Vec<ReadyCallback>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_frontend_ready(&mut self) -> bool {
        self.mark(ReadySignal::Frontend)
    }

    pub fn mark_backend_ready(&mut self) -> bool {
        self.mark(ReadySignal::Backend)
    }

    pub fn mark_config_ready(&mut self) -> bool {
        self.mark(ReadySignal::Config)
    }

    /// Set one flag. Returns `true` only for the call that opened the gate.
    pub fn mark(&mut self, signal: ReadySignal) -> bool {
        let flag = match signal {
            ReadySignal::Frontend => &mut self.frontend_ready,
            ReadySignal::Backend => &mut self.backend_ready,
            ReadySignal::Config => &mut self.config_ready,
        };
        if *flag {
            return false;
        }
        *flag = true;
        tracing::debug!("Readiness signal received: {:?}", signal);

        if self.opened || !self.all_flags_set() {
            return false;
        }

        self.opened = true;
        tracing::info!("All startup signals received, gate open");
        for callback in self.callbacks.drain(..) {
            callback();
        }
        true
    }

    /// Run `callback` once when the gate opens, or right away if it already has
    pub fn on_ready<F>(&mut self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.opened {
            callback();
        } else {
            self.callbacks.push(Box::new(callback));
        }
    }

    pub fn is_ready(&self) -> bool {
        self.opened
    }

    pub fn is_set(&self, signal: ReadySignal) -> bool {
        match signal {
            ReadySignal::Frontend => self.frontend_ready,
            ReadySignal::Backend => self.backend_ready,
            ReadySignal::Config => self.config_ready,
        }
    }

    fn all_flags_set(&self) -> bool {
        self.frontend_ready && self.backend_ready && self.config_ready
    }
}

impl fmt::Debug for ReadinessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadinessGate")
            .field("frontend_ready", &self.frontend_ready)
            .field("backend_ready", &self.backend_ready)
            .field("config_ready", &self.config_ready)
            .field("opened", &self.opened)
            .field("pending_callbacks", &self.callbacks.len())
            .finish()
    }
}
