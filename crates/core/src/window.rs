//! Main window abstraction and the close-to-tray decision

/// What the supervisor needs from the main window
pub trait MainWindow: Send {
    fn show(&mut self);
    fn hide(&mut self);
    fn focus(&mut self);
    fn is_visible(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// User asked to close the main window
    CloseRequested,
    /// The last window is gone
    AllClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    /// Cancel the close and hide the window
    Hide,
    /// Let the window close
    Close,
}

/// Platform conventions the supervisor has to follow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformPolicy {
    /// Closing the main window keeps the application alive
    pub close_hides_window: bool,
}

impl PlatformPolicy {
    pub fn current() -> Self {
        Self {
            close_hides_window: cfg!(target_os = "macos"),
        }
    }

    pub fn decide_close(&self, force_quit: bool, close_to_tray: bool) -> CloseDecision {
        if self.close_hides_window && !force_quit && close_to_tray {
            CloseDecision::Hide
        } else {
            CloseDecision::Close
        }
    }
}

/// Window without a surface, for headless runs and tests
#[derive(Debug, Default)]
pub struct HeadlessWindow {
    visible: bool,
}

impl HeadlessWindow {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MainWindow for HeadlessWindow {
    fn show(&mut self) {
        tracing::debug!("Main window shown");
        self.visible = true;
    }

    fn hide(&mut self) {
        tracing::debug!("Main window hidden");
        self.visible = false;
    }

    fn focus(&mut self) {
        if !self.visible {
            tracing::debug!("Focus requested while hidden");
        }
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}
