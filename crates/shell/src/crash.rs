//! Last-resort error reporting
//!
//! Any panic, on any thread, is reported and ends the process with code 1.

use std::sync::Arc;

pub const ERROR_TITLE: &str = "Uncaught Error";
pub const ERROR_MESSAGE: &str =
    "An unexpected error has occurred. Please report this error, and what you were doing to cause it.";

/// Shows a blocking error report to the user
pub trait ErrorDialog: Send + Sync {
    fn show_error(&self, title: &str, message: &str);
}

/// Writes the report to stderr
pub struct StderrDialog;

impl ErrorDialog for StderrDialog {
    fn show_error(&self, title: &str, message: &str) {
        eprintln!("{title}\n{message}");
    }
}

/// Text of the report for a given failure
pub fn report_text(detail: &str) -> String {
    format!("{ERROR_MESSAGE}\n\n{detail}")
}

pub fn install_panic_hook(dialog: Arc<dyn ErrorDialog>) {
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("Panic: {}", info);
        dialog.show_error(ERROR_TITLE, &report_text(&info.to_string()));
        std::process::exit(1);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_starts_with_generic_message() {
        let text = report_text("engine endpoint missing");
        assert!(text.starts_with(ERROR_MESSAGE));
        assert!(text.ends_with("engine endpoint missing"));
    }
}
