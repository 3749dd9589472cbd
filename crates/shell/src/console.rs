//! Stdin console standing in for the window, tray and UI surface
//!
//! One command per line:
//!
//! | line | effect |
//! |---|---|
//! | `tray <menu-id>` | tray menu click |
//! | `close` | main window close button |
//! | `front-ready` | UI finished rendering |
//! | `close-to-tray on\|off` | toggle close to tray |
//! | `set <key> <json>` | change one setting |
//! | `open [path]` | open another wallet |
//! | `save-as <path>` | save the wallet under a new name |
//! | `quit` | save and quit |

use crossbeam_channel::Sender;
use proton_wallet_core::tray::{
    action_from_menu_id, tray_supported, TRAY_MENU_ITEMS, TRAY_TOOLTIP,
};
use proton_wallet_core::ui::UiCommand;
use proton_wallet_core::window::WindowEvent;
use proton_wallet_core::ShellEvent;
use serde_json::Value;
use std::io::BufRead;
use std::thread;

/// Where a console line goes
#[derive(Debug)]
pub enum ConsoleInput {
    Shell(ShellEvent),
    Ui(UiCommand),
}

pub fn parse_console_line(line: &str) -> Option<ConsoleInput> {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    let input = match (command, rest) {
        ("tray", id) => ConsoleInput::Shell(ShellEvent::Tray(action_from_menu_id(id)?)),
        ("close", "") => ConsoleInput::Shell(ShellEvent::Window(WindowEvent::CloseRequested)),
        ("front-ready", "") => ConsoleInput::Ui(UiCommand::FrontReady),
        ("close-to-tray", "on") => ConsoleInput::Ui(UiCommand::SetCloseToTray(true)),
        ("close-to-tray", "off") => ConsoleInput::Ui(UiCommand::SetCloseToTray(false)),
        ("set", setting) => {
            let (key, raw) = setting.split_once(char::is_whitespace)?;
            let value = serde_json::from_str::<Value>(raw.trim()).ok()?;
            ConsoleInput::Ui(UiCommand::UpdateConfig {
                key: key.to_string(),
                value,
            })
        }
        ("open", "") => ConsoleInput::Ui(UiCommand::OpenWallet(None)),
        ("open", path) => ConsoleInput::Ui(UiCommand::OpenWallet(Some(path.to_string()))),
        ("save-as", path) if !path.is_empty() => ConsoleInput::Ui(UiCommand::SaveWalletAs {
            save_path: path.to_string(),
            notify: true,
        }),
        ("quit", "") => ConsoleInput::Ui(UiCommand::Quit),
        _ => return None,
    };
    Some(input)
}

/// Read stdin on a background thread until it closes
pub fn spawn_console(shell: Sender<ShellEvent>, ui: Sender<UiCommand>) -> std::io::Result<()> {
    if tray_supported() {
        let items: Vec<&str> = TRAY_MENU_ITEMS.iter().map(|(id, _)| *id).collect();
        tracing::info!("{} tray menu ids: {}", TRAY_TOOLTIP, items.join(", "));
    }

    thread::Builder::new()
        .name("console".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                let delivered = match parse_console_line(&line) {
                    Some(ConsoleInput::Shell(event)) => shell.send(event).is_ok(),
                    Some(ConsoleInput::Ui(command)) => ui.send(command).is_ok(),
                    None => {
                        tracing::warn!("Unknown console command: {}", line.trim());
                        true
                    }
                };
                if !delivered {
                    break;
                }
            }
            tracing::debug!("Console input closed");
        })
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proton_wallet_core::tray::{TrayMenuAction, TRAY_MENU_QUIT, TRAY_MENU_SHOW_APP};

    #[test]
    fn test_tray_lines_use_menu_ids() {
        assert!(matches!(
            parse_console_line(&format!("tray {TRAY_MENU_SHOW_APP}")),
            Some(ConsoleInput::Shell(ShellEvent::Tray(TrayMenuAction::RestoreWindow)))
        ));
        assert!(matches!(
            parse_console_line(&format!("tray {TRAY_MENU_QUIT}")),
            Some(ConsoleInput::Shell(ShellEvent::Tray(TrayMenuAction::Quit)))
        ));
        assert!(parse_console_line("tray tray_nope").is_none());
    }

    #[test]
    fn test_ui_commands() {
        assert!(matches!(
            parse_console_line("close-to-tray on"),
            Some(ConsoleInput::Ui(UiCommand::SetCloseToTray(true)))
        ));
        assert!(matches!(
            parse_console_line("open"),
            Some(ConsoleInput::Ui(UiCommand::OpenWallet(None)))
        ));
        match parse_console_line("set selectedFiat \"eur\"") {
            Some(ConsoleInput::Ui(UiCommand::UpdateConfig { key, value })) => {
                assert_eq!(key, "selectedFiat");
                assert_eq!(value, Value::String("eur".into()));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_malformed_lines_are_rejected() {
        assert!(parse_console_line("set darkMode").is_none());
        assert!(parse_console_line("set darkMode {oops").is_none());
        assert!(parse_console_line("save-as").is_none());
        assert!(parse_console_line("close now").is_none());
        assert!(parse_console_line("dance").is_none());
    }
}
