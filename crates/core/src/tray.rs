//! Tray menu model
//!
//! The shell only knows menu ids; whatever draws the tray reports clicks back
//! as ids and they are mapped here.

pub const TRAY_TOOLTIP: &str = "Proton Wallet";

pub const TRAY_MENU_SHOW_APP: &str = "tray_show_app";
pub const TRAY_MENU_QUIT: &str = "tray_quit";

/// `(id, label)` in display order
pub const TRAY_MENU_ITEMS: [(&str, &str); 2] =
    [(TRAY_MENU_SHOW_APP, "Show App"), (TRAY_MENU_QUIT, "Quit")];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayMenuAction {
    /// Show and focus the main window
    RestoreWindow,
    /// Ask the engine to stop, then exit
    Quit,
}

pub fn action_from_menu_id(menu_id: &str) -> Option<TrayMenuAction> {
    match menu_id {
        TRAY_MENU_SHOW_APP => Some(TrayMenuAction::RestoreWindow),
        TRAY_MENU_QUIT => Some(TrayMenuAction::Quit),
        _ => None,
    }
}

/// Whether this platform gets a tray icon at all
pub fn tray_supported() -> bool {
    !cfg!(target_os = "macos")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_ids_map_to_actions() {
        assert_eq!(
            action_from_menu_id(TRAY_MENU_SHOW_APP),
            Some(TrayMenuAction::RestoreWindow)
        );
        assert_eq!(action_from_menu_id(TRAY_MENU_QUIT), Some(TrayMenuAction::Quit));
    }

    #[test]
    fn test_unknown_menu_id_is_none() {
        assert_eq!(action_from_menu_id("tray_reload"), None);
    }

    #[test]
    fn test_every_listed_item_has_an_action() {
        for (id, label) in TRAY_MENU_ITEMS {
            assert!(action_from_menu_id(id).is_some(), "{label} has no action");
        }
    }
}
