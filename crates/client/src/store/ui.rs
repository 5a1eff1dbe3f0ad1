use std::sync::{Arc, RwLock};

use super::{keys, read_json, read_state, write_json, write_state, Storage};

/// Colour scheme. Anything that is not `light` reads as `dark`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn normalize(raw: &str) -> Theme {
        if raw == "light" {
            Theme::Light
        } else {
            Theme::Dark
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiSnapshot {
    pub sidebar_open: bool,
    pub upgrade_modal_open: bool,
    pub upgrade_reason: Option<String>,
    pub theme: Theme,
}

impl Default for UiSnapshot {
    fn default() -> Self {
        Self {
            sidebar_open: true,
            upgrade_modal_open: false,
            upgrade_reason: None,
            theme: Theme::Dark,
        }
    }
}

/// Sidebar, upgrade modal, and theme state. Only the theme is persisted.
pub struct UiStore {
    storage: Arc<dyn Storage>,
    state: RwLock<UiSnapshot>,
}

impl UiStore {
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let store = Self {
            storage,
            state: RwLock::new(UiSnapshot::default()),
        };
        store.init_theme();
        store
    }

    pub fn snapshot(&self) -> UiSnapshot {
        read_state(&self.state).clone()
    }

    fn with_state(&self, apply: impl FnOnce(&mut UiSnapshot)) {
        apply(&mut write_state(&self.state));
    }

    pub fn toggle_sidebar(&self) {
        self.with_state(|s| s.sidebar_open = !s.sidebar_open);
    }

    pub fn set_sidebar_open(&self, open: bool) {
        self.with_state(|s| s.sidebar_open = open);
    }

    pub fn open_upgrade_modal(&self, reason: Option<String>) {
        tracing::debug!(reason = ?reason, "Opening upgrade modal");
        self.with_state(|s| {
            s.upgrade_modal_open = true;
            s.upgrade_reason = reason;
        });
    }

    pub fn close_upgrade_modal(&self) {
        self.with_state(|s| {
            s.upgrade_modal_open = false;
            s.upgrade_reason = None;
        });
    }

    pub fn theme(&self) -> Theme {
        read_state(&self.state).theme
    }

    pub fn set_theme(&self, theme: Theme) {
        write_json(self.storage.as_ref(), keys::THEME, &theme.as_str());
        self.with_state(|s| s.theme = theme);
    }

    pub fn toggle_theme(&self) {
        self.set_theme(self.theme().toggled());
    }

    /// Re-read the persisted theme, normalizing unknown values to dark.
    pub fn init_theme(&self) -> Theme {
        let raw: Option<String> = read_json(self.storage.as_ref(), keys::THEME);
        let theme = raw.as_deref().map(Theme::normalize).unwrap_or_default();
        self.with_state(|s| s.theme = theme);
        theme
    }
}
