//! Global Application State Store
//!
//! Uses Leptos reactive_stores for fine-grained reactivity.

use leptos::prelude::*;
use ocean_tasks_core::{AuthState, Task, TaskList};
use reactive_stores::Store;

use crate::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Info,
    Error,
}

/// A message shown in the status banner or under a form
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub tone: Tone,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self { tone: Tone::Info, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { tone: Tone::Error, text: text.into() }
    }

    pub fn class(&self) -> &'static str {
        match self.tone {
            Tone::Info => "notice notice-info",
            Tone::Error => "notice notice-error",
        }
    }
}

/// Global application state with field-level reactivity
#[derive(Clone, Debug, Default, Store)]
pub struct AppState {
    /// Session boundary state, mirrored from its change listener
    pub auth: AuthState,
    /// Visible tasks, newest first
    pub tasks: Vec<Task>,
    /// Initial load of the current view still pending
    pub loading: bool,
    /// Banner message
    pub notice: Option<Notice>,
    pub theme: Theme,
}

impl AppState {
    pub fn new(theme: Theme) -> Self {
        Self {
            loading: true,
            theme,
            ..Default::default()
        }
    }
}

/// Type alias for the store
pub type AppStore = Store<AppState>;

/// Get the app store from context
pub fn use_app_store() -> AppStore {
    expect_context::<AppStore>()
}

// ========================
// Store Helper Functions
// ========================

/// Mirror the reconciled list into the store
pub fn store_set_tasks(store: &AppStore, list: &TaskList) {
    store.tasks().set(list.tasks().to_vec());
    store.loading().set(list.is_loading());
}

pub fn store_notify(store: &AppStore, notice: Notice) {
    store.notice().set(Some(notice));
}

pub fn store_clear_notice(store: &AppStore) {
    store.notice().set(None);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_tone_selects_class() {
        assert_eq!(Notice::info("Saved").class(), "notice notice-info");
        assert_eq!(Notice::error("Oops").class(), "notice notice-error");
        assert_eq!(Notice::error("Oops").text, "Oops");
    }

    #[test]
    fn test_new_state_starts_loading_with_theme() {
        let state = AppState::new(Theme::Dark);
        assert!(state.loading);
        assert_eq!(state.theme, Theme::Dark);
        assert!(state.tasks.is_empty());
        assert!(state.notice.is_none());
    }
}
