//! Session Persistence
//!
//! `SessionStore` backed by `localStorage`, so a session survives reloads.

use ocean_tasks_core::auth::SessionStore;
use ocean_tasks_core::Session;

const SESSION_KEY: &str = "ocean-tasks.auth";

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSessionStore;

impl SessionStore for LocalSessionStore {
    fn load(&self) -> Option<Session> {
        let storage = local_storage()?;
        let raw = storage.get_item(SESSION_KEY).ok().flatten()?;
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                log::warn!("[storage] discarding unreadable session: {}", e);
                let _ = storage.remove_item(SESSION_KEY);
                None
            }
        }
    }

    fn save(&self, session: &Session) {
        let Some(storage) = local_storage() else { return };
        match serde_json::to_string(session) {
            Ok(raw) => {
                if let Err(e) = storage.set_item(SESSION_KEY, &raw) {
                    log::warn!("[storage] could not persist session: {:?}", e);
                }
            }
            Err(e) => log::warn!("[storage] could not encode session: {}", e),
        }
    }

    fn clear(&self) {
        if let Some(storage) = local_storage() {
            let _ = storage.remove_item(SESSION_KEY);
        }
    }
}
