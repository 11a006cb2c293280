//! Application Context
//!
//! Backend services and the store, provided via Leptos Context API.

use std::rc::Rc;

use leptos::prelude::*;
use ocean_tasks_core::auth::{GoTrueAuth, TokenSlot};
use ocean_tasks_core::repository::RestTaskStore;
use ocean_tasks_core::{ClientConfig, SessionBoundary, TaskError};

use crate::realtime::WebSocketFeed;
use crate::storage::LocalSessionStore;
use crate::store::{store_notify, AppStore, Notice};

pub type Boundary = SessionBoundary<GoTrueAuth, LocalSessionStore>;

/// Clients for the hosted backend, sharing one access token slot
pub struct Services {
    pub config: Rc<ClientConfig>,
    http: reqwest::Client,
    token: TokenSlot,
    pub session: Boundary,
}

impl Services {
    pub fn new(config: ClientConfig) -> Self {
        let config = Rc::new(config);
        let http = reqwest::Client::new();
        let token = TokenSlot::new();
        let session = SessionBoundary::new(
            GoTrueAuth::new(http.clone(), config.clone()),
            LocalSessionStore,
            token.clone(),
            chrono::Duration::seconds(config.refresh_margin_secs),
        );
        Self { config, http, token, session }
    }

    pub fn task_store(&self) -> RestTaskStore {
        RestTaskStore::new(self.http.clone(), self.config.clone(), self.token.clone())
    }

    pub fn change_feed(&self) -> WebSocketFeed {
        WebSocketFeed::new(self.config.clone(), self.token.clone())
    }
}

/// App-wide handles provided via context
#[derive(Clone, Copy)]
pub struct AppContext {
    services: StoredValue<Rc<Services>, LocalStorage>,
    pub store: AppStore,
}

impl AppContext {
    pub fn new(services: Services, store: AppStore) -> Self {
        Self {
            services: StoredValue::new_local(Rc::new(services)),
            store,
        }
    }

    pub fn services(&self) -> Rc<Services> {
        self.services.get_value()
    }

    /// `None` once the owning scope has been disposed
    pub fn try_services(&self) -> Option<Rc<Services>> {
        self.services.try_get_value()
    }

    /// Show an error; a rejected access token also ends the session
    pub fn report(&self, err: TaskError) {
        log::warn!("[ui] {}", err);
        if err.is_session_expired() {
            if let Some(services) = self.try_services() {
                services.session.invalidate("access token rejected");
            }
        }
        store_notify(&self.store, Notice::error(err.to_string()));
    }
}
