//! Ocean Tasks Frontend App
//!
//! Header, the auth/task gate and footer. The gate keys the task view on the
//! principal's identity, so token refreshes do not remount it while a
//! sign-out or a different account does.

use chrono::Utc;
use gloo_timers::callback::Interval;
use leptos::prelude::*;
use leptos::task::spawn_local;
use ocean_tasks_core::{AuthState, ClientConfig, PrincipalId, TaskError};
use reactive_stores::Store;

use crate::browser;
use crate::components::{AuthView, StatusBanner, ThemeToggle, TodoView};
use crate::context::{AppContext, Services};
use crate::store::{store_notify, AppState, AppStateStoreFields, Notice};
use crate::theme::Theme;

/// How often the session is checked for an upcoming expiry
const REFRESH_CHECK_MS: u32 = 30_000;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Gate {
    Pending,
    SignedOut,
    SignedIn(PrincipalId),
}

#[component]
pub fn App() -> impl IntoView {
    let store = Store::new(AppState::new(Theme::preferred()));
    provide_context(store);

    Effect::new(move |_| store.theme().get().apply());

    let config = ClientConfig::from_build_env().map(|config| match browser::origin() {
        Some(origin) => config.with_redirect_to(origin),
        None => config,
    });

    let body = match config {
        Ok(config) => {
            let ctx = AppContext::new(Services::new(config), store);
            provide_context(ctx);
            start_session(ctx);
            view! { <Gatekeeper /> }.into_any()
        }
        Err(e) => {
            log::error!("[app] {}", e);
            store_notify(&store, Notice::error(e.to_string()));
            view! { <Header signed_in=Signal::derive(|| false) /> <StatusBanner /> }.into_any()
        }
    };

    view! {
        <div class="app-root ocean-bg">
            <div class="ocean-gradient" aria-hidden="true"></div>
            <main class="container">{body}</main>
        </div>
    }
}

/// Mirror session transitions into the store, restore the startup session
/// and keep the access token fresh.
fn start_session(ctx: AppContext) {
    let services = ctx.services();
    let store = ctx.store;

    let listener = services.session.on_change(move |state| store.auth().set(state.clone()));
    let refresh = Interval::new(REFRESH_CHECK_MS, move || {
        let Some(services) = ctx.try_services() else { return };
        spawn_local(async move {
            match services.session.refresh_if_due(Utc::now()).await {
                Ok(true) => log::debug!("[app] session refreshed"),
                Ok(false) => {}
                Err(TaskError::Remote(e)) => log::warn!("[app] token refresh failed: {}", e),
                Err(e) => {
                    log::warn!("[app] session ended: {}", e);
                    store_notify(&store, Notice::error(TaskError::SessionExpired.to_string()));
                }
            }
        });
    });
    let keep_alive = StoredValue::new_local(Some((listener, refresh)));
    on_cleanup(move || {
        let _ = keep_alive.try_update_value(Option::take);
    });

    spawn_local(async move {
        let fragment = browser::take_auth_fragment();
        if let Err(e) = services.session.restore(fragment.as_deref(), Utc::now()).await {
            store_notify(&store, Notice::error(e.to_string()));
        }
    });
}

#[component]
fn Gatekeeper() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");
    let store = ctx.store;

    let gate = Memo::new(move |_| store.auth().with(|auth| match auth {
        AuthState::Unknown => Gate::Pending,
        AuthState::SignedOut => Gate::SignedOut,
        AuthState::SignedIn(session) => Gate::SignedIn(session.principal_id().clone()),
    }));
    let email = Memo::new(move |_| store.auth().with(|auth| auth.principal().and_then(|p| p.email.clone())));
    let signed_in = Signal::derive(move || matches!(gate.get(), Gate::SignedIn(_)));

    view! {
        <Header signed_in=signed_in />
        <StatusBanner />
        {move || match gate.get() {
            Gate::Pending => view! { <p class="helper">"Checking your session…"</p> }.into_any(),
            Gate::SignedOut => view! {
                <section aria-labelledby="auth-section-title" class="card">
                    <h2 id="auth-section-title" class="sr-only">"Authentication"</h2>
                    <AuthView />
                </section>
            }.into_any(),
            Gate::SignedIn(principal) => view! {
                <section aria-labelledby="todo-section-title" class="card">
                    <h2 id="todo-section-title" class="sr-only">"Your Todo List"</h2>
                    <TodoView principal=principal />
                </section>
            }.into_any(),
        }}
        <footer class="footer">
            <small class="muted">
                "Signed in as: " {move || email.get().unwrap_or_else(|| "Guest".to_string())}
            </small>
        </footer>
    }
}

#[component]
fn Header(#[prop(into)] signed_in: Signal<bool>) -> impl IntoView {
    let ctx = use_context::<AppContext>();

    let sign_out = move |_| {
        let Some(services) = ctx.and_then(|ctx| ctx.try_services()) else { return };
        spawn_local(async move {
            services.session.sign_out().await;
        });
    };

    view! {
        <header class="header">
            <h1 class="title">"Ocean Tasks"</h1>
            <p class="subtitle">"Minimal, fast, and focused."</p>
            <div class="header-actions" role="group" aria-label="Display controls">
                <ThemeToggle />
                <Show when=move || signed_in.get()>
                    <button class="btn btn-secondary" aria-label="Sign out" on:click=sign_out>
                        "Sign out"
                    </button>
                </Show>
            </div>
        </header>
    }
}
