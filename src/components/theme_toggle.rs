//! Theme Toggle Component

use leptos::prelude::*;

use crate::store::{use_app_store, AppStateStoreFields};

#[component]
pub fn ThemeToggle() -> impl IntoView {
    let store = use_app_store();
    let hint = move || format!("Switch to {} mode", store.theme().get().toggled().as_str());

    view! {
        <button
            type="button"
            class="btn btn-secondary"
            aria-label=hint
            title=hint
            on:click=move |_| store.theme().update(|t| *t = t.toggled())
        >
            {move || store.theme().get().toggle_label()}
        </button>
    }
}
