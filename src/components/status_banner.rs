//! Status Banner Component
//!
//! Shows the current notice (failed actions, expired sessions) until dismissed.

use leptos::prelude::*;

use crate::store::{store_clear_notice, use_app_store, AppStateStoreFields};

#[component]
pub fn StatusBanner() -> impl IntoView {
    let store = use_app_store();

    view! {
        {move || store.notice().get().map(|notice| view! {
            <div role="status" aria-live="polite" class=notice.class()>
                <span>{notice.text.clone()}</span>
                <button
                    type="button"
                    class="notice-dismiss"
                    aria-label="Dismiss"
                    on:click=move |_| store_clear_notice(&store)
                >
                    "×"
                </button>
            </div>
        })}
    }
}
