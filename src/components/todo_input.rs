//! Todo Input Component
//!
//! Input row to add a new task.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::components::TaskActions;

#[component]
pub fn TodoInput() -> impl IntoView {
    let actions = use_context::<TaskActions>().expect("TaskActions should be provided");

    let (title, set_title) = signal(String::new());
    let (busy, set_busy) = signal(false);

    let add = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let value = title.get_untracked().trim().to_string();
        if value.is_empty() {
            return;
        }
        set_busy.set(true);
        spawn_local(async move {
            if actions.add(value).await {
                set_title.set(String::new());
            }
            set_busy.set(false);
        });
    };

    view! {
        <form class="row" aria-label="Add todo" on:submit=add>
            <label for="new-todo" class="sr-only">"New todo"</label>
            <input
                id="new-todo"
                class="input"
                placeholder="What needs to be done?"
                prop:value=move || title.get()
                on:input=move |ev| set_title.set(event_target_value(&ev))
                disabled=move || busy.get()
            />
            <button class="btn" type="submit" disabled=move || busy.get()>
                {move || if busy.get() { "Adding…" } else { "Add" }}
            </button>
        </form>
    }
}
