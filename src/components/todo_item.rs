//! Todo Item Component
//!
//! A single task row: completion checkbox, inline title editing, delete.

use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use ocean_tasks_core::Task;

use crate::components::{DeleteConfirmButton, TaskActions};

#[component]
pub fn TodoItem(task: Task) -> impl IntoView {
    let actions = use_context::<TaskActions>().expect("TaskActions should be provided");

    let Task { id, title, is_complete, .. } = task;
    let (editing, set_editing) = signal(false);
    let (draft, set_draft) = signal(title.clone());
    let (busy, set_busy) = signal(false);
    let input_ref = NodeRef::<html::Input>::new();

    Effect::new(move |_| {
        if editing.get() {
            if let Some(input) = input_ref.get() {
                let _ = input.focus();
            }
        }
    });

    let original = title.clone();
    let cancel = move || {
        set_draft.set(original.clone());
        set_editing.set(false);
    };
    let cancel = Callback::new(move |_: ()| cancel());

    let save = {
        let id = id.clone();
        let original = title.clone();
        Callback::new(move |_: ()| {
            let value = draft.get_untracked().trim().to_string();
            // Blank or unchanged: nothing to save
            if value.is_empty() || value == original {
                cancel.run(());
                return;
            }
            set_busy.set(true);
            let id = id.clone();
            spawn_local(async move {
                if actions.rename(id, value).await {
                    set_editing.set(false);
                }
                set_busy.set(false);
            });
        })
    };

    let toggle = {
        let id = id.clone();
        move |_| {
            set_busy.set(true);
            let id = id.clone();
            spawn_local(async move {
                actions.toggle(id).await;
                set_busy.set(false);
            });
        }
    };

    let delete = Callback::new(move |_: ()| {
        set_busy.set(true);
        let id = id.clone();
        spawn_local(async move {
            actions.delete(id).await;
            set_busy.set(false);
        });
    });

    let label = format!("Todo {}", title);

    view! {
        <div class="todo-item" role="group" aria-label=label>
            <input
                class="checkbox"
                type="checkbox"
                prop:checked=is_complete
                aria-label=if is_complete { "Mark incomplete" } else { "Mark complete" }
                disabled=move || busy.get()
                on:change=toggle
            />
            <div class=if is_complete { "todo-title completed" } else { "todo-title" }>
                <Show
                    when=move || editing.get()
                    fallback={
                        let title = title.clone();
                        move || view! { <span>{title.clone()}</span> }
                    }
                >
                    <input
                        class="input"
                        node_ref=input_ref
                        aria-label="Edit task title"
                        prop:value=move || draft.get()
                        on:input=move |ev| set_draft.set(event_target_value(&ev))
                        on:keydown=move |ev: web_sys::KeyboardEvent| match ev.key().as_str() {
                            "Enter" => save.run(()),
                            "Escape" => cancel.run(()),
                            _ => {}
                        }
                        disabled=move || busy.get()
                    />
                </Show>
            </div>
            <div class="todo-actions">
                <Show
                    when=move || editing.get()
                    fallback=move || view! {
                        <button class="btn btn-secondary" disabled=move || busy.get() on:click=move |_| set_editing.set(true)>
                            "Edit"
                        </button>
                        <DeleteConfirmButton disabled=busy on_confirm=delete />
                    }
                >
                    <button class="btn btn-secondary" disabled=move || busy.get() aria-busy=move || busy.get().to_string() on:click=move |_| save.run(())>
                        "Save"
                    </button>
                    <button class="btn btn-secondary" disabled=move || busy.get() on:click=move |_| cancel.run(())>
                        "Cancel"
                    </button>
                </Show>
            </div>
        </div>
    }
}
