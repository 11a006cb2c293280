//! Todo View Component
//!
//! The signed-in list. Mounting opens a live list (change subscription plus
//! initial load) for the principal; unmounting tears it down and releases
//! the subscription.

use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use ocean_tasks_core::realtime::{ChangeFilter, FeedStatus};
use ocean_tasks_core::repository::RestTaskStore;
use ocean_tasks_core::{LiveList, PrincipalId, TaskId, TaskList, TaskResult, TaskSync, TaskSyncCallbacks};

use crate::components::{TodoInput, TodoItem};
use crate::context::AppContext;
use crate::store::{store_notify, store_set_tasks, AppStateStoreFields, Notice};

type HostedSync = TaskSync<RestTaskStore>;

/// Task actions for the mounted view, provided via context
#[derive(Clone, Copy)]
pub struct TaskActions {
    ctx: AppContext,
    live: StoredValue<Option<LiveList<RestTaskStore>>, LocalStorage>,
}

impl TaskActions {
    fn sync(&self) -> Option<Rc<HostedSync>> {
        self.live.try_with_value(|live| live.as_ref().map(LiveList::sync)).flatten()
    }

    fn settle(&self, result: TaskResult<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                self.ctx.report(e);
                false
            }
        }
    }

    pub async fn add(self, title: String) -> bool {
        let Some(sync) = self.sync() else { return false };
        let result = sync.add(&title).await.map(|_| ());
        self.settle(result)
    }

    pub async fn toggle(self, id: TaskId) -> bool {
        let Some(sync) = self.sync() else { return false };
        let result = sync.toggle(&id).await.map(|_| ());
        self.settle(result)
    }

    pub async fn rename(self, id: TaskId, title: String) -> bool {
        let Some(sync) = self.sync() else { return false };
        let result = sync.rename(&id, &title).await.map(|_| ());
        self.settle(result)
    }

    pub async fn delete(self, id: TaskId) -> bool {
        let Some(sync) = self.sync() else { return false };
        let result = sync.delete(&id).await;
        self.settle(result)
    }
}

#[component]
pub fn TodoView(principal: PrincipalId) -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");
    let store = ctx.store;
    let services = ctx.services();

    let callbacks = TaskSyncCallbacks {
        on_refresh: Box::new(move |list: &TaskList| store_set_tasks(&store, list)),
    };
    let on_status = move |status: FeedStatus| match status {
        FeedStatus::Subscribed => log::debug!("[todo] live updates active"),
        FeedStatus::Error(reason) => store_notify(&store, Notice::error(reason)),
        FeedStatus::Closed => log::info!("[todo] live updates stopped"),
    };
    let filter = ChangeFilter::for_owner(&services.config, principal);
    let live = match LiveList::open(services.task_store(), &services.change_feed(), filter, callbacks, on_status) {
        Ok(live) => Some(live),
        Err(e) => {
            store.loading().set(false);
            ctx.report(e);
            None
        }
    };

    if let Some(sync) = live.as_ref().map(LiveList::sync) {
        spawn_local(async move {
            if let Err(e) = sync.load().await {
                ctx.report(e);
            }
        });
    }

    let live = StoredValue::new_local(live);
    provide_context(TaskActions { ctx, live });
    on_cleanup(move || {
        if let Some(live) = live.try_update_value(Option::take).flatten() {
            live.close();
        }
    });

    view! {
        <div>
            <TodoInput />
            <div class="todo-list" role="list" aria-busy=move || store.loading().get().to_string()>
                {move || {
                    if store.loading().get() {
                        view! { <p class="helper">"Loading your tasks…"</p> }.into_any()
                    } else if store.tasks().with(Vec::is_empty) {
                        view! { <p class="helper">"No tasks yet. Add your first one!"</p> }.into_any()
                    } else {
                        view! {
                            <For
                                each=move || store.tasks().get()
                                key=|task| (task.id.clone(), task.title.clone(), task.is_complete)
                                children=move |task| view! {
                                    <div role="listitem">
                                        <TodoItem task=task />
                                    </div>
                                }
                            />
                        }.into_any()
                    }
                }}
            </div>
        </div>
    }
}
