//! Auth View Component
//!
//! Email/password sign-in and sign-up with a mode toggle.

use leptos::prelude::*;
use leptos::task::spawn_local;
use ocean_tasks_core::auth::SignUpOutcome;

use crate::context::AppContext;
use crate::store::Notice;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AuthMode {
    SignIn,
    SignUp,
}

#[component]
pub fn AuthView() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");

    let (mode, set_mode) = signal(AuthMode::SignIn);
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (busy, set_busy) = signal(false);
    let (message, set_message) = signal::<Option<Notice>>(None);

    let submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        set_message.set(None);
        let email = email.get_untracked();
        let password = password.get_untracked();
        let mode = mode.get_untracked();
        let services = ctx.services();

        set_busy.set(true);
        spawn_local(async move {
            let result = match mode {
                AuthMode::SignIn => services.session.sign_in(&email, &password).await
                    .map(|_| Notice::info("Signed in. Redirecting...")),
                AuthMode::SignUp => services.session.sign_up(&email, &password).await
                    .map(|outcome| match outcome {
                        SignUpOutcome::PendingConfirmation => {
                            Notice::info("Sign-up successful. Check your email for confirmation (if enabled).")
                        }
                        SignUpOutcome::SignedIn(_) => Notice::info("Signed in. Redirecting..."),
                    }),
            };
            set_message.set(Some(result.unwrap_or_else(|e| Notice::error(e.to_string()))));
            set_busy.set(false);
        });
    };

    let switch_mode = move |_| {
        set_mode.update(|m| {
            *m = match m {
                AuthMode::SignIn => AuthMode::SignUp,
                AuthMode::SignUp => AuthMode::SignIn,
            }
        });
        set_message.set(None);
    };

    let signing_in = move || mode.get() == AuthMode::SignIn;

    view! {
        <div>
            <form on:submit=submit aria-describedby="auth-helper">
                <div class="row stack">
                    <label for="email" class="sr-only">"Email"</label>
                    <input
                        id="email"
                        class="input"
                        type="email"
                        autocomplete="email"
                        placeholder="Email address"
                        prop:value=move || email.get()
                        on:input=move |ev| set_email.set(event_target_value(&ev))
                        disabled=move || busy.get()
                        required=true
                    />
                    <label for="password" class="sr-only">"Password"</label>
                    <input
                        id="password"
                        class="input"
                        type="password"
                        autocomplete=move || if signing_in() { "current-password" } else { "new-password" }
                        placeholder="Password"
                        prop:value=move || password.get()
                        on:input=move |ev| set_password.set(event_target_value(&ev))
                        disabled=move || busy.get()
                        required=true
                    />
                    <button class="btn" type="submit" disabled=move || busy.get() aria-busy=move || busy.get().to_string()>
                        {move || if busy.get() {
                            "Please wait…"
                        } else if signing_in() {
                            "Sign In"
                        } else {
                            "Create Account"
                        }}
                    </button>
                </div>
                <p id="auth-helper" class="helper">"Use a valid email address and a strong password."</p>
                {move || message.get().map(|m| view! {
                    <div role="status" aria-live="polite" class=m.class()>{m.text.clone()}</div>
                })}
            </form>

            <div class="auth-toggle">
                <span>{move || if signing_in() { "Don't have an account?" } else { "Already have an account?" }}</span>
                <button type="button" on:click=switch_mode>
                    {move || if signing_in() { "Create one" } else { "Sign in" }}
                </button>
            </div>
        </div>
    }
}
