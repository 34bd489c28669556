//! Sign-in and registration pages.
//!
//! Neither page navigates on success; the router leaves auth pages once the
//! provider reports the new identity, honouring `state.from`.

use crate::auth::use_auth;
use crate::components::feedback::{FormError, use_notifier};
use crate::web::router::use_router;
use leptos::prelude::*;
use leptos::task::spawn_local;
use oneroof::account::{MIN_PASSWORD_LEN, Registration};
use oneroof::route::{AppRoute, Navigation};

#[component]
fn GoogleButton(is_submitting: RwSignal<bool>, error_msg: RwSignal<Option<String>>) -> impl IntoView {
    let auth = use_auth();
    let notifier = use_notifier();

    let on_click = move |_: leptos::ev::MouseEvent| {
        is_submitting.set(true);
        error_msg.set(None);
        let app = auth.app();
        spawn_local(async move {
            match app.accounts.sign_in_with_oauth().await {
                Ok(identity) => notifier.success(format!("Welcome, {}", identity.name_or_email())),
                Err(e) => {
                    error_msg.try_set(notifier.report(&e).or(Some(e.user_message().to_string())));
                }
            }
            is_submitting.try_set(false);
        });
    };

    view! {
        <button type="button" class="btn btn-outline w-full" disabled=move || is_submitting.get() on:click=on_click>
            "Continue with Google"
        </button>
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let auth = use_auth();
    let router = use_router();
    let notifier = use_notifier();

    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let is_submitting = RwSignal::new(false);
    let error_msg = RwSignal::new(Option::<String>::None);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if email.get_untracked().is_empty() || password.get_untracked().is_empty() {
            error_msg.set(Some("Please fill in all fields".to_string()));
            return;
        }

        is_submitting.set(true);
        error_msg.set(None);

        let app = auth.app();
        spawn_local(async move {
            let result = app
                .accounts
                .sign_in(&email.get_untracked(), &password.get_untracked())
                .await;
            match result {
                Ok(identity) => notifier.success(format!("Welcome back, {}", identity.name_or_email())),
                Err(e) => {
                    error_msg.try_set(Some(e.user_message().to_string()));
                }
            }
            is_submitting.try_set(false);
        });
    };

    let to_register = move |ev: leptos::ev::MouseEvent| {
        ev.prevent_default();
        router.go(Navigation {
            to: AppRoute::Register.to_path().to_string(),
            from: router.from_state(),
            replace: true,
        });
    };

    view! {
        <div class="hero min-h-[70vh] bg-base-200">
            <div class="hero-content flex-col w-full max-w-md">
                <div class="text-center mb-4">
                    <h1 class="text-3xl font-bold">"Sign in"</h1>
                    <p class="text-base-content/70">"Welcome back to OneRoof"</p>
                </div>

                <div class="card shrink-0 w-full shadow-2xl bg-base-100">
                    <form class="card-body" on:submit=on_submit>
                        <FormError message=error_msg.into() />

                        <div class="form-control">
                            <label class="label" for="email">
                                <span class="label-text">"Email"</span>
                            </label>
                            <input
                                id="email"
                                type="email"
                                placeholder="you@example.com"
                                on:input=move |ev| set_email.set(event_target_value(&ev))
                                prop:value=email
                                class="input input-bordered"
                                required
                            />
                        </div>
                        <div class="form-control">
                            <label class="label" for="password">
                                <span class="label-text">"Password"</span>
                            </label>
                            <input
                                id="password"
                                type="password"
                                placeholder="••••••••"
                                on:input=move |ev| set_password.set(event_target_value(&ev))
                                prop:value=password
                                class="input input-bordered"
                                required
                            />
                        </div>
                        <div class="form-control mt-6">
                            <button class="btn btn-primary" disabled=move || is_submitting.get()>
                                {move || if is_submitting.get() {
                                    view! { <span class="loading loading-spinner"></span> "Signing in..." }.into_any()
                                } else {
                                    "Sign in".into_any()
                                }}
                            </button>
                        </div>
                        <div class="divider">"or"</div>
                        <GoogleButton is_submitting=is_submitting error_msg=error_msg />
                        <p class="text-sm text-center mt-4">
                            "New here? "
                            <a href=AppRoute::Register.to_path() class="link link-primary" on:click=to_register>
                                "Create an account"
                            </a>
                        </p>
                    </form>
                </div>
            </div>
        </div>
    }
}

#[component]
pub fn RegisterPage() -> impl IntoView {
    let auth = use_auth();
    let router = use_router();
    let notifier = use_notifier();

    let (name, set_name) = signal(String::new());
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (photo, set_photo) = signal(String::new());
    let is_submitting = RwSignal::new(false);
    let error_msg = RwSignal::new(Option::<String>::None);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let registration = Registration {
            name: name.get_untracked(),
            email: email.get_untracked(),
            password: password.get_untracked(),
            photo_url: Some(photo.get_untracked()).filter(|p| !p.trim().is_empty()),
        };
        if let Err(e) = registration.validate() {
            error_msg.set(Some(e.user_message().to_string()));
            return;
        }

        is_submitting.set(true);
        error_msg.set(None);

        let app = auth.app();
        spawn_local(async move {
            match app.accounts.register(&registration).await {
                Ok(identity) => notifier.success(format!("Welcome, {}", identity.name_or_email())),
                Err(e) => {
                    error_msg.try_set(Some(e.user_message().to_string()));
                }
            }
            is_submitting.try_set(false);
        });
    };

    let to_sign_in = move |ev: leptos::ev::MouseEvent| {
        ev.prevent_default();
        router.go(Navigation {
            to: AppRoute::SignIn.to_path().to_string(),
            from: router.from_state(),
            replace: true,
        });
    };

    view! {
        <div class="hero min-h-[70vh] bg-base-200">
            <div class="hero-content flex-col w-full max-w-md">
                <div class="text-center mb-4">
                    <h1 class="text-3xl font-bold">"Create an account"</h1>
                </div>

                <div class="card shrink-0 w-full shadow-2xl bg-base-100">
                    <form class="card-body" on:submit=on_submit>
                        <FormError message=error_msg.into() />

                        <input
                            type="text"
                            placeholder="Full name"
                            on:input=move |ev| set_name.set(event_target_value(&ev))
                            prop:value=name
                            class="input input-bordered"
                            required
                        />
                        <input
                            type="email"
                            placeholder="Email"
                            on:input=move |ev| set_email.set(event_target_value(&ev))
                            prop:value=email
                            class="input input-bordered"
                            required
                        />
                        <input
                            type="url"
                            placeholder="Photo URL (optional)"
                            on:input=move |ev| set_photo.set(event_target_value(&ev))
                            prop:value=photo
                            class="input input-bordered"
                        />
                        <input
                            type="password"
                            placeholder=format!("Password (at least {} characters)", MIN_PASSWORD_LEN)
                            on:input=move |ev| set_password.set(event_target_value(&ev))
                            prop:value=password
                            class="input input-bordered"
                            required
                        />
                        <div class="form-control mt-6">
                            <button class="btn btn-primary" disabled=move || is_submitting.get()>
                                {move || if is_submitting.get() { "Creating account..." } else { "Register" }}
                            </button>
                        </div>
                        <div class="divider">"or"</div>
                        <GoogleButton is_submitting=is_submitting error_msg=error_msg />
                        <p class="text-sm text-center mt-4">
                            "Already registered? "
                            <a href=AppRoute::SignIn.to_path() class="link link-primary" on:click=to_sign_in>
                                "Sign in"
                            </a>
                        </p>
                    </form>
                </div>
            </div>
        </div>
    }
}
