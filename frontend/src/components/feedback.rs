//! Toasts, loading placeholders and the retry panel.

use leptos::prelude::*;
use oneroof::error::{AppError, ErrorCategory};

/// 全局通知：消息内容, 是否出错
#[derive(Clone, Copy)]
pub struct Notifier(RwSignal<Option<(String, bool)>>);

impl Notifier {
    pub fn success(&self, message: impl Into<String>) {
        self.0.set(Some((message.into(), false)));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.0.set(Some((message.into(), true)));
    }

    /// Route an error by category. Returns the message when it belongs
    /// inline next to the form instead.
    pub fn report(&self, error: &AppError) -> Option<String> {
        match error.category() {
            ErrorCategory::Form | ErrorCategory::Validation => {
                Some(error.user_message().to_string())
            }
            // 拦截器已负责跳转
            ErrorCategory::Redirect => None,
            ErrorCategory::RetryPanel | ErrorCategory::Toast => {
                self.error(error.user_message());
                None
            }
        }
    }

    /// For actions without a form: everything except redirects becomes a toast.
    pub fn toast(&self, error: &AppError) {
        if error.category() != ErrorCategory::Redirect {
            self.error(error.user_message());
        }
    }
}

pub fn provide_notifier() -> Notifier {
    let notifier = Notifier(RwSignal::new(None));
    provide_context(notifier);
    notifier
}

pub fn use_notifier() -> Notifier {
    use_context::<Notifier>().expect("Notifier should be provided")
}

#[component]
pub fn Toaster() -> impl IntoView {
    let Notifier(notification) = use_notifier();

    // 3秒后清除通知
    Effect::new(move |_| {
        if notification.get().is_some() {
            set_timeout(
                move || {
                    notification.try_set(None);
                },
                std::time::Duration::from_secs(3),
            );
        }
    });

    view! {
        <Show when=move || notification.with(Option::is_some)>
            <div class="toast toast-top toast-end z-50">
                <div class=move || {
                    match notification.get() {
                        Some((_, true)) => "alert alert-error shadow-lg",
                        _ => "alert alert-success shadow-lg",
                    }
                }>
                    <span>{move || notification.get().map(|(m, _)| m).unwrap_or_default()}</span>
                </div>
            </div>
        </Show>
    }
}

#[component]
pub fn Spinner() -> impl IntoView {
    view! {
        <div class="flex justify-center py-12">
            <span class="loading loading-spinner loading-lg text-primary"></span>
        </div>
    }
}

/// Recoverable failure: the message and a Retry button.
#[component]
pub fn ErrorPanel(error: AppError, on_retry: Callback<()>) -> impl IntoView {
    view! {
        <div role="alert" class="alert alert-warning my-6 flex flex-col sm:flex-row">
            <span>{error.user_message().to_string()}</span>
            <button class="btn btn-sm" on:click=move |_| on_retry.run(())>
                "Retry"
            </button>
        </div>
    }
}

/// Inline form error.
#[component]
pub fn FormError(message: Signal<Option<String>>) -> impl IntoView {
    view! {
        <Show when=move || message.with(Option::is_some)>
            <div role="alert" class="alert alert-error text-sm py-2">
                <span>{move || message.get().unwrap_or_default()}</span>
            </div>
        </Show>
    }
}
