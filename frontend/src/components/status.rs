use crate::web::router::Link;
use leptos::prelude::*;
use oneroof::route::AppRoute;

#[component]
fn StatusPanel(code: &'static str, message: &'static str, back: AppRoute) -> impl IntoView {
    view! {
        <div class="flex items-center justify-center min-h-[60vh]">
            <div class="text-center space-y-4">
                <h1 class="text-6xl font-bold text-error">{code}</h1>
                <p class="text-xl">{message}</p>
                <Link to=back.to_path() class="btn btn-primary">"Go back"</Link>
            </div>
        </div>
    }
}

#[component]
pub fn NotFoundPage() -> impl IntoView {
    view! { <StatusPanel code="404" message="Page not found" back=AppRoute::Home /> }
}

/// The backend refused a request (403).
#[component]
pub fn ForbiddenPage() -> impl IntoView {
    view! {
        <StatusPanel code="403" message="You do not have permission to do that" back=AppRoute::Home />
    }
}

/// A dashboard page the current role may not open.
#[component]
pub fn DashboardForbiddenPage() -> impl IntoView {
    view! {
        <StatusPanel
            code="403"
            message="This page is not available for your account"
            back=AppRoute::DashboardHome
        />
    }
}
