use crate::auth::use_auth;
use crate::components::feedback::{FormError, use_notifier};
use crate::components::query::{QueryView, use_query};
use crate::web::router::use_router;
use leptos::prelude::*;
use leptos::task::spawn_local;
use oneroof::client::Navigator;
use oneroof::query::QueryKey;
use oneroof::workflow::{RentFilter, SubmitOutcome};
use oneroof_shared::{Apartment, ApartmentPage};

#[component]
pub fn ApartmentCard(apartment: Apartment) -> impl IntoView {
    let auth = use_auth();
    let router = use_router();
    let notifier = use_notifier();
    let submitting = RwSignal::new(false);

    let image = apartment.image.clone().unwrap_or_default();
    let title = format!("Block {} / Apartment {}", apartment.block, apartment.apartment_no);
    let details = format!("Floor {} · ${:.2} per month", apartment.floor, apartment.rent);

    let on_agreement = move |_: leptos::ev::MouseEvent| {
        if submitting.get_untracked() {
            return;
        }
        submitting.set(true);
        let app = auth.app();
        let apartment = apartment.clone();
        spawn_local(async move {
            let identity = app.session.current_identity();
            let result = app
                .agreements
                .submit_request(identity.as_ref(), &apartment, &router.current_path())
                .await;
            match result {
                Ok(SubmitOutcome::Submitted) => {
                    notifier.success("Agreement request sent. An administrator will review it.")
                }
                Ok(SubmitOutcome::SignInRequired(navigation)) => router.go(navigation),
                Err(e) => {
                    if let Some(message) = notifier.report(&e) {
                        notifier.error(message);
                    }
                }
            }
            submitting.try_set(false);
        });
    };

    view! {
        <div class="card bg-base-100 shadow-xl">
            <figure class="h-48 bg-base-300">
                <img class="object-cover w-full h-full" src=image alt=title.clone() />
            </figure>
            <div class="card-body">
                <h3 class="card-title">{title}</h3>
                <p>{details}</p>
                <div class="card-actions justify-end">
                    <button
                        class="btn btn-primary btn-sm"
                        disabled=move || submitting.get()
                        on:click=on_agreement
                    >
                        {move || if submitting.get() { "Sending..." } else { "Agreement" }}
                    </button>
                </div>
            </div>
        </div>
    }
}

#[component]
pub fn ApartmentsPage() -> impl IntoView {
    let (page, set_page) = signal(1u32);
    let (filter, set_filter) = signal(RentFilter::default());
    let (min_input, set_min_input) = signal(String::new());
    let (max_input, set_max_input) = signal(String::new());
    let (filter_error, set_filter_error) = signal(Option::<String>::None);

    let listing = use_query(vec![QueryKey::Apartments], move |app| {
        let query = filter.get().query(page.get());
        async move { app.apartments.list(&query).await }
    });

    let on_filter = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        match RentFilter::parse(&min_input.get_untracked(), &max_input.get_untracked()) {
            Ok(parsed) => {
                set_filter_error.set(None);
                set_filter.set(parsed);
                set_page.set(1);
            }
            Err(e) => set_filter_error.set(Some(e.user_message().to_string())),
        }
    };

    let on_clear = move |_: leptos::ev::MouseEvent| {
        set_min_input.set(String::new());
        set_max_input.set(String::new());
        set_filter_error.set(None);
        set_filter.set(RentFilter::default());
        set_page.set(1);
    };

    view! {
        <section class="max-w-6xl mx-auto px-4 py-12">
            <h1 class="text-4xl font-bold mb-6">"Apartments"</h1>

            <form class="flex flex-wrap items-end gap-4 mb-8" on:submit=on_filter>
                <label class="form-control">
                    <span class="label-text">"Min rent"</span>
                    <input
                        type="number"
                        min="0"
                        class="input input-bordered input-sm"
                        prop:value=min_input
                        on:input=move |ev| set_min_input.set(event_target_value(&ev))
                    />
                </label>
                <label class="form-control">
                    <span class="label-text">"Max rent"</span>
                    <input
                        type="number"
                        min="0"
                        class="input input-bordered input-sm"
                        prop:value=max_input
                        on:input=move |ev| set_max_input.set(event_target_value(&ev))
                    />
                </label>
                <button class="btn btn-primary btn-sm" type="submit">"Search"</button>
                <button class="btn btn-ghost btn-sm" type="button" on:click=on_clear>"Clear"</button>
            </form>
            <FormError message=filter_error.into() />

            <QueryView
                query=listing
                view=move |result: &ApartmentPage| {
                    let apartments = result.apartments.clone();
                    let total_pages = result.total_pages.max(1);
                    let current = result.page.max(1);
                    view! {
                        <p class="text-sm opacity-70 mb-4">{format!("{} apartments", result.total)}</p>
                        <div class="grid gap-6 sm:grid-cols-2 lg:grid-cols-3">
                            {apartments
                                .into_iter()
                                .map(|apartment| view! { <ApartmentCard apartment=apartment /> })
                                .collect_view()}
                        </div>
                        <div class="join flex justify-center mt-8">
                            {(1..=total_pages)
                                .map(|n| {
                                    let class = if n == current { "join-item btn btn-active" } else { "join-item btn" };
                                    view! {
                                        <button class=class on:click=move |_| set_page.set(n)>{n}</button>
                                    }
                                })
                                .collect_view()}
                        </div>
                    }
                }
            />
        </section>
    }
}
