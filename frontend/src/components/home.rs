use crate::components::apartments::ApartmentCard;
use crate::components::query::{QueryView, use_query};
use crate::web::router::Link;
use leptos::prelude::*;
use oneroof::query::QueryKey;
use oneroof::route::AppRoute;
use oneroof::workflow::coupon::marketing_coupons;
use oneroof_shared::{Apartment, Coupon};

#[component]
pub fn HomePage() -> impl IntoView {
    let featured = use_query(vec![QueryKey::Apartments], |app| async move {
        app.apartments.featured().await
    });
    let coupons = use_query(vec![QueryKey::Coupons], |app| async move {
        app.coupons.list().await.map(|all| marketing_coupons(&all))
    });

    view! {
        <section class="hero min-h-[50vh] bg-base-200">
            <div class="hero-content text-center">
                <div class="max-w-xl">
                    <h1 class="text-5xl font-bold">"A home in one building"</h1>
                    <p class="py-6">
                        "Browse apartments, send an agreement request and pay your rent online."
                    </p>
                    <Link to=AppRoute::Apartments.to_path() class="btn btn-primary">
                        "View apartments"
                    </Link>
                </div>
            </div>
        </section>

        <section class="max-w-6xl mx-auto px-4 py-12">
            <h2 class="text-3xl font-bold mb-6">"Featured apartments"</h2>
            <QueryView
                query=featured
                view=|apartments: &Vec<Apartment>| {
                    let apartments = apartments.clone();
                    view! {
                        <div class="grid gap-6 sm:grid-cols-2 lg:grid-cols-3">
                            {apartments
                                .into_iter()
                                .map(|apartment| view! { <ApartmentCard apartment=apartment /> })
                                .collect_view()}
                        </div>
                    }
                }
            />
        </section>

        <section class="bg-base-200">
            <div class="max-w-6xl mx-auto px-4 py-12">
                <h2 class="text-3xl font-bold mb-6">"Current offers"</h2>
                <QueryView
                    query=coupons
                    view=|coupons: &Vec<Coupon>| {
                        if coupons.is_empty() {
                            return view! { <p class="opacity-70">"No offers right now."</p> }.into_any();
                        }
                        let coupons = coupons.clone();
                        view! {
                            <div class="grid gap-4 md:grid-cols-3">
                                {coupons
                                    .into_iter()
                                    .map(|coupon| view! {
                                        <div class="card bg-base-100 shadow">
                                            <div class="card-body">
                                                <h3 class="card-title">{format!("{}% off", coupon.discount)}</h3>
                                                <p>{coupon.description}</p>
                                                <div class="badge badge-secondary font-mono">{coupon.code}</div>
                                            </div>
                                        </div>
                                    })
                                    .collect_view()}
                            </div>
                        }
                        .into_any()
                    }
                />
            </div>
        </section>
    }
}

const FAQ: &[(&str, &str)] = &[
    (
        "How do I rent an apartment?",
        "Sign in, open the apartments page and send an agreement request. An administrator reviews it.",
    ),
    (
        "Can I have more than one pending request?",
        "No. Each account can hold one pending agreement request at a time.",
    ),
    (
        "How do I pay rent?",
        "Once your request is accepted you become a member and can pay from the dashboard.",
    ),
    (
        "How do coupons work?",
        "Enter an available coupon code at checkout. The discount applies to that month's rent.",
    ),
];

#[component]
pub fn FaqPage() -> impl IntoView {
    view! {
        <section class="max-w-3xl mx-auto px-4 py-12 space-y-4">
            <h1 class="text-4xl font-bold mb-6">"Frequently asked questions"</h1>
            {FAQ
                .iter()
                .map(|(q, a)| view! {
                    <div class="collapse collapse-arrow bg-base-200">
                        <input type="checkbox" />
                        <div class="collapse-title text-lg font-medium">{*q}</div>
                        <div class="collapse-content"><p>{*a}</p></div>
                    </div>
                })
                .collect_view()}
        </section>
    }
}
