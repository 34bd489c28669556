use crate::auth::use_auth;
use crate::components::feedback::use_notifier;
use crate::web::router::Link;
use leptos::prelude::*;
use leptos::task::spawn_local;
use oneroof::route::AppRoute;

#[component]
pub fn Navbar() -> impl IntoView {
    let auth = use_auth();
    let notifier = use_notifier();

    let on_sign_out = move |_: leptos::ev::MouseEvent| {
        let app = auth.app();
        spawn_local(async move {
            match app.accounts.sign_out().await {
                Ok(()) => notifier.success("Signed out"),
                Err(e) => notifier.error(e.user_message()),
            }
        });
    };

    let user_menu = move || {
        let session = auth.session.get();
        if session.is_resolving {
            return view! { <span class="loading loading-dots loading-sm"></span> }.into_any();
        }
        match session.identity {
            None => view! {
                <Link to=AppRoute::SignIn.to_path() class="btn btn-primary btn-sm">"Sign in"</Link>
            }
            .into_any(),
            Some(identity) => {
                let name = identity.name_or_email().to_string();
                let photo = identity.photo_url.clone().unwrap_or_default();
                view! {
                    <div class="dropdown dropdown-end">
                        <div tabindex="0" role="button" class="btn btn-ghost btn-circle avatar">
                            <div class="w-10 rounded-full bg-base-300">
                                <img alt=name.clone() src=photo />
                            </div>
                        </div>
                        <ul tabindex="0" class="dropdown-content z-[1] menu p-2 shadow bg-base-100 rounded-box w-52">
                            <li class="menu-title">{name}</li>
                            <li><Link to=AppRoute::DashboardHome.to_path()>"Dashboard"</Link></li>
                            <li><a on:click=on_sign_out>"Sign out"</a></li>
                        </ul>
                    </div>
                }
                .into_any()
            }
        }
    };

    view! {
        <div class="navbar bg-base-100 shadow-sm sticky top-0 z-40 px-4">
            <div class="flex-1">
                <Link to=AppRoute::Home.to_path() class="btn btn-ghost text-xl">"OneRoof"</Link>
            </div>
            <div class="flex-none gap-2">
                <ul class="menu menu-horizontal px-1 hidden md:flex">
                    <li><Link to=AppRoute::Home.to_path()>"Home"</Link></li>
                    <li><Link to=AppRoute::Apartments.to_path()>"Apartments"</Link></li>
                    <li><Link to=AppRoute::Faq.to_path()>"FAQ"</Link></li>
                </ul>
                {user_menu}
            </div>
        </div>
    }
}

#[component]
pub fn Footer() -> impl IntoView {
    view! {
        <footer class="footer footer-center p-8 bg-base-200 text-base-content mt-12">
            <aside>
                <p class="font-bold">"OneRoof Apartments"</p>
                <p>"Community living, managed in one place."</p>
            </aside>
        </footer>
    }
}
