use crate::auth::{AuthContext, use_auth};
use crate::components::feedback::Spinner;
use crate::components::layout::Navbar;
use crate::components::query::{QueryView, use_query};
use crate::web::router::{Link, use_router};
use leptos::prelude::*;
use oneroof::dashboard::{DashboardView, Residence, sidebar_for};
use oneroof::query::QueryKey;
use oneroof_shared::{AdminSummary, Announcement, UserRecord};

pub mod admin;
pub mod member;

// ============================================================================
// 面板外壳
// ============================================================================

#[component]
pub fn DashboardShell(children: Children) -> impl IntoView {
    let auth = use_auth();
    let router = use_router();

    let sidebar = move || {
        let current = router.route().get();
        sidebar_for(auth.role.get().role)
            .into_iter()
            .filter_map(|route| route.nav_label().map(|label| (route, label)))
            .map(|(route, label)| {
                let class = if route == current { "active" } else { "" };
                view! { <li><Link to=route.to_path() class=class>{label}</Link></li> }
            })
            .collect_view()
    };

    view! {
        <Navbar />
        <div class="flex flex-col md:flex-row min-h-[80vh]">
            <aside class="md:w-64 bg-base-200">
                <ul class="menu p-4 w-full">
                    <li class="menu-title">"Dashboard"</li>
                    {sidebar}
                </ul>
            </aside>
            <main class="flex-1 p-4 md:p-8">{children()}</main>
        </div>
    }
}

// ============================================================================
// 概览
// ============================================================================

#[component]
pub fn DashboardHome() -> impl IntoView {
    let auth = use_auth();

    move || match DashboardView::for_role(auth.role.get()) {
        DashboardView::Loading => view! { <Spinner /> }.into_any(),
        DashboardView::User => view! {
            <div class="space-y-2">
                <h1 class="text-3xl font-bold">"Welcome"</h1>
                <p>"Browse apartments and send an agreement request to become a member."</p>
            </div>
        }
        .into_any(),
        DashboardView::Member => view! { <ResidenceCard /> }.into_any(),
        DashboardView::Admin => view! { <AdminOverview /> }.into_any(),
    }
}

/// The signed-in user's backend record, as resolved with the role.
pub(crate) fn own_record(auth: AuthContext) -> Option<UserRecord> {
    let email = auth.identity()?.email;
    auth.app().roles.profile(&email)
}

#[component]
fn ResidenceCard() -> impl IntoView {
    let auth = use_auth();
    move || {
        auth.role.track();
        match own_record(auth).as_ref().and_then(Residence::of) {
            Some(residence) => {
                let since = residence
                    .agreement_at
                    .map(|t| t.date_label())
                    .unwrap_or_else(|| "-".to_string());
                view! {
                    <div class="stats shadow w-full stats-vertical md:stats-horizontal bg-base-100">
                        <div class="stat">
                            <div class="stat-title">"Apartment"</div>
                            <div class="stat-value text-primary">{residence.apartment.apartment_no.clone()}</div>
                            <div class="stat-desc">{format!("Block {} · Floor {}", residence.apartment.block, residence.apartment.floor)}</div>
                        </div>
                        <div class="stat">
                            <div class="stat-title">"Monthly rent"</div>
                            <div class="stat-value">{format!("${:.2}", residence.apartment.rent)}</div>
                        </div>
                        <div class="stat">
                            <div class="stat-title">"Member since"</div>
                            <div class="stat-value text-2xl">{since}</div>
                        </div>
                    </div>
                }
                .into_any()
            }
            None => view! {
                <p class="opacity-70">"No apartment is linked to this account."</p>
            }
            .into_any(),
        }
    }
}

#[component]
fn AdminOverview() -> impl IntoView {
    let summary = use_query(
        vec![QueryKey::AdminSummary, QueryKey::Members, QueryKey::Apartments],
        |app| async move { app.dashboard.admin_summary().await },
    );

    view! {
        <QueryView
            query=summary
            view=|s: &AdminSummary| {
                let admin = s.admin.as_ref().map(|a| a.name.clone()).unwrap_or_default();
                view! {
                    <h1 class="text-3xl font-bold mb-6">{format!("Hello, {}", admin)}</h1>
                    <div class="stats shadow w-full stats-vertical lg:stats-horizontal bg-base-100">
                        <div class="stat">
                            <div class="stat-title">"Rooms"</div>
                            <div class="stat-value">{s.total_rooms}</div>
                            <div class="stat-desc">{format!("{} available", s.available_rooms)}</div>
                        </div>
                        <div class="stat">
                            <div class="stat-title">"Available"</div>
                            <div class="stat-value text-success">{format!("{:.1}%", s.available_percentage)}</div>
                        </div>
                        <div class="stat">
                            <div class="stat-title">"Under agreement"</div>
                            <div class="stat-value text-primary">{format!("{:.1}%", s.agreement_percentage)}</div>
                        </div>
                        <div class="stat">
                            <div class="stat-title">"Users"</div>
                            <div class="stat-value">{s.total_users}</div>
                            <div class="stat-desc">{format!("{} members", s.total_members)}</div>
                        </div>
                    </div>
                }
            }
        />
    }
}

// ============================================================================
// 个人资料
// ============================================================================

#[component]
pub fn ProfilePage() -> impl IntoView {
    let auth = use_auth();

    let details = move || {
        auth.role.track();
        let Some(identity) = auth.identity() else {
            return view! { <Spinner /> }.into_any();
        };
        let role = auth
            .role
            .get()
            .role
            .map(|r| r.to_string())
            .unwrap_or_else(|| "…".to_string());
        let residence = own_record(auth).as_ref().and_then(Residence::of);
        view! {
            <div class="card bg-base-100 shadow-xl max-w-xl">
                <div class="card-body items-center text-center">
                    <div class="avatar">
                        <div class="w-24 rounded-full bg-base-300">
                            <img src=identity.photo_url.clone().unwrap_or_default() alt="" />
                        </div>
                    </div>
                    <h2 class="card-title">{identity.name_or_email().to_string()}</h2>
                    <p class="opacity-70">{identity.email.clone()}</p>
                    <div class="badge badge-outline">{role}</div>
                    {residence.map(|r| view! {
                        <p class="mt-4">
                            {format!(
                                "Block {} · Floor {} · Apartment {} · ${:.2}/month",
                                r.apartment.block, r.apartment.floor, r.apartment.apartment_no, r.apartment.rent
                            )}
                        </p>
                    })}
                </div>
            </div>
        }
        .into_any()
    };

    view! {
        <h1 class="text-3xl font-bold mb-6">"My profile"</h1>
        {details}
    }
}

// ============================================================================
// 公告
// ============================================================================

#[component]
pub fn AnnouncementsPage() -> impl IntoView {
    let announcements = use_query(vec![QueryKey::Announcements], |app| async move {
        app.announcements.list().await
    });

    view! {
        <h1 class="text-3xl font-bold mb-6">"Announcements"</h1>
        <QueryView
            query=announcements
            view=|list: &Vec<Announcement>| {
                if list.is_empty() {
                    return view! { <p class="opacity-70">"No announcements yet."</p> }.into_any();
                }
                list.iter()
                    .map(|a| view! {
                        <div class="card bg-base-100 shadow mb-4">
                            <div class="card-body">
                                <h2 class="card-title">{a.title.clone()}</h2>
                                <p class="text-xs opacity-60">{a.created_at.date_label()}</p>
                                <p>{a.description.clone()}</p>
                            </div>
                        </div>
                    })
                    .collect_view()
                    .into_any()
            }
        />
    }
}
