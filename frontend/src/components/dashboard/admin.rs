use crate::auth::use_auth;
use crate::components::feedback::{FormError, use_notifier};
use crate::components::query::{QueryView, use_query};
use leptos::prelude::*;
use leptos::task::spawn_local;
use oneroof::query::QueryKey;
use oneroof::workflow::{AnnouncementDraft, CouponDraft};
use oneroof_shared::{AgreementRequest, Coupon, UserRecord};

// ============================================================================
// 发布公告
// ============================================================================

#[component]
pub fn MakeAnnouncementPage() -> impl IntoView {
    let auth = use_auth();
    let notifier = use_notifier();

    let (title, set_title) = signal(String::new());
    let (description, set_description) = signal(String::new());
    let is_submitting = RwSignal::new(false);
    let error_msg = RwSignal::new(Option::<String>::None);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let draft = AnnouncementDraft {
            title: title.get_untracked(),
            description: description.get_untracked(),
        };
        if let Err(e) = draft.validate() {
            error_msg.set(Some(e.user_message().to_string()));
            return;
        }
        is_submitting.set(true);
        error_msg.set(None);
        let app = auth.app();
        spawn_local(async move {
            match app.announcements.create(&draft).await {
                Ok(()) => {
                    notifier.success("Announcement published");
                    set_title.try_set(String::new());
                    set_description.try_set(String::new());
                }
                Err(e) => {
                    error_msg.try_set(notifier.report(&e));
                }
            }
            is_submitting.try_set(false);
        });
    };

    view! {
        <h1 class="text-3xl font-bold mb-6">"Make an announcement"</h1>
        <form class="card bg-base-100 shadow-xl max-w-2xl" on:submit=on_submit>
            <div class="card-body space-y-2">
                <FormError message=error_msg.into() />
                <input
                    class="input input-bordered"
                    placeholder="Title"
                    prop:value=title
                    on:input=move |ev| set_title.set(event_target_value(&ev))
                />
                <textarea
                    class="textarea textarea-bordered h-40"
                    placeholder="Description"
                    prop:value=description
                    on:input=move |ev| set_description.set(event_target_value(&ev))
                ></textarea>
                <div class="card-actions justify-end">
                    <button class="btn btn-primary" type="submit" disabled=move || is_submitting.get()>
                        "Publish"
                    </button>
                </div>
            </div>
        </form>
    }
}

// ============================================================================
// 成员管理
// ============================================================================

#[component]
fn MemberRow(member: UserRecord) -> impl IntoView {
    let auth = use_auth();
    let notifier = use_notifier();
    let removing = RwSignal::new(false);

    let name = member.name.clone();
    let email = member.email.clone();
    let on_remove = move |_: leptos::ev::MouseEvent| {
        removing.set(true);
        let app = auth.app();
        let member = member.clone();
        spawn_local(async move {
            match app.members.remove(&member).await {
                Ok(message) => notifier.success(message),
                Err(e) => notifier.toast(&e),
            }
            removing.try_set(false);
        });
    };

    view! {
        <tr>
            <td>{name}</td>
            <td>{email}</td>
            <td>
                <button class="btn btn-error btn-sm" disabled=move || removing.get() on:click=on_remove>
                    "Remove"
                </button>
            </td>
        </tr>
    }
}

#[component]
pub fn ManageMembersPage() -> impl IntoView {
    let members = use_query(vec![QueryKey::Members], |app| async move {
        app.members.list().await
    });

    view! {
        <h1 class="text-3xl font-bold mb-6">"Manage members"</h1>
        <QueryView
            query=members
            view=|list: &Vec<UserRecord>| {
                if list.is_empty() {
                    return view! { <p class="opacity-70">"No members yet."</p> }.into_any();
                }
                let rows = list
                    .iter()
                    .cloned()
                    .map(|member| view! { <MemberRow member=member /> })
                    .collect_view();
                view! {
                    <table class="table table-zebra w-full">
                        <thead><tr><th>"Name"</th><th>"Email"</th><th></th></tr></thead>
                        <tbody>{rows}</tbody>
                    </table>
                }
                .into_any()
            }
        />
    }
}

// ============================================================================
// 租约申请
// ============================================================================

#[component]
fn AgreementCard(request: AgreementRequest) -> impl IntoView {
    let auth = use_auth();
    let notifier = use_notifier();
    let busy = RwSignal::new(auth.app().agreements.is_locked(&request.id));

    let accept = {
        let request = request.clone();
        move |_: leptos::ev::MouseEvent| {
            busy.set(true);
            let app = auth.app();
            let request = request.clone();
            spawn_local(async move {
                match app.agreements.accept_request(&request).await {
                    Ok(message) => notifier.success(message),
                    Err(e) => {
                        notifier.toast(&e);
                        busy.try_set(app.agreements.is_locked(&request.id));
                    }
                }
            });
        }
    };

    let reject = {
        let request = request.clone();
        move |_: leptos::ev::MouseEvent| {
            busy.set(true);
            let app = auth.app();
            let request = request.clone();
            spawn_local(async move {
                match app.agreements.reject_request(&request).await {
                    Ok(message) => notifier.success(message),
                    Err(e) => {
                        notifier.toast(&e);
                        busy.try_set(app.agreements.is_locked(&request.id));
                    }
                }
            });
        }
    };

    view! {
        <div class="card bg-base-100 shadow">
            <div class="card-body">
                <h3 class="card-title">{request.user_name.clone()}</h3>
                <p class="text-sm opacity-70">{request.user_email.clone()}</p>
                <p>
                    {format!(
                        "Floor {} · Block {} · Apartment {} · ${:.2}",
                        request.floor, request.block, request.apartment_no, request.rent
                    )}
                </p>
                <p class="text-xs opacity-60">{format!("Requested {}", request.created_date.date_label())}</p>
                <div class="card-actions justify-end">
                    <button class="btn btn-success btn-sm" disabled=move || busy.get() on:click=accept>
                        "Accept"
                    </button>
                    <button class="btn btn-outline btn-error btn-sm" disabled=move || busy.get() on:click=reject>
                        "Reject"
                    </button>
                </div>
            </div>
        </div>
    }
}

#[component]
pub fn AgreementRequestsPage() -> impl IntoView {
    let requests = use_query(vec![QueryKey::PendingAgreements], |app| async move {
        app.agreements.pending_requests().await
    });

    view! {
        <h1 class="text-3xl font-bold mb-6">"Agreement requests"</h1>
        <QueryView
            query=requests
            view=|list: &Vec<AgreementRequest>| {
                if list.is_empty() {
                    return view! { <p class="opacity-70">"No pending requests."</p> }.into_any();
                }
                let cards = list
                    .iter()
                    .cloned()
                    .map(|request| view! { <AgreementCard request=request /> })
                    .collect_view();
                view! { <div class="grid gap-4 md:grid-cols-2">{cards}</div> }.into_any()
            }
        />
    }
}

// ============================================================================
// 优惠券管理
// ============================================================================

#[component]
fn CouponForm() -> impl IntoView {
    let auth = use_auth();
    let notifier = use_notifier();

    let (code, set_code) = signal(String::new());
    let (discount, set_discount) = signal(String::new());
    let (description, set_description) = signal(String::new());
    let is_submitting = RwSignal::new(false);
    let error_msg = RwSignal::new(Option::<String>::None);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let draft = CouponDraft {
            code: code.get_untracked(),
            discount: discount.get_untracked(),
            description: description.get_untracked(),
        };
        if let Err(e) = draft.validate() {
            error_msg.set(Some(e.user_message().to_string()));
            return;
        }
        is_submitting.set(true);
        error_msg.set(None);
        let app = auth.app();
        spawn_local(async move {
            match app.coupons.create(&draft).await {
                Ok(coupon) => {
                    notifier.success(format!("Coupon {} created", coupon.code));
                    set_code.try_set(String::new());
                    set_discount.try_set(String::new());
                    set_description.try_set(String::new());
                }
                Err(e) => {
                    error_msg.try_set(notifier.report(&e));
                }
            }
            is_submitting.try_set(false);
        });
    };

    view! {
        <form class="card bg-base-100 shadow mb-8" on:submit=on_submit>
            <div class="card-body">
                <h2 class="card-title">"New coupon"</h2>
                <FormError message=error_msg.into() />
                <div class="grid gap-2 md:grid-cols-3">
                    <input
                        class="input input-bordered"
                        placeholder="Code"
                        prop:value=code
                        on:input=move |ev| set_code.set(event_target_value(&ev))
                    />
                    <input
                        class="input input-bordered"
                        type="number"
                        placeholder="Discount %"
                        prop:value=discount
                        on:input=move |ev| set_discount.set(event_target_value(&ev))
                    />
                    <input
                        class="input input-bordered"
                        placeholder="Description"
                        prop:value=description
                        on:input=move |ev| set_description.set(event_target_value(&ev))
                    />
                </div>
                <div class="card-actions justify-end">
                    <button class="btn btn-primary" type="submit" disabled=move || is_submitting.get()>
                        "Create"
                    </button>
                </div>
            </div>
        </form>
    }
}

#[component]
fn CouponRow(coupon: Coupon) -> impl IntoView {
    let auth = use_auth();
    let notifier = use_notifier();
    let toggling = RwSignal::new(false);

    let available = coupon.is_available;
    let code = coupon.code.clone();
    let discount = format!("{}%", coupon.discount);
    let description = coupon.description.clone();
    let on_toggle = move |_: leptos::ev::MouseEvent| {
        toggling.set(true);
        let app = auth.app();
        let coupon = coupon.clone();
        spawn_local(async move {
            match app.coupons.toggle_availability(&coupon).await {
                Ok(now_available) => notifier.success(if now_available {
                    format!("{} is available", coupon.code)
                } else {
                    format!("{} is unavailable", coupon.code)
                }),
                Err(e) => notifier.toast(&e),
            }
            toggling.try_set(false);
        });
    };

    view! {
        <tr>
            <td class="font-mono">{code}</td>
            <td>{discount}</td>
            <td>{description}</td>
            <td>
                <input
                    type="checkbox"
                    class="toggle toggle-success"
                    prop:checked=available
                    disabled=move || toggling.get()
                    on:click=on_toggle
                />
            </td>
        </tr>
    }
}

#[component]
pub fn ManageCouponsPage() -> impl IntoView {
    let coupons = use_query(vec![QueryKey::Coupons], |app| async move {
        app.coupons.list().await
    });

    view! {
        <h1 class="text-3xl font-bold mb-6">"Manage coupons"</h1>
        <CouponForm />
        <QueryView
            query=coupons
            view=|list: &Vec<Coupon>| {
                let rows = list
                    .iter()
                    .cloned()
                    .map(|coupon| view! { <CouponRow coupon=coupon /> })
                    .collect_view();
                view! {
                    <table class="table w-full">
                        <thead>
                            <tr><th>"Code"</th><th>"Discount"</th><th>"Description"</th><th>"Available"</th></tr>
                        </thead>
                        <tbody>{rows}</tbody>
                    </table>
                }
            }
        />
    }
}
