//! Member rent payment: month selection, card checkout, history.

use crate::auth::use_auth;
use crate::components::dashboard::own_record;
use crate::components::feedback::{FormError, Spinner, use_notifier};
use crate::components::query::{QueryView, use_query};
use crate::web::router::{Link, use_router};
use crate::web::stripe::StripeCard;
use leptos::prelude::*;
use leptos::task::spawn_local;
use oneroof::query::QueryKey;
use oneroof::route::{AppRoute, Navigation};
use oneroof::workflow::{CheckoutOutcome, PaymentDraft, PaymentOrder, PaymentQuote};
use oneroof_shared::{Month, PaymentRecord};
use std::rc::Rc;

/// The order carried from month selection to checkout. Lost on reload.
#[derive(Clone, Copy)]
pub struct Checkout(RwSignal<Option<PaymentOrder>>);

pub fn provide_checkout() {
    provide_context(Checkout(RwSignal::new(None)));
}

fn use_checkout() -> Checkout {
    use_context::<Checkout>().expect("Checkout should be provided")
}

// ============================================================================
// 选择月份
// ============================================================================

#[component]
pub fn MakePaymentPage() -> impl IntoView {
    let auth = use_auth();
    let router = use_router();
    let Checkout(checkout) = use_checkout();

    let (month, set_month) = signal(Option::<Month>::None);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let form = move || {
        auth.role.track();
        let draft = match own_record(auth).as_ref().map(PaymentDraft::from_profile) {
            None => return view! { <Spinner /> }.into_any(),
            Some(Err(e)) => {
                return view! { <div class="alert alert-warning">{e.user_message().to_string()}</div> }
                    .into_any();
            }
            Some(Ok(draft)) => draft,
        };

        let on_submit = {
            let draft = draft.clone();
            move |ev: leptos::ev::SubmitEvent| {
                ev.prevent_default();
                match draft.select_month(month.get_untracked()) {
                    Ok(order) => {
                        set_error_msg.set(None);
                        checkout.set(Some(order));
                        router.go(Navigation::push(AppRoute::Payment));
                    }
                    Err(e) => set_error_msg.set(Some(e.user_message().to_string())),
                }
            }
        };

        let field = |label: &'static str, value: String| {
            view! {
                <label class="form-control">
                    <span class="label-text">{label}</span>
                    <input class="input input-bordered" readonly prop:value=value />
                </label>
            }
        };

        view! {
            <form class="card bg-base-100 shadow-xl max-w-xl" on:submit=on_submit>
                <div class="card-body space-y-2">
                    <FormError message=error_msg.into() />
                    {field("Email", draft.email.clone())}
                    {field("Floor", draft.apartment.floor.to_string())}
                    {field("Block", draft.apartment.block.clone())}
                    {field("Apartment", draft.apartment.apartment_no.clone())}
                    {field("Rent", format!("{:.2}", draft.apartment.rent))}
                    <label class="form-control">
                        <span class="label-text">"Month"</span>
                        <select
                            class="select select-bordered"
                            on:change=move |ev| set_month.set(event_target_value(&ev).parse::<Month>().ok())
                        >
                            <option value="" selected=move || month.get().is_none()>"Select a month"</option>
                            {Month::ALL
                                .iter()
                                .map(|m| view! { <option value=m.name()>{m.name()}</option> })
                                .collect_view()}
                        </select>
                    </label>
                    <div class="card-actions justify-end mt-4">
                        <button class="btn btn-primary" type="submit">"Continue to payment"</button>
                    </div>
                </div>
            </form>
        }
        .into_any()
    };

    view! {
        <h1 class="text-3xl font-bold mb-6">"Make a payment"</h1>
        {form}
    }
}

// ============================================================================
// 卡片支付
// ============================================================================

#[component]
pub fn CheckoutPage() -> impl IntoView {
    let Checkout(checkout) = use_checkout();

    move || match PaymentOrder::require(checkout.get()) {
        Ok(order) => view! { <CheckoutForm order=order /> }.into_any(),
        Err(e) => view! {
            <div role="alert" class="alert alert-info max-w-xl">
                <span>{e.user_message().to_string()}</span>
                <Link to=AppRoute::MakePayment.to_path() class="btn btn-sm">"Choose a month"</Link>
            </div>
        }
        .into_any(),
    }
}

#[component]
fn CheckoutForm(order: PaymentOrder) -> impl IntoView {
    let auth = use_auth();
    let router = use_router();
    let notifier = use_notifier();
    let Checkout(checkout) = use_checkout();

    let quote = RwSignal::new(order.quote());
    let (coupon_code, set_coupon_code) = signal(String::new());
    let applying = RwSignal::new(false);
    let paying = RwSignal::new(false);
    // 已扣款但未入账：留在本页，不允许再次支付
    let unrecorded = RwSignal::new(false);
    let error_msg = RwSignal::new(Option::<String>::None);

    // 卡片输入随组件卸载而卸载
    let card_ref = NodeRef::<leptos::html::Div>::new();
    let card: StoredValue<Option<Rc<StripeCard>>, leptos::prelude::LocalStorage> =
        StoredValue::new_local(None);
    let billing_email = order.email.clone();
    Effect::new(move |_| {
        let Some(element) = card_ref.get() else {
            return;
        };
        if card.with_value(Option::is_some) {
            return;
        }
        let app = auth.app();
        let name = auth
            .identity()
            .map(|i| i.name_or_email().to_string())
            .unwrap_or_else(|| billing_email.clone());
        match StripeCard::mount(&app.config.stripe_publishable_key, &element, &name, &billing_email) {
            Ok(mounted) => card.set_value(Some(Rc::new(mounted))),
            Err(e) => error_msg.set(Some(e.user_message().to_string())),
        }
    });

    let on_apply = move |_: leptos::ev::MouseEvent| {
        applying.set(true);
        error_msg.set(None);
        let app = auth.app();
        let current = quote.get_untracked();
        let code = coupon_code.get_untracked();
        spawn_local(async move {
            match app.payments.apply_coupon(&current, &code).await {
                Ok(next) => {
                    notifier.success(format!("Coupon applied: {:.2} to pay", next.payable()));
                    quote.try_set(next);
                }
                Err(e) => {
                    error_msg.try_set(Some(e.user_message().to_string()));
                }
            }
            applying.try_set(false);
        });
    };

    let pay_order = order.clone();
    let on_pay = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let Some(gateway) = card.get_value() else {
            error_msg.set(Some("The card form is not ready".to_string()));
            return;
        };
        let app = auth.app();
        if app.payments.is_paying() || unrecorded.get_untracked() {
            return;
        }
        paying.set(true);
        error_msg.set(None);
        let order = pay_order.clone();
        let current: PaymentQuote = quote.get_untracked();
        spawn_local(async move {
            let result = app.payments.pay(gateway.as_ref(), &order, &current).await;
            if let Ok(receipt) = &result {
                notifier.success(format!(
                    "Payment for {} completed ({})",
                    receipt.record.month, receipt.record.transaction_id
                ));
            }
            match CheckoutOutcome::of(&result) {
                CheckoutOutcome::Leave(next) => {
                    router.go(next);
                    checkout.try_set(None);
                }
                CheckoutOutcome::Stay { message, charged } => {
                    if charged {
                        notifier.error(message.clone());
                        unrecorded.try_set(true);
                    }
                    error_msg.try_set(Some(message));
                }
            }
            paying.try_set(false);
        });
    };

    let on_settled = Callback::new(move |_| {
        router.go(Navigation::push(AppRoute::PayHistory));
        checkout.try_set(None);
    });
    let unsettled_email = order.email.clone();

    let summary = format!(
        "{} · Block {} · Apartment {}",
        order.month, order.apartment.block, order.apartment.apartment_no
    );

    view! {
        <h1 class="text-3xl font-bold mb-6">"Checkout"</h1>
        <form class="card bg-base-100 shadow-xl max-w-xl" on:submit=on_pay>
            <div class="card-body space-y-4">
                <p class="opacity-70">{summary}</p>
                <div class="text-2xl font-bold">
                    {move || format!("${:.2}", quote.with(PaymentQuote::payable))}
                    <Show when=move || quote.with(|q| q.applied.is_some())>
                        <span class="ml-2 text-sm line-through opacity-60">
                            {move || format!("${:.2}", quote.with(|q| q.base_rent))}
                        </span>
                    </Show>
                </div>

                <div class="join w-full">
                    <input
                        class="input input-bordered join-item flex-1"
                        placeholder="Coupon code"
                        prop:value=coupon_code
                        on:input=move |ev| set_coupon_code.set(event_target_value(&ev))
                    />
                    <button
                        type="button"
                        class="btn join-item"
                        disabled=move || applying.get()
                        on:click=on_apply
                    >
                        "Apply"
                    </button>
                </div>

                <div node_ref=card_ref class="p-4 border rounded-box"></div>
                <FormError message=error_msg.into() />
                <Show when=move || unrecorded.get()>
                    <UnsettledBanner email=unsettled_email.clone() on_settled=on_settled />
                </Show>

                <button
                    class="btn btn-primary"
                    type="submit"
                    disabled=move || paying.get() || unrecorded.get()
                >
                    {move || if paying.get() { "Processing..." } else { "Pay" }}
                </button>
            </div>
        </form>
    }
}

// ============================================================================
// 支付记录
// ============================================================================

#[component]
fn UnsettledBanner(email: String, on_settled: Callback<()>) -> impl IntoView {
    let auth = use_auth();
    let notifier = use_notifier();
    let pending = RwSignal::new(auth.app().payments.unsettled(&email).len());
    let retrying = RwSignal::new(false);

    let on_retry = move |_: leptos::ev::MouseEvent| {
        retrying.set(true);
        let app = auth.app();
        let email = email.clone();
        spawn_local(async move {
            let report = app.payments.retry_unsettled(&email).await;
            if !report.settled.is_empty() {
                notifier.success(format!("{} payment(s) saved", report.settled.len()));
                on_settled.run(());
            }
            if let Some((_, e)) = report.failed.first() {
                notifier.error(e.user_message());
            }
            pending.try_set(app.payments.unsettled(&email).len());
            retrying.try_set(false);
        });
    };

    view! {
        <Show when=move || { pending.get() > 0 }>
            <div role="alert" class="alert alert-warning mb-6">
                <span>
                    {move || format!("{} charged payment(s) have not been saved yet.", pending.get())}
                </span>
                <button class="btn btn-sm" disabled=move || retrying.get() on:click=on_retry>
                    "Retry now"
                </button>
            </div>
        </Show>
    }
}

#[component]
pub fn PayHistoryPage() -> impl IntoView {
    let auth = use_auth();
    let email = auth.identity().map(|i| i.email).unwrap_or_default();

    let banner_email = email.clone();
    let history = use_query(vec![QueryKey::Payments(email.clone())], move |app| {
        let email = email.clone();
        async move { app.payments.history(&email).await }
    });

    view! {
        <h1 class="text-3xl font-bold mb-6">"Payment history"</h1>
        <UnsettledBanner email=banner_email on_settled=Callback::new(move |_| history.refetch()) />
        <QueryView
            query=history
            view=|records: &Vec<PaymentRecord>| {
                if records.is_empty() {
                    return view! { <p class="opacity-70">"No payments yet."</p> }.into_any();
                }
                let rows = records
                    .iter()
                    .map(|r| view! {
                        <tr>
                            <td>{r.month.name()}</td>
                            <td>{format!("${:.2}", r.rent)}</td>
                            <td>{r.coupon_code.clone().unwrap_or_else(|| "-".to_string())}</td>
                            <td class="font-mono text-xs">{r.transaction_id.clone()}</td>
                            <td>{r.date.date_label()}</td>
                        </tr>
                    })
                    .collect_view();
                view! {
                    <div class="overflow-x-auto">
                        <table class="table table-zebra w-full">
                            <thead>
                                <tr>
                                    <th>"Month"</th>
                                    <th>"Amount"</th>
                                    <th>"Coupon"</th>
                                    <th>"Transaction"</th>
                                    <th>"Date"</th>
                                </tr>
                            </thead>
                            <tbody>{rows}</tbody>
                        </table>
                    </div>
                }
                .into_any()
            }
        />
    }
}
