//! Stripe.js 卡片支付绑定
//!
//! A [`StripeCard`] owns one mounted card element. It is created by the
//! checkout page and unmounted when dropped.

use crate::serde_helper::{from_value, js_error_message};
use oneroof::error::{AppError, AppResult};
use oneroof::workflow::PaymentGateway;
use oneroof::workflow::payment::ConfirmedIntent;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(inline_js = r#"
export function stripe_mount(key, element) {
    if (typeof Stripe === "undefined") throw new Error("Stripe.js is not loaded");
    const stripe = Stripe(key);
    const elements = stripe.elements();
    const card = elements.create("card", { hidePostalCode: true });
    card.mount(element);
    return { stripe, card };
}

export async function stripe_create_payment_method(handle, name, email) {
    const { error, paymentMethod } = await handle.stripe.createPaymentMethod({
        type: "card",
        card: handle.card,
        billing_details: { name, email },
    });
    if (error) throw new Error(error.message);
    return paymentMethod.id;
}

export async function stripe_confirm(handle, secret, paymentMethod) {
    const { error, paymentIntent } = await handle.stripe.confirmCardPayment(secret, {
        payment_method: paymentMethod,
    });
    if (error) throw new Error(error.message);
    return {
        id: paymentIntent.id,
        status: paymentIntent.status,
        paymentMethodTypes: paymentIntent.payment_method_types || [],
    };
}

export function stripe_unmount(handle) {
    try { handle.card.unmount(); } catch (e) {}
}
"#)]
extern "C" {
    #[wasm_bindgen(catch)]
    fn stripe_mount(key: &str, element: &web_sys::HtmlElement) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn stripe_create_payment_method(
        handle: &JsValue,
        name: &str,
        email: &str,
    ) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn stripe_confirm(
        handle: &JsValue,
        secret: &str,
        payment_method: &str,
    ) -> Result<JsValue, JsValue>;

    fn stripe_unmount(handle: &JsValue);
}

fn payment_error(e: JsValue) -> AppError {
    AppError::payment(js_error_message(&e))
}

pub struct StripeCard {
    handle: JsValue,
    billing_name: String,
    billing_email: String,
}

impl StripeCard {
    pub fn mount(
        publishable_key: &str,
        element: &web_sys::HtmlElement,
        billing_name: &str,
        billing_email: &str,
    ) -> AppResult<Self> {
        if publishable_key.is_empty() {
            return Err(AppError::payment("Card payments are not configured"));
        }
        let handle = stripe_mount(publishable_key, element).map_err(payment_error)?;
        Ok(Self {
            handle,
            billing_name: billing_name.to_string(),
            billing_email: billing_email.to_string(),
        })
    }
}

impl Drop for StripeCard {
    fn drop(&mut self) {
        stripe_unmount(&self.handle);
    }
}

#[async_trait::async_trait(?Send)]
impl PaymentGateway for StripeCard {
    async fn create_payment_method(&self) -> AppResult<String> {
        let id = stripe_create_payment_method(&self.handle, &self.billing_name, &self.billing_email)
            .await
            .map_err(payment_error)?;
        id.as_string()
            .ok_or_else(|| AppError::payment("Card could not be tokenized"))
    }

    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        payment_method: &str,
    ) -> AppResult<ConfirmedIntent> {
        let value = stripe_confirm(&self.handle, client_secret, payment_method)
            .await
            .map_err(payment_error)?;
        from_value(value)
    }
}
