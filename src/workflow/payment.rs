//! Rent payment: month selection, coupon, card charge, record.
//!
//! ```text
//! PaymentDraft --select_month--> PaymentOrder
//! PaymentQuote --apply_coupon--> PaymentQuote (replaces any earlier coupon)
//! pay: tokenize -> create intent -> confirm -> POST /payments
//! ```
//!
//! A record is written only after the gateway reports `succeeded`. If that
//! write fails the record goes to the [`PaymentOutbox`] and is re-posted by
//! [`PaymentWorkflow::retry_unsettled`]; the backend deduplicates on
//! `transactionId`.

use crate::client::SecuredClient;
use crate::error::{AppError, AppResult};
use crate::query::{QueryCache, QueryKey};
use crate::request::HttpClient;
use crate::route::{AppRoute, Navigation};
use futures::future::join_all;
use oneroof_shared::protocol::{CreatePaymentIntent, ListCoupons, PaymentHistory};
use oneroof_shared::{
    ApartmentAttrs, Coupon, Month, PaymentRecord, PaymentStatus, Role, Timestamp, UserRecord,
};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use thiserror::Error;
use tracing::{error, info, warn};


// =========================================================
// Step 1: 月份选择
// =========================================================

/// The member's side of the form before a month is picked. Rent is read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentDraft {
    pub email: String,
    pub name: String,
    pub apartment: ApartmentAttrs,
}

impl PaymentDraft {
    pub fn from_profile(profile: &UserRecord) -> AppResult<Self> {
        if profile.role != Role::Member {
            return Err(AppError::validation("Only members pay rent"));
        }
        let apartment = profile
            .apartment()
            .ok_or_else(|| AppError::validation("No apartment is assigned to this account"))?;
        Ok(Self {
            email: profile.email.clone(),
            name: profile.name.clone(),
            apartment,
        })
    }

    pub fn select_month(&self, month: Option<Month>) -> AppResult<PaymentOrder> {
        let month = month.ok_or_else(|| AppError::validation("Please select a month"))?;
        Ok(PaymentOrder {
            email: self.email.clone(),
            apartment: self.apartment.clone(),
            month,
        })
    }
}

/// Carried from month selection to the card step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrder {
    pub email: String,
    pub apartment: ApartmentAttrs,
    pub month: Month,
}

impl PaymentOrder {
    /// The card step reached without an order (reload, direct link).
    pub fn require(state: Option<PaymentOrder>) -> AppResult<PaymentOrder> {
        state.ok_or_else(|| AppError::validation("Select a month before paying"))
    }

    pub fn quote(&self) -> PaymentQuote {
        PaymentQuote::new(self.apartment.rent)
    }
}

// =========================================================
// Step 2: 优惠券
// =========================================================

#[derive(Debug, Clone, PartialEq)]
pub struct AppliedCoupon {
    pub code: String,
    pub discount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentQuote {
    pub base_rent: f64,
    pub applied: Option<AppliedCoupon>,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn discounted_rent(rent: f64, discount: f64) -> f64 {
    round2(rent * (1.0 - discount / 100.0))
}

/// Exact code match among available coupons.
pub fn find_applicable<'a>(coupons: &'a [Coupon], code: &str) -> Option<&'a Coupon> {
    let code = code.trim();
    coupons
        .iter()
        .find(|c| c.code == code && c.is_available)
}

impl PaymentQuote {
    pub fn new(base_rent: f64) -> Self {
        Self {
            base_rent,
            applied: None,
        }
    }

    pub fn payable(&self) -> f64 {
        match &self.applied {
            Some(coupon) => discounted_rent(self.base_rent, coupon.discount),
            None => round2(self.base_rent),
        }
    }

    /// Always computed from the base rent, so coupons never stack.
    pub fn with_coupon(&self, coupon: &Coupon) -> Self {
        Self {
            base_rent: self.base_rent,
            applied: Some(AppliedCoupon {
                code: coupon.code.clone(),
                discount: coupon.discount,
            }),
        }
    }

    pub fn coupon_code(&self) -> Option<String> {
        self.applied.as_ref().map(|c| c.code.clone())
    }
}

// =========================================================
// Step 3: 支付网关
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    Succeeded,
    Processing,
    RequiresAction,
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresCapture,
    Canceled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedIntent {
    /// Gateway transaction id, e.g. `pi_...`.
    pub id: String,
    pub status: IntentStatus,
    #[serde(default)]
    pub payment_method_types: Vec<String>,
}

/// Hosted card-payment SDK bound to one mounted card input.
#[async_trait::async_trait(?Send)]
pub trait PaymentGateway {
    /// Tokenize the card; returns the payment-method id.
    async fn create_payment_method(&self) -> AppResult<String>;
    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        payment_method: &str,
    ) -> AppResult<ConfirmedIntent>;
}

// =========================================================
// 未入账支付 (Outbox)
// =========================================================

/// Charged payments whose record has not been accepted yet, keyed by transaction id.
pub trait PaymentOutbox {
    fn put(&self, record: &PaymentRecord);
    fn remove(&self, transaction_id: &str);
    fn pending(&self) -> Vec<PaymentRecord>;
}

#[derive(Default)]
pub struct MemoryOutbox {
    records: RefCell<Vec<PaymentRecord>>,
}

impl PaymentOutbox for MemoryOutbox {
    fn put(&self, record: &PaymentRecord) {
        let mut records = self.records.borrow_mut();
        records.retain(|r| r.transaction_id != record.transaction_id);
        records.push(record.clone());
    }

    fn remove(&self, transaction_id: &str) {
        self.records
            .borrow_mut()
            .retain(|r| r.transaction_id != transaction_id);
    }

    fn pending(&self) -> Vec<PaymentRecord> {
        self.records.borrow().clone()
    }
}

/// String key-value storage that survives a reload (browser localStorage).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    /// Returns whether the value was written.
    fn set(&self, key: &str, value: &str) -> bool;
    fn delete(&self, key: &str) -> bool;
}

/// [`PaymentOutbox`] serialized as one JSON array under `key`.
///
/// An unreadable slot is moved to `<key>.unreadable.<n>` before anything is
/// written over it. If it cannot be moved, writes are refused and the new
/// record only reaches the error log.
pub struct StoredOutbox<S: KeyValueStore> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> StoredOutbox<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// `None` when the slot holds data that could not be parsed or set aside.
    fn load(&self) -> Option<Vec<PaymentRecord>> {
        let Some(raw) = self.store.get(&self.key) else {
            return Some(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(records) => Some(records),
            Err(e) => {
                let backup = (0..)
                    .map(|n| format!("{}.unreadable.{}", self.key, n))
                    .find(|k| self.store.get(k).is_none())
                    .unwrap_or_else(|| format!("{}.unreadable", self.key));
                error!(key = %self.key, backup = %backup, "payment outbox is unreadable: {}", e);
                if self.store.set(&backup, &raw) && self.store.delete(&self.key) {
                    Some(Vec::new())
                } else {
                    error!(key = %self.key, "could not set the unreadable payment outbox aside");
                    None
                }
            }
        }
    }

    fn save(&self, records: &[PaymentRecord]) {
        if records.is_empty() {
            self.store.delete(&self.key);
            return;
        }
        match serde_json::to_string(records) {
            Ok(raw) => {
                if !self.store.set(&self.key, &raw) {
                    error!(count = records.len(), "could not persist payment outbox");
                }
            }
            Err(e) => error!("payment outbox serialization failed: {}", e),
        }
    }
}

impl<S: KeyValueStore> PaymentOutbox for StoredOutbox<S> {
    fn put(&self, record: &PaymentRecord) {
        let Some(mut records) = self.load() else {
            error!(
                record = %serde_json::to_string(record).unwrap_or_default(),
                "unsettled payment not stored"
            );
            return;
        };
        records.retain(|r| r.transaction_id != record.transaction_id);
        records.push(record.clone());
        self.save(&records);
    }

    fn remove(&self, transaction_id: &str) {
        if let Some(mut records) = self.load() {
            records.retain(|r| r.transaction_id != transaction_id);
            self.save(&records);
        }
    }

    fn pending(&self) -> Vec<PaymentRecord> {
        self.load().unwrap_or_default()
    }
}

// =========================================================
// 结果类型
// =========================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaymentError {
    /// Nothing was recorded; the form stays on the same step.
    #[error(transparent)]
    Aborted(#[from] AppError),
    /// The card was charged but the record write failed.
    #[error("payment {} was charged but not recorded: {cause}", .record.transaction_id)]
    Unrecorded {
        record: PaymentRecord,
        cause: AppError,
    },
}

impl PaymentError {
    pub fn user_message(&self) -> String {
        match self {
            PaymentError::Aborted(e) => e.user_message().to_string(),
            PaymentError::Unrecorded { record, .. } => format!(
                "Your card was charged (transaction {}) but the payment could not be saved. \
                 It will be saved automatically; please do not pay again.",
                record.transaction_id
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    pub record: PaymentRecord,
    pub next: Navigation,
}

/// What the checkout page does once `pay` settles.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    Leave(Navigation),
    /// Stay on checkout with the order kept. `charged` blocks another
    /// attempt and offers the unsettled retry instead.
    Stay { message: String, charged: bool },
}

impl CheckoutOutcome {
    pub fn of(result: &Result<PaymentReceipt, PaymentError>) -> Self {
        match result {
            Ok(receipt) => CheckoutOutcome::Leave(receipt.next.clone()),
            Err(e @ PaymentError::Unrecorded { .. }) => CheckoutOutcome::Stay {
                message: e.user_message(),
                charged: true,
            },
            Err(e) => CheckoutOutcome::Stay {
                message: e.user_message(),
                charged: false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RetryReport {
    pub settled: Vec<String>,
    pub failed: Vec<(String, AppError)>,
}

struct PayingGuard<'a>(&'a Cell<bool>);

impl Drop for PayingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

// =========================================================
// PaymentWorkflow
// =========================================================

pub struct PaymentWorkflow<H: HttpClient> {
    client: Rc<SecuredClient<H>>,
    cache: Rc<QueryCache>,
    outbox: Rc<dyn PaymentOutbox>,
    paying: Cell<bool>,
}

impl<H: HttpClient> PaymentWorkflow<H> {
    pub fn new(
        client: Rc<SecuredClient<H>>,
        cache: Rc<QueryCache>,
        outbox: Rc<dyn PaymentOutbox>,
    ) -> Self {
        Self {
            client,
            cache,
            outbox,
            paying: Cell::new(false),
        }
    }

    pub fn is_paying(&self) -> bool {
        self.paying.get()
    }

    /// Look the code up in a freshly fetched coupon list. On failure the
    /// caller keeps its current quote.
    pub async fn apply_coupon(&self, quote: &PaymentQuote, code: &str) -> AppResult<PaymentQuote> {
        if code.trim().is_empty() {
            return Err(AppError::validation("Enter a coupon code"));
        }
        let coupons = self.client.send(&ListCoupons).await?;
        match find_applicable(&coupons, code) {
            Some(coupon) => {
                let next = quote.with_coupon(coupon);
                info!(code = %coupon.code, payable = next.payable(), "coupon applied");
                Ok(next)
            }
            None => Err(AppError::validation("Invalid or unavailable coupon")),
        }
    }

    pub async fn pay(
        &self,
        gateway: &dyn PaymentGateway,
        order: &PaymentOrder,
        quote: &PaymentQuote,
    ) -> Result<PaymentReceipt, PaymentError> {
        if self.paying.replace(true) {
            return Err(AppError::validation("A payment is already being processed").into());
        }
        let _guard = PayingGuard(&self.paying);

        let amount = quote.payable();
        if amount <= 0.0 {
            return Err(AppError::validation("Nothing to pay for this month").into());
        }

        let payment_method = gateway.create_payment_method().await?;
        let intent = self
            .client
            .send(&CreatePaymentIntent {
                rent: amount,
                coupon_code: quote.coupon_code(),
            })
            .await?;
        let confirmed = gateway
            .confirm_card_payment(&intent.client_secret, &payment_method)
            .await?;
        if confirmed.status != IntentStatus::Succeeded {
            warn!(transaction_id = %confirmed.id, status = ?confirmed.status, "payment not completed");
            return Err(AppError::payment(format!(
                "Payment was not completed (status: {:?})",
                confirmed.status
            ))
            .into());
        }

        let record = PaymentRecord {
            id: None,
            user_email: order.email.clone(),
            floor: order.apartment.floor,
            block: order.apartment.block.clone(),
            apartment_no: order.apartment.apartment_no.clone(),
            month: order.month,
            rent: amount,
            transaction_id: confirmed.id.clone(),
            date: Timestamp::now(),
            status: PaymentStatus::Completed,
            payment_method: confirmed
                .payment_method_types
                .first()
                .cloned()
                .unwrap_or_else(|| "card".to_string()),
            coupon_code: quote.coupon_code(),
        };

        match self.client.send(&record).await {
            Ok(_) => {
                info!(transaction_id = %record.transaction_id, month = %record.month, rent = record.rent, "payment recorded");
                self.cache.invalidate(QueryKey::Payments(record.user_email.clone()));
                Ok(PaymentReceipt {
                    record,
                    next: Navigation::push(AppRoute::PayHistory),
                })
            }
            Err(cause) => {
                error!(
                    transaction_id = %record.transaction_id,
                    email = %record.user_email,
                    code = cause.error_code(),
                    "charged payment could not be recorded: {}", cause
                );
                self.outbox.put(&record);
                Err(PaymentError::Unrecorded { record, cause })
            }
        }
    }

    /// Unsettled records charged for `email`. The outbox may be shared by
    /// several accounts on one browser.
    pub fn unsettled(&self, email: &str) -> Vec<PaymentRecord> {
        self.outbox
            .pending()
            .into_iter()
            .filter(|r| r.user_email == email)
            .collect()
    }

    /// Re-post the unsettled records of `email`. Safe to repeat.
    pub async fn retry_unsettled(&self, email: &str) -> RetryReport {
        let pending = self.unsettled(email);
        let attempts = pending.iter().map(|record| async move {
            let result = self.client.send(record).await.map(|_| ());
            (record, result)
        });

        let mut report = RetryReport::default();
        for (record, result) in join_all(attempts).await {
            match result {
                Ok(()) => {
                    info!(transaction_id = %record.transaction_id, "unsettled payment recorded");
                    self.outbox.remove(&record.transaction_id);
                    self.cache
                        .invalidate(QueryKey::Payments(record.user_email.clone()));
                    report.settled.push(record.transaction_id.clone());
                }
                Err(e) => {
                    warn!(transaction_id = %record.transaction_id, "retry failed: {}", e);
                    report.failed.push((record.transaction_id.clone(), e));
                }
            }
        }
        report
    }

    /// Newest first.
    pub async fn history(&self, email: &str) -> AppResult<Vec<PaymentRecord>> {
        let mut records = self
            .client
            .send(&PaymentHistory {
                email: email.to_string(),
            })
            .await?;
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }
}
