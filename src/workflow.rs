//! Data-mutation workflows.
//!
//! Each workflow sends through the [`crate::client::SecuredClient`] and, after
//! the backend confirms a write, invalidates the affected [`crate::query::QueryKey`]s.

pub mod agreement;
pub mod announcement;
pub mod apartments;
pub mod coupon;
pub mod members;
pub mod payment;

pub use agreement::{AgreementWorkflow, SubmitOutcome};
pub use announcement::{AnnouncementBoard, AnnouncementDraft};
pub use apartments::{ApartmentCatalog, RentFilter};
pub use coupon::{CouponAdmin, CouponDraft};
pub use members::MemberAdmin;
pub use payment::{
    CheckoutOutcome, KeyValueStore, PaymentDraft, PaymentError, PaymentGateway, PaymentOrder, PaymentOutbox,
    PaymentQuote, PaymentReceipt, PaymentWorkflow, StoredOutbox,
};

use crate::error::{AppError, AppResult};

/// Trim and require a non-empty form field.
pub(crate) fn required(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::validation(format!("{} is required", field)))
    } else {
        Ok(trimmed.to_string())
    }
}
