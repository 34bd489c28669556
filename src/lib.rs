//! OneRoof workflow core
//!
//! Session, role resolution, the secured request client, route guarding and
//! the agreement/payment/coupon workflows of the OneRoof apartment app. Every
//! external system sits behind a `?Send` async trait so the same code runs in
//! the browser and under tokio tests:
//!
//! - [`request::HttpClient`]: transport
//! - [`session::AuthProvider`]: hosted auth SDK
//! - [`workflow::payment::PaymentGateway`]: hosted card payments
//!
//! The UI builds one [`context::AppContext`] at startup and reads everything
//! through it.

pub mod account;
pub mod client;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod error;
pub mod guard;
pub mod query;
pub mod request;
pub mod role;
pub mod route;
pub mod session;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{AuthFailure, AuthFailureHandler, InterceptorHandle, Navigator, SecuredClient};
pub use config::AppConfig;
pub use context::AppContext;
pub use error::{AppError, AppResult, ErrorCategory};
pub use guard::GuardDecision;
pub use query::{QueryCache, QueryKey};
pub use role::{RoleResolver, RoleState};
pub use route::{Access, AppRoute, Navigation};
pub use session::{AuthProvider, Identity, SessionState, SessionStore};

pub use oneroof_shared as shared;
