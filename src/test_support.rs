//! In-crate fakes for the async seams.

use crate::client::{AuthFailure, AuthFailureHandler, Navigator};
use crate::error::{AppError, AppResult};
use crate::route::Navigation;
use crate::session::{AuthProvider, Identity};
use crate::workflow::payment::{ConfirmedIntent, IntentStatus, PaymentGateway};
use std::cell::{Cell, RefCell};

pub const BASE_URL: &str = "http://api.test";

pub fn url(path: &str) -> String {
    format!("{}{}", BASE_URL, path)
}

pub fn identity(id: &str, email: &str) -> Identity {
    Identity {
        id: id.to_string(),
        display_name: Some(format!("User {}", id)),
        email: email.to_string(),
        photo_url: None,
        access_credential: format!("token-{}", id),
    }
}

// =========================================================
// FakeAuthProvider
// =========================================================

#[derive(Default)]
pub struct FakeAuthProvider {
    pub fail_with: RefCell<Option<AppError>>,
    pub calls: RefCell<Vec<String>>,
    pub oauth_identity: RefCell<Option<Identity>>,
}

impl FakeAuthProvider {
    pub fn failing(message: &str) -> Self {
        let p = Self::default();
        *p.fail_with.borrow_mut() = Some(AppError::auth(message));
        p
    }

    fn record(&self, call: String) -> AppResult<()> {
        self.calls.borrow_mut().push(call);
        match self.fail_with.borrow().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait(?Send)]
impl AuthProvider for FakeAuthProvider {
    async fn sign_up(&self, email: &str, _password: &str) -> AppResult<Identity> {
        self.record(format!("sign_up {}", email))?;
        Ok(identity("new", email))
    }

    async fn sign_in(&self, email: &str, _password: &str) -> AppResult<Identity> {
        self.record(format!("sign_in {}", email))?;
        Ok(identity("u1", email))
    }

    async fn sign_in_with_oauth(&self) -> AppResult<Identity> {
        self.record("sign_in_with_oauth".to_string())?;
        Ok(self
            .oauth_identity
            .borrow()
            .clone()
            .unwrap_or_else(|| identity("g1", "g@b.c")))
    }

    async fn update_profile(&self, name: &str, _photo_url: Option<&str>) -> AppResult<()> {
        self.record(format!("update_profile {}", name))
    }

    async fn sign_out(&self) -> AppResult<()> {
        self.record("sign_out".to_string())
    }
}

// =========================================================
// FakePaymentGateway
// =========================================================

pub struct FakePaymentGateway {
    pub tokenize_error: RefCell<Option<String>>,
    pub confirm_status: Cell<IntentStatus>,
    pub confirm_error: RefCell<Option<String>>,
    pub confirmed_secrets: RefCell<Vec<String>>,
    pub transaction_id: String,
}

impl Default for FakePaymentGateway {
    fn default() -> Self {
        Self {
            tokenize_error: RefCell::new(None),
            confirm_status: Cell::new(IntentStatus::Succeeded),
            confirm_error: RefCell::new(None),
            confirmed_secrets: RefCell::new(Vec::new()),
            transaction_id: "pi_test_1".to_string(),
        }
    }
}

#[async_trait::async_trait(?Send)]
impl PaymentGateway for FakePaymentGateway {
    async fn create_payment_method(&self) -> AppResult<String> {
        match self.tokenize_error.borrow().clone() {
            Some(m) => Err(AppError::payment(m)),
            None => Ok("pm_card_visa".to_string()),
        }
    }

    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        _payment_method: &str,
    ) -> AppResult<ConfirmedIntent> {
        self.confirmed_secrets
            .borrow_mut()
            .push(client_secret.to_string());
        if let Some(m) = self.confirm_error.borrow().clone() {
            return Err(AppError::payment(m));
        }
        Ok(ConfirmedIntent {
            id: self.transaction_id.clone(),
            status: self.confirm_status.get(),
            payment_method_types: vec!["card".to_string()],
        })
    }
}

// =========================================================
// Navigation / interceptor recorders
// =========================================================

pub struct RecordingNavigator {
    pub path: RefCell<String>,
    pub navigations: RefCell<Vec<Navigation>>,
}

impl RecordingNavigator {
    pub fn at(path: &str) -> Self {
        Self {
            path: RefCell::new(path.to_string()),
            navigations: RefCell::new(Vec::new()),
        }
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.path.borrow().clone()
    }

    fn navigate(&self, navigation: Navigation) {
        *self.path.borrow_mut() = navigation.to.clone();
        self.navigations.borrow_mut().push(navigation);
    }
}

#[derive(Default)]
pub struct RecordingHandler {
    pub failures: RefCell<Vec<AuthFailure>>,
}

impl AuthFailureHandler for RecordingHandler {
    fn on_auth_failure(&self, failure: AuthFailure) {
        self.failures.borrow_mut().push(failure);
    }
}
