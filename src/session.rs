//! Session Store
//!
//! Holds the authenticated identity. Sign-in calls only start an operation;
//! the identity itself changes when the auth provider reports a transition
//! through [`SessionStore::handle_auth_state_changed`].

use crate::error::AppResult;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};

#[cfg(test)]
mod tests;

// =========================================================
// 身份 (Identity)
// =========================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Provider uid.
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Bearer token, refreshed in place by the provider.
    pub access_credential: String,
}

impl Identity {
    pub fn name_or_email(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

// =========================================================
// 会话状态 (SessionState)
// =========================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    /// True from process start until the first provider callback, and while
    /// a sign-in operation is pending.
    pub is_resolving: bool,
    /// The provider has reported at least once.
    pub initialized: bool,
    /// Bumped whenever the principal changes (sign-in, sign-out, switch).
    pub epoch: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            identity: None,
            is_resolving: true,
            initialized: false,
            epoch: 0,
        }
    }
}

impl SessionState {
    pub fn begin_operation(&mut self) {
        self.is_resolving = true;
    }

    pub fn apply_auth_change(&mut self, identity: Option<Identity>) {
        let previous = self.identity.as_ref().map(|i| i.id.as_str());
        let next = identity.as_ref().map(|i| i.id.as_str());
        if previous != next {
            self.epoch += 1;
        }
        self.identity = identity;
        self.is_resolving = false;
        self.initialized = true;
    }

    /// Before the first provider callback the flag must stay up.
    pub fn operation_failed(&mut self) {
        if self.initialized {
            self.is_resolving = false;
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.is_resolving && self.identity.is_some()
    }
}

// =========================================================
// 认证提供者 (AuthProvider)
// =========================================================

/// Wrapper over the hosted auth SDK.
///
/// Calls return the provider's view of the user, but the store does not adopt
/// it; the provider's state-change subscription is authoritative.
#[async_trait::async_trait(?Send)]
pub trait AuthProvider {
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<Identity>;
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity>;
    async fn sign_in_with_oauth(&self) -> AppResult<Identity>;
    async fn update_profile(&self, name: &str, photo_url: Option<&str>) -> AppResult<()>;
    async fn sign_out(&self) -> AppResult<()>;
}

// =========================================================
// SessionStore
// =========================================================

type Listener = Rc<dyn Fn(&SessionState)>;

pub struct SessionStore<P: AuthProvider> {
    provider: P,
    state: RefCell<SessionState>,
    listeners: RefCell<Vec<Listener>>,
}

impl<P: AuthProvider> SessionStore<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            state: RefCell::new(SessionState::default()),
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The listener is called after every state change, never during one.
    pub fn subscribe(&self, listener: impl Fn(&SessionState) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.state.borrow().identity.clone()
    }

    pub fn is_resolving(&self) -> bool {
        self.state.borrow().is_resolving
    }

    /// Read at call time so a refreshed token is always used.
    pub fn credential(&self) -> Option<String> {
        self.state
            .borrow()
            .identity
            .as_ref()
            .map(|i| i.access_credential.clone())
    }

    pub fn epoch(&self) -> u64 {
        self.state.borrow().epoch
    }

    fn update(&self, f: impl FnOnce(&mut SessionState)) {
        let snapshot = {
            let mut state = self.state.borrow_mut();
            f(&mut state);
            state.clone()
        };
        let listeners: Vec<Listener> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(&snapshot);
        }
    }

    /// Provider subscription entry point: app start, sign-in, sign-out and token refresh.
    pub fn handle_auth_state_changed(&self, identity: Option<Identity>) {
        match &identity {
            Some(i) => debug!(email = %i.email, "auth state: signed in"),
            None => debug!("auth state: signed out"),
        }
        self.update(|s| s.apply_auth_change(identity));
    }

    async fn run<T>(&self, op: &str, fut: impl Future<Output = AppResult<T>>) -> AppResult<T> {
        self.update(SessionState::begin_operation);
        match fut.await {
            Ok(v) => Ok(v),
            Err(e) => {
                warn!(op, code = e.error_code(), "auth operation failed: {}", e);
                self.update(SessionState::operation_failed);
                Err(e)
            }
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> AppResult<Identity> {
        self.run("sign_up", self.provider.sign_up(email, password)).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity> {
        self.run("sign_in", self.provider.sign_in(email, password)).await
    }

    pub async fn sign_in_with_oauth(&self) -> AppResult<Identity> {
        self.run("sign_in_with_oauth", self.provider.sign_in_with_oauth())
            .await
    }

    pub async fn sign_out(&self) -> AppResult<()> {
        self.run("sign_out", self.provider.sign_out()).await?;
        info!("signed out");
        Ok(())
    }

    /// The provider does not report profile edits, so the local identity is patched.
    pub async fn update_profile(&self, name: &str, photo_url: Option<&str>) -> AppResult<()> {
        self.provider.update_profile(name, photo_url).await?;
        if self.state.borrow().identity.is_some() {
            self.update(|s| {
                if let Some(identity) = s.identity.as_mut() {
                    identity.display_name = Some(name.to_string());
                    identity.photo_url = photo_url.map(str::to_string);
                }
            });
        }
        Ok(())
    }
}
