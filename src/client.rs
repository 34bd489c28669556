//! Secured Request Client
//!
//! Every backend call goes through [`SecuredClient`]. It attaches the bearer
//! credential read at call time and routes 401/403 to the single registered
//! interceptor, provided that interceptor belongs to the current identity.

use crate::error::{AppError, AppResult};
use crate::request::{HttpClient, HttpRequest, HttpResponse};
use crate::route::{AppRoute, Navigation};
use crate::session::{AuthProvider, SessionStore};
use oneroof_shared::protocol::{ApiRequest, HttpMethod};
use oneroof_shared::{BEARER_PREFIX, HEADER_AUTHORIZATION};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

#[cfg(test)]
mod tests;

// =========================================================
// Seams
// =========================================================

/// Where the client reads the credential from.
pub trait CredentialSource {
    fn credential(&self) -> Option<String>;
    /// Identity lifetime counter; see [`crate::session::SessionState::epoch`].
    fn epoch(&self) -> u64;
}

impl<P: AuthProvider> CredentialSource for SessionStore<P> {
    fn credential(&self) -> Option<String> {
        SessionStore::credential(self)
    }

    fn epoch(&self) -> u64 {
        SessionStore::epoch(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// 401
    Unauthorized,
    /// 403
    Forbidden,
}

impl AuthFailure {
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            401 => Some(Self::Unauthorized),
            403 => Some(Self::Forbidden),
            _ => None,
        }
    }
}

pub trait AuthFailureHandler {
    fn on_auth_failure(&self, failure: AuthFailure);
}

/// History access, implemented by the browser router and by test recorders.
pub trait Navigator {
    fn current_path(&self) -> String;
    fn navigate(&self, navigation: Navigation);
}

// =========================================================
// Interceptor registration
// =========================================================

struct Registration {
    id: u64,
    epoch: u64,
    handler: Rc<dyn AuthFailureHandler>,
}

type Slot = Rc<RefCell<Option<Registration>>>;

/// Ejects its registration on drop, unless it was already replaced.
pub struct InterceptorHandle {
    id: u64,
    slot: Weak<RefCell<Option<Registration>>>,
}

impl InterceptorHandle {
    pub fn is_active(&self) -> bool {
        self.slot
            .upgrade()
            .map(|slot| slot.borrow().as_ref().is_some_and(|r| r.id == self.id))
            .unwrap_or(false)
    }
}

impl Drop for InterceptorHandle {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.upgrade() {
            let mut slot = slot.borrow_mut();
            if slot.as_ref().is_some_and(|r| r.id == self.id) {
                *slot = None;
            }
        }
    }
}

// =========================================================
// SecuredClient
// =========================================================

pub struct SecuredClient<H: HttpClient> {
    http: H,
    base_url: String,
    credentials: Rc<dyn CredentialSource>,
    interceptor: Slot,
    next_id: Cell<u64>,
}

impl<H: HttpClient> SecuredClient<H> {
    pub fn new(http: H, base_url: &str, credentials: Rc<dyn CredentialSource>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            interceptor: Rc::new(RefCell::new(None)),
            next_id: Cell::new(1),
        }
    }

    pub fn http(&self) -> &H {
        &self.http
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Install the interceptor for the current identity, replacing any other.
    pub fn register(&self, handler: Rc<dyn AuthFailureHandler>) -> InterceptorHandle {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let epoch = self.credentials.epoch();
        *self.interceptor.borrow_mut() = Some(Registration { id, epoch, handler });
        debug!(id, epoch, "auth interceptor registered");
        InterceptorHandle {
            id,
            slot: Rc::downgrade(&self.interceptor),
        }
    }

    pub async fn send<T: ApiRequest>(&self, req: &T) -> AppResult<T::Response> {
        let credential = self.credentials.credential();
        self.send_inner(req, credential).await
    }

    /// Use an explicit credential, e.g. right after sign-up when the session
    /// subscription has not reported the new identity yet.
    pub async fn send_with_credential<T: ApiRequest>(
        &self,
        req: &T,
        credential: &str,
    ) -> AppResult<T::Response> {
        self.send_inner(req, Some(credential.to_string())).await
    }

    async fn send_inner<T: ApiRequest>(
        &self,
        req: &T,
        credential: Option<String>,
    ) -> AppResult<T::Response> {
        let body = if T::SENDS_BODY {
            Some(serde_json::to_string(req)?)
        } else {
            None
        };
        self.execute(T::METHOD, &req.path(), body, credential)
            .await?
            .json()
    }

    async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
        credential: Option<String>,
    ) -> AppResult<HttpResponse> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = HttpRequest::new(&url, method);
        if let Some(token) = credential {
            request = request.with_header(HEADER_AUTHORIZATION, &format!("{}{}", BEARER_PREFIX, token));
        }
        if let Some(body) = body {
            request = request.with_json_body(body);
        }

        let response = self.http.send(request).await?;
        if response.is_success() {
            return Ok(response);
        }

        debug!(method = method.as_str(), path, status = response.status, "request failed");
        if let Some(failure) = AuthFailure::from_status(response.status) {
            self.dispatch(failure);
        }
        Err(AppError::from_response(response.status, &response.body))
    }

    fn dispatch(&self, failure: AuthFailure) {
        let handler = {
            let slot = self.interceptor.borrow();
            match slot.as_ref() {
                Some(reg) if reg.epoch == self.credentials.epoch() => reg.handler.clone(),
                Some(reg) => {
                    debug!(id = reg.id, "stale auth interceptor ignored");
                    return;
                }
                None => return,
            }
        };
        handler.on_auth_failure(failure);
    }
}

/// The app-wide reaction to an auth failure.
///
/// 401 signs out and sends the user to sign-in, remembering the current page.
/// 403 goes to the forbidden page and keeps the session.
pub async fn handle_auth_failure<P: AuthProvider>(
    failure: AuthFailure,
    session: &SessionStore<P>,
    navigator: &dyn Navigator,
) {
    match failure {
        AuthFailure::Unauthorized => {
            let from = navigator.current_path();
            warn!(from = %from, "credential rejected, signing out");
            if let Err(e) = session.sign_out().await {
                warn!("sign-out after 401 failed: {}", e);
            }
            navigator.navigate(Navigation::sign_in_from(&from));
        }
        AuthFailure::Forbidden => {
            warn!(path = %navigator.current_path(), "request forbidden");
            navigator.navigate(Navigation::push(AppRoute::Forbidden));
        }
    }
}
