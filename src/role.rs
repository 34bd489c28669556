//! Role Resolver
//!
//! Fetches `GET /user/:email` for an identity and caches the record per
//! email. A missing role (`None`) is kept distinct from an explicit `user`
//! role so views can render nothing until the first answer.

use crate::client::SecuredClient;
use crate::query::{QueryCache, QueryKey};
use crate::request::HttpClient;
use crate::session::Identity;
use oneroof_shared::protocol::GetUser;
use oneroof_shared::{Role, UserRecord};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleState {
    pub role: Option<Role>,
    pub is_resolving: bool,
}

#[derive(Debug, Clone)]
enum Entry {
    Resolving(u64),
    Resolved(UserRecord),
    /// Treated as no role: guards redirect to forbidden.
    Failed,
}

type Listener = Rc<dyn Fn(&str)>;

#[derive(Default)]
pub struct RoleResolver {
    entries: RefCell<HashMap<String, Entry>>,
    generation: Cell<u64>,
    listeners: RefCell<Vec<Listener>>,
}

impl RoleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the cached role whenever that user's profile is invalidated.
    pub fn attach(self: &Rc<Self>, cache: &QueryCache) {
        let weak: Weak<Self> = Rc::downgrade(self);
        cache.subscribe(move |key| {
            if let (QueryKey::UserProfile(email), Some(resolver)) = (key, weak.upgrade()) {
                resolver.invalidate(email);
            }
        });
    }

    /// Called with the email whose entry changed.
    pub fn subscribe(&self, listener: impl Fn(&str) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    fn notify(&self, email: &str) {
        let listeners: Vec<Listener> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(email);
        }
    }

    pub fn state_for(&self, identity: Option<&Identity>) -> RoleState {
        let Some(identity) = identity else {
            return RoleState::default();
        };
        match self.entries.borrow().get(&identity.email) {
            None | Some(Entry::Resolving(_)) => RoleState {
                role: None,
                is_resolving: true,
            },
            Some(Entry::Resolved(record)) => RoleState {
                role: Some(record.role),
                is_resolving: false,
            },
            Some(Entry::Failed) => RoleState {
                role: None,
                is_resolving: false,
            },
        }
    }

    /// Cached record, if resolved.
    pub fn profile(&self, email: &str) -> Option<UserRecord> {
        match self.entries.borrow().get(email) {
            Some(Entry::Resolved(record)) => Some(record.clone()),
            _ => None,
        }
    }

    /// Fetch the role unless it is cached or already in flight.
    pub async fn resolve<H: HttpClient>(
        &self,
        client: &SecuredClient<H>,
        identity: &Identity,
    ) -> RoleState {
        let email = identity.email.clone();
        let generation = {
            let mut entries = self.entries.borrow_mut();
            match entries.get(&email) {
                Some(Entry::Resolved(_)) | Some(Entry::Resolving(_)) => None,
                None | Some(Entry::Failed) => {
                    let g = self.generation.get() + 1;
                    self.generation.set(g);
                    entries.insert(email.clone(), Entry::Resolving(g));
                    Some(g)
                }
            }
        };
        let Some(generation) = generation else {
            return self.state_for(Some(identity));
        };
        self.notify(&email);

        let result = client
            .send(&GetUser {
                email: email.clone(),
            })
            .await;

        let stored = {
            let mut entries = self.entries.borrow_mut();
            match entries.get(&email) {
                Some(Entry::Resolving(g)) if *g == generation => {
                    let entry = match result {
                        Ok(record) => {
                            if !record.is_consistent() {
                                warn!(email = %email, role = %record.role, "user record has inconsistent apartment fields");
                            }
                            debug!(email = %email, role = %record.role, "role resolved");
                            Entry::Resolved(record)
                        }
                        Err(e) => {
                            warn!(email = %email, code = e.error_code(), "role lookup failed: {}", e);
                            Entry::Failed
                        }
                    };
                    entries.insert(email.clone(), entry);
                    true
                }
                _ => {
                    debug!(email = %email, "discarding stale role response");
                    false
                }
            }
        };
        if stored {
            self.notify(&email);
        }
        self.state_for(Some(identity))
    }

    pub fn invalidate(&self, email: &str) {
        let removed = self.entries.borrow_mut().remove(email).is_some();
        if removed {
            debug!(email, "role cache invalidated");
            self.notify(email);
        }
    }

    /// On sign-out every cached role goes.
    pub fn invalidate_all(&self) {
        let emails: Vec<String> = self.entries.borrow_mut().drain().map(|(k, _)| k).collect();
        for email in emails {
            self.notify(&email);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::MockHttpClient;
    use crate::session::SessionStore;
    use crate::test_support::{BASE_URL, FakeAuthProvider, identity, url};
    use oneroof_shared::protocol::HttpMethod;
    use serde_json::json;

    fn setup() -> (Identity, SecuredClient<MockHttpClient>) {
        let session = Rc::new(SessionStore::new(FakeAuthProvider::default()));
        let user = identity("u1", "a@b.c");
        session.handle_auth_state_changed(Some(user.clone()));
        (user, SecuredClient::new(MockHttpClient::new(), BASE_URL, session))
    }

    #[test]
    fn test_null_identity_is_not_resolving() {
        let resolver = RoleResolver::new();
        assert_eq!(resolver.state_for(None), RoleState::default());
        let user = identity("u1", "a@b.c");
        assert_eq!(
            resolver.state_for(Some(&user)),
            RoleState {
                role: None,
                is_resolving: true
            }
        );
    }

    #[tokio::test]
    async fn test_resolves_once_and_caches() {
        let (user, client) = setup();
        client.http().mock_response(
            HttpMethod::Get,
            &url("/user/a%40b.c"),
            200,
            json!({"email": "a@b.c", "name": "A", "role": "user"}),
        );
        let resolver = RoleResolver::new();

        let state = resolver.resolve(&client, &user).await;
        assert_eq!(state.role, Some(Role::User));
        assert!(!state.is_resolving);
        resolver.resolve(&client, &user).await;
        assert_eq!(client.http().requests.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_profile_invalidation_refetches() {
        let (user, client) = setup();
        let endpoint = url("/user/a%40b.c");
        client.http().mock_response(
            HttpMethod::Get,
            &endpoint,
            200,
            json!({"email": "a@b.c", "role": "user"}),
        );
        let cache = QueryCache::new();
        let resolver = Rc::new(RoleResolver::new());
        resolver.attach(&cache);
        resolver.resolve(&client, &user).await;

        client.http().mock_response(
            HttpMethod::Get,
            &endpoint,
            200,
            json!({"email": "a@b.c", "role": "member", "floor": 2, "block": "A", "apartmentNo": "201", "rent": 900.0}),
        );
        cache.invalidate(QueryKey::UserProfile("a@b.c".to_string()));
        assert!(resolver.state_for(Some(&user)).is_resolving);

        let state = resolver.resolve(&client, &user).await;
        assert_eq!(state.role, Some(Role::Member));
        assert_eq!(resolver.profile("a@b.c").unwrap().rent, Some(900.0));
    }

    #[tokio::test]
    async fn test_failed_lookup_is_resolved_without_role() {
        let (user, client) = setup();
        client.http().mock_response(
            HttpMethod::Get,
            &url("/user/a%40b.c"),
            500,
            json!({"message": "db down"}),
        );
        let resolver = RoleResolver::new();
        let state = resolver.resolve(&client, &user).await;
        assert_eq!(
            state,
            RoleState {
                role: None,
                is_resolving: false
            }
        );
    }
}
