//! Sign-up, sign-in and the backend user record.

use crate::client::SecuredClient;
use crate::error::{AppError, AppResult};
use crate::query::{QueryCache, QueryKey};
use crate::request::HttpClient;
use crate::session::{AuthProvider, Identity, SessionStore};
use oneroof_shared::{NewUserRecord, Role, Timestamp};
use std::rc::Rc;
use tracing::info;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub photo_url: Option<String>,
}

impl Registration {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Name is required"));
        }
        validate_email(&self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> AppResult<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(AppError::validation("A valid email is required")),
    }
}

pub struct AccountService<H: HttpClient, P: AuthProvider> {
    session: Rc<SessionStore<P>>,
    client: Rc<SecuredClient<H>>,
    cache: Rc<QueryCache>,
}

impl<H: HttpClient, P: AuthProvider> AccountService<H, P> {
    pub fn new(
        session: Rc<SessionStore<P>>,
        client: Rc<SecuredClient<H>>,
        cache: Rc<QueryCache>,
    ) -> Self {
        Self {
            session,
            client,
            cache,
        }
    }

    /// Create the provider account, set its profile and write the user record.
    /// Fails as a whole if any step fails.
    pub async fn register(&self, registration: &Registration) -> AppResult<Identity> {
        registration.validate()?;
        let email = registration.email.trim();
        let mut identity = self.session.sign_up(email, &registration.password).await?;

        let photo = registration
            .photo_url
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());
        self.session
            .update_profile(registration.name.trim(), photo)
            .await?;
        identity.display_name = Some(registration.name.trim().to_string());
        identity.photo_url = photo.map(str::to_string);

        self.write_user_record(&identity).await?;
        info!(email = %identity.email, "account registered");
        Ok(identity)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity> {
        validate_email(email)?;
        if password.is_empty() {
            return Err(AppError::validation("Password is required"));
        }
        self.session.sign_in(email.trim(), password).await
    }

    /// The record is posted on every OAuth sign-in; the backend keeps the first.
    pub async fn sign_in_with_oauth(&self) -> AppResult<Identity> {
        let identity = self.session.sign_in_with_oauth().await?;
        self.write_user_record(&identity).await?;
        Ok(identity)
    }

    pub async fn sign_out(&self) -> AppResult<()> {
        self.session.sign_out().await
    }

    async fn write_user_record(&self, identity: &Identity) -> AppResult<()> {
        let record = NewUserRecord {
            name: identity.name_or_email().to_string(),
            email: identity.email.clone(),
            photo: identity.photo_url.clone(),
            role: Role::User,
            created_at: Timestamp::now(),
        };
        self.client
            .send_with_credential(&record, &identity.access_credential)
            .await?;
        // A role lookup may have raced the write and missed the record.
        self.cache
            .invalidate(QueryKey::UserProfile(identity.email.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::MockHttpClient;
    use crate::test_support::{BASE_URL, FakeAuthProvider, url};
    use oneroof_shared::protocol::HttpMethod;
    use serde_json::json;

    fn service(provider: FakeAuthProvider) -> AccountService<MockHttpClient, FakeAuthProvider> {
        let session = Rc::new(SessionStore::new(provider));
        session.handle_auth_state_changed(None);
        let client = Rc::new(SecuredClient::new(MockHttpClient::new(), BASE_URL, session.clone()));
        AccountService::new(session, client, Rc::new(QueryCache::new()))
    }

    fn registration() -> Registration {
        Registration {
            name: " Ada ".to_string(),
            email: "ada@b.c".to_string(),
            password: "secret1".to_string(),
            photo_url: Some("https://img/ada.png".to_string()),
        }
    }

    #[test]
    fn test_registration_validation() {
        assert!(registration().validate().is_ok());
        let short = Registration {
            password: "12345".to_string(),
            ..registration()
        };
        assert!(matches!(short.validate(), Err(AppError::Validation(_))));
        let no_at = Registration {
            email: "ada.b.c".to_string(),
            ..registration()
        };
        assert!(no_at.validate().is_err());
    }

    #[tokio::test]
    async fn test_register_posts_user_record_with_new_credential() {
        let svc = service(FakeAuthProvider::default());
        svc.client
            .http()
            .mock_response(HttpMethod::Post, &url("/users"), 200, json!({"acknowledged": true}));

        let identity = svc.register(&registration()).await.unwrap();
        assert_eq!(identity.display_name.as_deref(), Some("Ada"));
        assert_eq!(
            *svc.session.provider().calls.borrow(),
            vec!["sign_up ada@b.c", "update_profile Ada"]
        );

        let req = &svc.client.http().requests_to(HttpMethod::Post, &url("/users"))[0];
        assert_eq!(req.headers.get("Authorization").unwrap(), "Bearer token-new");
        let body = req.body_json();
        assert_eq!(body["role"], "user");
        assert_eq!(body["name"], "Ada");
        assert_eq!(body["photo"], "https://img/ada.png");
    }

    #[tokio::test]
    async fn test_register_fails_when_record_write_fails() {
        let svc = service(FakeAuthProvider::default());
        svc.client.http().mock_response(
            HttpMethod::Post,
            &url("/users"),
            500,
            json!({"message": "db down"}),
        );
        let err = svc.register(&registration()).await.unwrap_err();
        assert_eq!(err.user_message(), "db down");
    }

    #[tokio::test]
    async fn test_invalid_registration_never_reaches_provider() {
        let svc = service(FakeAuthProvider::default());
        let bad = Registration {
            name: "  ".to_string(),
            ..registration()
        };
        assert!(svc.register(&bad).await.is_err());
        assert!(svc.session.provider().calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_oauth_sign_in_upserts_user_record() {
        let svc = service(FakeAuthProvider::default());
        svc.client
            .http()
            .mock_response(HttpMethod::Post, &url("/users"), 200, json!({}));
        svc.sign_in_with_oauth().await.unwrap();
        svc.sign_in_with_oauth().await.unwrap();
        assert_eq!(
            svc.client
                .http()
                .requests_to(HttpMethod::Post, &url("/users"))
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_user_record_write_invalidates_profile() {
        let svc = service(FakeAuthProvider::default());
        svc.client
            .http()
            .mock_response(HttpMethod::Post, &url("/users"), 200, json!({}));
        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = seen.clone();
        svc.cache.subscribe(move |key| sink.borrow_mut().push(key.clone()));

        svc.register(&registration()).await.unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![QueryKey::UserProfile("ada@b.c".to_string())]
        );
    }
}
