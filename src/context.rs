//! Application context, built once at startup and handed to the UI.

use crate::account::AccountService;
use crate::client::SecuredClient;
use crate::config::AppConfig;
use crate::dashboard::DashboardService;
use crate::guard::{self, GuardDecision};
use crate::query::QueryCache;
use crate::request::HttpClient;
use crate::role::{RoleResolver, RoleState};
use crate::session::{AuthProvider, SessionStore};
use crate::workflow::{
    AgreementWorkflow, AnnouncementBoard, ApartmentCatalog, CouponAdmin, MemberAdmin,
    PaymentOutbox, PaymentWorkflow,
};
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;

pub struct AppContext<H: HttpClient, P: AuthProvider> {
    pub config: AppConfig,
    pub session: Rc<SessionStore<P>>,
    pub client: Rc<SecuredClient<H>>,
    pub cache: Rc<QueryCache>,
    pub roles: Rc<RoleResolver>,
    pub accounts: AccountService<H, P>,
    pub apartments: ApartmentCatalog<H>,
    pub agreements: AgreementWorkflow<H>,
    pub payments: PaymentWorkflow<H>,
    pub coupons: CouponAdmin<H>,
    pub members: MemberAdmin<H>,
    pub announcements: AnnouncementBoard<H>,
    pub dashboard: DashboardService<H>,
}

impl<H: HttpClient, P: AuthProvider + 'static> AppContext<H, P> {
    pub fn new(config: AppConfig, http: H, provider: P, outbox: Rc<dyn PaymentOutbox>) -> Self {
        let session = Rc::new(SessionStore::new(provider));
        let client = Rc::new(SecuredClient::new(
            http,
            &config.api_base_url,
            session.clone(),
        ));
        let cache = Rc::new(QueryCache::new());
        let roles = Rc::new(RoleResolver::new());
        roles.attach(&cache);

        // A new principal never sees the previous one's roles.
        let weak_roles = Rc::downgrade(&roles);
        let last_epoch = Cell::new(session.epoch());
        session.subscribe(move |state| {
            if last_epoch.replace(state.epoch) != state.epoch {
                if let Some(roles) = weak_roles.upgrade() {
                    debug!(epoch = state.epoch, "principal changed, clearing roles");
                    roles.invalidate_all();
                }
            }
        });

        Self {
            accounts: AccountService::new(session.clone(), client.clone(), cache.clone()),
            apartments: ApartmentCatalog::new(client.clone()),
            agreements: AgreementWorkflow::new(client.clone(), cache.clone()),
            payments: PaymentWorkflow::new(client.clone(), cache.clone(), outbox),
            coupons: CouponAdmin::new(client.clone(), cache.clone()),
            members: MemberAdmin::new(client.clone(), cache.clone()),
            announcements: AnnouncementBoard::new(client.clone(), cache.clone()),
            dashboard: DashboardService::new(client.clone()),
            config,
            session,
            client,
            cache,
            roles,
        }
    }

    pub fn role_state(&self) -> RoleState {
        self.roles
            .state_for(self.session.snapshot().identity.as_ref())
    }

    /// Resolve the current identity's role if needed.
    pub async fn refresh_role(&self) -> RoleState {
        match self.session.current_identity() {
            Some(identity) => self.roles.resolve(&self.client, &identity).await,
            None => RoleState::default(),
        }
    }

    pub fn guard(&self, path: &str) -> GuardDecision {
        guard::evaluate_path(path, &self.session.snapshot(), self.role_state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::MockHttpClient;
    use crate::route::{AppRoute, Navigation};
    use crate::test_support::{FakeAuthProvider, identity};
    use crate::workflow::payment::MemoryOutbox;
    use oneroof_shared::Role;
    use oneroof_shared::protocol::HttpMethod;
    use serde_json::json;

    fn context() -> AppContext<MockHttpClient, FakeAuthProvider> {
        let config = AppConfig::from_lookup(|k| {
            (k == crate::config::ENV_API_URL).then(|| "http://api.test".to_string())
        });
        AppContext::new(
            config,
            MockHttpClient::new(),
            FakeAuthProvider::default(),
            Rc::new(MemoryOutbox::default()),
        )
    }

    #[tokio::test]
    async fn test_user_is_sent_to_dashboard_forbidden_for_payment() {
        let ctx = context();
        ctx.client.http().mock_response(
            HttpMethod::Get,
            "http://api.test/user/a%40b.c",
            200,
            json!({"email": "a@b.c", "role": "user"}),
        );
        assert_eq!(ctx.guard("/dashboard/make-payment"), GuardDecision::Loading);

        ctx.session
            .handle_auth_state_changed(Some(identity("u1", "a@b.c")));
        assert_eq!(ctx.guard("/dashboard/make-payment"), GuardDecision::Loading);

        assert_eq!(ctx.refresh_role().await.role, Some(Role::User));
        assert_eq!(
            ctx.guard("/dashboard/make-payment"),
            GuardDecision::Redirect(Navigation::replace(AppRoute::DashboardForbidden))
        );
    }

    #[tokio::test]
    async fn test_sign_out_clears_cached_roles() {
        let ctx = context();
        ctx.client.http().mock_response(
            HttpMethod::Get,
            "http://api.test/user/a%40b.c",
            200,
            json!({"email": "a@b.c", "role": "admin"}),
        );
        let admin = identity("u1", "a@b.c");
        ctx.session.handle_auth_state_changed(Some(admin.clone()));
        ctx.refresh_role().await;
        assert!(ctx.roles.profile("a@b.c").is_some());

        ctx.session.handle_auth_state_changed(None);
        assert!(ctx.roles.profile("a@b.c").is_none());
        assert_eq!(ctx.role_state(), RoleState::default());
    }
}
