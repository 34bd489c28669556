//! Dashboard shell: which home view and which sidebar links a role gets.

use crate::client::SecuredClient;
use crate::error::AppResult;
use crate::request::HttpClient;
use crate::role::RoleState;
use crate::route::AppRoute;
use oneroof_shared::protocol::GetAdminSummary;
use oneroof_shared::{AdminSummary, ApartmentAttrs, Role, Timestamp, UserRecord};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardView {
    /// Role not known yet; render nothing role-specific.
    Loading,
    User,
    Member,
    Admin,
}

impl DashboardView {
    pub fn for_role(state: RoleState) -> Self {
        match (state.is_resolving, state.role) {
            (true, _) | (false, None) => DashboardView::Loading,
            (false, Some(Role::User)) => DashboardView::User,
            (false, Some(Role::Member)) => DashboardView::Member,
            (false, Some(Role::Admin)) => DashboardView::Admin,
        }
    }
}

pub fn sidebar_for(role: Option<Role>) -> Vec<AppRoute> {
    let links: &[AppRoute] = match role {
        None => &[],
        Some(Role::User) => &[AppRoute::DashboardHome, AppRoute::Profile, AppRoute::Announcements],
        Some(Role::Member) => &[
            AppRoute::DashboardHome,
            AppRoute::Profile,
            AppRoute::MakePayment,
            AppRoute::PayHistory,
            AppRoute::Announcements,
        ],
        Some(Role::Admin) => &[
            AppRoute::DashboardHome,
            AppRoute::Profile,
            AppRoute::ManageMembers,
            AppRoute::MakeAnnouncement,
            AppRoute::AgreementRequests,
            AppRoute::ManageCoupons,
        ],
    };
    links
        .iter()
        .copied()
        .filter(|r| r.access().permits(role))
        .collect()
}

/// Member profile details; users have none.
#[derive(Debug, Clone, PartialEq)]
pub struct Residence {
    pub apartment: ApartmentAttrs,
    pub agreement_at: Option<Timestamp>,
}

impl Residence {
    pub fn of(record: &UserRecord) -> Option<Self> {
        (record.role == Role::Member)
            .then(|| record.apartment())
            .flatten()
            .map(|apartment| Self {
                apartment,
                agreement_at: record.agreement_at,
            })
    }
}

pub struct DashboardService<H: HttpClient> {
    client: Rc<SecuredClient<H>>,
}

impl<H: HttpClient> DashboardService<H> {
    pub fn new(client: Rc<SecuredClient<H>>) -> Self {
        Self { client }
    }

    pub async fn admin_summary(&self) -> AppResult<AdminSummary> {
        self.client.send(&GetAdminSummary).await
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

    #[test]
    fn test_view_waits_for_role() {
        let resolving = RoleState {
            role: None,
            is_resolving: true,
        };
        assert_eq!(DashboardView::for_role(resolving), DashboardView::Loading);
        assert_eq!(
            DashboardView::for_role(RoleState {
                role: Some(Role::Member),
                is_resolving: false
            }),
            DashboardView::Member
        );
    }

    #[test]
    fn test_sidebar_is_filtered_by_role() {
        let member = sidebar_for(Some(Role::Member));
        assert!(member.contains(&AppRoute::MakePayment));
        assert!(!member.contains(&AppRoute::ManageCoupons));

        let user = sidebar_for(Some(Role::User));
        assert!(!user.contains(&AppRoute::PayHistory));

        let admin = sidebar_for(Some(Role::Admin));
        assert!(admin.contains(&AppRoute::AgreementRequests));
        assert!(admin.iter().all(|r| r.nav_label().is_some()));
        assert!(sidebar_for(None).is_empty());
    }

    #[tokio::test]
    async fn test_admin_summary() {
        let session = Rc::new(SessionStore::new(FakeAuthProvider::default()));
        session.handle_auth_state_changed(Some(identity("admin", "admin@b.c")));
        let client = Rc::new(SecuredClient::new(MockHttpClient::new(), BASE_URL, session));
        client.http().mock_response(
            HttpMethod::Get,
            &url("/admin/summary"),
            200,
            json!({"totalRooms": 40, "availableRooms": 10, "availablePercentage": 25.0, "totalMembers": 30}),
        );

        let summary = DashboardService::new(client).admin_summary().await.unwrap();
        assert_eq!(summary.available_rooms, 10);
        assert_eq!(summary.total_users, 0);
    }
}
