use crate::client::SecuredClient;
use crate::error::AppResult;
use crate::query::{QueryCache, QueryKey};
use crate::request::HttpClient;
use oneroof_shared::UserRecord;
use oneroof_shared::protocol::{ListMembers, RemoveMember};
use std::rc::Rc;
use tracing::info;

pub struct MemberAdmin<H: HttpClient> {
    client: Rc<SecuredClient<H>>,
    cache: Rc<QueryCache>,
}

impl<H: HttpClient> MemberAdmin<H> {
    pub fn new(client: Rc<SecuredClient<H>>, cache: Rc<QueryCache>) -> Self {
        Self { client, cache }
    }

    pub async fn list(&self) -> AppResult<Vec<UserRecord>> {
        self.client.send(&ListMembers).await
    }

    /// Demote a member back to `user`; the backend clears the apartment fields.
    pub async fn remove(&self, member: &UserRecord) -> AppResult<String> {
        self.client
            .send(&RemoveMember {
                email: member.email.clone(),
            })
            .await?;
        info!(email = %member.email, "member removed");
        self.cache.invalidate_all([
            QueryKey::Members,
            QueryKey::UserProfile(member.email.clone()),
            QueryKey::AdminSummary,
        ]);
        let name = if member.name.is_empty() {
            &member.email
        } else {
            &member.name
        };
        Ok(format!("{} is no longer a member.", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::MockHttpClient;
    use crate::role::RoleResolver;
    use crate::session::SessionStore;
    use crate::test_support::{BASE_URL, FakeAuthProvider, identity, url};
    use oneroof_shared::Role;
    use oneroof_shared::protocol::HttpMethod;
    use serde_json::json;

    #[tokio::test]
    async fn test_remove_invalidates_members_and_role() {
        let session = Rc::new(SessionStore::new(FakeAuthProvider::default()));
        session.handle_auth_state_changed(Some(identity("admin", "admin@b.c")));
        let client = Rc::new(SecuredClient::new(MockHttpClient::new(), BASE_URL, session));
        let cache = Rc::new(QueryCache::new());
        let roles = Rc::new(RoleResolver::new());
        roles.attach(&cache);

        let member_identity = identity("m1", "m@b.c");
        let member_json = json!({"email": "m@b.c", "name": "Mo", "role": "member",
            "floor": 1, "block": "A", "apartmentNo": "101", "rent": 800.0});
        client
            .http()
            .mock_response(HttpMethod::Get, &url("/user/m%40b.c"), 200, member_json.clone());
        client
            .http()
            .mock_response(HttpMethod::Get, &url("/users/members"), 200, json!([member_json]));
        client.http().mock_response(
            HttpMethod::Patch,
            &url("/users/remove-member/m%40b.c"),
            200,
            json!({"modifiedCount": 1}),
        );
        roles.resolve(&client, &member_identity).await;
        assert_eq!(roles.state_for(Some(&member_identity)).role, Some(Role::Member));

        let admin = MemberAdmin::new(client.clone(), cache.clone());
        let members = admin.list().await.unwrap();
        let message = admin.remove(&members[0]).await.unwrap();

        assert_eq!(message, "Mo is no longer a member.");
        assert_eq!(cache.version(&QueryKey::Members), 1);
        assert!(roles.state_for(Some(&member_identity)).is_resolving);
    }
}
