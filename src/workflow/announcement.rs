use super::required;
use crate::client::SecuredClient;
use crate::error::AppResult;
use crate::query::{QueryCache, QueryKey};
use crate::request::HttpClient;
use oneroof_shared::Announcement;
use oneroof_shared::protocol::{ListAnnouncements, NewAnnouncement};
use std::rc::Rc;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnouncementDraft {
    pub title: String,
    pub description: String,
}

impl AnnouncementDraft {
    pub fn validate(&self) -> AppResult<NewAnnouncement> {
        Ok(NewAnnouncement {
            title: required(&self.title, "Title")?,
            description: required(&self.description, "Description")?,
        })
    }
}

/// Admin-written, read by every signed-in user. No edit or delete.
pub struct AnnouncementBoard<H: HttpClient> {
    client: Rc<SecuredClient<H>>,
    cache: Rc<QueryCache>,
}

impl<H: HttpClient> AnnouncementBoard<H> {
    pub fn new(client: Rc<SecuredClient<H>>, cache: Rc<QueryCache>) -> Self {
        Self { client, cache }
    }

    pub async fn create(&self, draft: &AnnouncementDraft) -> AppResult<()> {
        let announcement = draft.validate()?;
        self.client.send(&announcement).await?;
        info!(title = %announcement.title, "announcement published");
        self.cache.invalidate(QueryKey::Announcements);
        Ok(())
    }

    /// Newest first.
    pub async fn list(&self) -> AppResult<Vec<Announcement>> {
        let mut list = self.client.send(&ListAnnouncements).await?;
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::request::MockHttpClient;
    use crate::session::SessionStore;
    use crate::test_support::{BASE_URL, FakeAuthProvider, identity, url};
    use oneroof_shared::protocol::HttpMethod;
    use serde_json::json;

    fn board() -> (AnnouncementBoard<MockHttpClient>, Rc<QueryCache>) {
        let session = Rc::new(SessionStore::new(FakeAuthProvider::default()));
        session.handle_auth_state_changed(Some(identity("admin", "admin@b.c")));
        let client = Rc::new(SecuredClient::new(MockHttpClient::new(), BASE_URL, session));
        let cache = Rc::new(QueryCache::new());
        (AnnouncementBoard::new(client, cache.clone()), cache)
    }

    #[tokio::test]
    async fn test_create_trims_and_requires_fields() {
        let (board, cache) = board();
        board
            .client
            .http()
            .mock_response(HttpMethod::Post, &url("/announcement"), 200, json!({}));

        let blank = AnnouncementDraft {
            title: "  ".to_string(),
            description: "x".to_string(),
        };
        assert!(matches!(board.create(&blank).await, Err(AppError::Validation(_))));

        let draft = AnnouncementDraft {
            title: " Water outage ".to_string(),
            description: "Tuesday 10-12".to_string(),
        };
        board.create(&draft).await.unwrap();
        let body = board.client.http().requests_to(HttpMethod::Post, &url("/announcement"))[0].body_json();
        assert_eq!(body["title"], "Water outage");
        assert_eq!(cache.version(&QueryKey::Announcements), 1);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let (board, _) = board();
        board.client.http().mock_response(
            HttpMethod::Get,
            &url("/announcement"),
            200,
            json!([
                {"_id": "a1", "title": "old", "description": "", "createdAt": "2025-01-01T00:00:00Z"},
                {"_id": "a2", "title": "new", "description": "", "createdAt": "2025-02-01T00:00:00Z"}
            ]),
        );
        let list = board.list().await.unwrap();
        assert_eq!(list[0].title, "new");
    }
}
