use super::*;
use crate::request::MockHttpClient;
use crate::session::SessionStore;
use crate::test_support::{BASE_URL, FakeAuthProvider, identity, url};
use oneroof_shared::Timestamp;
use oneroof_shared::protocol::HttpMethod;
use serde_json::json;

struct Fixture {
    workflow: AgreementWorkflow<MockHttpClient>,
    client: Rc<SecuredClient<MockHttpClient>>,
    cache: Rc<QueryCache>,
}

fn fixture() -> Fixture {
    let session = Rc::new(SessionStore::new(FakeAuthProvider::default()));
    session.handle_auth_state_changed(Some(identity("admin", "admin@b.c")));
    let client = Rc::new(SecuredClient::new(MockHttpClient::new(), BASE_URL, session));
    let cache = Rc::new(QueryCache::new());
    Fixture {
        workflow: AgreementWorkflow::new(client.clone(), cache.clone()),
        client,
        cache,
    }
}

fn apartment() -> Apartment {
    Apartment {
        id: "apt1".to_string(),
        floor: 3,
        block: "B".to_string(),
        apartment_no: "302".to_string(),
        rent: 1200.0,
        image: None,
    }
}

fn pending(id: &str) -> AgreementRequest {
    AgreementRequest {
        id: id.to_string(),
        user_name: "Ada".to_string(),
        user_email: "ada@b.c".to_string(),
        user_img: None,
        floor: 3,
        block: "B".to_string(),
        apartment_no: "302".to_string(),
        rent: 1200.0,
        status: AgreementStatus::Pending,
        created_date: Timestamp::now(),
    }
}

#[tokio::test]
async fn test_anonymous_submit_redirects_without_post() {
    let f = fixture();
    let outcome = f
        .workflow
        .submit_request(None, &apartment(), "/apartments")
        .await
        .unwrap();

    match outcome {
        SubmitOutcome::SignInRequired(nav) => {
            assert_eq!(nav.to, "/auth");
            assert_eq!(nav.from.as_deref(), Some("/apartments"));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(f.client.http().requests.borrow().is_empty());
}

#[tokio::test]
async fn test_submit_posts_apartment_and_invalidates_listing() {
    let f = fixture();
    f.client
        .http()
        .mock_response(HttpMethod::Post, &url("/agreements"), 200, json!({"insertedId": "ag1"}));
    let user = identity("u1", "ada@b.c");

    let outcome = f
        .workflow
        .submit_request(Some(&user), &apartment(), "/apartments")
        .await
        .unwrap();
    assert_eq!(outcome, SubmitOutcome::Submitted);

    let body = f.client.http().requests_to(HttpMethod::Post, &url("/agreements"))[0].body_json();
    assert_eq!(body["userEmail"], "ada@b.c");
    assert_eq!(body["apartmentNo"], "302");
    assert_eq!(body["rent"], 1200.0);
    assert_eq!(f.cache.version(&QueryKey::Apartments), 1);
}

#[tokio::test]
async fn test_duplicate_submission_surfaces_backend_message() {
    let f = fixture();
    f.client.http().mock_response(
        HttpMethod::Post,
        &url("/agreements"),
        409,
        json!({"message": "You already have a pending request"}),
    );
    let user = identity("u1", "ada@b.c");
    let err = f
        .workflow
        .submit_request(Some(&user), &apartment(), "/apartments")
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "You already have a pending request");
    assert_eq!(f.cache.version(&QueryKey::Apartments), 0);
}

#[tokio::test]
async fn test_accept_names_member_and_invalidates_role() {
    let f = fixture();
    f.client.http().mock_response(
        HttpMethod::Patch,
        &url("/agreements/accept/ag1"),
        200,
        json!({"modifiedCount": 1}),
    );

    let message = f.workflow.accept_request(&pending("ag1")).await.unwrap();
    assert_eq!(message, "Ada is now a member.");
    assert_eq!(f.cache.version(&QueryKey::PendingAgreements), 1);
    assert_eq!(f.cache.version(&QueryKey::UserProfile("ada@b.c".to_string())), 1);
    assert_eq!(f.cache.version(&QueryKey::Members), 1);
}

#[tokio::test]
async fn test_second_decision_on_same_request_is_refused() {
    let f = fixture();
    f.client.http().mock_response(
        HttpMethod::Patch,
        &url("/agreements/accept/ag1"),
        200,
        json!({}),
    );
    f.client.http().mock_response(
        HttpMethod::Patch,
        &url("/agreements/reject/ag1"),
        200,
        json!({}),
    );
    let request = pending("ag1");

    let (first, second) = futures::join!(
        f.workflow.accept_request(&request),
        f.workflow.accept_request(&request)
    );
    assert_eq!([first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(), 1);

    let err = f.workflow.reject_request(&request).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(f.client.http().requests.borrow().len(), 1);
    assert!(f.workflow.is_locked("ag1"));
}

#[tokio::test]
async fn test_failed_decision_can_be_retried() {
    let f = fixture();
    let endpoint = url("/agreements/reject/ag2");
    f.client
        .http()
        .mock_response(HttpMethod::Patch, &endpoint, 500, json!({"message": "boom"}));
    assert!(f.workflow.reject_request(&pending("ag2")).await.is_err());
    assert!(!f.workflow.is_locked("ag2"));

    f.client
        .http()
        .mock_response(HttpMethod::Patch, &endpoint, 200, json!({}));
    let message = f.workflow.reject_request(&pending("ag2")).await.unwrap();
    assert_eq!(message, "Request from Ada was rejected.");
    assert_eq!(f.cache.version(&QueryKey::PendingAgreements), 1);
}

#[tokio::test]
async fn test_pending_list_only_keeps_pending() {
    let f = fixture();
    let mut accepted = serde_json::to_value(pending("ag9")).unwrap();
    accepted["status"] = json!("accepted");
    f.client.http().mock_response(
        HttpMethod::Get,
        &url("/agreements?status=pending"),
        200,
        json!([pending("ag1"), accepted]),
    );
    let list = f.workflow.pending_requests().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, "ag1");
}
