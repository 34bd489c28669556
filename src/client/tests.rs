use super::*;
use crate::request::MockHttpClient;
use crate::test_support::{
    BASE_URL, FakeAuthProvider, RecordingHandler, RecordingNavigator, identity, url,
};
use oneroof_shared::protocol::{GetUser, ListCoupons, NewAnnouncement, RemoveMember};
use serde_json::json;

fn setup() -> (Rc<SessionStore<FakeAuthProvider>>, SecuredClient<MockHttpClient>) {
    let session = Rc::new(SessionStore::new(FakeAuthProvider::default()));
    let client = SecuredClient::new(MockHttpClient::new(), BASE_URL, session.clone());
    (session, client)
}

#[tokio::test]
async fn test_bearer_is_read_at_call_time() {
    let (session, client) = setup();
    client
        .http()
        .mock_response(HttpMethod::Get, &url("/coupons"), 200, json!([]));

    let mut user = identity("u1", "a@b.c");
    session.handle_auth_state_changed(Some(user.clone()));
    client.send(&ListCoupons).await.unwrap();

    user.access_credential = "fresh".to_string();
    session.handle_auth_state_changed(Some(user));
    client.send(&ListCoupons).await.unwrap();

    let reqs = client.http().requests_to(HttpMethod::Get, &url("/coupons"));
    assert_eq!(reqs[0].headers.get("Authorization").unwrap(), "Bearer token-u1");
    assert_eq!(reqs[1].headers.get("Authorization").unwrap(), "Bearer fresh");
}

#[tokio::test]
async fn test_no_header_without_identity() {
    let (session, client) = setup();
    session.handle_auth_state_changed(None);
    client
        .http()
        .mock_response(HttpMethod::Get, &url("/coupons"), 200, json!([]));

    client.send(&ListCoupons).await.unwrap();
    let reqs = client.http().requests.borrow();
    assert!(reqs[0].headers.get("Authorization").is_none());
    assert!(reqs[0].body.is_none());
}

#[tokio::test]
async fn test_401_and_403_reach_current_interceptor() {
    let (session, client) = setup();
    session.handle_auth_state_changed(Some(identity("u1", "a@b.c")));
    let handler = Rc::new(RecordingHandler::default());
    let _handle = client.register(handler.clone());

    client
        .http()
        .mock_response(HttpMethod::Get, &url("/user/a%40b.c"), 401, json!({"message": "expired"}));
    client
        .http()
        .mock_response(HttpMethod::Patch, &url("/users/remove-member/x%40y.z"), 403, json!({"message": "admins only"}));

    let err = client
        .send(&GetUser {
            email: "a@b.c".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err, AppError::Unauthorized("expired".to_string()));

    let err = client
        .send(&RemoveMember {
            email: "x@y.z".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(403));

    assert_eq!(
        *handler.failures.borrow(),
        vec![AuthFailure::Unauthorized, AuthFailure::Forbidden]
    );
}

#[tokio::test]
async fn test_stale_interceptor_never_fires_after_sign_out() {
    let (session, client) = setup();
    session.handle_auth_state_changed(Some(identity("u1", "a@b.c")));
    let handler = Rc::new(RecordingHandler::default());
    let handle = client.register(handler.clone());

    session.handle_auth_state_changed(None);
    client
        .http()
        .mock_response(HttpMethod::Get, &url("/coupons"), 401, json!({}));
    assert!(client.send(&ListCoupons).await.is_err());
    assert!(handler.failures.borrow().is_empty());
    assert!(handle.is_active());
}

#[tokio::test]
async fn test_register_replaces_and_drop_ejects() {
    let (session, client) = setup();
    session.handle_auth_state_changed(Some(identity("u1", "a@b.c")));
    let first = Rc::new(RecordingHandler::default());
    let second = Rc::new(RecordingHandler::default());

    let first_handle = client.register(first.clone());
    let second_handle = client.register(second.clone());
    assert!(!first_handle.is_active());
    // Dropping the replaced handle must not eject the newer registration.
    drop(first_handle);
    assert!(second_handle.is_active());

    client
        .http()
        .mock_response(HttpMethod::Get, &url("/coupons"), 403, json!({}));
    let _ = client.send(&ListCoupons).await;
    assert!(first.failures.borrow().is_empty());
    assert_eq!(second.failures.borrow().len(), 1);

    drop(second_handle);
    let _ = client.send(&ListCoupons).await;
    assert_eq!(second.failures.borrow().len(), 1);
}

#[tokio::test]
async fn test_unauthorized_signs_out_and_preserves_origin() {
    let session = SessionStore::new(FakeAuthProvider::default());
    session.handle_auth_state_changed(Some(identity("u1", "a@b.c")));
    let navigator = RecordingNavigator::at("/dashboard/pay-history");

    handle_auth_failure(AuthFailure::Unauthorized, &session, &navigator).await;

    assert_eq!(*session.provider().calls.borrow(), vec!["sign_out"]);
    let navs = navigator.navigations.borrow();
    assert_eq!(navs[0].to, "/auth");
    assert_eq!(navs[0].from.as_deref(), Some("/dashboard/pay-history"));
}

#[tokio::test]
async fn test_forbidden_keeps_session() {
    let session = SessionStore::new(FakeAuthProvider::default());
    session.handle_auth_state_changed(Some(identity("u1", "a@b.c")));
    let navigator = RecordingNavigator::at("/dashboard/manage-members");

    handle_auth_failure(AuthFailure::Forbidden, &session, &navigator).await;

    assert!(session.provider().calls.borrow().is_empty());
    assert!(session.current_identity().is_some());
    assert_eq!(navigator.navigations.borrow()[0].to, "/forbidden");
}

#[tokio::test]
async fn test_body_is_sent_as_json_and_empty_body_acks() {
    let (session, client) = setup();
    session.handle_auth_state_changed(Some(identity("u1", "a@b.c")));
    client.http().mock_response(
        HttpMethod::Post,
        &url("/announcement"),
        200,
        json!({"acknowledged": true}),
    );

    let ack = client
        .send(&NewAnnouncement {
            title: "t".to_string(),
            description: "d".to_string(),
        })
        .await
        .unwrap();
    assert!(ack.acknowledged);
    let req = &client.http().requests_to(HttpMethod::Post, &url("/announcement"))[0];
    assert_eq!(req.body_json()["title"], "t");
    assert_eq!(req.headers.get("Content-Type").unwrap(), "application/json");

    let empty = HttpResponse {
        status: 204,
        body: String::new(),
    };
    let ack: oneroof_shared::MutationAck = empty.json().unwrap();
    assert!(!ack.acknowledged);
}
