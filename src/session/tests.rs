use super::*;
use crate::test_support::{FakeAuthProvider, identity};
use std::cell::Cell;

#[test]
fn test_resolving_until_first_callback() {
    let store = SessionStore::new(FakeAuthProvider::default());
    let state = store.snapshot();
    assert!(state.is_resolving);
    assert!(!state.initialized);
    assert!(!state.is_authenticated());

    store.handle_auth_state_changed(None);
    let state = store.snapshot();
    assert!(!state.is_resolving);
    assert!(state.initialized);
    assert_eq!(state.identity, None);
}

#[tokio::test]
async fn test_sign_in_sets_resolving_and_waits_for_subscription() {
    let store = SessionStore::new(FakeAuthProvider::default());
    store.handle_auth_state_changed(None);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    store.subscribe(move |s| sink.borrow_mut().push(s.is_resolving));

    let returned = store.sign_in("a@b.c", "secret1").await.unwrap();
    assert_eq!(returned.email, "a@b.c");
    // Identity is not adopted from the call result.
    assert!(store.current_identity().is_none());
    assert!(store.is_resolving());

    store.handle_auth_state_changed(Some(returned));
    assert!(store.snapshot().is_authenticated());
    assert_eq!(*seen.borrow(), vec![true, false]);
}

#[tokio::test]
async fn test_failed_sign_in_keeps_identity_and_surfaces_message() {
    let store = SessionStore::new(FakeAuthProvider::failing("auth/wrong-password"));
    let current = identity("u1", "a@b.c");
    store.handle_auth_state_changed(Some(current.clone()));

    let err = store.sign_in("a@b.c", "bad").await.unwrap_err();
    assert_eq!(err.user_message(), "auth/wrong-password");
    assert_eq!(store.current_identity(), Some(current));
    assert!(!store.is_resolving());
}

#[tokio::test]
async fn test_failure_before_first_callback_keeps_resolving() {
    let store = SessionStore::new(FakeAuthProvider::failing("network"));
    assert!(store.sign_in("a@b.c", "x").await.is_err());
    assert!(store.is_resolving());
}

#[test]
fn test_epoch_changes_only_with_principal() {
    let store = SessionStore::new(FakeAuthProvider::default());
    store.handle_auth_state_changed(None);
    let start = store.epoch();

    let mut user = identity("u1", "a@b.c");
    store.handle_auth_state_changed(Some(user.clone()));
    assert_eq!(store.epoch(), start + 1);

    // Token refresh: same principal, new credential.
    user.access_credential = "token-refreshed".to_string();
    store.handle_auth_state_changed(Some(user));
    assert_eq!(store.epoch(), start + 1);
    assert_eq!(store.credential().as_deref(), Some("token-refreshed"));

    store.handle_auth_state_changed(None);
    assert_eq!(store.epoch(), start + 2);
    assert_eq!(store.credential(), None);
}

#[tokio::test]
async fn test_update_profile_patches_identity() {
    let store = SessionStore::new(FakeAuthProvider::default());
    store.handle_auth_state_changed(Some(identity("u1", "a@b.c")));
    let notified = Rc::new(Cell::new(0));
    let n = notified.clone();
    store.subscribe(move |_| n.set(n.get() + 1));

    store
        .update_profile("Ada", Some("https://img/ada.png"))
        .await
        .unwrap();
    let current = store.current_identity().unwrap();
    assert_eq!(current.display_name.as_deref(), Some("Ada"));
    assert_eq!(current.photo_url.as_deref(), Some("https://img/ada.png"));
    assert_eq!(notified.get(), 1);
}

#[test]
fn test_listener_can_read_store_while_notified() {
    let store = Rc::new(SessionStore::new(FakeAuthProvider::default()));
    let inner = store.clone();
    let observed = Rc::new(RefCell::new(None));
    let sink = observed.clone();
    store.subscribe(move |_| *sink.borrow_mut() = inner.current_identity());

    store.handle_auth_state_changed(Some(identity("u1", "a@b.c")));
    assert_eq!(observed.borrow().as_ref().map(|i| i.email.clone()), Some("a@b.c".to_string()));
}
