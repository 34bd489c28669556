//! Firebase Auth 绑定
//!
//! Uses the compat SDK loaded by `index.html` (`firebase.auth()`). The
//! identity object handed to Rust already carries a fresh ID token.

use crate::serde_helper::{from_value, js_error_message, to_value};
use oneroof::config::FirebaseConfig;
use oneroof::error::{AppError, AppResult};
use oneroof::session::{AuthProvider, Identity};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(inline_js = r#"
let auth = null;

async function toIdentity(user) {
    if (!user) return null;
    const token = await user.getIdToken();
    return {
        id: user.uid,
        displayName: user.displayName,
        email: user.email,
        photoUrl: user.photoURL,
        accessCredential: token,
    };
}

export function fb_init(config) {
    if (typeof firebase === "undefined") throw new Error("Firebase SDK is not loaded");
    if (!firebase.apps.length) firebase.initializeApp(config);
    auth = firebase.auth();
}

export function fb_on_id_token_changed(cb) {
    auth.onIdTokenChanged(async (user) => {
        try {
            cb(await toIdentity(user));
        } catch (e) {
            cb(null);
        }
    });
}

export async function fb_sign_up(email, password) {
    const cred = await auth.createUserWithEmailAndPassword(email, password);
    return toIdentity(cred.user);
}

export async function fb_sign_in(email, password) {
    const cred = await auth.signInWithEmailAndPassword(email, password);
    return toIdentity(cred.user);
}

export async function fb_sign_in_google() {
    const provider = new firebase.auth.GoogleAuthProvider();
    const cred = await auth.signInWithPopup(provider);
    return toIdentity(cred.user);
}

export async function fb_update_profile(name, photo) {
    if (!auth.currentUser) throw new Error("Not signed in");
    await auth.currentUser.updateProfile({ displayName: name, photoURL: photo });
}

export async function fb_sign_out() {
    await auth.signOut();
}
"#)]
extern "C" {
    #[wasm_bindgen(catch)]
    fn fb_init(config: JsValue) -> Result<(), JsValue>;

    fn fb_on_id_token_changed(cb: &Closure<dyn Fn(JsValue)>);

    #[wasm_bindgen(catch)]
    async fn fb_sign_up(email: &str, password: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn fb_sign_in(email: &str, password: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn fb_sign_in_google() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn fb_update_profile(name: &str, photo: Option<String>) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn fb_sign_out() -> Result<JsValue, JsValue>;
}

fn auth_error(e: JsValue) -> AppError {
    AppError::auth(js_error_message(&e))
}

fn identity_from(value: JsValue) -> AppResult<Identity> {
    if value.is_null() || value.is_undefined() {
        return Err(AppError::auth("The auth provider returned no user"));
    }
    from_value(value)
}

/// Firebase-backed [`AuthProvider`].
///
/// When the SDK is missing or unconfigured the provider stays usable: every
/// operation fails with the recorded reason and no auth events are emitted.
pub struct FirebaseAuth {
    unavailable: Option<String>,
}

impl FirebaseAuth {
    pub fn init(config: &FirebaseConfig) -> Self {
        let result = if config.is_configured() {
            to_value(config).and_then(|cfg| fb_init(cfg).map_err(auth_error))
        } else {
            Err(AppError::auth("Firebase is not configured"))
        };
        match result {
            Ok(()) => Self { unavailable: None },
            Err(e) => {
                tracing::warn!("authentication unavailable: {}", e);
                Self {
                    unavailable: Some(e.user_message().to_string()),
                }
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.unavailable.is_none()
    }

    fn ready(&self) -> AppResult<()> {
        match &self.unavailable {
            Some(reason) => Err(AppError::auth(reason.clone())),
            None => Ok(()),
        }
    }

    /// Forward every auth-state transition (start, sign-in, sign-out, token refresh).
    ///
    /// Returns `false` without registering when the SDK is unavailable.
    pub fn on_auth_state_changed(&self, callback: impl Fn(Option<Identity>) + 'static) -> bool {
        if !self.is_available() {
            return false;
        }
        let closure = Closure::<dyn Fn(JsValue)>::new(move |value: JsValue| {
            let identity = if value.is_null() || value.is_undefined() {
                None
            } else {
                match from_value::<Identity>(value) {
                    Ok(identity) => Some(identity),
                    Err(e) => {
                        tracing::warn!("unreadable auth user: {}", e);
                        None
                    }
                }
            };
            callback(identity);
        });
        fb_on_id_token_changed(&closure);
        // 监听器与页面同生命周期
        closure.forget();
        true
    }
}

#[async_trait::async_trait(?Send)]
impl AuthProvider for FirebaseAuth {
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<Identity> {
        self.ready()?;
        identity_from(fb_sign_up(email, password).await.map_err(auth_error)?)
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity> {
        self.ready()?;
        identity_from(fb_sign_in(email, password).await.map_err(auth_error)?)
    }

    async fn sign_in_with_oauth(&self) -> AppResult<Identity> {
        self.ready()?;
        identity_from(fb_sign_in_google().await.map_err(auth_error)?)
    }

    async fn update_profile(&self, name: &str, photo_url: Option<&str>) -> AppResult<()> {
        self.ready()?;
        fb_update_profile(name, photo_url.map(str::to_string))
            .await
            .map_err(auth_error)?;
        Ok(())
    }

    async fn sign_out(&self) -> AppResult<()> {
        if !self.is_available() {
            return Ok(());
        }
        fb_sign_out().await.map_err(auth_error)?;
        Ok(())
    }
}
