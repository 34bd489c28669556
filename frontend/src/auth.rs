//! 认证模块
//!
//! 把核心库的会话与角色状态桥接为 Leptos 信号，并为当前身份安装
//! 401/403 拦截器。路由服务通过注入的信号读取认证状态。

use crate::web::firebase::FirebaseAuth;
use crate::web::http::FetchHttpClient;
use crate::web::router::RouterService;
use crate::web::storage::local_outbox;
use leptos::prelude::*;
use leptos::task::spawn_local;
use oneroof::client::{AuthFailure, AuthFailureHandler, InterceptorHandle, handle_auth_failure};
use oneroof::config::AppConfig;
use oneroof::context::AppContext;
use oneroof::role::RoleState;
use oneroof::session::{Identity, SessionState};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

pub type OneRoof = AppContext<FetchHttpClient, FirebaseAuth>;

/// 认证上下文
///
/// 信号可在组件间自由复制；核心上下文只存在于本线程。
#[derive(Clone, Copy)]
pub struct AuthContext {
    pub session: RwSignal<SessionState>,
    pub role: RwSignal<RoleState>,
    app: StoredValue<Rc<OneRoof>, leptos::prelude::LocalStorage>,
}

impl AuthContext {
    pub fn app(&self) -> Rc<OneRoof> {
        self.app.get_value()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.session.with(|s| s.identity.clone())
    }

    pub fn session_signal(&self) -> Signal<SessionState> {
        self.session.into()
    }

    pub fn role_signal(&self) -> Signal<RoleState> {
        self.role.into()
    }
}

/// 从 Context 获取认证上下文
pub fn use_auth() -> AuthContext {
    use_context::<AuthContext>().expect("AuthContext should be provided")
}

pub fn use_app() -> Rc<OneRoof> {
    use_auth().app()
}

/// Build the application context and wire provider events into signals.
pub fn init_auth(config: AppConfig) -> AuthContext {
    if let Err(e) = config.validate() {
        tracing::warn!("configuration problem: {}", e);
    }
    let provider = FirebaseAuth::init(&config.firebase);
    let app = Rc::new(OneRoof::new(
        config,
        FetchHttpClient,
        provider,
        Rc::new(local_outbox()),
    ));

    let session = RwSignal::new(app.session.snapshot());
    let role = RwSignal::new(app.role_state());

    let weak = Rc::downgrade(&app);
    app.session.subscribe(move |state| {
        session.set(state.clone());
        if let Some(app) = weak.upgrade() {
            sync_role(&app, role);
        }
    });

    let weak = Rc::downgrade(&app);
    app.roles.subscribe(move |_| {
        if let Some(app) = weak.upgrade() {
            sync_role(&app, role);
        }
    });

    let weak = Rc::downgrade(&app);
    let listening = app.session.provider().on_auth_state_changed(move |identity| {
        if let Some(app) = weak.upgrade() {
            app.session.handle_auth_state_changed(identity);
        }
    });
    if !listening {
        // 无认证服务时直接视为未登录
        app.session.handle_auth_state_changed(None);
    }

    let ctx = AuthContext {
        session,
        role,
        app: StoredValue::new_local(app),
    };
    provide_context(ctx);
    ctx
}

/// Publish the current role and start a lookup when one is needed.
fn sync_role(app: &Rc<OneRoof>, role: RwSignal<RoleState>) {
    let state = app.role_state();
    role.set(state);
    if state.is_resolving && app.session.current_identity().is_some() {
        let app = app.clone();
        spawn_local(async move {
            app.refresh_role().await;
        });
    }
}

// ============================================================================
// 拦截器
// ============================================================================

struct RouterInterceptor {
    app: Weak<OneRoof>,
    router: RouterService,
}

impl AuthFailureHandler for RouterInterceptor {
    fn on_auth_failure(&self, failure: AuthFailure) {
        let Some(app) = self.app.upgrade() else {
            return;
        };
        let router = self.router;
        spawn_local(async move {
            handle_auth_failure(failure, &app.session, &router).await;
        });
    }
}

/// Install an interceptor for every new identity; the previous one is ejected.
pub fn install_interceptor(ctx: AuthContext, router: RouterService) {
    let app = ctx.app();
    let handle: RefCell<Option<InterceptorHandle>> = RefCell::new(None);
    let installed_epoch = Cell::new(None::<u64>);

    let register = {
        let weak = Rc::downgrade(&app);
        move |epoch: u64| {
            if installed_epoch.replace(Some(epoch)) == Some(epoch) {
                return;
            }
            let Some(app) = weak.upgrade() else {
                return;
            };
            let interceptor = Rc::new(RouterInterceptor {
                app: Rc::downgrade(&app),
                router,
            });
            *handle.borrow_mut() = Some(app.client.register(interceptor));
        }
    };

    register(app.session.epoch());
    app.session.subscribe(move |state| register(state.epoch));
}
