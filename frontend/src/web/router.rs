//! 路由服务模块 - 核心引擎
//!
//! 封装 web_sys 的 History API：所有对 window.history 的操作都集中在此模块。
//! 守卫判断由核心库的 [`evaluate_path`] 完成，这里只负责
//! "监听 -> 验证 -> 重定向 -> 加载"。

use leptos::prelude::*;
use oneroof::client::Navigator;
use oneroof::guard::{GuardDecision, evaluate_path};
use oneroof::role::RoleState;
use oneroof::route::{AppRoute, Navigation};
use oneroof::session::SessionState;
use wasm_bindgen::prelude::*;

/// 当前浏览器路径（含查询串）
fn location_path() -> String {
    let Some(location) = web_sys::window().map(|w| w.location()) else {
        return "/".to_string();
    };
    let path = location.pathname().unwrap_or_else(|_| "/".to_string());
    let search = location.search().unwrap_or_default();
    format!("{}{}", path, search)
}

/// `history.state.from`，由导航写入
fn state_from() -> Option<String> {
    let state = web_sys::window()?.history().ok()?.state().ok()?;
    if state.is_null() || state.is_undefined() {
        return None;
    }
    js_sys::Reflect::get(&state, &JsValue::from_str("from"))
        .ok()?
        .as_string()
}

fn history_state(from: Option<&str>) -> JsValue {
    let Some(from) = from else {
        return JsValue::NULL;
    };
    let state = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&state, &JsValue::from_str("from"), &JsValue::from_str(from));
    state.into()
}

fn write_history(navigation: &Navigation) {
    let Some(history) = web_sys::window().and_then(|w| w.history().ok()) else {
        return;
    };
    let state = history_state(navigation.from.as_deref());
    let result = if navigation.replace {
        history.replace_state_with_url(&state, "", Some(&navigation.to))
    } else {
        history.push_state_with_url(&state, "", Some(&navigation.to))
    };
    if let Err(e) = result {
        tracing::warn!(to = %navigation.to, "history update failed: {:?}", e);
    }
}

/// 路由器服务
///
/// 通过 Signal 驱动界面更新；会话与角色状态由外部注入。
#[derive(Clone, Copy)]
pub struct RouterService {
    path: RwSignal<String>,
    from: RwSignal<Option<String>>,
    route: Memo<AppRoute>,
    session: Signal<SessionState>,
    role: Signal<RoleState>,
}

impl RouterService {
    fn new(session: Signal<SessionState>, role: Signal<RoleState>) -> Self {
        let path = RwSignal::new(location_path());
        let from = RwSignal::new(state_from());
        let route = Memo::new(move |_| AppRoute::from_path(&path.get()));
        Self {
            path,
            from,
            route,
            session,
            role,
        }
    }

    pub fn path(&self) -> Signal<String> {
        self.path.into()
    }

    pub fn route(&self) -> Memo<AppRoute> {
        self.route
    }

    /// `state.from` of the current history entry.
    pub fn from_state(&self) -> Option<String> {
        self.from.get_untracked()
    }

    /// 普通链接跳转
    pub fn navigate(&self, path: &str) {
        self.go(Navigation {
            to: path.to_string(),
            from: None,
            replace: false,
        });
    }

    pub fn go(&self, navigation: Navigation) {
        if navigation.to == self.path.get_untracked() && navigation.replace {
            return;
        }
        tracing::debug!(to = %navigation.to, from = ?navigation.from, replace = navigation.replace, "navigate");
        write_history(&navigation);
        self.from.set(navigation.from);
        self.path.set(navigation.to);
        if let Some(window) = web_sys::window() {
            window.scroll_to_with_x_and_y(0.0, 0.0);
        }
    }

    /// 初始化浏览器后退/前进按钮监听
    fn init_popstate_listener(&self) {
        let path = self.path;
        let from = self.from;

        let closure = Closure::<dyn Fn()>::new(move || {
            from.set(state_from());
            path.set(location_path());
        });

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
        }

        // 泄漏闭包以保持监听器存活
        closure.forget();
    }

    /// 登录成功后离开登录/注册页，回到 `from`
    fn setup_auth_redirect(&self) {
        let router = *self;
        Effect::new(move |_| {
            let signed_in = router.session.with(|s| !s.is_resolving && s.is_authenticated());
            let route = router.route.get();
            if signed_in && matches!(route, AppRoute::SignIn | AppRoute::Register) {
                let from = router.from.get_untracked();
                tracing::info!(from = ?from, "signed in, leaving auth page");
                router.go(Navigation::after_sign_in(from.as_deref()));
            }
        });
    }
}

impl Navigator for RouterService {
    fn current_path(&self) -> String {
        self.path.get_untracked()
    }

    fn navigate(&self, navigation: Navigation) {
        self.go(navigation);
    }
}

/// 提供路由服务到 Context 并初始化
fn provide_router(session: Signal<SessionState>, role: Signal<RoleState>) -> RouterService {
    let router = RouterService::new(session, role);

    router.init_popstate_listener();
    router.setup_auth_redirect();

    provide_context(router);
    router
}

/// 从 Context 获取路由服务
pub fn use_router() -> RouterService {
    use_context::<RouterService>()
        .expect("RouterService not found in context. Ensure Router is provided.")
}

// ============================================================================
// UI 组件
// ============================================================================

/// 路由器根组件
#[component]
pub fn Router(
    session: Signal<SessionState>,
    role: Signal<RoleState>,
    children: Children,
) -> impl IntoView {
    provide_router(session, role);

    children()
}

/// 路由出口组件
///
/// 守卫通过后才渲染匹配的页面；等待期间显示加载占位。
#[component]
pub fn RouterOutlet(
    /// 路由匹配函数：接收当前路由，返回对应视图
    matcher: fn(AppRoute) -> AnyView,
) -> impl IntoView {
    let router = use_router();
    let session = router.session;
    let role = router.role;

    let decision = Memo::new(move |_| {
        let path = router.path.get();
        session.with(|s| evaluate_path(&path, s, role.get()))
    });

    Effect::new(move |_| {
        if let GuardDecision::Redirect(navigation) = decision.get() {
            router.go(navigation);
        }
    });

    move || match decision.get() {
        GuardDecision::Render => matcher(router.route.get()),
        GuardDecision::Loading | GuardDecision::Redirect(_) => view! {
            <div class="flex items-center justify-center min-h-[60vh]">
                <span class="loading loading-spinner loading-lg text-primary"></span>
            </div>
        }
        .into_any(),
    }
}

/// 站内链接：拦截点击，走 History API
#[component]
pub fn Link(
    #[prop(into)] to: String,
    #[prop(optional, into)] class: String,
    children: Children,
) -> impl IntoView {
    let router = use_router();
    let target = to.clone();
    let on_click = move |ev: web_sys::MouseEvent| {
        if ev.ctrl_key() || ev.meta_key() || ev.shift_key() {
            return;
        }
        ev.prevent_default();
        router.navigate(&target);
    };

    view! {
        <a href=to class=class on:click=on_click>
            {children()}
        </a>
    }
}
