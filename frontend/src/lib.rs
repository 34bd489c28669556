//! OneRoof 前端应用
//!
//! 采用 Context-Driven 的高内聚低耦合架构：
//! - `oneroof::route`: 路由定义（领域模型，位于核心库）
//! - `web::router`: 路由服务（核心引擎）
//! - `auth`: 会话与角色信号
//! - `components`: UI 组件层

mod auth;
mod components {
    pub mod apartments;
    pub mod dashboard;
    pub mod feedback;
    pub mod home;
    pub mod layout;
    pub mod login;
    pub mod query;
    pub mod status;
}
mod serde_helper;

use crate::auth::{init_auth, install_interceptor, use_auth};
use crate::components::apartments::ApartmentsPage;
use crate::components::dashboard::admin::{
    AgreementRequestsPage, MakeAnnouncementPage, ManageCouponsPage, ManageMembersPage,
};
use crate::components::dashboard::member::{CheckoutPage, MakePaymentPage, PayHistoryPage};
use crate::components::dashboard::{AnnouncementsPage, DashboardHome, DashboardShell, ProfilePage};
use crate::components::feedback::{Toaster, provide_notifier};
use crate::components::home::{FaqPage, HomePage};
use crate::components::layout::{Footer, Navbar};
use crate::components::login::{LoginPage, RegisterPage};
use crate::components::status::{DashboardForbiddenPage, ForbiddenPage, NotFoundPage};

use leptos::prelude::*;
use oneroof::config::{
    AppConfig, ENV_API_URL, ENV_FIREBASE_API_KEY, ENV_FIREBASE_APP_ID, ENV_FIREBASE_AUTH_DOMAIN,
    ENV_FIREBASE_PROJECT_ID, ENV_STRIPE_KEY,
};
use oneroof::route::AppRoute;

// 原生 Web API 封装模块
pub(crate) mod web {
    pub mod console;
    pub mod firebase;
    pub mod http;
    pub mod router;
    pub mod storage;
    pub mod stripe;
}

use web::router::{Router, RouterOutlet, use_router};

pub use web::console::init_logging;

/// Build-time configuration, baked in by `trunk build`.
fn build_config() -> AppConfig {
    AppConfig::from_lookup(|key| {
        let value = match key {
            ENV_API_URL => option_env!("ONEROOF_API_URL"),
            ENV_STRIPE_KEY => option_env!("ONEROOF_STRIPE_KEY"),
            ENV_FIREBASE_API_KEY => option_env!("ONEROOF_FIREBASE_API_KEY"),
            ENV_FIREBASE_AUTH_DOMAIN => option_env!("ONEROOF_FIREBASE_AUTH_DOMAIN"),
            ENV_FIREBASE_PROJECT_ID => option_env!("ONEROOF_FIREBASE_PROJECT_ID"),
            ENV_FIREBASE_APP_ID => option_env!("ONEROOF_FIREBASE_APP_ID"),
            _ => None,
        };
        value.map(str::to_string)
    })
}

/// 路由匹配函数
///
/// 守卫已在 RouterOutlet 中通过，这里只负责选择页面。
fn route_matcher(route: AppRoute) -> AnyView {
    let page = match route {
        AppRoute::Home => view! { <HomePage /> }.into_any(),
        AppRoute::Apartments => view! { <ApartmentsPage /> }.into_any(),
        AppRoute::Faq => view! { <FaqPage /> }.into_any(),
        AppRoute::SignIn => view! { <LoginPage /> }.into_any(),
        AppRoute::Register => view! { <RegisterPage /> }.into_any(),
        AppRoute::Forbidden => view! { <ForbiddenPage /> }.into_any(),
        AppRoute::NotFound => view! { <NotFoundPage /> }.into_any(),
        AppRoute::DashboardHome => view! { <DashboardHome /> }.into_any(),
        AppRoute::Profile => view! { <ProfilePage /> }.into_any(),
        AppRoute::Announcements => view! { <AnnouncementsPage /> }.into_any(),
        AppRoute::MakePayment => view! { <MakePaymentPage /> }.into_any(),
        AppRoute::Payment => view! { <CheckoutPage /> }.into_any(),
        AppRoute::PayHistory => view! { <PayHistoryPage /> }.into_any(),
        AppRoute::MakeAnnouncement => view! { <MakeAnnouncementPage /> }.into_any(),
        AppRoute::ManageMembers => view! { <ManageMembersPage /> }.into_any(),
        AppRoute::AgreementRequests => view! { <AgreementRequestsPage /> }.into_any(),
        AppRoute::ManageCoupons => view! { <ManageCouponsPage /> }.into_any(),
        AppRoute::DashboardForbidden => view! { <DashboardForbiddenPage /> }.into_any(),
    };

    if route.is_dashboard() {
        view! { <DashboardShell>{page}</DashboardShell> }.into_any()
    } else {
        view! {
            <Navbar />
            <main class="min-h-[70vh]">{page}</main>
            <Footer />
        }
        .into_any()
    }
}

/// 在路由器内部安装 401/403 拦截器
#[component]
fn SessionInterceptor() -> impl IntoView {
    install_interceptor(use_auth(), use_router());
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 创建通知与认证上下文
    provide_notifier();
    let auth_ctx = init_auth(build_config());
    components::dashboard::member::provide_checkout();

    // 2. 会话与角色信号注入路由服务（解耦！）
    view! {
        <Toaster />
        <Router session=auth_ctx.session_signal() role=auth_ctx.role_signal()>
            <SessionInterceptor />
            <RouterOutlet matcher=route_matcher />
        </Router>
    }
}
