//! 路由定义模块 - 领域模型
//!
//! 纯业务逻辑，不依赖 DOM。定义所有路由、访问要求以及导航请求。

use oneroof_shared::Role;
use std::fmt::Display;

// =========================================================
// 访问要求 (Access)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Role(Role),
}

impl Access {
    /// Whether a resolved role satisfies this requirement.
    pub fn permits(&self, role: Option<Role>) -> bool {
        match self {
            Access::Public | Access::Authenticated => true,
            Access::Role(required) => role == Some(*required),
        }
    }
}

// =========================================================
// 路由 (AppRoute)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppRoute {
    #[default]
    Home,
    Apartments,
    Faq,
    SignIn,
    Register,
    Forbidden,
    NotFound,
    DashboardHome,
    Profile,
    Announcements,
    MakePayment,
    PayHistory,
    Payment,
    MakeAnnouncement,
    ManageMembers,
    AgreementRequests,
    ManageCoupons,
    DashboardForbidden,
}

impl AppRoute {
    /// 将 URL path 解析为路由枚举；忽略查询串和末尾的 `/`
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or("/");
        let path = match path.trim_end_matches('/') {
            "" => "/",
            p => p,
        };
        match path {
            "/" => Self::Home,
            "/apartments" => Self::Apartments,
            "/faq" => Self::Faq,
            "/auth" => Self::SignIn,
            "/auth/register" => Self::Register,
            "/forbidden" => Self::Forbidden,
            "/dashboard" => Self::DashboardHome,
            "/dashboard/profile" => Self::Profile,
            "/dashboard/announcement" => Self::Announcements,
            "/dashboard/make-payment" => Self::MakePayment,
            "/dashboard/pay-history" => Self::PayHistory,
            "/dashboard/payment" => Self::Payment,
            "/dashboard/make-announcement" => Self::MakeAnnouncement,
            "/dashboard/manage-members" => Self::ManageMembers,
            "/dashboard/agreement-req" => Self::AgreementRequests,
            "/dashboard/manage-coupons" => Self::ManageCoupons,
            "/dashboard/forbidden" => Self::DashboardForbidden,
            _ => Self::NotFound,
        }
    }

    pub fn to_path(&self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Apartments => "/apartments",
            Self::Faq => "/faq",
            Self::SignIn => "/auth",
            Self::Register => "/auth/register",
            Self::Forbidden => "/forbidden",
            Self::NotFound => "/404",
            Self::DashboardHome => "/dashboard",
            Self::Profile => "/dashboard/profile",
            Self::Announcements => "/dashboard/announcement",
            Self::MakePayment => "/dashboard/make-payment",
            Self::PayHistory => "/dashboard/pay-history",
            Self::Payment => "/dashboard/payment",
            Self::MakeAnnouncement => "/dashboard/make-announcement",
            Self::ManageMembers => "/dashboard/manage-members",
            Self::AgreementRequests => "/dashboard/agreement-req",
            Self::ManageCoupons => "/dashboard/manage-coupons",
            Self::DashboardForbidden => "/dashboard/forbidden",
        }
    }

    /// **核心守卫逻辑：定义该路由的访问要求**
    pub fn access(&self) -> Access {
        match self {
            Self::Home
            | Self::Apartments
            | Self::Faq
            | Self::SignIn
            | Self::Register
            | Self::Forbidden
            | Self::NotFound => Access::Public,
            Self::DashboardHome
            | Self::Profile
            | Self::Announcements
            | Self::DashboardForbidden => Access::Authenticated,
            Self::MakePayment | Self::PayHistory | Self::Payment => Access::Role(Role::Member),
            Self::MakeAnnouncement
            | Self::ManageMembers
            | Self::AgreementRequests
            | Self::ManageCoupons => Access::Role(Role::Admin),
        }
    }

    pub fn is_dashboard(&self) -> bool {
        self.to_path().starts_with("/dashboard")
    }

    /// Sidebar label, `None` for routes that never appear there.
    pub fn nav_label(&self) -> Option<&'static str> {
        match self {
            Self::DashboardHome => Some("Overview"),
            Self::Profile => Some("My Profile"),
            Self::Announcements => Some("Announcements"),
            Self::MakePayment => Some("Make Payment"),
            Self::PayHistory => Some("Payment History"),
            Self::MakeAnnouncement => Some("Make Announcement"),
            Self::ManageMembers => Some("Manage Members"),
            Self::AgreementRequests => Some("Agreement Requests"),
            Self::ManageCoupons => Some("Manage Coupons"),
            _ => None,
        }
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

// =========================================================
// 导航请求 (Navigation)
// =========================================================

/// A navigation with optional `state.from`, the path to return to afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub to: String,
    pub from: Option<String>,
    pub replace: bool,
}

impl Navigation {
    pub fn push(route: AppRoute) -> Self {
        Self {
            to: route.to_path().to_string(),
            from: None,
            replace: false,
        }
    }

    pub fn replace(route: AppRoute) -> Self {
        Self {
            replace: true,
            ..Self::push(route)
        }
    }

    /// Redirect to sign-in, remembering where the user was headed.
    pub fn sign_in_from(path: &str) -> Self {
        Self {
            to: AppRoute::SignIn.to_path().to_string(),
            from: Some(path.to_string()),
            replace: true,
        }
    }

    /// Where to go after a successful sign-in.
    pub fn after_sign_in(from: Option<&str>) -> Self {
        let target = from
            .filter(|p| {
                !matches!(
                    AppRoute::from_path(p),
                    AppRoute::SignIn | AppRoute::Register | AppRoute::NotFound
                )
            })
            .unwrap_or(AppRoute::Home.to_path());
        Self {
            to: target.to_string(),
            from: None,
            replace: true,
        }
    }
}
