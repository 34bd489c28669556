//! Route guard
//!
//! One parametrized guard for every protected subtree. It never fails: the
//! outcome is always "wait", "render" or a navigation.

use crate::role::RoleState;
use crate::route::{Access, AppRoute, Navigation};
use crate::session::SessionState;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Show a placeholder; do not branch on identity yet.
    Loading,
    Render,
    Redirect(Navigation),
}

pub fn evaluate(
    access: Access,
    session: &SessionState,
    role: RoleState,
    attempted_path: &str,
) -> GuardDecision {
    if access == Access::Public {
        return GuardDecision::Render;
    }
    if session.is_resolving {
        return GuardDecision::Loading;
    }
    if session.identity.is_none() {
        debug!(path = attempted_path, "guard: not signed in");
        return GuardDecision::Redirect(Navigation::sign_in_from(attempted_path));
    }

    match access {
        Access::Role(_) if role.is_resolving => GuardDecision::Loading,
        Access::Role(required) if !access.permits(role.role) => {
            debug!(path = attempted_path, required = %required, actual = ?role.role, "guard: role mismatch");
            GuardDecision::Redirect(Navigation::replace(AppRoute::DashboardForbidden))
        }
        _ => GuardDecision::Render,
    }
}

/// Guard for a concrete path.
pub fn evaluate_path(path: &str, session: &SessionState, role: RoleState) -> GuardDecision {
    evaluate(AppRoute::from_path(path).access(), session, role, path)
}
