//! Page map and navigation.
//!
//! SYSTEM CONTEXT
//! ==============
//! Mirrors the web client's router: one dashboard tree per role plus the
//! public login and unauthorized pages. [`navigate`] combines path lookup with
//! the gate so every caller gets the same render/redirect answer.

pub mod gate;

use crate::models::Role;
use crate::state::auth::AuthState;
use gate::GateDecision;

pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

/// Pages the application can render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Login,
    Unauthorized,
    AdminDashboard,
    AdminInventory,
    ManageUsers,
    Reports,
    Settings,
    ManagerDashboard,
    ManagerInventory,
    ManageSuppliers,
    StaffDashboard,
    StaffInventory,
    PlaceOrder,
    SupplierDashboard,
    SupplierOrders,
    SupplierDeliveries,
}

impl Page {
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Unauthorized => "Unauthorized",
            Self::AdminDashboard => "Admin Dashboard",
            Self::AdminInventory => "Inventory",
            Self::ManageUsers => "Manage Users",
            Self::Reports => "Reports",
            Self::Settings => "Settings",
            Self::ManagerDashboard => "Manager Dashboard",
            Self::ManagerInventory => "Inventory Management",
            Self::ManageSuppliers => "Manage Suppliers",
            Self::StaffDashboard => "Staff Dashboard",
            Self::StaffInventory => "Inventory Items",
            Self::PlaceOrder => "Place Order",
            Self::SupplierDashboard => "Supplier Dashboard",
            Self::SupplierOrders => "Supplier Orders",
            Self::SupplierDeliveries => "Deliveries",
        }
    }
}

/// A routed page. `pattern` ending in `/*` matches the prefix and everything below it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Route {
    pub pattern: &'static str,
    pub page: Page,
    /// `None` for public pages; otherwise the roles the gate admits.
    pub roles: Option<&'static [Role]>,
}

const ADMIN: &[Role] = &[Role::Admin];
const MANAGER: &[Role] = &[Role::Manager];
const STAFF: &[Role] = &[Role::Staff];
const SUPPLIER: &[Role] = &[Role::Supplier];

pub const ROUTES: &[Route] = &[
    Route { pattern: LOGIN_PATH, page: Page::Login, roles: None },
    Route { pattern: UNAUTHORIZED_PATH, page: Page::Unauthorized, roles: None },
    Route { pattern: "/admin/*", page: Page::AdminDashboard, roles: Some(ADMIN) },
    Route { pattern: "/admin/inventory", page: Page::AdminInventory, roles: Some(ADMIN) },
    Route { pattern: "/admin/ManagerUser", page: Page::ManageUsers, roles: Some(ADMIN) },
    Route { pattern: "/admin/reports", page: Page::Reports, roles: Some(ADMIN) },
    Route { pattern: "/admin/settings", page: Page::Settings, roles: Some(ADMIN) },
    Route { pattern: "/manager/*", page: Page::ManagerDashboard, roles: Some(MANAGER) },
    Route { pattern: "/manager/inventory", page: Page::ManagerInventory, roles: Some(MANAGER) },
    Route { pattern: "/manager/suppliers", page: Page::ManageSuppliers, roles: Some(MANAGER) },
    Route { pattern: "/staff/*", page: Page::StaffDashboard, roles: Some(STAFF) },
    Route { pattern: "/staff/inventory", page: Page::StaffInventory, roles: Some(STAFF) },
    Route { pattern: "/staff/orders", page: Page::PlaceOrder, roles: Some(STAFF) },
    Route { pattern: "/supplier/*", page: Page::SupplierDashboard, roles: Some(SUPPLIER) },
    Route { pattern: "/supplier/orders", page: Page::SupplierOrders, roles: Some(SUPPLIER) },
    Route { pattern: "/supplier/deliveries", page: Page::SupplierDeliveries, roles: Some(SUPPLIER) },
];

/// Result of navigating to a path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
    Render(Page),
    Redirect(&'static str),
    Loading,
    NotFound,
}

/// Side effect of a navigation request. The web client changes the location;
/// the CLI reports it.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

/// Find the route for `path`. Exact patterns win over `/*` prefixes.
#[must_use]
pub fn resolve(path: &str) -> Option<&'static Route> {
    let path = normalize(path);
    if let Some(route) = ROUTES.iter().find(|r| r.pattern == path) {
        return Some(route);
    }
    ROUTES.iter().find(|r| {
        r.pattern.strip_suffix("/*").is_some_and(|prefix| {
            path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
        })
    })
}

/// Resolve `path` and run the gate against `state`.
#[must_use]
pub fn navigate(path: &str, state: &AuthState) -> Navigation {
    if normalize(path) == "/" {
        return Navigation::Redirect(LOGIN_PATH);
    }
    let Some(route) = resolve(path) else {
        return Navigation::NotFound;
    };
    let Some(roles) = route.roles else {
        return Navigation::Render(route.page);
    };
    match gate::guard_state(state, roles) {
        GateDecision::Loading => Navigation::Loading,
        GateDecision::RedirectToLogin => Navigation::Redirect(LOGIN_PATH),
        GateDecision::RedirectToUnauthorized => Navigation::Redirect(UNAUTHORIZED_PATH),
        GateDecision::Render => Navigation::Render(route.page),
    }
}

/// Dashboard to open after login.
///
/// An admin who picked another role on the login screen lands on that role's
/// dashboard; everyone else lands on their own.
#[must_use]
pub fn landing_path(actual: Role, hint: Option<Role>) -> &'static str {
    let effective = match hint {
        Some(hint) if actual == Role::Admin => hint,
        _ => actual,
    };
    effective.dashboard_path()
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
