//! Routing: the static and permission-driven route tables, the navigation
//! guard that builds them on first navigation, and the sidebar menu derived
//! from the resulting route set.
//!
//! The route set is always rebuilt wholesale from a permission snapshot
//! (`RouteMode`) instead of being mutated route by route.

pub mod guard;
pub mod menu;
pub mod record;
pub mod table;

pub use guard::{before_each, page_title, GuardOptions, NavigationDecision, RouteSource};
pub use menu::{build_menu, MenuItem};
pub use record::{Component, RoleRouters, RouteMeta, RouteRecord};
pub use table::{
    async_routes, constant_routes, generate_routes, ResolvedRoute, RouteMode, RouteSet, HOME_PATH, NO_RESET_WHITE_LIST,
};
