//! Route tables and the route set built from them.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::record::{join_path, Component, RoleRouters, RouteRecord};

/// Route names that survive a reset.
pub const NO_RESET_WHITE_LIST: [&str; 4] = ["Redirect", "Login", "NoFind", "Root"];

/// Landing page of the application.
pub const HOME_PATH: &str = "/certificateManagement/index";

/// Guards against redirect cycles in badly formed server tables.
const MAX_REDIRECTS: usize = 8;

/// Routes every user has, registered before any permission is known.
pub fn constant_routes() -> Vec<RouteRecord> {
    vec![
        RouteRecord::new("/", "Root")
            .component(Component::Layout)
            .redirect(HOME_PATH)
            .hidden(),
        RouteRecord::new("/redirect", "RedirectWrap")
            .component(Component::Layout)
            .hidden()
            .no_tags_view()
            .child(
                RouteRecord::new("/redirect/:path(.*)", "Redirect")
                    .component(Component::view("views/Redirect/Redirect")),
            ),
    ]
}

/// The full table of permission-gated routes.
pub fn async_routes() -> Vec<RouteRecord> {
    vec![
        RouteRecord::new("/certificateManagement", "CertificateManagement")
            .component(Component::Layout)
            .child(
                RouteRecord::new("index", "certificateManagementList")
                    .component(Component::view("views/certificateManagement/index"))
                    .title("Certificate management")
                    .icon("vi-clarity:document-solid"),
            ),
        RouteRecord::new("/authorization", "Authorization")
            .component(Component::Layout)
            .redirect("/authorization/user")
            .title("Authorization")
            .icon("vi-eos-icons:role-binding")
            .always_show()
            .child(
                RouteRecord::new("user", "User")
                    .component(Component::view("views/Authorization/User/User"))
                    .title("Users"),
            )
            .child(
                RouteRecord::new("role", "Role")
                    .component(Component::view("views/Authorization/Role/Role"))
                    .title("Roles"),
            )
            .child(
                RouteRecord::new("permissionGroup", "PermissionGroup")
                    .component(Component::view("views/Authorization/PermissionGroup/PermissionGroup"))
                    .title("Permission groups"),
            )
            .child(
                RouteRecord::new("userGroup", "UserGroup")
                    .component(Component::view("views/Authorization/UserGroup/UserGroup"))
                    .title("User groups"),
            ),
    ]
}

/// Where the dynamic routes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMode {
    /// Every route in the built-in table.
    Static,
    /// Built-in routes filtered to the permitted names or full paths.
    FrontEnd(Vec<String>),
    /// Route records supplied by the backend.
    Server(Vec<RouteRecord>),
}

impl RouteMode {
    /// Pick the mode implied by a stored permission snapshot.
    pub fn from_role_routers(role_routers: Option<&RoleRouters>) -> Self {
        match role_routers {
            Some(RoleRouters::Names(names)) => RouteMode::FrontEnd(names.clone()),
            Some(RoleRouters::Records(records)) => RouteMode::Server(records.clone()),
            None => RouteMode::Static,
        }
    }
}

/// Generate the dynamic routes for a permission snapshot.
pub fn generate_routes(mode: &RouteMode) -> Vec<RouteRecord> {
    match mode {
        RouteMode::Static => async_routes(),
        RouteMode::FrontEnd(permitted) => filter_permitted(&async_routes(), permitted, "/"),
        RouteMode::Server(records) => records.clone(),
    }
}

fn filter_permitted(routes: &[RouteRecord], permitted: &[String], base: &str) -> Vec<RouteRecord> {
    let mut kept = Vec::new();
    for route in routes {
        let full_path = join_path(base, &route.path);
        let allowed = permitted
            .iter()
            .any(|p| *p == route.name || *p == full_path);
        let children = filter_permitted(&route.children, permitted, &full_path);
        if allowed || !children.is_empty() {
            let mut route = route.clone();
            route.children = children;
            kept.push(route);
        }
    }
    kept
}

/// A path matched against the route set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub name: String,
    pub full_path: String,
    pub params: BTreeMap<String, String>,
    /// Names from the outermost matched record to the leaf.
    pub matched: Vec<String>,
}

/// The routes currently registered: the constant ones plus the generated ones.
#[derive(Debug, Clone)]
pub struct RouteSet {
    constant: Vec<RouteRecord>,
    added: Vec<RouteRecord>,
    is_add_routers: bool,
}

impl Default for RouteSet {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteSet {
    pub fn new() -> Self {
        Self {
            constant: constant_routes(),
            added: Vec::new(),
            is_add_routers: false,
        }
    }

    /// A route set already built for a snapshot.
    pub fn from_snapshot(mode: &RouteMode) -> Self {
        let mut set = Self::new();
        set.rebuild(mode);
        set
    }

    /// Replace the dynamic routes with those generated for `mode`.
    pub fn rebuild(&mut self, mode: &RouteMode) {
        self.constant = constant_routes();
        self.added = generate_routes(mode);
        self.is_add_routers = true;
        info!(routes = self.added.len(), "Route set rebuilt");
    }

    /// Remove every route whose name is not whitelisted.
    pub fn reset(&mut self) {
        self.constant = retain_whitelisted(&self.constant);
        self.added = retain_whitelisted(&self.added);
        self.is_add_routers = false;
        debug!(remaining = self.constant.len() + self.added.len(), "Route set reset");
    }

    pub fn is_add_routers(&self) -> bool {
        self.is_add_routers
    }

    pub fn added_routes(&self) -> &[RouteRecord] {
        &self.added
    }

    pub fn routes(&self) -> impl Iterator<Item = &RouteRecord> {
        self.constant.iter().chain(self.added.iter())
    }

    pub fn has_route(&self, name: &str) -> bool {
        fn walk(routes: &[RouteRecord], name: &str) -> bool {
            routes.iter().any(|r| r.name == name || walk(&r.children, name))
        }
        walk(&self.constant, name) || walk(&self.added, name)
    }

    /// Match a concrete path, following redirects.
    pub fn resolve(&self, path: &str) -> Option<ResolvedRoute> {
        let mut current = path.split(['?', '#']).next().unwrap_or(path).to_string();
        for _ in 0..MAX_REDIRECTS {
            let (chain, params) = self.match_path(&current)?;
            let Some(leaf) = chain.last() else {
                return None;
            };
            match leaf.0.redirect {
                Some(ref target) => current = target.clone(),
                None => {
                    return Some(ResolvedRoute {
                        name: leaf.0.name.clone(),
                        full_path: current,
                        params,
                        matched: chain.iter().map(|(r, _)| r.name.clone()).collect(),
                    })
                }
            }
        }
        warn!(path, "Too many redirects while resolving route");
        None
    }

    fn match_path(&self, path: &str) -> Option<(Vec<(&RouteRecord, String)>, BTreeMap<String, String>)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        for route in self.routes() {
            if let Some(found) = match_record(route, "/", &segments, Vec::new()) {
                return Some(found);
            }
        }
        None
    }
}

type Match<'a> = (Vec<(&'a RouteRecord, String)>, BTreeMap<String, String>);

fn match_record<'a>(
    route: &'a RouteRecord,
    base: &str,
    segments: &[&str],
    mut chain: Vec<(&'a RouteRecord, String)>,
) -> Option<Match<'a>> {
    let full_path = join_path(base, &route.path);
    chain.push((route, full_path.clone()));

    // Deeper matches win over the parent record itself.
    for child in &route.children {
        if let Some(found) = match_record(child, &full_path, segments, chain.clone()) {
            return Some(found);
        }
    }

    match_pattern(&full_path, segments).map(|params| (chain, params))
}

/// Match path segments against a pattern with `:param` and `:param(.*)` segments.
fn match_pattern(pattern: &str, segments: &[&str]) -> Option<BTreeMap<String, String>> {
    let parts: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let mut params = BTreeMap::new();
    let mut i = 0;
    for (idx, part) in parts.iter().enumerate() {
        if let Some(param) = part.strip_prefix(':') {
            if let Some(name) = param.strip_suffix("(.*)") {
                // Catch-all must be the last pattern segment.
                if idx != parts.len() - 1 {
                    return None;
                }
                params.insert(name.to_string(), segments[i.min(segments.len())..].join("/"));
                return Some(params);
            }
            let value = segments.get(i)?;
            params.insert(param.to_string(), value.to_string());
        } else if segments.get(i) != Some(part) {
            return None;
        }
        i += 1;
    }
    if i == segments.len() {
        Some(params)
    } else {
        None
    }
}

fn retain_whitelisted(routes: &[RouteRecord]) -> Vec<RouteRecord> {
    routes
        .iter()
        .filter(|r| NO_RESET_WHITE_LIST.contains(&r.name.as_str()))
        .map(|r| {
            let mut r = r.clone();
            r.children = retain_whitelisted(&r.children);
            r
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(routes: &[RouteRecord]) -> Vec<&str> {
        routes.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_static_mode_adds_whole_table() {
        let set = RouteSet::from_snapshot(&RouteMode::Static);
        assert!(set.is_add_routers());
        assert_eq!(names(set.added_routes()), vec!["CertificateManagement", "Authorization"]);
        assert!(set.has_route("PermissionGroup"));
    }

    #[test]
    fn test_front_end_mode_filters_by_name_and_path() {
        let mode = RouteMode::FrontEnd(vec!["Role".into(), "/certificateManagement/index".into()]);
        let routes = generate_routes(&mode);
        assert_eq!(names(&routes), vec!["CertificateManagement", "Authorization"]);
        assert_eq!(names(&routes[1].children), vec!["Role"]);

        let routes = generate_routes(&RouteMode::FrontEnd(vec!["UserGroup".into()]));
        assert_eq!(names(&routes), vec!["Authorization"]);
        assert_eq!(names(&routes[0].children), vec!["UserGroup"]);

        assert!(generate_routes(&RouteMode::FrontEnd(Vec::new())).is_empty());
    }

    #[test]
    fn test_rebuild_replaces_previous_snapshot() {
        let mut set = RouteSet::from_snapshot(&RouteMode::Static);
        set.rebuild(&RouteMode::FrontEnd(vec!["User".into()]));
        assert!(set.has_route("User"));
        assert!(!set.has_route("Role"));
        assert!(!set.has_route("certificateManagementList"));
    }

    #[test]
    fn test_server_mode_uses_records() {
        let records = vec![RouteRecord::new("/audit", "Audit").component(Component::Layout)];
        let set = RouteSet::from_snapshot(&RouteMode::Server(records));
        assert_eq!(names(set.added_routes()), vec!["Audit"]);
    }

    #[test]
    fn test_reset_keeps_whitelist_only() {
        let mut set = RouteSet::from_snapshot(&RouteMode::Static);
        set.reset();
        assert!(!set.is_add_routers());
        assert!(set.has_route("Root"));
        assert!(!set.has_route("RedirectWrap"));
        assert!(!set.has_route("Redirect"));
        assert!(set.added_routes().is_empty());
    }

    #[test]
    fn test_resolve_follows_root_redirect() {
        let set = RouteSet::from_snapshot(&RouteMode::Static);
        let resolved = set.resolve("/").expect("root should resolve");
        assert_eq!(resolved.name, "certificateManagementList");
        assert_eq!(resolved.full_path, HOME_PATH);
        assert_eq!(resolved.matched, vec!["CertificateManagement", "certificateManagementList"]);
    }

    #[test]
    fn test_resolve_params_and_catch_all() {
        let set = RouteSet::from_snapshot(&RouteMode::Static);
        let resolved = set.resolve("/redirect/authorization/role").expect("redirect route");
        assert_eq!(resolved.name, "Redirect");
        assert_eq!(resolved.params.get("path").map(String::as_str), Some("authorization/role"));

        let resolved = set.resolve("/authorization").expect("authorization redirects");
        assert_eq!(resolved.name, "User");
        assert!(set.resolve("/nope").is_none());
    }

    #[test]
    fn test_resolve_ignores_query() {
        let set = RouteSet::from_snapshot(&RouteMode::Static);
        let resolved = set.resolve("/authorization/role?page=2").expect("role route");
        assert_eq!(resolved.name, "Role");
    }

    #[test]
    fn test_match_pattern() {
        assert!(match_pattern("/a/:id", &["a", "7"]).is_some());
        assert!(match_pattern("/a/:id", &["a"]).is_none());
        assert!(match_pattern("/a", &["a", "b"]).is_none());
        let params = match_pattern("/r/:path(.*)", &["r"]).unwrap();
        assert_eq!(params.get("path").map(String::as_str), Some(""));
    }
}
