//! Navigation guard run before every route change.

use tracing::debug;
use url::form_urlencoded;

use super::table::{RouteMode, RouteSet};
use crate::auth::Session;
use crate::host::HostProps;

/// What the router should do with a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    Proceed,
    Redirect { path: String, replace: bool },
}

/// Where the guard takes the permission snapshot from when it builds routes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RouteSource {
    /// The whole built-in table.
    #[default]
    Static,
    /// The snapshot stored in the session.
    Session,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GuardOptions {
    /// Only build routes once a user is known.
    pub require_auth: bool,
    pub source: RouteSource,
}

/// Decide a navigation to `to_path`.
///
/// When embedded in a host and no token is present yet, the host's token and
/// user are copied into the session first. The first navigation builds the
/// route set and re-targets to the decoded `redirect` query of the previous
/// location, or re-enters the same path with `replace` so the freshly added
/// routes can match it.
pub fn before_each(
    routes: &mut RouteSet,
    session: &mut Session,
    to_path: &str,
    from_redirect: Option<&str>,
    host: Option<&HostProps>,
    opts: GuardOptions,
) -> NavigationDecision {
    if let Some(props) = host {
        if !session.has_token() {
            if let Some(token) = props.token.as_deref().filter(|t| !t.is_empty()) {
                session.set_token(token);
            }
            if let Some(user_info) = &props.user_info {
                session.set_user_info(Some(user_info.clone()));
            }
        }
    }

    if opts.require_auth && session.user_info().is_none() {
        return NavigationDecision::Proceed;
    }
    if routes.is_add_routers() {
        return NavigationDecision::Proceed;
    }

    let mode = match opts.source {
        RouteSource::Static => RouteMode::Static,
        RouteSource::Session => RouteMode::from_role_routers(session.role_routers()),
    };
    routes.rebuild(&mode);

    let redirect = decode_component(from_redirect.filter(|r| !r.is_empty()).unwrap_or(to_path));
    debug!(to = to_path, redirect = %redirect, "Routes built on first navigation");
    if redirect == to_path {
        NavigationDecision::Redirect {
            path: to_path.to_string(),
            replace: true,
        }
    } else {
        NavigationDecision::Redirect {
            path: redirect,
            replace: false,
        }
    }
}

/// Page title for a resolved location, falling back to the route name.
pub fn page_title(routes: &RouteSet, path: &str) -> Option<String> {
    let resolved = routes.resolve(path)?;
    let title = routes
        .routes()
        .find_map(|r| find_title(r, &resolved.name))
        .unwrap_or(resolved.name);
    Some(title)
}

fn find_title(route: &super::RouteRecord, name: &str) -> Option<String> {
    if route.name == name {
        return route.meta.title.clone();
    }
    route.children.iter().find_map(|c| find_title(c, name))
}

/// Percent-decode a URI component. `+` stays literal.
fn decode_component(value: &str) -> String {
    let escaped = value
        .replace('+', "%2B")
        .replace('&', "%26")
        .replace('=', "%3D");
    form_urlencoded::parse(escaped.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
        .unwrap_or_default()
}
