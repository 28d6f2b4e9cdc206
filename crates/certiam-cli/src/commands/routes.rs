use anyhow::Result;
use clap::Args;
use serde_json::{json, Value};

use certiam_core::routes::{
    before_each, build_menu, page_title, GuardOptions, MenuItem, NavigationDecision, ResolvedRoute, RoleRouters,
    RouteRecord, RouteSet, RouteSource, HOME_PATH,
};

use super::split_list;
use crate::console::Console;
use crate::output::{json_of, print_output, Outputable};

#[derive(Args, Debug)]
pub struct RoutesArgs {
    /// Permitted route names or paths; defaults to the stored session's.
    #[arg(long = "allow")]
    pub allow: Vec<String>,

    /// Path to navigate to.
    #[arg(long, default_value = HOME_PATH)]
    pub path: String,
}

impl RoutesArgs {
    pub fn run(self, console: &Console) -> Result<()> {
        let mut routes = RouteSet::new();
        let decision = {
            let mut session = console.session_mut();
            let allow = split_list(&self.allow);
            if !allow.is_empty() {
                // In memory only; nothing here persists the session.
                session.set_role_routers(RoleRouters::Names(allow));
            }
            let source = if session.role_routers().is_some() {
                RouteSource::Session
            } else {
                RouteSource::Static
            };
            before_each(
                &mut routes,
                &mut session,
                &self.path,
                None,
                None,
                GuardOptions {
                    require_auth: false,
                    source,
                },
            )
        };

        let view = RoutesView {
            decision,
            resolved: routes.resolve(&self.path),
            title: page_title(&routes, &self.path),
            tree: routes.routes().cloned().collect(),
            menu: build_menu(&routes),
        };
        print_output(&view, console.json);
        Ok(())
    }
}

struct RoutesView {
    decision: NavigationDecision,
    resolved: Option<ResolvedRoute>,
    title: Option<String>,
    tree: Vec<RouteRecord>,
    menu: Vec<MenuItem>,
}

fn render_tree(routes: &[RouteRecord], depth: usize, out: &mut Vec<String>) {
    for route in routes {
        let mut flags = Vec::new();
        if route.meta.hidden {
            flags.push("hidden".to_string());
        }
        if let Some(redirect) = &route.redirect {
            flags.push(format!("-> {}", redirect));
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };
        out.push(format!("{}{} ({}){}", "  ".repeat(depth), route.path, route.name, flags));
        render_tree(&route.children, depth + 1, out);
    }
}

fn render_menu(items: &[MenuItem], depth: usize, out: &mut Vec<String>) {
    for item in items {
        out.push(format!("{}- {}  {}", "  ".repeat(depth), item.title, item.path));
        render_menu(&item.children, depth + 1, out);
    }
}

impl Outputable for RoutesView {
    fn to_json(&self) -> Value {
        let decision = match &self.decision {
            NavigationDecision::Proceed => json!({"action": "proceed"}),
            NavigationDecision::Redirect { path, replace } => {
                json!({"action": "redirect", "path": path, "replace": replace})
            }
        };
        json!({
            "decision": decision,
            "resolved": self.resolved.as_ref().map(|r| json!({
                "name": r.name,
                "full_path": r.full_path,
                "params": r.params,
                "matched": r.matched,
            })),
            "title": self.title,
            "routes": json_of(&self.tree),
            "menu": json_of(&self.menu),
        })
    }

    fn to_human(&self) -> String {
        let mut out = vec!["Routes".to_string(), "======".to_string()];
        render_tree(&self.tree, 0, &mut out);

        out.push(String::new());
        out.push("Menu".to_string());
        out.push("====".to_string());
        if self.menu.is_empty() {
            out.push("(empty)".to_string());
        }
        render_menu(&self.menu, 0, &mut out);

        out.push(String::new());
        match &self.resolved {
            Some(r) => out.push(format!(
                "Resolved: {} ({}){}",
                r.full_path,
                r.name,
                self.title.as_deref().map(|t| format!(" \"{}\"", t)).unwrap_or_default()
            )),
            None => out.push("Resolved: no matching route".to_string()),
        }
        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certiam_core::routes::RouteMode;

    #[test]
    fn test_render_menu_and_tree() {
        let routes = RouteSet::from_snapshot(&RouteMode::FrontEnd(vec!["Role".into()]));
        let mut lines = Vec::new();
        render_menu(&build_menu(&routes), 0, &mut lines);
        assert_eq!(lines, vec!["- Authorization  /authorization", "  - Roles  /authorization/role"]);

        let mut tree = Vec::new();
        render_tree(routes.added_routes(), 0, &mut tree);
        assert_eq!(tree[0], "/authorization (Authorization) [-> /authorization/user]");
        assert_eq!(tree[1], "  role (Role)");
    }
}
