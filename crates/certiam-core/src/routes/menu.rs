use serde::Serialize;

use super::record::{join_path, RouteRecord};
use super::table::RouteSet;

/// One sidebar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub title: String,
    pub path: String,
    pub name: String,
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuItem>,
}

/// Build the sidebar from every registered route.
pub fn build_menu(routes: &RouteSet) -> Vec<MenuItem> {
    routes.routes().filter_map(|r| menu_item(r, "/")).collect()
}

fn menu_item(route: &RouteRecord, base: &str) -> Option<MenuItem> {
    if route.meta.hidden {
        return None;
    }
    let full_path = join_path(base, &route.path);
    let visible: Vec<&RouteRecord> = route.children.iter().filter(|c| !c.meta.hidden).collect();

    // A lone child replaces its parent unless the parent insists on showing.
    if let [only] = visible.as_slice() {
        if !route.meta.always_show && only.children.iter().all(|c| c.meta.hidden) {
            let child_path = join_path(&full_path, &only.path);
            return Some(MenuItem {
                title: only
                    .meta
                    .title
                    .clone()
                    .or_else(|| route.meta.title.clone())
                    .unwrap_or_else(|| only.name.clone()),
                path: child_path,
                name: only.name.clone(),
                icon: only.meta.icon.clone().or_else(|| route.meta.icon.clone()),
                children: Vec::new(),
            });
        }
    }

    Some(MenuItem {
        title: route.meta.title.clone().unwrap_or_else(|| route.name.clone()),
        path: full_path.clone(),
        name: route.name.clone(),
        icon: route.meta.icon.clone(),
        children: visible
            .into_iter()
            .filter_map(|c| menu_item(c, &full_path))
            .collect(),
    })
}
