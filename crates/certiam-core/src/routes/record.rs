use serde::{Deserialize, Serialize};

/// Key the backend uses for the top-level layout component.
const LAYOUT_KEY: &str = "#";
/// Key for a nested layout that only renders its children.
const PARENT_LAYOUT_KEY: &str = "##";

/// What a route renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Component {
    Layout,
    ParentLayout,
    /// A page, addressed by its view path (e.g. `views/Authorization/Role/Role`).
    View(String),
}

impl Component {
    pub fn view(path: impl Into<String>) -> Self {
        Component::View(path.into())
    }

    pub fn key(&self) -> &str {
        match self {
            Component::Layout => LAYOUT_KEY,
            Component::ParentLayout => PARENT_LAYOUT_KEY,
            Component::View(path) => path,
        }
    }
}

impl From<String> for Component {
    fn from(key: String) -> Self {
        match key.as_str() {
            LAYOUT_KEY | "Layout" => Component::Layout,
            PARENT_LAYOUT_KEY => Component::ParentLayout,
            _ => Component::View(key),
        }
    }
}

impl From<Component> for String {
    fn from(component: Component) -> Self {
        component.key().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteMeta {
    pub title: Option<String>,
    pub icon: Option<String>,
    /// Not shown in the menu.
    pub hidden: bool,
    pub no_tags_view: bool,
    /// Show the parent entry even with a single visible child.
    pub always_show: bool,
    pub permission: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRecord {
    pub path: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<Component>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(default)]
    pub meta: RouteMeta,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteRecord>,
}

impl RouteRecord {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            component: None,
            redirect: None,
            meta: RouteMeta::default(),
            children: Vec::new(),
        }
    }

    pub fn component(mut self, component: Component) -> Self {
        self.component = Some(component);
        self
    }

    pub fn redirect(mut self, redirect: impl Into<String>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.meta.title = Some(title.into());
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.meta.icon = Some(icon.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.meta.hidden = true;
        self
    }

    pub fn no_tags_view(mut self) -> Self {
        self.meta.no_tags_view = true;
        self
    }

    pub fn always_show(mut self) -> Self {
        self.meta.always_show = true;
        self
    }

    pub fn child(mut self, child: RouteRecord) -> Self {
        self.children.push(child);
        self
    }
}

/// Join a child path onto its parent. Absolute child paths stand alone.
pub fn join_path(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.is_empty() {
        if base.is_empty() {
            "/".to_string()
        } else {
            base.to_string()
        }
    } else {
        format!("{}/{}", base, path)
    }
}

/// The permission snapshot a user's routes are generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleRouters {
    /// Permitted route names or full paths, filtered against the built-in table.
    Names(Vec<String>),
    /// Route records delivered by the backend.
    Records(Vec<RouteRecord>),
}

impl Default for RoleRouters {
    fn default() -> Self {
        RoleRouters::Names(Vec::new())
    }
}

impl RoleRouters {
    pub fn is_empty(&self) -> bool {
        match self {
            RoleRouters::Names(names) => names.is_empty(),
            RoleRouters::Records(records) => records.is_empty(),
        }
    }
}
