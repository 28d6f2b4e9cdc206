use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::api::{Notifier, RequestContext, ResetHook};
use crate::routes::RoleRouters;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Session handle shared between the request context, the host bridge and the console.
pub type SharedSession = Arc<RwLock<Session>>;

/// The signed-in user as delivered by login or the host application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Fields this client does not model are kept so they round-trip.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Remembered login form values. Passwords are never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginInfo {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    pub token: String,
    pub user_info: Option<UserInfo>,
    pub role_routers: Option<RoleRouters>,
    pub remember_me: bool,
    pub login_info: Option<LoginInfo>,
    pub updated_at: DateTime<Utc>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            token: String::new(),
            user_info: None,
            role_routers: None,
            remember_me: true,
            login_info: None,
            updated_at: Utc::now(),
        }
    }
}

pub struct Session {
    cache_dir: PathBuf,
    pub data: SessionState,
}

impl Session {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            data: SessionState::default(),
        }
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(RwLock::new(self))
    }

    /// Load session from disk. Returns whether a stored session was found.
    pub fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(false);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        self.data = serde_json::from_str(&contents).context("Failed to parse session file")?;
        debug!(has_token = self.has_token(), "Session loaded");
        Ok(true)
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Drop session data and the file on disk
    pub fn clear(&mut self) -> Result<()> {
        self.data = SessionState::default();
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.data.token = token.into();
        self.touch();
    }

    pub fn set_user_info(&mut self, user_info: Option<UserInfo>) {
        self.data.user_info = user_info;
        self.touch();
    }

    pub fn set_role_routers(&mut self, role_routers: RoleRouters) {
        self.data.role_routers = Some(role_routers);
        self.touch();
    }

    pub fn set_remember_me(&mut self, remember_me: bool) {
        self.data.remember_me = remember_me;
        self.touch();
    }

    pub fn set_login_info(&mut self, login_info: Option<LoginInfo>) {
        self.data.login_info = login_info;
        self.touch();
    }

    /// Get the bearer token if one is set
    pub fn token(&self) -> Option<&str> {
        Some(self.data.token.as_str()).filter(|t| !t.is_empty())
    }

    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    pub fn user_info(&self) -> Option<&UserInfo> {
        self.data.user_info.as_ref()
    }

    pub fn role_routers(&self) -> Option<&RoleRouters> {
        self.data.role_routers.as_ref()
    }

    pub fn remember_me(&self) -> bool {
        self.data.remember_me
    }

    pub fn login_info(&self) -> Option<&LoginInfo> {
        self.data.login_info.as_ref()
    }

    /// Forget the token, the user and the permitted routes.
    pub fn reset(&mut self) {
        self.data.token.clear();
        self.data.user_info = None;
        self.data.role_routers = Some(RoleRouters::default());
        self.touch();
        info!("Session reset");
    }

    /// Reset and persist the cleared state.
    pub fn logout(&mut self) -> Result<()> {
        self.reset();
        self.save()
    }

    /// Build the explicit context requests are sent with.
    pub fn request_context(&self, notifier: Arc<dyn Notifier>, reset_hook: Option<ResetHook>) -> RequestContext {
        let mut ctx = RequestContext::new(notifier);
        ctx.token = self.token().map(str::to_string);
        ctx.reset_hook = reset_hook;
        ctx
    }

    fn touch(&mut self) {
        self.data.updated_at = Utc::now();
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}
