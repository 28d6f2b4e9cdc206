use anyhow::{bail, Result};
use clap::Subcommand;
use serde_json::{json, Value};
use tracing::debug;

use certiam_core::auth::{CredentialStore, LoginInfo, UserInfo};
use certiam_core::routes::RoleRouters;
use certiam_core::utils::truncate_string;

use super::split_list;
use crate::console::Console;
use crate::output::{print_output, print_success, render_table, Outputable};

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Show the stored session.
    Show,

    /// Store the token given with --token (or CERTIAM_TOKEN) for later commands.
    Login {
        #[arg(long)]
        username: String,

        #[arg(long)]
        display_name: Option<String>,

        /// Keep the token in the OS keychain instead of the session file.
        #[arg(long)]
        remember: bool,

        /// Permitted route names or paths (repeatable or comma-separated).
        #[arg(long = "allow")]
        allow: Vec<String>,
    },

    /// Forget the token, the user and the permitted routes.
    Logout,
}

impl SessionCommand {
    pub fn run(self, console: &Console) -> Result<()> {
        match self {
            SessionCommand::Show => {
                let view = SessionView::capture(console);
                print_output(&view, console.json);
            }
            SessionCommand::Login {
                username,
                display_name,
                remember,
                allow,
            } => {
                let mut session = console.session_mut();
                let Some(token) = session.token().map(str::to_string) else {
                    bail!("No token given: pass --token or set CERTIAM_TOKEN");
                };
                session.set_user_info(Some(UserInfo {
                    username: username.clone(),
                    display_name,
                    ..UserInfo::default()
                }));
                session.set_login_info(Some(LoginInfo {
                    username: username.clone(),
                }));
                session.set_remember_me(remember);
                let allow = split_list(&allow);
                if !allow.is_empty() {
                    session.set_role_routers(RoleRouters::Names(allow));
                }

                if remember {
                    CredentialStore::store_token(&username, &token)?;
                    // The keychain holds the token; keep it out of the file.
                    session.set_token("");
                    session.save()?;
                    session.set_token(token);
                } else {
                    session.save()?;
                }

                let mut config = console.config.clone();
                config.last_username = Some(username.clone());
                config.save()?;
                print_success(&format!("Logged in as {}", username), console.json);
            }
            SessionCommand::Logout => {
                let mut session = console.session_mut();
                let username = session.login_info().map(|l| l.username.clone());
                session.logout()?;
                if let Some(username) = username {
                    if let Err(e) = CredentialStore::delete(&username) {
                        debug!(error = %e, "No keychain entry to delete");
                    }
                }
                print_success("Logged out", console.json);
            }
        }
        Ok(())
    }
}

struct SessionView {
    base_url: String,
    token: Option<String>,
    username: Option<String>,
    remember_me: bool,
    role_routers: Option<RoleRouters>,
    updated_at: String,
}

impl SessionView {
    fn capture(console: &Console) -> Self {
        let session = console.session();
        Self {
            base_url: console.config.base_url.clone(),
            token: session.token().map(mask_token),
            username: session.user_info().map(|u| u.username.clone()),
            remember_me: session.remember_me(),
            role_routers: session.role_routers().cloned(),
            updated_at: session.data.updated_at.to_rfc3339(),
        }
    }

    fn routes_summary(&self) -> String {
        match &self.role_routers {
            None => "all (static)".to_string(),
            Some(RoleRouters::Names(names)) if names.is_empty() => "none".to_string(),
            Some(RoleRouters::Names(names)) => names.join(","),
            Some(RoleRouters::Records(records)) => format!("{} server route(s)", records.len()),
        }
    }
}

/// Show only the edges of a token.
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

impl Outputable for SessionView {
    fn to_json(&self) -> Value {
        json!({
            "base_url": self.base_url,
            "token": self.token,
            "username": self.username,
            "remember_me": self.remember_me,
            "role_routers": self.role_routers,
            "updated_at": self.updated_at,
        })
    }

    fn to_human(&self) -> String {
        let rows = vec![
            vec!["Backend".to_string(), self.base_url.clone()],
            vec!["Token".to_string(), self.token.clone().unwrap_or_else(|| "-".to_string())],
            vec!["User".to_string(), self.username.clone().unwrap_or_else(|| "-".to_string())],
            vec!["Remember me".to_string(), self.remember_me.to_string()],
            vec!["Routes".to_string(), truncate_string(&self.routes_summary(), 60)],
            vec!["Updated".to_string(), self.updated_at.clone()],
        ];
        render_table(&["FIELD", "VALUE"], &rows)
    }
}
