use anyhow::{anyhow, Result};
use clap::Subcommand;
use serde_json::Value;

use certiam_core::models::{
    EditAccount, GenerateUser, InviteUser, OperateUser, Page, ResetPassword, User, UserAction, UserActive,
};
use certiam_core::utils::{format_date, format_optional};

use super::{split_list, PageArgs};
use crate::console::Console;
use crate::output::{json_of, page_footer, print_output, print_success, render_table, Outputable};

#[derive(Subcommand)]
pub enum UsersCommand {
    /// List users.
    List(PageArgs),

    /// Create a sub-account.
    Generate {
        username: String,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// Initial password; the backend generates one when omitted.
        #[arg(long)]
        password: Option<String>,
    },

    /// Edit an account's profile.
    Edit {
        /// User id.
        id: String,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },

    /// Set a user's roles and user groups.
    Assign {
        /// User id.
        id: String,
        /// Role ids (repeatable or comma-separated).
        #[arg(long = "role")]
        roles: Vec<String>,
        /// User group ids (repeatable or comma-separated).
        #[arg(long = "group")]
        groups: Vec<String>,
    },

    /// Invite users by email.
    Invite {
        #[arg(required = true)]
        emails: Vec<String>,
        /// Role ids granted on acceptance.
        #[arg(long = "role")]
        roles: Vec<String>,
    },

    /// Enable, disable, delete or activate users.
    Active {
        /// enable, disable, delete or activate.
        #[arg(value_parser = parse_action)]
        action: UserAction,
        /// User ids.
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Reset a sub-account's password.
    ResetPassword {
        /// User id.
        id: String,
        #[arg(long, env = "CERTIAM_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

fn parse_action(s: &str) -> Result<UserAction, String> {
    UserAction::parse(s).ok_or_else(|| format!("unknown action '{}' (expected enable, disable, delete or activate)", s))
}

impl UsersCommand {
    pub async fn run(self, console: &Console) -> Result<()> {
        let client = &console.client;
        match self {
            UsersCommand::List(args) => {
                let page = client.list_users(&args.to_query()).await?;
                print_output(&UserPage { page, args }, console.json);
            }
            UsersCommand::Generate {
                username,
                display_name,
                email,
                phone,
                password,
            } => {
                let created = client
                    .generate_user(&GenerateUser {
                        username,
                        display_name,
                        email,
                        phone,
                        password,
                    })
                    .await?;
                print_output(&Generated(created), console.json);
            }
            UsersCommand::Edit {
                id,
                display_name,
                email,
                phone,
            } => {
                if display_name.is_none() && email.is_none() && phone.is_none() {
                    return Err(anyhow!("Nothing to update: pass --display-name, --email or --phone"));
                }
                client
                    .edit_account(&EditAccount {
                        id: id.clone(),
                        display_name,
                        email,
                        phone,
                    })
                    .await?;
                print_success(&format!("Account {} updated", id), console.json);
            }
            UsersCommand::Assign { id, roles, groups } => {
                client
                    .operate_user(&OperateUser {
                        user_id: id.clone(),
                        role_ids: split_list(&roles),
                        group_ids: split_list(&groups),
                    })
                    .await?;
                print_success(&format!("User {} updated", id), console.json);
            }
            UsersCommand::Invite { emails, roles } => {
                let invite = InviteUser {
                    emails: split_list(&emails),
                    role_ids: split_list(&roles),
                };
                client.invite_users(&invite).await?;
                print_success(&format!("Invited {} user(s)", invite.emails.len()), console.json);
            }
            UsersCommand::Active { action, ids } => {
                let request = UserActive {
                    user_ids: split_list(&ids),
                    action,
                };
                client.set_users_active(&request).await?;
                print_success(
                    &format!("Applied {:?} to {} user(s)", request.action, request.user_ids.len()),
                    console.json,
                );
            }
            UsersCommand::ResetPassword { id, password } => {
                client
                    .reset_password(&ResetPassword {
                        user_id: id.clone(),
                        password,
                    })
                    .await?;
                print_success(&format!("Password reset for user {}", id), console.json);
            }
        }
        Ok(())
    }
}

struct UserPage {
    page: Page<User>,
    args: PageArgs,
}

impl Outputable for UserPage {
    fn to_json(&self) -> Value {
        json_of(&self.page)
    }

    fn to_human(&self) -> String {
        if self.page.is_empty() {
            return "No users found".to_string();
        }
        let rows: Vec<Vec<String>> = self
            .page
            .list
            .iter()
            .map(|u| {
                vec![
                    u.id.clone(),
                    u.username.clone(),
                    u.display_name().to_string(),
                    format_optional(u.email.as_deref(), "-"),
                    format_optional(Some(u.status.as_str()), "-"),
                    u.roles.join(","),
                    u.created_at.as_deref().map(format_date).unwrap_or_default(),
                ]
            })
            .collect();
        format!(
            "{}\n\n{}",
            render_table(&["ID", "USERNAME", "NAME", "EMAIL", "STATUS", "ROLES", "CREATED"], &rows),
            page_footer(
                self.page.list.len(),
                self.page.total,
                self.args.page,
                self.page.page_count(self.args.page_size)
            )
        )
    }
}

/// Whatever the backend returns for a new sub-account (often a generated password).
struct Generated(Value);

impl Outputable for Generated {
    fn to_json(&self) -> Value {
        self.0.clone()
    }

    fn to_human(&self) -> String {
        match &self.0 {
            Value::Object(map) if !map.is_empty() => {
                let rows: Vec<Vec<String>> = map
                    .iter()
                    .map(|(k, v)| {
                        let text = match v {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        vec![k.clone(), text]
                    })
                    .collect();
                format!("User created\n\n{}", render_table(&["FIELD", "VALUE"], &rows))
            }
            Value::String(s) => format!("User created: {}", s),
            _ => "User created".to_string(),
        }
    }
}
