use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::Value;

use certiam_core::models::{CreateRole, DeleteRoles, EditRole, Page, Role};
use certiam_core::utils::{format_date, truncate_string};

use super::{split_list, PageArgs};
use crate::console::Console;
use crate::output::{json_of, page_footer, print_output, print_success, render_table, Outputable};

#[derive(Subcommand)]
pub enum RolesCommand {
    /// List roles.
    List(PageArgs),

    /// Create a role.
    Create(RoleArgs),

    /// Replace a role.
    Edit {
        /// Role id.
        id: String,

        #[command(flatten)]
        role: RoleArgs,
    },

    /// Delete one or more roles.
    Delete {
        /// Role ids.
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Args, Debug)]
pub struct RoleArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Permission group ids (repeatable or comma-separated).
    #[arg(long = "group")]
    pub groups: Vec<String>,
}

impl RolesCommand {
    pub async fn run(self, console: &Console) -> Result<()> {
        let client = &console.client;
        match self {
            RolesCommand::List(args) => {
                let page = client.list_roles(&args.to_query()).await?;
                print_output(&RolePage { page, args }, console.json);
            }
            RolesCommand::Create(args) => {
                client
                    .create_role(&CreateRole {
                        name: args.name.clone(),
                        description: args.description,
                        permission_group_ids: split_list(&args.groups),
                    })
                    .await?;
                print_success(&format!("Role '{}' created", args.name), console.json);
            }
            RolesCommand::Edit { id, role } => {
                client
                    .edit_role(&EditRole {
                        id: id.clone(),
                        name: role.name,
                        description: role.description,
                        permission_group_ids: split_list(&role.groups),
                    })
                    .await?;
                print_success(&format!("Role {} updated", id), console.json);
            }
            RolesCommand::Delete { ids } => {
                let roles = DeleteRoles { ids: split_list(&ids) };
                client.delete_roles(&roles).await?;
                print_success(&format!("Deleted {} role(s)", roles.ids.len()), console.json);
            }
        }
        Ok(())
    }
}

struct RolePage {
    page: Page<Role>,
    args: PageArgs,
}

impl Outputable for RolePage {
    fn to_json(&self) -> Value {
        json_of(&self.page)
    }

    fn to_human(&self) -> String {
        if self.page.is_empty() {
            return "No roles found".to_string();
        }
        let rows: Vec<Vec<String>> = self
            .page
            .list
            .iter()
            .map(|r| {
                vec![
                    r.id.clone(),
                    r.name.clone(),
                    r.permission_group_ids.join(","),
                    truncate_string(&r.description, 40),
                    r.created_at.as_deref().map(format_date).unwrap_or_default(),
                ]
            })
            .collect();
        format!(
            "{}\n\n{}",
            render_table(&["ID", "NAME", "GROUPS", "DESCRIPTION", "CREATED"], &rows),
            page_footer(
                self.page.list.len(),
                self.page.total,
                self.args.page,
                self.page.page_count(self.args.page_size)
            )
        )
    }
}
