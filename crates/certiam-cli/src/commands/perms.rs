use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::Value;

use certiam_core::models::{
    BindPermissionGroup, CreatePermissionGroup, EditPermissionGroup, Page, PermissionGroup,
};
use certiam_core::utils::{format_date, truncate_string};

use super::{split_list, PageArgs};
use crate::console::Console;
use crate::output::{json_of, page_footer, print_output, print_success, render_table, Outputable};

#[derive(Subcommand)]
pub enum PermsCommand {
    /// List permission groups.
    List(PageArgs),

    /// Create a permission group.
    Create(GroupArgs),

    /// Replace a permission group.
    Edit {
        /// Permission group id.
        id: String,

        #[command(flatten)]
        group: GroupArgs,
    },

    /// Attach permission groups to a role.
    Bind {
        /// Role id.
        #[arg(long)]
        role: String,

        /// Permission group ids (repeatable or comma-separated).
        #[arg(long = "group", required = true)]
        groups: Vec<String>,
    },

    /// Delete a permission group.
    Delete {
        /// Permission group id.
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct GroupArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Permission keys (repeatable or comma-separated).
    #[arg(long = "permission")]
    pub permissions: Vec<String>,
}

impl PermsCommand {
    pub async fn run(self, console: &Console) -> Result<()> {
        let client = &console.client;
        match self {
            PermsCommand::List(args) => {
                let page = client.list_permission_groups(&args.to_query()).await?;
                print_output(&GroupPage { page, args }, console.json);
            }
            PermsCommand::Create(args) => {
                client
                    .create_permission_group(&CreatePermissionGroup {
                        name: args.name.clone(),
                        description: args.description,
                        permissions: split_list(&args.permissions),
                    })
                    .await?;
                print_success(&format!("Permission group '{}' created", args.name), console.json);
            }
            PermsCommand::Edit { id, group } => {
                client
                    .edit_permission_group(&EditPermissionGroup {
                        id: id.clone(),
                        name: group.name,
                        description: group.description,
                        permissions: split_list(&group.permissions),
                    })
                    .await?;
                print_success(&format!("Permission group {} updated", id), console.json);
            }
            PermsCommand::Bind { role, groups } => {
                let binding = BindPermissionGroup {
                    role_id: role,
                    permission_group_ids: split_list(&groups),
                };
                client.bind_permission_group(&binding).await?;
                print_success(
                    &format!(
                        "Bound {} permission group(s) to role {}",
                        binding.permission_group_ids.len(),
                        binding.role_id
                    ),
                    console.json,
                );
            }
            PermsCommand::Delete { id } => {
                client.delete_permission_group(&id).await?;
                print_success(&format!("Permission group {} deleted", id), console.json);
            }
        }
        Ok(())
    }
}

struct GroupPage {
    page: Page<PermissionGroup>,
    args: PageArgs,
}

impl Outputable for GroupPage {
    fn to_json(&self) -> Value {
        json_of(&self.page)
    }

    fn to_human(&self) -> String {
        if self.page.is_empty() {
            return "No permission groups found".to_string();
        }
        let rows: Vec<Vec<String>> = self
            .page
            .list
            .iter()
            .map(|g| {
                vec![
                    g.id.clone(),
                    g.name.clone(),
                    g.permissions.len().to_string(),
                    truncate_string(&g.description, 40),
                    g.created_at.as_deref().map(format_date).unwrap_or_default(),
                ]
            })
            .collect();
        format!(
            "{}\n\n{}",
            render_table(&["ID", "NAME", "PERMISSIONS", "DESCRIPTION", "CREATED"], &rows),
            page_footer(
                self.page.list.len(),
                self.page.total,
                self.args.page,
                self.page.page_count(self.args.page_size)
            )
        )
    }
}
