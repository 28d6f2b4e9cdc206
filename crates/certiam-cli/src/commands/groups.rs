use anyhow::Result;
use clap::Subcommand;
use serde_json::Value;

use certiam_core::models::{Page, UserGroup};
use certiam_core::utils::truncate_string;

use super::PageArgs;
use crate::console::Console;
use crate::output::{json_of, page_footer, print_output, render_table, Outputable};

#[derive(Subcommand)]
pub enum GroupsCommand {
    /// List user groups.
    List(PageArgs),
}

impl GroupsCommand {
    pub async fn run(self, console: &Console) -> Result<()> {
        match self {
            GroupsCommand::List(args) => {
                let page = console.client.list_user_groups(&args.to_query()).await?;
                print_output(&UserGroupPage { page, args }, console.json);
            }
        }
        Ok(())
    }
}

struct UserGroupPage {
    page: Page<UserGroup>,
    args: PageArgs,
}

impl Outputable for UserGroupPage {
    fn to_json(&self) -> Value {
        json_of(&self.page)
    }

    fn to_human(&self) -> String {
        if self.page.is_empty() {
            return "No user groups found".to_string();
        }
        let rows: Vec<Vec<String>> = self
            .page
            .list
            .iter()
            .map(|g| {
                vec![
                    g.id.clone(),
                    g.name.clone(),
                    g.member_count.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string()),
                    truncate_string(&g.description, 40),
                ]
            })
            .collect();
        format!(
            "{}\n\n{}",
            render_table(&["ID", "NAME", "MEMBERS", "DESCRIPTION"], &rows),
            page_footer(
                self.page.list.len(),
                self.page.total,
                self.args.page,
                self.page.page_count(self.args.page_size)
            )
        )
    }
}
