//! Console subcommands, one module per backend area.

pub mod certs;
pub mod download;
pub mod groups;
pub mod perms;
pub mod roles;
pub mod routes;
pub mod session;
pub mod users;

use clap::Args;

use certiam_core::models::{ListQuery, DEFAULT_PAGE_SIZE};

/// Paging and keyword filter shared by the IAM list commands.
#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    /// Fuzzy match on name.
    #[arg(long, short)]
    pub keyword: Option<String>,

    #[arg(long, default_value_t = 1)]
    pub page: u32,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,
}

impl PageArgs {
    pub fn to_query(&self) -> ListQuery {
        ListQuery {
            keyword: self.keyword.clone(),
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Split repeated or comma-separated values into one list.
pub fn split_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        let values = vec!["a,b".to_string(), " c ".to_string(), ",".to_string()];
        assert_eq!(split_list(&values), vec!["a", "b", "c"]);
    }
}
