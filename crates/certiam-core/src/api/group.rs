use anyhow::Result;

use super::ApiClient;
use crate::models::{ListQuery, Page, UserGroup};

const GROUPS_PATH: &str = "/api/v1/iam/groups";

impl ApiClient {
    /// List user groups (paged, filtered)
    pub async fn list_user_groups(&self, query: &ListQuery) -> Result<Page<UserGroup>> {
        self.get(GROUPS_PATH, query).await
    }
}
