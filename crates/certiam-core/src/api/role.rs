//! Role endpoints under `/api/v1/iam/roles`.

use anyhow::Result;
use serde::de::IgnoredAny;

use super::ApiClient;
use crate::models::{CreateRole, DeleteRoles, EditRole, ListQuery, Page, Role};

const ROLES_PATH: &str = "/api/v1/iam/roles";

impl ApiClient {
    /// List roles (paged, fuzzy keyword match)
    pub async fn list_roles(&self, query: &ListQuery) -> Result<Page<Role>> {
        self.get(ROLES_PATH, query).await
    }

    pub async fn create_role(&self, role: &CreateRole) -> Result<()> {
        let _: IgnoredAny = self.post(ROLES_PATH, role).await?;
        Ok(())
    }

    pub async fn edit_role(&self, role: &EditRole) -> Result<()> {
        let _: IgnoredAny = self.put(ROLES_PATH, role).await?;
        Ok(())
    }

    /// Delete one or more roles in a single call
    pub async fn delete_roles(&self, roles: &DeleteRoles) -> Result<()> {
        let _: IgnoredAny = self.delete_with_body(ROLES_PATH, roles).await?;
        Ok(())
    }
}
