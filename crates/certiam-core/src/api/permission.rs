//! Permission group endpoints under `/api/v1/iam`.

use anyhow::Result;
use serde::de::IgnoredAny;

use super::ApiClient;
use crate::models::{BindPermissionGroup, CreatePermissionGroup, EditPermissionGroup, ListQuery, Page, PermissionGroup};

const PERMISSION_GROUPS_PATH: &str = "/api/v1/iam/permission_groups";
const PERMISSION_GROUP_PATH: &str = "/api/v1/iam/permission_group";

impl ApiClient {
    pub async fn list_permission_groups(&self, query: &ListQuery) -> Result<Page<PermissionGroup>> {
        self.get(PERMISSION_GROUPS_PATH, query).await
    }

    pub async fn create_permission_group(&self, group: &CreatePermissionGroup) -> Result<()> {
        let _: IgnoredAny = self.post(PERMISSION_GROUP_PATH, group).await?;
        Ok(())
    }

    pub async fn edit_permission_group(&self, group: &EditPermissionGroup) -> Result<()> {
        let url = format!("{}/{}", PERMISSION_GROUP_PATH, group.id);
        let _: IgnoredAny = self.put(&url, group).await?;
        Ok(())
    }

    /// Bind permission groups to a role
    pub async fn bind_permission_group(&self, binding: &BindPermissionGroup) -> Result<()> {
        let url = format!("{}/bind", PERMISSION_GROUP_PATH);
        let _: IgnoredAny = self.post(&url, binding).await?;
        Ok(())
    }

    pub async fn delete_permission_group(&self, id: &str) -> Result<()> {
        let _: IgnoredAny = self.delete(&format!("{}/{}", PERMISSION_GROUP_PATH, id)).await?;
        Ok(())
    }
}
