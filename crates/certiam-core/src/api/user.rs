//! User endpoints under `/api/v1/iam`.

use anyhow::Result;
use serde::de::IgnoredAny;
use serde_json::Value;
use tracing::info;

use super::ApiClient;
use crate::models::{
    EditAccount, GenerateUser, InviteUser, ListQuery, OperateUser, Page, ResetPassword, User, UserActive,
};

const IAM_PATH: &str = "/api/v1/iam";

impl ApiClient {
    pub async fn list_users(&self, query: &ListQuery) -> Result<Page<User>> {
        self.get(&format!("{}/users", IAM_PATH), query).await
    }

    /// Generate a sub-account. The backend's reply (which may include the
    /// generated credentials) is returned as-is.
    pub async fn generate_user(&self, user: &GenerateUser) -> Result<Value> {
        let created = self.post(&format!("{}/user/generate", IAM_PATH), user).await?;
        info!(username = %user.username, "User generated");
        Ok(created)
    }

    pub async fn edit_account(&self, account: &EditAccount) -> Result<()> {
        let _: IgnoredAny = self.patch(&format!("{}/account/editor", IAM_PATH), account).await?;
        Ok(())
    }

    /// Assign roles and add the user to groups
    pub async fn operate_user(&self, operation: &OperateUser) -> Result<()> {
        let _: IgnoredAny = self
            .post(&format!("{}/user/private/editor", IAM_PATH), operation)
            .await?;
        Ok(())
    }

    pub async fn invite_users(&self, invite: &InviteUser) -> Result<()> {
        let _: IgnoredAny = self.post(&format!("{}/user/invite", IAM_PATH), invite).await?;
        info!(count = invite.emails.len(), "Invitations sent");
        Ok(())
    }

    /// Enable, disable, delete or activate users
    pub async fn set_users_active(&self, request: &UserActive) -> Result<()> {
        let _: IgnoredAny = self.post(&format!("{}/user/active", IAM_PATH), request).await?;
        info!(action = ?request.action, count = request.user_ids.len(), "User state changed");
        Ok(())
    }

    pub async fn reset_password(&self, request: &ResetPassword) -> Result<()> {
        let _: IgnoredAny = self.post(&format!("{}/pwd/reset", IAM_PATH), request).await?;
        Ok(())
    }
}
