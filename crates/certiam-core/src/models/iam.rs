//! IAM entities: permission groups, roles, users and user groups.

use serde::{Deserialize, Serialize};

use super::id_from_any;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct PermissionGroup {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct CreatePermissionGroup {
    pub name: String,
    pub description: String,
    pub permissions: Vec<String>,
}

/// Full replacement of a permission group; `id` also addresses the resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct EditPermissionGroup {
    pub id: String,
    pub name: String,
    pub description: String,
    pub permissions: Vec<String>,
}

/// Attach permission groups to a role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct BindPermissionGroup {
    pub role_id: String,
    pub permission_group_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Role {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permission_group_ids: Vec<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct CreateRole {
    pub name: String,
    pub description: String,
    pub permission_group_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct EditRole {
    pub id: String,
    pub name: String,
    pub description: String,
    pub permission_group_ids: Vec<String>,
}

/// Batch role deletion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct DeleteRoles {
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct User {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    pub created_at: Option<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.username)
    }
}

/// Create a sub-account under the current tenant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct GenerateUser {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Edit one account's profile fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct EditAccount {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Assign roles and add to user groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct OperateUser {
    pub user_id: String,
    pub role_ids: Vec<String>,
    pub group_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct InviteUser {
    pub emails: Vec<String>,
    pub role_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub enum UserAction {
    Enable,
    Disable,
    Delete,
    Activate,
}

impl UserAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enable" => Some(UserAction::Enable),
            "disable" => Some(UserAction::Disable),
            "delete" => Some(UserAction::Delete),
            "activate" => Some(UserAction::Activate),
            _ => None,
        }
    }
}

/// Enable, disable, delete or activate users in bulk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct UserActive {
    pub user_ids: Vec<String>,
    pub action: UserAction,
}

/// Tenant owner resets a sub-account's password.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct ResetPassword {
    pub user_id: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct UserGroup {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub member_count: Option<i64>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_user_display_name_falls_back_to_username() {
        let user: User = serde_json::from_value(json!({"id": "u1", "username": "alice", "displayName": ""}))
            .expect("user should parse");
        assert_eq!(user.display_name(), "alice");
        assert!(user.roles.is_empty());
    }

    #[test]
    fn test_user_active_wire_format() {
        let body = UserActive {
            user_ids: vec!["u1".into(), "u2".into()],
            action: UserAction::Disable,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"userIds": ["u1", "u2"], "action": "disable"})
        );
        assert_eq!(UserAction::parse("Activate"), Some(UserAction::Activate));
        assert_eq!(UserAction::parse("ban"), None);
    }

    #[test]
    fn test_generate_user_skips_missing_fields() {
        let body = GenerateUser {
            username: "ops-bot".into(),
            email: Some("ops@example.com".into()),
            ..GenerateUser::default()
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"username": "ops-bot", "email": "ops@example.com"})
        );
    }

    #[test]
    fn test_groups_parse_numeric_ids() {
        let group: UserGroup =
            serde_json::from_value(json!({"id": 3, "name": "sre", "memberCount": 4})).unwrap();
        assert_eq!(group.id, "3");
        assert_eq!(group.member_count, Some(4));
    }
}
