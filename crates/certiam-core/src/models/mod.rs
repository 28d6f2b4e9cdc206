//! Data models for the administration backend.
//!
//! This module contains the typed records exchanged with the backend:
//!
//! - `Cert`, `CertQuery`, `CreateCert`, `UpdateCert`, `CertTotals`: certificates
//! - `PermissionGroup`, `Role`, `User`, `UserGroup` and their write requests: IAM
//! - `Page`, `ListQuery`: pagination shared by every list endpoint

pub mod cert;
pub mod iam;
pub mod page;

pub use cert::{Cert, CertQuery, CertStatus, CertTotals, CreateCert, UpdateCert};
pub use iam::{
    BindPermissionGroup, CreatePermissionGroup, CreateRole, DeleteRoles, EditAccount,
    EditPermissionGroup, EditRole, GenerateUser, InviteUser, OperateUser, PermissionGroup,
    ResetPassword, Role, User, UserAction, UserActive, UserGroup,
};
pub use page::{ListQuery, Page, DEFAULT_PAGE_SIZE};

use serde::{Deserialize, Deserializer};

/// Accept an id that arrives as either a JSON number or a string.
pub(crate) fn id_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
