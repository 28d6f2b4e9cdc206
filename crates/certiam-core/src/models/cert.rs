//! Certificate records and the requests that manage them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id_from_any;
use super::page::DEFAULT_PAGE_SIZE;

/// Days before expiry at which a certificate counts as expiring soon.
pub const EXPIRES_SOON_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub enum CertStatus {
    #[serde(rename = "CERT_STATUS_EXPIRES_SOON")]
    ExpiresSoon,
    #[serde(rename = "CERT_STATUS_EXPIRED")]
    Expired,
    #[serde(rename = "CERT_STATUS_ISSUE")]
    Issued,
    #[serde(rename = "CERT_STATUS_ABNORMAL")]
    Abnormal,
    #[serde(rename = "CERT_STATUS_UNUSED")]
    Unused,
    #[serde(rename = "CERT_STATUS_ALL")]
    All,
    #[default]
    #[serde(other)]
    Unknown,
}

impl CertStatus {
    /// Statuses offered in the list filter.
    pub const FILTERABLE: [CertStatus; 3] = [CertStatus::ExpiresSoon, CertStatus::Expired, CertStatus::Issued];

    /// Statuses shown on the overview tiles, in display order.
    pub const OVERVIEW: [CertStatus; 5] = [
        CertStatus::All,
        CertStatus::Issued,
        CertStatus::ExpiresSoon,
        CertStatus::Expired,
        CertStatus::Abnormal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CertStatus::ExpiresSoon => "CERT_STATUS_EXPIRES_SOON",
            CertStatus::Expired => "CERT_STATUS_EXPIRED",
            CertStatus::Issued => "CERT_STATUS_ISSUE",
            CertStatus::Abnormal => "CERT_STATUS_ABNORMAL",
            CertStatus::Unused => "CERT_STATUS_UNUSED",
            CertStatus::All => "CERT_STATUS_ALL",
            CertStatus::Unknown => "CERT_STATUS_UNKNOWN",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CertStatus::ExpiresSoon => "Expires soon",
            CertStatus::Expired => "Expired",
            CertStatus::Issued => "Issued",
            CertStatus::Abnormal => "Abnormal",
            CertStatus::Unused => "Unused",
            CertStatus::All => "All certificates",
            CertStatus::Unknown => "Unknown",
        }
    }

    /// Parse a status from its wire name or a short alias (`expired`, `issued`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.trim().to_ascii_uppercase().replace('-', "_");
        let name = upper.strip_prefix("CERT_STATUS_").unwrap_or(&upper);
        match name {
            "EXPIRES_SOON" => Some(CertStatus::ExpiresSoon),
            "EXPIRED" => Some(CertStatus::Expired),
            "ISSUE" | "ISSUED" => Some(CertStatus::Issued),
            "ABNORMAL" => Some(CertStatus::Abnormal),
            "UNUSED" => Some(CertStatus::Unused),
            "ALL" => Some(CertStatus::All),
            _ => None,
        }
    }
}

impl std::fmt::Display for CertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Cert {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subject_names: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub status: CertStatus,
    #[serde(default)]
    pub serial: String,
    pub not_after: Option<String>,
    pub not_before: Option<String>,
    #[serde(default)]
    pub sha256_fingerprint: String,
    #[serde(default)]
    pub certificate_pem: String,
    #[serde(default)]
    pub algorithm: String,
    #[serde(default)]
    pub private_key_pem: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Cert {
    pub fn not_after_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.not_after.as_deref()?)
    }

    /// Whole days left until `not_after`; negative once expired.
    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> Option<i64> {
        self.not_after_utc().map(|t| (t - now).num_days())
    }

    /// Status derived from the validity window, for rows the backend left unclassified.
    pub fn effective_status(&self, now: DateTime<Utc>) -> CertStatus {
        if self.status != CertStatus::Unknown {
            return self.status;
        }
        match self.not_after_utc() {
            Some(t) if t <= now => CertStatus::Expired,
            Some(t) if (t - now).num_days() < EXPIRES_SOON_DAYS => CertStatus::ExpiresSoon,
            Some(_) => CertStatus::Issued,
            None => CertStatus::Unknown,
        }
    }

    pub fn primary_subject(&self) -> &str {
        self.subject_names.first().map(String::as_str).unwrap_or("")
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Filters for the certificate list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct CertQuery {
    pub subject_keyword: Option<String>,
    pub name_keyword: Option<String>,
    pub tags: Vec<String>,
    pub status: Option<CertStatus>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for CertQuery {
    fn default() -> Self {
        Self {
            subject_keyword: None,
            name_keyword: None,
            tags: Vec::new(),
            status: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct CreateCert {
    pub name: String,
    pub certificate_pem: String,
    pub private_key_pem: String,
    pub tags: Vec<String>,
    pub allow_duplicate: bool,
    pub disable_integrity_check: bool,
}

/// Partial update; `cert_id` addresses the certificate and is never sent in the body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct UpdateCert {
    #[serde(skip_serializing)]
    pub cert_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_pem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_pem: Option<String>,
}

/// Certificate counts per status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTotals")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct CertTotals {
    pub by_status: BTreeMap<String, i64>,
}

impl CertTotals {
    pub fn count(&self, status: CertStatus) -> i64 {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }
}

// The totals endpoint has been seen both as a status->count map and as a list of pairs.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTotals {
    List(Vec<StatusCount>),
    Map(BTreeMap<String, i64>),
}

#[derive(Deserialize)]
struct StatusCount {
    status: String,
    #[serde(alias = "total")]
    count: i64,
}

impl From<RawTotals> for CertTotals {
    fn from(raw: RawTotals) -> Self {
        let by_status = match raw {
            RawTotals::Map(map) => map,
            RawTotals::List(items) => items.into_iter().map(|s| (s.status, s.count)).collect(),
        };
        Self { by_status }
    }
}
