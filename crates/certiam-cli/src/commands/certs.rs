//! Certificate commands.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde_json::{json, Value};

use certiam_core::api::CertOverview;
use certiam_core::models::{Cert, CertQuery, CertStatus, CertTotals, CreateCert, Page, UpdateCert, DEFAULT_PAGE_SIZE};
use certiam_core::utils::{format_date, format_fingerprint, format_optional};

use super::split_list;
use crate::console::Console;
use crate::output::{json_of, page_footer, print_output, print_success, render_table, Outputable};

#[derive(Subcommand)]
pub enum CertsCommand {
    /// List certificates.
    List(ListArgs),

    /// Upload a certificate and its private key.
    Create(CreateArgs),

    /// Change name, tags or PEM material of a certificate.
    Update(UpdateArgs),

    /// Delete a certificate.
    Delete {
        /// Certificate id.
        id: String,
    },

    /// Certificate counts per status.
    Total,

    /// Status counts and the first page together.
    Overview(ListArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Match on subject names.
    #[arg(long)]
    pub subject: Option<String>,

    /// Match on certificate name.
    #[arg(long)]
    pub name: Option<String>,

    /// Filter by tag (repeatable or comma-separated).
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// expires-soon, expired or issued.
    #[arg(long, value_parser = parse_status)]
    pub status: Option<CertStatus>,

    #[arg(long, default_value_t = 1)]
    pub page: u32,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,
}

impl ListArgs {
    fn to_query(&self) -> CertQuery {
        CertQuery {
            subject_keyword: self.subject.clone(),
            name_keyword: self.name.clone(),
            tags: split_list(&self.tags),
            status: self.status,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    pub name: String,

    /// PEM certificate chain.
    #[arg(long)]
    pub cert_file: PathBuf,

    /// PEM private key.
    #[arg(long)]
    pub key_file: PathBuf,

    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Accept a certificate that is already stored.
    #[arg(long)]
    pub allow_duplicate: bool,

    /// Skip the chain/key consistency check.
    #[arg(long)]
    pub skip_integrity_check: bool,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Certificate id.
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    /// Replace all tags (repeatable or comma-separated).
    #[arg(long = "tag")]
    pub tags: Option<Vec<String>>,

    #[arg(long)]
    pub cert_file: Option<PathBuf>,

    #[arg(long)]
    pub key_file: Option<PathBuf>,
}

fn parse_status(s: &str) -> Result<CertStatus, String> {
    CertStatus::parse(s)
        .filter(|status| CertStatus::FILTERABLE.contains(status))
        .ok_or_else(|| format!("unknown status '{}' (expected expires-soon, expired or issued)", s))
}

fn read_pem(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

impl CertsCommand {
    pub async fn run(self, console: &Console) -> Result<()> {
        let client = &console.client;
        match self {
            CertsCommand::List(args) => {
                let page = client.list_certs(&args.to_query()).await?;
                print_output(&CertPage::new(page, &args), console.json);
            }
            CertsCommand::Create(args) => {
                let cert = CreateCert {
                    name: args.name,
                    certificate_pem: read_pem(&args.cert_file)?,
                    private_key_pem: read_pem(&args.key_file)?,
                    tags: split_list(&args.tags),
                    allow_duplicate: args.allow_duplicate,
                    disable_integrity_check: args.skip_integrity_check,
                };
                client.create_cert(&cert).await?;
                print_success(&format!("Certificate '{}' created", cert.name), console.json);
            }
            CertsCommand::Update(args) => {
                let update = UpdateCert {
                    cert_id: args.id,
                    name: args.name,
                    tags: args.tags.as_deref().map(split_list),
                    certificate_pem: args.cert_file.as_deref().map(read_pem).transpose()?,
                    private_key_pem: args.key_file.as_deref().map(read_pem).transpose()?,
                };
                if update.name.is_none()
                    && update.tags.is_none()
                    && update.certificate_pem.is_none()
                    && update.private_key_pem.is_none()
                {
                    bail!("Nothing to update: pass --name, --tag, --cert-file or --key-file");
                }
                client.update_cert(&update).await?;
                print_success(&format!("Certificate {} updated", update.cert_id), console.json);
            }
            CertsCommand::Delete { id } => {
                client.delete_cert(&id).await?;
                print_success(&format!("Certificate {} deleted", id), console.json);
            }
            CertsCommand::Total => {
                let totals = client.cert_totals().await?;
                print_output(&Totals(totals), console.json);
            }
            CertsCommand::Overview(args) => {
                let overview = client.cert_overview(&args.to_query()).await?;
                print_output(&Overview::new(overview, &args), console.json);
            }
        }
        Ok(())
    }
}

struct CertPage {
    page: Page<Cert>,
    page_no: u32,
    page_size: u32,
    now: DateTime<Utc>,
}

impl CertPage {
    fn new(page: Page<Cert>, args: &ListArgs) -> Self {
        Self {
            page,
            page_no: args.page,
            page_size: args.page_size,
            now: Utc::now(),
        }
    }

    fn row(&self, cert: &Cert) -> Vec<String> {
        let days_left = cert
            .days_until_expiry(self.now)
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        vec![
            cert.id.clone(),
            cert.name.clone(),
            format_optional(Some(cert.primary_subject()), "-"),
            cert.effective_status(self.now).label().to_string(),
            cert.not_after.as_deref().map(format_date).unwrap_or_else(|| "-".to_string()),
            days_left,
            cert.tags.join(","),
            format_optional(Some(format_fingerprint(&cert.sha256_fingerprint).as_str()), "-"),
        ]
    }
}

impl Outputable for CertPage {
    fn to_json(&self) -> Value {
        json_of(&self.page)
    }

    fn to_human(&self) -> String {
        if self.page.is_empty() {
            return "No certificates found".to_string();
        }
        let rows: Vec<Vec<String>> = self.page.list.iter().map(|c| self.row(c)).collect();
        format!(
            "{}\n\n{}",
            render_table(
                &["ID", "NAME", "SUBJECT", "STATUS", "EXPIRES", "DAYS", "TAGS", "SHA-256"],
                &rows
            ),
            page_footer(
                self.page.list.len(),
                self.page.total,
                self.page_no,
                self.page.page_count(self.page_size)
            )
        )
    }
}

struct Totals(CertTotals);

fn totals_rows(totals: &CertTotals) -> Vec<Vec<String>> {
    CertStatus::OVERVIEW
        .iter()
        .map(|s| vec![s.label().to_string(), totals.count(*s).to_string()])
        .collect()
}

impl Outputable for Totals {
    fn to_json(&self) -> Value {
        json_of(&self.0)
    }

    fn to_human(&self) -> String {
        render_table(&["STATUS", "COUNT"], &totals_rows(&self.0))
    }
}

struct Overview(CertOverview, CertPage);

impl Overview {
    fn new(overview: CertOverview, args: &ListArgs) -> Self {
        let page = CertPage::new(overview.page.clone(), args);
        Self(overview, page)
    }
}

impl Outputable for Overview {
    fn to_json(&self) -> Value {
        json!({"totals": json_of(&self.0.totals), "page": self.1.to_json()})
    }

    fn to_human(&self) -> String {
        format!(
            "{}\n\n{}",
            render_table(&["STATUS", "COUNT"], &totals_rows(&self.0.totals)),
            self.1.to_human()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_accepts_filterable_only() {
        assert_eq!(parse_status("expired"), Ok(CertStatus::Expired));
        assert_eq!(parse_status("expires-soon"), Ok(CertStatus::ExpiresSoon));
        assert!(parse_status("abnormal").is_err());
    }

    #[test]
    fn test_list_args_to_query() {
        let args = ListArgs {
            subject: Some("example.com".into()),
            name: None,
            tags: vec!["prod,edge".into()],
            status: Some(CertStatus::Issued),
            page: 2,
            page_size: 20,
        };
        let query = args.to_query();
        assert_eq!(query.tags, vec!["prod", "edge"]);
        assert_eq!(query.subject_keyword.as_deref(), Some("example.com"));
        assert_eq!(query.page, 2);
    }

    #[test]
    fn test_empty_page_message() {
        let args = ListArgs {
            subject: None,
            name: None,
            tags: Vec::new(),
            status: None,
            page: 1,
            page_size: 10,
        };
        let page: Page<Cert> = serde_json::from_value(json!({"list": [], "total": 0})).unwrap();
        assert_eq!(CertPage::new(page, &args).to_human(), "No certificates found");
    }
}
