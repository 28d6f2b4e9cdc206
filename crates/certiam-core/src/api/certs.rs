//! Certificate endpoints under `/apis/v1/certs`.

use anyhow::Result;
use serde::de::IgnoredAny;
use tracing::info;

use super::ApiClient;
use crate::models::{Cert, CertQuery, CertTotals, CreateCert, Page, UpdateCert};

const CERTS_PATH: &str = "/apis/v1/certs";

/// Totals plus the first page of the list, as shown on the landing screen.
#[derive(Debug, Clone)]
pub struct CertOverview {
    pub totals: CertTotals,
    pub page: Page<Cert>,
}

impl ApiClient {
    /// List certificates matching the query
    pub async fn list_certs(&self, query: &CertQuery) -> Result<Page<Cert>> {
        self.get(CERTS_PATH, query).await
    }

    pub async fn create_cert(&self, cert: &CreateCert) -> Result<()> {
        let _: IgnoredAny = self.post(CERTS_PATH, cert).await?;
        info!(name = %cert.name, "Certificate created");
        Ok(())
    }

    pub async fn delete_cert(&self, cert_id: &str) -> Result<()> {
        let _: IgnoredAny = self.delete(&format!("{}/{}", CERTS_PATH, cert_id)).await?;
        info!(cert_id, "Certificate deleted");
        Ok(())
    }

    /// Certificate counts per status
    pub async fn cert_totals(&self) -> Result<CertTotals> {
        self.get(&format!("{}/total", CERTS_PATH), &()).await
    }

    /// Update a certificate; the id travels in the path only
    pub async fn update_cert(&self, update: &UpdateCert) -> Result<()> {
        let url = format!("{}/{}", CERTS_PATH, update.cert_id);
        let _: IgnoredAny = self.put(&url, update).await?;
        info!(cert_id = %update.cert_id, "Certificate updated");
        Ok(())
    }

    /// Fetch totals and the first page concurrently
    pub async fn cert_overview(&self, query: &CertQuery) -> Result<CertOverview> {
        let (totals, page) = futures::future::try_join(self.cert_totals(), self.list_certs(query)).await?;
        Ok(CertOverview { totals, page })
    }
}
