//! OCI Client
//!
//! Main client for interacting with OCI APIs, combining request signing,
//! HTTP transport and regional endpoint resolution.

use super::auth::{ApiKeySigner, OciProfile, RequestSigner};
use super::http::{ApiResponse, OciHttpClient, RetryPolicy};
use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::OnceCell;
use url::Url;

/// OCI services reached by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Identity,
    Database,
    ContainerInstances,
    NoSql,
    Monitoring,
}

impl Service {
    /// Regional host for the commercial realm
    pub fn host(&self, region: &str) -> String {
        match self {
            Service::Identity => format!("identity.{}.oci.oraclecloud.com", region),
            Service::Database => format!("database.{}.oraclecloud.com", region),
            Service::ContainerInstances => {
                format!("compute-containers.{}.oci.oraclecloud.com", region)
            }
            Service::NoSql => format!("nosql.{}.oci.oraclecloud.com", region),
            Service::Monitoring => format!("telemetry.{}.oraclecloud.com", region),
        }
    }

    /// API version path prefix
    pub fn version(&self) -> &'static str {
        match self {
            Service::Identity | Service::Database => "20160918",
            Service::ContainerInstances => "20210415",
            Service::NoSql => "20190828",
            Service::Monitoring => "20180401",
        }
    }
}

/// Main OCI client
#[derive(Clone)]
pub struct OciClient {
    pub http: OciHttpClient,
    pub tenancy: String,
    pub home_region: Option<String>,
    base_url: Option<String>,
    tenant_id: Arc<OnceCell<String>>,
}

impl OciClient {
    /// Create a client from a config-file profile
    pub fn from_profile(profile: &OciProfile, retry: RetryPolicy) -> Result<Self> {
        let signer = ApiKeySigner::from_profile(profile)
            .context("Failed to initialize OCI API key authentication")?;
        let mut client = Self::with_signer(Arc::new(signer), &profile.tenancy, retry)?;
        client.home_region = profile.region.clone();
        Ok(client)
    }

    /// Create a client around any request signer
    pub fn with_signer(
        signer: Arc<dyn RequestSigner>,
        tenancy: &str,
        retry: RetryPolicy,
    ) -> Result<Self> {
        Ok(Self {
            http: OciHttpClient::new(signer, retry)?,
            tenancy: tenancy.to_string(),
            home_region: None,
            base_url: None,
            tenant_id: Arc::new(OnceCell::new()),
        })
    }

    /// Route every service to a single base URL (private endpoints, tests)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    /// Tenant OCID, resolved once and shared by every clone of this client
    pub async fn tenant_id(&self) -> &str {
        self.tenant_id
            .get_or_init(|| async {
                tracing::debug!("Caching tenant id {}", self.tenancy);
                self.tenancy.clone()
            })
            .await
    }

    /// Build an endpoint URL: `https://<host>/<version>/<path>?<query>`
    pub fn url(
        &self,
        service: Service,
        region: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Url> {
        let base = match &self.base_url {
            Some(base) => base.clone(),
            None => format!("https://{}", service.host(region)),
        };
        let mut url = Url::parse(&format!("{}/{}/{}", base, service.version(), path))
            .with_context(|| format!("Invalid endpoint URL for {:?}", service))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Make a GET request to an OCI API
    pub async fn get(
        &self,
        service: Service,
        region: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse> {
        let url = self.url(service, region, path, query)?;
        self.http.get(url).await
    }

    /// Make a POST request to an OCI API
    pub async fn post(
        &self,
        service: Service,
        region: &str,
        path: &str,
        query: &[(&str, String)],
        body: &Value,
    ) -> Result<ApiResponse> {
        let url = self.url(service, region, path, query)?;
        self.http.post(url, body).await
    }
}

/// Path segment for a resource id
pub fn resource_path(collection: &str, id: &str) -> String {
    format!("{}/{}", collection, urlencoding::encode(id))
}
