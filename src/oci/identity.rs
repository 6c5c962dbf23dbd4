//! OCI Identity
//!
//! Compartment and region discovery, and the compartment x region matrix
//! every table is enumerated over.

use super::client::{OciClient, Service};
use super::{decode_page, PaginatedResult};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Prefix of tenancy (root compartment) OCIDs
const TENANCY_OCID_PREFIX: &str = "ocid1.tenancy.";

/// Region value meaning "every subscribed region"
pub const ALL_REGIONS: &str = "*";

/// A `(region, compartment)` pair one listing call runs against
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Scope {
    pub region: String,
    pub compartment: String,
}

impl Scope {
    pub fn new(region: &str, compartment: &str) -> Self {
        Self {
            region: region.to_string(),
            compartment: compartment.to_string(),
        }
    }

    /// The root compartment is the tenancy itself
    pub fn is_root(&self) -> bool {
        self.compartment.starts_with(TENANCY_OCID_PREFIX)
    }
}

/// Compartment information
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Compartment {
    pub id: String,
    pub name: String,
    pub compartment_id: String,
    pub lifecycle_state: String,
}

/// A region the tenancy is subscribed to
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegionSubscription {
    pub region_key: String,
    pub region_name: String,
    pub status: String,
    pub is_home_region: bool,
}

impl OciClient {
    /// List one page of compartments below the tenancy
    pub async fn list_compartments_page(
        &self,
        region: &str,
        page: Option<&str>,
    ) -> Result<PaginatedResult<Compartment>> {
        let mut query = vec![
            ("compartmentId", self.tenancy.clone()),
            ("compartmentIdInSubtree", "true".to_string()),
            ("accessLevel", "ANY".to_string()),
            ("limit", "1000".to_string()),
        ];
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }
        let response = self.get(Service::Identity, region, "compartments", &query).await?;
        decode_page(response)
    }

    /// List all active compartments (auto-paginate)
    pub async fn list_compartments(&self, region: &str) -> Result<Vec<Compartment>> {
        let mut all_items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let result = self.list_compartments_page(region, page_token.as_deref()).await?;
            all_items.extend(
                result
                    .items
                    .into_iter()
                    .filter(|c| c.lifecycle_state == "ACTIVE"),
            );

            if result.next_token.is_none() {
                break;
            }
            page_token = result.next_token;
        }

        Ok(all_items)
    }

    /// List regions the tenancy is subscribed to
    pub async fn list_region_subscriptions(&self, region: &str) -> Result<Vec<RegionSubscription>> {
        let path = format!(
            "tenancies/{}/regionSubscriptions",
            urlencoding::encode(&self.tenancy)
        );
        let response = self.get(Service::Identity, region, &path, &[]).await?;
        Ok(decode_page::<RegionSubscription>(response)?.items)
    }
}

/// Build the compartment x region matrix.
///
/// `regions` may contain `*` for every subscribed region and defaults to the
/// profile's home region. Without explicit `compartments` the tenancy root
/// and every active compartment below it are used.
pub async fn build_compartment_region_list(
    client: &OciClient,
    regions: &[String],
    compartments: &[String],
) -> Result<Vec<Scope>> {
    let Some(home_region) = client
        .home_region
        .clone()
        .or_else(|| regions.iter().find(|r| *r != ALL_REGIONS).cloned())
    else {
        bail!("No OCI region configured. Set 'region' in the OCI config profile or use --region");
    };

    let regions: Vec<String> = if regions.iter().any(|r| r == ALL_REGIONS) {
        client
            .list_region_subscriptions(&home_region)
            .await?
            .into_iter()
            .filter(|s| s.status == "READY")
            .map(|s| s.region_name)
            .collect()
    } else if regions.is_empty() {
        vec![home_region.clone()]
    } else {
        regions.to_vec()
    };

    let compartments: Vec<String> = if compartments.is_empty() {
        let mut all = vec![client.tenancy.clone()];
        all.extend(
            client
                .list_compartments(&home_region)
                .await?
                .into_iter()
                .map(|c| c.id),
        );
        all
    } else {
        compartments.to_vec()
    };

    tracing::info!(
        "Scope matrix: {} compartments x {} regions",
        compartments.len(),
        regions.len()
    );

    Ok(compartments
        .iter()
        .flat_map(|compartment| {
            regions
                .iter()
                .map(move |region| Scope::new(region, compartment))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_scope() {
        assert!(Scope::new("us-ashburn-1", "ocid1.tenancy.oc1..aaa").is_root());
        assert!(!Scope::new("us-ashburn-1", "ocid1.compartment.oc1..bbb").is_root());
    }
}
