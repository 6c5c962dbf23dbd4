//! Database service models and calls

use super::client::{resource_path, OciClient, Service};
use super::{decode_page, push_opt, DefinedTags, FreeformTags, PaginatedResult};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A database home. List and get return the same shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DbHome {
    pub id: String,
    pub compartment_id: String,
    pub display_name: Option<String>,
    pub lifecycle_state: Option<String>,
    pub lifecycle_details: Option<String>,
    pub db_system_id: Option<String>,
    pub vm_cluster_id: Option<String>,
    pub db_version: Option<String>,
    pub db_home_location: Option<String>,
    pub database_software_image_id: Option<String>,
    pub kms_key_id: Option<String>,
    pub last_patch_history_entry_id: Option<String>,
    pub one_off_patches: Option<Vec<String>>,
    pub time_created: Option<DateTime<Utc>>,
    pub freeform_tags: Option<FreeformTags>,
    pub defined_tags: Option<DefinedTags>,
}

/// List view of an autonomous database
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutonomousDatabaseSummary {
    pub id: String,
    pub compartment_id: String,
    pub display_name: Option<String>,
    pub db_name: Option<String>,
    pub lifecycle_state: Option<String>,
    pub db_workload: Option<String>,
    pub time_created: Option<DateTime<Utc>>,
    pub freeform_tags: Option<FreeformTags>,
    pub defined_tags: Option<DefinedTags>,
}

/// `ListDbHomes` parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListDbHomesRequest {
    pub compartment_id: String,
    pub db_system_id: Option<String>,
    pub vm_cluster_id: Option<String>,
    pub db_version: Option<String>,
    pub display_name: Option<String>,
    pub lifecycle_state: Option<String>,
    pub limit: Option<u32>,
    pub page: Option<String>,
}

impl ListDbHomesRequest {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("compartmentId", self.compartment_id.clone())];
        push_opt(&mut query, "dbSystemId", &self.db_system_id);
        push_opt(&mut query, "vmClusterId", &self.vm_cluster_id);
        push_opt(&mut query, "dbVersion", &self.db_version);
        push_opt(&mut query, "displayName", &self.display_name);
        push_opt(&mut query, "lifecycleState", &self.lifecycle_state);
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        push_opt(&mut query, "page", &self.page);
        query
    }
}

/// `ListAutonomousDatabases` parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListAutonomousDatabasesRequest {
    pub compartment_id: String,
    pub limit: Option<u32>,
    pub page: Option<String>,
}

impl OciClient {
    pub async fn list_db_homes(
        &self,
        region: &str,
        request: &ListDbHomesRequest,
    ) -> Result<PaginatedResult<DbHome>> {
        let response = self
            .get(Service::Database, region, "dbHomes", &request.query())
            .await?;
        decode_page(response)
    }

    pub async fn get_db_home(&self, region: &str, id: &str) -> Result<DbHome> {
        let response = self
            .get(Service::Database, region, &resource_path("dbHomes", id), &[])
            .await?;
        serde_json::from_value(response.body).context("Failed to decode db home")
    }

    pub async fn list_autonomous_databases(
        &self,
        region: &str,
        request: &ListAutonomousDatabasesRequest,
    ) -> Result<PaginatedResult<AutonomousDatabaseSummary>> {
        let mut query = vec![("compartmentId", request.compartment_id.clone())];
        if let Some(limit) = request.limit {
            query.push(("limit", limit.to_string()));
        }
        push_opt(&mut query, "page", &request.page);

        let response = self
            .get(Service::Database, region, "autonomousDatabases", &query)
            .await?;
        decode_page(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_home_query_order() {
        let request = ListDbHomesRequest {
            compartment_id: "c".to_string(),
            lifecycle_state: Some("AVAILABLE".to_string()),
            vm_cluster_id: Some("vm".to_string()),
            limit: Some(1000),
            page: Some("next".to_string()),
            ..Default::default()
        };
        let keys: Vec<&str> = request.query().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["compartmentId", "vmClusterId", "lifecycleState", "limit", "page"]);
    }
}
