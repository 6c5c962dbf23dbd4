//! NoSQL service models and calls

use super::client::{OciClient, Service};
use super::{decode_page, push_opt, DefinedTags, FreeformTags, PaginatedResult};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// List view of a NoSQL table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableSummary {
    pub id: String,
    pub name: String,
    pub compartment_id: String,
    pub lifecycle_state: Option<String>,
    pub time_created: Option<DateTime<Utc>>,
    pub freeform_tags: Option<FreeformTags>,
    pub defined_tags: Option<DefinedTags>,
}

/// `ListTables` parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListTablesRequest {
    pub compartment_id: String,
    pub limit: Option<u32>,
    pub page: Option<String>,
}

impl OciClient {
    pub async fn list_nosql_tables(
        &self,
        region: &str,
        request: &ListTablesRequest,
    ) -> Result<PaginatedResult<TableSummary>> {
        let mut query = vec![("compartmentId", request.compartment_id.clone())];
        if let Some(limit) = request.limit {
            query.push(("limit", limit.to_string()));
        }
        push_opt(&mut query, "page", &request.page);

        let response = self.get(Service::NoSql, region, "tables", &query).await?;
        decode_page(response)
    }
}
