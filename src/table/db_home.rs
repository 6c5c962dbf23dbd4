//! oci_database_db_home

use super::common;
use super::fetcher::{compartment_matches, fetch_detail, page_size, paginate, DetailKey};
use super::filter::Quals;
use super::transform::tags_of;
use super::{render_row, ColumnDef, ColumnType, QueryContext, Row, RowSource, Table};
use crate::oci::client::OciClient;
use crate::oci::database::{DbHome, ListDbHomesRequest};
use crate::oci::identity::Scope;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};

pub const TABLE_NAME: &str = "oci_database_db_home";

const PUSHDOWN_COLUMNS: &[&str] = &[
    "db_system_id",
    "db_version",
    "display_name",
    "lifecycle_state",
    "vm_cluster_id",
];

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new(
        "display_name",
        ColumnType::String,
        "The user-friendly name for the database home. It does not have to be unique.",
    ),
    ColumnDef::new("id", ColumnType::String, "The OCID of the database home."),
    ColumnDef::new("lifecycle_state", ColumnType::String, "The current state of the database home."),
    ColumnDef::new("db_system_id", ColumnType::String, "The OCID of the DB system."),
    ColumnDef::new(
        "time_created",
        ColumnType::Timestamp,
        "The date and time the database home was created.",
    ),
    ColumnDef::new(
        "database_software_image_id",
        ColumnType::String,
        "The database software image OCID.",
    ),
    ColumnDef::new("db_home_location", ColumnType::String, "The location of the oracle database home."),
    ColumnDef::new("db_version", ColumnType::String, "The oracle database version."),
    ColumnDef::new(
        "kms_key_id",
        ColumnType::String,
        "The OCID of the key container that is used as the master encryption key in database transparent data encryption (TDE) operations.",
    ),
    ColumnDef::new(
        "last_patch_history_entry_id",
        ColumnType::String,
        "The OCID of the last patch history.",
    ),
    ColumnDef::new(
        "lifecycle_details",
        ColumnType::String,
        "Additional information about the current lifecycle state.",
    ),
    ColumnDef::new("vm_cluster_id", ColumnType::String, "The OCID of the VM cluster."),
    ColumnDef::new("one_off_patches", ColumnType::Json, "List of one-off patches for database homes."),
    common::DEFINED_TAGS,
    common::FREEFORM_TAGS,
    common::TAGS,
    common::TITLE,
    common::REGION,
    common::COMPARTMENT_ID,
    common::TENANT_ID,
];

pub struct DbHomeTable;

/// List request carrying the supported, non-empty quals
pub fn build_db_home_filters(quals: &Quals) -> ListDbHomesRequest {
    ListDbHomesRequest {
        db_system_id: quals.non_empty("db_system_id"),
        db_version: quals.non_empty("db_version"),
        display_name: quals.non_empty("display_name"),
        lifecycle_state: quals.non_empty("lifecycle_state"),
        vm_cluster_id: quals.non_empty("vm_cluster_id"),
        ..Default::default()
    }
}

pub async fn get_db_home_details(
    client: &OciClient,
    scope: &Scope,
    key: DetailKey<'_>,
) -> Result<Option<DbHome>> {
    tracing::debug!(region = %scope.region, compartment = %scope.compartment, "getDatabaseDBHome");
    fetch_detail(key, scope, |id| client.get_db_home(&scope.region, id)).await
}

async fn db_home_row(client: &OciClient, scope: &Scope, ctx: &QueryContext, home: DbHome) -> Result<Row> {
    let source = RowSource {
        list: serde_json::to_value(&home).context("Failed to encode db home")?,
        tags: tags_of(&home),
        title: home.display_name.clone(),
        region: common::resource_region(&home.id, &scope.region),
        tenant_id: client.tenant_id().await,
        ..Default::default()
    };
    Ok(render_row(COLUMNS, ctx, &source))
}

#[async_trait]
impl Table for DbHomeTable {
    fn name(&self) -> &'static str {
        TABLE_NAME
    }

    fn description(&self) -> &'static str {
        "OCI Database DB Home"
    }

    fn columns(&self) -> &'static [ColumnDef] {
        COLUMNS
    }

    fn pushdown_columns(&self) -> &'static [&'static str] {
        PUSHDOWN_COLUMNS
    }

    fn get_key(&self) -> Option<&'static str> {
        Some("id")
    }

    fn list<'a>(
        &'a self,
        client: &'a OciClient,
        scope: &'a Scope,
        ctx: &'a QueryContext,
    ) -> BoxStream<'a, Result<Row>> {
        if !compartment_matches(&ctx.quals, scope) {
            return stream::empty().boxed();
        }

        tracing::debug!(region = %scope.region, compartment = %scope.compartment, "listDatabaseDBHomes");

        let mut request = build_db_home_filters(&ctx.quals);
        request.compartment_id = scope.compartment.clone();
        request.limit = Some(page_size(ctx.limit));

        paginate(ctx.limit, move |page| {
            let request = ListDbHomesRequest {
                page,
                ..request.clone()
            };
            async move { client.list_db_homes(&scope.region, &request).await }
        })
        .and_then(move |home| db_home_row(client, scope, ctx, home))
        .boxed()
    }

    async fn get(&self, client: &OciClient, scope: &Scope, ctx: &QueryContext) -> Result<Option<Row>> {
        let id = ctx.quals.get("id").unwrap_or_default();
        match get_db_home_details(client, scope, DetailKey::Lookup(id)).await? {
            Some(home) => db_home_row(client, scope, ctx, home).await.map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_trim_and_ignore() {
        let quals = Quals::new()
            .with("db_system_id", "ocid1.dbsystem.oc1.iad.x")
            .with("db_version", "")
            .with("vm_cluster_id", "   ")
            .with("kms_key_id", "ocid1.key.oc1..k");
        let request = build_db_home_filters(&quals);

        assert_eq!(request.db_system_id.as_deref(), Some("ocid1.dbsystem.oc1.iad.x"));
        assert_eq!(request.db_version, None);
        assert_eq!(request.vm_cluster_id, None);
        assert_eq!(request.display_name, None);
        assert_eq!(request.lifecycle_state, None);
    }

    #[test]
    fn test_every_pushdown_column_is_in_schema() {
        for column in PUSHDOWN_COLUMNS {
            assert!(COLUMNS.iter().any(|c| c.name == *column), "{column} missing");
        }
    }
}
