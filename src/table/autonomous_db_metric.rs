//! oci_database_autonomous_db_metric_cpu_utilization_daily

use super::common::resource_region;
use super::fetcher::{compartment_matches, page_size, paginate};
use super::monitoring::{dimension_column, metric_columns, metric_rows, Granularity, MetricQuery};
use super::{ColumnDef, QueryContext, Row, Table};
use crate::oci::client::OciClient;
use crate::oci::database::{AutonomousDatabaseSummary, ListAutonomousDatabasesRequest};
use crate::oci::identity::Scope;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};

pub const TABLE_NAME: &str = "oci_database_autonomous_db_metric_cpu_utilization_daily";

static COLUMNS: [ColumnDef; 15] =
    metric_columns([dimension_column("id", "The OCID of the Autonomous Database.")]);

pub struct AutonomousDbCpuUtilizationDailyTable;

fn cpu_utilization_query<'a>(database: &'a AutonomousDatabaseSummary, scope: &'a Scope, region: &'a str) -> MetricQuery<'a> {
    MetricQuery {
        granularity: Granularity::Daily,
        namespace: "oci_autonomous_database",
        metric_name: "CpuUtilization",
        dimension_name: "resourceId",
        dimension_value: &database.id,
        compartment_id: if database.compartment_id.is_empty() {
            &scope.compartment
        } else {
            &database.compartment_id
        },
        region,
    }
}

#[async_trait]
impl Table for AutonomousDbCpuUtilizationDailyTable {
    fn name(&self) -> &'static str {
        TABLE_NAME
    }

    fn description(&self) -> &'static str {
        "OCI Autonomous Database Monitoring Metrics - CPU Utilization (Daily)"
    }

    fn columns(&self) -> &'static [ColumnDef] {
        &COLUMNS
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

        tracing::debug!(region = %scope.region, compartment = %scope.compartment, "listAutonomousDatabases");

        let request = ListAutonomousDatabasesRequest {
            compartment_id: scope.compartment.clone(),
            limit: Some(page_size(None)),
            page: None,
        };

        // The row budget counts data points, not databases
        paginate(None, move |page| {
            let request = ListAutonomousDatabasesRequest {
                page,
                ..request.clone()
            };
            async move { client.list_autonomous_databases(&scope.region, &request).await }
        })
        .and_then(move |database| async move {
            let region = resource_region(&database.id, &scope.region);
            let query = cpu_utilization_query(&database, scope, &region);
            metric_rows(client, ctx, &COLUMNS, &query).await
        })
        .map_ok(|rows| stream::iter(rows.into_iter().map(Ok)))
        .try_flatten()
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_uses_parent_compartment_and_id() {
        let database = AutonomousDatabaseSummary {
            id: "ocid1.autonomousdatabase.oc1.phx.x".to_string(),
            compartment_id: "ocid1.compartment.oc1..db".to_string(),
            ..Default::default()
        };
        let scope = Scope::new("us-ashburn-1", "ocid1.tenancy.oc1..t");
        let region = resource_region(&database.id, &scope.region);
        let query = cpu_utilization_query(&database, &scope, &region);

        assert_eq!(query.region, "us-phoenix-1");
        assert_eq!(query.compartment_id, "ocid1.compartment.oc1..db");
        assert_eq!(
            query.expression("max"),
            "CpuUtilization[1d]{resourceId = \"ocid1.autonomousdatabase.oc1.phx.x\"}.max()"
        );
    }

    #[test]
    fn test_columns_start_with_id() {
        assert_eq!(COLUMNS[0].name, "id");
        assert_eq!(COLUMNS[1].name, "metric_name");
    }
}
