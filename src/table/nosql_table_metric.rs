//! oci_nosql_table_metric_write_throttle_count

use super::common::resource_region;
use super::fetcher::{compartment_matches, page_size, paginate};
use super::monitoring::{dimension_column, metric_columns, metric_rows, Granularity, MetricQuery};
use super::{ColumnDef, QueryContext, Row, Table};
use crate::oci::client::OciClient;
use crate::oci::identity::Scope;
use crate::oci::nosql::{ListTablesRequest, TableSummary};
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};

pub const TABLE_NAME: &str = "oci_nosql_table_metric_write_throttle_count";

static COLUMNS: [ColumnDef; 15] = metric_columns([dimension_column("name", "The name of the NoSQL table.")]);

pub struct NoSqlWriteThrottleCountTable;

fn write_throttle_query<'a>(table: &'a TableSummary, scope: &'a Scope, region: &'a str) -> MetricQuery<'a> {
    MetricQuery {
        granularity: Granularity::FiveMinutes,
        namespace: "oci_nosql",
        metric_name: "WriteThrottleCount",
        dimension_name: "tableName",
        dimension_value: &table.name,
        compartment_id: if table.compartment_id.is_empty() {
            &scope.compartment
        } else {
            &table.compartment_id
        },
        region,
    }
}

#[async_trait]
impl Table for NoSqlWriteThrottleCountTable {
    fn name(&self) -> &'static str {
        TABLE_NAME
    }

    fn description(&self) -> &'static str {
        "OCI NoSQL Table Monitoring Metrics - Write Throttle Count"
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

        tracing::debug!(region = %scope.region, compartment = %scope.compartment, "listNoSQLTables");

        let request = ListTablesRequest {
            compartment_id: scope.compartment.clone(),
            limit: Some(page_size(None)),
            page: None,
        };

        paginate(None, move |page| {
            let request = ListTablesRequest {
                page,
                ..request.clone()
            };
            async move { client.list_nosql_tables(&scope.region, &request).await }
        })
        .and_then(move |table| async move {
            let region = resource_region(&table.id, &scope.region);
            metric_rows(client, ctx, &COLUMNS, &write_throttle_query(&table, scope, &region)).await
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
    fn test_query_uses_table_name_dimension() {
        let table = TableSummary {
            id: "ocid1.nosqltable.oc1.iad.x".to_string(),
            name: "orders".to_string(),
            ..Default::default()
        };
        let scope = Scope::new("eu-frankfurt-1", "ocid1.compartment.oc1..c");
        let region = resource_region(&table.id, &scope.region);
        let query = write_throttle_query(&table, &scope, &region);

        assert_eq!(query.region, "us-ashburn-1");
        assert_eq!(query.compartment_id, "ocid1.compartment.oc1..c");
        assert_eq!(
            query.expression("count"),
            "WriteThrottleCount[5m]{tableName = \"orders\"}.count()"
        );
    }
}
