//! oci_container_instances_container_instance

use super::common;
use super::fetcher::{compartment_matches, fetch_detail, page_size, paginate, DetailKey};
use super::filter::Quals;
use super::transform::tags_of;
use super::{render_row, ColumnDef, ColumnType, Hydrate, QueryContext, Row, RowSource, Table, Transform};
use crate::oci::client::OciClient;
use crate::oci::container_instances::{
    Container, ContainerInstance, ContainerInstanceSummary, ListContainerInstancesRequest,
};
use crate::oci::http::is_not_found;
use crate::oci::identity::Scope;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};

pub const TABLE_NAME: &str = "oci_container_instances_container_instance";

const PUSHDOWN_COLUMNS: &[&str] = &["display_name", "lifecycle_state", "availability_domain"];

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("display_name", ColumnType::String, "The name of the container instance."),
    ColumnDef::new("id", ColumnType::String, "The OCID of the container instance."),
    ColumnDef::new(
        "availability_domain",
        ColumnType::String,
        "Availability Domain where the ContainerInstance is running.",
    ),
    ColumnDef::new(
        "shape",
        ColumnType::String,
        "The shape of the Container Instance. The shape determines the resources available to the Container Instance.",
    ),
    ColumnDef::new("ocpus", ColumnType::Double, "The total number of OCPUs available to the instance.")
        .transform(Transform::Path("shapeConfig.ocpus")),
    ColumnDef::new(
        "memory_in_gbs",
        ColumnType::Double,
        "The total amount of memory available to the instance, in gigabytes.",
    )
    .transform(Transform::Path("shapeConfig.memoryInGBs")),
    ColumnDef::new(
        "processor_description",
        ColumnType::String,
        "A short description of the instance's processor (CPU).",
    )
    .transform(Transform::Path("shapeConfig.processorDescription")),
    ColumnDef::new(
        "networking_bandwidth_in_gbps",
        ColumnType::Double,
        "The networking bandwidth available to the instance, in gigabits per second.",
    )
    .hydrate(Hydrate::Details)
    .transform(Transform::Path("shapeConfig.networkingBandwidthInGbps")),
    ColumnDef::new("container_count", ColumnType::Int, "The number of containers running on the instance."),
    ColumnDef::new(
        "containers",
        ColumnType::Json,
        "Details on all containers in the instance - such as image, restart attempts, working directory.",
    )
    .hydrate(Hydrate::Children)
    .transform(Transform::Whole),
    ColumnDef::new("container_restart_policy", ColumnType::String, "Container Restart Policy."),
    ColumnDef::new(
        "fault_domain",
        ColumnType::String,
        "Fault Domain where the ContainerInstance is running.",
    ),
    ColumnDef::new("lifecycle_state", ColumnType::String, "The current state of the Container Instance."),
    ColumnDef::new(
        "time_created",
        ColumnType::Timestamp,
        "The date and time the Container Instance was created.",
    ),
    ColumnDef::new(
        "time_updated",
        ColumnType::Timestamp,
        "The date and time the Container Instance was last modified.",
    ),
    ColumnDef::new(
        "graceful_shutdown_timeout_in_seconds",
        ColumnType::Int,
        "Time in seconds the containers are given to stop gracefully.",
    ),
    ColumnDef::new("volume_count", ColumnType::Int, "The number of volumes that attached to this Instance."),
    ColumnDef::new("vnics", ColumnType::Json, "The networks available to containers on this Instance.")
        .hydrate(Hydrate::Details),
    ColumnDef::new("volumes", ColumnType::Json, "The volumes mounted into containers on this Instance.")
        .hydrate(Hydrate::Details),
    common::DEFINED_TAGS,
    common::FREEFORM_TAGS,
    common::TAGS,
    common::TITLE,
    common::REGION,
    common::COMPARTMENT_ID,
    common::TENANT_ID,
];

pub struct ContainerInstanceTable;

/// List request carrying the supported, non-empty quals
pub fn build_container_instance_filters(quals: &Quals) -> ListContainerInstancesRequest {
    ListContainerInstancesRequest {
        display_name: quals.non_empty("display_name"),
        lifecycle_state: quals.non_empty("lifecycle_state"),
        availability_domain: quals.non_empty("availability_domain"),
        ..Default::default()
    }
}

pub async fn get_container_instance_details(
    client: &OciClient,
    scope: &Scope,
    key: DetailKey<'_>,
) -> Result<Option<ContainerInstance>> {
    tracing::debug!(
        region = %scope.region,
        compartment = %scope.compartment,
        "getContainerInstance"
    );
    fetch_detail(key, scope, |id| client.get_container_instance(&scope.region, id)).await
}

/// Fetch every container of an instance, in the instance's order.
///
/// Containers deleted since the instance was read are skipped.
pub async fn hydrate_containers(
    client: &OciClient,
    scope: &Scope,
    instance: &ContainerInstance,
) -> Result<Vec<Container>> {
    let mut containers = Vec::with_capacity(instance.containers.len());

    for reference in &instance.containers {
        if reference.container_id.is_empty() {
            continue;
        }
        match client.get_container(&scope.region, &reference.container_id).await {
            Ok(container) => containers.push(container),
            Err(e) if is_not_found(&e) => {
                tracing::warn!(
                    "Container {} of {} not found, skipping",
                    reference.container_id,
                    instance.id
                );
            }
            Err(e) => {
                tracing::error!("getContainer failed for {}: {}", reference.container_id, e);
                return Err(e);
            }
        }
    }

    Ok(containers)
}

async fn container_instance_row(
    client: &OciClient,
    scope: &Scope,
    ctx: &QueryContext,
    summary: ContainerInstanceSummary,
    details: Option<ContainerInstance>,
) -> Result<Row> {
    let containers = match &details {
        Some(instance) if ctx.needs(COLUMNS, Hydrate::Children) => {
            Some(hydrate_containers(client, scope, instance).await?)
        }
        _ => None,
    };

    let source = RowSource {
        list: serde_json::to_value(&summary).context("Failed to encode container instance")?,
        details: details
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .context("Failed to encode container instance details")?,
        children: containers
            .map(|c| serde_json::to_value(&c))
            .transpose()
            .context("Failed to encode containers")?,
        tags: tags_of(&summary),
        title: summary.display_name.clone(),
        region: common::resource_region(&summary.id, &scope.region),
        tenant_id: client.tenant_id().await,
    };
    Ok(render_row(COLUMNS, ctx, &source))
}

#[async_trait]
impl Table for ContainerInstanceTable {
    fn name(&self) -> &'static str {
        TABLE_NAME
    }

    fn description(&self) -> &'static str {
        "OCI Container Instances Container Instance"
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

        tracing::debug!(
            region = %scope.region,
            compartment = %scope.compartment,
            "listContainerInstances"
        );

        let mut request = build_container_instance_filters(&ctx.quals);
        request.compartment_id = scope.compartment.clone();
        request.limit = Some(page_size(ctx.limit));

        paginate(ctx.limit, move |page| {
            let request = ListContainerInstancesRequest {
                page,
                ..request.clone()
            };
            async move { client.list_container_instances(&scope.region, &request).await }
        })
        .and_then(move |summary| async move {
            let wants_details =
                ctx.needs(COLUMNS, Hydrate::Details) || ctx.needs(COLUMNS, Hydrate::Children);
            let details = if wants_details {
                get_container_instance_details(client, scope, DetailKey::Item(&summary.id)).await?
            } else {
                None
            };
            container_instance_row(client, scope, ctx, summary, details).await
        })
        .boxed()
    }

    async fn get(&self, client: &OciClient, scope: &Scope, ctx: &QueryContext) -> Result<Option<Row>> {
        let id = ctx.quals.get("id").unwrap_or_default();
        let Some(details) = get_container_instance_details(client, scope, DetailKey::Lookup(id)).await?
        else {
            return Ok(None);
        };
        let summary = ContainerInstanceSummary::from(&details);
        container_instance_row(client, scope, ctx, summary, Some(details))
            .await
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_only_supported_non_empty() {
        let quals = Quals::new()
            .with("display_name", "web")
            .with("lifecycle_state", " ")
            .with("shape", "CI.Standard.E4.Flex")
            .with("compartment_id", "ocid1.compartment.oc1..c");
        let request = build_container_instance_filters(&quals);

        assert_eq!(request.display_name.as_deref(), Some("web"));
        assert_eq!(request.lifecycle_state, None);
        assert_eq!(request.availability_domain, None);
        assert!(request.compartment_id.is_empty());
        assert_eq!(request.limit, None);
    }

    #[test]
    fn test_schema_order() {
        let names: Vec<&str> = COLUMNS.iter().map(|c| c.name).collect();
        assert_eq!(names.first(), Some(&"display_name"));
        assert_eq!(names.last(), Some(&"tenant_id"));
        assert!(PUSHDOWN_COLUMNS.iter().all(|p| names.contains(p)));
    }
}
