//! Container Instances service models and calls

use super::client::{resource_path, OciClient, Service};
use super::{decode_page, push_opt, DefinedTags, FreeformTags, PaginatedResult};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Resources available to a container instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapeConfig {
    pub ocpus: Option<f64>,
    #[serde(rename = "memoryInGBs")]
    pub memory_in_gbs: Option<f64>,
    pub processor_description: Option<String>,
    pub networking_bandwidth_in_gbps: Option<f64>,
}

/// List view of a container instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerInstanceSummary {
    pub id: String,
    pub display_name: Option<String>,
    pub compartment_id: String,
    pub availability_domain: Option<String>,
    pub fault_domain: Option<String>,
    pub lifecycle_state: Option<String>,
    pub time_created: Option<DateTime<Utc>>,
    pub time_updated: Option<DateTime<Utc>>,
    pub shape: Option<String>,
    pub shape_config: Option<ShapeConfig>,
    pub container_count: Option<i64>,
    pub container_restart_policy: Option<String>,
    pub graceful_shutdown_timeout_in_seconds: Option<i64>,
    pub volume_count: Option<i64>,
    pub freeform_tags: Option<FreeformTags>,
    pub defined_tags: Option<DefinedTags>,
}

/// Reference from an instance to one of its containers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerReference {
    pub container_id: String,
    pub display_name: Option<String>,
}

/// Full view of a container instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerInstance {
    pub id: String,
    pub display_name: Option<String>,
    pub compartment_id: String,
    pub availability_domain: Option<String>,
    pub fault_domain: Option<String>,
    pub lifecycle_state: Option<String>,
    pub lifecycle_details: Option<String>,
    pub time_created: Option<DateTime<Utc>>,
    pub time_updated: Option<DateTime<Utc>>,
    pub shape: Option<String>,
    pub shape_config: Option<ShapeConfig>,
    pub container_count: Option<i64>,
    pub containers: Vec<ContainerReference>,
    pub container_restart_policy: Option<String>,
    pub graceful_shutdown_timeout_in_seconds: Option<i64>,
    pub volume_count: Option<i64>,
    pub volumes: Option<Value>,
    pub vnics: Option<Value>,
    pub freeform_tags: Option<FreeformTags>,
    pub defined_tags: Option<DefinedTags>,
}

impl From<&ContainerInstance> for ContainerInstanceSummary {
    fn from(detail: &ContainerInstance) -> Self {
        Self {
            id: detail.id.clone(),
            display_name: detail.display_name.clone(),
            compartment_id: detail.compartment_id.clone(),
            availability_domain: detail.availability_domain.clone(),
            fault_domain: detail.fault_domain.clone(),
            lifecycle_state: detail.lifecycle_state.clone(),
            time_created: detail.time_created,
            time_updated: detail.time_updated,
            shape: detail.shape.clone(),
            shape_config: detail.shape_config.clone(),
            container_count: detail.container_count,
            container_restart_policy: detail.container_restart_policy.clone(),
            graceful_shutdown_timeout_in_seconds: detail.graceful_shutdown_timeout_in_seconds,
            volume_count: detail.volume_count,
            freeform_tags: detail.freeform_tags.clone(),
            defined_tags: detail.defined_tags.clone(),
        }
    }
}

/// Resource limits of a single container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerResourceConfig {
    pub vcpus_limit: Option<f64>,
    #[serde(rename = "memoryLimitInGBs")]
    pub memory_limit_in_gbs: Option<f64>,
}

/// A container running inside a container instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Container {
    pub id: String,
    pub display_name: Option<String>,
    pub image_url: Option<String>,
    pub exit_code: Option<i64>,
    pub working_directory: Option<String>,
    pub container_restart_attempt_count: Option<i64>,
    pub resource_config: Option<ContainerResourceConfig>,
    pub lifecycle_state: Option<String>,
    pub time_terminated: Option<DateTime<Utc>>,
    pub time_created: Option<DateTime<Utc>>,
    pub time_updated: Option<DateTime<Utc>>,
}

/// `ListContainerInstances` parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListContainerInstancesRequest {
    pub compartment_id: String,
    pub availability_domain: Option<String>,
    pub display_name: Option<String>,
    pub lifecycle_state: Option<String>,
    pub limit: Option<u32>,
    pub page: Option<String>,
}

impl ListContainerInstancesRequest {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("compartmentId", self.compartment_id.clone())];
        push_opt(&mut query, "availabilityDomain", &self.availability_domain);
        push_opt(&mut query, "displayName", &self.display_name);
        push_opt(&mut query, "lifecycleState", &self.lifecycle_state);
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        push_opt(&mut query, "page", &self.page);
        query
    }
}

impl OciClient {
    pub async fn list_container_instances(
        &self,
        region: &str,
        request: &ListContainerInstancesRequest,
    ) -> Result<PaginatedResult<ContainerInstanceSummary>> {
        let response = self
            .get(Service::ContainerInstances, region, "containerInstances", &request.query())
            .await?;
        decode_page(response)
    }

    pub async fn get_container_instance(&self, region: &str, id: &str) -> Result<ContainerInstance> {
        let response = self
            .get(
                Service::ContainerInstances,
                region,
                &resource_path("containerInstances", id),
                &[],
            )
            .await?;
        serde_json::from_value(response.body).context("Failed to decode container instance")
    }

    pub async fn get_container(&self, region: &str, id: &str) -> Result<Container> {
        let response = self
            .get(
                Service::ContainerInstances,
                region,
                &resource_path("containers", id),
                &[],
            )
            .await?;
        serde_json::from_value(response.body).context("Failed to decode container")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_query_only_set_fields() {
        let request = ListContainerInstancesRequest {
            compartment_id: "c1".to_string(),
            display_name: Some("web".to_string()),
            limit: Some(50),
            ..Default::default()
        };
        assert_eq!(
            request.query(),
            vec![
                ("compartmentId", "c1".to_string()),
                ("displayName", "web".to_string()),
                ("limit", "50".to_string()),
            ]
        );
    }

    #[test]
    fn test_decode_summary_shape_config() {
        let summary: ContainerInstanceSummary = serde_json::from_value(json!({
            "id": "ocid1.containerinstance.oc1.iad.x",
            "compartmentId": "c1",
            "shapeConfig": {"ocpus": 1.0, "memoryInGBs": 4.0},
            "timeCreated": "2023-03-01T10:00:00.000Z",
            "freeformTags": {"env": "dev"}
        }))
        .unwrap();
        let shape = summary.shape_config.unwrap();
        assert_eq!(shape.memory_in_gbs, Some(4.0));
        assert!(summary.time_created.is_some());
        assert_eq!(summary.freeform_tags.unwrap()["env"], "dev");
    }
}
