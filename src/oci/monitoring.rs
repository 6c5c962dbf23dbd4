//! Monitoring service models and calls

use super::client::{OciClient, Service};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of `SummarizeMetricsData`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeMetricsDataDetails {
    pub namespace: String,
    pub query: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedDatapoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// One aggregated series returned by `SummarizeMetricsData`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricData {
    pub namespace: String,
    pub compartment_id: String,
    pub name: String,
    pub dimensions: BTreeMap<String, String>,
    pub metadata: BTreeMap<String, String>,
    pub resolution: Option<String>,
    pub aggregated_datapoints: Vec<AggregatedDatapoint>,
}

impl MetricData {
    pub fn unit(&self) -> Option<&str> {
        self.metadata.get("unit").map(|s| s.as_str())
    }
}

impl OciClient {
    pub async fn summarize_metrics_data(
        &self,
        region: &str,
        compartment_id: &str,
        details: &SummarizeMetricsDataDetails,
    ) -> Result<Vec<MetricData>> {
        let body = serde_json::to_value(details).context("Failed to encode metrics query")?;
        let response = self
            .post(
                Service::Monitoring,
                region,
                "metrics/actions/summarizeMetricsData",
                &[("compartmentId", compartment_id.to_string())],
                &body,
            )
            .await?;
        if response.body.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(response.body).context("Failed to decode metric data")
    }
}
