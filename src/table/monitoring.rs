//! Monitoring metric statistics shared by the `*_metric_*` tables
//!
//! A metric table lists its parent resources per scope and, for every parent,
//! reads one aggregated series per statistic from the Monitoring service. The
//! series are merged on their timestamps into one row per data point.

use super::common;
use super::transform::{tags_of, HasTags};
use super::{render_row, ColumnDef, ColumnType, QueryContext, Row, RowSource, Transform};
use crate::oci::client::OciClient;
use crate::oci::monitoring::{MetricData, SummarizeMetricsDataDetails};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Aggregation window of a metric table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    FiveMinutes,
    Hourly,
    Daily,
}

impl Granularity {
    /// Interval in MQL syntax
    pub fn interval(&self) -> &'static str {
        match self {
            Granularity::FiveMinutes => "5m",
            Granularity::Hourly => "1h",
            Granularity::Daily => "1d",
        }
    }

    /// How far back the series is read
    pub fn lookback(&self) -> Duration {
        match self {
            Granularity::FiveMinutes => Duration::days(5),
            Granularity::Hourly => Duration::days(60),
            Granularity::Daily => Duration::days(365),
        }
    }
}

/// MQL statistic functions, one request each
const STATISTICS: &[&str] = &["max", "min", "sum", "mean", "count"];

pub const METRIC_COLUMNS: [ColumnDef; 14] = [
    ColumnDef::new("metric_name", ColumnType::String, "The name of the metric."),
    ColumnDef::new("namespace", ColumnType::String, "The metric namespace."),
    ColumnDef::new("dimension_name", ColumnType::String, "The name of the metric dimension."),
    ColumnDef::new("dimension_value", ColumnType::String, "The value of the metric dimension."),
    ColumnDef::new(
        "average",
        ColumnType::Double,
        "The average of the metric values that correspond to the data point.",
    ),
    ColumnDef::new("maximum", ColumnType::Double, "The maximum metric value for the data point."),
    ColumnDef::new("minimum", ColumnType::Double, "The minimum metric value for the data point."),
    ColumnDef::new(
        "sample_count",
        ColumnType::Double,
        "The number of metric values that contributed to the aggregate value of this data point.",
    ),
    ColumnDef::new("sum", ColumnType::Double, "The sum of the metric values for the data point."),
    ColumnDef::new("unit", ColumnType::String, "The standard unit for the data point."),
    ColumnDef::new("timestamp", ColumnType::Timestamp, "The time stamp used for the data point."),
    ColumnDef::new("region", ColumnType::String, common::REGION_DESCRIPTION),
    common::COMPARTMENT_ID,
    common::TENANT_ID,
];

/// Table-specific columns followed by the shared metric columns
pub const fn metric_columns<const N: usize, const M: usize>(extra: [ColumnDef; N]) -> [ColumnDef; M] {
    assert!(M == N + METRIC_COLUMNS.len());
    let mut columns = [METRIC_COLUMNS[0]; M];
    let mut i = 0;
    while i < N {
        columns[i] = extra[i];
        i += 1;
    }
    let mut j = 0;
    while j < METRIC_COLUMNS.len() {
        columns[N + j] = METRIC_COLUMNS[j];
        j += 1;
    }
    columns
}

/// Dimension value column of a metric table
pub const fn dimension_column(name: &'static str, description: &'static str) -> ColumnDef {
    ColumnDef::new(name, ColumnType::String, description).transform(Transform::Path("dimensionValue"))
}

/// One series request: a metric of one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQuery<'a> {
    pub granularity: Granularity,
    pub namespace: &'a str,
    pub metric_name: &'a str,
    pub dimension_name: &'a str,
    pub dimension_value: &'a str,
    pub compartment_id: &'a str,
    pub region: &'a str,
}

impl MetricQuery<'_> {
    /// MQL expression for one statistic
    pub fn expression(&self, statistic: &str) -> String {
        format!(
            "{}[{}]{{{} = \"{}\"}}.{}()",
            self.metric_name,
            self.granularity.interval(),
            self.dimension_name,
            self.dimension_value,
            statistic
        )
    }
}

/// One data point with every statistic
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricStatistic {
    pub metric_name: String,
    pub namespace: String,
    pub dimension_name: String,
    pub dimension_value: String,
    pub average: Option<f64>,
    pub maximum: Option<f64>,
    pub minimum: Option<f64>,
    pub sample_count: Option<f64>,
    pub sum: Option<f64>,
    pub unit: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub region: String,
    pub compartment_id: String,
}

impl HasTags for MetricStatistic {}

/// Merge per-statistic series into data points ordered by timestamp
pub fn merge_statistics(
    query: &MetricQuery<'_>,
    series: &[(&str, Vec<MetricData>)],
) -> Vec<MetricStatistic> {
    let mut points: BTreeMap<DateTime<Utc>, MetricStatistic> = BTreeMap::new();

    for (statistic, data) in series {
        for metric in data {
            for datapoint in &metric.aggregated_datapoints {
                let point = points.entry(datapoint.timestamp).or_insert_with(|| MetricStatistic {
                    metric_name: query.metric_name.to_string(),
                    namespace: query.namespace.to_string(),
                    dimension_name: query.dimension_name.to_string(),
                    dimension_value: query.dimension_value.to_string(),
                    timestamp: Some(datapoint.timestamp),
                    region: query.region.to_string(),
                    compartment_id: query.compartment_id.to_string(),
                    ..Default::default()
                });
                if point.unit.is_none() {
                    point.unit = metric.unit().map(|u| u.to_string());
                }
                let value = Some(datapoint.value);
                match *statistic {
                    "max" => point.maximum = value,
                    "min" => point.minimum = value,
                    "sum" => point.sum = value,
                    "mean" => point.average = value,
                    "count" => point.sample_count = value,
                    _ => {}
                }
            }
        }
    }

    points.into_values().collect()
}

/// Read every statistic of one series, sequentially
pub async fn list_metric_statistics(
    client: &OciClient,
    query: &MetricQuery<'_>,
) -> Result<Vec<MetricStatistic>> {
    tracing::debug!(
        region = %query.region,
        compartment = %query.compartment_id,
        "listMonitoringMetricStatistics {} {}",
        query.metric_name,
        query.dimension_value
    );

    let end_time = Utc::now();
    let start_time = end_time - query.granularity.lookback();

    let mut series = Vec::with_capacity(STATISTICS.len());
    for statistic in STATISTICS {
        let details = SummarizeMetricsDataDetails {
            namespace: query.namespace.to_string(),
            query: query.expression(statistic),
            start_time,
            end_time,
            resolution: Some(query.granularity.interval().to_string()),
        };
        let data = client
            .summarize_metrics_data(query.region, query.compartment_id, &details)
            .await?;
        series.push((*statistic, data));
    }

    Ok(merge_statistics(query, &series))
}

/// Rows of one series, rendered against a metric table's columns
pub async fn metric_rows(
    client: &OciClient,
    ctx: &QueryContext,
    columns: &[ColumnDef],
    query: &MetricQuery<'_>,
) -> Result<Vec<Row>> {
    let statistics = list_metric_statistics(client, query).await?;
    let tenant_id = client.tenant_id().await;

    statistics
        .iter()
        .map(|statistic| {
            let source = RowSource {
                list: serde_json::to_value(statistic).context("Failed to encode metric statistic")?,
                tags: tags_of(statistic),
                region: statistic.region.clone(),
                tenant_id,
                ..Default::default()
            };
            Ok(render_row(columns, ctx, &source))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oci::monitoring::AggregatedDatapoint;
    use chrono::TimeZone;

    fn query() -> MetricQuery<'static> {
        MetricQuery {
            granularity: Granularity::Daily,
            namespace: "oci_autonomous_database",
            metric_name: "CpuUtilization",
            dimension_name: "resourceId",
            dimension_value: "ocid1.autonomousdatabase.oc1.iad.x",
            compartment_id: "ocid1.compartment.oc1..c",
            region: "us-ashburn-1",
        }
    }

    fn series(points: &[(i64, f64)]) -> Vec<MetricData> {
        vec![MetricData {
            metadata: BTreeMap::from([("unit".to_string(), "percent".to_string())]),
            aggregated_datapoints: points
                .iter()
                .map(|(day, value)| AggregatedDatapoint {
                    timestamp: Utc.with_ymd_and_hms(2024, 1, *day as u32, 0, 0, 0).unwrap(),
                    value: *value,
                })
                .collect(),
            ..Default::default()
        }]
    }

    #[test]
    fn test_granularity_windows() {
        assert_eq!(Granularity::FiveMinutes.interval(), "5m");
        assert_eq!(Granularity::Hourly.lookback(), Duration::days(60));
        assert_eq!(Granularity::Daily.lookback(), Duration::days(365));
    }

    #[test]
    fn test_expression() {
        assert_eq!(
            query().expression("mean"),
            "CpuUtilization[1d]{resourceId = \"ocid1.autonomousdatabase.oc1.iad.x\"}.mean()"
        );
    }

    #[test]
    fn test_merge_by_timestamp() {
        let merged = merge_statistics(
            &query(),
            &[
                ("max", series(&[(2, 90.0), (1, 80.0)])),
                ("mean", series(&[(1, 40.0), (2, 45.0)])),
                ("count", series(&[(2, 24.0)])),
            ],
        );

        assert_eq!(merged.len(), 2);
        assert!(merged[0].timestamp < merged[1].timestamp);
        assert_eq!(merged[0].maximum, Some(80.0));
        assert_eq!(merged[0].average, Some(40.0));
        assert_eq!(merged[0].sample_count, None);
        assert_eq!(merged[1].sample_count, Some(24.0));
        assert_eq!(merged[1].unit.as_deref(), Some("percent"));
        assert_eq!(merged[1].region, "us-ashburn-1");
    }

    #[test]
    fn test_metric_columns_layout() {
        const COLUMNS: [ColumnDef; 15] = metric_columns([dimension_column("id", "")]);
        assert_eq!(COLUMNS[0].name, "id");
        assert_eq!(COLUMNS[1].name, "metric_name");
        assert_eq!(COLUMNS[14].name, "tenant_id");
    }
}
