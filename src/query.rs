//! Query executor
//!
//! Runs one equality-filtered query over a table across the compartment x
//! region matrix: point lookups in each region's tenancy root when the get key
//! is given, otherwise merged per-scope listings, followed by qual
//! post-filtering and projection.

use crate::oci::client::OciClient;
use crate::oci::identity::Scope;
use crate::table::{get_table, ColumnType, Quals, QueryContext, Row, Table};
use anyhow::{bail, Result};
use chrono::{DateTime, FixedOffset};
use futures::future;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde_json::Value;

/// Qual every lister handles itself
const COMPARTMENT_COLUMN: &str = "compartment_id";

#[derive(Debug, Clone, Default)]
pub struct Query {
    pub table: String,
    pub quals: Quals,
    /// Requested columns; empty means all
    pub columns: Vec<String>,
    pub limit: Option<u64>,
}

/// Columns to return: the requested ones plus every qual column, in schema order
fn projection(table: &dyn Table, query: &Query) -> Result<Vec<&'static str>> {
    for column in query.columns.iter().map(|c| c.as_str()).chain(query.quals.columns()) {
        if table.column(column).is_none() {
            bail!("Unknown column '{}' for table {}", column, table.name());
        }
    }

    Ok(table
        .columns()
        .iter()
        .map(|c| c.name)
        .filter(|name| {
            query.columns.is_empty()
                || query.columns.iter().any(|c| c == name)
                || query.quals.get(name).is_some()
        })
        .collect())
}

/// True when the lister applies every qual, so the row budget can go down with it
fn quals_pushed_down(table: &dyn Table, quals: &Quals) -> bool {
    quals
        .columns()
        .all(|c| c == COMPARTMENT_COLUMN || table.pushdown_columns().iter().any(|p| *p == c))
}

fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok()
}

/// Equality between a row value and a qual, compared as the column's type
fn value_matches(kind: ColumnType, value: Option<&Value>, expected: &str) -> bool {
    let value = match value {
        Some(Value::Null) | None => return false,
        Some(value) => value,
    };
    let typed = match (kind, value) {
        (ColumnType::Int | ColumnType::Double, Value::Number(n)) => n
            .as_f64()
            .zip(expected.trim().parse::<f64>().ok())
            .map(|(actual, wanted)| actual == wanted),
        (ColumnType::Bool, Value::Bool(b)) => expected.trim().parse::<bool>().ok().map(|w| w == *b),
        (ColumnType::Timestamp, Value::String(s)) => parse_timestamp(s)
            .zip(parse_timestamp(expected.trim()))
            .map(|(actual, wanted)| actual == wanted),
        _ => None,
    };
    typed.unwrap_or_else(|| match value {
        Value::String(s) => s == expected,
        other => other.to_string() == expected,
    })
}

fn matches_quals(table: &dyn Table, row: &Row, quals: &Quals) -> bool {
    quals.iter().all(|(column, expected)| {
        let kind = table.column(column).map_or(ColumnType::String, |c| c.kind);
        value_matches(kind, row.get(column), expected)
    })
}

/// Point lookups run once per region, in the tenancy root
fn lookup_scopes(client: &OciClient, matrix: &[Scope]) -> Vec<Scope> {
    let mut scopes: Vec<Scope> = Vec::new();
    for scope in matrix {
        if !scopes.iter().any(|s| s.region == scope.region) {
            scopes.push(Scope::new(&scope.region, &client.tenancy));
        }
    }
    scopes
}

/// Compartments a looked-up row must live in; `None` when the matrix holds the root
fn lookup_compartments(matrix: &[Scope]) -> Option<Vec<&str>> {
    if matrix.iter().any(Scope::is_root) {
        return None;
    }
    let mut compartments: Vec<&str> = matrix.iter().map(|s| s.compartment.as_str()).collect();
    compartments.sort_unstable();
    compartments.dedup();
    Some(compartments)
}

fn in_compartments(row: &Row, compartments: Option<&[&str]>) -> bool {
    compartments.map_or(true, |allowed| {
        row.get(COMPARTMENT_COLUMN)
            .and_then(Value::as_str)
            .is_some_and(|c| allowed.contains(&c))
    })
}

fn project(mut row: Row, columns: &[&str]) -> Row {
    columns
        .iter()
        .map(|c| (c.to_string(), row.remove(*c).unwrap_or(Value::Null)))
        .collect()
}

/// Run `query` over every scope of `matrix`
pub async fn execute(
    client: &OciClient,
    matrix: &[Scope],
    query: &Query,
    concurrency: usize,
) -> Result<Vec<Row>> {
    let Some(table) = get_table(&query.table) else {
        bail!("Unknown table: {}", query.table);
    };
    let columns = projection(table, query)?;
    let concurrency = concurrency.max(1);

    let get_mode = table
        .get_key()
        .is_some_and(|key| query.quals.get(key).is_some());

    let lookups = if get_mode {
        lookup_scopes(client, matrix)
    } else {
        Vec::new()
    };
    let compartments = if get_mode {
        lookup_compartments(matrix)
    } else {
        None
    };

    let mut ctx = QueryContext {
        quals: query.quals.clone(),
        columns: columns.iter().map(|c| c.to_string()).collect(),
        limit: query.limit.filter(|_| quals_pushed_down(table, &query.quals)),
    };
    if compartments.is_some() && !ctx.wants(COMPARTMENT_COLUMN) {
        ctx.columns.push(COMPARTMENT_COLUMN.to_string());
    }

    tracing::debug!(
        "Query {}: {} scopes, get_mode={}, pushed limit={:?}",
        table.name(),
        if get_mode { lookups.len() } else { matrix.len() },
        get_mode,
        ctx.limit
    );

    let rows: BoxStream<'_, Result<Row>> = if get_mode {
        stream::iter(&lookups)
            .map(|scope| table.get(client, scope, &ctx))
            .buffer_unordered(concurrency)
            .try_filter_map(|row| future::ready(Ok(row)))
            .boxed()
    } else {
        stream::iter(matrix)
            .map(|scope| table.list(client, scope, &ctx))
            .flatten_unordered(concurrency)
            .boxed()
    };

    let limit = query.limit.map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

    rows.try_filter(|row| {
        future::ready(
            in_compartments(row, compartments.as_deref())
                && matches_quals(table, row, &ctx.quals),
        )
    })
    .map_ok(|row| project(row, &columns))
    .take(limit)
    .try_collect()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn db_home() -> &'static dyn Table {
        get_table("oci_database_db_home").unwrap()
    }

    #[test]
    fn test_projection_adds_qual_columns_in_schema_order() {
        let query = Query {
            table: "oci_database_db_home".to_string(),
            quals: Quals::new().with("lifecycle_state", "AVAILABLE"),
            columns: vec!["id".to_string(), "display_name".to_string()],
            limit: None,
        };
        assert_eq!(
            projection(db_home(), &query).unwrap(),
            vec!["display_name", "id", "lifecycle_state"]
        );
    }

    #[test]
    fn test_projection_rejects_unknown_column() {
        let query = Query {
            table: "oci_database_db_home".to_string(),
            columns: vec!["shape".to_string()],
            ..Default::default()
        };
        assert!(projection(db_home(), &query).is_err());
    }

    #[test]
    fn test_limit_pushdown_requires_handled_quals() {
        assert!(quals_pushed_down(db_home(), &Quals::new()));
        assert!(quals_pushed_down(
            db_home(),
            &Quals::new().with("compartment_id", "c").with("db_version", "19c")
        ));
        assert!(!quals_pushed_down(db_home(), &Quals::new().with("kms_key_id", "k")));
    }

    #[test]
    fn test_value_matches() {
        assert!(value_matches(ColumnType::String, Some(&json!("ACTIVE")), "ACTIVE"));
        assert!(value_matches(ColumnType::Int, Some(&json!(3)), "3"));
        assert!(!value_matches(ColumnType::String, Some(&Value::Null), ""));
        assert!(!value_matches(ColumnType::String, None, "x"));
    }

    #[test]
    fn test_value_matches_by_column_type() {
        assert!(value_matches(ColumnType::Double, Some(&json!(2.0)), "2"));
        assert!(value_matches(ColumnType::Double, Some(&json!(1.5)), "1.50"));
        assert!(!value_matches(ColumnType::Double, Some(&json!(2.0)), "3"));
        assert!(value_matches(ColumnType::Bool, Some(&json!(true)), "true"));
        assert!(value_matches(
            ColumnType::Timestamp,
            Some(&json!("2023-03-01T10:00:00Z")),
            "2023-03-01T10:00:00.000Z"
        ));
        assert!(value_matches(
            ColumnType::Timestamp,
            Some(&json!("2023-03-01T10:00:00Z")),
            "2023-03-01T11:00:00+01:00"
        ));
        // unparsable input falls back to text comparison
        assert!(!value_matches(ColumnType::Double, Some(&json!(2.0)), "two"));
        assert!(value_matches(ColumnType::Timestamp, Some(&json!("soon")), "soon"));
    }

    #[test]
    fn test_lookup_compartments() {
        let tenancy = "ocid1.tenancy.oc1..t";
        let matrix = vec![
            Scope::new("us-ashburn-1", "ocid1.compartment.oc1..b"),
            Scope::new("us-phoenix-1", "ocid1.compartment.oc1..b"),
            Scope::new("us-ashburn-1", "ocid1.compartment.oc1..a"),
        ];
        assert_eq!(
            lookup_compartments(&matrix),
            Some(vec!["ocid1.compartment.oc1..a", "ocid1.compartment.oc1..b"])
        );
        assert_eq!(lookup_compartments(&[Scope::new("us-ashburn-1", tenancy)]), None);

        let mut row = Row::new();
        row.insert("compartment_id".to_string(), json!("ocid1.compartment.oc1..a"));
        assert!(in_compartments(&row, Some(&["ocid1.compartment.oc1..a"][..])));
        assert!(!in_compartments(&row, Some(&["ocid1.compartment.oc1..b"][..])));
        assert!(in_compartments(&row, None));
    }

    #[test]
    fn test_project_fills_missing() {
        let mut row = Row::new();
        row.insert("id".to_string(), json!("x"));
        row.insert("extra".to_string(), json!(1));
        let projected = project(row, &["id", "title"]);
        assert_eq!(projected.len(), 2);
        assert_eq!(projected["title"], Value::Null);
    }

    #[tokio::test]
    async fn test_unknown_table() {
        struct NoSigner;
        impl crate::oci::auth::RequestSigner for NoSigner {
            fn sign(&self, _request: &mut reqwest::Request) -> Result<()> {
                Ok(())
            }
        }
        let client = OciClient::with_signer(
            std::sync::Arc::new(NoSigner),
            "ocid1.tenancy.oc1..t",
            Default::default(),
        )
        .unwrap();
        let query = Query {
            table: "oci_missing".to_string(),
            ..Default::default()
        };
        assert!(execute(&client, &[], &query, 4).await.is_err());
    }
}
