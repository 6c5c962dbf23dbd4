//! Table abstraction layer
//!
//! Every OCI resource type is exposed as a table: an ordered column schema,
//! a paginated listing per `(region, compartment)` scope, an optional point
//! lookup by id and dependent hydrates that enrich the listed record.
//!
//! # Architecture
//!
//! - [`registry`] - Static table registry and lookup by name
//! - [`fetcher`] - Forward pagination and detail lookups shared by all tables
//! - [`filter`] - Equality predicates and pushdown request builders
//! - [`transform`] - Tag merge and value extraction applied to rows
//! - [`common`] - Standard column definitions
//! - one module per table
//!
//! # Example
//!
//! ```ignore
//! use toci::table::{get_table, QueryContext};
//!
//! async fn list_homes(client: &OciClient, scope: &Scope) -> anyhow::Result<Vec<Row>> {
//!     let table = get_table("oci_database_db_home").unwrap();
//!     table.list(client, scope, &QueryContext::default()).try_collect().await
//! }
//! ```

pub mod autonomous_db_metric;
pub mod common;
pub mod container_instance;
pub mod db_home;
pub mod fetcher;
pub mod filter;
pub mod monitoring;
pub mod nosql_table_metric;
mod registry;
pub mod transform;

pub use filter::Quals;
pub use registry::*;

use crate::oci::client::OciClient;
use crate::oci::identity::Scope;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;
use serde_json::{Map, Value};

/// One output row: column name -> value, in schema order
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Int,
    Double,
    Bool,
    Timestamp,
    Json,
}

/// Call that supplies a column's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Hydrate {
    /// The list (or get) record itself
    List,
    /// The per-item detail call
    Details,
    /// Child resources fetched after the details
    Children,
}

/// How a column's value is extracted from its hydrate record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Camel-cased column name as field path
    Field,
    /// Explicit dot path into the record
    Path(&'static str),
    /// The whole hydrate record
    Whole,
    /// Merged free-form and defined tags
    Tags,
    /// Display name of the resource
    Title,
    /// Region the row belongs to
    Region,
    /// Tenancy OCID
    TenantId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ColumnType,
    pub hydrate: Hydrate,
    pub transform: Transform,
}

impl ColumnDef {
    pub const fn new(name: &'static str, kind: ColumnType, description: &'static str) -> Self {
        Self {
            name,
            description,
            kind,
            hydrate: Hydrate::List,
            transform: Transform::Field,
        }
    }

    pub const fn hydrate(mut self, hydrate: Hydrate) -> Self {
        self.hydrate = hydrate;
        self
    }

    pub const fn transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// Per-call inputs shared by every scope of one query
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    pub quals: Quals,
    /// Columns the caller needs; empty means all
    pub columns: Vec<String>,
    /// Row budget pushed down to the lister
    pub limit: Option<u64>,
}

impl QueryContext {
    pub fn wants(&self, column: &str) -> bool {
        self.columns.is_empty() || self.columns.iter().any(|c| c == column)
    }

    /// True when any wanted column is supplied by `hydrate`
    pub fn needs(&self, columns: &[ColumnDef], hydrate: Hydrate) -> bool {
        columns
            .iter()
            .any(|c| c.hydrate == hydrate && self.wants(c.name))
    }
}

/// Hydrated records a row is rendered from
#[derive(Debug, Default)]
pub struct RowSource<'a> {
    pub list: Value,
    pub details: Option<Value>,
    pub children: Option<Value>,
    pub tags: Option<Map<String, Value>>,
    pub title: Option<String>,
    pub region: String,
    pub tenant_id: &'a str,
}

impl RowSource<'_> {
    fn record(&self, hydrate: Hydrate) -> Option<&Value> {
        match hydrate {
            Hydrate::List => Some(&self.list),
            Hydrate::Details => self.details.as_ref(),
            Hydrate::Children => self.children.as_ref(),
        }
    }
}

/// Render the wanted columns of a row in schema order
pub fn render_row(columns: &[ColumnDef], ctx: &QueryContext, source: &RowSource<'_>) -> Row {
    let mut row = Row::new();
    for column in columns.iter().filter(|c| ctx.wants(c.name)) {
        let value = match column.transform {
            Transform::Field => source
                .record(column.hydrate)
                .map(|r| transform::extract_json_value(r, &transform::to_camel(column.name)))
                .unwrap_or(Value::Null),
            Transform::Path(path) => source
                .record(column.hydrate)
                .map(|r| transform::extract_json_value(r, path))
                .unwrap_or(Value::Null),
            Transform::Whole => source.record(column.hydrate).cloned().unwrap_or(Value::Null),
            Transform::Tags => source.tags.clone().map(Value::Object).unwrap_or(Value::Null),
            Transform::Title => source.title.clone().map(Value::String).unwrap_or(Value::Null),
            Transform::Region => Value::String(source.region.clone()),
            Transform::TenantId => Value::String(source.tenant_id.to_string()),
        };
        row.insert(column.name.to_string(), value);
    }
    row
}

/// A queryable OCI resource table
#[async_trait]
pub trait Table: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn columns(&self) -> &'static [ColumnDef];

    /// Columns whose equality quals are sent to the list call
    fn pushdown_columns(&self) -> &'static [&'static str] {
        &[]
    }

    /// Column that switches a query to point lookups
    fn get_key(&self) -> Option<&'static str> {
        None
    }

    /// Stream the rows of one scope
    fn list<'a>(
        &'a self,
        client: &'a OciClient,
        scope: &'a Scope,
        ctx: &'a QueryContext,
    ) -> BoxStream<'a, Result<Row>>;

    /// Look up the row named by the get key in one scope
    async fn get(
        &self,
        _client: &OciClient,
        _scope: &Scope,
        _ctx: &QueryContext,
    ) -> Result<Option<Row>> {
        Ok(None)
    }

    fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns().iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COLUMNS: &[ColumnDef] = &[
        ColumnDef::new("display_name", ColumnType::String, ""),
        ColumnDef::new("ocpus", ColumnType::Double, "").transform(Transform::Path("shapeConfig.ocpus")),
        ColumnDef::new("vnics", ColumnType::Json, "").hydrate(Hydrate::Details),
        ColumnDef::new("containers", ColumnType::Json, "")
            .hydrate(Hydrate::Children)
            .transform(Transform::Whole),
        ColumnDef::new("region", ColumnType::String, "").transform(Transform::Region),
    ];

    #[test]
    fn test_needs_hydrate_only_for_wanted_columns() {
        let ctx = QueryContext {
            columns: vec!["display_name".to_string()],
            ..Default::default()
        };
        assert!(ctx.needs(COLUMNS, Hydrate::List));
        assert!(!ctx.needs(COLUMNS, Hydrate::Details));
        assert!(QueryContext::default().needs(COLUMNS, Hydrate::Children));
    }

    #[test]
    fn test_render_row() {
        let source = RowSource {
            list: json!({"displayName": "web", "shapeConfig": {"ocpus": 1.5}}),
            details: None,
            children: Some(json!([{"id": "c1"}])),
            region: "us-ashburn-1".to_string(),
            ..Default::default()
        };
        let row = render_row(COLUMNS, &QueryContext::default(), &source);

        let names: Vec<&str> = row.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["display_name", "ocpus", "vnics", "containers", "region"]);
        assert_eq!(row["display_name"], "web");
        assert_eq!(row["ocpus"], 1.5);
        assert_eq!(row["vnics"], Value::Null);
        assert_eq!(row["containers"][0]["id"], "c1");
        assert_eq!(row["region"], "us-ashburn-1");
    }
}
