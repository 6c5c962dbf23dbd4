//! Table Registry
//!
//! Builds the set of tables once and provides lookup functions for the query
//! executor and the CLI.

use super::autonomous_db_metric::AutonomousDbCpuUtilizationDailyTable;
use super::container_instance::ContainerInstanceTable;
use super::db_home::DbHomeTable;
use super::nosql_table_metric::NoSqlWriteThrottleCountTable;
use super::Table;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Global registry keyed by table name
static REGISTRY: OnceLock<BTreeMap<&'static str, Box<dyn Table>>> = OnceLock::new();

/// Get the table registry (built on first access)
pub fn get_registry() -> &'static BTreeMap<&'static str, Box<dyn Table>> {
    REGISTRY.get_or_init(|| {
        let tables: Vec<Box<dyn Table>> = vec![
            Box::new(ContainerInstanceTable),
            Box::new(DbHomeTable),
            Box::new(AutonomousDbCpuUtilizationDailyTable),
            Box::new(NoSqlWriteThrottleCountTable),
        ];
        tables.into_iter().map(|t| (t.name(), t)).collect()
    })
}

/// Get a table by name
pub fn get_table(name: &str) -> Option<&'static dyn Table> {
    get_registry().get(name).map(|t| t.as_ref())
}

/// Get all table names, sorted
pub fn get_all_table_names() -> Vec<&'static str> {
    get_registry().keys().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_loads_successfully() {
        assert_eq!(get_registry().len(), 4, "Registry should have every table");
    }

    #[test]
    fn test_db_home_table_exists() {
        let table = get_table("oci_database_db_home");
        assert!(table.is_some(), "DB home table should exist");

        let table = table.unwrap();
        assert_eq!(table.description(), "OCI Database DB Home");
        assert_eq!(table.get_key(), Some("id"));
    }

    #[test]
    fn test_get_all_table_names() {
        let names = get_all_table_names();
        assert!(names.contains(&"oci_container_instances_container_instance"));
        assert!(names.contains(&"oci_nosql_table_metric_write_throttle_count"));
    }

    #[test]
    fn test_column_names_unique() {
        for table in get_registry().values() {
            let mut seen = HashSet::new();
            for column in table.columns() {
                assert!(seen.insert(column.name), "{}.{} duplicated", table.name(), column.name);
            }
        }
    }

    #[test]
    fn test_standard_columns_present() {
        for table in get_registry().values() {
            for column in ["region", "compartment_id", "tenant_id"] {
                assert!(table.column(column).is_some(), "{} lacks {}", table.name(), column);
            }
        }
    }
}
