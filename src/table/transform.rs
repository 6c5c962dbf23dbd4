//! Row transforms
//!
//! Pure functions applied to a hydrated record right before a row is emitted.

use crate::oci::container_instances::{ContainerInstance, ContainerInstanceSummary};
use crate::oci::database::{AutonomousDatabaseSummary, DbHome};
use crate::oci::nosql::TableSummary;
use crate::oci::{DefinedTags, FreeformTags};
use serde_json::{Map, Value};

/// Resource shapes that carry OCI tags
pub trait HasTags {
    fn freeform_tags(&self) -> Option<&FreeformTags> {
        None
    }

    fn defined_tags(&self) -> Option<&DefinedTags> {
        None
    }
}

macro_rules! impl_has_tags {
    ($($shape:ty),* $(,)?) => {
        $(
            impl HasTags for $shape {
                fn freeform_tags(&self) -> Option<&FreeformTags> {
                    self.freeform_tags.as_ref()
                }

                fn defined_tags(&self) -> Option<&DefinedTags> {
                    self.defined_tags.as_ref()
                }
            }
        )*
    };
}

impl_has_tags!(
    ContainerInstanceSummary,
    ContainerInstance,
    DbHome,
    AutonomousDatabaseSummary,
    TableSummary,
);

/// Merge free-form and defined tags into one flat map.
///
/// Defined tag keys overwrite free-form keys of the same name; namespaces are
/// dropped. Returns `None` when the resource carries neither.
pub fn merge_tags(
    freeform: Option<&FreeformTags>,
    defined: Option<&DefinedTags>,
) -> Option<Map<String, Value>> {
    if freeform.is_none() && defined.is_none() {
        return None;
    }

    let mut tags = Map::new();
    if let Some(freeform) = freeform {
        for (key, value) in freeform {
            tags.insert(key.clone(), Value::String(value.clone()));
        }
    }
    if let Some(defined) = defined {
        for namespace in defined.values() {
            for (key, value) in namespace {
                tags.insert(key.clone(), value.clone());
            }
        }
    }
    Some(tags)
}

/// Merged tags of any tagged resource
pub fn tags_of<T: HasTags + ?Sized>(item: &T) -> Option<Map<String, Value>> {
    merge_tags(item.freeform_tags(), item.defined_tags())
}

/// Default column -> field mapping: `db_system_id` -> `dbSystemId`
pub fn to_camel(column: &str) -> String {
    let mut out = String::with_capacity(column.len());
    let mut upper = false;
    for c in column.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Extract a value from JSON using a dot-notation path
pub fn extract_json_value(item: &Value, path: &str) -> Value {
    let mut current = item;

    for part in path.split('.') {
        // Handle array index
        let next = match part.parse::<usize>() {
            Ok(idx) => current.get(idx),
            Err(_) => current.get(part),
        };
        current = match next {
            Some(v) => v,
            None => return Value::Null,
        };
    }

    current.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn freeform(pairs: &[(&str, &str)]) -> FreeformTags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn defined(ns: &str, pairs: &[(&str, Value)]) -> DefinedTags {
        let inner: BTreeMap<String, Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        BTreeMap::from([(ns.to_string(), inner)])
    }

    #[test]
    fn test_defined_overrides_freeform() {
        let ff = freeform(&[("env", "dev"), ("team", "db")]);
        let def = defined("ns", &[("env", json!("prod"))]);
        let tags = merge_tags(Some(&ff), Some(&def)).unwrap();
        assert_eq!(tags["env"], "prod");
        assert_eq!(tags["team"], "db");
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn test_absent_inputs() {
        assert_eq!(merge_tags(None, None), None);
        let ff = freeform(&[("a", "1")]);
        assert_eq!(merge_tags(Some(&ff), None).unwrap()["a"], "1");
        let def = defined("ns", &[("b", json!(2))]);
        assert_eq!(merge_tags(None, Some(&def)).unwrap()["b"], 2);
    }

    #[test]
    fn test_tags_of_resource_shapes() {
        let home = DbHome {
            freeform_tags: Some(freeform(&[("owner", "ops")])),
            ..Default::default()
        };
        assert_eq!(tags_of(&home).unwrap()["owner"], "ops");
        assert_eq!(tags_of(&ContainerInstanceSummary::default()), None);
    }

    #[test]
    fn test_to_camel() {
        assert_eq!(to_camel("db_system_id"), "dbSystemId");
        assert_eq!(to_camel("id"), "id");
        assert_eq!(to_camel("graceful_shutdown_timeout_in_seconds"), "gracefulShutdownTimeoutInSeconds");
    }

    #[test]
    fn test_extract_json_value() {
        let item = json!({"shapeConfig": {"ocpus": 2.0}, "containers": [{"id": "c1"}]});
        assert_eq!(extract_json_value(&item, "shapeConfig.ocpus"), json!(2.0));
        assert_eq!(extract_json_value(&item, "containers.0.id"), json!("c1"));
        assert_eq!(extract_json_value(&item, "missing.path"), Value::Null);
    }
}
