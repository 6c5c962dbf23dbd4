//! Equality predicates ("quals") supplied by the caller

use anyhow::{bail, Result};
use std::collections::BTreeMap;

/// Column name -> required value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Quals(BTreeMap<String, String>);

impl Quals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: &str) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: &str) {
        self.0.insert(column.to_string(), value.to_string());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(|v| v.as_str())
    }

    /// Value of a pushdown predicate, ignoring blank values
    pub fn non_empty(&self, column: &str) -> Option<String> {
        self.get(column)
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.to_string())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a `column=value` expression
    pub fn parse_expr(expr: &str) -> Result<(String, String)> {
        let Some((column, value)) = expr.split_once('=') else {
            bail!("Expected column=value, got '{}'", expr);
        };
        let column = column.trim();
        if column.is_empty() {
            bail!("Missing column name in '{}'", expr);
        }
        Ok((column.to_string(), value.trim().to_string()))
    }
}

impl FromIterator<(String, String)> for Quals {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_ignores_blank() {
        let quals = Quals::new().with("display_name", "  ").with("lifecycle_state", "ACTIVE");
        assert_eq!(quals.non_empty("display_name"), None);
        assert_eq!(quals.non_empty("lifecycle_state").as_deref(), Some("ACTIVE"));
        assert_eq!(quals.non_empty("missing"), None);
    }

    #[test]
    fn test_parse_expr() {
        assert_eq!(
            Quals::parse_expr("lifecycle_state = ACTIVE").unwrap(),
            ("lifecycle_state".to_string(), "ACTIVE".to_string())
        );
        assert_eq!(
            Quals::parse_expr("tags=a=b").unwrap(),
            ("tags".to_string(), "a=b".to_string())
        );
        assert!(Quals::parse_expr("no_equals").is_err());
        assert!(Quals::parse_expr("=x").is_err());
    }
}
