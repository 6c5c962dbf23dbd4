//! OCI API interaction module
//!
//! This module provides the core functionality for interacting with Oracle Cloud
//! Infrastructure REST APIs: authentication, HTTP transport, endpoints and the
//! typed request/response models of the services the tables read from.
//!
//! # Module Structure
//!
//! - [`auth`] - Config-file profiles and API-key request signing
//! - [`client`] - Main OCI client, regional endpoints, tenant id cache
//! - [`http`] - HTTP transport, retries, API errors
//! - [`identity`] - Compartments, region subscriptions, the scope matrix
//! - [`container_instances`], [`database`], [`nosql`], [`monitoring`] - Service models
//! - [`regions`] - Region names from OCIDs
//!
//! # Example
//!
//! ```ignore
//! use toci::oci::{auth, client::OciClient, http::RetryPolicy};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let profile = auth::load_profile(&path, "DEFAULT")?;
//!     let client = OciClient::from_profile(&profile, RetryPolicy::default())?;
//!     let homes = client.list_db_homes("us-ashburn-1", &request).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod container_instances;
pub mod database;
pub mod http;
pub mod identity;
pub mod monitoring;
pub mod nosql;
pub mod regions;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

/// Free-form tags: key -> value
pub type FreeformTags = BTreeMap<String, String>;

/// Defined tags: namespace -> key -> value
pub type DefinedTags = BTreeMap<String, BTreeMap<String, Value>>;

/// Result of paginated fetch
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

/// Decode one page of a list call.
///
/// Some services return a bare JSON array, others wrap it in `{"items": [...]}`.
pub(crate) fn decode_page<T: DeserializeOwned>(
    response: http::ApiResponse,
) -> Result<PaginatedResult<T>> {
    let items = match response.body {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => map.remove("items").unwrap_or(Value::Array(Vec::new())),
        Value::Null => Value::Array(Vec::new()),
        other => other,
    };
    let items = serde_json::from_value(items).context("Failed to decode list response")?;
    Ok(PaginatedResult {
        items,
        next_token: response.next_page,
    })
}

/// Push an optional query parameter
pub(crate) fn push_opt(query: &mut Vec<(&'static str, String)>, key: &'static str, value: &Option<String>) {
    if let Some(value) = value {
        query.push((key, value.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(body: Value, next: Option<&str>) -> http::ApiResponse {
        http::ApiResponse {
            body,
            next_page: next.map(|s| s.to_string()),
            request_id: None,
        }
    }

    #[test]
    fn test_decode_bare_array() {
        let page: PaginatedResult<String> =
            decode_page(response(json!(["a", "b"]), Some("p2"))).unwrap();
        assert_eq!(page.items, vec!["a", "b"]);
        assert_eq!(page.next_token.as_deref(), Some("p2"));
    }

    #[test]
    fn test_decode_items_collection() {
        let page: PaginatedResult<String> =
            decode_page(response(json!({"items": ["x"]}), None)).unwrap();
        assert_eq!(page.items, vec!["x"]);
        assert!(page.next_token.is_none());
    }

    #[test]
    fn test_decode_empty_body() {
        let page: PaginatedResult<String> = decode_page(response(Value::Null, None)).unwrap();
        assert!(page.items.is_empty());
    }
}
