//! Query Oracle Cloud Infrastructure resources as relational tables.
//!
//! - [`oci`] - REST client: request signing, endpoints, typed service models
//! - [`table`] - Table schemas, paginated listing, hydrates and transforms
//! - [`query`] - Executor running a filtered query across the scope matrix
//! - [`config`] - Persistent user configuration

pub mod config;
pub mod oci;
pub mod query;
pub mod table;

/// Version injected at compile time via TOCI_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("TOCI_VERSION") {
    Some(v) => v,
    None => "dev",
};
