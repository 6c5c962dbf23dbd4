//! Columns every resource table carries

use super::{ColumnDef, ColumnType, Transform};

pub const TAGS_DESCRIPTION: &str = "A map of tags for the resource.";
pub const TITLE_DESCRIPTION: &str = "Title of the resource.";
pub const REGION_DESCRIPTION: &str = "The OCI region in which the resource is located.";
pub const COMPARTMENT_DESCRIPTION: &str = "The OCID of the compartment in Tenant in which the resource is located.";
pub const TENANT_DESCRIPTION: &str = "The OCID of the Tenant in which the resource is located.";
pub const DEFINED_TAGS_DESCRIPTION: &str = "Defined tags for resource. Defined tags are set up in your tenancy by an administrator. Only users granted permission to work with the defined tags can apply them to resources.";
pub const FREEFORM_TAGS_DESCRIPTION: &str = "Free-form tags for resource. This tags can be applied by any user with permissions on the resource.";

pub const DEFINED_TAGS: ColumnDef =
    ColumnDef::new("defined_tags", ColumnType::Json, DEFINED_TAGS_DESCRIPTION);
pub const FREEFORM_TAGS: ColumnDef =
    ColumnDef::new("freeform_tags", ColumnType::Json, FREEFORM_TAGS_DESCRIPTION);
pub const TAGS: ColumnDef =
    ColumnDef::new("tags", ColumnType::Json, TAGS_DESCRIPTION).transform(Transform::Tags);
pub const TITLE: ColumnDef =
    ColumnDef::new("title", ColumnType::String, TITLE_DESCRIPTION).transform(Transform::Title);
pub const REGION: ColumnDef =
    ColumnDef::new("region", ColumnType::String, REGION_DESCRIPTION).transform(Transform::Region);
pub const COMPARTMENT_ID: ColumnDef =
    ColumnDef::new("compartment_id", ColumnType::String, COMPARTMENT_DESCRIPTION);
pub const TENANT_ID: ColumnDef =
    ColumnDef::new("tenant_id", ColumnType::String, TENANT_DESCRIPTION).transform(Transform::TenantId);

/// Region of a resource: from its OCID, else the scope's
pub fn resource_region(id: &str, scope_region: &str) -> String {
    crate::oci::regions::region_from_ocid(id).unwrap_or_else(|| scope_region.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_region() {
        assert_eq!(
            resource_region("ocid1.dbhome.oc1.phx.abc", "us-ashburn-1"),
            "us-phoenix-1"
        );
        assert_eq!(resource_region("", "us-ashburn-1"), "us-ashburn-1");
    }
}
