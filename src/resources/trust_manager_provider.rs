//! Trust manager providers.

use crate::schema::{AttributeDescriptor, Identity, ResourceSchema};

/// `blind_trust_manager_provider`
#[must_use]
pub fn blind_trust_manager_provider() -> ResourceSchema {
    ResourceSchema::new(
        "blind_trust_manager_provider",
        "Blind Trust Manager Provider",
        "trust-manager-providers",
        Identity::Single { attribute: "name" },
    )
    .describe("Manages a Blind Trust Manager Provider.")
    .urn("urn:pingidentity:schemas:configuration:2.0:trust-manager-provider:blind")
    .attributes(vec![
        AttributeDescriptor::bool("enabled").required(),
        AttributeDescriptor::bool("include_jvm_default_issuers").optional_computed(),
    ])
}
