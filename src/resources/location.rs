//! Locations.

use crate::schema::{AttributeDescriptor, Identity, ResourceSchema};

/// `location`
#[must_use]
pub fn location() -> ResourceSchema {
    ResourceSchema::new(
        "location",
        "Location",
        "locations",
        Identity::Single { attribute: "name" },
    )
    .describe("Manages a Location.")
    .attributes(vec![AttributeDescriptor::string("description")])
}
