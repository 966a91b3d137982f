//! Plugins.

use crate::schema::{AttributeDescriptor, Identity, ResourceSchema};

/// Phases at which a plugin can be invoked.
pub const PLUGIN_TYPES: &[&str] = &[
    "startup",
    "shutdown",
    "post-connect",
    "post-disconnect",
    "ldif-import",
    "ldif-import-end",
    "ldif-import-begin",
    "ldif-export",
    "pre-parse-abandon",
    "pre-parse-add",
    "pre-parse-bind",
    "pre-parse-compare",
    "pre-parse-delete",
    "pre-parse-extended",
    "pre-parse-modify",
    "pre-parse-modify-dn",
    "pre-parse-search",
    "pre-parse-unbind",
    "pre-operation-add",
    "pre-operation-bind",
    "pre-operation-compare",
    "pre-operation-delete",
    "pre-operation-extended",
    "pre-operation-modify",
    "pre-operation-modify-dn",
    "pre-operation-search",
    "post-operation-abandon",
    "post-operation-add",
    "post-operation-bind",
    "post-operation-compare",
    "post-operation-delete",
    "post-operation-extended",
    "post-operation-modify",
    "post-operation-modify-dn",
    "post-operation-search",
    "post-operation-unbind",
    "post-response-add",
    "post-response-bind",
    "post-response-compare",
    "post-response-delete",
    "post-response-extended",
    "post-response-modify",
    "post-response-modify-dn",
    "post-response-search",
    "post-synchronization-add",
    "post-synchronization-delete",
    "post-synchronization-modify",
    "post-synchronization-modify-dn",
    "search-result-entry",
    "search-result-reference",
    "subordinate-modify-dn",
    "intermediate-response",
];

const DAYS_OF_WEEK: &[&str] = &[
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

fn plugin_type() -> AttributeDescriptor {
    AttributeDescriptor::set("plugin_type")
        .one_of(PLUGIN_TYPES)
        .doc("Specifies the set of plug-in types for the plug-in, which specifies the times at which the plug-in is invoked.")
}

fn common_tail() -> Vec<AttributeDescriptor> {
    vec![
        AttributeDescriptor::string("description").doc("A description for this Plugin"),
        AttributeDescriptor::bool("enabled")
            .required()
            .doc("Indicates whether the plug-in is enabled for use."),
        AttributeDescriptor::bool("invoke_for_internal_operations")
            .optional_computed()
            .doc("Indicates whether the plug-in should be invoked for internal operations."),
    ]
}

/// `periodic_gc_plugin`
#[must_use]
pub fn periodic_gc_plugin() -> ResourceSchema {
    let mut attributes = vec![
        plugin_type().optional_computed(),
        AttributeDescriptor::set("invoke_gc_day_of_week")
            .optional_computed()
            .one_of(DAYS_OF_WEEK)
            .json_name("invokeGCDayOfWeek")
            .doc("Specifies the days of the week which the Periodic GC Plugin should run."),
        AttributeDescriptor::set("invoke_gc_time_utc")
            .required()
            .json_name("invokeGCTimeUtc")
            .doc("Specifies the times of the day (\"HH:MM\", UTC) at which garbage collection may be explicitly invoked."),
        AttributeDescriptor::string("delay_after_alert")
            .optional_computed()
            .formatted()
            .doc("Length of time to wait after sending the \"force-gc-starting\" alert before invoking garbage collection."),
        AttributeDescriptor::string("delay_post_gc")
            .optional_computed()
            .formatted()
            .json_name("delayPostGC")
            .doc("Length of time to wait after garbage collection before removing the \"force-gc-starting\" alert."),
    ];
    attributes.extend(common_tail());

    ResourceSchema::new(
        "periodic_gc_plugin",
        "Periodic Gc Plugin",
        "plugins",
        Identity::Single { attribute: "id" },
    )
    .describe("Manages a Periodic Gc Plugin.")
    .urn("urn:pingidentity:schemas:configuration:2.0:plugin:periodic-gc")
    .with_default()
    .attributes(attributes)
}

/// `attribute_mapper_plugin`
#[must_use]
pub fn attribute_mapper_plugin() -> ResourceSchema {
    let mut attributes = vec![
        plugin_type().required(),
        AttributeDescriptor::string("source_attribute")
            .required()
            .doc("Specifies the source attribute type that may appear in client requests which should be remapped to the target attribute."),
        AttributeDescriptor::string("target_attribute")
            .required()
            .doc("Specifies the target attribute type to which the source attribute type should be mapped."),
        AttributeDescriptor::bool("enable_control_mapping")
            .required()
            .doc("Indicates whether mapping should be applied to attribute types that may be present in specific controls."),
        AttributeDescriptor::bool("always_map_responses")
            .required()
            .doc("Indicates whether the target attribute in response messages should always be remapped back to the source attribute."),
    ];
    attributes.extend(common_tail());

    ResourceSchema::new(
        "attribute_mapper_plugin",
        "Attribute Mapper Plugin",
        "plugins",
        Identity::Single { attribute: "id" },
    )
    .describe("Manages an Attribute Mapper Plugin.")
    .urn("urn:pingidentity:schemas:configuration:2.0:plugin:attribute-mapper")
    .attributes(attributes)
}

/// `referential_integrity_plugin`
#[must_use]
pub fn referential_integrity_plugin() -> ResourceSchema {
    let mut attributes = vec![
        plugin_type().optional_computed(),
        AttributeDescriptor::set("attribute_type")
            .required()
            .doc("Specifies the attribute types for which referential integrity is to be maintained."),
        AttributeDescriptor::set("base_dn")
            .optional_computed()
            .json_name("baseDN")
            .doc("Specifies the base DN that limits the scope within which referential integrity is maintained."),
        AttributeDescriptor::string("log_file")
            .optional_computed()
            .doc("Specifies the log file location where the update records are written when the plug-in is in background-mode processing."),
        AttributeDescriptor::string("update_interval")
            .optional_computed()
            .formatted()
            .doc("Specifies the interval for background processing of referential integrity updates."),
    ];
    attributes.extend(common_tail());

    ResourceSchema::new(
        "referential_integrity_plugin",
        "Referential Integrity Plugin",
        "plugins",
        Identity::Single { attribute: "id" },
    )
    .describe("Manages a Referential Integrity Plugin.")
    .urn("urn:pingidentity:schemas:configuration:2.0:plugin:referential-integrity")
    .with_default()
    .attributes(attributes)
}
