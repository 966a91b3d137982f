//! Virtual attributes.

use crate::schema::{AttributeDescriptor, Identity, ResourceSchema};

/// `reverse_dn_join_virtual_attribute`
#[must_use]
pub fn reverse_dn_join_virtual_attribute() -> ResourceSchema {
    ResourceSchema::new(
        "reverse_dn_join_virtual_attribute",
        "Reverse Dn Join Virtual Attribute",
        "virtual-attributes",
        Identity::Single { attribute: "id" },
    )
    .describe("Manages a Reverse Dn Join Virtual Attribute.")
    .urn("urn:pingidentity:schemas:configuration:2.0:virtual-attribute:reverse-dn-join")
    .with_default()
    .attributes(vec![
        AttributeDescriptor::string("join_dn_attribute")
            .required()
            .json_name("joinDNAttribute")
            .doc("Specifies the attribute type whose values contain the DNs of the source entry."),
        AttributeDescriptor::string("join_base_dn_type")
            .required()
            .one_of(&["use-search-base-dn", "use-custom-base-dn"])
            .json_name("joinBaseDNType")
            .doc("Specifies how to determine the base DN for the internal searches."),
        AttributeDescriptor::string("join_custom_base_dn")
            .json_name("joinCustomBaseDN")
            .doc("The fixed, administrator-specified base DN for the internal searches."),
        AttributeDescriptor::string("join_scope")
            .optional_computed()
            .one_of(&[
                "base-object",
                "single-level",
                "whole-subtree",
                "subordinate-subtree",
            ])
            .doc("The scope for searches used to identify entries to join with the source entry."),
        AttributeDescriptor::int("join_size_limit")
            .optional_computed()
            .doc("The maximum number of entries that may be joined with the source entry."),
        AttributeDescriptor::string("join_filter")
            .doc("An optional filter that specifies additional criteria for identifying joined entries."),
        AttributeDescriptor::set("join_attribute")
            .optional_computed()
            .doc("An optional set of the names of the attributes to include with joined entries."),
        AttributeDescriptor::string("description")
            .doc("A description for this Virtual Attribute"),
        AttributeDescriptor::bool("enabled")
            .required()
            .doc("Indicates whether the Virtual Attribute is enabled for use."),
        AttributeDescriptor::string("attribute_type")
            .required()
            .doc("Specifies the attribute type for the attribute whose values are to be dynamically assigned."),
        AttributeDescriptor::set("base_dn")
            .optional_computed()
            .json_name("baseDN")
            .doc("Base DNs for branches in which the virtual attribute may be generated."),
        AttributeDescriptor::set("group_dn")
            .optional_computed()
            .json_name("groupDN")
            .doc("DNs of groups whose members can be eligible to use this virtual attribute."),
        AttributeDescriptor::set("filter")
            .optional_computed()
            .doc("Search filters used to determine which entries are eligible for the virtual attribute."),
        AttributeDescriptor::set("client_connection_policy")
            .optional_computed()
            .doc("Client connection policies for which the virtual attribute may be generated."),
        AttributeDescriptor::string("conflict_behavior")
            .optional_computed()
            .one_of(&[
                "real-overrides-virtual",
                "virtual-overrides-real",
                "merge-real-and-virtual",
            ])
            .doc("Specifies the behavior when an entry contains both real and virtual values for the attribute."),
        AttributeDescriptor::bool("require_explicit_request_by_name")
            .optional_computed()
            .doc("Indicates whether the virtual attribute should only be generated when explicitly requested by name."),
        AttributeDescriptor::int("multiple_virtual_attribute_evaluation_order_index")
            .doc("Evaluation order index used when multiple virtual attributes target the same attribute type."),
        AttributeDescriptor::string("multiple_virtual_attribute_merge_behavior")
            .optional_computed()
            .one_of(&["preserve-first-virtual-value", "merge-virtual-values"])
            .doc("Specifies the behavior when multiple virtual attribute providers target the same attribute type."),
        AttributeDescriptor::bool("allow_index_conflicts")
            .optional_computed()
            .doc("Indicates whether the server should allow creating or altering this virtual attribute definition even if it conflicts with an index."),
    ])
}
