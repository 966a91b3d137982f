//! Delegated administration rights.

use crate::schema::{AttributeDescriptor, Identity, ResourceSchema};

/// `delegated_admin_rights`
#[must_use]
pub fn delegated_admin_rights() -> ResourceSchema {
    ResourceSchema::new(
        "delegated_admin_rights",
        "Delegated Admin Rights",
        "delegated-admin-rights",
        Identity::Single { attribute: "id" },
    )
    .describe("Manages a Delegated Admin Rights.")
    .attributes(vec![
        AttributeDescriptor::bool("enabled")
            .required()
            .doc("Indicates whether the Delegated Admin Rights is enabled."),
        AttributeDescriptor::string("admin_user_dn")
            .json_name("adminUserDN")
            .doc("The DN of a delegated administrator user."),
        AttributeDescriptor::string("admin_group_dn")
            .json_name("adminGroupDN")
            .doc("The DN of a group of delegated administrators."),
        AttributeDescriptor::string("description")
            .doc("A description for this Delegated Admin Rights"),
    ])
}

/// `delegated_admin_resource_rights`
///
/// Lives below a `delegated_admin_rights` object and is imported as
/// `rights-name/rest-resource-type`.
#[must_use]
pub fn delegated_admin_resource_rights() -> ResourceSchema {
    ResourceSchema::new(
        "delegated_admin_resource_rights",
        "Delegated Admin Resource Rights",
        "delegated-admin-resource-rights",
        Identity::Composite {
            parent: "delegated_admin_rights_name",
            parent_collection: "delegated-admin-rights",
            child: "rest_resource_type",
        },
    )
    .describe("Manages a Delegated Admin Resource Rights.")
    .attributes(vec![
        AttributeDescriptor::bool("enabled")
            .required()
            .doc("Indicates whether these Delegated Admin Resource Rights are enabled."),
        AttributeDescriptor::set("admin_permission")
            .optional_computed()
            .one_of(&["create", "read", "update", "delete", "manage-group-membership"])
            .doc("Specifies administrator(s) permissions."),
        AttributeDescriptor::string("admin_scope")
            .optional_computed()
            .one_of(&[
                "resources-in-specific-subtrees",
                "resources-in-specific-groups",
                "all-resources-in-base",
            ])
            .doc("Specifies the scope of these Delegated Admin Resource Rights."),
        AttributeDescriptor::set("resource_subtree")
            .optional_computed()
            .doc("Specifies subtrees within the search base whose entries can be managed by the administrator(s)."),
        AttributeDescriptor::set("resources_in_group")
            .optional_computed()
            .doc("Specifies groups (DNs) within the search base whose entries can be managed by the administrator(s)."),
        AttributeDescriptor::string("description")
            .doc("A description for this Delegated Admin Resource Rights"),
    ])
}
