//! Resource type catalogue.
//!
//! Every supported resource type is registered here. Types that exist on a
//! fresh server can also be declared as `default_<type>`, which adopts the
//! existing object instead of creating one.

mod delegated_admin;
mod external_server;
mod location;
mod log_publisher;
mod plugin;
mod trust_manager_provider;
mod virtual_attribute;

use std::sync::LazyLock;

use crate::schema::ResourceSchema;

pub use plugin::PLUGIN_TYPES;

/// Prefix of adopted (default) resource types.
pub const DEFAULT_PREFIX: &str = "default_";

static CATALOGUE: LazyLock<Vec<ResourceSchema>> = LazyLock::new(|| {
    vec![
        location::location(),
        trust_manager_provider::blind_trust_manager_provider(),
        plugin::periodic_gc_plugin(),
        plugin::attribute_mapper_plugin(),
        plugin::referential_integrity_plugin(),
        external_server::ping_identity_ds_external_server(),
        external_server::ping_one_http_external_server(),
        log_publisher::file_based_audit_log_publisher(),
        virtual_attribute::reverse_dn_join_virtual_attribute(),
        delegated_admin::delegated_admin_rights(),
        delegated_admin::delegated_admin_resource_rights(),
    ]
});

/// All managed schemas, in registration order.
#[must_use]
pub fn catalogue() -> &'static [ResourceSchema] {
    &CATALOGUE
}

/// Looks up a schema by declared type name, including `default_` names.
#[must_use]
pub fn lookup(type_name: &str) -> Option<ResourceSchema> {
    if let Some(base) = type_name.strip_prefix(DEFAULT_PREFIX) {
        return CATALOGUE
            .iter()
            .find(|s| s.type_name == base && s.supports_default)
            .map(ResourceSchema::as_default);
    }
    CATALOGUE.iter().find(|s| s.type_name == type_name).cloned()
}

/// Every declarable type name.
#[must_use]
pub fn type_names() -> Vec<String> {
    let mut names = Vec::new();
    for schema in CATALOGUE.iter() {
        names.push(schema.type_name.to_string());
        if schema.supports_default {
            names.push(format!("{DEFAULT_PREFIX}{}", schema.type_name));
        }
    }
    names
}
