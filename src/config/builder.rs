//! Turns a resource declaration into a tri-state plan.
//!
//! Per attribute:
//! - written as `null` → Null
//! - written → Known, checked against the attribute kind
//! - a reference that cannot be resolved yet → Unknown
//! - absent and computed → the prior state value, or Unknown when the
//!   resource is not in state yet
//! - absent and not computed → Null

use serde_json::Value;

use crate::error::{Result, ValidationError};
use crate::schema::ResourceSchema;
use crate::types::{AttrKind, Attribute, ResourceModel};

use super::reference::{Reference, resolve_value};
use super::spec::ResourceDeclaration;

/// Builds plan records for one schema.
#[derive(Debug, Clone, Copy)]
pub struct PlanBuilder<'a> {
    schema: &'a ResourceSchema,
}

impl<'a> PlanBuilder<'a> {
    /// Creates a builder for `schema`.
    #[must_use]
    pub const fn new(schema: &'a ResourceSchema) -> Self {
        Self { schema }
    }

    /// Builds the plan for `declaration`.
    ///
    /// `prior` is the last recorded state of the resource, if any.
    /// `resolve` returns the current value of a referenced attribute, or
    /// `None` while it is not known.
    ///
    /// # Errors
    ///
    /// Fails on unknown attributes, kind mismatches and missing required
    /// values.
    pub fn build<F>(
        &self,
        declaration: &ResourceDeclaration,
        prior: Option<&ResourceModel>,
        resolve: &F,
    ) -> Result<ResourceModel>
    where
        F: Fn(&Reference) -> Option<Value>,
    {
        if let Some(unknown) = declaration
            .attributes
            .keys()
            .find(|name| !self.schema.is_identity(name) && self.schema.attribute(name).is_none())
        {
            return Err(ValidationError::UnknownAttribute {
                resource_type: self.schema.name(),
                attribute: unknown.clone(),
            }
            .into());
        }

        let mut plan = ResourceModel::new();

        for name in self.schema.identity_attributes() {
            let attribute = match declaration.attributes.get(name) {
                None | Some(Value::Null) => {
                    return Err(ValidationError::MissingRequired {
                        attribute: name.to_string(),
                    }
                    .into());
                }
                Some(value) => Self::declared(name, AttrKind::String, value, resolve)?,
            };
            plan.insert(name, attribute);
        }

        for descriptor in &self.schema.attributes {
            let attribute = match declaration.attributes.get(descriptor.name) {
                Some(Value::Null) if descriptor.required => {
                    return Err(ValidationError::MissingRequired {
                        attribute: descriptor.name.to_string(),
                    }
                    .into());
                }
                Some(value) => Self::declared(descriptor.name, descriptor.kind, value, resolve)?,
                None if descriptor.required => {
                    return Err(ValidationError::MissingRequired {
                        attribute: descriptor.name.to_string(),
                    }
                    .into());
                }
                None if descriptor.computed => prior.map_or_else(
                    || Attribute::unknown(descriptor.kind),
                    |state| state.typed(descriptor.name, descriptor.kind),
                ),
                None => Attribute::null(descriptor.kind),
            };
            plan.insert(descriptor.name, attribute);
        }

        Ok(plan)
    }

    fn declared<F>(name: &str, kind: AttrKind, value: &Value, resolve: &F) -> Result<Attribute>
    where
        F: Fn(&Reference) -> Option<Value>,
    {
        match resolve_value(value, resolve) {
            Some(resolved) => Ok(Attribute::from_json(name, kind, &resolved)?),
            None => Ok(Attribute::unknown(kind)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DirConfigError;
    use crate::resources;
    use crate::types::{AttrValue, StringSet};
    use serde_json::json;

    fn nothing(_: &Reference) -> Option<Value> {
        None
    }

    fn rights() -> ResourceDeclaration {
        ResourceDeclaration::new("delegated_admin_resource_rights", "users")
            .with("delegated_admin_rights_name", json!("admins"))
            .with("rest_resource_type", json!("users"))
            .with("enabled", json!(true))
    }

    #[test]
    fn test_first_plan_marks_computed_unknown() {
        let schema = resources::lookup("delegated_admin_resource_rights").expect("registered");
        let plan = PlanBuilder::new(&schema)
            .build(&rights().with("description", Value::Null), None, &nothing)
            .expect("plan");

        assert_eq!(plan.known_string("rest_resource_type"), Some("users"));
        assert_eq!(plan.get("enabled"), Some(&Attribute::Bool(AttrValue::Known(true))));
        assert_eq!(plan.get("admin_permission"), Some(&Attribute::Set(AttrValue::Unknown)));
        assert_eq!(plan.get("admin_scope"), Some(&Attribute::String(AttrValue::Unknown)));
        assert_eq!(plan.get("description"), Some(&Attribute::String(AttrValue::Null)));
    }

    #[test]
    fn test_computed_values_come_from_state() {
        let schema = resources::lookup("delegated_admin_resource_rights").expect("registered");
        let state = ResourceModel::new().with(
            "admin_permission",
            Attribute::Set(AttrValue::Known(["read"].into_iter().collect())),
        );

        let plan = PlanBuilder::new(&schema)
            .build(&rights(), Some(&state), &nothing)
            .expect("plan");
        assert_eq!(
            plan.get("admin_permission"),
            Some(&Attribute::Set(AttrValue::Known(["read"].into_iter().collect())))
        );
        // Not recorded in state: null, not unknown.
        assert_eq!(plan.get("resource_subtree"), Some(&Attribute::Set(AttrValue::Null)));
        // Absent and not computed.
        assert_eq!(plan.get("description"), Some(&Attribute::String(AttrValue::Null)));
    }

    #[test]
    fn test_references() {
        let schema = resources::lookup("delegated_admin_resource_rights").expect("registered");
        let declaration = rights()
            .with("delegated_admin_rights_name", json!("${delegated_admin_rights.admins.id}"))
            .with("admin_permission", json!(["create", "${delegated_admin_rights.admins.description}"]));

        let plan = PlanBuilder::new(&schema)
            .build(&declaration, None, &nothing)
            .expect("plan");
        assert_eq!(
            plan.get("delegated_admin_rights_name"),
            Some(&Attribute::String(AttrValue::Unknown))
        );
        assert_eq!(plan.get("admin_permission"), Some(&Attribute::Set(AttrValue::Unknown)));

        let resolve = |r: &Reference| match r.attribute.as_str() {
            "id" => Some(json!("admins")),
            "description" => Some(json!("read")),
            _ => None,
        };
        let plan = PlanBuilder::new(&schema)
            .build(&declaration, None, &resolve)
            .expect("plan");
        assert_eq!(plan.known_string("delegated_admin_rights_name"), Some("admins"));
        assert_eq!(
            plan.get("admin_permission"),
            Some(&Attribute::Set(AttrValue::Known(
                ["create", "read"].into_iter().collect::<StringSet>()
            )))
        );
    }

    #[test]
    fn test_errors() {
        let schema = resources::lookup("delegated_admin_resource_rights").expect("registered");
        let builder = PlanBuilder::new(&schema);

        let err = builder
            .build(&rights().with("enabled", json!("true")), None, &nothing)
            .expect_err("kind mismatch");
        assert!(matches!(err, DirConfigError::Validation(ValidationError::KindMismatch { .. })));

        let mut missing = rights();
        missing.attributes.remove("enabled");
        let err = builder.build(&missing, None, &nothing).expect_err("missing");
        assert!(matches!(err, DirConfigError::Validation(ValidationError::MissingRequired { .. })));

        let err = builder
            .build(&rights().with("rest_resource_type", Value::Null), None, &nothing)
            .expect_err("missing identity");
        assert!(matches!(err, DirConfigError::Validation(ValidationError::MissingRequired { .. })));

        let err = builder
            .build(&rights().with("colour", json!("blue")), None, &nothing)
            .expect_err("unknown attribute");
        assert!(matches!(err, DirConfigError::Validation(ValidationError::UnknownAttribute { .. })));
    }

    #[test]
    fn test_default_variant_is_all_computed() {
        let schema = resources::lookup("default_periodic_gc_plugin").expect("registered");
        let declaration = ResourceDeclaration::new("default_periodic_gc_plugin", "gc")
            .with("id", json!("Periodic GC"))
            .with("enabled", json!(true));

        let plan = PlanBuilder::new(&schema)
            .build(&declaration, None, &nothing)
            .expect("plan");
        assert_eq!(plan.get("enabled"), Some(&Attribute::Bool(AttrValue::Known(true))));
        assert!(!plan.unknown_attributes().is_empty());
        assert!(!plan.unknown_attributes().contains(&"enabled"));
    }
}
