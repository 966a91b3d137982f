//! Declaration validation.
//!
//! Everything that can be checked without talking to the server is checked
//! here, so that `plan` and `apply` fail before the first request.

use crate::error::{ConfigError, ValidationError as AttributeError, Result};
use crate::resources;
use crate::schema::{AttributeDescriptor, ResourceSchema};
use crate::types::{AttrKind, Attribute, AttrValue};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;
use validator::Validate;

use super::reference::{Reference, find_references, is_malformed_reference};
use super::spec::{DeclarationFile, ProviderConfig, ResourceDeclaration};

/// Validator for declaration files.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all problems found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Errors that prevent planning.
    pub errors: Vec<ValidationIssue>,
    /// Non-fatal issues.
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Path of the value that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ValidationResult {
    fn error(&mut self, field: impl Into<String>, message: impl ToString) {
        self.errors.push(ValidationIssue {
            field: field.into(),
            message: message.to_string(),
        });
    }

    /// True when no errors were found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Allowed characters in a resource's local name.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a declaration file, failing on the first error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem.
    pub fn validate(&self, file: &DeclarationFile) -> Result<ValidationResult> {
        let result = self.check(file);
        match result.errors.first() {
            None => {
                debug!("Declaration validation passed");
                Ok(result)
            }
            Some(first) => Err(ConfigError::Invalid {
                field: first.field.clone(),
                message: first.message.clone(),
            }
            .into()),
        }
    }

    /// Collects every problem in a declaration file.
    #[must_use]
    pub fn check(&self, file: &DeclarationFile) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::check_provider(&file.provider, &mut result);

        let mut declared: HashSet<String> = HashSet::new();
        for (index, resource) in file.resources.iter().enumerate() {
            let field = format!("resources[{index}]");
            Self::check_resource(resource, &field, &declared, &mut result);
            if !declared.insert(resource.address()) {
                result.error(
                    field,
                    ConfigError::DuplicateAddress {
                        address: resource.address(),
                    },
                );
            }
        }

        result
    }

    fn check_provider(provider: &ProviderConfig, result: &mut ValidationResult) {
        if let Err(errors) = provider.validate() {
            result.error("provider", errors);
        }
        if provider.insecure_trust_all_tls {
            result
                .warnings
                .push(String::from("provider.insecure_trust_all_tls is enabled; server certificates are not verified"));
        }
    }

    /// `declared` holds the addresses of resources declared earlier.
    fn check_resource(
        resource: &ResourceDeclaration,
        field: &str,
        declared: &HashSet<String>,
        result: &mut ValidationResult,
    ) {
        if !is_valid_name(&resource.name) {
            result.error(
                format!("{field}.name"),
                format!(
                    "Name '{}' is invalid. Must be alphanumeric with hyphens or underscores.",
                    resource.name
                ),
            );
        }

        let Some(schema) = resources::lookup(&resource.resource_type) else {
            result.error(
                format!("{field}.type"),
                ConfigError::UnknownResourceType {
                    resource_type: resource.resource_type.clone(),
                },
            );
            return;
        };

        for (name, value) in &resource.attributes {
            let attr_field = format!("{field}.attributes.{name}");
            Self::check_references(resource, value, &attr_field, declared, result);

            if schema.is_identity(name) {
                Self::check_identity(name, value, &attr_field, result);
            } else if let Some(descriptor) = schema.attribute(name) {
                Self::check_value(descriptor, value, &attr_field, result);
            } else {
                result.error(
                    attr_field,
                    AttributeError::UnknownAttribute {
                        resource_type: schema.name(),
                        attribute: name.clone(),
                    },
                );
            }
        }

        Self::check_required(&schema, resource, field, result);
    }

    fn check_references(
        resource: &ResourceDeclaration,
        value: &Value,
        field: &str,
        declared: &HashSet<String>,
        result: &mut ValidationResult,
    ) {
        let texts: Vec<&str> = match value {
            Value::String(s) => vec![s.as_str()],
            Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };
        for text in texts.into_iter().filter(|t| is_malformed_reference(t)) {
            result.error(
                field,
                ConfigError::InvalidReference {
                    address: resource.address(),
                    reference: text.to_string(),
                    message: String::from("expected ${type.name.attribute}"),
                },
            );
        }

        for reference in find_references(value) {
            if let Some(message) = Self::reference_problem(&reference, declared) {
                result.error(
                    field,
                    ConfigError::InvalidReference {
                        address: resource.address(),
                        reference: reference.to_string(),
                        message,
                    },
                );
            }
        }
    }

    fn reference_problem(reference: &Reference, declared: &HashSet<String>) -> Option<String> {
        let Some(schema) = resources::lookup(&reference.resource_type) else {
            return Some(format!("unknown resource type {}", reference.resource_type));
        };
        if !schema.is_identity(&reference.attribute) && schema.attribute(&reference.attribute).is_none() {
            return Some(format!(
                "{} has no attribute {}",
                schema.name(),
                reference.attribute
            ));
        }
        if !declared.contains(&reference.address()) {
            return Some(format!(
                "{} must be declared before it is referenced",
                reference.address()
            ));
        }
        None
    }

    fn check_identity(name: &str, value: &Value, field: &str, result: &mut ValidationResult) {
        match value {
            Value::String(s) if !s.is_empty() => {}
            Value::Null => result.error(
                field,
                AttributeError::MissingRequired {
                    attribute: name.to_string(),
                },
            ),
            _ => result.error(
                field,
                AttributeError::KindMismatch {
                    attribute: name.to_string(),
                    expected: format!("non-empty {}", AttrKind::String.describe()),
                },
            ),
        }
    }

    fn check_value(
        descriptor: &AttributeDescriptor,
        value: &Value,
        field: &str,
        result: &mut ValidationResult,
    ) {
        if value.is_null() {
            if descriptor.required {
                result.error(
                    field,
                    AttributeError::MissingRequired {
                        attribute: descriptor.name.to_string(),
                    },
                );
            }
            return;
        }

        // Only literal values can be checked; references are typed when resolved.
        let literal = match value {
            Value::String(s) if Reference::parse(s).is_some() => return,
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .filter(|item| !item.as_str().is_some_and(|s| Reference::parse(s).is_some()))
                    .cloned()
                    .collect(),
            ),
            other => other.clone(),
        };

        match Attribute::from_json(descriptor.name, descriptor.kind, &literal) {
            Err(e) => result.error(field, e),
            Ok(attribute) if descriptor.is_enum() => {
                let values: Vec<String> = match attribute {
                    Attribute::String(AttrValue::Known(s)) if !s.is_empty() => vec![s],
                    Attribute::Set(AttrValue::Known(set)) => set.iter().map(String::from).collect(),
                    _ => Vec::new(),
                };
                for bad in values.into_iter().filter(|v| !descriptor.allows(v)) {
                    result.error(
                        field,
                        AttributeError::InvalidEnumValue {
                            attribute: descriptor.name.to_string(),
                            value: bad,
                            allowed: descriptor.allowed.unwrap_or_default().join(", "),
                        },
                    );
                }
            }
            Ok(_) => {}
        }
    }

    fn check_required(
        schema: &ResourceSchema,
        resource: &ResourceDeclaration,
        field: &str,
        result: &mut ValidationResult,
    ) {
        let required = schema
            .identity_attributes()
            .into_iter()
            .chain(schema.attributes.iter().filter(|a| a.required).map(|a| a.name));
        for name in required {
            if !resource.attributes.contains_key(name) {
                result.error(
                    format!("{field}.attributes"),
                    AttributeError::MissingRequired {
                        attribute: name.to_string(),
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigParser;
    use crate::error::DirConfigError;

    fn parse(yaml: &str) -> DeclarationFile {
        ConfigParser::new().parse_yaml(yaml, None).expect("valid yaml")
    }

    const PROVIDER: &str = r"
provider:
  https_host: https://localhost:1443
  username: cn=administrator
  password: secret
";

    fn with_resources(resources: &str) -> DeclarationFile {
        parse(&format!("{PROVIDER}resources:\n{resources}"))
    }

    #[test]
    fn test_valid_file() {
        let file = with_resources(
            r"
  - type: delegated_admin_rights
    name: admins
    attributes:
      id: admins
      enabled: true
  - type: delegated_admin_resource_rights
    name: users
    attributes:
      delegated_admin_rights_name: ${delegated_admin_rights.admins.id}
      rest_resource_type: users
      enabled: true
      admin_permission: [read, update]
",
        );
        let result = ConfigValidator::new().validate(&file).expect("valid");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_unknown_type_and_duplicate() {
        let file = with_resources(
            r"
  - type: location
    name: hq
    attributes: {name: hq}
  - type: location
    name: hq
    attributes: {name: hq2}
  - type: spaceship
    name: x
",
        );
        let result = ConfigValidator::new().check(&file);
        let messages: Vec<&str> = result.errors.iter().map(|e| e.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("Duplicate resource address: location.hq")));
        assert!(messages.iter().any(|m| m.contains("Unknown resource type: spaceship")));
    }

    #[test]
    fn test_attribute_problems() {
        let file = with_resources(
            r"
  - type: delegated_admin_resource_rights
    name: users
    attributes:
      delegated_admin_rights_name: admins
      rest_resource_type: users
      enabled: yes please
      admin_permission: [read, destroy]
      colour: blue
",
        );
        let result = ConfigValidator::new().check(&file);
        assert_eq!(result.errors.len(), 3);
        assert!(result.errors.iter().any(|e| e.field.ends_with("enabled")
            && e.message.contains("expects a boolean")));
        assert!(result.errors.iter().any(|e| e.message.contains("Invalid value 'destroy'")));
        assert!(result.errors.iter().any(|e| e.message.contains("Unknown attribute 'colour'")));
    }

    #[test]
    fn test_missing_required() {
        let file = with_resources(
            r"
  - type: delegated_admin_resource_rights
    name: users
    attributes:
      rest_resource_type: users
      enabled: ~
",
        );
        let result = ConfigValidator::new().check(&file);
        assert!(result.errors.iter().any(|e| e.message.contains("delegated_admin_rights_name")));
        assert!(result.errors.iter().any(|e| e.field.ends_with("enabled")));
    }

    #[test]
    fn test_default_variant_relaxes_required() {
        let file = with_resources(
            r"
  - type: default_periodic_gc_plugin
    name: gc
    attributes:
      id: Periodic GC
",
        );
        assert!(ConfigValidator::new().check(&file).is_valid());
    }

    #[test]
    fn test_references_must_point_backwards() {
        let file = with_resources(
            r"
  - type: delegated_admin_resource_rights
    name: users
    attributes:
      delegated_admin_rights_name: ${delegated_admin_rights.admins.id}
      rest_resource_type: users
      enabled: true
  - type: delegated_admin_rights
    name: admins
    attributes:
      id: admins
      enabled: true
      description: ${delegated_admin_rights.admins}
",
        );
        let result = ConfigValidator::new().check(&file);
        assert!(result
            .errors
            .iter()
            .any(|e| e.message.contains("must be declared before it is referenced")));
        assert!(result
            .errors
            .iter()
            .any(|e| e.message.contains("expected ${type.name.attribute}")));
    }

    #[test]
    fn test_provider_errors_and_warnings() {
        let file = parse(
            r"
provider:
  https_host: localhost
  username: ''
  insecure_trust_all_tls: true
",
        );
        let result = ConfigValidator::new().check(&file);
        assert!(result.errors.iter().any(|e| e.field == "provider"));
        assert_eq!(result.warnings.len(), 1);

        let err = ConfigValidator::new().validate(&file).expect_err("invalid");
        assert!(matches!(err, DirConfigError::Config(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_invalid_name() {
        let file = with_resources(
            r"
  - type: location
    name: head office
    attributes: {name: hq}
",
        );
        let result = ConfigValidator::new().check(&file);
        assert!(result.errors.iter().any(|e| e.field == "resources[0].name"));
    }
}
