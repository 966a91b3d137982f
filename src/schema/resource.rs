//! Resource type schemas.
//!
//! A [`ResourceSchema`] ties a resource type name to its configuration API
//! collection, its identity layout and its ordered attribute descriptors.

use serde_json::{Map, Value, json};

use crate::client::Endpoint;
use crate::error::{LifecycleError, ValidationError};
use crate::types::{AttrValue, Attribute, ResourceModel};

use super::attribute::{AttributeDescriptor, camel_case};

/// How a resource instance is identified in the configuration API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// A single name, sent as `id` when the object is created.
    Single {
        /// Identity attribute name (`id` or `name`).
        attribute: &'static str,
    },
    /// A child object addressed below a parent object.
    Composite {
        /// Attribute naming the parent object.
        parent: &'static str,
        /// Collection holding the parent object.
        parent_collection: &'static str,
        /// Attribute naming the child object.
        child: &'static str,
    },
}

/// Whether a schema manages objects fully or adopts pre-existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Created and deleted by this tool.
    Managed,
    /// Already present on the server; create adopts and delete detaches.
    Default,
}

/// Schema of one resource type.
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    /// Resource type name, without the `default_` prefix.
    pub type_name: &'static str,
    /// Human readable name used in messages.
    pub display_name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Collection below `/config/v2` (below the parent for composite types).
    pub collection: &'static str,
    /// Schema URN sent when creating objects of this type.
    pub schema_urn: Option<&'static str>,
    /// Identity layout.
    pub identity: Identity,
    /// Configurable attributes in declaration order.
    pub attributes: Vec<AttributeDescriptor>,
    /// Whether a `default_` variant exists.
    pub supports_default: bool,
    /// Variant of this schema instance.
    pub variant: Variant,
}

impl ResourceSchema {
    /// Creates a managed schema with a single identity attribute.
    #[must_use]
    pub const fn new(
        type_name: &'static str,
        display_name: &'static str,
        collection: &'static str,
        identity: Identity,
    ) -> Self {
        Self {
            type_name,
            display_name,
            description: "",
            collection,
            schema_urn: None,
            identity,
            attributes: Vec::new(),
            supports_default: false,
            variant: Variant::Managed,
        }
    }

    /// Sets the description.
    #[must_use]
    pub const fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the schema URN.
    #[must_use]
    pub const fn urn(mut self, urn: &'static str) -> Self {
        self.schema_urn = Some(urn);
        self
    }

    /// Enables the `default_` variant.
    #[must_use]
    pub const fn with_default(mut self) -> Self {
        self.supports_default = true;
        self
    }

    /// Sets the attribute list.
    #[must_use]
    pub fn attributes(mut self, attributes: Vec<AttributeDescriptor>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Type name as used in declarations, including the `default_` prefix.
    #[must_use]
    pub fn name(&self) -> String {
        match self.variant {
            Variant::Managed => self.type_name.to_string(),
            Variant::Default => format!("default_{}", self.type_name),
        }
    }

    /// True for the adopted variant.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.variant == Variant::Default
    }

    /// Builds the `default_` variant: every configurable attribute becomes
    /// optional and computed.
    #[must_use]
    pub fn as_default(&self) -> Self {
        let mut schema = self.clone();
        schema.variant = Variant::Default;
        for attr in &mut schema.attributes {
            attr.required = false;
            attr.computed = true;
        }
        schema
    }

    /// Looks up a configurable attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Identity attribute names, parent first.
    #[must_use]
    pub fn identity_attributes(&self) -> Vec<&'static str> {
        match self.identity {
            Identity::Single { attribute } => vec![attribute],
            Identity::Composite { parent, child, .. } => vec![parent, child],
        }
    }

    /// True when `name` is an identity attribute.
    #[must_use]
    pub fn is_identity(&self, name: &str) -> bool {
        self.identity_attributes().contains(&name)
    }

    /// JSON property holding the object name in responses.
    #[must_use]
    pub fn identity_field(&self) -> String {
        match self.identity {
            Identity::Single { .. } => String::from("id"),
            Identity::Composite { child, .. } => camel_case(child),
        }
    }

    fn identity_value<'a>(
        &self,
        model: &'a ResourceModel,
        attribute: &'static str,
    ) -> Result<&'a str, LifecycleError> {
        model
            .known_string(attribute)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LifecycleError::MissingIdentity {
                resource_type: self.name(),
                attribute: attribute.to_string(),
            })
    }

    /// Collection endpoint where new objects are added.
    ///
    /// # Errors
    ///
    /// Fails when a composite parent name is not known.
    pub fn collection_endpoint(&self, model: &ResourceModel) -> Result<Endpoint, LifecycleError> {
        match self.identity {
            Identity::Single { .. } => Ok(Endpoint::collection(self.collection)),
            Identity::Composite {
                parent,
                parent_collection,
                ..
            } => Ok(Endpoint::collection(parent_collection)
                .join(self.identity_value(model, parent)?)
                .join(self.collection)),
        }
    }

    /// Endpoint of one object.
    ///
    /// # Errors
    ///
    /// Fails when an identity attribute is not known.
    pub fn object_endpoint(&self, model: &ResourceModel) -> Result<Endpoint, LifecycleError> {
        let name = match self.identity {
            Identity::Single { attribute } => self.identity_value(model, attribute)?,
            Identity::Composite { child, .. } => self.identity_value(model, child)?,
        };
        Ok(self.collection_endpoint(model)?.join(name))
    }

    /// Import-style identifier of an object (`name` or `parent/child`).
    ///
    /// # Errors
    ///
    /// Fails when an identity attribute is not known.
    pub fn import_id(&self, model: &ResourceModel) -> Result<String, LifecycleError> {
        let parts = self
            .identity_attributes()
            .into_iter()
            .map(|attr| self.identity_value(model, attr))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts.join("/"))
    }

    /// Turns an import identifier into a model holding only the identity.
    ///
    /// # Errors
    ///
    /// Composite identifiers must be exactly two non-empty parts separated
    /// by `/`.
    pub fn parse_import_id(&self, id: &str) -> Result<ResourceModel, LifecycleError> {
        match self.identity {
            Identity::Single { attribute } => Ok(ResourceModel::new()
                .with(attribute, Attribute::String(AttrValue::Known(id.to_string())))),
            Identity::Composite { parent, child, .. } => {
                let parts: Vec<&str> = id.split('/').collect();
                match parts.as_slice() {
                    [p, c] if !p.is_empty() && !c.is_empty() => Ok(ResourceModel::new()
                        .with(parent, Attribute::String(AttrValue::Known((*p).to_string())))
                        .with(child, Attribute::String(AttrValue::Known((*c).to_string())))),
                    _ => Err(LifecycleError::MalformedImportId {
                        id: id.to_string(),
                        expected: format!("[{parent}]/[{child}]"),
                    }),
                }
            }
        }
    }

    /// Checks every concrete enum-typed value against its allowed set.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate_enums(&self, model: &ResourceModel) -> Result<(), ValidationError> {
        for attr in self.attributes.iter().filter(|a| a.is_enum()) {
            let values: Vec<&str> = match model.get(attr.name) {
                Some(Attribute::String(AttrValue::Known(s))) if !s.is_empty() => vec![s.as_str()],
                Some(Attribute::Set(AttrValue::Known(set))) => set.iter().collect(),
                _ => continue,
            };
            if let Some(bad) = values.into_iter().find(|v| !attr.allows(v)) {
                return Err(ValidationError::InvalidEnumValue {
                    attribute: attr.name.to_string(),
                    value: bad.to_string(),
                    allowed: attr.allowed.unwrap_or_default().join(", "),
                });
            }
        }
        Ok(())
    }

    /// Builds the body of an add request from a plan.
    ///
    /// Required attributes are always sent when known. Optional strings are
    /// only sent when non-empty; other optional values only when defined.
    ///
    /// # Errors
    ///
    /// Fails when an identity attribute is not known.
    pub fn build_add_request(&self, plan: &ResourceModel) -> Result<Value, LifecycleError> {
        let mut body = Map::new();
        if let Some(urn) = self.schema_urn {
            body.insert(String::from("schemas"), json!([urn]));
        }
        let name = match self.identity {
            Identity::Single { attribute } => self.identity_value(plan, attribute)?,
            Identity::Composite { child, .. } => self.identity_value(plan, child)?,
        };
        body.insert(self.identity_field(), Value::String(name.to_string()));

        for attr in &self.attributes {
            let Some(value) = plan.get(attr.name) else {
                continue;
            };
            let skip = match value {
                Attribute::String(AttrValue::Known(s)) => {
                    s.is_empty() && attr.empty_string_is_null && !attr.required
                }
                other => !matches!(
                    other,
                    Attribute::Bool(AttrValue::Known(_))
                        | Attribute::Int(AttrValue::Known(_))
                        | Attribute::Set(AttrValue::Known(_))
                ),
            };
            if !skip {
                body.insert(attr.field.clone(), value.to_json());
            }
        }
        Ok(Value::Object(body))
    }
}
