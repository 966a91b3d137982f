//! Resource records built from tri-state attributes.
//!
//! A [`ResourceModel`] is the in-memory form of one resource instance, used
//! both for plans and for state. Attribute kinds are resolved from the
//! resource schema, never inspected at runtime.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ValidationError;

use super::set::StringSet;
use super::value::AttrValue;

/// Kind of a schema attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrKind {
    /// Single-valued string.
    String,
    /// Boolean.
    Bool,
    /// 64-bit integer.
    Int,
    /// Set of strings.
    Set,
}

/// A tri-state attribute of a known kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    /// String attribute.
    String(AttrValue<String>),
    /// Boolean attribute.
    Bool(AttrValue<bool>),
    /// Integer attribute.
    Int(AttrValue<i64>),
    /// String-set attribute.
    Set(AttrValue<StringSet>),
}

/// An action the server says is required for a change to take effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredAction {
    /// Property that triggered the action, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    /// Action type (for example `component-restart`).
    #[serde(rename = "type")]
    pub action_type: String,
    /// Human readable synopsis.
    pub synopsis: String,
}

/// One resource instance: attribute values plus the computed bookkeeping
/// attributes every resource carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceModel {
    attributes: BTreeMap<String, Attribute>,
    /// Notifications returned by the configuration API.
    pub notifications: Vec<String>,
    /// Required actions returned by the configuration API.
    pub required_actions: Vec<RequiredAction>,
    /// Timestamp of the last update made through this tool.
    pub last_updated: Option<String>,
}

impl AttrKind {
    /// Short description used in messages.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "boolean",
            Self::Int => "integer",
            Self::Set => "list of strings",
        }
    }
}

impl fmt::Display for AttrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

impl Attribute {
    /// Null attribute of the given kind.
    #[must_use]
    pub const fn null(kind: AttrKind) -> Self {
        match kind {
            AttrKind::String => Self::String(AttrValue::Null),
            AttrKind::Bool => Self::Bool(AttrValue::Null),
            AttrKind::Int => Self::Int(AttrValue::Null),
            AttrKind::Set => Self::Set(AttrValue::Null),
        }
    }

    /// Unknown attribute of the given kind.
    #[must_use]
    pub const fn unknown(kind: AttrKind) -> Self {
        match kind {
            AttrKind::String => Self::String(AttrValue::Unknown),
            AttrKind::Bool => Self::Bool(AttrValue::Unknown),
            AttrKind::Int => Self::Int(AttrValue::Unknown),
            AttrKind::Set => Self::Set(AttrValue::Unknown),
        }
    }

    /// Kind of this attribute.
    #[must_use]
    pub const fn kind(&self) -> AttrKind {
        match self {
            Self::String(_) => AttrKind::String,
            Self::Bool(_) => AttrKind::Bool,
            Self::Int(_) => AttrKind::Int,
            Self::Set(_) => AttrKind::Set,
        }
    }

    /// True when the value is not yet known.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        match self {
            Self::String(v) => v.is_unknown(),
            Self::Bool(v) => v.is_unknown(),
            Self::Int(v) => v.is_unknown(),
            Self::Set(v) => v.is_unknown(),
        }
    }

    /// True when the value is null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        match self {
            Self::String(v) => v.is_null(),
            Self::Bool(v) => v.is_null(),
            Self::Int(v) => v.is_null(),
            Self::Set(v) => v.is_null(),
        }
    }

    /// Parses a declared or stored JSON value as an attribute of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::KindMismatch`] when the JSON shape does not
    /// match the kind.
    pub fn from_json(name: &str, kind: AttrKind, value: &Value) -> Result<Self, ValidationError> {
        if value.is_null() {
            return Ok(Self::null(kind));
        }
        let mismatch = || ValidationError::KindMismatch {
            attribute: name.to_string(),
            expected: kind.describe().to_string(),
        };
        let parsed = match kind {
            AttrKind::String => Self::String(AttrValue::Known(
                value.as_str().ok_or_else(mismatch)?.to_string(),
            )),
            AttrKind::Bool => Self::Bool(AttrValue::Known(value.as_bool().ok_or_else(mismatch)?)),
            AttrKind::Int => Self::Int(AttrValue::Known(value.as_i64().ok_or_else(mismatch)?)),
            AttrKind::Set => {
                let items = value.as_array().ok_or_else(mismatch)?;
                let mut set = StringSet::new();
                for item in items {
                    set.insert(item.as_str().ok_or_else(mismatch)?);
                }
                Self::Set(AttrValue::Known(set))
            }
        };
        Ok(parsed)
    }

    /// Converts to JSON. Null and unknown both become JSON `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(AttrValue::Known(s)) => Value::String(s.clone()),
            Self::Bool(AttrValue::Known(b)) => Value::Bool(*b),
            Self::Int(AttrValue::Known(i)) => Value::from(*i),
            Self::Set(AttrValue::Known(set)) => {
                Value::Array(set.iter().map(|v| Value::String(v.to_string())).collect())
            }
            _ => Value::Null,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(AttrValue::Known(s)) => write!(f, "\"{s}\""),
            Self::String(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Set(v) => write!(f, "{v}"),
        }
    }
}

impl ResourceModel {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute.
    pub fn insert(&mut self, name: impl Into<String>, attribute: Attribute) {
        self.attributes.insert(name.into(), attribute);
    }

    /// Builder form of [`ResourceModel::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.insert(name, attribute);
        self
    }

    /// Borrows an attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Gets an attribute as `kind`, falling back to null when it is missing
    /// or stored with another kind.
    #[must_use]
    pub fn typed(&self, name: &str, kind: AttrKind) -> Attribute {
        match self.attributes.get(name) {
            Some(attribute) if attribute.kind() == kind => attribute.clone(),
            _ => Attribute::null(kind),
        }
    }

    /// String attribute value.
    #[must_use]
    pub fn string(&self, name: &str) -> AttrValue<String> {
        match self.attributes.get(name) {
            Some(Attribute::String(v)) => v.clone(),
            _ => AttrValue::Null,
        }
    }

    /// Concrete string value, if any.
    #[must_use]
    pub fn known_string(&self, name: &str) -> Option<&str> {
        match self.attributes.get(name) {
            Some(Attribute::String(AttrValue::Known(s))) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Iterates attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of attributes set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// True if no attributes are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Names of attributes whose value is unknown.
    #[must_use]
    pub fn unknown_attributes(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(_, v)| v.is_unknown())
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// Attribute values as a JSON object.
    #[must_use]
    pub fn to_json_map(&self) -> Map<String, Value> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}
