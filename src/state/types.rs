//! State types.
//!
//! The state file records, per managed resource, the attribute values last
//! observed from the server together with the declaration hash they were
//! applied from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{Result, StateError};
use crate::schema::ResourceSchema;
use crate::types::{AttrKind, Attribute, RequiredAction, ResourceModel};

/// Current version of the state format.
pub const STATE_VERSION: &str = "1";

/// Everything dirconfig manages on one server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderState {
    /// State format version.
    pub version: String,
    /// Incremented on every change.
    pub serial: u64,
    /// When the state last changed.
    pub last_modified: DateTime<Utc>,
    /// Managed resources in the order they were first recorded.
    #[serde(default)]
    pub resources: Vec<ResourceState>,
}

/// How a resource came under management.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    /// Created by dirconfig.
    Created,
    /// An existing `default_` object taken over.
    Adopted,
    /// Imported by identifier and not applied yet.
    Imported,
}

/// State of one managed resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceState {
    /// `type.name`.
    pub address: String,
    /// Declared type, including any `default_` prefix.
    pub resource_type: String,
    /// How the resource came under management.
    pub status: ResourceStatus,
    /// Hash of the declaration at the last apply.
    #[serde(default)]
    pub config_hash: Option<String>,
    /// Attribute values, including identity attributes.
    pub attributes: Map<String, Value>,
    /// Configuration messages returned with the last response.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notifications: Vec<String>,
    /// Required actions returned with the last response.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_actions: Vec<RequiredAction>,
    /// RFC 850 time of the last change made through the API.
    #[serde(default)]
    pub last_updated: Option<String>,
    /// When the resource was first recorded.
    pub created_at: DateTime<Utc>,
    /// When the record last changed.
    pub updated_at: DateTime<Utc>,
}

impl Default for ProviderState {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION.to_string(),
            serial: 0,
            last_modified: Utc::now(),
            resources: Vec::new(),
        }
    }

    /// Gets a resource by address.
    #[must_use]
    pub fn get(&self, address: &str) -> Option<&ResourceState> {
        self.resources.iter().find(|r| r.address == address)
    }

    /// True when the address is tracked.
    #[must_use]
    pub fn contains(&self, address: &str) -> bool {
        self.get(address).is_some()
    }

    /// Records a resource, keeping its position when it is already tracked.
    pub fn upsert(&mut self, resource: ResourceState) {
        match self.resources.iter_mut().find(|r| r.address == resource.address) {
            Some(existing) => {
                let created_at = existing.created_at;
                *existing = ResourceState {
                    created_at,
                    ..resource
                };
            }
            None => self.resources.push(resource),
        }
        self.changed();
    }

    /// Stops tracking a resource.
    pub fn remove(&mut self, address: &str) -> Option<ResourceState> {
        let index = self.resources.iter().position(|r| r.address == address)?;
        let removed = self.resources.remove(index);
        self.changed();
        Some(removed)
    }

    /// Tracked addresses in state order.
    #[must_use]
    pub fn addresses(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.address.as_str()).collect()
    }

    /// Number of tracked resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// True when nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    fn changed(&mut self) {
        self.serial += 1;
        self.last_modified = Utc::now();
    }
}

impl ResourceState {
    /// Records a model read back from the server.
    #[must_use]
    pub fn from_model(
        address: impl Into<String>,
        schema: &ResourceSchema,
        model: &ResourceModel,
        status: ResourceStatus,
        config_hash: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            address: address.into(),
            resource_type: schema.name(),
            status,
            config_hash,
            attributes: model.to_json_map(),
            notifications: model.notifications.clone(),
            required_actions: model.required_actions.clone(),
            last_updated: model.last_updated.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds the typed model for `schema`.
    ///
    /// Attributes missing from the record are null.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Corrupted`] when a recorded value does not
    /// match its attribute kind.
    pub fn to_model(&self, schema: &ResourceSchema) -> Result<ResourceModel> {
        let mut model = ResourceModel::new();

        let kinds = schema
            .identity_attributes()
            .into_iter()
            .map(|name| (name, AttrKind::String))
            .chain(schema.attributes.iter().map(|a| (a.name, a.kind)));

        for (name, kind) in kinds {
            let value = self.attributes.get(name).unwrap_or(&Value::Null);
            let attribute = Attribute::from_json(name, kind, value)
                .map_err(|e| StateError::corrupted(format!("{}: {e}", self.address)))?;
            model.insert(name, attribute);
        }

        model.notifications.clone_from(&self.notifications);
        model.required_actions.clone_from(&self.required_actions);
        model.last_updated.clone_from(&self.last_updated);
        Ok(model)
    }

    /// Recorded value of one attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Adopted => "adopted",
            Self::Imported => "imported",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DirConfigError;
    use crate::resources;
    use crate::types::AttrValue;
    use serde_json::json;

    fn location_state(name: &str) -> ResourceState {
        let schema = resources::lookup("location").expect("registered");
        let model = ResourceModel::new()
            .with("name", Attribute::String(AttrValue::Known(name.to_string())))
            .with("description", Attribute::String(AttrValue::Null));
        ResourceState::from_model(
            format!("location.{name}"),
            &schema,
            &model,
            ResourceStatus::Created,
            Some(String::from("abc")),
        )
    }

    #[test]
    fn test_model_round_trip() {
        let schema = resources::lookup("delegated_admin_resource_rights").expect("registered");
        let mut model = ResourceModel::new()
            .with("delegated_admin_rights_name", Attribute::String(AttrValue::Known("admins".into())))
            .with("rest_resource_type", Attribute::String(AttrValue::Known("users".into())))
            .with("enabled", Attribute::Bool(AttrValue::Known(true)))
            .with("admin_permission", Attribute::Set(AttrValue::Known(["read"].into_iter().collect())));
        model.notifications.push(String::from("restart required"));
        model.last_updated = Some(String::from("Monday, 02-Jan-06 15:04:05 UTC"));

        let state = ResourceState::from_model(
            "delegated_admin_resource_rights.users",
            &schema,
            &model,
            ResourceStatus::Created,
            None,
        );
        assert_eq!(state.attribute("admin_permission"), Some(&json!(["read"])));

        let restored = state.to_model(&schema).expect("valid record");
        assert_eq!(restored.get("enabled"), model.get("enabled"));
        assert_eq!(restored.get("admin_permission"), model.get("admin_permission"));
        assert_eq!(restored.get("description"), Some(&Attribute::String(AttrValue::Null)));
        assert_eq!(restored.notifications, model.notifications);
        assert_eq!(restored.last_updated, model.last_updated);
    }

    #[test]
    fn test_corrupted_record() {
        let schema = resources::lookup("location").expect("registered");
        let mut state = location_state("hq");
        state.attributes.insert(String::from("description"), json!(42));
        let err = state.to_model(&schema).expect_err("corrupted");
        assert!(matches!(err, DirConfigError::State(StateError::Corrupted { .. })));
    }

    #[test]
    fn test_upsert_keeps_order_and_created_at() {
        let mut state = ProviderState::new();
        state.upsert(location_state("a"));
        state.upsert(location_state("b"));
        let created = state.get("location.a").expect("tracked").created_at;

        let mut updated = location_state("a");
        updated.config_hash = Some(String::from("def"));
        state.upsert(updated);

        assert_eq!(state.addresses(), vec!["location.a", "location.b"]);
        let a = state.get("location.a").expect("tracked");
        assert_eq!(a.config_hash.as_deref(), Some("def"));
        assert_eq!(a.created_at, created);
        assert_eq!(state.serial, 3);
    }

    #[test]
    fn test_remove() {
        let mut state = ProviderState::new();
        state.upsert(location_state("a"));
        assert!(state.remove("location.a").is_some());
        assert!(state.remove("location.a").is_none());
        assert!(state.is_empty());
        assert_eq!(state.serial, 2);
    }
}
