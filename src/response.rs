//! Maps configuration API objects back into resource models.
//!
//! The mapper reconciles the server's view with what was planned:
//! - an absent string stays an empty string when one was expected;
//! - write-only values are never returned and are carried over;
//! - absent sets are empty sets;
//! - configuration messages are copied and reported as warnings.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use tracing::warn;

use crate::error::ApiError;
use crate::schema::{AttributeDescriptor, Identity, ResourceSchema};
use crate::types::{
    AttrKind, AttrValue, Attribute, RequiredAction, ResourceModel, StringSet, string_or_null,
};

/// Extension carrying notifications and required actions.
pub const MESSAGES_URN: &str = "urn:pingidentity:schemas:configuration:messages:2.0";

/// A warning surfaced to the user after an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Short summary.
    pub summary: String,
    /// Details.
    pub detail: String,
}

/// Warnings collected while processing a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    warnings: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning.
    pub fn add_warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.warnings.push(Diagnostic {
            summary: summary.into(),
            detail: detail.into(),
        });
    }

    /// Recorded warnings.
    #[must_use]
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// True when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Moves all warnings from `other` into this collection.
    pub fn append(&mut self, other: &mut Self) {
        self.warnings.append(&mut other.warnings);
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.summary, self.detail)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Messages {
    #[serde(default)]
    notifications: Vec<String>,
    #[serde(default)]
    required_actions: Vec<RequiredAction>,
}

fn invalid(schema: &ResourceSchema, field: &str, expected: AttrKind) -> ApiError {
    ApiError::invalid_response(format!(
        "{} property '{field}' is not a {expected}",
        schema.display_name
    ))
}

fn read_string(
    schema: &ResourceSchema,
    field: &str,
    value: Option<&Value>,
) -> Result<Option<String>, ApiError> {
    match value {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(invalid(schema, field, AttrKind::String)),
    }
}

fn read_attribute(
    schema: &ResourceSchema,
    descriptor: &AttributeDescriptor,
    value: Option<&Value>,
    expected: &ResourceModel,
) -> Result<Attribute, ApiError> {
    let field = descriptor.field.as_str();
    let attribute = match descriptor.kind {
        AttrKind::String if descriptor.write_only => match expected.string(descriptor.name) {
            AttrValue::Unknown => Attribute::String(AttrValue::Null),
            other => Attribute::String(other),
        },
        AttrKind::String => {
            let keep_empty = expected.string(descriptor.name).is_empty_string();
            let s = read_string(schema, field, value)?;
            Attribute::String(string_or_null(s.as_deref(), keep_empty))
        }
        AttrKind::Bool => match value {
            None => Attribute::Bool(AttrValue::Null),
            Some(v) => Attribute::Bool(AttrValue::Known(
                v.as_bool().ok_or_else(|| invalid(schema, field, AttrKind::Bool))?,
            )),
        },
        AttrKind::Int => match value {
            None => Attribute::Int(AttrValue::Null),
            Some(v) => Attribute::Int(AttrValue::Known(
                v.as_i64().ok_or_else(|| invalid(schema, field, AttrKind::Int))?,
            )),
        },
        AttrKind::Set => {
            let mut set = StringSet::new();
            if let Some(v) = value {
                let items = v.as_array().ok_or_else(|| invalid(schema, field, AttrKind::Set))?;
                for item in items {
                    set.insert(item.as_str().ok_or_else(|| invalid(schema, field, AttrKind::Set))?);
                }
            }
            Attribute::Set(AttrValue::Known(set))
        }
    };
    Ok(attribute)
}

fn read_identity(
    schema: &ResourceSchema,
    object: &Map<String, Value>,
    expected: &ResourceModel,
    model: &mut ResourceModel,
) -> Result<(), ApiError> {
    let returned = read_string(schema, "id", non_null(object.get("id")))?;
    match schema.identity {
        Identity::Single { attribute } => {
            let value = returned.map_or_else(|| expected.string(attribute), AttrValue::Known);
            model.insert(attribute, Attribute::String(value));
        }
        Identity::Composite { parent, child, .. } => {
            let field = schema.identity_field();
            let child_value = read_string(schema, &field, non_null(object.get(&field)))?
                .or(returned)
                .map_or_else(|| expected.string(child), AttrValue::Known);
            model.insert(parent, Attribute::String(expected.string(parent)));
            model.insert(child, Attribute::String(child_value));
        }
    }
    Ok(())
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// Reads notifications and required actions, logging each one.
fn read_messages(
    object: &Map<String, Value>,
    model: &mut ResourceModel,
    diagnostics: &mut Diagnostics,
) -> Result<(), ApiError> {
    let Some(raw) = non_null(object.get(MESSAGES_URN)) else {
        return Ok(());
    };
    let messages: Messages = serde_json::from_value(raw.clone())
        .map_err(|e| ApiError::invalid_response(format!("Invalid configuration messages: {e}")))?;

    for message in &messages.notifications {
        warn!("Configuration API Notification: {message}");
        diagnostics.add_warning("Configuration API Notification", message.clone());
    }
    for action in &messages.required_actions {
        let rendered = serde_json::to_string(action).unwrap_or_else(|_| action.synopsis.clone());
        warn!("Configuration API RequiredAction: {rendered}");
        diagnostics.add_warning("Configuration API RequiredAction", rendered);
    }

    model.notifications = messages.notifications;
    model.required_actions = messages.required_actions;
    Ok(())
}

/// Warns when the server stored a formatted value differently than planned,
/// for example `1 s` planned and `1000 ms` returned.
fn check_formatted(
    schema: &ResourceSchema,
    expected: &ResourceModel,
    model: &ResourceModel,
    diagnostics: &mut Diagnostics,
) {
    for descriptor in schema.attributes.iter().filter(|a| a.formatted) {
        let planned = expected.string(descriptor.name);
        let Some(planned) = planned.known().filter(|s| !s.is_empty()) else {
            continue;
        };
        let actual = model.string(descriptor.name);
        if actual.known() == Some(planned) {
            continue;
        }
        let detail = format!(
            "Attribute '{}' was set to '{planned}' but the server returned '{actual}'. \
             Use the server's format to avoid a perpetual diff.",
            descriptor.name
        );
        warn!("{detail}");
        diagnostics.add_warning("Mismatched formatted attribute", detail);
    }
}

/// Builds a resource model from an API object.
///
/// `expected` is the record the caller was aiming for: the plan after
/// create and update, the prior state after read.
///
/// # Errors
///
/// Returns [`ApiError::InvalidResponse`] when the response is not an object
/// or a property has the wrong JSON type.
pub fn read_response(
    schema: &ResourceSchema,
    response: &Value,
    expected: &ResourceModel,
    diagnostics: &mut Diagnostics,
) -> Result<ResourceModel, ApiError> {
    let object = response
        .as_object()
        .ok_or_else(|| ApiError::invalid_response("Expected a JSON object"))?;

    let mut model = ResourceModel::new();
    read_identity(schema, object, expected, &mut model)?;
    for descriptor in &schema.attributes {
        let value = non_null(object.get(&descriptor.field));
        let attribute = read_attribute(schema, descriptor, value, expected)?;
        model.insert(descriptor.name, attribute);
    }
    read_messages(object, &mut model, diagnostics)?;
    check_formatted(schema, expected, &model, diagnostics);
    model.last_updated.clone_from(&expected.last_updated);
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources;
    use serde_json::json;

    fn known(s: &str) -> Attribute {
        Attribute::String(AttrValue::Known(s.to_string()))
    }

    #[test]
    fn test_absent_string_follows_expected() {
        let schema = resources::lookup("location").expect("registered");
        let response = json!({"id": "Austin"});
        let mut diagnostics = Diagnostics::new();

        let expected = ResourceModel::new().with("description", known(""));
        let model = read_response(&schema, &response, &expected, &mut diagnostics).expect("valid");
        assert_eq!(model.get("description"), Some(&known("")));

        let expected = ResourceModel::new();
        let model = read_response(&schema, &response, &expected, &mut diagnostics).expect("valid");
        assert_eq!(model.get("description"), Some(&Attribute::String(AttrValue::Null)));
        assert_eq!(model.known_string("name"), Some("Austin"));
    }

    #[test]
    fn test_write_only_carried_over() {
        let schema = resources::lookup("ping_identity_ds_external_server").expect("registered");
        let response = json!({"id": "ds1", "serverHostName": "ldap.example.com", "serverPort": 636});
        let mut diagnostics = Diagnostics::new();

        let expected = ResourceModel::new().with("password", known("secret"));
        let model = read_response(&schema, &response, &expected, &mut diagnostics).expect("valid");
        assert_eq!(model.get("password"), Some(&known("secret")));
        assert_eq!(model.get("server_port"), Some(&Attribute::Int(AttrValue::Known(636))));
        assert_eq!(model.get("abandon_on_timeout"), Some(&Attribute::Bool(AttrValue::Null)));

        let expected = ResourceModel::new().with("password", Attribute::String(AttrValue::Unknown));
        let model = read_response(&schema, &response, &expected, &mut diagnostics).expect("valid");
        assert_eq!(model.get("password"), Some(&Attribute::String(AttrValue::Null)));
    }

    #[test]
    fn test_absent_set_is_empty() {
        let schema = resources::lookup("delegated_admin_resource_rights").expect("registered");
        let response = json!({"restResourceType": "users", "enabled": true});
        let expected = ResourceModel::new().with("delegated_admin_rights_name", known("admins"));
        let mut diagnostics = Diagnostics::new();
        let model = read_response(&schema, &response, &expected, &mut diagnostics).expect("valid");

        assert_eq!(
            model.get("admin_permission"),
            Some(&Attribute::Set(AttrValue::Known(StringSet::new())))
        );
        assert_eq!(model.known_string("delegated_admin_rights_name"), Some("admins"));
        assert_eq!(model.known_string("rest_resource_type"), Some("users"));
    }

    #[test]
    fn test_wrong_json_type_is_invalid() {
        let schema = resources::lookup("delegated_admin_rights").expect("registered");
        let response = json!({"id": "admins", "enabled": "yes"});
        let mut diagnostics = Diagnostics::new();
        let err = read_response(&schema, &response, &ResourceModel::new(), &mut diagnostics)
            .expect_err("enabled must be a boolean");
        assert!(matches!(err, ApiError::InvalidResponse { .. }));

        let err = read_response(&schema, &json!(["x"]), &ResourceModel::new(), &mut diagnostics)
            .expect_err("not an object");
        assert!(matches!(err, ApiError::InvalidResponse { .. }));
    }

    #[test]
    fn test_messages_become_warnings() {
        let schema = resources::lookup("delegated_admin_rights").expect("registered");
        let response = json!({
            "id": "admins",
            "enabled": true,
            MESSAGES_URN: {
                "notifications": ["The server must be restarted"],
                "requiredActions": [{
                    "property": "enabled",
                    "type": "component-restart",
                    "synopsis": "Restart the HTTP connection handler"
                }]
            }
        });
        let mut diagnostics = Diagnostics::new();
        let model = read_response(&schema, &response, &ResourceModel::new(), &mut diagnostics)
            .expect("valid");

        assert_eq!(model.notifications, vec![String::from("The server must be restarted")]);
        assert_eq!(model.required_actions.len(), 1);
        assert_eq!(model.required_actions[0].action_type, "component-restart");
        assert_eq!(diagnostics.warnings().len(), 2);
        assert!(diagnostics.warnings()[1].detail.contains("component-restart"));
    }

    #[test]
    fn test_formatted_mismatch_warns() {
        let schema = resources::lookup("ping_one_http_external_server").expect("registered");
        let response = json!({"id": "p1", "connectTimeout": "10 s", "responseTimeout": "5 s"});
        let expected = ResourceModel::new()
            .with("connect_timeout", known("10s"))
            .with("response_timeout", known("5 s"));
        let mut diagnostics = Diagnostics::new();
        read_response(&schema, &response, &expected, &mut diagnostics).expect("valid");

        assert_eq!(diagnostics.warnings().len(), 1);
        assert!(diagnostics.warnings()[0].detail.contains("connect_timeout"));
    }
}
