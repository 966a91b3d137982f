//! Declaration file types.
//!
//! This module defines the structs that map to `dirconfig.yaml`: provider
//! connection settings, where state is kept, and the list of declared
//! resources.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use validator::Validate;

/// Root of a declaration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeclarationFile {
    /// Connection settings for the configuration API.
    pub provider: ProviderConfig,
    /// Local state settings.
    #[serde(default)]
    pub state: StateConfig,
    /// Declared resources, in apply order.
    #[serde(default)]
    pub resources: Vec<ResourceDeclaration>,
}

/// Connection settings for the configuration API.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct ProviderConfig {
    /// Server address, e.g. `https://localhost:1443`.
    #[validate(url(message = "https_host must be a URL"))]
    pub https_host: String,
    /// Bind user for basic authentication.
    #[validate(length(min = 1, message = "username must not be empty"))]
    pub username: String,
    /// Bind password.
    #[serde(default)]
    pub password: String,
    /// Accept any server certificate.
    #[serde(default)]
    pub insecure_trust_all_tls: bool,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1, max = 600, message = "timeout_secs must be between 1 and 600"))]
    pub timeout_secs: u64,
}

// Keeps the password out of logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("https_host", &self.https_host)
            .field("username", &self.username)
            .field("password", &"********")
            .field("insecure_trust_all_tls", &self.insecure_trust_all_tls)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

const fn default_timeout_secs() -> u64 {
    30
}

/// Local state settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateConfig {
    /// Directory holding `state.json` and `state.lock`.
    #[serde(default = "default_state_path")]
    pub path: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

fn default_state_path() -> String {
    String::from(".dirconfig")
}

/// One declared resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceDeclaration {
    /// Resource type, e.g. `location` or `default_periodic_gc_plugin`.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Local name, unique per type.
    pub name: String,
    /// Attribute values as written in the file.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl ResourceDeclaration {
    /// Creates an empty declaration.
    #[must_use]
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Adds an attribute value.
    #[must_use]
    pub fn with(mut self, attribute: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(attribute.into(), value);
        self
    }

    /// State address: `type.name`.
    #[must_use]
    pub fn address(&self) -> String {
        address(&self.resource_type, &self.name)
    }
}

/// Builds a state address from a type and a local name.
#[must_use]
pub fn address(resource_type: &str, name: &str) -> String {
    format!("{resource_type}.{name}")
}

/// Splits a state address into type and local name.
#[must_use]
pub fn split_address(address: &str) -> Option<(&str, &str)> {
    address
        .split_once('.')
        .filter(|(t, n)| !t.is_empty() && !n.is_empty() && !n.contains('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let yaml = r"
provider:
  https_host: https://localhost:1443
  username: cn=administrator
";
        let file: DeclarationFile = serde_yaml::from_str(yaml).expect("valid yaml");
        assert_eq!(file.state.path, ".dirconfig");
        assert_eq!(file.provider.timeout_secs, 30);
        assert!(!file.provider.insecure_trust_all_tls);
        assert!(file.resources.is_empty());
    }

    #[test]
    fn test_resource_attributes_keep_yaml_types() {
        let yaml = r"
provider:
  https_host: https://localhost:1443
  username: cn=administrator
resources:
  - type: delegated_admin_resource_rights
    name: users
    attributes:
      enabled: true
      admin_permission: [read, update]
      description: ~
";
        let file: DeclarationFile = serde_yaml::from_str(yaml).expect("valid yaml");
        let decl = &file.resources[0];
        assert_eq!(decl.address(), "delegated_admin_resource_rights.users");
        assert_eq!(decl.attributes["enabled"], json!(true));
        assert_eq!(decl.attributes["admin_permission"], json!(["read", "update"]));
        assert_eq!(decl.attributes["description"], Value::Null);
    }

    #[test]
    fn test_provider_validation() {
        let mut provider = ProviderConfig {
            https_host: String::from("https://localhost:1443"),
            username: String::from("cn=administrator"),
            password: String::from("secret"),
            insecure_trust_all_tls: true,
            timeout_secs: 30,
        };
        assert!(provider.validate().is_ok());

        provider.timeout_secs = 0;
        assert!(provider.validate().is_err());

        provider.timeout_secs = 30;
        provider.https_host = String::from("localhost");
        assert!(provider.validate().is_err());
    }

    #[test]
    fn test_debug_hides_password() {
        let provider = ProviderConfig {
            https_host: String::from("https://localhost:1443"),
            username: String::from("cn=administrator"),
            password: String::from("2FederateM0re"),
            insecure_trust_all_tls: false,
            timeout_secs: 30,
        };
        assert!(!format!("{provider:?}").contains("2FederateM0re"));
    }

    #[test]
    fn test_split_address() {
        assert_eq!(split_address("location.hq"), Some(("location", "hq")));
        assert_eq!(split_address("location"), None);
        assert_eq!(split_address("a.b.c"), None);
        assert_eq!(split_address(".hq"), None);
    }
}
