//! `${type.name.attribute}` references between declared resources.
//!
//! A reference is only recognised when it is the whole string value (or a
//! whole set element). Environment-style `${NAME}` placeholders have no dots
//! and are left alone here.

use serde_json::Value;
use std::fmt;

/// A reference to an attribute of another managed resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    /// Referenced resource type.
    pub resource_type: String,
    /// Referenced local name.
    pub name: String,
    /// Referenced attribute.
    pub attribute: String,
}

impl Reference {
    /// Parses `${type.name.attribute}`; anything else is a literal.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let inner = text.strip_prefix("${")?.strip_suffix('}')?;
        let mut parts = inner.split('.');
        let (Some(resource_type), Some(name), Some(attribute), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return None;
        };
        if [resource_type, name, attribute]
            .iter()
            .any(|p| p.is_empty() || p.chars().any(char::is_whitespace))
        {
            return None;
        }
        Some(Self {
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            attribute: attribute.to_string(),
        })
    }

    /// Address of the referenced resource.
    #[must_use]
    pub fn address(&self) -> String {
        super::address(&self.resource_type, &self.name)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}.{}.{}}}", self.resource_type, self.name, self.attribute)
    }
}

/// True when the text looks like a `${...}` placeholder with dots but is
/// not a well-formed reference.
#[must_use]
pub fn is_malformed_reference(text: &str) -> bool {
    text.starts_with("${") && text.ends_with('}') && text.contains('.') && Reference::parse(text).is_none()
}

/// Every reference in a declared value, in order of appearance.
#[must_use]
pub fn find_references(value: &Value) -> Vec<Reference> {
    match value {
        Value::String(s) => Reference::parse(s).into_iter().collect(),
        Value::Array(items) => items.iter().flat_map(find_references).collect(),
        _ => Vec::new(),
    }
}

/// Replaces references in a declared value using `resolve`.
///
/// Returns `None` when any reference cannot be resolved yet. A reference
/// inside a list that resolves to a list is spliced in.
pub fn resolve_value<F>(value: &Value, resolve: &F) -> Option<Value>
where
    F: Fn(&Reference) -> Option<Value>,
{
    match value {
        Value::String(s) => match Reference::parse(s) {
            Some(reference) => resolve(&reference),
            None => Some(value.clone()),
        },
        Value::Array(items) => {
            let mut resolved = Vec::with_capacity(items.len());
            for item in items {
                match resolve_value(item, resolve)? {
                    Value::Array(inner) => resolved.extend(inner),
                    other => resolved.push(other),
                }
            }
            Some(Value::Array(resolved))
        }
        other => Some(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse() {
        let reference = Reference::parse("${delegated_admin_rights.admins.id}").expect("reference");
        assert_eq!(reference.resource_type, "delegated_admin_rights");
        assert_eq!(reference.name, "admins");
        assert_eq!(reference.attribute, "id");
        assert_eq!(reference.address(), "delegated_admin_rights.admins");
        assert_eq!(reference.to_string(), "${delegated_admin_rights.admins.id}");

        assert!(Reference::parse("${DIRCONFIG_PASSWORD}").is_none());
        assert!(Reference::parse("prefix ${a.b.c}").is_none());
        assert!(Reference::parse("${a.b}").is_none());
        assert!(Reference::parse("${a..c}").is_none());
    }

    #[test]
    fn test_malformed() {
        assert!(is_malformed_reference("${a.b}"));
        assert!(!is_malformed_reference("${a.b.c}"));
        assert!(!is_malformed_reference("${HOME}"));
        assert!(!is_malformed_reference("cn=a.b"));
    }

    #[test]
    fn test_find_references() {
        let value = json!(["${location.hq.name}", "literal", "${plugin.gc.id}"]);
        let found = find_references(&value);
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].address(), "plugin.gc");
        assert!(find_references(&json!(true)).is_empty());
    }

    #[test]
    fn test_resolve_value() {
        let resolve = |r: &Reference| match r.address().as_str() {
            "location.hq" => Some(json!("Austin")),
            "rights.admins" => Some(json!(["read", "update"])),
            _ => None,
        };

        assert_eq!(resolve_value(&json!("${location.hq.name}"), &resolve), Some(json!("Austin")));
        assert_eq!(
            resolve_value(&json!(["create", "${rights.admins.admin_permission}"]), &resolve),
            Some(json!(["create", "read", "update"]))
        );
        assert_eq!(resolve_value(&json!("${location.gone.name}"), &resolve), None);
        assert_eq!(resolve_value(&json!(["a", "${location.gone.name}"]), &resolve), None);
        assert_eq!(resolve_value(&json!(5), &resolve), Some(json!(5)));
    }
}
