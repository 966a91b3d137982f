//! Declaration hashing for change detection.
//!
//! The hash of each declaration is recorded in state at apply time. On the
//! next plan an unchanged hash with pending operations means the server
//! drifted; a changed hash means the declaration was edited.

use sha2::{Digest, Sha256};

use super::spec::{DeclarationFile, ResourceDeclaration};

/// Hasher for declarations.
#[derive(Debug, Default)]
pub struct ConfigHasher;

impl ConfigHasher {
    /// Creates a new hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Hash of every resource declaration, in order.
    #[must_use]
    pub fn hash_file(&self, file: &DeclarationFile) -> String {
        let mut hasher = Sha256::new();
        for resource in &file.resources {
            hasher.update(self.hash_resource(resource).as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// Hash of one declaration.
    ///
    /// Attributes are hashed in key order with their JSON encoding, so YAML
    /// formatting and key order do not matter.
    #[must_use]
    pub fn hash_resource(&self, resource: &ResourceDeclaration) -> String {
        let mut hasher = Sha256::new();

        hasher.update(resource.resource_type.as_bytes());
        hasher.update([0u8]);
        hasher.update(resource.name.as_bytes());

        for (key, value) in &resource.attributes {
            hasher.update([0u8]);
            hasher.update(key.as_bytes());
            hasher.update([b'=']);
            hasher.update(value.to_string().as_bytes());
        }

        hex::encode(hasher.finalize())
    }

    /// First 8 characters of a hash, for display.
    #[must_use]
    pub fn short_hash(&self, hash: &str) -> String {
        hash.chars().take(8).collect()
    }

    /// Compares two hashes in constant time.
    #[must_use]
    pub fn hashes_match(hash1: &str, hash2: &str) -> bool {
        if hash1.len() != hash2.len() {
            return false;
        }

        hash1
            .bytes()
            .zip(hash2.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn location(name: &str) -> ResourceDeclaration {
        ResourceDeclaration::new("location", name).with("description", json!("headquarters"))
    }

    #[test]
    fn test_resource_hash_deterministic() {
        let hasher = ConfigHasher::new();
        assert_eq!(hasher.hash_resource(&location("hq")), hasher.hash_resource(&location("hq")));
    }

    #[test]
    fn test_attribute_order_does_not_matter() {
        let hasher = ConfigHasher::new();
        let a = ResourceDeclaration::new("location", "hq")
            .with("name", json!("hq"))
            .with("description", json!("x"));
        let b = ResourceDeclaration::new("location", "hq")
            .with("description", json!("x"))
            .with("name", json!("hq"));
        assert_eq!(hasher.hash_resource(&a), hasher.hash_resource(&b));
    }

    #[test]
    fn test_changes_change_the_hash() {
        let hasher = ConfigHasher::new();
        let base = hasher.hash_resource(&location("hq"));
        assert_ne!(base, hasher.hash_resource(&location("branch")));
        assert_ne!(
            base,
            hasher.hash_resource(&location("hq").with("description", json!("moved")))
        );
        assert_ne!(
            hasher.hash_resource(&ResourceDeclaration::new("a", "bc")),
            hasher.hash_resource(&ResourceDeclaration::new("ab", "c"))
        );
    }

    #[test]
    fn test_short_hash() {
        let hasher = ConfigHasher::new();
        let short = hasher.short_hash("abcdef1234567890abcdef1234567890");
        assert_eq!(short, "abcdef12");
    }

    #[test]
    fn test_hashes_match() {
        assert!(ConfigHasher::hashes_match("abc123", "abc123"));
        assert!(!ConfigHasher::hashes_match("abc123", "abc124"));
        assert!(!ConfigHasher::hashes_match("abc123", "abc12"));
    }
}
