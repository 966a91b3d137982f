//! Declaration handling.
//!
//! This module covers everything between `dirconfig.yaml` and a plan record:
//! - Parsing the declaration file and resolving provider settings
//! - Validation of declarations against the resource catalogue
//! - `${type.name.attribute}` references between resources
//! - Building tri-state plans
//! - Declaration hashes for change detection

mod builder;
mod hash;
mod parser;
mod reference;
mod spec;
mod validator;

pub use builder::PlanBuilder;
pub use hash::ConfigHasher;
pub use parser::{
    ConfigParser, DEFAULT_CONFIG_FILES, ENV_HTTPS_HOST, ENV_INSECURE_TRUST_ALL_TLS, ENV_PASSWORD,
    ENV_USERNAME, expand_env, find_config_file, resolve_provider,
};
pub use reference::{Reference, find_references, resolve_value};
pub use spec::{
    DeclarationFile, ProviderConfig, ResourceDeclaration, StateConfig, address, split_address,
};
pub use validator::{ConfigValidator, ValidationIssue, ValidationResult};
