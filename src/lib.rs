// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(nonstandard_style)]           // Non-standard code style is forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # dirconfig
//!
//! Declarative, plan/apply configuration management for a directory
//! server's configuration API.
//!
//! ## Overview
//!
//! dirconfig keeps server configuration objects (locations, plug-ins,
//! external servers, delegated admin rights, ...) in line with a YAML
//! declaration file:
//!
//! - Declare the objects you want in `dirconfig.yaml`
//! - `plan` refreshes recorded state and shows the PATCH operations needed
//! - `apply` executes the plan one object at a time, saving state as it goes
//! - Objects that exist on every fresh server are adopted as `default_<type>`
//!
//! ## Architecture
//!
//! 1. **Declarations** ([`config`]): provider settings plus resources,
//!    turned into tri-state plan records ([`types`]).
//! 2. **State** ([`state`]): the last-known values of every managed object.
//! 3. **Diff** ([`operations`]): plan vs. state per attribute, yielding
//!    add / replace / remove operations.
//! 4. **Lifecycle** ([`lifecycle`]): create / read / update / delete / import
//!    against the configuration API ([`client`]), with responses mapped back
//!    by [`response`].
//! 5. **Planner** ([`planner`]): whole-file plans and their execution.
//!
//! ## Example
//!
//! ```yaml
//! provider:
//!   https_host: https://localhost:1443
//!   username: cn=administrator
//!   password: ${DIRCONFIG_PASSWORD}
//!
//! resources:
//!   - type: delegated_admin_rights
//!     name: admins
//!     attributes:
//!       id: admins
//!       enabled: true
//!   - type: delegated_admin_resource_rights
//!     name: users
//!     attributes:
//!       delegated_admin_rights_name: ${delegated_admin_rights.admins.id}
//!       rest_resource_type: users
//!       enabled: true
//!       admin_permission: [read]
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod operations;
pub mod planner;
pub mod resources;
pub mod response;
pub mod schema;
pub mod state;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use client::{ConfigApi, ConfigApiClient};
pub use config::{ConfigHasher, ConfigParser, ConfigValidator, DeclarationFile};
pub use error::{DirConfigError, Result};
pub use lifecycle::ResourceManager;
pub use planner::{DeploymentPlan, DiffEngine, PlanExecutor};
pub use state::{LocalStateStore, ProviderState, StateStore};
