//! Resource schemas.
//!
//! Schemas describe each resource type as data: attribute kinds and flags,
//! identity layout, and where the objects live in the configuration API.
//! The concrete catalogue lives in [`crate::resources`].

mod attribute;
mod resource;

pub use attribute::{AttributeDescriptor, camel_case};
pub use resource::{Identity, ResourceSchema, Variant};
