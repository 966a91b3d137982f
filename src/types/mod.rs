//! Tri-state values and resource records.
//!
//! This module holds the value types shared by the diff engine, the response
//! mapper and the state store.

mod model;
mod set;
mod value;

pub use model::{AttrKind, Attribute, RequiredAction, ResourceModel};
pub use set::StringSet;
pub use value::{AttrValue, string_or_null};
