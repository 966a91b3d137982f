//! Plan/state diff into configuration API update operations.
//!
//! Each `add_*_operation_if_necessary` function compares one planned value
//! with the last known state value and appends the operations needed to move
//! the server from one to the other. None of them perform I/O or fail.
//!
//! - an unknown plan value never produces an operation;
//! - a null plan value, or an empty string for string attributes, removes
//!   the property;
//! - sets are diffed element by element, additions first.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::schema::{AttributeDescriptor, ResourceSchema};
use crate::types::{AttrValue, Attribute, ResourceModel, StringSet};

/// Kind of update operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Add a value to a multi-valued property.
    Add,
    /// Replace the value of a property.
    Replace,
    /// Remove a property or one value of it.
    Remove,
}

/// A single update operation, serialized as `{"op", "path", "value"?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation kind.
    pub op: OperationKind,
    /// Property path, or a value filter such as `[path eq "value"]`.
    pub path: String,
    /// New value, absent for removals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Body of an update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    /// Operations, applied in order.
    pub operations: Vec<Operation>,
}

impl Operation {
    /// `add` operation.
    #[must_use]
    pub fn add(path: &str, value: impl Into<String>) -> Self {
        Self {
            op: OperationKind::Add,
            path: path.to_string(),
            value: Some(value.into()),
        }
    }

    /// `replace` operation.
    #[must_use]
    pub fn replace(path: &str, value: impl Into<String>) -> Self {
        Self {
            op: OperationKind::Replace,
            path: path.to_string(),
            value: Some(value.into()),
        }
    }

    /// `remove` operation for a whole property.
    #[must_use]
    pub fn remove(path: &str) -> Self {
        Self {
            op: OperationKind::Remove,
            path: path.to_string(),
            value: None,
        }
    }

    /// `remove` operation for one value of a multi-valued property.
    #[must_use]
    pub fn remove_value(path: &str, value: &str) -> Self {
        Self::remove(&format!("[{path} eq \"{value}\"]"))
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "ADD"),
            Self::Replace => write!(f, "REPLACE"),
            Self::Remove => write!(f, "REMOVE"),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} {}=\"{}\"", self.op, self.path, value),
            None => write!(f, "{} {}", self.op, self.path),
        }
    }
}

impl UpdateRequest {
    /// Wraps a list of operations.
    #[must_use]
    pub const fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }
}

fn add_scalar_operation<T: PartialEq>(
    ops: &mut Vec<Operation>,
    plan: &AttrValue<T>,
    state: &AttrValue<T>,
    path: &str,
    render: impl FnOnce(&T) -> Option<String>,
) {
    if plan.is_unknown() || plan == state {
        return;
    }
    match plan.known().and_then(render) {
        Some(value) => ops.push(Operation::replace(path, value)),
        None => ops.push(Operation::remove(path)),
    }
}

/// Adds a `replace` or `remove` when the planned boolean differs.
pub fn add_bool_operation_if_necessary(
    ops: &mut Vec<Operation>,
    plan: &AttrValue<bool>,
    state: &AttrValue<bool>,
    path: &str,
) {
    add_scalar_operation(ops, plan, state, path, |b| Some(b.to_string()));
}

/// Adds a `replace` or `remove` when the planned integer differs.
pub fn add_int64_operation_if_necessary(
    ops: &mut Vec<Operation>,
    plan: &AttrValue<i64>,
    state: &AttrValue<i64>,
    path: &str,
) {
    add_scalar_operation(ops, plan, state, path, |i| Some(i.to_string()));
}

/// Adds a `replace` or `remove` when the planned string differs.
///
/// The empty string is treated as null so that computed properties can be
/// reset.
pub fn add_string_operation_if_necessary(
    ops: &mut Vec<Operation>,
    plan: &AttrValue<String>,
    state: &AttrValue<String>,
    path: &str,
) {
    add_string_operation(ops, plan, state, path, true);
}

fn add_string_operation(
    ops: &mut Vec<Operation>,
    plan: &AttrValue<String>,
    state: &AttrValue<String>,
    path: &str,
    empty_string_is_null: bool,
) {
    add_scalar_operation(ops, plan, state, path, |s| {
        (!(empty_string_is_null && s.is_empty())).then(|| s.clone())
    });
}

/// Adds one `add` per new element and one value `remove` per dropped element.
pub fn add_string_set_operations_if_necessary(
    ops: &mut Vec<Operation>,
    plan: &AttrValue<StringSet>,
    state: &AttrValue<StringSet>,
    path: &str,
) {
    if plan.is_unknown() || plan == state {
        return;
    }
    let empty = StringSet::new();
    let planned = plan.known().unwrap_or(&empty);
    let current = state.known().unwrap_or(&empty);

    for value in planned.iter().filter(|v| !current.contains(v)) {
        ops.push(Operation::add(path, value));
    }
    for value in current.iter().filter(|v| !planned.contains(v)) {
        ops.push(Operation::remove_value(path, value));
    }
}

/// Diffs one attribute according to its descriptor.
pub fn add_attribute_operations(
    ops: &mut Vec<Operation>,
    descriptor: &AttributeDescriptor,
    plan: &Attribute,
    state: &Attribute,
) {
    let path = descriptor.path.as_str();
    match (plan, state) {
        (Attribute::String(p), Attribute::String(s)) => {
            add_string_operation(ops, p, s, path, descriptor.empty_string_is_null);
        }
        (Attribute::Bool(p), Attribute::Bool(s)) => add_bool_operation_if_necessary(ops, p, s, path),
        (Attribute::Int(p), Attribute::Int(s)) => add_int64_operation_if_necessary(ops, p, s, path),
        (Attribute::Set(p), Attribute::Set(s)) => {
            add_string_set_operations_if_necessary(ops, p, s, path);
        }
        _ => {
            debug!(
                attribute = descriptor.name,
                "Plan and state disagree on attribute kind, skipping"
            );
        }
    }
}

/// Builds the update operations that move `state` to `plan`, walking the
/// schema's attributes in declaration order. Identity attributes are never
/// diffed.
#[must_use]
pub fn create_operations(
    schema: &ResourceSchema,
    plan: &ResourceModel,
    state: &ResourceModel,
) -> Vec<Operation> {
    let mut ops = Vec::new();
    for descriptor in &schema.attributes {
        let planned = plan.typed(descriptor.name, descriptor.kind);
        let current = state.typed(descriptor.name, descriptor.kind);
        add_attribute_operations(&mut ops, descriptor, &planned, &current);
    }
    ops
}

/// Logs update operations at debug level before they are sent.
pub fn log_update_operations(resource_type: &str, ops: &[Operation]) {
    debug!(resource_type, count = ops.len(), "Update operations");
    for op in ops {
        debug!(resource_type, "  {}", op);
    }
}
