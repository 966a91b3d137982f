//! Diff engine comparing declarations with recorded state.
//!
//! Each declaration is turned into a plan record and compared with its
//! state record through the operation diff, which yields the action for
//! that resource.

use serde_json::Value;
use tracing::debug;

use crate::config::{ConfigHasher, DeclarationFile, PlanBuilder, Reference, ResourceDeclaration};
use crate::error::{ConfigError, Result};
use crate::operations::create_operations;
use crate::resources;
use crate::schema::ResourceSchema;
use crate::state::{ProviderState, ResourceState};
use crate::types::{Attribute, ResourceModel};

use super::plan::{ActionType, DeploymentPlan, PlannedAction};

/// Reason recorded when the declaration changed since the last apply.
pub const REASON_CHANGED: &str = "configuration changed";
/// Reason recorded when the server no longer matches an unchanged declaration.
pub const REASON_DRIFT: &str = "drift";

/// Engine for computing plans.
#[derive(Debug, Default)]
pub struct DiffEngine {
    hasher: ConfigHasher,
}

/// Resolves `${type.name.attribute}` from recorded state.
pub fn resolve_from_state(state: &ProviderState) -> impl Fn(&Reference) -> Option<Value> + '_ {
    move |reference: &Reference| {
        state
            .get(&reference.address())
            .and_then(|r| r.attribute(&reference.attribute))
            .cloned()
    }
}

/// Looks up the schema for a declared or recorded type.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownResourceType`] for unregistered types.
pub fn schema_for(resource_type: &str) -> Result<ResourceSchema> {
    resources::lookup(resource_type).ok_or_else(|| {
        ConfigError::UnknownResourceType {
            resource_type: resource_type.to_string(),
        }
        .into()
    })
}

impl DiffEngine {
    /// Creates a new diff engine.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            hasher: ConfigHasher::new(),
        }
    }

    /// Hash recorded for a declaration.
    #[must_use]
    pub fn hash(&self, declaration: &ResourceDeclaration) -> String {
        self.hasher.hash_resource(declaration)
    }

    /// Computes the plan for a declaration file against recorded state.
    ///
    /// Deletes and detaches of undeclared resources come first, in reverse
    /// state order, followed by one action per declaration in file order.
    ///
    /// # Errors
    ///
    /// Fails on unknown types, invalid attribute values and corrupted state
    /// records.
    pub fn compute_plan(&self, file: &DeclarationFile, state: &ProviderState) -> Result<DeploymentPlan> {
        let mut actions = Vec::new();

        for recorded in state.resources.iter().rev() {
            if file.resources.iter().any(|d| d.address() == recorded.address) {
                continue;
            }
            let schema = schema_for(&recorded.resource_type)?;
            debug!("{} is no longer declared", recorded.address);
            actions.push(Self::removal(&schema, recorded, "no longer declared"));
        }

        let resolve = resolve_from_state(state);
        for declaration in &file.resources {
            let schema = schema_for(&declaration.resource_type)?;
            let recorded = state.get(&declaration.address());
            let prior = recorded.map(|r| r.to_model(&schema)).transpose()?;
            let plan = PlanBuilder::new(&schema).build(declaration, prior.as_ref(), &resolve)?;
            let hash = self.hash(declaration);

            let action = match (recorded, prior) {
                (Some(recorded), Some(prior)) => {
                    Self::compare(&schema, declaration, recorded, &prior, &plan, hash)
                }
                _ => Self::addition(&schema, declaration, &plan, hash),
            };
            debug!("{action}");
            actions.push(action);
        }

        Ok(DeploymentPlan::new(&self.hasher.hash_file(file), actions))
    }

    fn addition(
        schema: &ResourceSchema,
        declaration: &ResourceDeclaration,
        plan: &ResourceModel,
        hash: String,
    ) -> PlannedAction {
        let (action_type, reason) = if schema.is_default() {
            (ActionType::Adopt, "existing object will be taken over")
        } else {
            (ActionType::Create, "not in state")
        };
        Self::action(action_type, declaration, reason, plan, hash)
    }

    fn compare(
        schema: &ResourceSchema,
        declaration: &ResourceDeclaration,
        recorded: &ResourceState,
        prior: &ResourceModel,
        plan: &ResourceModel,
        hash: String,
    ) -> PlannedAction {
        for name in schema.identity_attributes() {
            let changed = match plan.get(name) {
                Some(Attribute::String(v)) if v.is_unknown() => true,
                planned => planned != prior.get(name),
            };
            if changed {
                let reason = format!("{name} forces replacement");
                return Self::action(ActionType::Replace, declaration, &reason, plan, hash);
            }
        }

        let operations = create_operations(schema, plan, prior);
        let hash_matches = recorded
            .config_hash
            .as_deref()
            .is_some_and(|h| ConfigHasher::hashes_match(h, &hash));

        let mut action = if operations.is_empty() {
            Self::action(ActionType::NoChange, declaration, "", plan, hash)
        } else {
            let reason = if hash_matches { REASON_DRIFT } else { REASON_CHANGED };
            Self::action(ActionType::Update, declaration, reason, plan, hash)
        };
        action.operations = operations;
        action
    }

    fn action(
        action_type: ActionType,
        declaration: &ResourceDeclaration,
        reason: &str,
        plan: &ResourceModel,
        hash: String,
    ) -> PlannedAction {
        PlannedAction {
            action_type,
            address: declaration.address(),
            resource_type: declaration.resource_type.clone(),
            reason: reason.to_string(),
            operations: Vec::new(),
            unknown: plan.unknown_attributes().into_iter().map(String::from).collect(),
            declaration: Some(declaration.clone()),
            config_hash: Some(hash),
        }
    }

    fn removal(schema: &ResourceSchema, recorded: &ResourceState, reason: &str) -> PlannedAction {
        let action_type = if schema.is_default() {
            ActionType::Detach
        } else {
            ActionType::Delete
        };
        PlannedAction {
            action_type,
            address: recorded.address.clone(),
            resource_type: recorded.resource_type.clone(),
            reason: reason.to_string(),
            operations: Vec::new(),
            unknown: Vec::new(),
            declaration: None,
            config_hash: None,
        }
    }
}
