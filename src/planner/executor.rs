//! Plan executor.
//!
//! Actions run one at a time in plan order. State is saved after every
//! successful action so an interrupted run leaves an accurate record.

use tracing::{debug, error, info};

use crate::client::ConfigApi;
use crate::config::PlanBuilder;
use crate::error::{DirConfigError, Result, StateError};
use crate::lifecycle::{Outcome, Removal, ResourceManager};
use crate::operations::Operation;
use crate::response::Diagnostics;
use crate::state::{ProviderState, ResourceState, ResourceStatus, StateStore};

use super::diff::{resolve_from_state, schema_for};
use super::plan::{ActionType, DeploymentPlan, PlannedAction};

/// Executor for plans.
pub struct PlanExecutor<'a, A> {
    manager: &'a ResourceManager<A>,
    store: &'a dyn StateStore,
    continue_on_error: bool,
}

/// Result of executing a single action.
#[derive(Debug)]
pub struct ActionResult {
    /// Resource address.
    pub address: String,
    /// What was attempted.
    pub action_type: ActionType,
    /// Whether the action succeeded.
    pub success: bool,
    /// Update operations that were sent.
    pub operations: Vec<Operation>,
    /// Warnings returned by the server.
    pub diagnostics: Diagnostics,
    /// Error message, if failed.
    pub error: Option<String>,
}

/// Result of executing a plan.
#[derive(Debug, Default)]
pub struct ExecutionResult {
    /// Results of the actions that ran.
    pub results: Vec<ActionResult>,
    /// Number of successful actions.
    pub successful: usize,
    /// Number of failed actions.
    pub failed: usize,
    /// Actions not attempted after a failure.
    pub skipped: usize,
    /// Whether every action succeeded.
    pub success: bool,
}

impl ExecutionResult {
    fn from_results(results: Vec<ActionResult>, planned: usize) -> Self {
        let successful = results.iter().filter(|r| r.success).count();
        let failed = results.len() - successful;
        Self {
            skipped: planned.saturating_sub(results.len()),
            successful,
            failed,
            success: failed == 0,
            results,
        }
    }
}

impl ActionResult {
    fn new(action_type: ActionType, address: &str, outcome: Result<Option<Outcome>>) -> Self {
        match outcome {
            Ok(outcome) => {
                let (operations, diagnostics) =
                    outcome.map_or_else(|| (Vec::new(), Diagnostics::new()), |o| (o.operations, o.diagnostics));
                Self {
                    address: address.to_string(),
                    action_type,
                    success: true,
                    operations,
                    diagnostics,
                    error: None,
                }
            }
            Err(e) => {
                error!("Failed to {action_type} {address}: {e}");
                Self {
                    address: address.to_string(),
                    action_type,
                    success: false,
                    operations: Vec::new(),
                    diagnostics: Diagnostics::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

impl<'a, A: ConfigApi> PlanExecutor<'a, A> {
    /// Creates an executor that saves state to `store`.
    #[must_use]
    pub fn new(manager: &'a ResourceManager<A>, store: &'a dyn StateStore) -> Self {
        Self {
            manager,
            store,
            continue_on_error: false,
        }
    }

    /// Keep going after a failed action.
    #[must_use]
    pub const fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    /// Executes a plan against `state`.
    ///
    /// # Errors
    ///
    /// Returns an error only when state cannot be saved; action failures are
    /// reported in the result.
    pub async fn execute(&self, plan: &DeploymentPlan, state: &mut ProviderState) -> Result<ExecutionResult> {
        let planned = plan.change_count();
        info!("Executing plan with {planned} changes");

        let mut results = Vec::new();
        for action in &plan.actions {
            if action.action_type == ActionType::NoChange {
                self.record_hash(action, state).await?;
                continue;
            }

            info!("{}", action.description());
            let outcome = self.execute_action(action, state).await;
            let result = ActionResult::new(action.action_type, &action.address, outcome);
            let success = result.success;
            results.push(result);

            if success {
                self.store.save(state).await?;
            } else if !self.continue_on_error {
                break;
            }
        }

        Ok(ExecutionResult::from_results(results, planned))
    }

    /// Deletes or detaches every tracked resource, newest first.
    ///
    /// Regular deletes are checked to be gone before they leave state.
    ///
    /// # Errors
    ///
    /// Returns an error only when state cannot be saved.
    pub async fn destroy(&self, state: &mut ProviderState) -> Result<ExecutionResult> {
        let addresses: Vec<String> = state.addresses().into_iter().rev().map(String::from).collect();
        let planned = addresses.len();
        info!("Destroying {planned} resources");

        let mut results = Vec::new();
        for address in addresses {
            let outcome = self.remove(&address, state, true).await;
            let action_type = match &outcome {
                Ok(Removal::Detached) => ActionType::Detach,
                _ => ActionType::Delete,
            };
            let result = ActionResult::new(action_type, &address, outcome.map(|_| None));
            let success = result.success;
            results.push(result);

            if success {
                self.store.save(state).await?;
            } else if !self.continue_on_error {
                break;
            }
        }

        Ok(ExecutionResult::from_results(results, planned))
    }

    async fn execute_action(&self, action: &PlannedAction, state: &mut ProviderState) -> Result<Option<Outcome>> {
        match action.action_type {
            ActionType::Create | ActionType::Adopt => self.create(action, state).await.map(Some),
            ActionType::Update => self.update(action, state).await.map(Some),
            ActionType::Replace => {
                self.remove(&action.address, state, false).await?;
                self.store.save(state).await?;
                self.create(action, state).await.map(Some)
            }
            ActionType::Delete | ActionType::Detach => {
                self.remove(&action.address, state, false).await.map(|_| None)
            }
            ActionType::NoChange => Ok(None),
        }
    }

    async fn create(&self, action: &PlannedAction, state: &mut ProviderState) -> Result<Outcome> {
        let declaration = action
            .declaration
            .as_ref()
            .ok_or_else(|| DirConfigError::internal(format!("No declaration for {}", action.address)))?;
        let schema = schema_for(&declaration.resource_type)?;

        // References are resolved again: earlier actions may have filled them in.
        let plan = PlanBuilder::new(&schema).build(declaration, None, &resolve_from_state(state))?;
        let outcome = self.manager.create(&schema, &plan).await?;

        let status = if schema.is_default() {
            ResourceStatus::Adopted
        } else {
            ResourceStatus::Created
        };
        state.upsert(ResourceState::from_model(
            &action.address,
            &schema,
            &outcome.model,
            status,
            action.config_hash.clone(),
        ));
        Ok(outcome)
    }

    async fn update(&self, action: &PlannedAction, state: &mut ProviderState) -> Result<Outcome> {
        let declaration = action
            .declaration
            .as_ref()
            .ok_or_else(|| DirConfigError::internal(format!("No declaration for {}", action.address)))?;
        let schema = schema_for(&declaration.resource_type)?;
        let recorded = state.get(&action.address).cloned().ok_or_else(|| StateError::NotTracked {
            address: action.address.clone(),
        })?;
        let prior = recorded.to_model(&schema)?;

        let plan = PlanBuilder::new(&schema).build(declaration, Some(&prior), &resolve_from_state(state))?;
        let outcome = self.manager.update(&schema, &plan, &prior).await?;

        let mut updated = ResourceState::from_model(
            &action.address,
            &schema,
            &outcome.model,
            recorded.status,
            action.config_hash.clone(),
        );
        updated.created_at = recorded.created_at;
        state.upsert(updated);
        Ok(outcome)
    }

    /// Deletes (or detaches) one tracked resource and drops it from state.
    async fn remove(&self, address: &str, state: &mut ProviderState, verify: bool) -> Result<Removal> {
        let recorded = state.get(address).ok_or_else(|| StateError::NotTracked {
            address: address.to_string(),
        })?;
        let schema = schema_for(&recorded.resource_type)?;
        let prior = recorded.to_model(&schema)?;

        let removal = self.manager.delete(&schema, &prior).await?;
        if verify && removal == Removal::Deleted {
            self.manager.verify_destroyed(&schema, &prior).await?;
        }

        state.remove(address);
        Ok(removal)
    }

    /// Records a new declaration hash for an unchanged resource.
    async fn record_hash(&self, action: &PlannedAction, state: &mut ProviderState) -> Result<()> {
        let Some(mut recorded) = state.get(&action.address).cloned() else {
            return Ok(());
        };
        if recorded.config_hash == action.config_hash {
            return Ok(());
        }
        debug!("Recording new declaration hash for {}", action.address);
        recorded.config_hash.clone_from(&action.config_hash);
        state.upsert(recorded);
        self.store.save(state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Endpoint, MockConfigApi};
    use crate::config::{ConfigParser, DeclarationFile};
    use crate::error::ApiError;
    use crate::planner::DiffEngine;
    use crate::resources;
    use crate::state::LocalStateStore;
    use crate::types::{AttrValue, Attribute, ResourceModel};
    use mockall::Sequence;
    use mockall::predicate::eq;
    use serde_json::json;
    use tempfile::TempDir;

    const RIGHTS: &str = r"
provider:
  https_host: https://localhost:1443
  username: cn=administrator
resources:
  - type: delegated_admin_rights
    name: admins
    attributes:
      id: admins
      enabled: true
  - type: delegated_admin_resource_rights
    name: users
    attributes:
      delegated_admin_rights_name: ${delegated_admin_rights.admins.id}
      rest_resource_type: users
      enabled: true
      admin_permission: [read]
";

    fn declarations() -> DeclarationFile {
        ConfigParser::new().parse_yaml(RIGHTS, None).expect("valid yaml")
    }

    fn store() -> (LocalStateStore, TempDir) {
        let dir = TempDir::new().expect("tempdir");
        (LocalStateStore::new(dir.path()), dir)
    }

    fn rights_collection() -> Endpoint {
        Endpoint::collection("delegated-admin-rights")
    }

    fn resource_rights_collection() -> Endpoint {
        rights_collection()
            .join("admins")
            .join("delegated-admin-resource-rights")
    }

    #[tokio::test]
    async fn test_apply_creates_in_order_and_resolves_references() {
        let (store, _dir) = store();
        let mut api = MockConfigApi::new();
        api.expect_add()
            .with(eq(rights_collection()), eq(json!({"id": "admins", "enabled": true})))
            .times(1)
            .returning(|_, _| Ok(json!({"id": "admins", "enabled": true})));
        api.expect_add()
            .withf(|endpoint, body| {
                *endpoint == resource_rights_collection() && body["restResourceType"] == "users"
            })
            .times(1)
            .returning(|_, _| {
                Ok(json!({
                    "id": "users",
                    "restResourceType": "users",
                    "enabled": true,
                    "adminPermission": ["read"],
                    "adminScope": "all-resources-in-base"
                }))
            });
        let manager = ResourceManager::new(api);

        let mut state = ProviderState::new();
        let plan = DiffEngine::new().compute_plan(&declarations(), &state).expect("plan");
        let result = PlanExecutor::new(&manager, &store)
            .execute(&plan, &mut state)
            .await
            .expect("executed");

        assert!(result.success);
        assert_eq!(result.successful, 2);
        let users = state
            .get("delegated_admin_resource_rights.users")
            .expect("tracked");
        assert_eq!(users.attribute("delegated_admin_rights_name"), Some(&json!("admins")));
        assert_eq!(users.attribute("admin_scope"), Some(&json!("all-resources-in-base")));
        assert_eq!(users.status, ResourceStatus::Created);

        let saved = store.load().await.expect("load").expect("saved");
        assert_eq!(saved.addresses(), state.addresses());

        // A second plan against the new state has nothing to do.
        let plan = DiffEngine::new().compute_plan(&declarations(), &state).expect("plan");
        assert!(plan.is_empty());
    }

    #[tokio::test]
    async fn test_first_failure_stops_execution() {
        let (store, _dir) = store();
        let mut api = MockConfigApi::new();
        api.expect_add().times(1).returning(|_, _| {
            Err(ApiError::RequestFailed {
                summary: String::from("POST delegated-admin-rights"),
                status: 400,
                detail: Some(String::from("bad request")),
                body: None,
            }
            .into())
        });
        let manager = ResourceManager::new(api);

        let mut state = ProviderState::new();
        let plan = DiffEngine::new().compute_plan(&declarations(), &state).expect("plan");
        let result = PlanExecutor::new(&manager, &store)
            .execute(&plan, &mut state)
            .await
            .expect("executed");

        assert!(!result.success);
        assert_eq!(result.failed, 1);
        assert_eq!(result.skipped, 1);
        let message = result.results[0].error.as_deref().expect("error");
        assert!(message.contains("An error occurred while creating the Delegated Admin Rights"));
        assert!(state.is_empty());
        assert!(store.load().await.expect("load").is_none());
    }

    #[tokio::test]
    async fn test_continue_on_error_attempts_everything() {
        let (store, _dir) = store();
        let mut api = MockConfigApi::new();
        api.expect_add()
            .times(1)
            .returning(|_, _| Err(ApiError::network("connection reset").into()));
        let manager = ResourceManager::new(api);

        let mut state = ProviderState::new();
        let plan = DiffEngine::new().compute_plan(&declarations(), &state).expect("plan");
        let result = PlanExecutor::new(&manager, &store)
            .with_continue_on_error(true)
            .execute(&plan, &mut state)
            .await
            .expect("executed");

        // The dependent create fails before any request: its parent is unknown.
        assert_eq!(result.failed, 2);
        assert_eq!(result.skipped, 0);
        let message = result.results[1].error.as_deref().expect("error");
        assert!(message.contains("delegated_admin_rights_name"));
    }

    fn location_file(attributes: &str) -> DeclarationFile {
        let yaml = format!(
            "provider:\n  https_host: https://localhost:1443\n  username: cn=administrator\n\
             resources:\n  - type: location\n    name: office\n    attributes: {attributes}\n"
        );
        ConfigParser::new().parse_yaml(&yaml, None).expect("valid yaml")
    }

    fn tracked_location(name: &str, description: &str, status: ResourceStatus) -> ResourceState {
        let schema = resources::lookup("location").expect("registered");
        let model = ResourceModel::new()
            .with("name", Attribute::String(AttrValue::Known(name.to_string())))
            .with("description", Attribute::String(AttrValue::Known(description.to_string())));
        ResourceState::from_model("location.office", &schema, &model, status, None)
    }

    #[tokio::test]
    async fn test_update_patches_and_keeps_record_metadata() {
        let (store, _dir) = store();
        let mut state = ProviderState::new();
        state.upsert(tracked_location("Austin", "x", ResourceStatus::Imported));
        let created_at = state.get("location.office").expect("tracked").created_at;

        let declarations = location_file("{name: Austin, description: \"\"}");
        let plan = DiffEngine::new().compute_plan(&declarations, &state).expect("plan");
        let action = plan.changes().next().expect("one change");
        assert_eq!(action.action_type, ActionType::Update);
        assert_eq!(action.operations, vec![Operation::remove("description")]);

        let mut api = MockConfigApi::new();
        api.expect_update()
            .withf(|endpoint, request| {
                *endpoint == Endpoint::collection("locations").join("Austin")
                    && request.operations == vec![Operation::remove("description")]
            })
            .times(1)
            .returning(|_, _| Ok(json!({"id": "Austin"})));
        let manager = ResourceManager::new(api);

        let result = PlanExecutor::new(&manager, &store)
            .execute(&plan, &mut state)
            .await
            .expect("executed");

        assert!(result.success);
        assert_eq!(result.results[0].operations, vec![Operation::remove("description")]);
        let office = state.get("location.office").expect("tracked");
        assert_eq!(office.status, ResourceStatus::Imported);
        assert_eq!(office.created_at, created_at);
        assert_eq!(office.attribute("description"), Some(&json!("")));
        assert_eq!(office.config_hash, plan.actions[0].config_hash);

        let saved = store.load().await.expect("load").expect("saved");
        assert_eq!(saved.get("location.office").expect("saved").config_hash, office.config_hash);
        let plan = DiffEngine::new().compute_plan(&declarations, &state).expect("plan");
        assert!(plan.is_empty());
    }

    #[tokio::test]
    async fn test_replace_deletes_then_creates() {
        let (store, _dir) = store();
        let mut state = ProviderState::new();
        state.upsert(tracked_location("Austin", "x", ResourceStatus::Created));

        let declarations = location_file("{name: Dallas, description: x}");
        let plan = DiffEngine::new().compute_plan(&declarations, &state).expect("plan");
        assert_eq!(plan.actions[0].action_type, ActionType::Replace);

        let mut seq = Sequence::new();
        let mut api = MockConfigApi::new();
        api.expect_delete()
            .with(eq(Endpoint::collection("locations").join("Austin")))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        api.expect_add()
            .with(
                eq(Endpoint::collection("locations")),
                eq(json!({"id": "Dallas", "description": "x"})),
            )
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(json!({"id": "Dallas", "description": "x"})));
        let manager = ResourceManager::new(api);

        let result = PlanExecutor::new(&manager, &store)
            .execute(&plan, &mut state)
            .await
            .expect("executed");

        assert!(result.success);
        assert_eq!(result.results[0].action_type, ActionType::Replace);
        assert_eq!(state.addresses(), vec!["location.office"]);
        let office = state.get("location.office").expect("tracked");
        assert_eq!(office.attribute("name"), Some(&json!("Dallas")));
        assert_eq!(office.status, ResourceStatus::Created);
        assert_eq!(office.config_hash, plan.actions[0].config_hash);

        let saved = store.load().await.expect("load").expect("saved");
        assert_eq!(
            saved.get("location.office").expect("saved").attribute("name"),
            Some(&json!("Dallas"))
        );
    }

    #[tokio::test]
    async fn test_failed_replace_leaves_old_object_untracked() {
        let (store, _dir) = store();
        let mut state = ProviderState::new();
        state.upsert(tracked_location("Austin", "x", ResourceStatus::Created));

        let declarations = location_file("{name: Dallas}");
        let plan = DiffEngine::new().compute_plan(&declarations, &state).expect("plan");

        let mut api = MockConfigApi::new();
        api.expect_delete().times(1).returning(|_| Ok(()));
        api.expect_add()
            .times(1)
            .returning(|_, _| Err(ApiError::network("connection reset").into()));
        let manager = ResourceManager::new(api);

        let result = PlanExecutor::new(&manager, &store)
            .execute(&plan, &mut state)
            .await
            .expect("executed");

        assert!(!result.success);
        assert!(state.is_empty());
        let saved = store.load().await.expect("load").expect("saved after delete");
        assert!(saved.is_empty());
    }

    #[tokio::test]
    async fn test_destroy_verifies_and_detaches() {
        let (store, _dir) = store();
        let mut state = ProviderState::new();
        let location = resources::lookup("location").expect("registered");
        let gc = resources::lookup("default_periodic_gc_plugin").expect("registered");
        state.upsert(ResourceState::from_model(
            "location.hq",
            &location,
            &ResourceModel::new().with("name", Attribute::String(AttrValue::Known("hq".into()))),
            ResourceStatus::Created,
            None,
        ));
        state.upsert(ResourceState::from_model(
            "default_periodic_gc_plugin.gc",
            &gc,
            &ResourceModel::new().with("id", Attribute::String(AttrValue::Known("Periodic GC".into()))),
            ResourceStatus::Adopted,
            None,
        ));

        let endpoint = Endpoint::collection("locations").join("hq");
        let mut api = MockConfigApi::new();
        api.expect_delete()
            .with(eq(endpoint.clone()))
            .times(1)
            .returning(|_| Ok(()));
        api.expect_get()
            .with(eq(endpoint))
            .times(1)
            .returning(|e| Err(ApiError::NotFound { path: e.to_string() }.into()));
        let manager = ResourceManager::new(api);

        let result = PlanExecutor::new(&manager, &store)
            .destroy(&mut state)
            .await
            .expect("destroyed");

        assert!(result.success);
        let kinds: Vec<(ActionType, &str)> = result
            .results
            .iter()
            .map(|r| (r.action_type, r.address.as_str()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (ActionType::Detach, "default_periodic_gc_plugin.gc"),
                (ActionType::Delete, "location.hq"),
            ]
        );
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn test_destroy_keeps_objects_that_still_exist() {
        let (store, _dir) = store();
        let mut state = ProviderState::new();
        let location = resources::lookup("location").expect("registered");
        state.upsert(ResourceState::from_model(
            "location.hq",
            &location,
            &ResourceModel::new().with("name", Attribute::String(AttrValue::Known("hq".into()))),
            ResourceStatus::Created,
            None,
        ));

        let mut api = MockConfigApi::new();
        api.expect_delete().returning(|_| Ok(()));
        api.expect_get().returning(|_| Ok(json!({"id": "hq"})));
        let manager = ResourceManager::new(api);

        let result = PlanExecutor::new(&manager, &store)
            .destroy(&mut state)
            .await
            .expect("ran");
        assert!(!result.success);
        assert!(result.results[0]
            .error
            .as_deref()
            .is_some_and(|e| e.contains("still exists")));
        assert!(state.contains("location.hq"));
    }
}
