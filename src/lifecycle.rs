//! Per-resource lifecycle against the configuration API.
//!
//! [`ResourceManager`] implements create, read, update, delete and import
//! for a single resource instance. Adopted (`default_`) resources are
//! created by reading the existing object and patching it, and are
//! detached instead of deleted.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::client::ConfigApi;
use crate::error::{ApiError, DirConfigError, LifecycleError, Result};
use crate::operations::{Operation, UpdateRequest, create_operations, log_update_operations};
use crate::response::{Diagnostics, read_response};
use crate::schema::ResourceSchema;
use crate::types::ResourceModel;

/// Layout of `last_updated` (RFC 850, e.g. `Monday, 02-Jan-06 15:04:05 UTC`).
pub const LAST_UPDATED_FORMAT: &str = "%A, %d-%b-%y %H:%M:%S UTC";

/// Result of a lifecycle step.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// The resulting state record.
    pub model: ResourceModel,
    /// Operations that were sent, if any.
    pub operations: Vec<Operation>,
    /// Warnings collected along the way.
    pub diagnostics: Diagnostics,
}

/// What happened to a resource on delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The object was deleted on the server.
    Deleted,
    /// The object was left on the server and is no longer tracked.
    Detached,
}

/// Drives one resource instance through its lifecycle.
#[derive(Debug)]
pub struct ResourceManager<A> {
    api: A,
}

/// Current time in the `last_updated` layout.
#[must_use]
pub fn timestamp() -> String {
    Utc::now().format(LAST_UPDATED_FORMAT).to_string()
}

fn failure(err: DirConfigError, summary: String) -> DirConfigError {
    match err {
        DirConfigError::Api(api) => DirConfigError::Api(api.with_summary(summary)),
        other => other,
    }
}

fn identity_only(schema: &ResourceSchema, model: &ResourceModel) -> ResourceModel {
    let mut identity = ResourceModel::new();
    for name in schema.identity_attributes() {
        if let Some(value) = model.get(name) {
            identity.insert(name, value.clone());
        }
    }
    identity
}

impl<A: ConfigApi> ResourceManager<A> {
    /// Creates a manager using the given API.
    pub const fn new(api: A) -> Self {
        Self { api }
    }

    /// Borrows the underlying API.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Creates the object, or adopts it for `default_` schemas.
    ///
    /// # Errors
    ///
    /// Fails on invalid enum values before any request is made, and on API
    /// errors.
    pub async fn create(&self, schema: &ResourceSchema, plan: &ResourceModel) -> Result<Outcome> {
        schema.validate_enums(plan)?;
        if schema.is_default() {
            return self.adopt(schema, plan).await;
        }

        let body = schema.build_add_request(plan)?;
        let collection = schema.collection_endpoint(plan)?;
        debug!(resource_type = %schema.name(), endpoint = %collection, "Adding object");

        let response = self
            .api
            .add(&collection, &body)
            .await
            .map_err(|e| failure(e, format!("An error occurred while creating the {}", schema.display_name)))?;

        let mut diagnostics = Diagnostics::new();
        let mut model = read_response(schema, &response, plan, &mut diagnostics)?;
        model.last_updated = Some(timestamp());
        let id = schema.import_id(&model).unwrap_or_default();
        info!(resource_type = %schema.name(), id = %id, "Created");

        Ok(Outcome {
            model,
            operations: Vec::new(),
            diagnostics,
        })
    }

    /// Reads the existing object, then patches it to match the plan.
    async fn adopt(&self, schema: &ResourceSchema, plan: &ResourceModel) -> Result<Outcome> {
        let object = schema.object_endpoint(plan)?;
        let summary = format!("An error occurred while getting the {}", schema.display_name);
        let response = self.api.get(&object).await.map_err(|e| failure(e, summary))?;

        let mut diagnostics = Diagnostics::new();
        let existing = identity_only(schema, plan);
        let mut state = read_response(schema, &response, &existing, &mut diagnostics)?;

        let operations = create_operations(schema, plan, &state);
        if operations.is_empty() {
            debug!(resource_type = %schema.name(), "Existing object already matches");
        } else {
            log_update_operations(&schema.name(), &operations);
            let summary = format!("An error occurred while updating the {}", schema.display_name);
            let response = self
                .api
                .update(&object, &UpdateRequest::new(operations.clone()))
                .await
                .map_err(|e| failure(e, summary))?;
            state = read_response(schema, &response, plan, &mut diagnostics)?;
        }
        state.last_updated = Some(timestamp());
        info!(resource_type = %schema.name(), endpoint = %object, "Adopted");

        Ok(Outcome {
            model: state,
            operations,
            diagnostics,
        })
    }

    /// Refreshes a record from the server.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] when the object no longer exists, and
    /// other API errors as-is.
    pub async fn read(&self, schema: &ResourceSchema, state: &ResourceModel) -> Result<Outcome> {
        let object = schema.object_endpoint(state)?;
        let summary = format!("An error occurred while getting the {}", schema.display_name);
        let response = self.api.get(&object).await.map_err(|e| failure(e, summary))?;

        let mut diagnostics = Diagnostics::new();
        let model = read_response(schema, &response, state, &mut diagnostics)?;
        Ok(Outcome {
            model,
            operations: Vec::new(),
            diagnostics,
        })
    }

    /// Sends the operations needed to move `state` to `plan`.
    ///
    /// When nothing differs no request is sent and the state is kept.
    ///
    /// # Errors
    ///
    /// Fails on invalid enum values before any request is made, and on API
    /// errors.
    pub async fn update(
        &self,
        schema: &ResourceSchema,
        plan: &ResourceModel,
        state: &ResourceModel,
    ) -> Result<Outcome> {
        schema.validate_enums(plan)?;
        let operations = create_operations(schema, plan, state);
        if operations.is_empty() {
            warn!(resource_type = %schema.name(), "No configuration API operations created for update");
            return Ok(Outcome {
                model: state.clone(),
                operations,
                diagnostics: Diagnostics::new(),
            });
        }

        let object = schema.object_endpoint(state)?;
        log_update_operations(&schema.name(), &operations);
        let summary = format!("An error occurred while updating the {}", schema.display_name);
        let response = self
            .api
            .update(&object, &UpdateRequest::new(operations.clone()))
            .await
            .map_err(|e| failure(e, summary))?;

        let mut diagnostics = Diagnostics::new();
        let mut model = read_response(schema, &response, plan, &mut diagnostics)?;
        model.last_updated = Some(timestamp());
        Ok(Outcome {
            model,
            operations,
            diagnostics,
        })
    }

    /// Deletes the object, or detaches it for `default_` schemas.
    ///
    /// # Errors
    ///
    /// Returns API errors from the delete call.
    pub async fn delete(&self, schema: &ResourceSchema, state: &ResourceModel) -> Result<Removal> {
        if schema.is_default() {
            debug!(resource_type = %schema.name(), "Default resource detached, nothing deleted");
            return Ok(Removal::Detached);
        }
        let object = schema.object_endpoint(state)?;
        let summary = format!("An error occurred while deleting the {}", schema.display_name);
        self.api.delete(&object).await.map_err(|e| failure(e, summary))?;
        info!(resource_type = %schema.name(), endpoint = %object, "Deleted");
        Ok(Removal::Deleted)
    }

    /// Imports an existing object by identifier and reads it.
    ///
    /// # Errors
    ///
    /// Fails on malformed composite identifiers before any request, and on
    /// API errors.
    pub async fn import(&self, schema: &ResourceSchema, id: &str) -> Result<Outcome> {
        let identity = schema.parse_import_id(id)?;
        self.read(schema, &identity).await
    }

    /// Checks that a deleted object is gone.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::StillExists`] when the object can still be
    /// read, and any error other than not-found from the read.
    pub async fn verify_destroyed(&self, schema: &ResourceSchema, state: &ResourceModel) -> Result<()> {
        let object = schema.object_endpoint(state)?;
        match self.api.get(&object).await {
            Ok(_) => Err(LifecycleError::StillExists {
                resource_type: schema.name(),
                id: schema.import_id(state)?,
            }
            .into()),
            Err(DirConfigError::Api(ApiError::NotFound { .. })) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
