//! Configuration API trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::operations::UpdateRequest;

use super::endpoint::Endpoint;

/// Add / get / update / delete against the configuration API.
///
/// Objects are exchanged as raw JSON; the response mapper turns them into
/// resource models.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfigApi: Send + Sync {
    /// Creates an object in a collection and returns it.
    async fn add(&self, collection: &Endpoint, body: &Value) -> Result<Value>;

    /// Reads an object.
    async fn get(&self, object: &Endpoint) -> Result<Value>;

    /// Applies update operations to an object and returns it.
    async fn update(&self, object: &Endpoint, request: &UpdateRequest) -> Result<Value>;

    /// Deletes an object.
    async fn delete(&self, object: &Endpoint) -> Result<()>;
}

#[async_trait]
impl ConfigApi for Box<dyn ConfigApi> {
    async fn add(&self, collection: &Endpoint, body: &Value) -> Result<Value> {
        (**self).add(collection, body).await
    }

    async fn get(&self, object: &Endpoint) -> Result<Value> {
        (**self).get(object).await
    }

    async fn update(&self, object: &Endpoint, request: &UpdateRequest) -> Result<Value> {
        (**self).update(object, request).await
    }

    async fn delete(&self, object: &Endpoint) -> Result<()> {
        (**self).delete(object).await
    }
}
