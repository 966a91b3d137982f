//! Refreshing recorded state from the server.

use tracing::{info, warn};

use crate::client::ConfigApi;
use crate::error::Result;
use crate::lifecycle::ResourceManager;
use crate::response::Diagnostics;
use crate::state::{ProviderState, ResourceState};

use super::diff::schema_for;

/// What a refresh changed.
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Addresses whose recorded values changed.
    pub updated: Vec<String>,
    /// Addresses dropped because the object no longer exists.
    pub removed: Vec<String>,
    /// Warnings returned by the server.
    pub diagnostics: Diagnostics,
}

impl RefreshReport {
    /// True when state was modified.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.updated.is_empty() || !self.removed.is_empty()
    }
}

/// Reads every tracked object and records what the server returns.
///
/// Objects that no longer exist are dropped from state.
///
/// # Errors
///
/// Returns the first error other than not-found.
pub async fn refresh_state<A: ConfigApi>(
    manager: &ResourceManager<A>,
    state: &mut ProviderState,
) -> Result<RefreshReport> {
    let mut report = RefreshReport::default();
    let addresses: Vec<String> = state.addresses().into_iter().map(String::from).collect();

    for address in addresses {
        let Some(recorded) = state.get(&address).cloned() else {
            continue;
        };
        let schema = schema_for(&recorded.resource_type)?;
        let prior = recorded.to_model(&schema)?;

        match manager.read(&schema, &prior).await {
            Ok(mut outcome) => {
                report.diagnostics.append(&mut outcome.diagnostics);
                let mut fresh = ResourceState::from_model(
                    &address,
                    &schema,
                    &outcome.model,
                    recorded.status,
                    recorded.config_hash.clone(),
                );
                fresh.created_at = recorded.created_at;
                if fresh.attributes != recorded.attributes
                    || fresh.notifications != recorded.notifications
                    || fresh.required_actions != recorded.required_actions
                {
                    state.upsert(fresh);
                    report.updated.push(address);
                }
            }
            Err(e) if e.is_not_found() => {
                warn!("{address} no longer exists on the server, removing it from state");
                state.remove(&address);
                report.removed.push(address);
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Refreshed {} resources ({} updated, {} removed)",
        state.len() + report.removed.len(),
        report.updated.len(),
        report.removed.len()
    );
    Ok(report)
}
