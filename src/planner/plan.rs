//! Plan types.
//!
//! A [`DeploymentPlan`] lists one [`PlannedAction`] per declared or tracked
//! resource, already in execution order.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::config::ResourceDeclaration;
use crate::operations::Operation;

/// A complete plan.
#[derive(Debug, Clone)]
pub struct DeploymentPlan {
    /// When the plan was created.
    pub created_at: DateTime<Utc>,
    /// Hash of the declaration file this plan is based on.
    pub config_hash: String,
    /// Actions in execution order, including unchanged resources.
    pub actions: Vec<PlannedAction>,
}

/// What happens to one resource.
#[derive(Debug, Clone)]
pub struct PlannedAction {
    /// Action type.
    pub action_type: ActionType,
    /// `type.name`.
    pub address: String,
    /// Declared (or recorded) type.
    pub resource_type: String,
    /// Why this action is needed.
    pub reason: String,
    /// Update operations known at plan time.
    pub operations: Vec<Operation>,
    /// Attributes that will only be known after apply.
    pub unknown: Vec<String>,
    /// The declaration to apply; `None` for deletes.
    pub declaration: Option<ResourceDeclaration>,
    /// Declaration hash to record on success.
    pub config_hash: Option<String>,
}

/// Kinds of planned actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    /// Create a new object.
    Create,
    /// Take over an existing `default_` object.
    Adopt,
    /// Delete (or detach) and create again.
    Replace,
    /// Patch the object.
    Update,
    /// Nothing to do.
    NoChange,
    /// Delete the object.
    Delete,
    /// Stop tracking a `default_` object, leaving it on the server.
    Detach,
}

impl ActionType {
    /// Symbol used in plan output.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Create | Self::Adopt => "+",
            Self::Replace => "-/+",
            Self::Update => "~",
            Self::NoChange => " ",
            Self::Delete | Self::Detach => "-",
        }
    }
}

impl DeploymentPlan {
    /// Creates a plan from ordered actions.
    #[must_use]
    pub fn new(config_hash: &str, actions: Vec<PlannedAction>) -> Self {
        Self {
            created_at: Utc::now(),
            config_hash: config_hash.to_string(),
            actions,
        }
    }

    /// Actions that change something.
    pub fn changes(&self) -> impl Iterator<Item = &PlannedAction> {
        self.actions
            .iter()
            .filter(|a| a.action_type != ActionType::NoChange)
    }

    /// True when nothing needs to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes().next().is_none()
    }

    /// Number of actions that change something.
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.changes().count()
    }

    /// Number of actions of one type.
    #[must_use]
    pub fn count(&self, action_type: ActionType) -> usize {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .count()
    }

    /// Summary line, e.g. `2 to add, 1 to change, 0 to destroy`.
    #[must_use]
    pub fn summary(&self) -> String {
        let add = self.count(ActionType::Create) + self.count(ActionType::Adopt) + self.count(ActionType::Replace);
        let change = self.count(ActionType::Update);
        let destroy = self.count(ActionType::Delete) + self.count(ActionType::Detach) + self.count(ActionType::Replace);
        format!("{add} to add, {change} to change, {destroy} to destroy")
    }
}

impl PlannedAction {
    /// Human-readable description of the action.
    #[must_use]
    pub fn description(&self) -> String {
        match self.action_type {
            ActionType::Create => format!("Create {}", self.address),
            ActionType::Adopt => format!("Adopt {}", self.address),
            ActionType::Replace => format!("Replace {}", self.address),
            ActionType::Update => format!("Update {}", self.address),
            ActionType::NoChange => format!("No change for {}", self.address),
            ActionType::Delete => format!("Delete {}", self.address),
            ActionType::Detach => format!("Detach {}", self.address),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Adopt => "adopt",
            Self::Replace => "replace",
            Self::Update => "update",
            Self::NoChange => "no change",
            Self::Delete => "delete",
            Self::Detach => "detach",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.action_type, self.address)?;
        if !self.reason.is_empty() {
            write!(f, " ({})", self.reason)?;
        }
        Ok(())
    }
}

impl fmt::Display for DeploymentPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "No changes required");
        }

        writeln!(f, "Plan ({}):", self.summary())?;
        for action in self.changes() {
            writeln!(f, "  {} {action}", action.action_type.symbol())?;
            for op in &action.operations {
                writeln!(f, "      {op}")?;
            }
        }
        Ok(())
    }
}
