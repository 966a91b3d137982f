//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::{ConfigHasher, ValidationResult};
use crate::operations::Operation;
use crate::planner::{ActionType, DeploymentPlan, ExecutionResult, RefreshReport};
use crate::response::Diagnostics;
use crate::schema::ResourceSchema;
use crate::state::ProviderState;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Plan action row for table display.
#[derive(Tabled)]
struct PlanActionRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

/// State resource row for table display.
#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Last updated")]
    last_updated: String,
}

/// Attribute row for `schema <type>`.
#[derive(Tabled)]
struct AttributeRow {
    #[tabled(rename = "Attribute")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Flags")]
    flags: String,
    #[tabled(rename = "Description")]
    doc: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Selected format.
    #[must_use]
    pub const fn format(&self) -> OutputFormat {
        self.format
    }

    /// Formats a plan for display; `detailed` includes unchanged resources.
    #[must_use]
    pub fn format_plan(&self, plan: &DeploymentPlan, detailed: bool) -> String {
        match self.format {
            OutputFormat::Json => to_json(&PlanJson::new(plan, detailed)),
            OutputFormat::Text => Self::format_plan_text(plan, detailed),
        }
    }

    fn format_plan_text(plan: &DeploymentPlan, detailed: bool) -> String {
        if plan.is_empty() && !detailed {
            return format!("{} No changes required - configuration is up to date.\n", "✓".green());
        }

        let mut output = String::new();
        let _ = write!(output, "\nPlan (declarations {})\n\n", ConfigHasher::new().short_hash(&plan.config_hash));

        let rows: Vec<PlanActionRow> = plan
            .actions
            .iter()
            .filter(|a| detailed || a.action_type != ActionType::NoChange)
            .enumerate()
            .map(|(i, a)| PlanActionRow {
                index: i + 1,
                action: Self::format_action_type(a.action_type),
                resource: a.address.clone(),
                reason: Self::truncate(&a.reason, 40),
            })
            .collect();
        if !rows.is_empty() {
            output.push_str(&Table::new(rows).to_string());
            output.push('\n');
        }

        for action in plan.changes() {
            if action.operations.is_empty() && action.unknown.is_empty() {
                continue;
            }
            let _ = writeln!(output, "\n  {} {}", action.action_type.symbol(), action.address.bold());
            for op in &action.operations {
                let _ = writeln!(output, "      {op}");
            }
            for name in &action.unknown {
                let _ = writeln!(output, "      {name} = {}", "(known after apply)".dimmed());
            }
        }

        let _ = write!(output, "\nPlan: {}\n", plan.summary());
        output
    }

    /// Formats the outcome of an apply or destroy.
    #[must_use]
    pub fn format_execution(&self, result: &ExecutionResult) -> String {
        match self.format {
            OutputFormat::Json => to_json(&ExecutionJson::from(result)),
            OutputFormat::Text => {
                let mut output = String::new();
                for r in &result.results {
                    if r.success {
                        let _ = writeln!(output, "{} {} {}", "✓".green(), r.action_type, r.address);
                    } else {
                        let _ = writeln!(
                            output,
                            "{} {} {}: {}",
                            "✗".red(),
                            r.action_type,
                            r.address,
                            r.error.as_deref().unwrap_or_default()
                        );
                    }
                    output.push_str(&Self::diagnostics_text(&r.diagnostics));
                }

                let status = if result.success {
                    "complete".green().to_string()
                } else {
                    "failed".red().to_string()
                };
                let _ = write!(
                    output,
                    "\nExecution {status}: {} succeeded, {} failed, {} skipped\n",
                    result.successful, result.failed, result.skipped
                );
                output
            }
        }
    }

    /// Formats a refresh report.
    #[must_use]
    pub fn format_refresh(&self, report: &RefreshReport) -> String {
        match self.format {
            OutputFormat::Json => to_json(&serde_json::json!({
                "updated": report.updated,
                "removed": report.removed,
                "warnings": DiagnosticJson::list(&report.diagnostics),
            })),
            OutputFormat::Text => {
                if !report.changed() {
                    return format!("{} State matches the server.\n", "✓".green());
                }
                let mut output = String::new();
                for address in &report.updated {
                    let _ = writeln!(output, "  {} {address}", "~".yellow());
                }
                for address in &report.removed {
                    let _ = writeln!(output, "  {} {address} (no longer exists)", "-".red());
                }
                output.push_str(&Self::diagnostics_text(&report.diagnostics));
                output
            }
        }
    }

    /// Formats a validation result.
    #[must_use]
    pub fn format_validation(&self, result: &ValidationResult, resources: usize) -> String {
        match self.format {
            OutputFormat::Json => to_json(&serde_json::json!({
                "valid": result.is_valid(),
                "resources": resources,
                "errors": result
                    .errors
                    .iter()
                    .map(|e| serde_json::json!({"field": e.field, "message": e.message}))
                    .collect::<Vec<_>>(),
                "warnings": result.warnings,
            })),
            OutputFormat::Text => {
                let mut output = String::new();
                if result.is_valid() {
                    let _ = writeln!(output, "{} Declarations are valid ({resources} resources).", "✓".green());
                } else {
                    let _ = writeln!(output, "{} Declarations are invalid:", "✗".red());
                    for issue in &result.errors {
                        let _ = writeln!(output, "   - {}: {}", issue.field, issue.message);
                    }
                }
                for warning in &result.warnings {
                    let _ = writeln!(output, "{} {warning}", "⚠".yellow());
                }
                output
            }
        }
    }

    /// Formats recorded state.
    #[must_use]
    pub fn format_state(&self, state: &ProviderState) -> String {
        match self.format {
            OutputFormat::Json => to_json(state),
            OutputFormat::Text => {
                let mut output = String::new();
                let _ = writeln!(output, "\nState version {} (serial {})", state.version, state.serial);
                let _ = writeln!(output, "   Last modified: {}", state.last_modified.to_rfc3339());
                let _ = writeln!(output, "   Resources: {}\n", state.len());

                if state.is_empty() {
                    return output;
                }
                let rows: Vec<ResourceRow> = state
                    .resources
                    .iter()
                    .map(|r| ResourceRow {
                        address: r.address.clone(),
                        status: r.status.to_string(),
                        last_updated: r.last_updated.clone().unwrap_or_default(),
                    })
                    .collect();
                output.push_str(&Table::new(rows).to_string());
                output.push('\n');
                output
            }
        }
    }

    /// Formats the list of supported resource types.
    #[must_use]
    pub fn format_schema_list(&self, schemas: &[ResourceSchema]) -> String {
        match self.format {
            OutputFormat::Json => to_json(
                &schemas
                    .iter()
                    .map(|s| {
                        serde_json::json!({
                            "type": s.name(),
                            "description": s.description,
                            "default_variant": s.supports_default,
                        })
                    })
                    .collect::<Vec<_>>(),
            ),
            OutputFormat::Text => {
                let mut output = String::new();
                for schema in schemas {
                    let _ = writeln!(output, "{:<40} {}", schema.name().bold(), schema.description);
                    if schema.supports_default {
                        let _ = writeln!(output, "{:<40} {}", format!("default_{}", schema.type_name), "(adopts the existing object)".dimmed());
                    }
                }
                output
            }
        }
    }

    /// Formats one resource type's attributes.
    #[must_use]
    pub fn format_schema(&self, schema: &ResourceSchema) -> String {
        let identity: Vec<&str> = schema.identity_attributes();
        match self.format {
            OutputFormat::Json => to_json(&serde_json::json!({
                "type": schema.name(),
                "description": schema.description,
                "collection": schema.collection,
                "identity": identity,
                "attributes": schema
                    .attributes
                    .iter()
                    .map(|a| serde_json::json!({
                        "name": a.name,
                        "kind": a.kind,
                        "required": a.required,
                        "computed": a.computed,
                        "write_only": a.write_only,
                        "allowed": a.allowed,
                        "description": a.doc,
                    }))
                    .collect::<Vec<_>>(),
            })),
            OutputFormat::Text => {
                let mut output = String::new();
                let _ = writeln!(output, "\n{}: {}", schema.name().bold(), schema.description);
                let _ = writeln!(output, "   Identity: {}", identity.join(", "));
                let _ = writeln!(output, "   Import id: {}\n", identity.iter().map(|a| format!("[{a}]")).collect::<Vec<_>>().join("/"));

                let rows: Vec<AttributeRow> = schema
                    .attributes
                    .iter()
                    .map(|a| AttributeRow {
                        name: a.name.to_string(),
                        kind: a.kind.to_string(),
                        flags: a.flags(),
                        doc: a.allowed.map_or_else(
                            || a.doc.to_string(),
                            |allowed| format!("{} ({})", a.doc, allowed.join(", ")),
                        ),
                    })
                    .collect();
                output.push_str(&Table::new(rows).to_string());
                output.push('\n');
                output
            }
        }
    }

    fn diagnostics_text(diagnostics: &Diagnostics) -> String {
        let mut output = String::new();
        for warning in diagnostics.warnings() {
            let _ = writeln!(output, "   {} {}: {}", "⚠".yellow(), warning.summary, warning.detail);
        }
        output
    }

    /// Formats an action type with color.
    fn format_action_type(action_type: ActionType) -> String {
        let label = format!("{}{action_type}", action_type.symbol().trim());
        match action_type {
            ActionType::Create | ActionType::Adopt => label.green().to_string(),
            ActionType::Update => label.yellow().to_string(),
            ActionType::Replace => label.magenta().to_string(),
            ActionType::Delete | ActionType::Detach => label.red().to_string(),
            ActionType::NoChange => label.dimmed().to_string(),
        }
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{head}...")
        }
    }

    /// Formats a one-line status message.
    #[must_use]
    pub fn message(&self, level: MessageLevel, message: &str) -> String {
        match self.format {
            OutputFormat::Json => to_json(&serde_json::json!({ "status": level.as_str(), "message": message })),
            OutputFormat::Text => match level {
                MessageLevel::Success => format!("{} {message}", "✓".green()),
                MessageLevel::Warning => format!("{} {message}", "⚠".yellow()),
                MessageLevel::Error => format!("{} {message}", "✗".red()),
            },
        }
    }
}

/// Severity of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    /// Operation succeeded.
    Success,
    /// Something needs attention.
    Warning,
    /// Operation failed.
    Error,
}

impl MessageLevel {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

// JSON serialization helpers

#[derive(Serialize)]
struct PlanJson {
    config_hash: String,
    summary: String,
    changes: usize,
    actions: Vec<ActionJson>,
}

#[derive(Serialize)]
struct ActionJson {
    action: String,
    address: String,
    resource_type: String,
    reason: String,
    operations: Vec<Operation>,
    unknown: Vec<String>,
}

impl PlanJson {
    fn new(plan: &DeploymentPlan, detailed: bool) -> Self {
        Self {
            config_hash: plan.config_hash.clone(),
            summary: plan.summary(),
            changes: plan.change_count(),
            actions: plan
                .actions
                .iter()
                .filter(|a| detailed || a.action_type != ActionType::NoChange)
                .map(|a| ActionJson {
                    action: a.action_type.to_string(),
                    address: a.address.clone(),
                    resource_type: a.resource_type.clone(),
                    reason: a.reason.clone(),
                    operations: a.operations.clone(),
                    unknown: a.unknown.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct DiagnosticJson {
    summary: String,
    detail: String,
}

impl DiagnosticJson {
    fn list(diagnostics: &Diagnostics) -> Vec<Self> {
        diagnostics
            .warnings()
            .iter()
            .map(|d| Self {
                summary: d.summary.clone(),
                detail: d.detail.clone(),
            })
            .collect()
    }
}

#[derive(Serialize)]
struct ExecutionJson {
    success: bool,
    successful: usize,
    failed: usize,
    skipped: usize,
    results: Vec<ResultJson>,
}

#[derive(Serialize)]
struct ResultJson {
    action: String,
    address: String,
    success: bool,
    operations: Vec<Operation>,
    warnings: Vec<DiagnosticJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<&ExecutionResult> for ExecutionJson {
    fn from(result: &ExecutionResult) -> Self {
        Self {
            success: result.success,
            successful: result.successful,
            failed: result.failed,
            skipped: result.skipped,
            results: result
                .results
                .iter()
                .map(|r| ResultJson {
                    action: r.action_type.to_string(),
                    address: r.address.clone(),
                    success: r.success,
                    operations: r.operations.clone(),
                    warnings: DiagnosticJson::list(&r.diagnostics),
                    error: r.error.clone(),
                })
                .collect(),
        }
    }
}
