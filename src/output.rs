//! Plan formatting for display.
//!
//! Text output is a table with one row per scheduled resource; JSON output
//! is the pretty-printed IR document.

use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::emitter::{IrDocument, PlanEmitter, SerializedDocument};
use crate::error::EmitError;
use crate::model::ResourceKind;
use crate::planner::{ChangePlan, DiffResult, DiffType, Plan};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// Formatter for plans and diffs.
#[derive(Debug)]
pub struct PlanFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Plan row for table display.
#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "Batch")]
    batch: usize,
    #[tabled(rename = "Resource")]
    id: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Depends on")]
    depends_on: String,
}

/// Diff row for table display.
#[derive(Tabled)]
struct DiffRow {
    #[tabled(rename = "Change")]
    change: String,
    #[tabled(rename = "Resource")]
    id: String,
}

/// JSON rendering of a change plan.
#[derive(Serialize)]
struct ChangesJson {
    teardown: IrDocument,
    apply: IrDocument,
}

impl PlanFormatter {
    /// Creates a new formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a plan for display.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn format_plan(&self, plan: &Plan) -> Result<String, EmitError> {
        match self.format {
            OutputFormat::Json => PlanEmitter::new()
                .with_pretty(true)
                .emit(plan)
                .map(SerializedDocument::into_string),
            OutputFormat::Text => Ok(Self::format_plan_text(plan)),
        }
    }

    /// Formats a plan as text.
    fn format_plan_text(plan: &Plan) -> String {
        if plan.is_empty() {
            return format!("{} Nothing to {}.\n", "ok".green(), plan.direction);
        }

        let mut output = String::new();
        let _ = writeln!(output, "\n{} plan\n", capitalize(&plan.direction.to_string()).bold());

        let rows: Vec<PlanRow> = plan
            .batches
            .iter()
            .enumerate()
            .flat_map(|(index, batch)| {
                batch.resources.iter().map(move |r| PlanRow {
                    batch: index + 1,
                    id: r.id.clone(),
                    kind: Self::format_kind(r.kind).to_string(),
                    depends_on: if r.depends_on.is_empty() {
                        "-".to_string()
                    } else {
                        r.depends_on.join(", ")
                    },
                })
            })
            .collect();

        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        let _ = writeln!(
            output,
            "\nPlan: {} resources in {} batches (up to {} in parallel)",
            plan.resource_count().to_string().green(),
            plan.batch_count(),
            plan.max_parallelism()
        );

        output
    }

    /// Formats a model diff and its change plan.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn format_changes(&self, diff: &DiffResult, changes: &ChangePlan) -> Result<String, EmitError> {
        if self.format == OutputFormat::Json {
            let json = ChangesJson {
                teardown: IrDocument::from_plan(&changes.teardown),
                apply: IrDocument::from_plan(&changes.apply),
            };
            return serde_json::to_string_pretty(&json).map_err(|e| EmitError::serialization(e.to_string()));
        }

        if !diff.has_changes() {
            return Ok(format!("{} No changes required.\n", "ok".green()));
        }

        let rows: Vec<DiffRow> = diff
            .diffs
            .iter()
            .filter(|d| d.diff_type != DiffType::NoChange)
            .map(|d| DiffRow {
                change: Self::format_diff_type(d.diff_type).to_string(),
                id: d.id.clone(),
            })
            .collect();

        let mut output = String::new();
        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        let _ = writeln!(
            output,
            "\nChanges: {} to create, {} to update, {} to delete",
            diff.creates.to_string().green(),
            diff.updates.to_string().yellow(),
            diff.deletes.to_string().red()
        );

        if !changes.teardown.is_empty() {
            output.push_str(&Self::format_plan_text(&changes.teardown));
        }
        if !changes.apply.is_empty() {
            output.push_str(&Self::format_plan_text(&changes.apply));
        }

        Ok(output)
    }

    /// Colors a resource kind by its layer.
    fn format_kind(kind: ResourceKind) -> ColoredString {
        match kind {
            ResourceKind::Network | ResourceKind::Role => kind.as_str().blue(),
            ResourceKind::Cluster | ResourceKind::TaskDefinition => kind.as_str().cyan(),
            ResourceKind::Container | ResourceKind::Service => kind.as_str().green(),
            ResourceKind::ScalingPolicy | ResourceKind::HealthCheck => kind.as_str().magenta(),
        }
    }

    fn format_diff_type(diff_type: DiffType) -> ColoredString {
        match diff_type {
            DiffType::Create => "+ create".green(),
            DiffType::Update => "~ update".yellow(),
            DiffType::Delete => "- delete".red(),
            DiffType::NoChange => "  unchanged".dimmed(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
