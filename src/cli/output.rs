//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::plan::{ChangePlan, PlanAction};
use crate::resource::ResourceData;
use crate::schema::{AttributeSchema, ResourceSchema};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Schema attribute row for table display.
#[derive(Tabled)]
struct AttributeRow {
    #[tabled(rename = "Attribute")]
    name: String,
    #[tabled(rename = "Type")]
    attr_type: String,
    #[tabled(rename = "Flags")]
    flags: String,
    #[tabled(rename = "Default")]
    default: String,
    #[tabled(rename = "Description")]
    description: String,
}

/// Resource attribute row for table display.
#[derive(Tabled)]
struct ValueRow {
    #[tabled(rename = "Attribute")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats resource schemas for display.
    #[must_use]
    pub fn format_schemas(&self, schemas: &[&ResourceSchema]) -> String {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = schemas.iter().map(|s| s.describe()).collect();
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => schemas
                .iter()
                .map(|s| Self::format_schema_text(s))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    fn format_schema_text(schema: &ResourceSchema) -> String {
        let mut output = String::new();

        let _ = writeln!(output, "\n{}", schema.resource_type.bold());
        if let Some(description) = &schema.description {
            let _ = writeln!(output, "   {description}");
        }

        let rows: Vec<AttributeRow> = schema
            .attributes
            .iter()
            .map(|a| AttributeRow {
                name: a.name.clone(),
                attr_type: a.attr_type.to_string(),
                flags: Self::attribute_flags(a),
                default: a.default.as_ref().map(ToString::to_string).unwrap_or_default(),
                description: Self::truncate(a.description.as_deref().unwrap_or_default(), 60),
            })
            .collect();

        output.push_str(&Table::new(rows).to_string());
        output.push('\n');
        output
    }

    fn attribute_flags(attribute: &AttributeSchema) -> String {
        let flags: Vec<&str> = [
            (attribute.required, "required"),
            (attribute.computed, "computed"),
            (attribute.sensitive, "sensitive"),
            (attribute.force_new, "force-new"),
        ]
        .into_iter()
        .filter_map(|(set, flag)| set.then_some(flag))
        .collect();

        flags.join(", ")
    }

    /// Formats a change plan for display.
    #[must_use]
    pub fn format_plan(&self, plan: &ChangePlan) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&plan.to_json()).unwrap_or_default(),
            OutputFormat::Text => Self::format_plan_text(plan),
        }
    }

    fn format_plan_text(plan: &ChangePlan) -> String {
        let mut output = String::new();

        let _ = writeln!(
            output,
            "\n{} {}",
            Self::format_action(plan.action),
            plan.resource_type
        );

        for key in &plan.changed {
            let marker = if plan.replace.contains(key) {
                " (forces replacement)".red().to_string()
            } else {
                String::new()
            };
            let _ = writeln!(output, "   ~ {key}{marker}");
        }

        match &plan.rejections {
            Some(errors) => {
                let _ = writeln!(output, "\n{} Change rejected:", "✗".red());
                for error in errors.iter() {
                    let _ = writeln!(output, "\n{error}");
                }
            }
            None => {
                let _ = writeln!(output, "\n{} Change accepted", "✓".green());
            }
        }

        output
    }

    /// Formats resource data for display; sensitive attributes are hidden
    /// in text output.
    #[must_use]
    pub fn format_resource(&self, data: &ResourceData, schema: &ResourceSchema) -> String {
        match self.format {
            OutputFormat::Json => Self::format_state(data),
            OutputFormat::Text => {
                let mut output = String::new();
                let id = data.id().map_or_else(|| "(none)".dimmed().to_string(), String::from);
                let _ = writeln!(output, "\n{} {id}", schema.resource_type.bold());

                let rows: Vec<ValueRow> = data
                    .attributes
                    .iter()
                    .map(|(name, value)| ValueRow {
                        name: name.clone(),
                        value: if schema.get(name).is_some_and(|a| a.sensitive) {
                            String::from("(sensitive)")
                        } else {
                            Self::truncate(&value.to_string(), 60)
                        },
                    })
                    .collect();

                output.push_str(&Table::new(rows).to_string());
                output.push('\n');
                output
            }
        }
    }

    /// Renders resource data as a state document.
    #[must_use]
    pub fn format_state(data: &ResourceData) -> String {
        serde_json::to_string_pretty(data).unwrap_or_default()
    }

    /// Formats a plan action with color.
    fn format_action(action: PlanAction) -> String {
        match action {
            PlanAction::Create => "+create".green().to_string(),
            PlanAction::Update => "~update".yellow().to_string(),
            PlanAction::Replace => "-/+replace".red().to_string(),
            PlanAction::Noop => "no-op".dimmed().to_string(),
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bunny::BunnyClient;
    use crate::config::ProviderConfig;
    use crate::resource::StorageZoneResource;
    use crate::schema::{Snapshot, storage_zone_schema};

    fn plan(config: &str, state: Option<&ResourceData>) -> ChangePlan {
        let client = BunnyClient::new(&ProviderConfig::new("test-key")).expect("client");
        let resource = StorageZoneResource::new(client);
        let config: Snapshot = serde_json::from_str(config).expect("valid json");
        ChangePlan::compute(&resource, &config, state).expect("plan")
    }

    #[test]
    fn test_truncate() {
        assert_eq!(OutputFormatter::truncate("short", 10), "short");
        assert_eq!(OutputFormatter::truncate("a much longer string", 10), "a much ...");
    }

    #[test]
    fn test_rejected_plan_text_lists_message() {
        colored::control::set_override(false);
        let output = OutputFormatter::new(OutputFormat::Text)
            .format_plan(&plan(r#"{"name": "assets", "zone_tier": 0, "region": "SYD"}"#, None));

        assert!(output.contains("Change rejected"));
        assert!(output.contains("\"SYD\" region needs to have at least one replication region."));
    }

    #[test]
    fn test_plan_json() {
        let output = OutputFormatter::new(OutputFormat::Json)
            .format_plan(&plan(r#"{"name": "assets", "zone_tier": 0}"#, None));
        let json: serde_json::Value = serde_json::from_str(&output).expect("valid json");

        assert_eq!(json["action"], "create");
        assert_eq!(json["accepted"], true);
    }

    #[test]
    fn test_sensitive_hidden_in_text() {
        colored::control::set_override(false);
        let mut data = ResourceData::default();
        data.set_id("12");
        data.set("password", "hunter2");
        data.set("name", "assets");

        let output = OutputFormatter::new(OutputFormat::Text)
            .format_resource(&data, &storage_zone_schema());

        assert!(!output.contains("hunter2"));
        assert!(output.contains("assets"));
    }

    #[test]
    fn test_schema_json_lists_types() {
        let schema = storage_zone_schema();
        let output = OutputFormatter::new(OutputFormat::Json).format_schemas(&[&schema]);
        let json: serde_json::Value = serde_json::from_str(&output).expect("valid json");

        assert_eq!(json[0]["type"], "bunny_storagezone");
    }
}
