use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::changes::{self, AnalyzeOptions, InspectError};
use crate::config::Config;
use crate::git::GitCli;
use crate::recommend::{self, RecommendError};
use crate::templates::{self, TemplateRegistry};

pub const ANALYZE_FILE_CHANGES: &str = "analyze_file_changes";
pub const GET_PR_TEMPLATES: &str = "get_pr_templates";
pub const SUGGEST_TEMPLATE: &str = "suggest_template";

/// Arguments of `analyze_file_changes`; omitted values come from [`Config`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzeArgs {
    #[serde(default)]
    pub base_branch: Option<String>,
    #[serde(default)]
    pub include_diff: Option<bool>,
    #[serde(default)]
    pub max_diff_lines: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuggestArgs {
    pub changes_summary: String,
    pub change_type: String,
}

/// One invocation of a named operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    AnalyzeFileChanges(AnalyzeArgs),
    GetPrTemplates,
    SuggestTemplate(SuggestArgs),
}

impl ToolCall {
    /// Build a call from a tool name and its JSON arguments.
    pub fn parse(name: &str, arguments: Value) -> Result<Self> {
        let arguments = match arguments {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };

        match name {
            ANALYZE_FILE_CHANGES => serde_json::from_value(arguments)
                .map(ToolCall::AnalyzeFileChanges)
                .with_context(|| format!("invalid arguments for {name}")),
            GET_PR_TEMPLATES => match &arguments {
                Value::Object(map) if map.is_empty() => Ok(ToolCall::GetPrTemplates),
                _ => Err(anyhow!("{name} takes no arguments")),
            },
            SUGGEST_TEMPLATE => serde_json::from_value(arguments)
                .map(ToolCall::SuggestTemplate)
                .with_context(|| format!("invalid arguments for {name}")),
            other => Err(anyhow!("Unknown tool: {other}")),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::AnalyzeFileChanges(_) => ANALYZE_FILE_CHANGES,
            ToolCall::GetPrTemplates => GET_PR_TEMPLATES,
            ToolCall::SuggestTemplate(_) => SUGGEST_TEMPLATE,
        }
    }
}

#[derive(Serialize)]
struct TemplatesDocument<'a> {
    templates: &'a TemplateRegistry,
    count: usize,
    templates_dir: String,
}

/// Parse `raw_args` as JSON and run the named tool.
pub fn call_tool(name: &str, raw_args: &str, config: &Config) -> Value {
    let call = serde_json::from_str::<Value>(raw_args)
        .context("arguments are not valid JSON")
        .and_then(|arguments| ToolCall::parse(name, arguments));

    match call {
        Ok(call) => dispatch(&call, config),
        Err(err) => {
            log::error!("Rejected call to {name}: {err:#}");
            error_document(&err)
        }
    }
}

/// Run a call and render its result document.
///
/// Never fails: every error becomes a document with an `error` field.
pub fn dispatch(call: &ToolCall, config: &Config) -> Value {
    log::debug!("Dispatching {}", call.name());
    match call {
        ToolCall::AnalyzeFileChanges(args) => analyze_file_changes(args, config),
        ToolCall::GetPrTemplates => get_pr_templates(config),
        ToolCall::SuggestTemplate(args) => suggest_template(args, config),
    }
}

fn analyze_file_changes(args: &AnalyzeArgs, config: &Config) -> Value {
    let options = AnalyzeOptions {
        base_branch: args
            .base_branch
            .clone()
            .unwrap_or_else(|| config.base_branch.clone()),
        include_diff: args.include_diff.unwrap_or(true),
        max_diff_lines: args.max_diff_lines.unwrap_or(config.max_diff_lines),
    };

    let vcs = GitCli::new(&config.working_dir);
    match changes::analyze_changes(&vcs, &options) {
        Ok(report) => to_document(&report),
        Err(err @ InspectError::CommandFailed { .. }) => json!({
            "error": err.to_string(),
            "command": err.command(),
        }),
        Err(InspectError::Internal(err)) => {
            log::error!("Change analysis failed: {err:#}");
            error_document(&err)
        }
    }
}

fn get_pr_templates(config: &Config) -> Value {
    match templates::list_templates(&config.templates_dir) {
        Ok(registry) => to_document(&TemplatesDocument {
            count: registry.len(),
            templates_dir: registry.dir().display().to_string(),
            templates: &registry,
        }),
        Err(err) => {
            log::error!("{err}");
            json!({ "error": err.to_string() })
        }
    }
}

fn suggest_template(args: &SuggestArgs, config: &Config) -> Value {
    match recommend::suggest_template(
        &args.changes_summary,
        &args.change_type,
        &config.templates_dir,
    ) {
        Ok(recommendation) => to_document(&recommendation),
        Err(err) => {
            if matches!(err, RecommendError::Registry(_)) {
                log::error!("{err}");
            }
            json!({ "error": err.to_string(), "suggestion": null })
        }
    }
}

fn to_document<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|err| {
        log::error!("Failed to serialize result: {err}");
        json!({ "error": err.to_string() })
    })
}

/// The document returned for any failure outside the operations' own taxonomy.
pub fn error_document(err: &anyhow::Error) -> Value {
    json!({ "error": format!("{err:#}") })
}
