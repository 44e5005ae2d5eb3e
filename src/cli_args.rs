use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// CLI options
#[derive(Parser, Debug)]
#[command(
    name = "pr-agent",
    version,
    about = "Inspect pending git changes and pick a pull request template"
)]
pub struct Cli {
    /// Repository to inspect (defaults to the current directory)
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    pub repo: Option<PathBuf>,

    /// Directory holding the PR templates (*.md)
    #[arg(long, global = true, value_name = "DIR")]
    pub templates_dir: Option<PathBuf>,

    /// Pretty-print the JSON result
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Log more to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands, one per operation, e.g. `pr-agent analyze --base develop`
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Summarize the diff, stats and changed files against a base branch
    Analyze {
        /// Base branch to compare against (e.g. main or develop)
        #[arg(long)]
        base: Option<String>,

        /// Leave the diff text out of the result
        #[arg(long)]
        no_diff: bool,

        /// Maximum number of diff lines to include
        #[arg(long)]
        max_diff_lines: Option<usize>,
    },

    /// List the available PR templates with their content
    Templates,

    /// Recommend a PR template for a described change
    Suggest {
        /// What the changes do
        #[arg(long)]
        summary: String,

        /// Kind of change (bug, feature, docs, refactor, test, ...)
        #[arg(long = "type", value_name = "TYPE")]
        change_type: String,
    },

    /// Invoke an operation by its tool name with JSON arguments
    Call {
        /// analyze_file_changes, get_pr_templates or suggest_template
        name: String,

        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
}
