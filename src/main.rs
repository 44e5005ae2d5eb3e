mod changes;
mod cli_args;
mod config;
mod git;
mod logging;
mod recommend;
mod templates;
mod tools;

use anyhow::{Context, Result};
use std::io::{self, Write};

use crate::cli_args::{Cli, Command};
use crate::config::Config;
use crate::tools::{AnalyzeArgs, SuggestArgs, ToolCall};
use clap::Parser;
use serde_json::Value;

fn run(cli: &Cli) -> Value {
    let config = match Config::from_sources(cli) {
        Ok(config) => config,
        Err(err) => {
            log::error!("{err:#}");
            return tools::error_document(&err);
        }
    };

    log::debug!(
        "Repository {}, templates {}",
        config.working_dir.display(),
        config.templates_dir.display()
    );

    let call = match &cli.command {
        Command::Analyze {
            base,
            no_diff,
            max_diff_lines,
        } => ToolCall::AnalyzeFileChanges(AnalyzeArgs {
            base_branch: base.clone(),
            include_diff: Some(!no_diff),
            max_diff_lines: *max_diff_lines,
        }),
        Command::Templates => ToolCall::GetPrTemplates,
        Command::Suggest {
            summary,
            change_type,
        } => ToolCall::SuggestTemplate(SuggestArgs {
            changes_summary: summary.clone(),
            change_type: change_type.clone(),
        }),
        Command::Call { name, args } => return tools::call_tool(name, args, &config),
    };

    tools::dispatch(&call, &config)
}

fn print_document(document: &Value, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(document)?
    } else {
        serde_json::to_string(document)?
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{text}").context("failed to write result to stdout")?;
    stdout.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    let document = run(&cli);
    print_document(&document, cli.pretty)
}
