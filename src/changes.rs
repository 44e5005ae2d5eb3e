use serde::Serialize;
use thiserror::Error;

use crate::git::{self, VersionControl};

pub const DEFAULT_BASE_BRANCH: &str = "main";
pub const DEFAULT_MAX_DIFF_LINES: usize = 500;

/// Stands in for the diff when the caller did not ask for it.
pub const DIFF_OMITTED: &str = "Diff not included (set include_diff=true to see it)";

/// Options for a single change inspection.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub base_branch: String,
    pub include_diff: bool,
    pub max_diff_lines: usize,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            base_branch: DEFAULT_BASE_BRANCH.to_string(),
            include_diff: true,
            max_diff_lines: DEFAULT_MAX_DIFF_LINES,
        }
    }
}

/// One entry of `git diff --name-status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedFile {
    pub status: String,
    pub filename: String,
}

/// Summary of the changes between the base branch and HEAD.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeReport {
    pub stats: String,
    pub total_diff_lines: usize,
    pub files_changed: Vec<ChangedFile>,
    pub diff: String,
    #[serde(skip)]
    pub diff_included: bool,
}

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("Git {label} command failed: {stderr}")]
    CommandFailed {
        label: &'static str,
        command: String,
        stderr: String,
    },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl InspectError {
    /// The command line that failed, when a git command exited non-zero.
    pub fn command(&self) -> Option<&str> {
        match self {
            InspectError::CommandFailed { command, .. } => Some(command),
            InspectError::Internal(_) => None,
        }
    }
}

/// Inspect the changes of HEAD against `options.base_branch`.
///
/// Runs the full diff, the stat summary and the name-status listing in that
/// order. The first command that exits non-zero aborts the whole call.
pub fn analyze_changes(
    vcs: &dyn VersionControl,
    options: &AnalyzeOptions,
) -> Result<ChangeReport, InspectError> {
    let range = format!("{}...HEAD", options.base_branch);

    let diff = run_checked(vcs, "diff", &["diff", range.as_str()])?;
    let (truncated, total_diff_lines) = truncate_diff(&diff, options.max_diff_lines);

    let stats = run_checked(vcs, "diff --stat", &["diff", "--stat", range.as_str()])?;
    let name_status = run_checked(
        vcs,
        "diff --name-status",
        &["diff", "--name-status", range.as_str()],
    )?;
    let files_changed = parse_name_status(&name_status);

    let diff = if options.include_diff {
        truncated
    } else {
        DIFF_OMITTED.to_string()
    };

    let report = ChangeReport {
        stats,
        total_diff_lines,
        files_changed,
        diff,
        diff_included: options.include_diff,
    };

    log::info!(
        "{} file(s) changed against {}, {} diff line(s){}",
        report.files_changed.len(),
        options.base_branch,
        report.total_diff_lines,
        if report.diff_included { "" } else { ", diff omitted" }
    );

    Ok(report)
}

fn run_checked(
    vcs: &dyn VersionControl,
    label: &'static str,
    args: &[&str],
) -> Result<String, InspectError> {
    let output = vcs.run(args)?;
    if !output.success {
        let command = git::command_line(args);
        log::warn!("{command} failed: {}", output.stderr.trim_end());
        return Err(InspectError::CommandFailed {
            label,
            command,
            stderr: output.stderr,
        });
    }
    Ok(output.stdout)
}

/// Keep at most `max_lines` lines of `diff`, returning the text and the
/// original line count.
///
/// When the diff is longer, the kept prefix is followed by a single notice
/// line with both counts.
pub fn truncate_diff(diff: &str, max_lines: usize) -> (String, usize) {
    let lines: Vec<&str> = diff.split_terminator('\n').collect();
    let total = lines.len();
    if total <= max_lines {
        return (diff.to_string(), total);
    }

    let notice = format!("... Output truncated. Showing {max_lines} of {total} lines ...");
    let mut kept = lines[..max_lines].to_vec();
    kept.push(notice.as_str());
    (kept.join("\n"), total)
}

/// Parse `git diff --name-status` output.
///
/// Lines without a tab-separated status and filename are skipped. For renames
/// and copies the filename is the source path.
pub fn parse_name_status(output: &str) -> Vec<ChangedFile> {
    output
        .lines()
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let mut fields = line.split('\t');
            let status = fields.next()?;
            let filename = fields.next()?;
            if status.is_empty() || filename.is_empty() {
                return None;
            }
            Some(ChangedFile {
                status: status.to_string(),
                filename: filename.to_string(),
            })
        })
        .collect()
}
