use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command as GitCommand;

/// Captured result of a git invocation that ran to completion.
#[derive(Debug, Clone, Default)]
pub struct GitOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Read-only access to a repository through the version-control tool.
pub trait VersionControl: Send + Sync {
    /// Run git with `args` and capture its output.
    ///
    /// A non-zero exit is reported through [`GitOutput::success`]; `Err` is
    /// reserved for git not being runnable at all.
    fn run(&self, args: &[&str]) -> Result<GitOutput>;
}

/// Runs the `git` binary inside an explicit working directory.
#[derive(Debug, Clone)]
pub struct GitCli {
    working_dir: PathBuf,
}

impl GitCli {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}

impl VersionControl for GitCli {
    fn run(&self, args: &[&str]) -> Result<GitOutput> {
        log::debug!(
            "Running {} in {}",
            command_line(args),
            self.working_dir().display()
        );

        let output = GitCommand::new("git")
            .args(args)
            .current_dir(&self.working_dir)
            .output()
            .with_context(|| format!("failed to run git {:?}", args))?;

        if !output.status.success() {
            log::debug!(
                "{} exited with status {:?}",
                command_line(args),
                output.status.code()
            );
        }

        Ok(GitOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Render an invocation the way it would be typed in a shell.
pub fn command_line(args: &[&str]) -> String {
    let mut line = String::from("git");
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}
