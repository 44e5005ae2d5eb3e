use crate::Cli;
use crate::changes::{DEFAULT_BASE_BRANCH, DEFAULT_MAX_DIFF_LINES};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const TEMPLATES_DIR_ENV: &str = "PR_AGENT_TEMPLATES_DIR";
const BASE_BRANCH_ENV: &str = "PR_AGENT_BASE_BRANCH";
const MAX_DIFF_LINES_ENV: &str = "PR_AGENT_MAX_DIFF_LINES";

/// Final resolved configuration for pr-agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Repository the change inspector runs git in.
    pub working_dir: PathBuf,
    pub templates_dir: PathBuf,
    /// Used when a caller does not name a base branch.
    pub base_branch: String,
    /// Used when a caller does not cap the diff.
    pub max_diff_lines: usize,
}

impl Config {
    /// Build the final config from CLI flags, environment, TOML file, and defaults.
    ///
    /// Precedence:
    ///   1. CLI flags (`-C`, `--templates-dir`)
    ///   2. Env vars `PR_AGENT_TEMPLATES_DIR`, `PR_AGENT_BASE_BRANCH`, `PR_AGENT_MAX_DIFF_LINES`
    ///   3. TOML `~/.config/pr-agent.toml`
    ///   4. Defaults (current directory, bundled templates, "main", 500 lines)
    pub fn from_sources(cli: &Cli) -> Result<Self> {
        let file_cfg = load_file_config().unwrap_or_default();
        let working_dir = match &cli.repo {
            Some(dir) => dir.clone(),
            None => env::current_dir().context("failed to determine the current directory")?,
        };

        Ok(resolve(
            working_dir,
            cli.templates_dir.clone(),
            |key| env::var(key).ok(),
            file_cfg,
        ))
    }
}

fn resolve(
    working_dir: PathBuf,
    templates_dir_cli: Option<PathBuf>,
    env_var: impl Fn(&str) -> Option<String>,
    file_cfg: FileConfig,
) -> Config {
    let templates_dir = templates_dir_cli
        .or_else(|| env_var(TEMPLATES_DIR_ENV).map(PathBuf::from))
        .or(file_cfg.templates_dir)
        .unwrap_or_else(default_templates_dir);

    let base_branch = env_var(BASE_BRANCH_ENV)
        .filter(|b| !b.trim().is_empty())
        .or(file_cfg.base_branch)
        .unwrap_or_else(|| DEFAULT_BASE_BRANCH.to_string());

    let max_diff_lines = env_var(MAX_DIFF_LINES_ENV)
        .and_then(|raw| match raw.trim().parse::<usize>() {
            Ok(n) => Some(n),
            Err(err) => {
                log::warn!("Ignoring {MAX_DIFF_LINES_ENV}={raw:?}: {err}");
                None
            }
        })
        .or(file_cfg.max_diff_lines)
        .unwrap_or(DEFAULT_MAX_DIFF_LINES);

    Config {
        working_dir,
        templates_dir,
        base_branch,
        max_diff_lines,
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    pub templates_dir: Option<PathBuf>,
    /// Default base branch when not provided via CLI or env.
    pub base_branch: Option<String>,
    pub max_diff_lines: Option<usize>,
}

/// `templates/` next to the installed binary, else the one shipped with the crate.
fn default_templates_dir() -> PathBuf {
    let installed = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("templates")));

    match installed {
        Some(dir) if dir.is_dir() => dir,
        _ => Path::new(env!("CARGO_MANIFEST_DIR")).join("templates"),
    }
}

/// Return `~/.config/pr-agent.toml`
fn config_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".config").join("pr-agent.toml"))
}

fn load_file_config() -> Option<FileConfig> {
    let path = config_path()?;
    if !path.exists() {
        return None;
    }

    let data = fs::read_to_string(&path).ok()?;
    match toml::from_str::<FileConfig>(&data) {
        Ok(cfg) => Some(cfg),
        Err(err) => {
            log::warn!("Ignoring {}: {err}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_other_sources() {
        let cfg = resolve(PathBuf::from("/repo"), None, env_of(&[]), FileConfig::default());
        assert_eq!(cfg.working_dir, PathBuf::from("/repo"));
        assert_eq!(cfg.base_branch, "main");
        assert_eq!(cfg.max_diff_lines, 500);
        assert!(cfg.templates_dir.ends_with("templates"));
    }

    #[test]
    fn cli_beats_env_beats_file() {
        let file_cfg: FileConfig = toml::from_str(
            r#"
                templates_dir = "/from/file"
                base_branch = "trunk"
                max_diff_lines = 50
            "#,
        )
        .unwrap();
        let env = env_of(&[
            (TEMPLATES_DIR_ENV, "/from/env"),
            (BASE_BRANCH_ENV, "develop"),
        ]);

        let cfg = resolve(
            PathBuf::from("/repo"),
            Some(PathBuf::from("/from/cli")),
            env,
            file_cfg,
        );

        assert_eq!(cfg.templates_dir, PathBuf::from("/from/cli"));
        assert_eq!(cfg.base_branch, "develop");
        assert_eq!(cfg.max_diff_lines, 50);
    }

    #[test]
    fn env_templates_dir_beats_file() {
        let file_cfg = FileConfig {
            templates_dir: Some(PathBuf::from("/from/file")),
            ..FileConfig::default()
        };
        let cfg = resolve(
            PathBuf::from("."),
            None,
            env_of(&[(TEMPLATES_DIR_ENV, "/from/env")]),
            file_cfg,
        );
        assert_eq!(cfg.templates_dir, PathBuf::from("/from/env"));
    }

    #[test]
    fn bad_max_diff_lines_env_is_ignored() {
        let file_cfg = FileConfig {
            max_diff_lines: Some(42),
            ..FileConfig::default()
        };
        let cfg = resolve(
            PathBuf::from("."),
            None,
            env_of(&[(MAX_DIFF_LINES_ENV, "lots")]),
            file_cfg,
        );
        assert_eq!(cfg.max_diff_lines, 42);
    }
}
