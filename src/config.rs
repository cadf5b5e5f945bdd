//! Build configuration.
//!
//! Discovers and loads `genforge.yml` from the working directory. Values from
//! the command line take precedence over the file, which takes precedence
//! over the defaults.

use crate::deps::DependencySpec;
use crate::error::{BuildError, Result};
use crate::files::normalize_path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "genforge.yml";

pub const DEFAULT_OUTPUT_DIR: &str = "generated_projects";

/// Framework-owned files the scaffolder already set up correctly.
pub const DEFAULT_PROTECTED_PATHS: &[&str] =
    &["tailwind.config.ts", "app/globals.css", "postcss.config.mjs"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Parent directory for generated projects.
    pub output_dir: PathBuf,

    /// Paths the materializer never writes.
    pub protected_paths: Vec<String>,

    /// Local component library copied to `components/ui`.
    pub ui_kit_path: Option<PathBuf>,

    /// Repair rules to skip, by name.
    pub disabled_rules: Vec<String>,

    /// Additional dependency catalog entries.
    pub extra_packages: Vec<DependencySpec>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            protected_paths: DEFAULT_PROTECTED_PATHS.iter().map(|p| p.to_string()).collect(),
            ui_kit_path: None,
            disabled_rules: Vec::new(),
            extra_packages: Vec::new(),
        }
    }
}

impl BuildConfig {
    pub fn protected_set(&self) -> BTreeSet<String> {
        self.protected_paths.iter().map(|p| normalize_path(p)).collect()
    }
}

pub fn discover_config(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        debug!(path = %path.display(), "found config file");
        Some(path)
    } else {
        debug!(path = %path.display(), "no config file");
        None
    }
}

pub fn load_config(path: &Path) -> Result<BuildConfig> {
    let contents = fs::read_to_string(path).map_err(|e| BuildError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_config(&contents).map_err(|message| BuildError::Config {
        path: path.to_path_buf(),
        message,
    })
}

pub fn parse_config(contents: &str) -> std::result::Result<BuildConfig, String> {
    if contents.trim().is_empty() {
        return Ok(BuildConfig::default());
    }
    serde_yaml::from_str(contents).map_err(|e| e.to_string())
}

/// Loads `explicit` if given, else `genforge.yml` in `dir` if present, else defaults.
pub fn load_or_default(explicit: Option<&Path>, dir: &Path) -> Result<BuildConfig> {
    match explicit.map(Path::to_path_buf).or_else(|| discover_config(dir)) {
        Some(path) => load_config(&path),
        None => Ok(BuildConfig::default()),
    }
}

/// Command-line values layered over a loaded config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub output_dir: Option<PathBuf>,
    pub ui_kit_path: Option<PathBuf>,
    /// Extends the configured list.
    pub protected_paths: Vec<String>,
    /// Extends the configured list.
    pub disabled_rules: Vec<String>,
}

impl BuildConfig {
    pub fn merge(mut self, cli: ConfigOverrides) -> Self {
        if let Some(dir) = cli.output_dir {
            self.output_dir = dir;
        }
        if let Some(kit) = cli.ui_kit_path {
            self.ui_kit_path = Some(kit);
        }
        for path in cli.protected_paths {
            if !self.protected_paths.contains(&path) {
                self.protected_paths.push(path);
            }
        }
        for rule in cli.disabled_rules {
            if !self.disabled_rules.contains(&rule) {
                self.disabled_rules.push(rule);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BuildConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("generated_projects"));
        assert!(config.protected_set().contains("app/globals.css"));
        assert!(config.ui_kit_path.is_none());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = parse_config(
            "ui_kit_path: ./kit\ndisabled_rules: [scope-fix]\nextra_packages:\n  - import: zustand\n    install: [zustand]\n",
        )
        .expect("parse");
        assert_eq!(config.ui_kit_path, Some(PathBuf::from("./kit")));
        assert_eq!(config.disabled_rules, vec!["scope-fix"]);
        assert_eq!(config.extra_packages[0].import, "zustand");
        assert_eq!(config.protected_paths.len(), 3);
    }

    #[test]
    fn cli_overrides_file() {
        let config = parse_config("output_dir: from-file\nprotected_paths: [a.ts]\n").expect("parse");
        let merged = config.merge(ConfigOverrides {
            output_dir: Some(PathBuf::from("from-cli")),
            protected_paths: vec!["b.ts".to_string(), "a.ts".to_string()],
            ..Default::default()
        });
        assert_eq!(merged.output_dir, PathBuf::from("from-cli"));
        assert_eq!(merged.protected_paths, vec!["a.ts", "b.ts"]);
    }

    #[test]
    fn invalid_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "protected_paths: {not: [a list").expect("write");
        let err = load_or_default(None, dir.path()).expect_err("invalid yaml");
        assert!(matches!(err, BuildError::Config { .. }));
        assert!(err.is_input_error());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(
            load_or_default(None, dir.path()).expect("defaults"),
            BuildConfig::default()
        );
    }
}
