//! Project manifest written once at the end of a build.
//!
//! Stored as `project-info.json` in the project root. Each written file is
//! recorded with the SHA-256 of the content that went to disk.

use crate::error::{BuildError, Result};
use crate::files::FileSet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "project-info.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectManifest {
    pub project_name: String,
    pub file_count: usize,
    pub paths: Vec<String>,
    pub setup_commands: Vec<String>,
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub component_commands: Vec<String>,
    #[serde(default)]
    pub files: Vec<FileRecord>,
    pub created_at: String,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

impl ProjectManifest {
    /// Builds the manifest for `written` paths; hashes come from `files`.
    pub fn new(
        project_name: &str,
        written: &[String],
        files: &FileSet,
        setup_commands: &[String],
        component_commands: &[String],
        dependencies: &[String],
    ) -> Self {
        let records = written
            .iter()
            .filter_map(|path| {
                files.get(path).map(|f| FileRecord {
                    path: path.clone(),
                    sha256: hash_content(&f.content),
                })
            })
            .collect();

        Self {
            project_name: project_name.to_string(),
            file_count: written.len(),
            paths: written.to_vec(),
            setup_commands: setup_commands.to_vec(),
            dependencies: dependencies.to_vec(),
            component_commands: component_commands.to_vec(),
            files: records,
            created_at: chrono::Utc::now().to_rfc3339(),
            next_steps: next_steps(project_name, dependencies),
        }
    }

    pub fn path_in(root: &Path) -> PathBuf {
        root.join(MANIFEST_FILE)
    }

    pub fn save(&self, root: &Path) -> Result<PathBuf> {
        let path = Self::path_in(root);
        let content = serde_json::to_string_pretty(self)?;
        fs::create_dir_all(root).map_err(|e| BuildError::io(root, e))?;
        fs::write(&path, content).map_err(|e| BuildError::io(&path, e))?;
        Ok(path)
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::path_in(root);
        let content = fs::read_to_string(&path).map_err(|e| BuildError::io(&path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Paths whose on-disk content no longer matches the recorded hash.
    pub fn modified_since(&self, root: &Path) -> Vec<String> {
        self.files
            .iter()
            .filter(|record| {
                fs::read(root.join(&record.path))
                    .map(|bytes| hash_bytes(&bytes) != record.sha256)
                    .unwrap_or(true)
            })
            .map(|record| record.path.clone())
            .collect()
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![format!("Project: {}", self.project_name)];
        lines.push(format!("  Files written: {}", self.file_count));
        for path in &self.paths {
            lines.push(format!("    {}", path));
        }
        if !self.dependencies.is_empty() {
            lines.push(format!("  Dependencies:  {}", self.dependencies.join(" ")));
        }
        if !self.setup_commands.is_empty() {
            lines.push("  Setup commands:".to_string());
            for cmd in &self.setup_commands {
                lines.push(format!("    {}", cmd));
            }
        }
        lines.join("\n")
    }
}

fn next_steps(project_name: &str, dependencies: &[String]) -> Vec<String> {
    let mut steps = vec![format!("cd {}", project_name)];
    if !dependencies.is_empty() {
        steps.push(format!("npm install {}", dependencies.join(" ")));
    }
    steps.push("npm install".to_string());
    steps.push("npm run dev".to_string());
    steps
}

pub fn hash_content(content: &str) -> String {
    hash_bytes(content.as_bytes())
}

fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::{ExtractedFile, Language, SourcePattern};

    fn files() -> FileSet {
        [ExtractedFile::new(
            "components/hero.tsx",
            "export function Hero() {}",
            Language::Tsx,
            SourcePattern::ExplicitFile,
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn serializes_camel_case_and_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifest = ProjectManifest::new(
            "demo",
            &["components/hero.tsx".to_string()],
            &files(),
            &["npm install recharts".to_string()],
            &[],
            &["recharts".to_string()],
        );
        let json = serde_json::to_value(&manifest).expect("json");
        assert_eq!(json["projectName"], "demo");
        assert_eq!(json["fileCount"], 1);
        assert_eq!(json["setupCommands"][0], "npm install recharts");
        assert_eq!(json["files"][0]["sha256"].as_str().map(str::len), Some(64));

        manifest.save(dir.path()).expect("save");
        let loaded = ProjectManifest::load(dir.path()).expect("load");
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.next_steps[1], "npm install recharts");
    }

    #[test]
    fn detects_modified_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("components")).expect("mkdir");
        fs::write(dir.path().join("components/hero.tsx"), "export function Hero() {}").expect("write");
        let manifest =
            ProjectManifest::new("demo", &["components/hero.tsx".to_string()], &files(), &[], &[], &[]);
        assert!(manifest.modified_since(dir.path()).is_empty());

        fs::write(dir.path().join("components/hero.tsx"), "changed").expect("write");
        assert_eq!(manifest.modified_since(dir.path()), vec!["components/hero.tsx"]);
    }
}
