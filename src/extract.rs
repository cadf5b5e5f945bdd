//! File Extractor: recovers a path-keyed file set from unwrapped response text.
//!
//! Strategies run in strict priority order and the first one that yields a
//! file wins:
//!
//! 1. a JSON fence carrying `{"files": [{"path", "content"}, ...]}`
//! 2. legacy fence patterns (explicit attribute, heading, shell, package.json,
//!    then tsx / ts / css tagged fences), plus untagged fences through the
//!    inferencer
//! 3. every remaining fence, whatever its tag

use crate::fences::{Fence, scan_fences};
use crate::files::{ExtractedFile, FileSet, Language, SourcePattern};
use crate::naming::infer_path;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

const SHELL_TAGS: &[&str] = &["sh", "bash", "shell", "zsh", "console"];
const TSX_TAGS: &[&str] = &["tsx"];
const TS_TAGS: &[&str] = &["ts", "typescript"];
const CSS_TAGS: &[&str] = &["css"];

/// Which strategy produced the file set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    StructuredJson,
    Legacy,
    Unlabeled,
    Nothing,
}

/// Shell commands found in the response, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupCommands {
    pub commands: Vec<String>,
    /// Packages named by `npm install`-style commands.
    pub packages: Vec<String>,
    /// Commands that add UI-kit components (`npx shadcn@latest add ...`).
    pub component_commands: Vec<String>,
}

impl SetupCommands {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn push_line(&mut self, raw: &str) {
        let line = raw.trim();
        let line = line.strip_prefix("$ ").unwrap_or(line).trim();
        if line.is_empty() || line.starts_with('#') {
            return;
        }
        if self.commands.iter().any(|c| c == line) {
            return;
        }
        self.commands.push(line.to_string());

        if line.contains("shadcn") {
            self.component_commands.push(line.to_string());
            return;
        }
        for part in line.split("&&") {
            for pkg in install_packages(part) {
                if !self.packages.contains(&pkg) {
                    self.packages.push(pkg);
                }
            }
        }
    }
}

/// Package arguments of a single `npm install` / `pnpm add` / `yarn add` command.
fn install_packages(command: &str) -> Vec<String> {
    let tokens: Vec<&str> = command.split_whitespace().collect();
    let args_start = match tokens.as_slice() {
        ["npm", "install" | "i" | "add", ..] => 2,
        ["pnpm", "add" | "install" | "i", ..] => 2,
        ["yarn" | "bun", "add", ..] => 2,
        _ => return Vec::new(),
    };
    tokens[args_start..]
        .iter()
        .filter(|t| !t.starts_with('-'))
        .map(|t| t.to_string())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub files: FileSet,
    pub setup: SetupCommands,
    pub strategy: Strategy,
}

#[derive(Deserialize)]
struct StructuredPayload {
    files: Vec<Value>,
}

/// Runs the strategies in order over already unwrapped text.
pub fn extract_files(text: &str) -> Extraction {
    let fences = scan_fences(text);

    if let Some(files) = structured_files(text, &fences) {
        debug!(count = files.len(), "structured JSON file array is authoritative");
        return Extraction {
            files,
            setup: collect_setup(&fences),
            strategy: Strategy::StructuredJson,
        };
    }

    let mut legacy = LegacyExtractor::new(&fences);
    legacy.run_typed_patterns();
    if !legacy.files.is_empty() {
        debug!(count = legacy.files.len(), "legacy fence patterns matched");
        return legacy.finish(Strategy::Legacy);
    }

    legacy.run_unlabeled_fallback();
    let strategy = if legacy.files.is_empty() {
        Strategy::Nothing
    } else {
        Strategy::Unlabeled
    };
    debug!(count = legacy.files.len(), ?strategy, "unlabeled fallback finished");
    legacy.finish(strategy)
}

fn structured_files(text: &str, fences: &[Fence]) -> Option<FileSet> {
    let candidates = fences
        .iter()
        .filter(|f| f.has_tag(&["json"]))
        .map(|f| f.body.as_str())
        .chain(std::iter::once(text.trim()));

    for body in candidates {
        let payload: StructuredPayload = match serde_json::from_str(body) {
            Ok(p) => p,
            Err(err) => {
                debug!(%err, "block is not a structured file array");
                continue;
            }
        };
        let files: FileSet = payload
            .files
            .iter()
            .filter_map(|entry| {
                let path = entry.get("path")?.as_str()?;
                let content = entry.get("content")?.as_str()?;
                if path.trim().is_empty() {
                    return None;
                }
                Some(ExtractedFile::new(
                    path,
                    content,
                    Language::from_path(path),
                    SourcePattern::JsonFormat,
                ))
            })
            .collect();
        if !files.is_empty() {
            return Some(files);
        }
    }
    None
}

/// Setup commands from every shell fence, whatever strategy produced the files.
fn collect_setup(fences: &[Fence]) -> SetupCommands {
    let mut setup = SetupCommands::default();
    for fence in fences.iter().filter(|f| f.has_tag(SHELL_TAGS)) {
        for line in fence.body.lines() {
            setup.push_line(line);
        }
    }
    setup
}

/// State shared by the legacy patterns: which fences are taken, which contents were seen.
struct LegacyExtractor<'a> {
    fences: &'a [Fence],
    claimed: Vec<bool>,
    seen: HashSet<String>,
    files: FileSet,
    setup: SetupCommands,
    inferred: usize,
}

impl<'a> LegacyExtractor<'a> {
    fn new(fences: &'a [Fence]) -> Self {
        Self {
            fences,
            claimed: vec![false; fences.len()],
            seen: HashSet::new(),
            files: FileSet::new(),
            setup: SetupCommands::default(),
            inferred: 0,
        }
    }

    fn run_typed_patterns(&mut self) {
        let fences = self.fences;
        for i in 0..fences.len() {
            let fence = &fences[i];
            if let Some(path) = fence.file_attr.clone() {
                let language = fence_language(fence, &path);
                self.emit(i, Some(path), language, SourcePattern::ExplicitFile);
            }
        }

        for i in 0..fences.len() {
            let fence = &fences[i];
            if self.claimed[i] {
                continue;
            }
            if let Some(path) = fence.heading_path.clone() {
                let language = fence_language(fence, &path);
                self.emit(i, Some(path), language, SourcePattern::MarkdownHeader);
            }
        }

        for i in 0..fences.len() {
            if !self.claimed[i] && fences[i].has_tag(SHELL_TAGS) {
                self.claimed[i] = true;
                for line in fences[i].body.lines() {
                    self.setup.push_line(line);
                }
            }
        }

        for i in 0..fences.len() {
            let fence = &fences[i];
            if !self.claimed[i] && fence.has_tag(&["json"]) && is_package_manifest(&fence.body) {
                self.emit(
                    i,
                    Some("package.json".to_string()),
                    Language::Json,
                    SourcePattern::PackageJson,
                );
            }
        }

        let typed = [
            (TSX_TAGS, Language::Tsx, SourcePattern::TsxComponent),
            (TS_TAGS, Language::TypeScript, SourcePattern::TypeScriptFile),
            (CSS_TAGS, Language::Css, SourcePattern::CssFile),
        ];
        for (tags, language, pattern) in typed {
            for i in 0..fences.len() {
                if !self.claimed[i] && fences[i].has_tag(tags) {
                    self.emit(i, None, language, pattern);
                }
            }
        }

        // Untagged fences are inferred even when typed patterns matched.
        for i in 0..fences.len() {
            if !self.claimed[i] && fences[i].tag.is_none() {
                self.emit(i, None, Language::Text, SourcePattern::Unlabeled);
            }
        }
    }

    fn run_unlabeled_fallback(&mut self) {
        let fences = self.fences;
        for i in 0..fences.len() {
            if self.claimed[i] {
                continue;
            }
            let language = fences[i]
                .tag
                .as_deref()
                .and_then(Language::from_tag)
                .unwrap_or(Language::Text);
            self.emit(i, None, language, SourcePattern::Unlabeled);
        }
    }

    /// Claims fence `i` and inserts it unless its content or path was already taken.
    fn emit(&mut self, i: usize, path: Option<String>, language: Language, pattern: SourcePattern) {
        self.claimed[i] = true;
        let fences = self.fences;
        let content = fences[i].body.trim();
        if content.is_empty() {
            return;
        }
        if !self.seen.insert(normalize_content(content)) {
            debug!(fence = i, "skipping block already emitted by another pattern");
            return;
        }

        let path = match path {
            Some(p) => p,
            None => {
                self.inferred += 1;
                infer_path(content, pattern, language, self.inferred)
            }
        };
        let language = if language == Language::Text {
            Language::from_path(&path)
        } else {
            language
        };

        let file = ExtractedFile::new(path, content, language, pattern);
        let path = file.path.clone();
        if !self.files.insert_first(file) {
            debug!(%path, "path already extracted; first block wins");
        }
    }

    fn finish(self, strategy: Strategy) -> Extraction {
        Extraction {
            files: self.files,
            setup: self.setup,
            strategy,
        }
    }
}

fn fence_language(fence: &Fence, path: &str) -> Language {
    fence
        .tag
        .as_deref()
        .and_then(Language::from_tag)
        .filter(|l| *l != Language::Shell)
        .unwrap_or_else(|| Language::from_path(path))
}

fn is_package_manifest(body: &str) -> bool {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.as_object().map(|o| o.contains_key("name")))
        .unwrap_or(false)
}

/// Content key for de-duplication: line endings and trailing whitespace do not count.
fn normalize_content(content: &str) -> String {
    content
        .replace("\r\n", "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
