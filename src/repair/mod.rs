//! Code Repair Pipeline.
//!
//! An ordered list of file-local rules. Each rule checks its own precondition
//! and must be idempotent. A rule that panics is contained at the rule
//! boundary: the file keeps its pre-rule content and the next rule runs.

pub mod catalog;
mod closing_tags;
mod duplicate_imports;
mod inline_style;
mod missing_imports;
mod scope_fix;
mod symbol_collision;

use crate::files::FileSet;
use catalog::ALIAS_ROOTS;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::{debug, warn};

pub use closing_tags::ClosingTagRule;
pub use duplicate_imports::DuplicateImportRule;
pub use inline_style::InlineStyleRule;
pub use missing_imports::MissingImportRule;
pub use scope_fix::ScopeFixRule;
pub use symbol_collision::SymbolCollisionRule;

const REPAIRABLE_EXTENSIONS: &[&str] = &["tsx", "jsx", "ts", "js"];

/// A file as seen by a rule.
#[derive(Debug, Clone, Copy)]
pub struct SourceFile<'a> {
    pub path: &'a str,
    pub content: &'a str,
}

pub trait RepairRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn applies_to(&self, path: &str) -> bool {
        is_repairable(path)
    }

    fn precondition(&self, file: &SourceFile) -> bool;

    /// Returns the repaired content. Must satisfy `transform(transform(x)) == transform(x)`.
    fn transform(&self, file: &SourceFile) -> String;
}

/// Rules in application order.
pub fn builtin_rules() -> Vec<Box<dyn RepairRule>> {
    vec![
        Box::new(DuplicateImportRule),
        Box::new(SymbolCollisionRule::new(catalog::COLLISIONS)),
        Box::new(InlineStyleRule::new(catalog::ANIMATION_CLASSES)),
        Box::new(ScopeFixRule::new(catalog::SCOPE_FIXES)),
        Box::new(ClosingTagRule::new(catalog::TAG_FIXES)),
        Box::new(MissingImportRule::new(
            catalog::UI_KIT,
            catalog::ICONS,
            catalog::ICON_MODULE,
        )),
    ]
}

pub fn is_repairable(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| REPAIRABLE_EXTENSIONS.contains(&e))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRepair {
    pub path: String,
    pub rule: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairFailure {
    pub path: String,
    pub rule: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    pub applied: Vec<AppliedRepair>,
    pub failures: Vec<RepairFailure>,
}

impl RepairReport {
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.failures.is_empty()
    }

    pub fn extend(&mut self, other: RepairReport) {
        self.applied.extend(other.applied);
        self.failures.extend(other.failures);
    }

    /// Distinct paths that at least one rule changed.
    pub fn changed_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.applied.iter().map(|a| a.path.as_str()).collect();
        paths.dedup();
        paths
    }
}

pub struct RepairPipeline {
    rules: Vec<Box<dyn RepairRule>>,
}

impl Default for RepairPipeline {
    fn default() -> Self {
        Self::new(builtin_rules())
    }
}

impl RepairPipeline {
    pub fn new(rules: Vec<Box<dyn RepairRule>>) -> Self {
        Self { rules }
    }

    /// Drops rules by name. Unknown names are ignored.
    pub fn without(mut self, disabled: &[String]) -> Self {
        self.rules.retain(|r| !disabled.iter().any(|d| d == r.name()));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Runs every applicable rule over one file's content.
    pub fn repair(&self, path: &str, content: &str) -> (String, RepairReport) {
        let mut current = content.to_string();
        let mut report = RepairReport::default();

        for rule in &self.rules {
            if !rule.applies_to(path) {
                continue;
            }
            let file = SourceFile {
                path,
                content: &current,
            };
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                if rule.precondition(&file) {
                    Some(rule.transform(&file))
                } else {
                    None
                }
            }));

            match outcome {
                Ok(Some(repaired)) if repaired != current => {
                    debug!(path, rule = rule.name(), "repair applied");
                    report.applied.push(AppliedRepair {
                        path: path.to_string(),
                        rule: rule.name().to_string(),
                    });
                    current = repaired;
                }
                Ok(_) => {}
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    warn!(path, rule = rule.name(), %message, "repair rule failed; file left unchanged");
                    report.failures.push(RepairFailure {
                        path: path.to_string(),
                        rule: rule.name().to_string(),
                        message,
                    });
                }
            }
        }

        (current, report)
    }

    /// Repairs every file of the set in place, in path order.
    pub fn repair_files(&self, files: &mut FileSet) -> RepairReport {
        let mut report = RepairReport::default();
        for file in files.iter_mut() {
            let (content, file_report) = self.repair(&file.path, &file.content);
            file.content = content;
            report.extend(file_report);
        }
        report
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "rule panicked".to_string()
    }
}

/// Canonical form of an import source as seen from `file_path`.
///
/// Relative sources that land under an alias root become `@/...`; a relative
/// source that cannot be resolved but goes through a `ui/` directory is taken
/// to be the UI kit.
pub(crate) fn canonical_source(source: &str, file_path: &str) -> String {
    if !(source.starts_with("./") || source.starts_with("../")) {
        return source.to_string();
    }

    let mut parts: Vec<&str> = file_path.split('/').collect();
    parts.pop();
    let mut resolved = true;
    for seg in source.split('/') {
        match seg {
            "." | "" => {}
            ".." => {
                if parts.pop().is_none() {
                    resolved = false;
                    break;
                }
            }
            other => parts.push(other),
        }
    }

    if resolved && parts.first().is_some_and(|root| ALIAS_ROOTS.contains(root)) {
        return format!("@/{}", parts.join("/"));
    }
    if let Some(idx) = source.rfind("ui/") {
        return format!("@/components/ui/{}", &source[idx + 3..]);
    }
    source.to_string()
}

/// Applies non-overlapping `(start, end, replacement)` edits to `text`.
pub(crate) fn apply_edits(text: &str, mut edits: Vec<(usize, usize, String)>) -> String {
    edits.sort_by(|a, b| b.0.cmp(&a.0));
    let mut out = text.to_string();
    let mut floor = usize::MAX;
    for (start, end, replacement) in edits {
        if end > floor {
            continue;
        }
        out.replace_range(start..end, &replacement);
        floor = start;
    }
    out
}

/// Range covering the line(s) of `start..end` when nothing else shares them.
pub(crate) fn whole_line_range(text: &str, start: usize, end: usize) -> (usize, usize) {
    let line_start = text[..start].rfind('\n').map_or(0, |p| p + 1);
    let line_end = text[end..].find('\n').map_or(text.len(), |p| end + p);
    let alone = text[line_start..start].trim().is_empty() && text[end..line_end].trim().is_empty();
    if !alone {
        return (start, end);
    }
    let cut_end = if line_end < text.len() { line_end + 1 } else { line_end };
    (line_start, cut_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::{ExtractedFile, Language, SourcePattern};

    struct Panicking;

    impl RepairRule for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }
        fn precondition(&self, _file: &SourceFile) -> bool {
            true
        }
        fn transform(&self, _file: &SourceFile) -> String {
            panic!("boom")
        }
    }

    struct Upper;

    impl RepairRule for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }
        fn precondition(&self, file: &SourceFile) -> bool {
            file.content.chars().any(|c| c.is_lowercase())
        }
        fn transform(&self, file: &SourceFile) -> String {
            file.content.to_uppercase()
        }
    }

    #[test]
    fn panicking_rule_leaves_file_and_pipeline_continues() {
        let pipeline = RepairPipeline::new(vec![Box::new(Panicking), Box::new(Upper)]);
        let (out, report) = pipeline.repair("components/a.tsx", "abc");
        assert_eq!(out, "ABC");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].rule, "panicking");
        assert_eq!(report.failures[0].message, "boom");
        assert_eq!(report.applied.len(), 1);
    }

    #[test]
    fn non_script_files_are_skipped() {
        let pipeline = RepairPipeline::new(vec![Box::new(Upper)]);
        let mut files: FileSet = [
            ExtractedFile::new("app/globals.css", "body {}", Language::Css, SourcePattern::CssFile),
            ExtractedFile::new("lib/a.ts", "x", Language::TypeScript, SourcePattern::TypeScriptFile),
        ]
        .into_iter()
        .collect();
        let report = pipeline.repair_files(&mut files);
        assert_eq!(report.changed_paths(), vec!["lib/a.ts"]);
        assert_eq!(files.get("app/globals.css").map(|f| f.content.as_str()), Some("body {}"));
    }

    #[test]
    fn disabled_rules_are_removed() {
        let pipeline = RepairPipeline::default().without(&["inline-style".to_string()]);
        assert!(!pipeline.rule_names().contains(&"inline-style"));
        assert_eq!(pipeline.rule_names().len(), 5);
    }

    #[test]
    fn builtin_order() {
        assert_eq!(
            RepairPipeline::default().rule_names(),
            vec![
                "duplicate-imports",
                "symbol-collision",
                "inline-style",
                "scope-fix",
                "closing-tags",
                "missing-imports"
            ]
        );
    }

    #[test]
    fn canonical_sources() {
        assert_eq!(canonical_source("./ui/button", "components/hero.tsx"), "@/components/ui/button");
        assert_eq!(canonical_source("../lib/utils", "components/hero.tsx"), "@/lib/utils");
        assert_eq!(canonical_source("../../ui/card", "hero.tsx"), "@/components/ui/card");
        assert_eq!(canonical_source("react", "components/hero.tsx"), "react");
        assert_eq!(canonical_source("./helpers", "src/a.ts"), "./helpers");
    }

    #[test]
    fn edits_apply_back_to_front() {
        let out = apply_edits("a b c", vec![(0, 1, "x".into()), (4, 5, "zz".into())]);
        assert_eq!(out, "x b zz");
    }
}
