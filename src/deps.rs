//! Dependency Scanner: finds references to a catalog of optional packages and
//! turns them into an install request.

use crate::files::{FileSet, normalize_path};
use crate::lexer::{mask, parse_imports};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

const SCANNED_EXTENSIONS: &[&str] = &["tsx", "ts", "jsx", "js", "mjs"];
const SKIPPED_DIRS: &[&str] = &["node_modules", ".next", ".git"];

/// Maps a module name seen in an import to the packages that must be installed for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    pub import: String,
    pub install: Vec<String>,
}

impl DependencySpec {
    pub fn new(import: &str, install: &[&str]) -> Self {
        Self {
            import: import.to_string(),
            install: install.iter().map(|s| s.to_string()).collect(),
        }
    }
}

pub fn builtin_catalog() -> Vec<DependencySpec> {
    vec![
        DependencySpec::new("framer-motion", &["framer-motion"]),
        DependencySpec::new("three", &["three", "@types/three"]),
        DependencySpec::new("@react-three/fiber", &["@react-three/fiber", "three", "@types/three"]),
        DependencySpec::new("@react-three/drei", &["@react-three/drei"]),
        DependencySpec::new("recharts", &["recharts"]),
        DependencySpec::new("d3", &["d3", "@types/d3"]),
        DependencySpec::new("mathjs", &["mathjs"]),
        DependencySpec::new("plotly.js", &["plotly.js"]),
        DependencySpec::new("react-spring", &["react-spring"]),
        DependencySpec::new("lottie-react", &["lottie-react"]),
    ]
}

/// Result of a scan: what to install and why.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReport {
    /// Catalog modules referenced somewhere in the sources.
    pub matched: Vec<String>,
    /// Packages to hand to the installer, already minus declared ones.
    pub install: Vec<String>,
    /// Packages that were wanted but are declared in package.json already.
    pub already_declared: Vec<String>,
}

pub struct DependencyScanner {
    catalog: Vec<DependencySpec>,
}

impl Default for DependencyScanner {
    fn default() -> Self {
        Self::new(builtin_catalog())
    }
}

impl DependencyScanner {
    pub fn new(catalog: Vec<DependencySpec>) -> Self {
        Self { catalog }
    }

    /// Adds entries on top of the current catalog. An entry for an existing module replaces it.
    pub fn with_extra(mut self, extra: &[DependencySpec]) -> Self {
        for spec in extra {
            self.catalog.retain(|s| s.import != spec.import);
            self.catalog.push(spec.clone());
        }
        self
    }

    /// Catalog modules referenced by one source file.
    pub fn matches_in(&self, content: &str) -> BTreeSet<String> {
        let referenced = referenced_packages(content);
        self.catalog
            .iter()
            .filter(|spec| referenced.contains(&spec.import))
            .map(|spec| spec.import.clone())
            .collect()
    }

    /// Scans the extracted files plus any sources already under `project_root`.
    ///
    /// `extra_packages` come from setup commands and are requested as-is.
    pub fn scan(
        &self,
        files: &FileSet,
        project_root: Option<&Path>,
        extra_packages: &[String],
    ) -> DependencyReport {
        let mut matched = BTreeSet::new();
        for file in files.iter().filter(|f| is_scanned(&f.path)) {
            matched.extend(self.matches_in(&file.content));
        }

        let mut declared = files
            .get("package.json")
            .map(|f| declared_dependencies(&f.content))
            .unwrap_or_default();

        if let Some(root) = project_root {
            for (path, content) in read_sources(root) {
                if files.contains(&path) {
                    continue;
                }
                matched.extend(self.matches_in(&content));
            }
            if !files.contains("package.json") {
                if let Ok(text) = fs::read_to_string(root.join("package.json")) {
                    declared.extend(declared_dependencies(&text));
                }
            }
        }

        let mut wanted = BTreeSet::new();
        for spec in self.catalog.iter().filter(|s| matched.contains(&s.import)) {
            wanted.extend(spec.install.iter().cloned());
        }
        wanted.extend(extra_packages.iter().cloned());

        let (already_declared, install): (Vec<String>, Vec<String>) = wanted
            .into_iter()
            .partition(|pkg| declared.contains(package_name(pkg)));

        debug!(
            matched = matched.len(),
            install = install.len(),
            "dependency scan finished"
        );

        DependencyReport {
            matched: matched.into_iter().collect(),
            install,
            already_declared,
        }
    }
}

/// Package names referenced by import, require or dynamic import.
pub fn referenced_packages(content: &str) -> BTreeSet<String> {
    let mut packages: BTreeSet<String> = parse_imports(content)
        .into_iter()
        .map(|stmt| package_name(&stmt.source).to_string())
        .collect();

    let masked = mask(content);
    for caps in call_import_re().captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        // A match inside a string or comment is blanked in the masked copy.
        if !masked[whole.start()..].starts_with(&whole.as_str()[..3]) {
            continue;
        }
        if let Some(module) = caps.get(1) {
            packages.insert(package_name(module.as_str()).to_string());
        }
    }
    packages
}

/// `@scope/pkg/sub` -> `@scope/pkg`, `three/examples/x` -> `three`, `react@18` -> `react`.
pub fn package_name(module: &str) -> &str {
    let mut end = module.len();
    if let Some(rest) = module.strip_prefix('@') {
        let mut slashes = rest.match_indices('/').map(|(i, _)| i + 1);
        slashes.next();
        if let Some(second) = slashes.next() {
            end = second;
        }
        if let Some(at) = module[1..end].find('@') {
            end = at + 1;
        }
    } else {
        if let Some(slash) = module.find('/') {
            end = slash;
        }
        if let Some(at) = module[..end].find('@') {
            end = at;
        }
    }
    &module[..end]
}

/// Names under `dependencies`, `devDependencies` and `peerDependencies`.
pub fn declared_dependencies(package_json: &str) -> BTreeSet<String> {
    let Ok(value) = serde_json::from_str::<Value>(package_json) else {
        debug!("package.json is not valid JSON; treating as no declared dependencies");
        return BTreeSet::new();
    };
    ["dependencies", "devDependencies", "peerDependencies"]
        .iter()
        .filter_map(|key| value.get(key).and_then(Value::as_object))
        .flat_map(|deps| deps.keys().cloned())
        .collect()
}

/// Reads every script source under `root`, skipping package-manager and build directories.
pub fn read_sources(root: &Path) -> Vec<(String, String)> {
    let mut sources = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!(%err, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let rel = normalize_path(&rel.to_string_lossy());
        if !is_scanned(&rel) {
            continue;
        }
        match fs::read_to_string(entry.path()) {
            Ok(content) => sources.push((rel, content)),
            Err(err) => warn!(path = %entry.path().display(), %err, "skipping unreadable source"),
        }
    }
    sources
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn is_scanned(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SCANNED_EXTENSIONS.contains(&e))
}

fn call_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\b(?:require|import)\s*\(\s*['"]([^'"\n]+)['"]\s*\)"#).expect("valid regex")
    })
}
