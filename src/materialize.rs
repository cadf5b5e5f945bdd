//! Project Materializer: writes the repaired file set under the project root.

use crate::error::{BuildError, Result};
use crate::files::{ExtractedFile, FileSet, Language, SourcePattern, escapes_root, normalize_path};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const UTILS_PATH: &str = "lib/utils.ts";

pub const UTILS_TEMPLATE: &str = r#"import { clsx, type ClassValue } from "clsx"
import { twMerge } from "tailwind-merge"

export function cn(...inputs: ClassValue[]) {
  return twMerge(clsx(inputs))
}
"#;

/// Directory the UI kit is copied to, relative to the project root.
pub const UI_KIT_DEST: &str = "components/ui";

#[derive(Debug, Clone)]
pub struct MaterializeOptions {
    pub root: PathBuf,
    pub protected: BTreeSet<String>,
    pub ui_kit: Option<PathBuf>,
    pub dry_run: bool,
}

impl MaterializeOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            protected: BTreeSet::new(),
            ui_kit: None,
            dry_run: false,
        }
    }

    pub fn is_protected(&self, path: &str) -> bool {
        self.protected.contains(&normalize_path(path))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Materialized {
    /// Paths written, relative to the root, in path order.
    pub written: Vec<String>,
    pub skipped_protected: Vec<String>,
    /// Paths refused because they would leave the project root.
    pub refused: Vec<String>,
    /// Files copied from the UI kit.
    pub ui_kit_files: usize,
    /// Generated files under the kit directory that the kit copy replaced.
    #[serde(default)]
    pub superseded_by_kit: Vec<String>,
}

/// Adds baseline files that every project needs when the set lacks them.
/// Returns the paths that were added.
pub fn add_default_files(files: &mut FileSet) -> Vec<String> {
    let mut added = Vec::new();
    if !files.contains(UTILS_PATH) {
        files.insert_first(ExtractedFile::new(
            UTILS_PATH,
            UTILS_TEMPLATE,
            Language::TypeScript,
            SourcePattern::DefaultTemplate,
        ));
        added.push(UTILS_PATH.to_string());
        debug!(path = UTILS_PATH, "added default file");
    }
    added
}

/// Writes every file except protected ones, then merges the UI kit.
///
/// I/O errors abort immediately; files already written stay on disk.
pub fn materialize(files: &FileSet, opts: &MaterializeOptions) -> Result<Materialized> {
    let mut out = Materialized::default();

    for file in files.iter() {
        if opts.is_protected(&file.path) {
            debug!(path = %file.path, "protected path; not written");
            out.skipped_protected.push(file.path.clone());
            continue;
        }
        if escapes_root(&file.path) {
            warn!(path = %file.path, "refusing to write outside the project root");
            out.refused.push(file.path.clone());
            continue;
        }

        let target = opts.root.join(&file.path);
        if !opts.dry_run {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
            }
            fs::write(&target, &file.content).map_err(|e| BuildError::io(&target, e))?;
        }
        debug!(path = %file.path, dry_run = opts.dry_run, "wrote file");
        out.written.push(file.path.clone());
    }

    if let Some(kit) = &opts.ui_kit {
        if !kit.is_dir() {
            warn!(source = %kit.display(), "UI kit directory not found; keeping generated components");
            return Ok(out);
        }
        out.ui_kit_files = if opts.dry_run {
            count_files(kit)
        } else {
            copy_ui_kit(kit, &opts.root.join(UI_KIT_DEST))?
        };
        let prefix = format!("{}/", UI_KIT_DEST);
        let (superseded, kept): (Vec<String>, Vec<String>) = std::mem::take(&mut out.written)
            .into_iter()
            .partition(|path| path.starts_with(&prefix));
        out.written = kept;
        out.superseded_by_kit = superseded;
        info!(source = %kit.display(), files = out.ui_kit_files, "merged UI kit");
    }

    Ok(out)
}

/// Replaces `dest` with a copy of `source`. Returns the number of files copied.
///
/// A missing `source` leaves `dest` untouched and copies nothing.
pub fn copy_ui_kit(source: &Path, dest: &Path) -> Result<usize> {
    if !source.is_dir() {
        warn!(source = %source.display(), "UI kit directory not found; nothing copied");
        return Ok(0);
    }
    if dest.exists() {
        fs::remove_dir_all(dest).map_err(|e| BuildError::io(dest, e))?;
    }
    fs::create_dir_all(dest).map_err(|e| BuildError::io(dest, e))?;

    let mut copied = 0;
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            BuildError::io(path, e.into())
        })?;
        let Ok(rel) = entry.path().strip_prefix(source) else {
            continue;
        };
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| BuildError::io(&target, e))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target).map_err(|e| BuildError::io(&target, e))?;
            copied += 1;
        }
    }
    Ok(copied)
}

fn count_files(dir: &Path) -> usize {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count()
}
