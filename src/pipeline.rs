//! One build: unwrap, extract, repair, scan, materialize, record.
//!
//! Stages run strictly in order on a file set owned by this invocation.
//! Nothing is written before extraction has produced at least one file.

use crate::collaborators::{InstallOutcome, PackageInstaller, Scaffolder};
use crate::config::BuildConfig;
use crate::deps::{DependencyReport, DependencyScanner};
use crate::envelope::{EnvelopeKind, unwrap_envelope};
use crate::error::{BuildError, Result};
use crate::extract::{SetupCommands, Strategy, extract_files};
use crate::manifest::ProjectManifest;
use crate::materialize::{MaterializeOptions, Materialized, add_default_files, materialize};
use crate::repair::{RepairPipeline, RepairReport};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub project_name: String,
    /// Directory the project is written to.
    pub project_root: PathBuf,
    pub config: BuildConfig,
    pub dry_run: bool,
}

impl BuildOptions {
    /// Places the project under the configured output directory.
    pub fn new(project_name: impl Into<String>, config: BuildConfig) -> Self {
        let project_name = project_name.into();
        Self {
            project_root: config.output_dir.join(&project_name),
            project_name,
            config,
            dry_run: false,
        }
    }
}

/// External tools the build may call. Either may be absent.
#[derive(Default, Clone, Copy)]
pub struct Collaborators<'a> {
    pub scaffolder: Option<&'a dyn Scaffolder>,
    pub installer: Option<&'a dyn PackageInstaller>,
}

#[derive(Debug, Clone)]
pub enum InstallStatus {
    NothingToInstall,
    Skipped,
    Installed(InstallOutcome),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub envelope: EnvelopeKind,
    pub strategy: Strategy,
    pub setup: SetupCommands,
    pub repairs: RepairReport,
    pub dependencies: DependencyReport,
    pub materialized: Materialized,
    pub manifest: ProjectManifest,
    pub manifest_path: Option<PathBuf>,
    pub install: InstallStatus,
}

pub fn build(raw: &str, opts: &BuildOptions, tools: Collaborators<'_>) -> Result<BuildOutcome> {
    let unwrapped = unwrap_envelope(raw);
    let extraction = extract_files(&unwrapped.text);
    if extraction.files.is_empty() {
        return Err(BuildError::NoFilesExtracted);
    }
    info!(
        files = extraction.files.len(),
        strategy = ?extraction.strategy,
        "extracted files"
    );

    let mut files = extraction.files;
    let repairs = RepairPipeline::default()
        .without(&opts.config.disabled_rules)
        .repair_files(&mut files);
    if !repairs.applied.is_empty() {
        info!(count = repairs.applied.len(), "applied repairs");
    }
    add_default_files(&mut files);

    if let Some(scaffolder) = tools.scaffolder.filter(|_| !opts.dry_run) {
        scaffolder
            .scaffold(&opts.project_root, &opts.project_name)
            .map_err(BuildError::Scaffold)?;
    }

    let existing = Some(opts.project_root.as_path()).filter(|p| p.is_dir());
    let dependencies = DependencyScanner::default()
        .with_extra(&opts.config.extra_packages)
        .scan(&files, existing, &extraction.setup.packages);

    let materialize_opts = MaterializeOptions {
        root: opts.project_root.clone(),
        protected: opts.config.protected_set(),
        ui_kit: opts.config.ui_kit_path.clone(),
        dry_run: opts.dry_run,
    };
    let materialized = materialize(&files, &materialize_opts)?;

    let manifest = ProjectManifest::new(
        &opts.project_name,
        &materialized.written,
        &files,
        &extraction.setup.commands,
        &extraction.setup.component_commands,
        &dependencies.install,
    );
    let manifest_path = if opts.dry_run {
        None
    } else {
        Some(manifest.save(&opts.project_root)?)
    };

    let install = request_install(tools.installer, &opts.project_root, &dependencies, opts.dry_run);

    Ok(BuildOutcome {
        envelope: unwrapped.kind,
        strategy: extraction.strategy,
        setup: extraction.setup,
        repairs,
        dependencies,
        materialized,
        manifest,
        manifest_path,
        install,
    })
}

fn request_install(
    installer: Option<&dyn PackageInstaller>,
    root: &Path,
    deps: &DependencyReport,
    dry_run: bool,
) -> InstallStatus {
    if deps.install.is_empty() {
        return InstallStatus::NothingToInstall;
    }
    let Some(installer) = installer.filter(|_| !dry_run) else {
        return InstallStatus::Skipped;
    };
    match installer.install(root, &deps.install) {
        Ok(outcome) if outcome.success => InstallStatus::Installed(outcome),
        Ok(outcome) => {
            warn!(packages = ?outcome.packages, "package install reported failure");
            InstallStatus::Failed(outcome.output)
        }
        Err(err) => {
            warn!(%err, "package install failed; build continues");
            InstallStatus::Failed(err.to_string())
        }
    }
}
