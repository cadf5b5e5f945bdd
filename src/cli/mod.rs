use anyhow::{Context, Result};
use genforge::collaborators::{GenerationClient, PackageInstaller, Scaffolder};
use genforge::config::{ConfigOverrides, load_or_default};
use genforge::deps::DependencyScanner;
use genforge::envelope::unwrap_envelope;
use genforge::extract::extract_files;
use genforge::{BuildOptions, Collaborators, FileSet, RepairPipeline};
use std::fs;
use std::path::{Path, PathBuf};

mod generation;
mod npm;
mod progress;

use generation::V0Client;
use npm::{NpmInstaller, NpmScaffolder};
use progress::{ProgressIndicator, print_build_summary};

#[derive(Clone, Copy)]
pub struct Config {
    pub verbose: bool,
    pub dry_run: bool,
}

pub struct BuildArgs {
    pub response: PathBuf,
    pub project_name: Option<String>,
    pub config_file: Option<PathBuf>,
    pub overrides: ConfigOverrides,
    pub scaffold: bool,
    pub install: bool,
}

pub fn build(args: BuildArgs, config: &Config) -> Result<()> {
    let raw = fs::read_to_string(&args.response)
        .with_context(|| format!("Failed to read response file {}", args.response.display()))?;

    let project_name = match args.project_name {
        Some(name) => name,
        None => project_name_from(&args.response),
    };
    let build_config = load_or_default(args.config_file.as_deref(), Path::new("."))
        .context("Failed to load configuration")?
        .merge(args.overrides);

    let mut opts = BuildOptions::new(project_name, build_config);
    opts.dry_run = config.dry_run;

    if config.dry_run {
        println!(
            "[DRY RUN] Would build project '{}' in {}",
            opts.project_name,
            opts.project_root.display()
        );
    } else {
        println!(
            "Building project '{}' in {}",
            opts.project_name,
            opts.project_root.display()
        );
    }

    let scaffolder = args.scaffold.then(|| NpmScaffolder::new(config.verbose));
    let installer = args.install.then(|| NpmInstaller::new(config.verbose));
    let tools = Collaborators {
        scaffolder: scaffolder.as_ref().map(|s| s as &dyn Scaffolder),
        installer: installer.as_ref().map(|i| i as &dyn PackageInstaller),
    };

    let outcome = genforge::build(&raw, &opts, tools)
        .with_context(|| format!("Build of '{}' failed", opts.project_name))?;

    print_build_summary(&outcome, &opts, config);
    Ok(())
}

pub fn extract(response: &Path, json: bool, config: &Config) -> Result<()> {
    let raw = fs::read_to_string(response)
        .with_context(|| format!("Failed to read response file {}", response.display()))?;
    let unwrapped = unwrap_envelope(&raw);
    let extraction = extract_files(&unwrapped.text);

    if extraction.files.is_empty() {
        anyhow::bail!("No extractable files found in {}", response.display());
    }

    if json {
        let out = serde_json::to_string_pretty(&extraction.files)
            .context("Failed to serialize extracted files")?;
        println!("{}", out);
        return Ok(());
    }

    if config.verbose {
        println!(
            "Envelope: {:?}, strategy: {:?}",
            unwrapped.kind, extraction.strategy
        );
    }
    println!("Extracted {} file(s):", extraction.files.len());
    for file in extraction.files.iter() {
        println!(
            "  {:<40} {:?} ({} lines, {:?})",
            file.path,
            file.language,
            file.content.lines().count(),
            file.source_pattern
        );
    }
    if !extraction.setup.is_empty() {
        println!("Setup commands:");
        for cmd in &extraction.setup.commands {
            println!("  {}", cmd);
        }
    }
    Ok(())
}

pub fn repair(files: &[PathBuf], write: bool, config: &Config) -> Result<()> {
    let build_config =
        load_or_default(None, Path::new(".")).context("Failed to load configuration")?;
    let pipeline = RepairPipeline::default().without(&build_config.disabled_rules);

    let mut progress = ProgressIndicator::new(files.len());
    for file in files {
        let name = file.display().to_string();
        progress.start_item(&name);

        let content = fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let (repaired, report) = pipeline.repair(&name, &content);

        for applied in &report.applied {
            println!("  ✓ {}", applied.rule);
        }
        for failure in &report.failures {
            println!("  ✗ {}: {}", failure.rule, failure.message);
        }

        if repaired != content && write {
            if config.dry_run {
                println!("  [DRY RUN] Would write {}", name);
            } else {
                fs::write(file, &repaired)
                    .with_context(|| format!("Failed to write {}", file.display()))?;
            }
        }
        progress.complete_item(report.failures.is_empty(), !report.applied.is_empty());
    }
    progress.finish();
    Ok(())
}

pub fn deps(project: &Path, config: &Config) -> Result<()> {
    if !project.is_dir() {
        anyhow::bail!("{} is not a directory", project.display());
    }
    let build_config =
        load_or_default(None, Path::new(".")).context("Failed to load configuration")?;
    let report = DependencyScanner::default()
        .with_extra(&build_config.extra_packages)
        .scan(&FileSet::new(), Some(project), &[]);

    if report.matched.is_empty() {
        println!("No optional packages referenced");
        return Ok(());
    }
    if config.verbose {
        println!("Referenced: {}", report.matched.join(", "));
    }
    if !report.already_declared.is_empty() {
        println!("Already declared: {}", report.already_declared.join(" "));
    }
    if report.install.is_empty() {
        println!("Nothing to install");
    } else {
        println!("npm install {}", report.install.join(" "));
    }
    Ok(())
}

pub async fn generate(
    prompt_file: &Path,
    out: Option<PathBuf>,
    then_build: bool,
    config: &Config,
) -> Result<()> {
    let prompt = fs::read_to_string(prompt_file)
        .with_context(|| format!("Failed to read prompt file {}", prompt_file.display()))?;
    let out = out.unwrap_or_else(|| prompt_file.with_extension("response.md"));

    if config.dry_run {
        println!(
            "[DRY RUN] Would send {} byte prompt and store the response in {}",
            prompt.len(),
            out.display()
        );
        return Ok(());
    }

    let client = V0Client::from_env().context("Generation service is not configured")?;
    println!("Requesting generation with model {}...", client.model());
    let raw = client
        .generate(&prompt)
        .await
        .context("Generation request failed")?;
    fs::write(&out, &raw).with_context(|| format!("Failed to write {}", out.display()))?;
    println!("✓ Response stored in {}", out.display());

    if then_build {
        let args = BuildArgs {
            response: out,
            project_name: None,
            config_file: None,
            overrides: ConfigOverrides::default(),
            scaffold: false,
            install: false,
        };
        build(args, config)?;
    }
    Ok(())
}

/// File stem of the response, reduced to characters safe for a directory name.
fn project_name_from(response: &Path) -> String {
    let stem = response
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = stem.split('.').next().unwrap_or_default();
    let name: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let name = name.trim_matches('-');
    if name.is_empty() {
        "generated-project".to_string()
    } else {
        name.to_string()
    }
}
