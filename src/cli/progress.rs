use super::Config;
use genforge::pipeline::InstallStatus;
use genforge::{BuildOptions, BuildOutcome};
use std::time::Instant;

pub struct ProgressIndicator {
    total: usize,
    repaired: usize,
    unchanged: usize,
    failed: usize,
    start_time: Instant,
}

impl ProgressIndicator {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            repaired: 0,
            unchanged: 0,
            failed: 0,
            start_time: Instant::now(),
        }
    }

    pub fn start_item(&self, name: &str) {
        println!(
            "Repairing: {} ({}/{})",
            name,
            self.repaired + self.unchanged + self.failed + 1,
            self.total
        );
    }

    pub fn complete_item(&mut self, success: bool, changed: bool) {
        if !success {
            self.failed += 1;
        } else if changed {
            self.repaired += 1;
        } else {
            self.unchanged += 1;
        }
    }

    pub fn finish(&self) {
        let elapsed = self.start_time.elapsed();
        println!("\n{}", "=".repeat(60));
        println!("Summary:");
        println!("  Total:     {}", self.total);
        println!("  Repaired:  {}", self.repaired);
        println!("  Unchanged: {}", self.unchanged);
        println!("  Failed:    {}", self.failed);
        println!("  Duration:  {:.2}s", elapsed.as_secs_f64());
        println!("{}", "=".repeat(60));
    }
}

pub fn print_build_summary(outcome: &BuildOutcome, opts: &BuildOptions, config: &Config) {
    println!("\n{}", "=".repeat(60));
    println!("{}", outcome.manifest.summary());

    if !outcome.repairs.applied.is_empty() {
        println!("  Repairs:");
        for applied in &outcome.repairs.applied {
            println!("    {} ({})", applied.path, applied.rule);
        }
    }
    for failure in &outcome.repairs.failures {
        println!("  ✗ {} in {}: {}", failure.rule, failure.path, failure.message);
    }
    for path in &outcome.materialized.skipped_protected {
        println!("  Protected, not written: {}", path);
    }
    for path in &outcome.materialized.superseded_by_kit {
        println!("  Replaced by UI kit: {}", path);
    }
    for path in &outcome.materialized.refused {
        println!("  Refused (outside project): {}", path);
    }
    if outcome.materialized.ui_kit_files > 0 {
        println!("  UI kit files:  {}", outcome.materialized.ui_kit_files);
    }
    if !outcome.setup.component_commands.is_empty() {
        println!("  Component commands:");
        for cmd in &outcome.setup.component_commands {
            println!("    {}", cmd);
        }
    }

    match &outcome.install {
        InstallStatus::NothingToInstall => {}
        InstallStatus::Skipped => {
            println!("  Install later: npm install {}", outcome.dependencies.install.join(" "))
        }
        InstallStatus::Installed(result) => {
            println!("  ✓ Installed:   {}", result.packages.join(" "))
        }
        InstallStatus::Failed(message) => {
            println!("  ✗ Install failed; the project was still written");
            if config.verbose {
                println!("{}", message);
            }
        }
    }

    if config.verbose {
        println!(
            "  Envelope: {:?}, strategy: {:?}",
            outcome.envelope, outcome.strategy
        );
    }
    match &outcome.manifest_path {
        Some(path) => println!("  Manifest:      {}", path.display()),
        None => println!("  [DRY RUN] Nothing written to {}", opts.project_root.display()),
    }
    println!("{}", "=".repeat(60));
}
