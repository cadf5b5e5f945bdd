//! npm-backed scaffolder and installer.

use genforge::collaborators::{CollaboratorError, InstallOutcome, PackageInstaller, Scaffolder};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tracing::{debug, info};

pub struct NpmScaffolder {
    verbose: bool,
}

impl NpmScaffolder {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Scaffolder for NpmScaffolder {
    fn scaffold(&self, root: &Path, project_name: &str) -> Result<(), CollaboratorError> {
        if root.join("package.json").exists() {
            debug!(root = %root.display(), "project already scaffolded");
            return Ok(());
        }
        let parent = root.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(parent).map_err(|source| CollaboratorError::Spawn {
            tool: "create-next-app".to_string(),
            source,
        })?;

        info!(project = project_name, "running create-next-app");
        let output = Command::new("npx")
            .args(["create-next-app@latest", project_name])
            .args(["--typescript", "--eslint", "--tailwind", "--app", "--no-src-dir"])
            .args(["--import-alias", "@/*", "--yes"])
            .current_dir(parent)
            .output()
            .map_err(|source| CollaboratorError::Spawn {
                tool: "npx".to_string(),
                source,
            })?;

        echo(&output, self.verbose);
        if output.status.success() {
            Ok(())
        } else {
            Err(CollaboratorError::Failed {
                tool: "create-next-app".to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

pub struct NpmInstaller {
    verbose: bool,
}

impl NpmInstaller {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl PackageInstaller for NpmInstaller {
    fn install(&self, root: &Path, packages: &[String]) -> Result<InstallOutcome, CollaboratorError> {
        info!(packages = ?packages, "running npm install");
        let output = Command::new("npm")
            .arg("install")
            .args(packages)
            .current_dir(root)
            .output()
            .map_err(|source| CollaboratorError::Spawn {
                tool: "npm".to_string(),
                source,
            })?;

        echo(&output, self.verbose);
        Ok(InstallOutcome {
            packages: packages.to_vec(),
            success: output.status.success(),
            output: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

fn echo(output: &Output, verbose: bool) {
    if verbose || !output.status.success() {
        print!("{}", String::from_utf8_lossy(&output.stdout));
        eprint!("{}", String::from_utf8_lossy(&output.stderr));
    }
}
