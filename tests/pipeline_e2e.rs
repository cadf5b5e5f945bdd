use genforge::collaborators::{CollaboratorError, InstallOutcome, PackageInstaller, Scaffolder};
use genforge::manifest::{MANIFEST_FILE, ProjectManifest};
use genforge::pipeline::InstallStatus;
use genforge::{BuildConfig, BuildError, BuildOptions, Collaborators, build};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn options(dir: &TempDir, name: &str) -> BuildOptions {
    let config = BuildConfig {
        output_dir: dir.path().to_path_buf(),
        ..BuildConfig::default()
    };
    BuildOptions::new(name, config)
}

fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(root.join(path)).unwrap_or_else(|e| panic!("read {path}: {e}"))
}

#[test]
fn explicit_and_untagged_blocks_become_named_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let opts = options(&dir, "hero");
    let raw = "\
I'll build a landing page.

```tsx file=\"components/hero.tsx\"
export function Hero() {
  return <section className=\"py-24\">Welcome</section>
}
```

```
export function SummaryCard({ total }) {
  return <div>{total}</div>
}
```
";

    let outcome = build(raw, &opts, Collaborators::default()).expect("build");
    assert_eq!(
        outcome.materialized.written,
        vec!["components/hero.tsx", "components/summary-card.tsx", "lib/utils.ts"]
    );
    assert_eq!(
        read(&opts.project_root, "components/hero.tsx"),
        "export function Hero() {\n  return <section className=\"py-24\">Welcome</section>\n}"
    );
    assert_eq!(
        read(&opts.project_root, "components/summary-card.tsx"),
        "export function SummaryCard({ total }) {\n  return <div>{total}</div>\n}"
    );

    let manifest = ProjectManifest::load(&opts.project_root).expect("manifest");
    assert_eq!(manifest.project_name, "hero");
    assert_eq!(manifest.file_count, 3);
    assert!(manifest.modified_since(&opts.project_root).is_empty());
    assert_eq!(outcome.manifest_path, Some(opts.project_root.join(MANIFEST_FILE)));
}

#[test]
fn structured_payload_in_chat_envelope_is_authoritative() {
    let dir = tempfile::tempdir().expect("tempdir");
    let opts = options(&dir, "structured");
    let payload = serde_json::json!({
        "files": [
            {"path": "app/page.tsx", "content": "export default function Page() {\n  return <main>hi</main>\n}\n"},
            {"path": "README.md", "content": "# Demo\n"}
        ]
    });
    let body = format!(
        "```json\n{}\n```\n\n```tsx file=\"components/ignored.tsx\"\nexport function Ignored() {{}}\n```",
        payload
    );
    let raw = serde_json::json!({"choices": [{"message": {"content": body}}]}).to_string();

    let outcome = build(&raw, &opts, Collaborators::default()).expect("build");
    assert_eq!(
        outcome.materialized.written,
        vec!["README.md", "app/page.tsx", "lib/utils.ts"]
    );
    assert_eq!(
        read(&opts.project_root, "app/page.tsx"),
        "export default function Page() {\n  return <main>hi</main>\n}\n"
    );
    assert!(!opts.project_root.join("components/ignored.tsx").exists());
}

#[test]
fn colliding_tooltips_are_aliased_in_the_written_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let opts = options(&dir, "charts");
    let raw = "\
```tsx file=\"components/stats.tsx\"
import { LineChart, Line, Tooltip } from 'recharts'
import { Tooltip, TooltipContent } from '@/components/ui/tooltip'

export function Stats({ data }) {
  return (
    <LineChart data={data}>
      <Line dataKey=\"v\" />
      <Tooltip />
    </LineChart>
  )
}
```";

    let outcome = build(raw, &opts, Collaborators::default()).expect("build");
    let stats = read(&opts.project_root, "components/stats.tsx");
    assert!(stats.contains("import { LineChart, Line, Tooltip as RechartsTooltip } from 'recharts'"));
    assert!(stats.contains(
        "import { Tooltip as UITooltip, TooltipContent as UITooltipContent } from '@/components/ui/tooltip'"
    ));
    assert!(stats.contains("<RechartsTooltip />"));
    assert!(!stats.contains("<Tooltip />"));
    assert!(
        outcome
            .repairs
            .applied
            .iter()
            .any(|r| r.path == "components/stats.tsx" && r.rule == "symbol-collision")
    );
    assert_eq!(outcome.dependencies.install, vec!["recharts"]);
}

#[test]
fn protected_paths_are_never_written() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut opts = options(&dir, "protected");
    opts.config.protected_paths.push("next.config.mjs".to_string());
    let raw = "\
```css
@tailwind base;
@tailwind components;
```

```js file=\"./next.config.mjs\"
export default {}
```

```tsx file=\"app/page.tsx\"
export default function Page() { return null }
```";

    let outcome = build(raw, &opts, Collaborators::default()).expect("build");
    assert_eq!(outcome.materialized.written, vec!["app/page.tsx", "lib/utils.ts"]);
    assert_eq!(
        outcome.materialized.skipped_protected,
        vec!["app/globals.css", "next.config.mjs"]
    );
    assert!(!opts.project_root.join("app/globals.css").exists());
    assert!(!opts.project_root.join("next.config.mjs").exists());
}

#[test]
fn missing_kit_import_is_injected_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let opts = options(&dir, "buttons");
    let raw = "\
```tsx file=\"components/cta.tsx\"
export function Cta() {
  return <Button size=\"lg\">Start</Button>
}
```";

    build(raw, &opts, Collaborators::default()).expect("first build");
    let first = read(&opts.project_root, "components/cta.tsx");
    assert_eq!(first.matches("import { Button }").count(), 1);
    assert!(first.starts_with("import { Button } from \"@/components/ui/button\"\n"));

    // A second build over its own output changes nothing.
    let again = format!("```tsx file=\"components/cta.tsx\"\n{}\n```", first);
    let outcome = build(&again, &opts, Collaborators::default()).expect("second build");
    assert!(outcome.repairs.applied.is_empty());
    assert_eq!(read(&opts.project_root, "components/cta.tsx"), first.trim());
}

#[test]
fn response_without_files_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let opts = options(&dir, "empty");

    let err = build(
        r#"{"content": "Sorry, I can't help with that."}"#,
        &opts,
        Collaborators::default(),
    )
    .expect_err("no files");
    assert!(matches!(err, BuildError::NoFilesExtracted));
    assert!(!opts.project_root.exists());
}

struct FakeScaffolder {
    calls: RefCell<Vec<(PathBuf, String)>>,
    fail: bool,
}

impl FakeScaffolder {
    fn new(fail: bool) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            fail,
        }
    }
}

impl Scaffolder for FakeScaffolder {
    fn scaffold(&self, root: &Path, project_name: &str) -> Result<(), CollaboratorError> {
        self.calls
            .borrow_mut()
            .push((root.to_path_buf(), project_name.to_string()));
        if self.fail {
            return Err(CollaboratorError::Failed {
                tool: "create-next-app".to_string(),
                message: "network unreachable".to_string(),
            });
        }
        fs::create_dir_all(root.join("app")).expect("mkdir");
        fs::write(
            root.join("package.json"),
            r#"{"dependencies": {"next": "15.0.0", "framer-motion": "11.0.0"}}"#,
        )
        .expect("write package.json");
        fs::write(root.join("app/globals.css"), "/* scaffolded */").expect("write css");
        Ok(())
    }
}

struct FailingInstaller {
    requested: RefCell<Vec<String>>,
}

impl PackageInstaller for FailingInstaller {
    fn install(&self, _root: &Path, packages: &[String]) -> Result<InstallOutcome, CollaboratorError> {
        self.requested.borrow_mut().extend(packages.iter().cloned());
        Ok(InstallOutcome {
            packages: packages.to_vec(),
            success: false,
            output: "npm ERR! 404".to_string(),
        })
    }
}

#[test]
fn failed_install_does_not_fail_the_build() {
    let dir = tempfile::tempdir().expect("tempdir");
    let opts = options(&dir, "motion");
    let scaffolder = FakeScaffolder::new(false);
    let installer = FailingInstaller {
        requested: RefCell::new(Vec::new()),
    };
    let raw = "\
```tsx file=\"components/orbit.tsx\"
import { motion } from 'framer-motion'
import * as THREE from 'three'

export function Orbit() {
  return <motion.div />
}
```

```css
@tailwind base;
```";

    let outcome = build(
        raw,
        &opts,
        Collaborators {
            scaffolder: Some(&scaffolder),
            installer: Some(&installer),
        },
    )
    .expect("build succeeds despite install failure");

    assert_eq!(
        scaffolder.calls.borrow().as_slice(),
        &[(opts.project_root.clone(), "motion".to_string())]
    );
    assert_eq!(outcome.dependencies.already_declared, vec!["framer-motion"]);
    assert_eq!(*installer.requested.borrow(), vec!["@types/three", "three"]);
    assert!(matches!(outcome.install, InstallStatus::Failed(ref out) if out.contains("404")));

    // Scaffolded framework files survive; generated files are in place.
    assert_eq!(read(&opts.project_root, "app/globals.css"), "/* scaffolded */");
    assert!(opts.project_root.join("components/orbit.tsx").exists());
}

#[test]
fn scaffold_failure_stops_before_writing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let opts = options(&dir, "offline");
    let scaffolder = FakeScaffolder::new(true);
    let raw = "```tsx file=\"app/page.tsx\"\nexport default function Page() { return null }\n```";

    let err = build(
        raw,
        &opts,
        Collaborators {
            scaffolder: Some(&scaffolder),
            installer: None,
        },
    )
    .expect_err("scaffold failure is fatal");
    assert!(matches!(err, BuildError::Scaffold(_)));
    assert!(!opts.project_root.join("app/page.tsx").exists());
}

#[test]
fn ui_kit_replaces_components_ui() {
    let dir = tempfile::tempdir().expect("tempdir");
    let kit = dir.path().join("kit");
    fs::create_dir_all(kit.join("nested")).expect("mkdir");
    fs::write(kit.join("button.tsx"), "export const Button = () => null").expect("write");
    fs::write(kit.join("nested/x.tsx"), "export {}").expect("write");

    let mut opts = options(&dir, "kit");
    opts.config.ui_kit_path = Some(kit);
    let raw = "\
```tsx file=\"components/ui/button.tsx\"
export function Button() { return <button /> }
```";

    let outcome = build(raw, &opts, Collaborators::default()).expect("build");
    assert_eq!(outcome.materialized.ui_kit_files, 2);
    assert_eq!(outcome.materialized.written, vec!["lib/utils.ts"]);
    assert_eq!(outcome.materialized.superseded_by_kit, vec!["components/ui/button.tsx"]);
    assert_eq!(outcome.manifest.paths, vec!["lib/utils.ts"]);
    assert_eq!(
        read(&opts.project_root, "components/ui/button.tsx"),
        "export const Button = () => null"
    );
    assert!(opts.project_root.join("components/ui/nested/x.tsx").exists());
}

#[test]
fn missing_ui_kit_keeps_generated_components() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut opts = options(&dir, "no-kit");
    opts.config.ui_kit_path = Some(dir.path().join("no-such-kit"));
    let raw = "\
```tsx file=\"components/ui/hero.tsx\"
export function Hero() { return <section /> }
```";

    let outcome = build(raw, &opts, Collaborators::default()).expect("missing kit is not fatal");
    assert_eq!(outcome.materialized.ui_kit_files, 0);
    assert!(outcome.materialized.superseded_by_kit.is_empty());
    assert_eq!(
        outcome.materialized.written,
        vec!["components/ui/hero.tsx", "lib/utils.ts"]
    );
    assert_eq!(
        read(&opts.project_root, "components/ui/hero.tsx"),
        "export function Hero() { return <section /> }"
    );
}
