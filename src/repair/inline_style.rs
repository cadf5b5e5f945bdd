use super::{RepairRule, SourceFile};
use regex::Regex;
use std::sync::OnceLock;

/// Strips `<style jsx>` blocks and maps invented animation classes to built-in ones.
pub struct InlineStyleRule {
    /// Sorted longest class first so a prefix never shadows a longer name.
    classes: Vec<(&'static str, &'static str)>,
}

impl InlineStyleRule {
    pub fn new(classes: &[(&'static str, &'static str)]) -> Self {
        let mut classes = classes.to_vec();
        classes.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));
        Self { classes }
    }

    fn replace_classes(&self, content: &str) -> String {
        let mut out = content.to_string();
        for (class, replacement) in &self.classes {
            let positions = class_positions(&out, class);
            for pos in positions.into_iter().rev() {
                out.replace_range(pos..pos + class.len(), replacement);
            }
        }
        out
    }
}

fn is_class_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'_' || c == b':'
}

/// Offsets of `class` as a whole class-name token.
fn class_positions(text: &str, class: &str) -> Vec<usize> {
    let b = text.as_bytes();
    text.match_indices(class)
        .map(|(pos, _)| pos)
        .filter(|&pos| {
            let end = pos + class.len();
            let before_ok = pos == 0 || !is_class_byte(b[pos - 1]) || b[pos - 1] == b':';
            let after_ok = end >= b.len() || !is_class_byte(b[end]);
            before_ok && after_ok
        })
        .collect()
}

fn style_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)[ \t]*<style\s+jsx(?:\s+global)?\s*>\s*\{\s*`.*?`\s*\}\s*</style>[ \t]*(?:\r?\n)?")
            .expect("valid regex")
    })
}

impl RepairRule for InlineStyleRule {
    fn name(&self) -> &'static str {
        "inline-style"
    }

    fn applies_to(&self, path: &str) -> bool {
        path.ends_with(".tsx") || path.ends_with(".jsx")
    }

    fn precondition(&self, file: &SourceFile) -> bool {
        style_block_re().is_match(file.content)
            || self
                .classes
                .iter()
                .any(|(class, _)| !class_positions(file.content, class).is_empty())
    }

    fn transform(&self, file: &SourceFile) -> String {
        let stripped = style_block_re().replace_all(file.content, "");
        self.replace_classes(&stripped)
    }
}
