use super::catalog::TagFix;
use super::{RepairRule, SourceFile, apply_edits};
use crate::lexer::{identifier_positions, mask, opening_tags};

/// Rewrites closing tags that have no opener anywhere in the file.
pub struct ClosingTagRule {
    fixes: &'static [TagFix],
}

impl ClosingTagRule {
    pub fn new(fixes: &'static [TagFix]) -> Self {
        Self { fixes }
    }

    fn orphan_closers(fix: &TagFix, masked: &str) -> Vec<usize> {
        if !opening_tags(masked, fix.wrong).is_empty() {
            return Vec::new();
        }
        let b = masked.as_bytes();
        identifier_positions(masked, fix.wrong)
            .into_iter()
            .filter(|&p| p > 1 && b[p - 1] == b'/' && b[p - 2] == b'<')
            .collect()
    }
}

impl RepairRule for ClosingTagRule {
    fn name(&self) -> &'static str {
        "closing-tags"
    }

    fn applies_to(&self, path: &str) -> bool {
        path.ends_with(".tsx") || path.ends_with(".jsx")
    }

    fn precondition(&self, file: &SourceFile) -> bool {
        let masked = mask(file.content);
        self.fixes
            .iter()
            .any(|fix| !Self::orphan_closers(fix, &masked).is_empty())
    }

    fn transform(&self, file: &SourceFile) -> String {
        let masked = mask(file.content);
        let edits = self
            .fixes
            .iter()
            .flat_map(|fix| {
                Self::orphan_closers(fix, &masked)
                    .into_iter()
                    .map(|p| (p, p + fix.wrong.len(), fix.right.to_string()))
            })
            .collect();
        apply_edits(file.content, edits)
    }
}
