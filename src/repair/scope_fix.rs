use super::catalog::ScopeFix;
use super::{RepairRule, SourceFile, apply_edits};
use crate::lexer::{
    enclosing_open, identifier_positions, mask, matching_brace, next_non_space, prev_non_space,
};
use regex::Regex;

/// Qualifies bare uses of state fields inside a known function whose first
/// parameter is the state object: `angle` becomes `state.angle`.
pub struct ScopeFixRule {
    fixes: Vec<(ScopeFix, Regex)>,
}

impl ScopeFixRule {
    pub fn new(fixes: &'static [ScopeFix]) -> Self {
        let fixes = fixes
            .iter()
            .filter_map(|fix| {
                let pattern = format!(
                    r"(?:\bfunction\s+{name}\s*\(|\b(?:const|let|var)\s+{name}\s*=\s*(?:async\s*)?(?:function\s*)?\()\s*{object}\b[^)]*\)[^{{;]*\{{",
                    name = regex::escape(fix.function),
                    object = regex::escape(fix.object),
                );
                Regex::new(&pattern).ok().map(|re| (*fix, re))
            })
            .collect();
        Self { fixes }
    }

    fn plan(fix: &ScopeFix, signature: &Regex, content: &str) -> Vec<(usize, usize, String)> {
        let masked = mask(content);
        let bytes = masked.as_bytes();
        let mut edits = Vec::new();

        for m in signature.find_iter(&masked) {
            let open = m.end() - 1;
            let Some(close) = matching_brace(&masked, open) else {
                continue;
            };
            let params = &masked[m.start()..open];
            let body = &masked[open + 1..close];

            for field in fix.fields {
                if !identifier_positions(params, field).is_empty() || is_bound_in(body, field) {
                    continue;
                }
                for rel in identifier_positions(body, field) {
                    let pos = open + 1 + rel;
                    let end = pos + field.len();
                    let prev = prev_non_space(bytes, pos);
                    let next = next_non_space(bytes, end);
                    if prev == Some(b'.') {
                        continue;
                    }
                    let in_object = enclosing_open(bytes, pos) == Some(b'{');
                    let after_key_position = matches!(prev, Some(b'{') | Some(b','));
                    if in_object && after_key_position && next == Some(b':') {
                        continue;
                    }
                    let qualified = format!("{}.{}", fix.object, field);
                    let replacement = if in_object
                        && after_key_position
                        && matches!(next, Some(b',') | Some(b'}'))
                    {
                        format!("{}: {}", field, qualified)
                    } else {
                        qualified
                    };
                    edits.push((pos, end, replacement));
                }
            }
        }
        edits
    }
}

/// True if `field` is declared, destructured or taken as an arrow parameter in `body`.
fn is_bound_in(body: &str, field: &str) -> bool {
    let f = regex::escape(field);
    let patterns = [
        format!(r"\b(?:const|let|var)\s+{f}\b"),
        format!(r"\b(?:const|let|var)\s*[\{{\[][^=]*\b{f}\b[^=]*[\}}\]]\s*="),
        format!(r"\(\s*[^()]*\b{f}\b[^()]*\)\s*=>"),
        format!(r"\b{f}\s*=>"),
        format!(r"\bfunction\b[^(]*\([^)]*\b{f}\b"),
    ];
    patterns
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .any(|re| re.is_match(body))
}

impl RepairRule for ScopeFixRule {
    fn name(&self) -> &'static str {
        "scope-fix"
    }

    fn precondition(&self, file: &SourceFile) -> bool {
        self.fixes
            .iter()
            .any(|(fix, re)| !Self::plan(fix, re, file.content).is_empty())
    }

    fn transform(&self, file: &SourceFile) -> String {
        let mut content = file.content.to_string();
        for (fix, re) in &self.fixes {
            let edits = Self::plan(fix, re, &content);
            if !edits.is_empty() {
                content = apply_edits(&content, edits);
            }
        }
        content
    }
}
