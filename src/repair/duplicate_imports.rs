use super::{RepairRule, SourceFile, apply_edits, canonical_source, whole_line_range};
use crate::lexer::{ImportStmt, parse_imports};
use std::collections::HashSet;

/// Removes import statements that repeat an earlier one once sources are
/// canonicalized. Nothing is reordered.
pub struct DuplicateImportRule;

impl DuplicateImportRule {
    fn duplicates(file: &SourceFile) -> Vec<ImportStmt> {
        let mut seen = HashSet::new();
        parse_imports(file.content)
            .into_iter()
            .filter(|stmt| !seen.insert(import_key(stmt, file.path)))
            .collect()
    }
}

fn import_key(stmt: &ImportStmt, path: &str) -> String {
    let mut named: Vec<String> = stmt
        .named
        .iter()
        .map(|s| match &s.alias {
            Some(alias) => format!("{} as {}", s.imported, alias),
            None => s.imported.clone(),
        })
        .collect();
    named.sort();
    format!(
        "{}|{}|{}|{}|{}",
        stmt.type_only,
        stmt.default.as_deref().unwrap_or(""),
        stmt.namespace.as_deref().unwrap_or(""),
        named.join(","),
        canonical_source(&stmt.source, path)
    )
}

impl RepairRule for DuplicateImportRule {
    fn name(&self) -> &'static str {
        "duplicate-imports"
    }

    fn precondition(&self, file: &SourceFile) -> bool {
        !Self::duplicates(file).is_empty()
    }

    fn transform(&self, file: &SourceFile) -> String {
        let edits = Self::duplicates(file)
            .iter()
            .map(|stmt| {
                let (start, end) = whole_line_range(file.content, stmt.start, stmt.end);
                (start, end, String::new())
            })
            .collect();
        apply_edits(file.content, edits)
    }
}
