use super::catalog::Collision;
use super::{RepairRule, SourceFile, apply_edits, canonical_source};
use crate::lexer::{ImportStmt, element_ranges, identifier_positions, mask, parse_imports};

/// Disambiguates a symbol imported both from a library and from the UI kit.
///
/// The library binding becomes its catalog alias, every unaliased UI-kit
/// specifier gets the kit prefix, and use-sites are renamed: inside a
/// container element (a chart) the symbol means the library's, elsewhere
/// the kit's.
pub struct SymbolCollisionRule {
    collisions: &'static [Collision],
}

impl SymbolCollisionRule {
    pub fn new(collisions: &'static [Collision]) -> Self {
        Self { collisions }
    }

    fn plan(collision: &Collision, file: &SourceFile) -> Option<Vec<(usize, usize, String)>> {
        let imports = parse_imports(file.content);
        let binds_unaliased = |stmt: &ImportStmt| {
            stmt.named
                .iter()
                .any(|s| s.imported == collision.symbol && s.alias.is_none())
        };

        let library = imports
            .iter()
            .find(|s| s.source == collision.library_module && binds_unaliased(s))?;
        let kit: Vec<&ImportStmt> = imports
            .iter()
            .filter(|s| canonical_source(&s.source, file.path) == collision.kit_module)
            .filter(|s| binds_unaliased(s))
            .collect();
        if kit.is_empty() {
            return None;
        }

        let mut edits = Vec::new();

        let mut aliased = library.clone();
        for spec in aliased.named.iter_mut().filter(|s| s.imported == collision.symbol) {
            spec.alias = Some(collision.library_alias.to_string());
        }
        edits.push((library.start, library.end, aliased.render()));

        let mut renames: Vec<(String, String)> = Vec::new();
        for stmt in &kit {
            let mut aliased = (*stmt).clone();
            for spec in aliased.named.iter_mut().filter(|s| s.alias.is_none()) {
                let alias = format!("{}{}", collision.kit_alias_prefix, spec.imported);
                renames.push((spec.imported.clone(), alias.clone()));
                spec.alias = Some(alias);
            }
            edits.push((stmt.start, stmt.end, aliased.render()));
        }

        let masked = mask(file.content);
        let bytes = masked.as_bytes();
        let regions: Vec<(usize, usize)> = collision
            .containers
            .iter()
            .flat_map(|c| element_ranges(&masked, c))
            .collect();
        let in_import = |pos: usize| imports.iter().any(|s| s.start <= pos && pos < s.end);
        let in_container = |pos: usize| regions.iter().any(|&(s, e)| s <= pos && pos < e);

        renames.sort();
        renames.dedup();
        for (from, to) in &renames {
            for pos in identifier_positions(&masked, from) {
                if in_import(pos) || (pos > 0 && bytes[pos - 1] == b'.') {
                    continue;
                }
                let target = if from == collision.symbol && in_container(pos) {
                    collision.library_alias
                } else {
                    to.as_str()
                };
                edits.push((pos, pos + from.len(), target.to_string()));
            }
        }

        Some(edits)
    }
}

impl RepairRule for SymbolCollisionRule {
    fn name(&self) -> &'static str {
        "symbol-collision"
    }

    fn precondition(&self, file: &SourceFile) -> bool {
        self.collisions
            .iter()
            .any(|c| Self::plan(c, file).is_some())
    }

    fn transform(&self, file: &SourceFile) -> String {
        let mut content = file.content.to_string();
        for collision in self.collisions {
            let current = SourceFile {
                path: file.path,
                content: &content,
            };
            if let Some(edits) = Self::plan(collision, &current) {
                content = apply_edits(&content, edits);
            }
        }
        content
    }
}
