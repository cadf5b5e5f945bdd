use super::catalog::UiModule;
use super::{RepairRule, SourceFile, apply_edits, canonical_source};
use crate::lexer::{
    ImportSpecifier, ImportStmt, declared_names, enclosing_open, identifier_positions,
    imported_locals, in_jsx_text, is_ident_byte, mask, next_non_space, opening_tags,
    parse_imports, prev_non_space,
};
use std::collections::BTreeSet;

/// Adds imports for UI-kit components and icons that are used but never bound.
///
/// A name counts as bound if any import statement binds it, whatever the
/// module, or if the file declares it.
pub struct MissingImportRule {
    kit: &'static [UiModule],
    icons: &'static [&'static str],
    icon_module: &'static str,
}

struct Injection {
    module: &'static str,
    names: Vec<&'static str>,
}

impl MissingImportRule {
    pub fn new(
        kit: &'static [UiModule],
        icons: &'static [&'static str],
        icon_module: &'static str,
    ) -> Self {
        Self {
            kit,
            icons,
            icon_module,
        }
    }

    fn plan(&self, content: &str, imports: &[ImportStmt]) -> Vec<Injection> {
        let bound = imported_locals(imports);

        let mut body = mask(content);
        for stmt in imports {
            body.replace_range(stmt.start..stmt.end, &" ".repeat(stmt.end - stmt.start));
        }
        let declared = declared_names(&body);
        let free = |name: &str| !bound.contains(name) && !declared.contains(name);

        let mut injections = Vec::new();
        let mut claimed = BTreeSet::new();
        for entry in self.kit {
            claimed.extend(entry.components.iter().copied());
            let names: Vec<&'static str> = entry
                .components
                .iter()
                .copied()
                .filter(|&c| free(c) && used_as_component(&body, c))
                .collect();
            if !names.is_empty() {
                injections.push(Injection {
                    module: entry.module,
                    names,
                });
            }
        }

        let icons: Vec<&'static str> = self
            .icons
            .iter()
            .copied()
            .filter(|&i| !claimed.contains(i) && free(i) && used_as_icon(&body, i))
            .collect();
        if !icons.is_empty() {
            injections.push(Injection {
                module: self.icon_module,
                names: icons,
            });
        }
        injections
    }
}

fn used_as_component(body: &str, name: &str) -> bool {
    !opening_tags(body, name).is_empty() || is_bare_call(body, name)
}

fn is_bare_call(body: &str, name: &str) -> bool {
    let b = body.as_bytes();
    identifier_positions(body, name).into_iter().any(|pos| {
        next_non_space(b, pos + name.len()) == Some(b'(')
            && !matches!(prev_non_space(b, pos), Some(b'.'))
            && !in_jsx_text(b, pos)
    })
}

/// Tags, calls, `icon={Name}`, `const I = Name`, `{ icon: Name }` and `[Name, ...]` references.
fn used_as_icon(body: &str, name: &str) -> bool {
    if used_as_component(body, name) {
        return true;
    }
    let b = body.as_bytes();
    identifier_positions(body, name).into_iter().any(|pos| {
        if in_jsx_text(b, pos) {
            return false;
        }
        let prev = prev_non_space(b, pos);
        let next = next_non_space(b, pos + name.len());
        match prev {
            Some(b'=') => !matches!(next, Some(b'.') | Some(b'=') | Some(b'>')),
            Some(b'{') => next == Some(b'}'),
            Some(b':') => {
                key_before_colon(b, pos).to_ascii_lowercase().contains("icon")
                    && matches!(next, Some(b',') | Some(b'}'))
            }
            Some(b',') | Some(b'[') => {
                matches!(enclosing_open(b, pos), Some(b'{') | Some(b'['))
                    && matches!(next, Some(b',') | Some(b'}') | Some(b']'))
            }
            _ => false,
        }
    })
}

/// The property name in `key: Name`, given the offset of `Name`.
fn key_before_colon(b: &[u8], pos: usize) -> String {
    let colon = b[..pos].iter().rposition(|&c| c == b':').unwrap_or(0);
    let end = b[..colon]
        .iter()
        .rposition(|c| !c.is_ascii_whitespace())
        .map_or(0, |p| p + 1);
    let start = b[..end]
        .iter()
        .rposition(|&c| !is_ident_byte(c))
        .map_or(0, |p| p + 1);
    String::from_utf8_lossy(&b[start..end]).into_owned()
}

/// Byte offset where new import lines go, and whether they need a leading newline.
fn insertion_point(content: &str, imports: &[ImportStmt]) -> (usize, bool) {
    if let Some(last) = imports.iter().max_by_key(|s| s.end) {
        let line_end = content[last.end..]
            .find('\n')
            .map_or(content.len(), |p| last.end + p);
        return (line_end, true);
    }

    let mut offset = 0;
    let mut after_directive = None;
    for line in content.split_inclusive('\n') {
        let t = line.trim().trim_end_matches(';');
        if t.is_empty() && after_directive.is_some() {
            offset += line.len();
            continue;
        }
        let is_directive = (t.starts_with("\"use ") && t.ends_with('"'))
            || (t.starts_with("'use ") && t.ends_with('\''));
        if !is_directive {
            break;
        }
        offset += line.len();
        after_directive = Some(offset);
    }
    match after_directive {
        Some(end) if content[..end].ends_with('\n') => (end, false),
        Some(end) => (end, true),
        None => (0, false),
    }
}

impl RepairRule for MissingImportRule {
    fn name(&self) -> &'static str {
        "missing-imports"
    }

    fn precondition(&self, file: &SourceFile) -> bool {
        let imports = parse_imports(file.content);
        !self.plan(file.content, &imports).is_empty()
    }

    fn transform(&self, file: &SourceFile) -> String {
        let imports = parse_imports(file.content);
        let injections = self.plan(file.content, &imports);
        if injections.is_empty() {
            return file.content.to_string();
        }

        let semicolon = imports.last().is_some_and(|s| s.semicolon);
        let quote = imports.first().map_or('"', |s| s.quote);
        let mut edits = Vec::new();
        let mut new_lines = Vec::new();

        for injection in injections {
            let existing = imports.iter().find(|s| {
                !s.type_only
                    && s.namespace.is_none()
                    && canonical_source(&s.source, file.path) == injection.module
            });
            match existing {
                Some(stmt) => {
                    let mut extended = stmt.clone();
                    extended
                        .named
                        .extend(injection.names.iter().map(|n| ImportSpecifier::new(*n)));
                    edits.push((stmt.start, stmt.end, extended.render()));
                }
                None => {
                    let mut stmt = ImportStmt::named_from(injection.module, &injection.names);
                    stmt.quote = quote;
                    stmt.semicolon = semicolon;
                    new_lines.push(stmt.render());
                }
            }
        }

        if !new_lines.is_empty() {
            let (at, leading_newline) = insertion_point(file.content, &imports);
            let block = new_lines.join("\n");
            let text = if leading_newline {
                format!("\n{}", block)
            } else {
                format!("{}\n", block)
            };
            edits.push((at, at, text));
        }

        apply_edits(file.content, edits)
    }
}
