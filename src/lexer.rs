//! Just enough of a JS/TS lexer to reason about imports and JSX tags.
//!
//! [`mask`] blanks out the inside of strings and comments while keeping byte
//! offsets and line breaks intact, so searches for identifiers or tags never
//! hit text inside a literal. [`parse_imports`] reads ES import statements,
//! including ones spread over several lines.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Returns `src` with string contents and comments replaced by spaces.
///
/// Quote characters themselves are kept. Single and double quoted strings do
/// not cross a line break; a quote with no partner on its line is treated as
/// plain text. A `'` directly after an identifier character (`Don't`, `it's`)
/// is an apostrophe in JSX text, never the start of a string.
pub fn mask(src: &str) -> String {
    let b = src.as_bytes();
    let n = b.len();
    let mut out = b.to_vec();
    let mut i = 0;

    while i < n {
        match b[i] {
            b'/' if i + 1 < n && b[i + 1] == b'/' && (i == 0 || b[i - 1] != b':') => {
                let end = b[i..].iter().position(|&c| c == b'\n').map_or(n, |p| i + p);
                blank(&mut out, i, end);
                i = end;
            }
            b'/' if i + 1 < n && b[i + 1] == b'*' => {
                let end = find_from(b, i + 2, b"*/").map_or(n, |p| p + 2);
                blank(&mut out, i, end);
                i = end;
            }
            b'\'' if i > 0 && is_ident_byte(b[i - 1]) => i += 1,
            q @ (b'\'' | b'"') => match closing_quote(b, i + 1, q, false) {
                Some(j) => {
                    blank(&mut out, i + 1, j);
                    i = j + 1;
                }
                None => i += 1,
            },
            b'`' => match closing_quote(b, i + 1, b'`', true) {
                Some(j) => {
                    blank(&mut out, i + 1, j);
                    i = j + 1;
                }
                None => i += 1,
            },
            _ => i += 1,
        }
    }

    // Only whole runs between ASCII delimiters are blanked, so this stays valid UTF-8.
    String::from_utf8(out).unwrap_or_else(|_| src.to_string())
}

fn blank(out: &mut [u8], from: usize, to: usize) {
    for c in &mut out[from..to] {
        if *c != b'\n' {
            *c = b' ';
        }
    }
}

fn find_from(b: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from > b.len() {
        return None;
    }
    b[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| from + p)
}

fn closing_quote(b: &[u8], from: usize, quote: u8, multiline: bool) -> Option<usize> {
    let mut j = from;
    while j < b.len() {
        match b[j] {
            b'\\' => j += 2,
            b'\n' if !multiline => return None,
            c if c == quote => return Some(j),
            _ => j += 1,
        }
    }
    None
}

pub fn is_ident_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'$'
}

/// Byte offsets of `name` in `text` as a whole identifier.
pub fn identifier_positions(text: &str, name: &str) -> Vec<usize> {
    let b = text.as_bytes();
    text.match_indices(name)
        .map(|(pos, _)| pos)
        .filter(|&pos| {
            let before = pos == 0 || !is_ident_byte(b[pos - 1]);
            let end = pos + name.len();
            let after = end >= b.len() || !is_ident_byte(b[end]);
            before && after
        })
        .collect()
}

/// True when `pos` sits in JSX text: after a tag's `>` and before the next `<`,
/// with no expression delimiter in between. Works on masked text.
pub fn in_jsx_text(masked: &[u8], pos: usize) -> bool {
    let Some(open) = masked[..pos]
        .iter()
        .rposition(|c| matches!(c, b'>' | b'<' | b'{' | b'}' | b';' | b'='))
    else {
        return false;
    };
    if masked[open] != b'>' || (open > 0 && masked[open - 1] == b'=') {
        return false;
    }
    masked[pos..]
        .iter()
        .find(|c| matches!(c, b'<' | b'{' | b'}' | b';'))
        .is_some_and(|&c| c == b'<')
}

/// Offset of the `}` matching the `{` at `open`, counted on masked text.
pub fn matching_brace(masked: &str, open: usize) -> Option<usize> {
    let b = masked.as_bytes();
    if b.get(open) != Some(&b'{') {
        return None;
    }
    let mut depth = 0usize;
    for (j, &c) in b.iter().enumerate().skip(open) {
        match c {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(j);
                }
            }
            _ => {}
        }
    }
    None
}

pub fn prev_non_space(b: &[u8], pos: usize) -> Option<u8> {
    b[..pos].iter().rev().copied().find(|c| !c.is_ascii_whitespace())
}

pub fn next_non_space(b: &[u8], pos: usize) -> Option<u8> {
    b[pos..].iter().copied().find(|c| !c.is_ascii_whitespace())
}

/// The innermost unclosed bracket before `pos`.
pub fn enclosing_open(b: &[u8], pos: usize) -> Option<u8> {
    let mut depth = 0i32;
    for &c in b[..pos].iter().rev() {
        match c {
            b')' | b']' | b'}' => depth += 1,
            b'(' | b'[' | b'{' => {
                if depth == 0 {
                    return Some(c);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

/// Offsets of `<Name` opening tags in masked text.
pub fn opening_tags(masked: &str, name: &str) -> Vec<usize> {
    let b = masked.as_bytes();
    identifier_positions(masked, name)
        .into_iter()
        .filter(|&p| p > 0 && b[p - 1] == b'<')
        .map(|p| p - 1)
        .collect()
}

/// Byte ranges of every `<Name ...>...</Name>` element in masked text.
///
/// A self-closing element covers only its tag. An element that is never
/// closed runs to the end of the text.
pub fn element_ranges(masked: &str, name: &str) -> Vec<(usize, usize)> {
    let b = masked.as_bytes();
    let opens = opening_tags(masked, name);
    let closes: Vec<usize> = identifier_positions(masked, name)
        .into_iter()
        .filter(|&p| p > 1 && b[p - 1] == b'/' && b[p - 2] == b'<')
        .map(|p| p - 2)
        .collect();

    let mut ranges = Vec::new();
    for &open in &opens {
        let Some(tag_end) = tag_end(b, open) else {
            continue;
        };
        if b[tag_end - 1] == b'/' {
            ranges.push((open, tag_end + 1));
            continue;
        }

        let mut depth = 1usize;
        let mut events: Vec<(usize, bool)> = opens
            .iter()
            .filter(|&&o| o > open)
            .filter(|&&o| tag_end_is_open(b, o))
            .map(|&o| (o, true))
            .chain(closes.iter().filter(|&&c| c > tag_end).map(|&c| (c, false)))
            .collect();
        events.sort();

        let mut end = masked.len();
        for (pos, is_open) in events {
            if is_open {
                depth += 1;
            } else {
                depth -= 1;
                if depth == 0 {
                    end = masked[pos..].find('>').map_or(masked.len(), |p| pos + p + 1);
                    break;
                }
            }
        }
        ranges.push((open, end));
    }
    ranges
}

/// Offset of the `>` ending the tag that starts at `start`, skipping `{...}` attribute values.
fn tag_end(b: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (j, &c) in b.iter().enumerate().skip(start + 1) {
        match c {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b'>' if depth == 0 => return Some(j),
            b'<' if depth == 0 => return None,
            _ => {}
        }
    }
    None
}

fn tag_end_is_open(b: &[u8], start: usize) -> bool {
    tag_end(b, start).is_some_and(|end| b[end - 1] != b'/')
}

/// Names declared at any level by `function`, `class`, `const`/`let`/`var`,
/// `interface`, `type` or `enum`.
pub fn declared_names(masked: &str) -> BTreeSet<String> {
    declaration_re()
        .captures_iter(masked)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

fn declaration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:function|class|const|let|var|interface|type|enum)\s+([A-Za-z_$][\w$]*)")
            .expect("valid regex")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpecifier {
    pub imported: String,
    pub alias: Option<String>,
    pub type_only: bool,
}

impl ImportSpecifier {
    pub fn new(imported: impl Into<String>) -> Self {
        Self {
            imported: imported.into(),
            alias: None,
            type_only: false,
        }
    }

    /// The name this specifier binds in the importing file.
    pub fn local(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.imported)
    }

    fn render(&self) -> String {
        let mut s = String::new();
        if self.type_only {
            s.push_str("type ");
        }
        s.push_str(&self.imported);
        if let Some(alias) = &self.alias {
            s.push_str(" as ");
            s.push_str(alias);
        }
        s
    }
}

/// One ES import statement and its byte range in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStmt {
    pub start: usize,
    /// Exclusive end, after the optional semicolon.
    pub end: usize,
    pub type_only: bool,
    pub default: Option<String>,
    pub namespace: Option<String>,
    pub named: Vec<ImportSpecifier>,
    pub source: String,
    pub quote: char,
    pub semicolon: bool,
}

impl ImportStmt {
    /// A fresh `import { a, b } from "source"` statement.
    pub fn named_from(source: &str, names: &[&str]) -> Self {
        Self {
            start: 0,
            end: 0,
            type_only: false,
            default: None,
            namespace: None,
            named: names.iter().map(|n| ImportSpecifier::new(*n)).collect(),
            source: source.to_string(),
            quote: '"',
            semicolon: false,
        }
    }

    /// Every name the statement binds locally.
    pub fn locals(&self) -> Vec<&str> {
        self.default
            .as_deref()
            .into_iter()
            .chain(self.namespace.as_deref())
            .chain(self.named.iter().map(ImportSpecifier::local))
            .collect()
    }

    pub fn imports_name(&self, imported: &str) -> bool {
        self.named.iter().any(|s| s.imported == imported)
    }

    pub fn is_side_effect(&self) -> bool {
        self.default.is_none() && self.namespace.is_none() && self.named.is_empty()
    }

    pub fn render(&self) -> String {
        let from = format!("{q}{}{q}", self.source, q = self.quote);
        let semi = if self.semicolon { ";" } else { "" };
        if self.is_side_effect() {
            return format!("import {}{}", from, semi);
        }

        let mut clause = Vec::new();
        if let Some(d) = &self.default {
            clause.push(d.clone());
        }
        if let Some(ns) = &self.namespace {
            clause.push(format!("* as {}", ns));
        }
        if !self.named.is_empty() {
            let names: Vec<String> = self.named.iter().map(ImportSpecifier::render).collect();
            clause.push(format!("{{ {} }}", names.join(", ")));
        }
        let type_kw = if self.type_only { "type " } else { "" };
        format!("import {}{} from {}{}", type_kw, clause.join(", "), from, semi)
    }
}

/// All top-level-looking import statements in `src`, in source order.
///
/// A statement starts with `import` as the first token on its line. Dynamic
/// `import(...)` and `import.meta` are skipped.
pub fn parse_imports(src: &str) -> Vec<ImportStmt> {
    let masked = mask(src);
    let mb = masked.as_bytes();
    let mut out = Vec::new();

    for (pos, _) in masked.match_indices("import") {
        let line_start = masked[..pos].rfind('\n').map_or(0, |p| p + 1);
        if !masked[line_start..pos].trim().is_empty() {
            continue;
        }
        let after = pos + "import".len();
        match mb.get(after) {
            Some(c) if c.is_ascii_whitespace() || matches!(c, b'{' | b'*' | b'\'' | b'"') => {}
            _ => continue,
        }
        if let Some(stmt) = parse_one(src, mb, pos, after) {
            out.push(stmt);
        }
    }
    out
}

fn parse_one(src: &str, mb: &[u8], start: usize, after: usize) -> Option<ImportStmt> {
    let quote_pos = (after..mb.len()).find(|&j| mb[j] == b'\'' || mb[j] == b'"')?;
    let quote = mb[quote_pos];
    let close = closing_quote(src.as_bytes(), quote_pos + 1, quote, false)?;
    let source = src[quote_pos + 1..close].to_string();

    let clause_text = &src[after..quote_pos];
    if !clause_text
        .bytes()
        .all(|c| is_ident_byte(c) || c.is_ascii_whitespace() || matches!(c, b'{' | b'}' | b',' | b'*'))
    {
        return None;
    }

    let mut clause = clause_text.trim();
    if !clause.is_empty() {
        clause = clause.strip_suffix("from")?.trim_end();
    }

    let mut stmt = ImportStmt {
        start,
        end: close + 1,
        type_only: false,
        default: None,
        namespace: None,
        named: Vec::new(),
        source,
        quote: quote as char,
        semicolon: false,
    };
    if mb.get(close + 1) == Some(&b';') {
        stmt.semicolon = true;
        stmt.end += 1;
    }

    if let Some(rest) = clause.strip_prefix("type") {
        if rest.starts_with(|c: char| c.is_whitespace() || c == '{') {
            stmt.type_only = true;
            clause = rest.trim_start();
        }
    }

    let (head, braces) = match clause.find('{') {
        Some(open) => {
            let close = clause.rfind('}')?;
            (&clause[..open], Some(&clause[open + 1..close]))
        }
        None => (clause, None),
    };

    for part in head.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some(ns) = part.strip_prefix('*') {
            let name = ns.trim().strip_prefix("as")?.trim();
            stmt.namespace = Some(name.to_string());
        } else {
            stmt.default = Some(part.to_string());
        }
    }

    if let Some(inner) = braces {
        for part in inner.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let words: Vec<&str> = part.split_whitespace().collect();
            let spec = match words.as_slice() {
                ["type", name, "as", alias] => ImportSpecifier {
                    imported: name.to_string(),
                    alias: Some(alias.to_string()),
                    type_only: true,
                },
                [name, "as", alias] => ImportSpecifier {
                    imported: name.to_string(),
                    alias: Some(alias.to_string()),
                    type_only: false,
                },
                ["type", name] => ImportSpecifier {
                    imported: name.to_string(),
                    alias: None,
                    type_only: true,
                },
                [name] => ImportSpecifier::new(*name),
                _ => return None,
            };
            stmt.named.push(spec);
        }
    }

    Some(stmt)
}

/// Every local name bound by any import in `imports`.
pub fn imported_locals(imports: &[ImportStmt]) -> BTreeSet<String> {
    imports
        .iter()
        .flat_map(|i| i.locals())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masking_keeps_offsets() {
        let src = "const a = \"<Button>\" // <Card>\nconst b = `x\n<Alert>` /* <Tooltip> */ <Badge />";
        let masked = mask(src);
        assert_eq!(masked.len(), src.len());
        assert!(!masked.contains("Button"));
        assert!(!masked.contains("Card"));
        assert!(!masked.contains("Alert"));
        assert!(!masked.contains("Tooltip"));
        assert!(masked.contains("<Badge />"));
        assert_eq!(masked.matches('\n').count(), 2);
    }

    #[test]
    fn apostrophe_in_text_is_not_a_string() {
        let masked = mask("<p>Don't stop</p>\n<Button />");
        assert!(masked.contains("<Button />"));
        assert!(masked.contains("Don't"));
    }

    #[test]
    fn apostrophes_on_one_line_do_not_hide_tags() {
        let src = "<p>Don't</p><Button/><p>it's</p>";
        let masked = mask(src);
        assert_eq!(masked, src);
        assert_eq!(opening_tags(&masked, "Button").len(), 1);
        assert_eq!(element_ranges(&masked, "Button").len(), 1);
        assert_eq!(mask("f('a', 'b')"), "f(' ', ' ')");
    }

    #[test]
    fn jsx_text_positions() {
        let src = "const f = () => Check(1)\nreturn <p>Check (optional)</p>\nconst g = a > b ? Check(2) : 0;";
        let masked = mask(src);
        let b = masked.as_bytes();
        let hits: Vec<bool> = identifier_positions(&masked, "Check")
            .into_iter()
            .map(|pos| in_jsx_text(b, pos))
            .collect();
        assert_eq!(hits, vec![false, true, false]);
    }

    #[test]
    fn urls_are_not_comments() {
        let masked = mask("<a href=x>https://example.com <Button /></a>");
        assert!(masked.contains("<Button />"));
    }

    #[test]
    fn parses_import_shapes() {
        let src = r#""use client"
import React, { useState } from "react";
import * as THREE from 'three'
import {
  Card,
  CardTitle as Title,
  type CardProps,
} from "@/components/ui/card"
import type { Metadata } from "next"
import "./globals.css"
const lazy = import("./lazy")
// import { Ghost } from "ghost"
"#;
        let imports = parse_imports(src);
        assert_eq!(imports.len(), 5);

        assert_eq!(imports[0].default.as_deref(), Some("React"));
        assert_eq!(imports[0].named, vec![ImportSpecifier::new("useState")]);
        assert!(imports[0].semicolon);

        assert_eq!(imports[1].namespace.as_deref(), Some("THREE"));
        assert_eq!(imports[1].quote, '\'');

        assert_eq!(imports[2].locals(), vec!["Card", "Title", "CardProps"]);
        assert!(imports[2].named[2].type_only);

        assert!(imports[3].type_only);
        assert!(imports[4].is_side_effect());
        assert_eq!(&src[imports[4].start..imports[4].end], "import \"./globals.css\"");
    }

    #[test]
    fn renders_statements() {
        let src = "import Chart, { Tooltip as RechartsTooltip, Line } from 'recharts';";
        let stmt = &parse_imports(src)[0];
        assert_eq!(stmt.render(), src);
        assert_eq!(
            ImportStmt::named_from("lucide-react", &["Check", "X"]).render(),
            "import { Check, X } from \"lucide-react\""
        );
    }

    #[test]
    fn declared_names_and_braces() {
        let src = "function Foo() { if (x) { return '}' } }\nconst Bar = 1\ninterface Props {}";
        let masked = mask(src);
        let open = masked.find('{').expect("brace");
        let close = matching_brace(&masked, open).expect("match");
        assert_eq!(&src[close..close + 1], "}");
        assert_eq!(src[..close + 1].matches('{').count(), 2);
        let names = declared_names(&masked);
        assert!(names.contains("Foo"));
        assert!(names.contains("Bar"));
        assert!(names.contains("Props"));
    }

    #[test]
    fn element_ranges_handle_nesting_and_arrows() {
        let src = "<LineChart data={d}><XAxis tickFormatter={(v) => v} /><LineChart><Tooltip /></LineChart><Tooltip /></LineChart><Tooltip />";
        let masked = mask(src);
        let ranges = element_ranges(&masked, "LineChart");
        assert_eq!(ranges.len(), 2);
        let (start, end) = ranges[0];
        assert_eq!(start, 0);
        assert_eq!(&src[end - 12..end], "</LineChart>");
        assert!(src[end..].starts_with("<Tooltip />"));

        let self_closing = element_ranges("<BarChart data={x} />", "BarChart");
        assert_eq!(self_closing, vec![(0, 21)]);
    }

    #[test]
    fn identifier_positions_respect_boundaries() {
        let text = "Tooltip TooltipContent UITooltip <Tooltip";
        assert_eq!(identifier_positions(text, "Tooltip"), vec![0, 34]);
    }
}
