//! Deterministic path inference for blocks that arrive without a file name.

use crate::files::{Language, SourcePattern};
use regex::Regex;
use std::sync::OnceLock;

/// Derives a project path for `content`. Pure: the same inputs give the same path.
///
/// Order:
/// 1. `export default function Name` -> `<dir>/<kebab-name>.<ext>`
/// 2. any other named function (declaration or arrow binding) -> same shape
/// 3. a template keyed by the source pattern, suffixed with `index`
pub fn infer_path(content: &str, pattern: SourcePattern, language: Language, index: usize) -> String {
    match pattern {
        SourcePattern::CssFile => return style_path(content, index),
        SourcePattern::TypeScriptFile if defines_cn_helper(content) => {
            return "lib/utils.ts".to_string();
        }
        _ => {}
    }

    let (dir, ext) = location_for(pattern, language);

    if let Some(name) = default_export_name(content).or_else(|| first_function_name(content)) {
        return format!("{}/{}.{}", dir, camel_to_kebab(&name), ext);
    }

    match pattern {
        SourcePattern::TypeScriptFile => format!("lib/helpers-{}.ts", index),
        SourcePattern::TsxComponent => format!("components/component-{}.tsx", index),
        _ if language.is_script() || language == Language::Text => {
            format!("components/component-{}.{}", index, ext)
        }
        _ => format!("generated/block-{}.{}", index, language.extension()),
    }
}

fn location_for(pattern: SourcePattern, language: Language) -> (&'static str, &'static str) {
    match pattern {
        SourcePattern::TypeScriptFile => ("lib", "ts"),
        SourcePattern::TsxComponent => ("components", "tsx"),
        _ => match language {
            Language::TypeScript => ("lib", "ts"),
            Language::JavaScript => ("lib", "js"),
            Language::Jsx => ("components", "jsx"),
            _ => ("components", "tsx"),
        },
    }
}

fn style_path(content: &str, index: usize) -> String {
    if content.contains("@tailwind") || content.contains("@import \"tailwindcss\"") {
        "app/globals.css".to_string()
    } else {
        format!("styles/style-{}.css", index)
    }
}

fn defines_cn_helper(content: &str) -> bool {
    cn_re().is_match(content)
}

fn default_export_name(content: &str) -> Option<String> {
    default_fn_re()
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn first_function_name(content: &str) -> Option<String> {
    let decl = function_re().captures(content).and_then(|c| c.get(1));
    let arrow = arrow_re().captures(content).and_then(|c| c.get(1));
    match (decl, arrow) {
        (Some(d), Some(a)) => Some(if d.start() <= a.start() { d } else { a }),
        (d, a) => d.or(a),
    }
    .map(|m| m.as_str().to_string())
}

/// `SummaryCard` -> `summary-card`, `HTMLParser` -> `html-parser`, `use_data` -> `use-data`.
pub fn camel_to_kebab(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            continue;
        }
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary && !out.ends_with('-') && !out.is_empty() {
                out.push('-');
            }
        }
        out.extend(c.to_lowercase());
    }
    out.trim_matches('-').to_string()
}

fn default_fn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"export\s+default\s+(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)")
            .expect("valid regex")
    })
}

fn function_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bfunction\s*\*?\s*([A-Za-z_$][\w$]*)\s*[<(]").expect("valid regex")
    })
}

fn arrow_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*(?:async\s*)?(?:\([^)]*\)|[A-Za-z_$][\w$]*)\s*(?::[^=]+)?=>",
        )
        .expect("valid regex")
    })
}

fn cn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bfunction\s+cn\s*\(|\b(?:const|let)\s+cn\s*=").expect("valid regex")
    })
}
