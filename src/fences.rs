//! Line-oriented scanner for fenced code blocks in markdown-ish text.
//!
//! A fence opens on a line starting with three backticks, optionally followed
//! by a language tag and `key="value"` attributes, and closes on the next line
//! consisting only of three or more backticks.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fence {
    /// Ordinal of the fence in the text.
    pub index: usize,
    /// Lowercased language tag, if any.
    pub tag: Option<String>,
    /// Value of a `file=`/`filename=`/`path=` attribute on the opening line.
    pub file_attr: Option<String>,
    /// Path named by a markdown heading on the closest preceding non-blank line.
    pub heading_path: Option<String>,
    pub body: String,
}

impl Fence {
    pub fn has_tag(&self, tags: &[&str]) -> bool {
        self.tag.as_deref().is_some_and(|t| tags.contains(&t))
    }
}

pub fn scan_fences(text: &str) -> Vec<Fence> {
    let lines: Vec<&str> = text.lines().collect();
    let mut fences = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(info) = opening_info(lines[i]) else {
            i += 1;
            continue;
        };

        let mut end = i + 1;
        while end < lines.len() && !is_closing(lines[end]) {
            end += 1;
        }
        if end >= lines.len() {
            // Unterminated fence: nothing after it can be trusted.
            break;
        }

        let (tag, file_attr) = parse_info(info);
        fences.push(Fence {
            index: fences.len(),
            tag,
            file_attr,
            heading_path: heading_before(&lines, i),
            body: lines[i + 1..end].join("\n"),
        });
        i = end + 1;
    }

    fences
}

fn opening_info(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let rest = trimmed.strip_prefix("```")?;
    if rest.starts_with('`') {
        return None;
    }
    Some(rest.trim())
}

fn is_closing(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 3 && trimmed.chars().all(|c| c == '`')
}

fn parse_info(info: &str) -> (Option<String>, Option<String>) {
    if info.is_empty() {
        return (None, None);
    }

    let file_attr = attr_re()
        .captures(info)
        .and_then(|c| c.get(2).or_else(|| c.get(3)).or_else(|| c.get(4)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty());

    let first = info.split_whitespace().next().unwrap_or("");
    let tag = if first.contains('=') {
        None
    } else {
        Some(first.trim_matches('{').trim_matches('}').to_ascii_lowercase())
            .filter(|t| !t.is_empty())
    };

    (tag, file_attr)
}

fn heading_before(lines: &[&str], fence_line: usize) -> Option<String> {
    let prev = lines[..fence_line].iter().rev().find(|l| !l.trim().is_empty())?;
    heading_re()
        .captures(prev.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|p| !p.is_empty())
}

fn attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\b(file|filename|path)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"']+))"#)
            .expect("valid regex")
    })
}

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#{1,6}\s*`([^`]+)`\s*$").expect("valid regex"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_tag_attribute_and_heading() {
        let text = "\
Intro
```tsx file=\"components/hero.tsx\"
export function Hero() {}
```

#### `lib/data.ts`

```ts
export const data = []
```
```
untagged
```";
        let fences = scan_fences(text);
        assert_eq!(fences.len(), 3);

        assert_eq!(fences[0].tag.as_deref(), Some("tsx"));
        assert_eq!(fences[0].file_attr.as_deref(), Some("components/hero.tsx"));
        assert_eq!(fences[0].body, "export function Hero() {}");

        assert_eq!(fences[1].heading_path.as_deref(), Some("lib/data.ts"));
        assert_eq!(fences[1].tag.as_deref(), Some("ts"));

        assert_eq!(fences[2].tag, None);
        assert_eq!(fences[2].body, "untagged");
    }

    #[test]
    fn unterminated_fence_is_dropped() {
        let fences = scan_fences("```tsx\nconst a = 1\n");
        assert!(fences.is_empty());
    }

    #[test]
    fn bare_attribute_without_tag() {
        let fences = scan_fences("``` file=app/page.tsx\nx\n```");
        assert_eq!(fences[0].tag, None);
        assert_eq!(fences[0].file_attr.as_deref(), Some("app/page.tsx"));
    }

    #[test]
    fn longer_closing_fence_is_accepted() {
        let fences = scan_fences("```css\nbody {}\n````");
        assert_eq!(fences.len(), 1);
        assert_eq!(fences[0].body, "body {}");
    }
}
