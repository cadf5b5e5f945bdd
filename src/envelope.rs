//! Strips the JSON wrapper and the reasoning preamble from a raw generator
//! response. Absence of either is the normal case and never an error.

use serde_json::Value;
use tracing::debug;

const THINKING_OPEN: &str = "<Thinking>";
const THINKING_CLOSE: &str = "</Thinking>";

/// Phrases that usually start the real content when the reasoning block is unterminated.
const CONTENT_START_MARKERS: &[&str] = &[
    "Here's the implementation:",
    "I'll create",
    "```",
    "Let me create",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    Plain,
    /// `{"content": "..."}`
    ContentField,
    /// `{"choices": [{"message": {"content": "..."}}]}`
    ChatCompletion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unwrapped {
    pub text: String,
    pub kind: EnvelopeKind,
    pub stripped_reasoning: bool,
}

pub fn unwrap_envelope(raw: &str) -> Unwrapped {
    let (text, kind) = match serde_json::from_str::<Value>(raw) {
        Ok(value) => match content_field(&value) {
            Some((content, kind)) => {
                debug!(?kind, "unwrapped JSON envelope");
                (content.to_string(), kind)
            }
            None => (raw.to_string(), EnvelopeKind::Plain),
        },
        Err(_) => (raw.to_string(), EnvelopeKind::Plain),
    };

    match strip_reasoning(&text) {
        Some(stripped) => Unwrapped {
            text: stripped,
            kind,
            stripped_reasoning: true,
        },
        None => Unwrapped {
            text,
            kind,
            stripped_reasoning: false,
        },
    }
}

fn content_field(value: &Value) -> Option<(&str, EnvelopeKind)> {
    if let Some(content) = value.get("content").and_then(Value::as_str) {
        return Some((content, EnvelopeKind::ContentField));
    }
    value
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(|content| (content, EnvelopeKind::ChatCompletion))
}

/// Returns the text after the reasoning section, or `None` if there is none.
fn strip_reasoning(text: &str) -> Option<String> {
    let body = text.trim_start();
    if !body.starts_with(THINKING_OPEN) {
        return None;
    }

    if let Some(close) = body.find(THINKING_CLOSE) {
        return Some(body[close + THINKING_CLOSE.len()..].trim().to_string());
    }

    // Unterminated: the first marker in list order decides where content begins.
    for marker in CONTENT_START_MARKERS {
        if let Some(pos) = body.find(marker) {
            debug!(marker, "reasoning block unterminated; resuming at marker");
            return Some(body[pos..].trim().to_string());
        }
    }

    debug!("reasoning block unterminated and no content marker found");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_markdown_is_unchanged() {
        let raw = "Some text\n```tsx\nexport default function A() {}\n```";
        let out = unwrap_envelope(raw);
        assert_eq!(out.text, raw);
        assert_eq!(out.kind, EnvelopeKind::Plain);
        assert!(!out.stripped_reasoning);
    }

    #[test]
    fn unwraps_content_field_and_thinking() {
        let raw = serde_json::json!({
            "content": "<Thinking>plan the page</Thinking>\n\n```tsx file=\"app/page.tsx\"\nx\n```"
        })
        .to_string();
        let out = unwrap_envelope(&raw);
        assert_eq!(out.kind, EnvelopeKind::ContentField);
        assert!(out.stripped_reasoning);
        assert!(out.text.starts_with("```tsx"));
    }

    #[test]
    fn unwraps_chat_completion_shape() {
        let raw = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "hello"}}]
        })
        .to_string();
        let out = unwrap_envelope(&raw);
        assert_eq!(out.kind, EnvelopeKind::ChatCompletion);
        assert_eq!(out.text, "hello");
    }

    #[test]
    fn unterminated_thinking_uses_marker_list_order() {
        // "I'll create" appears after the fence, but it is earlier in the marker list.
        let raw = "<Thinking>hmm\n```tsx\nconst a = 1\n```\nI'll create more";
        let out = unwrap_envelope(raw);
        assert_eq!(out.text, "I'll create more");

        let raw = "<Thinking>hmm\n```tsx\nconst a = 1\n```";
        let out = unwrap_envelope(raw);
        assert_eq!(out.text, "```tsx\nconst a = 1\n```");

        let raw = "<Thinking>hmm\nLet me create ```x```\nI'll create the page";
        let out = unwrap_envelope(raw);
        assert_eq!(out.text, "I'll create the page");
    }

    #[test]
    fn unterminated_thinking_without_markers_is_left_alone() {
        let raw = "<Thinking>only reasoning, nothing else";
        let out = unwrap_envelope(raw);
        assert_eq!(out.text, raw);
        assert!(!out.stripped_reasoning);
    }

    #[test]
    fn json_without_content_field_is_plain() {
        let raw = r#"{"files": []}"#;
        let out = unwrap_envelope(raw);
        assert_eq!(out.kind, EnvelopeKind::Plain);
        assert_eq!(out.text, raw);
    }
}
