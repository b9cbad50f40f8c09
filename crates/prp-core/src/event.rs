//! Agent output events.
//!
//! Events are kept as raw [`serde_json::Value`]s so that anything the agent
//! emits can be forwarded unchanged. Classification only looks at `type` and
//! `subtype`.

use serde_json::{Number, Value};

use crate::config::PREVIEW_CHARS;

/// One non-blank line of agent stdout after parsing.
#[derive(Debug)]
pub enum ParsedLine {
    /// A complete JSON value.
    Event(Value),
    /// Not valid JSON; carries the raw line.
    Malformed {
        raw: String,
        error: serde_json::Error,
    },
}

/// Parse one line of stream output. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<ParsedLine> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    Some(match serde_json::from_str::<Value>(line) {
        Ok(value) => ParsedLine::Event(value),
        Err(error) => ParsedLine::Malformed {
            raw: line.to_string(),
            error,
        },
    })
}

/// Known event shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// `type = "system"`, `subtype = "init"`.
    SessionInit { session_id: Option<String> },
    /// `type = "assistant"`.
    Assistant { preview: String },
    /// `type = "result"`.
    Result(ResultSummary),
    /// Anything else. Forwarded without a diagnostic.
    Other,
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Classify a parsed event.
pub fn classify(value: &Value) -> EventKind {
    match (str_field(value, "type"), str_field(value, "subtype")) {
        (Some("system"), Some("init")) => EventKind::SessionInit {
            session_id: str_field(value, "session_id").map(str::to_string),
        },
        (Some("assistant"), _) => EventKind::Assistant {
            preview: assistant_preview(value),
        },
        (Some("result"), _) => EventKind::Result(ResultSummary::from_event(value)),
        _ => EventKind::Other,
    }
}

/// First [`PREVIEW_CHARS`] characters of an assistant message's content.
///
/// Content may be a plain string or a list of content blocks; text blocks are
/// joined, anything else is previewed as compact JSON.
pub fn assistant_preview(value: &Value) -> String {
    let content = value.get("message").and_then(|m| m.get("content"));

    let text = match content {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(blocks)) => {
            let texts: Vec<&str> = blocks
                .iter()
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect();
            if texts.is_empty() {
                Value::Array(blocks.clone()).to_string()
            } else {
                texts.join("\n")
            }
        }
        Some(other) => other.to_string(),
    };

    text.chars().take(PREVIEW_CHARS).collect()
}

fn number_field(value: &Value, key: &str) -> Number {
    match value.get(key) {
        Some(Value::Number(n)) => n.clone(),
        _ => Number::from(0u64),
    }
}

/// Text shown for a `result` field. Empty or falsy values are skipped;
/// anything structured is shown as compact JSON.
fn result_text(result: &Value) -> Option<String> {
    match result {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) if items.is_empty() => None,
        Value::Object(map) if map.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

/// Fields reported from a `result` event.
///
/// Counters keep the number exactly as the agent wrote it, so `4200.5` is
/// reported as `4200.5` rather than truncated.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    pub subtype: Option<String>,
    pub is_error: bool,
    pub cost_usd: f64,
    pub duration_ms: Number,
    pub num_turns: Number,
    pub session_id: Option<String>,
    pub result: Option<String>,
}

impl ResultSummary {
    /// Extract summary fields. Missing or mistyped fields fall back to zero
    /// or `None`.
    pub fn from_event(value: &Value) -> Self {
        let cost_usd = value
            .get("cost_usd")
            .and_then(Value::as_f64)
            .or_else(|| value.get("total_cost_usd").and_then(Value::as_f64))
            .unwrap_or(0.0);

        Self {
            subtype: str_field(value, "subtype").map(str::to_string),
            is_error: value
                .get("is_error")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            cost_usd,
            duration_ms: number_field(value, "duration_ms"),
            num_turns: number_field(value, "num_turns"),
            session_id: str_field(value, "session_id").map(str::to_string),
            result: value.get("result").and_then(result_text),
        }
    }

    /// Stream verdict: success iff `subtype == "success"`.
    pub fn stream_success(&self) -> bool {
        self.subtype.as_deref() == Some("success")
    }

    /// Single-document verdict: success iff not `is_error`.
    pub fn document_success(&self) -> bool {
        !self.is_error
    }

    /// Cost formatted as dollars to four decimal places.
    pub fn cost_display(&self) -> String {
        format!("${:.4}", self.cost_usd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_line_skips_blank() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   \t").is_none());
    }

    #[test]
    fn test_parse_line_trims_whitespace() {
        match parse_line("  {\"type\":\"x\"}\r") {
            Some(ParsedLine::Event(v)) => assert_eq!(v["type"], "x"),
            other => panic!("expected event, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_line_malformed_keeps_raw() {
        match parse_line("Loading config...") {
            Some(ParsedLine::Malformed { raw, .. }) => assert_eq!(raw, "Loading config..."),
            other => panic!("expected malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_session_init() {
        let v = json!({"type": "system", "subtype": "init", "session_id": "abc123"});
        assert_eq!(
            classify(&v),
            EventKind::SessionInit {
                session_id: Some("abc123".to_string())
            }
        );
    }

    #[test]
    fn test_classify_system_without_init_is_other() {
        let v = json!({"type": "system", "subtype": "compact"});
        assert_eq!(classify(&v), EventKind::Other);
    }

    #[test]
    fn test_classify_untyped_is_other() {
        assert_eq!(classify(&json!({"hello": "world"})), EventKind::Other);
        assert_eq!(classify(&json!([1, 2, 3])), EventKind::Other);
        assert_eq!(classify(&json!("text")), EventKind::Other);
    }

    #[test]
    fn test_assistant_preview_truncates_string() {
        let long = "a".repeat(250);
        let v = json!({"type": "assistant", "message": {"content": long}});
        assert_eq!(assistant_preview(&v).chars().count(), PREVIEW_CHARS);
    }

    #[test]
    fn test_assistant_preview_counts_chars_not_bytes() {
        let long = "é".repeat(150);
        let v = json!({"type": "assistant", "message": {"content": long}});
        assert_eq!(assistant_preview(&v), "é".repeat(PREVIEW_CHARS));
    }

    #[test]
    fn test_assistant_preview_joins_text_blocks() {
        let v = json!({
            "type": "assistant",
            "message": {"content": [
                {"type": "text", "text": "Reading files"},
                {"type": "tool_use", "name": "Read", "input": {}}
            ]}
        });
        assert_eq!(assistant_preview(&v), "Reading files");
    }

    #[test]
    fn test_assistant_preview_missing_content() {
        let v = json!({"type": "assistant"});
        assert_eq!(assistant_preview(&v), "");
    }

    #[test]
    fn test_result_summary_fields() {
        let v = json!({
            "type": "result",
            "subtype": "success",
            "cost_usd": 0.0231,
            "duration_ms": 4200,
            "num_turns": 3,
            "result": "done"
        });
        let summary = ResultSummary::from_event(&v);
        assert!(summary.stream_success());
        assert_eq!(summary.cost_display(), "$0.0231");
        assert_eq!(summary.duration_ms.to_string(), "4200");
        assert_eq!(summary.num_turns.to_string(), "3");
        assert_eq!(summary.result.as_deref(), Some("done"));
    }

    #[test]
    fn test_result_summary_total_cost_fallback() {
        let v = json!({"type": "result", "total_cost_usd": 1.5});
        assert_eq!(ResultSummary::from_event(&v).cost_display(), "$1.5000");
    }

    #[test]
    fn test_result_summary_defaults() {
        let summary = ResultSummary::from_event(&json!({"type": "result", "subtype": "error_max_turns"}));
        assert!(!summary.stream_success());
        assert!(summary.document_success());
        assert_eq!(summary.cost_display(), "$0.0000");
        assert_eq!(summary.duration_ms.to_string(), "0");
        assert_eq!(summary.num_turns.to_string(), "0");
        assert!(summary.result.is_none());
    }

    #[test]
    fn test_result_summary_keeps_float_counters() {
        let v = json!({
            "type": "result",
            "subtype": "success",
            "cost_usd": 0.1,
            "duration_ms": 4200.5,
            "num_turns": 3.0
        });
        let summary = ResultSummary::from_event(&v);
        assert_eq!(summary.duration_ms.to_string(), "4200.5");
        assert_eq!(summary.num_turns.to_string(), "3.0");
    }

    #[test]
    fn test_result_summary_mistyped_counter_is_zero() {
        let v = json!({"type": "result", "duration_ms": "soon", "num_turns": null});
        let summary = ResultSummary::from_event(&v);
        assert_eq!(summary.duration_ms.to_string(), "0");
        assert_eq!(summary.num_turns.to_string(), "0");
    }

    #[test]
    fn test_result_summary_structured_result_as_json() {
        let v = json!({"type": "result", "result": {"text": "done"}});
        assert_eq!(
            ResultSummary::from_event(&v).result.as_deref(),
            Some(r#"{"text":"done"}"#)
        );

        let v = json!({"type": "result", "result": ["a", 1]});
        assert_eq!(
            ResultSummary::from_event(&v).result.as_deref(),
            Some(r#"["a",1]"#)
        );
    }

    #[test]
    fn test_result_summary_skips_falsy_result() {
        for result in [json!(""), json!(null), json!(false), json!({}), json!([]), json!(0)] {
            let v = json!({"type": "result", "result": result.clone()});
            assert!(ResultSummary::from_event(&v).result.is_none(), "{result}");
        }
    }
}
