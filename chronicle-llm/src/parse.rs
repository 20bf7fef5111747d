//! Lenient decoding of model output into payloads.
//!
//! Models wrap JSON in code fences, prepend chatter, or return prose
//! outright. None of that is an error: the worst case is an empty payload.

use chronicle_core::DetectionPayload;
use tracing::warn;

/// Pull the JSON object out of a response that may carry markdown fences
/// or surrounding text. Returns `None` when no object is present.
#[must_use]
pub fn extract_json(response: &str) -> Option<&str> {
    let trimmed = response.trim();

    if let Some(body) = fenced(trimmed) {
        return Some(body);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (start < end).then(|| &trimmed[start..=end])
}

/// Contents of the first fenced block, language tag stripped.
fn fenced(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    let close = after.find("```")?;
    let block = &after[..close];
    let body = match block.find('\n') {
        Some(newline) if !block[..newline].trim_start().starts_with('{') => &block[newline + 1..],
        _ => block,
    };
    let body = body.trim();
    body.starts_with('{').then_some(body)
}

/// Decode model output into a payload. Anything unusable yields an empty
/// payload; dropped parts are logged.
#[must_use]
pub fn parse_payload(response: &str, call: &str) -> DetectionPayload {
    let Some(json) = extract_json(response) else {
        warn!(call, "AI response contained no JSON object; using empty payload");
        return DetectionPayload::default();
    };

    let value: serde_json::Value = match serde_json::from_str(json) {
        Ok(value) => value,
        Err(err) => {
            warn!(call, error = %err, "AI response was not valid JSON; using empty payload");
            return DetectionPayload::default();
        }
    };

    let (payload, problems) = DetectionPayload::from_value_lenient(&value);
    for problem in &problems {
        warn!(call, problem = %problem, "dropped part of AI payload");
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_json_fence() {
        let response = "Here you go:\n```json\n{\"relationships\": []}\n```\nEnjoy.";
        assert_eq!(extract_json(response), Some("{\"relationships\": []}"));
    }

    #[test]
    fn extracts_from_bare_fence_and_raw_text() {
        assert_eq!(extract_json("```\n{\"a\": 1}\n```"), Some("{\"a\": 1}"));
        assert_eq!(extract_json("Sure! {\"a\": {\"b\": 2}} Hope that helps"), Some("{\"a\": {\"b\": 2}}"));
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("} backwards {"), None);
    }

    #[test]
    fn prose_becomes_empty_payload() {
        assert!(parse_payload("The innkeeper smiles.", "detect").is_empty());
        assert!(parse_payload("{\"entities\": {\"npcs\": [}", "detect").is_empty());
    }

    #[test]
    fn well_formed_payload_is_decoded() {
        let payload = parse_payload(
            r#"```json
{"entities": {"npcs": [{"name": "Wren", "occupation": "miller"}]},
 "worldUpdates": {"tension": 5}}
```"#,
            "detect",
        );
        assert_eq!(payload.entities.npcs.len(), 1);
        assert!(!payload.world_updates.is_empty());
    }
}
