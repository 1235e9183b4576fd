use once_cell::sync::Lazy;
use regex::Regex;

const FENCE: &str = "```";

// Opening fence, optional language tag, then the shortest body up to the next
// fence. A tag must be followed by whitespace, otherwise it is the body.
static FENCED_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:[\w+-]+\s)?\s*(.*?)\s*```").expect("valid fenced block regex")
});

/// Body of the first fenced code block in `text`, trimmed. `None` when the
/// text holds no complete block.
pub fn extract_fenced_block(text: &str) -> Option<&str> {
    if !text.contains(FENCE) {
        return None;
    }

    FENCED_BLOCK_RE
        .captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim())
}

/// Final completion text: the first fenced block when structured output was
/// requested and one is present, the raw text otherwise.
pub fn finalize_text(raw: &str, wants_structured_output: bool) -> String {
    if wants_structured_output {
        if let Some(body) = extract_fenced_block(raw) {
            tracing::debug!(
                raw_chars = raw.len(),
                extracted_chars = body.len(),
                "Stripped markdown fences from structured output"
            );
            return body.to_string();
        }
    }
    raw.to_string()
}
