use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use crate::error::AppError;

/// Removes a surrounding markdown code fence (```` ``` ```` or ```` ```json ````).
pub fn strip_code_fences(content: &str) -> &str {
    lazy_static! {
        static ref OPEN_FENCE: Regex = Regex::new(r"(?i)^```(?:json)?\s*").unwrap();
        static ref CLOSE_FENCE: Regex = Regex::new(r"\s*```\s*$").unwrap();
    }
    let trimmed = content.trim();
    let start = OPEN_FENCE.find(trimmed).map_or(0, |m| m.end());
    let rest = &trimmed[start..];
    let end = CLOSE_FENCE.find(rest).map_or(rest.len(), |m| m.start());
    rest[..end].trim()
}

/// Parses a model reply that was instructed to contain only JSON.
///
/// Falls back to the outermost `{...}` span when the model wrapped the
/// object in prose.
pub fn parse_json_reply(content: &str) -> Result<serde_json::Value, AppError> {
    let stripped = strip_code_fences(content);
    match serde_json::from_str(stripped) {
        Ok(v) => Ok(v),
        Err(first) => {
            let embedded = match (stripped.find('{'), stripped.rfind('}')) {
                (Some(s), Some(e)) if s < e => serde_json::from_str(&stripped[s..=e]).ok(),
                _ => None,
            };
            embedded.ok_or_else(|| {
                warn!(error = %first, chars = content.len(), "reply is not valid json");
                AppError::extraction(format!("Invalid JSON response from AI: {first}"))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(raw), "{\"a\": 1}");
    }

    #[test]
    fn strips_bare_fence_and_whitespace() {
        let raw = "  ```\n[1, 2]\n```  \n";
        assert_eq!(strip_code_fences(raw), "[1, 2]");
    }

    #[test]
    fn leaves_unfenced_text_alone() {
        assert_eq!(strip_code_fences(" {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn parses_object_wrapped_in_prose() {
        let v = parse_json_reply("Here you go: {\"monday\": \"Tacos\"} enjoy!").unwrap();
        assert_eq!(v["monday"], "Tacos");
    }

    #[test]
    fn non_json_is_an_extraction_error() {
        let err = parse_json_reply("I could not do that.").unwrap_err();
        assert_eq!(err.code(), "extraction_error");
    }
}
