use lazy_static::lazy_static;
use regex::Regex;

/// Outcome of scanning an assistant reply for a phase's sentinel marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCheck {
    pub completed: bool,
    /// Reply with every marker occurrence removed; safe to show the user.
    pub cleaned_text: String,
}

/// Detects `marker` anywhere in `text` and strips it, together with any
/// quotes, asterisks or backticks the model wrapped it in.
pub fn detect_completion(text: &str, marker: &str) -> CompletionCheck {
    lazy_static! {
        static ref SPACE_RUN: Regex = Regex::new(r"[ \t]{2,}").unwrap();
        static ref SPACE_BEFORE_PUNCT: Regex = Regex::new(r"[ \t]+([.,!?;:])").unwrap();
        static ref TRAILING_SPACE: Regex = Regex::new(r"(?m)[ \t]+$").unwrap();
    }

    if marker.is_empty() || !text.contains(marker) {
        return CompletionCheck { completed: false, cleaned_text: text.trim().to_string() };
    }

    let stripped = match Regex::new(&format!(r#"["'*`]*{}["'*`]*"#, regex::escape(marker))) {
        Ok(wrapped) => wrapped.replace_all(text, "").into_owned(),
        Err(_) => text.replace(marker, ""),
    };
    let collapsed = SPACE_RUN.replace_all(&stripped, " ");
    let tidied = SPACE_BEFORE_PUNCT.replace_all(&collapsed, "$1");
    let tidied = TRAILING_SPACE.replace_all(&tidied, "");

    CompletionCheck { completed: true, cleaned_text: tidied.trim().to_string() }
}
