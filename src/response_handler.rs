use crate::request_builder::Action;
use regex::Regex;
use std::sync::LazyLock;

/// Prefix of the inline marker written into the document when an action fails
pub const ERROR_MARKER: &str = ":error: ";

static REASONING_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("reasoning pattern is valid"));

/// Removes every `<think>...</think>` span, across newlines, shortest match first.
pub fn strip_reasoning(text: &str) -> String {
    REASONING_BLOCK.replace_all(text, "").into_owned()
}

/// Text that replaces the selection once a completion has arrived
pub fn apply_response(action: &Action, original: &str, response: &str) -> String {
    match action {
        Action::Extend => format!("{}{}", original, response),
        Action::Edit { .. } => strip_reasoning(response),
    }
}

/// Original text with the failure appended, so nothing the user wrote is lost
pub fn error_text(original: &str, message: &str) -> String {
    format!("{}{}{}", original, ERROR_MARKER, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit() -> Action {
        Action::Edit {
            instructions: "tighten".to_string(),
        }
    }

    #[test]
    fn test_extend_appends_verbatim() {
        assert_eq!(apply_response(&Action::Extend, "Hello", " world"), "Hello world");
        assert_eq!(
            apply_response(&Action::Extend, "a", "<think>kept</think>"),
            "a<think>kept</think>"
        );
    }

    #[test]
    fn test_edit_replaces_and_strips_reasoning() {
        assert_eq!(
            apply_response(&edit(), "old", "<think>reasoning</think>Final answer"),
            "Final answer"
        );
    }

    #[test]
    fn test_strip_reasoning_spans_lines_and_repeats() {
        let raw = "<think>\nstep one\nstep two\n</think>First. <think>again</think>Second.";
        assert_eq!(strip_reasoning(raw), "First. Second.");
    }

    #[test]
    fn test_strip_reasoning_is_non_greedy() {
        let raw = "<think>a</think>keep<think>b</think>";
        assert_eq!(strip_reasoning(raw), "keep");
    }

    #[test]
    fn test_unclosed_block_is_left_alone() {
        assert_eq!(strip_reasoning("<think>never closed"), "<think>never closed");
    }

    #[test]
    fn test_error_text_keeps_original_prefix() {
        assert_eq!(
            error_text("My draft", "connection refused"),
            "My draft:error: connection refused"
        );
    }
}
