use crate::api::CompletionBackend;
use crate::config::ConfigSource;
use crate::document::Document;
use crate::error::{LocalWriterError, Result};
use crate::request_builder::{Action, RequestBuilder};
use crate::response_handler::{apply_response, error_text};

/// Tally of one action over every selected range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobReport {
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Runs an action over a document's selection, one request per range.
///
/// Failures never escape: the affected range keeps its text with an
/// `:error:` marker appended and the remaining ranges are still processed.
pub struct SelectionJob<'a> {
    config: &'a dyn ConfigSource,
    backend: &'a dyn CompletionBackend,
}

impl<'a> SelectionJob<'a> {
    pub fn new(config: &'a dyn ConfigSource, backend: &'a dyn CompletionBackend) -> Self {
        Self { config, backend }
    }

    pub fn run(&self, document: &mut dyn Document, action: &Action) -> JobReport {
        let mut report = JobReport::default();

        for index in 0..document.selection_count() {
            let original = document.selection_text(index).to_string();

            // Nothing to continue from.
            if matches!(action, Action::Extend) && original.is_empty() {
                report.skipped += 1;
                continue;
            }

            match self.transform(action, &original) {
                Ok(text) => {
                    document.replace_selection(index, text);
                    report.completed += 1;
                }
                Err(e) => {
                    tracing::error!(action = action.name(), index = index, error = %e, "Action failed");
                    document.replace_selection(index, error_text(&original, &e.detail()));
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            action = action.name(),
            completed = report.completed,
            failed = report.failed,
            skipped = report.skipped,
            "Action finished"
        );
        report
    }

    /// New text for one range, or the single error that stopped it
    pub fn transform(&self, action: &Action, original: &str) -> Result<String> {
        let request = RequestBuilder::new(self.config, action, original)
            .build()
            .map_err(LocalWriterError::into_completion)?;
        let response = self
            .backend
            .complete(&request)
            .map_err(LocalWriterError::into_completion)?;
        let text = response.text().map_err(LocalWriterError::into_completion)?;

        Ok(apply_response(action, original, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CompletionRequest, CompletionResponse};
    use crate::document::{CellGrid, TextSelection};
    use serde_json::{json, Map, Value};
    use std::cell::RefCell;

    /// Replies with the same text every call, failing on inputs containing "boom"
    struct ScriptedBackend {
        reply: String,
        calls: RefCell<Vec<CompletionRequest>>,
    }

    impl ScriptedBackend {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl CompletionBackend for ScriptedBackend {
        fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
            self.calls.borrow_mut().push(request.clone());
            let last = request.messages.last().map(|m| m.content.as_str()).unwrap_or("");
            if last.contains("boom") {
                return Err(LocalWriterError::Api("connection refused".to_string()));
            }
            Ok(CompletionResponse::from_text(self.reply.clone()))
        }
    }

    fn config() -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("model".to_string(), json!("llama3"));
        map.insert("provider".to_string(), json!("ollama"));
        map
    }

    #[test]
    fn test_extend_appends_response() {
        let config = config();
        let backend = ScriptedBackend::new(" world");
        let mut doc = TextSelection::new("Hello");

        let report = SelectionJob::new(&config, &backend).run(&mut doc, &Action::Extend);

        assert_eq!(report.completed, 1);
        assert_eq!(doc.into_text(), "Hello world");
    }

    #[test]
    fn test_edit_replaces_and_strips_reasoning() {
        let config = config();
        let backend = ScriptedBackend::new("<think>\nplan\n</think>Final answer");
        let mut doc = TextSelection::new("draft answer");
        let action = Action::Edit {
            instructions: "polish".to_string(),
        };

        SelectionJob::new(&config, &backend).run(&mut doc, &action);

        assert_eq!(doc.into_text(), "Final answer");
        assert_eq!(backend.calls.borrow()[0].max_tokens, 12);
    }

    #[test]
    fn test_failure_is_written_inline() {
        let config = config();
        let backend = ScriptedBackend::new("unused");
        let mut doc = TextSelection::new("boom text");

        let report = SelectionJob::new(&config, &backend).run(&mut doc, &Action::Extend);

        assert_eq!(report.failed, 1);
        assert_eq!(
            doc.into_text(),
            "boom text:error: connection refused"
        );
    }

    #[test]
    fn test_missing_model_is_reported_without_dispatch() {
        let config = Map::new();
        let backend = ScriptedBackend::new("unused");
        let mut doc = TextSelection::new("Hello");

        SelectionJob::new(&config, &backend).run(&mut doc, &Action::Extend);

        assert!(backend.calls.borrow().is_empty());
        assert!(doc.into_text().starts_with("Hello:error: No model configured"));
    }

    #[test]
    fn test_empty_selection_is_not_extended() {
        let config = config();
        let backend = ScriptedBackend::new("more");
        let mut doc = TextSelection::new("");

        let report = SelectionJob::new(&config, &backend).run(&mut doc, &Action::Extend);

        assert_eq!(report.skipped, 1);
        assert!(backend.calls.borrow().is_empty());
        assert_eq!(doc.into_text(), "");
    }

    #[test]
    fn test_cells_are_processed_independently() {
        let config = config();
        let backend = ScriptedBackend::new("!");
        let mut grid = CellGrid::from_tsv("one\t\nboom\tfour\n");

        let report = SelectionJob::new(&config, &backend).run(&mut grid, &Action::Extend);

        assert_eq!(
            report,
            JobReport {
                completed: 2,
                failed: 1,
                skipped: 1
            }
        );
        assert_eq!(grid.cell(0, 0), Some("one!"));
        assert_eq!(grid.cell(0, 1), Some(""));
        assert!(grid.cell(1, 0).unwrap().starts_with("boom:error: "));
        assert_eq!(grid.cell(1, 1), Some("four!"));
        assert_eq!(backend.calls.borrow().len(), 3);
    }

    #[test]
    fn test_edit_visits_empty_cells() {
        let config = config();
        let backend = ScriptedBackend::new("X");
        let mut grid = CellGrid::from_tsv("a\t\n");
        let action = Action::Edit {
            instructions: "capitalize".to_string(),
        };

        let report = SelectionJob::new(&config, &backend).run(&mut grid, &action);

        assert_eq!(report.completed, 2);
        assert_eq!(grid.to_tsv(), "X\tX\n");
    }
}
