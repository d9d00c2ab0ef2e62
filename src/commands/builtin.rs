use crate::api::{CompletionBackend, HttpBackend};
use crate::cli::{ConnectionArgs, SelectionArgs};
use crate::config::{ConfigKey, ConfigStore, Settings};
use crate::document::{CellGrid, TextSelection};
use crate::error::{LocalWriterError, Result};
use crate::error_ext::ResultExt;
use crate::input::{mask_secret, TerminalInput, UserInput};
use crate::job::{JobReport, SelectionJob};
use crate::providers::{capabilities_for, BuiltinProviders, ProviderCapability, ProviderRegistry};
use crate::request_builder::Action;
use crate::settings::{apply_settings, test_connection, SettingsOutcome};
use crate::ui::UI;
use colored::Colorize;
use serde_json::Value;
use std::fs;
use std::io::{self, Read, Write};

pub fn extend_command(store: &ConfigStore, selection: &SelectionArgs) -> Result<()> {
    run_action(store, selection, Action::Extend)
}

pub fn edit_command(
    store: &ConfigStore,
    selection: &SelectionArgs,
    instructions: Option<String>,
) -> Result<()> {
    let instructions = match instructions {
        Some(instructions) => instructions,
        None => {
            // Stdin already carries the selection, so there is nobody to ask.
            if selection.input.is_none() {
                return Err(LocalWriterError::Config(
                    "Pass --instructions when the selection is read from stdin".to_string(),
                ));
            }
            ask_instructions(&mut TerminalInput::stdio())
        }
    };
    run_action(store, selection, Action::Edit { instructions })
}

/// Prompts once; a cancelled prompt yields empty instructions and the edit still runs
fn ask_instructions(input: &mut dyn UserInput) -> String {
    input.prompt_line("Edit instructions:")
}

fn run_action(store: &ConfigStore, selection: &SelectionArgs, action: Action) -> Result<()> {
    let text = read_selection(selection)?;
    let backend = HttpBackend::new()?;

    let (output, report) = process(store, &backend, &text, selection.sheet, &action);

    write_result(selection, &output)?;
    UI::print_report(action.name(), &report);
    Ok(())
}

fn process(
    store: &ConfigStore,
    backend: &dyn CompletionBackend,
    text: &str,
    sheet: bool,
    action: &Action,
) -> (String, JobReport) {
    let config = store.snapshot();
    let job = SelectionJob::new(&config, backend);
    if sheet {
        let mut grid = CellGrid::from_tsv(text);
        let report = job.run(&mut grid, action);
        (grid.to_tsv(), report)
    } else {
        let mut document = TextSelection::new(text);
        let report = job.run(&mut document, action);
        (document.into_text(), report)
    }
}

fn read_selection(selection: &SelectionArgs) -> Result<String> {
    match &selection.input {
        Some(path) => fs::read_to_string(path)
            .path_context("read selection from", path),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read selection from stdin")?;
            Ok(text)
        }
    }
}

fn write_result(selection: &SelectionArgs, text: &str) -> Result<()> {
    match &selection.input {
        Some(path) if selection.in_place => fs::write(path, text)
            .path_context("write result to", path),
        _ => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|_| stdout.flush())
                .context("Failed to write result")
        }
    }
}

pub fn settings_command(store: &ConfigStore) -> Result<()> {
    let backend = HttpBackend::new()?;
    let mut input = TerminalInput::stdio();

    match review_settings(store, &mut input, &backend) {
        Some(outcome) => {
            report_outcome(store, &outcome);
            Ok(())
        }
        None => {
            UI::print_info("Settings unchanged");
            Ok(())
        }
    }
}

/// Runs the form, optionally tests the typed values, then saves them.
/// `None` when the form was cancelled.
fn review_settings(
    store: &ConfigStore,
    input: &mut dyn UserInput,
    backend: &dyn CompletionBackend,
) -> Option<SettingsOutcome> {
    let current = Settings::load(&store.snapshot());
    let form = input.settings_form(&current, &BuiltinProviders)?;

    let answer = input.prompt_line("Test connection before saving? [y/N]");
    if answer.trim().eq_ignore_ascii_case("y") {
        let result = test_connection(backend, &form);
        UI::print_field("Connection", &result);
    }

    Some(apply_settings(store, &form))
}

fn report_outcome(store: &ConfigStore, outcome: &SettingsOutcome) {
    for key in &outcome.skipped {
        UI::print_warning(&format!("{} was not saved: value not accepted", key));
    }
    if outcome.failed.is_empty() {
        UI::print_success(&format!("Settings saved to {}", store.path().display()));
    } else {
        let failed = outcome
            .failed
            .iter()
            .map(ConfigKey::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        UI::print_warning(&format!("Could not save: {}", failed));
    }
}

pub fn show_settings_command(store: &ConfigStore) -> Result<()> {
    let saved = store.snapshot();
    UI::print_field("File", &store.path().display().to_string());

    for key in ConfigKey::ALL {
        let shown = match saved.get(key.as_str()) {
            None => "(unset)".dimmed().to_string(),
            Some(Value::String(text)) if key == ConfigKey::ApiKey => mask_secret(text),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        };
        UI::print_field(key.as_str(), &shown);
    }
    Ok(())
}

pub fn test_connection_command(args: ConnectionArgs) -> Result<()> {
    let backend = HttpBackend::new()?;
    let result = test_connection(&backend, &args.into_form());
    println!("{}", result);
    Ok(())
}

pub fn provider_command(name: &str) -> Result<()> {
    let capability = capabilities_for(&BuiltinProviders, name, ProviderCapability::default());

    match BuiltinProviders.lookup(name) {
        Ok(info) => {
            UI::print_field("Provider", info.name);
            UI::print_field(
                "Default endpoint",
                info.default_api_base.unwrap_or("(none, set one in settings)"),
            );
        }
        Err(e) => UI::print_warning(&format!("{}; requests are sent to an OpenAI-compatible endpoint", e)),
    }

    UI::print_field("API key", requirement(capability.api_key_hint().highlighted));
    UI::print_field("Endpoint", requirement(capability.endpoint_hint().highlighted));
    Ok(())
}

fn requirement(required: bool) -> &'static str {
    if required {
        "required"
    } else {
        "optional"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CompletionRequest, CompletionResponse};
    use crate::settings::SettingsForm;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use tempfile::tempdir;

    struct EchoBackend {
        calls: RefCell<usize>,
    }

    impl CompletionBackend for EchoBackend {
        fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
            *self.calls.borrow_mut() += 1;
            Ok(CompletionResponse::from_text(format!("<{}>", request.max_tokens)))
        }
    }

    /// Answers prompts from a queue and submits a fixed form
    struct ScriptedInput {
        lines: Vec<String>,
        form: Option<SettingsForm>,
    }

    impl UserInput for ScriptedInput {
        fn prompt_line(&mut self, _message: &str) -> String {
            if self.lines.is_empty() {
                String::new()
            } else {
                self.lines.remove(0)
            }
        }

        fn settings_form(
            &mut self,
            _current: &Settings,
            _registry: &dyn ProviderRegistry,
        ) -> Option<SettingsForm> {
            self.form.clone()
        }
    }

    fn store_with_model(dir: &tempfile::TempDir) -> ConfigStore {
        let store = ConfigStore::new(dir.path().join("localwriter.json"));
        store.set("model", "llama3").unwrap();
        store
    }

    fn selection(input: Option<PathBuf>, in_place: bool) -> SelectionArgs {
        SelectionArgs {
            input,
            sheet: false,
            in_place,
        }
    }

    #[test]
    fn test_process_text_selection() {
        let dir = tempdir().unwrap();
        let store = store_with_model(&dir);
        let backend = EchoBackend {
            calls: RefCell::new(0),
        };

        let (output, report) = process(&store, &backend, "Once upon", false, &Action::Extend);

        assert_eq!(output, "Once upon<70>");
        assert_eq!(report.completed, 1);
    }

    #[test]
    fn test_process_sheet_one_request_per_filled_cell() {
        let dir = tempdir().unwrap();
        let store = store_with_model(&dir);
        let backend = EchoBackend {
            calls: RefCell::new(0),
        };

        let (output, report) = process(&store, &backend, "a\t\nb\tc\n", true, &Action::Extend);

        assert_eq!(output, "a<70>\t\nb<70>\tc<70>\n");
        assert_eq!(*backend.calls.borrow(), 3);
        assert_eq!(report.skipped, 1);
    }

    /// Saves a different model while each request is in flight
    struct RewritingBackend<'a> {
        store: &'a ConfigStore,
        models: RefCell<Vec<String>>,
    }

    impl CompletionBackend for RewritingBackend<'_> {
        fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
            self.models.borrow_mut().push(request.model.clone());
            self.store.set("model", "changed-mid-run")?;
            Ok(CompletionResponse::from_text("!"))
        }
    }

    #[test]
    fn test_sheet_run_reads_settings_once() {
        let dir = tempdir().unwrap();
        let store = store_with_model(&dir);
        let backend = RewritingBackend {
            store: &store,
            models: RefCell::new(Vec::new()),
        };

        let (output, _) = process(&store, &backend, "a\tb\n", true, &Action::Extend);

        assert_eq!(output, "a!\tb!\n");
        assert_eq!(*backend.models.borrow(), vec!["llama3", "llama3"]);
        assert_eq!(
            Settings::load(&store.snapshot()).model,
            "changed-mid-run"
        );
    }

    #[test]
    fn test_sheet_multi_line_reply_stays_in_its_cell() {
        let dir = tempdir().unwrap();
        let store = store_with_model(&dir);
        let backend = LineBackend;

        let (output, report) = process(&store, &backend, "a\tb\nc\td\n", true, &Action::Extend);

        assert_eq!(report.completed, 4);
        assert_eq!(output.lines().count(), 2);
        assert_eq!(CellGrid::from_tsv(&output).to_tsv(), output);
        assert!(output.starts_with("a more\\nnext line\t"));
    }

    struct LineBackend;

    impl CompletionBackend for LineBackend {
        fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse> {
            Ok(CompletionResponse::from_text(" more\nnext line"))
        }
    }

    #[test]
    fn test_selection_file_round_trip_in_place() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("draft.txt");
        fs::write(&path, "draft").unwrap();
        let args = selection(Some(path.clone()), true);

        assert_eq!(read_selection(&args).unwrap(), "draft");
        write_result(&args, "final").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "final");
    }

    #[test]
    fn test_missing_input_file_has_context() {
        let dir = tempdir().unwrap();
        let args = selection(Some(dir.path().join("missing.txt")), false);

        let err = read_selection(&args).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read selection from"));
    }

    #[test]
    fn test_edit_from_stdin_needs_instructions() {
        let dir = tempdir().unwrap();
        let store = store_with_model(&dir);

        let err = edit_command(&store, &selection(None, false), None).unwrap_err();
        assert!(matches!(err, LocalWriterError::Config(_)));
    }

    #[test]
    fn test_cancelled_instructions_are_empty() {
        let mut input = ScriptedInput {
            lines: Vec::new(),
            form: None,
        };
        assert_eq!(ask_instructions(&mut input), "");
    }

    #[test]
    fn test_review_settings_tests_then_saves() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("localwriter.json"));
        let backend = EchoBackend {
            calls: RefCell::new(0),
        };
        let mut input = ScriptedInput {
            lines: vec!["y".to_string()],
            form: Some(SettingsForm {
                model: "llama3".to_string(),
                provider: "ollama".to_string(),
                endpoint: "http://localhost:11434/".to_string(),
                extend_selection_max_tokens: "abc".to_string(),
                ..SettingsForm::default()
            }),
        };

        let outcome = review_settings(&store, &mut input, &backend).unwrap();

        assert_eq!(*backend.calls.borrow(), 1);
        assert!(outcome.skipped.contains(&ConfigKey::ExtendMaxTokens));
        let saved = Settings::load(&store.snapshot());
        assert_eq!(saved.endpoint, "http://localhost:11434");
        assert_eq!(saved.model, "llama3");
    }

    #[test]
    fn test_review_settings_cancelled_writes_nothing() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("localwriter.json"));
        let backend = EchoBackend {
            calls: RefCell::new(0),
        };
        let mut input = ScriptedInput {
            lines: Vec::new(),
            form: None,
        };

        assert!(review_settings(&store, &mut input, &backend).is_none());
        assert!(!store.path().exists());
        assert_eq!(*backend.calls.borrow(), 0);
    }
}
