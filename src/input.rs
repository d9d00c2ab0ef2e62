use crate::config::Settings;
use crate::providers::{CapabilityTracker, FieldHint, ProviderRegistry};
use crate::settings::SettingsForm;
use colored::Colorize;
use std::io::{self, BufRead, Write};

/// Typed on its own to clear a field in the settings form
const CLEAR_FIELD: &str = "-";

/// Ways the host can ask the user for input
pub trait UserInput {
    /// One line of free text, empty when the user cancels
    fn prompt_line(&mut self, message: &str) -> String;

    /// The settings form prefilled from `current`, `None` when cancelled
    fn settings_form(
        &mut self,
        current: &Settings,
        registry: &dyn ProviderRegistry,
    ) -> Option<SettingsForm>;
}

/// Line-based prompts: questions go to `writer`, answers come from `reader`
pub struct TerminalInput<R, W> {
    reader: R,
    writer: W,
}

impl TerminalInput<io::StdinLock<'static>, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalInput<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// `None` on end of input or a read error
    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read from terminal");
                None
            }
        }
    }

    fn say(&mut self, text: &str) {
        // The prompt is a courtesy; a closed stderr must not stop the form.
        let _ = writeln!(self.writer, "{}", text);
        let _ = self.writer.flush();
    }

    /// Shows `label` with the current value; empty keeps it, `-` clears it
    fn field(&mut self, label: &str, current: &str, masked: bool) -> Option<String> {
        let shown = if masked {
            mask_secret(current)
        } else {
            current.to_string()
        };
        let text = format!("{} [{}]:", label.bright_cyan(), shown.dimmed());
        self.say(&text);

        let answer = self.read_line()?;
        Some(match answer.as_str() {
            "" => current.to_string(),
            CLEAR_FIELD => String::new(),
            _ => answer,
        })
    }
}

/// Stars instead of a secret, at most eight so the length is not revealed
pub fn mask_secret(secret: &str) -> String {
    "*".repeat(secret.chars().count().min(8))
}

fn hint_suffix(hint: FieldHint) -> String {
    if hint.highlighted {
        format!(" ({})", "required for this provider".bright_yellow())
    } else {
        format!(" ({})", "optional".dimmed())
    }
}

impl<R: BufRead, W: Write> UserInput for TerminalInput<R, W> {
    fn prompt_line(&mut self, message: &str) -> String {
        let text = format!("{}", message.bright_green().bold());
        self.say(&text);
        self.read_line().unwrap_or_default()
    }

    fn settings_form(
        &mut self,
        current: &Settings,
        registry: &dyn ProviderRegistry,
    ) -> Option<SettingsForm> {
        let mut tracker = CapabilityTracker::new(registry);
        let defaults = SettingsForm::from_settings(current);

        self.say(&format!(
            "{} {}",
            "Settings".bold(),
            "(Enter keeps the current value, '-' clears it)".dimmed()
        ));

        let provider = self.field("Provider (e.g. openai, ollama, anthropic)", &defaults.provider, false)?;
        let capability = tracker.provider_changed(&provider);

        let model = self.field("Model", &defaults.model, false)?;
        let endpoint_label = format!(
            "Endpoint URL (local server or proxy){}",
            hint_suffix(capability.endpoint_hint())
        );
        let endpoint = self.field(&endpoint_label, &defaults.endpoint, false)?;
        let api_key_label = format!("API key{}", hint_suffix(capability.api_key_hint()));
        let api_key = self.field(&api_key_label, &defaults.api_key, true)?;

        let extend_selection_max_tokens = self.field(
            "Extend selection max tokens",
            &defaults.extend_selection_max_tokens,
            false,
        )?;
        let extend_selection_system_prompt = self.field(
            "Extend selection system prompt",
            &defaults.extend_selection_system_prompt,
            false,
        )?;
        let edit_selection_max_new_tokens = self.field(
            "Edit selection max new tokens",
            &defaults.edit_selection_max_new_tokens,
            false,
        )?;
        let edit_selection_system_prompt = self.field(
            "Edit selection system prompt",
            &defaults.edit_selection_system_prompt,
            false,
        )?;

        Some(SettingsForm {
            endpoint,
            model,
            provider,
            api_key,
            extend_selection_max_tokens,
            extend_selection_system_prompt,
            edit_selection_max_new_tokens,
            edit_selection_system_prompt,
        })
    }
}
