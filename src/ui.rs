use crate::error::LocalWriterError;
use crate::job::JobReport;
use colored::Colorize;

/// Message severity levels for consistent terminal feedback
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MessageSeverity {
    Warning,
    Error,
    Info,
    Success,
}

impl MessageSeverity {
    pub fn prefix(&self) -> colored::ColoredString {
        match self {
            Self::Warning => "Warning:".bright_yellow().bold(),
            Self::Error => "Error:".bright_red().bold(),
            Self::Info => "Info:".bright_cyan().bold(),
            Self::Success => "Success:".bright_green().bold(),
        }
    }
}

/// Status output goes to stderr; stdout carries only document text.
pub struct UI;

impl UI {
    pub fn print_message(severity: MessageSeverity, message: &str) {
        eprintln!("{} {}", severity.prefix(), message);
    }

    pub fn print_warning(message: &str) {
        Self::print_message(MessageSeverity::Warning, message);
    }

    pub fn print_info(message: &str) {
        Self::print_message(MessageSeverity::Info, message);
    }

    pub fn print_success(message: &str) {
        Self::print_message(MessageSeverity::Success, message);
    }

    pub fn print_error_with_hint(error: &LocalWriterError) {
        eprintln!("{} {}", MessageSeverity::Error.prefix(), error);
        if let Some(hint) = error.hint() {
            eprintln!("  {} {}", "Hint:".bright_cyan(), hint);
        }
    }

    pub fn print_report(action: &str, report: &JobReport) {
        let summary = format!(
            "{}: {} completed, {} failed, {} skipped",
            action, report.completed, report.failed, report.skipped
        );
        if report.failed > 0 {
            Self::print_warning(&summary);
        } else {
            Self::print_info(&summary);
        }
    }

    /// A labelled value on stdout, for commands whose output is the answer
    pub fn print_field(label: &str, value: &str) {
        println!("  {} {}", format!("{}:", label).bright_cyan(), value);
    }
}
