use crate::settings::SettingsForm;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "localwriter",
    about = "Extend or edit selected text with a language model",
    long_about = "localwriter sends the selected text to a chat-completion endpoint (OpenAI-compatible servers such as ollama or LM Studio, or hosted providers) and writes the result back: appended for `extend`, replacing the selection for `edit`. Settings persist in a JSON file in the user configuration directory.",
    version
)]
pub struct Cli {
    /// Settings file to use instead of the per-user default
    #[arg(long, global = true, env = "LOCALWRITER_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Append a model-generated continuation to the selection
    Extend {
        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Replace the selection with a rewrite that follows your instructions
    Edit {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Edit instructions (prompted for when omitted)
        #[arg(short = 'I', long)]
        instructions: Option<String>,
    },

    /// Review and change the saved settings
    Settings {
        /// Print the saved settings instead of editing them
        #[arg(long)]
        show: bool,
    },

    /// Send a short probe using only the given values, ignoring saved settings
    TestConnection(ConnectionArgs),

    /// Show which settings fields a provider needs
    Provider {
        /// Provider name, e.g. openai or ollama
        name: String,
    },
}

#[derive(Args, Debug)]
pub struct SelectionArgs {
    /// Read the selection from this file instead of stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Treat the selection as tab-separated spreadsheet cells
    #[arg(long)]
    pub sheet: bool,

    /// Write the result back to the input file instead of stdout
    #[arg(long, requires = "input")]
    pub in_place: bool,
}

#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    #[arg(long, default_value = "")]
    pub endpoint: String,

    #[arg(long, default_value = "")]
    pub model: String,

    #[arg(long, default_value = "")]
    pub provider: String,

    #[arg(long, default_value = "", hide_env_values = true, env = "LOCALWRITER_API_KEY")]
    pub api_key: String,
}

impl ConnectionArgs {
    pub fn into_form(self) -> SettingsForm {
        SettingsForm {
            endpoint: self.endpoint,
            model: self.model,
            provider: self.provider,
            api_key: self.api_key,
            ..SettingsForm::default()
        }
    }
}
