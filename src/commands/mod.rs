use crate::cli::CliCommand;
use crate::config::ConfigStore;
use crate::error::Result;

pub mod builtin;

impl CliCommand {
    pub fn execute(self, store: &ConfigStore) -> Result<()> {
        match self {
            CliCommand::Extend { selection } => builtin::extend_command(store, &selection),
            CliCommand::Edit {
                selection,
                instructions,
            } => builtin::edit_command(store, &selection, instructions),
            CliCommand::Settings { show: true } => builtin::show_settings_command(store),
            CliCommand::Settings { show: false } => builtin::settings_command(store),
            CliCommand::TestConnection(args) => builtin::test_connection_command(args),
            CliCommand::Provider { name } => builtin::provider_command(&name),
        }
    }
}
