//! Shell completions generation command
//!
//! Usage: `dualsync completions bash > ~/.local/share/bash-completion/completions/dualsync`

use std::io;

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::Shell;

#[derive(Debug, clap::Args)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsCommand {
    pub fn execute(&self) -> Result<()> {
        let mut cmd = crate::Cli::command();
        clap_complete::generate(self.shell, &mut cmd, "dualsync", &mut io::stdout());
        Ok(())
    }
}
