//! Meta commands: shell completions.

use clap::CommandFactory;

/// Write completion definitions for the given shell to stdout.
pub(crate) fn handle_completions(shell: clap_complete::Shell) {
    let mut cmd = crate::Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}
