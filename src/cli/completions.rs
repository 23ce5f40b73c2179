//! Completions command implementation

use crate::cli::{Cli, CompletionsArgs};
use clap::CommandFactory;
use clap_complete::generate;
use std::io::{self, Write};

/// Write completions for `args.shell` to `out`.
pub fn write_completions(args: &CompletionsArgs, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(args.shell, &mut cmd, bin_name, out);
}

/// Handle `printwatch completions` command
pub fn handle_completions(args: &CompletionsArgs) {
    write_completions(args, &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap_complete::Shell;

    #[test]
    fn test_completions_bash() {
        let mut out = Vec::new();
        write_completions(&CompletionsArgs { shell: Shell::Bash }, &mut out);
        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("printwatch"));
        assert!(script.contains("watch"));
    }

    #[test]
    fn test_completions_zsh() {
        let mut out = Vec::new();
        write_completions(&CompletionsArgs { shell: Shell::Zsh }, &mut out);
        assert!(!out.is_empty());
    }
}
