use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "portal-audit",
    version,
    about = "Code auditor, quality gate and workflow validator",
    after_help = "Run `portal-audit !comandos` to list the available commands."
)]
pub struct Cli {
    /// Project root to audit
    #[arg(long, short, default_value = ".")]
    pub root: PathBuf,
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(long, short)]
    pub verbose: bool,
    /// Command words, e.g. `!rever codigo`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl Cli {
    /// Command words, split on whitespace even when passed quoted.
    #[must_use]
    pub fn words(&self) -> Vec<&str> {
        self.command.iter().flat_map(|w| w.split_whitespace()).collect()
    }
}
