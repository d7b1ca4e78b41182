use clap::Parser;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "goenv",
    author,
    version,
    about = "Install, list, switch between and remove Go versions",
    long_about = None,
    disable_help_flag = true
)]
pub struct CLI {
    /// List all remote versions of Go
    #[arg(long)]
    pub list_remote: bool,
    /// Install a specific version of Go
    #[arg(long, value_name = "VERSION")]
    pub install: Option<String>,
    /// List all installed Go versions
    #[arg(long)]
    pub list: bool,
    /// Uninstall a specific version of Go
    #[arg(long, value_name = "VERSION")]
    pub uninstall: Option<String>,
    /// Use a specific version of Go
    #[arg(long = "use", value_name = "VERSION")]
    pub use_version: Option<String>,
    /// Print this help
    #[arg(long = "help")]
    pub show_help: bool,
    /// Log every step to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// The single operation a command line resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    ListInstalled,
    Uninstall(String),
    ListRemote,
    Install(String),
    Use(String),
    Help,
    Usage,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

impl CLI {
    /// Picks one operation when several flags are given:
    /// list > uninstall > list-remote > install > use > help > usage.
    pub fn operation(&self) -> Operation {
        if self.list {
            Operation::ListInstalled
        } else if let Some(version) = non_empty(&self.uninstall) {
            Operation::Uninstall(version)
        } else if self.list_remote {
            Operation::ListRemote
        } else if let Some(version) = non_empty(&self.install) {
            Operation::Install(version)
        } else if let Some(version) = non_empty(&self.use_version) {
            Operation::Use(version)
        } else if self.show_help {
            Operation::Help
        } else {
            Operation::Usage
        }
    }
}
