//! CLI argument parsing using clap.
//!
//! Contains the Cli struct, Commands enum, and the custom help text.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Create custom help text with consistent styling
fn create_custom_help() -> String {
    use console::style;

    let colors = console::colors_enabled();
    let heading = |text: &str| {
        if colors {
            style(text).cyan().bold().to_string()
        } else {
            text.to_string()
        }
    };

    let mut help = String::new();

    // Quick Start section
    help.push_str(&format!("{}\n", heading("Quick Start:")));
    help.push_str("  $ diffwatch init                     # Initialize in current directory\n");
    help.push_str("  $ diffwatch watch                    # Watch the workspace for commits\n");
    help.push_str("  $ diffwatch watch --login            # Log in first, then watch\n");
    help.push_str("  $ diffwatch watch --project shop     # Watch one project by name\n");
    help.push_str("  $ diffwatch testgen --diff last.diff # Generate tests from a diff\n\n");

    // About section
    help.push_str("Watch a git workspace for commits and relay each diff for AI review.\n\n");

    // Usage
    help.push_str(&heading("Usage:"));
    help.push_str(" diffwatch [OPTIONS] <COMMAND>\n\n");

    // Commands
    help.push_str(&format!("{}\n", heading("Commands:")));
    help.push_str("  init     Set up .diffwatch directory\n");
    help.push_str("  watch    Watch the active project's repository for commits\n");
    help.push_str("  config   Display active settings\n");
    help.push_str("  testgen  Generate tests for a diff via the review backend\n");
    help.push_str("  help     Print this message or the help of the given subcommand(s)\n\n");

    help.push_str("See 'diffwatch help <command>' for more information on a specific command.\n\n");

    // Options
    help.push_str(&format!("{}\n", heading("Options:")));
    help.push_str("  -c, --config <CONFIG>  Path to custom settings.toml file\n");
    help.push_str("  -h, --help             Print help\n");
    help.push_str("  -V, --version          Print version\n");

    help
}

/// Commit watch and AI review relay
#[derive(Parser)]
#[command(
    name = "diffwatch",
    version = env!("CARGO_PKG_VERSION"),
    about = "Commit watch and AI review relay",
    long_about = "Watch a git workspace for commits and relay each diff for AI review.",
    next_line_help = true,
    styles = clap_cargo_style(),
    override_help = create_custom_help()
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .diffwatch directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Watch the workspace for commits
    #[command(
        about = "Watch the active project's repository for commits",
        long_about = "Watch the active project's repository and relay each new commit's diff to the review backend.",
        after_help = "Examples:\n  diffwatch watch\n  diffwatch watch --login\n  diffwatch watch --workspace ~/code --project shop\n  DW_AUTH__TOKEN=<jwt> diffwatch watch\n\nRuns until Ctrl-C. Diffs are held back until you are logged in."
    )]
    Watch {
        /// Workspace root to scan for projects (defaults to the detected workspace)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Project to select initially, by name
        #[arg(short, long)]
        project: Option<String>,

        /// Prompt for credentials before watching
        #[arg(long)]
        login: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings from .diffwatch/settings.toml")]
    Config,

    /// Generate tests for a diff
    #[command(
        about = "Generate tests for a diff via the review backend",
        after_help = "Examples:\n  diffwatch testgen --diff changes.diff\n  git show | diffwatch testgen\n  diffwatch testgen --diff changes.diff --skip-validate\n\nReads the diff from --diff or stdin, asks the backend for tests,\nvalidates them, and writes the result beneath the project root."
    )]
    Testgen {
        /// Read the diff from this file instead of stdin
        #[arg(short, long)]
        diff: Option<PathBuf>,

        /// Project root the generated test is written beneath
        #[arg(long, default_value = ".")]
        project_root: PathBuf,

        /// Write the generated test without the validation round-trip
        #[arg(long)]
        skip_validate: bool,
    },
}
