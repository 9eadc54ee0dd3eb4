//! Command-line interface: argument definitions and command dispatch.

use crate::{DiffProvider, GitCli};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "git-ranges")]
#[command(about = "Line ranges changed in files according to git diff")]
pub struct Cli {
    /// Run git as if started in this directory
    #[arg(short = 'C', global = true, default_value = ".")]
    pub dir: PathBuf,

    /// Log progress
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log cache and git activity
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the zero-context diff of a file against HEAD
    Diff {
        /// Diff the index instead of the working tree
        #[arg(long, alias = "cached")]
        staged: bool,
        file: PathBuf,
    },
    /// Print added line ranges as FILE:START..END (END exclusive)
    Ranges {
        /// Diff the index instead of the working tree
        #[arg(long, alias = "cached")]
        staged: bool,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print shell completions
    Completions { shell: Shell },
    /// Print the man page
    Man,
}

/// Execute `cli`, writing command output to `out`.
///
/// `ranges` prints one `FILE:START..END` line per range, with `FILE` exactly
/// as given; all files share a single [`DiffProvider`].
///
/// # Errors
///
/// Returns the first git, hunk header or write failure.
pub fn run(cli: Cli, out: &mut impl Write) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Diff { staged, file } => {
            let mut provider = DiffProvider::new(GitCli::new(cli.dir));
            write!(out, "{}", provider.get_diff(&file, staged)?)?;
        }
        Commands::Ranges { staged, files } => {
            let mut provider = DiffProvider::new(GitCli::new(cli.dir));
            for file in &files {
                let ranges = provider.get_ranges(file, staged)?;
                info!(file = %file.display(), count = ranges.len(), "collected ranges");
                for range in ranges {
                    writeln!(out, "{}:{}", file.display(), range)?;
                }
            }
            debug!(entries = provider.cache().len(), "diff cache size");
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "git-ranges", out);
        }
        Commands::Man => clap_mangen::Man::new(Cli::command()).render(out)?,
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> String {
        let mut out = Vec::new();
        run(Cli::try_parse_from(args).unwrap(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ranges_requires_a_file() {
        assert!(Cli::try_parse_from(["git-ranges", "ranges"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["git-ranges", "ranges", "--cached", "a.rs", "-C", "repo"]).unwrap();
        assert_eq!(cli.dir, PathBuf::from("repo"));
        assert!(matches!(
            cli.command,
            Commands::Ranges { staged: true, ref files } if files == &[PathBuf::from("a.rs")]
        ));
    }

    #[test]
    fn completions_name_the_binary() {
        let script = run_args(&["git-ranges", "completions", "bash"]);
        assert!(script.contains("git-ranges"));
    }

    #[test]
    fn man_page_documents_subcommands() {
        let page = run_args(&["git-ranges", "man"]);
        assert!(page.starts_with(".ie") || page.contains(".TH"));
        assert!(page.contains("Print added line ranges"));
    }
}
