use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "simgit",
    version,
    about = "SimGit - keep an eye on the pending changes of your repositories",
    long_about = "SimGit watches the working tree of the active repository and keeps its list of pending changes up to date as files are edited, created and deleted."
)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the repository list, overriding the configured location
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List known repositories
    #[command(about = "List known repositories, sorted by name")]
    List,

    /// Add a repository
    #[command(about = "Add a repository to the known list")]
    Add(AddArgs),

    /// Remove a repository
    #[command(about = "Remove a repository from the known list")]
    Remove(RemoveArgs),

    /// Show pending changes once
    #[command(about = "Print the pending changes of a repository and exit")]
    Status(StatusArgs),

    /// Watch a repository
    #[command(about = "Watch a repository and print its pending changes as they change")]
    Watch(WatchArgs),
}

#[derive(Parser, Debug)]
pub struct AddArgs {
    /// Repository root
    #[arg(help = "Path to the repository root")]
    pub path: PathBuf,

    /// Display name
    #[arg(short, long, help = "Display name (defaults to the directory name)")]
    pub name: Option<String>,
}

#[derive(Parser, Debug)]
pub struct RemoveArgs {
    /// Repository root
    #[arg(help = "Path of the repository to remove")]
    pub path: PathBuf,
}

#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Repository root
    #[arg(help = "Repository root (defaults to the last active repository)")]
    pub path: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Repository root
    #[arg(help = "Repository root (defaults to the last active repository)")]
    pub path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_with_name() {
        let cli = Cli::try_parse_from(["simgit", "-vv", "add", "/src/repo", "--name", "repo"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Add(args) => {
                assert_eq!(args.path, PathBuf::from("/src/repo"));
                assert_eq!(args.name.as_deref(), Some("repo"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_watch_path_is_optional() {
        let cli = Cli::try_parse_from(["simgit", "watch"]).unwrap();
        assert!(matches!(cli.command, Commands::Watch(WatchArgs { path: None })));
    }
}
