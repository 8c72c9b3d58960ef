use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use animedex_core::catalog::{SortKey, StatusFilter};
use animedex_core::models::WatchStatus;

#[derive(Parser, Debug)]
#[command(
    name = "animedex",
    version,
    about = "Browse, search, and track anime from the Jikan catalog"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log to stderr instead of the rolling log file
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file to use instead of the platform default
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the current top-ranked anime
    Top {
        #[command(flatten)]
        list: ListArgs,
    },

    /// Search the catalog by title
    Search {
        query: String,
        #[command(flatten)]
        list: ListArgs,
    },

    /// Show everything known about one title
    Details {
        id: u64,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage favorite titles
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },

    /// Read or update personal watch status
    Status {
        #[command(subcommand)]
        action: StatusAction,
    },

    /// Aggregate statistics over favorite titles
    Stats {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Maintain the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Interactive browsing session
    Browse,
}

/// Filters and output options shared by list commands.
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Keep only this airing status ("all" disables the filter)
    #[arg(long, default_value = "all")]
    pub status: StatusFilter,

    /// Keep items with any of these genres (repeatable)
    #[arg(long = "genre", value_name = "GENRE")]
    pub genres: Vec<String>,

    /// rating, title, newest, popularity, episodes, or none
    #[arg(long, default_value = "rating")]
    pub sort: SortKey,

    /// Only show favorites
    #[arg(long)]
    pub favorites: bool,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum FavoritesAction {
    /// List favorite ids
    List {
        #[arg(long)]
        json: bool,
    },
    Add {
        id: u64,
    },
    Remove {
        id: u64,
    },
}

#[derive(Subcommand, Debug)]
pub enum StatusAction {
    /// Show the watch status of a title
    Get {
        id: u64,
        #[arg(long)]
        json: bool,
    },

    /// Update fields of a title's watch status
    Set {
        id: u64,
        /// Planning, Watching, Completed, On Hold, or Dropped
        #[arg(long, value_parser = parse_watch_status)]
        status: Option<WatchStatus>,
        /// Episodes watched
        #[arg(long, allow_negative_numbers = true)]
        episodes: Option<i64>,
        /// Personal rating, 0 to 10 in steps of 0.5
        #[arg(long, allow_negative_numbers = true)]
        rating: Option<f32>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// List every tracked title
    List {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Drop expired entries
    Purge,
    /// Drop every entry
    Clear,
}

fn parse_watch_status(s: &str) -> Result<WatchStatus, String> {
    WatchStatus::parse(s).ok_or_else(|| {
        let valid: Vec<&str> = WatchStatus::ALL.iter().map(|w| w.as_str()).collect();
        format!("unknown status '{s}' (expected one of: {})", valid.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_args_defaults() {
        let cli = Cli::try_parse_from(["animedex", "top"]).unwrap();
        let Command::Top { list } = cli.command else {
            panic!("expected top");
        };
        assert_eq!(list.status, StatusFilter::All);
        assert_eq!(list.sort, SortKey::Rating);
        assert!(list.genres.is_empty());
        assert!(!list.favorites);
    }

    #[test]
    fn test_search_with_filters() {
        let cli = Cli::try_parse_from([
            "animedex", "search", "cowboy", "--genre", "Action", "--genre", "Sci-Fi",
            "--sort", "title", "--status", "Finished Airing", "--json",
        ])
        .unwrap();
        let Command::Search { query, list } = cli.command else {
            panic!("expected search");
        };
        assert_eq!(query, "cowboy");
        assert_eq!(list.genres, vec!["Action", "Sci-Fi"]);
        assert_eq!(list.sort, SortKey::Title);
        assert_eq!(list.status, StatusFilter::Only("Finished Airing".into()));
        assert!(list.json);
    }

    #[test]
    fn test_status_set_accepts_negative_episodes_for_validation() {
        let cli = Cli::try_parse_from([
            "animedex", "status", "set", "1", "--episodes", "-3", "--status", "on hold",
        ])
        .unwrap();
        let Command::Status {
            action: StatusAction::Set { episodes, status, .. },
        } = cli.command
        else {
            panic!("expected status set");
        };
        assert_eq!(episodes, Some(-3));
        assert_eq!(status, Some(WatchStatus::OnHold));
    }

    #[test]
    fn test_rejects_unknown_sort_and_status() {
        assert!(Cli::try_parse_from(["animedex", "top", "--sort", "random"]).is_err());
        assert!(
            Cli::try_parse_from(["animedex", "status", "set", "1", "--status", "paused"]).is_err()
        );
    }

    #[test]
    fn test_global_flags() {
        let cli =
            Cli::try_parse_from(["animedex", "cache", "purge", "-v", "--config", "/tmp/a.toml"])
                .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/a.toml")));
    }
}
