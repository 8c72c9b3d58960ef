//! Interactive browsing session over [`BrowseState`].

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use animedex_api::CatalogSource;
use animedex_core::browse::{BrowseState, ViewMode};
use animedex_core::catalog::{SortKey, StatusFilter};

use crate::app::App;
use crate::error::CliError;
use crate::render;

const HELP: &str = "\
commands:
  top                 load the top-ranked list
  search <query>      load search results
  sort <key>          rating, title, newest, popularity, episodes, none
  status <status>     filter by airing status (\"all\" to reset)
  genres <a,b,...>    keep items with any of these genres (empty to reset)
  view <mode>         all, favorites, stats
  fav <id>            toggle a favorite
  dismiss             hide the current notice
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum BrowseCommand {
    Top,
    Search(String),
    Sort(SortKey),
    Status(StatusFilter),
    Genres(Vec<String>),
    View(ViewMode),
    Fav(u64),
    Dismiss,
    Show,
    Help,
    Quit,
}

impl BrowseCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        match word.to_lowercase().as_str() {
            "" | "ls" => Ok(Self::Show),
            "top" => Ok(Self::Top),
            "search" if rest.is_empty() => Err("usage: search <query>".into()),
            "search" => Ok(Self::Search(rest.to_string())),
            "sort" => rest.parse().map(Self::Sort),
            "status" => Ok(Self::Status(
                rest.parse().unwrap_or(StatusFilter::All),
            )),
            "genres" => Ok(Self::Genres(
                rest.split(',')
                    .map(str::trim)
                    .filter(|g| !g.is_empty())
                    .map(String::from)
                    .collect(),
            )),
            "view" => rest.parse().map(Self::View),
            "fav" => rest
                .parse()
                .map(Self::Fav)
                .map_err(|_| format!("not an id: {rest}")),
            "dismiss" => Ok(Self::Dismiss),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(format!("unknown command: {other} (try 'help')")),
        }
    }
}

/// Read commands from `input` until `quit` or end of input, printing the
/// current view to `out` after each one.
pub async fn run<S, R, W>(app: &App<S>, input: R, out: &mut W) -> Result<(), CliError>
where
    S: CatalogSource,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut state = BrowseState::new();
    state.apply_load(app.catalog().get_top().await, "Failed to load top anime");
    show(app, &state, out)?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match BrowseCommand::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(out, "{message}")?;
                continue;
            }
        };
        match command {
            BrowseCommand::Quit => break,
            BrowseCommand::Help => {
                writeln!(out, "{HELP}")?;
                continue;
            }
            BrowseCommand::Top => {
                let result = app.catalog().get_top().await;
                state.apply_load(result, "Failed to load top anime");
            }
            BrowseCommand::Search(query) => {
                let result = app.catalog().search(&query).await;
                state.apply_load(result, "Failed to search anime");
            }
            BrowseCommand::Sort(key) => state.query.sort = key,
            BrowseCommand::Status(filter) => state.query.status = filter,
            BrowseCommand::Genres(genres) => state.query.genres = genres,
            BrowseCommand::View(mode) => state.view = mode,
            BrowseCommand::Fav(id) => {
                if let Err(e) = app.favorites().toggle(id) {
                    tracing::warn!(id, error = %e, "Failed to update favorites");
                    state.set_notice(format!("Failed to update favorites: {e}"));
                }
            }
            BrowseCommand::Dismiss => state.dismiss_notice(),
            BrowseCommand::Show => {}
        }
        show(app, &state, out)?;
    }
    Ok(())
}

fn show<S: CatalogSource, W: Write>(
    app: &App<S>,
    state: &BrowseState,
    out: &mut W,
) -> Result<(), CliError> {
    if let Some(notice) = state.notice() {
        writeln!(out, "! {notice}")?;
    }
    let favorites = app.favorites().list();
    let body = match state.view {
        ViewMode::Stats => render::statistics(&state.statistics(&favorites)),
        ViewMode::All | ViewMode::Favorites => {
            render::item_table(&state.visible(&favorites), &favorites)
        }
    };
    writeln!(out, "{body}")?;
    Ok(())
}
