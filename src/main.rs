use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, ValueEnum, error::ErrorKind};
use log::info;

use wc_history::command::Command;
use wc_history::compare::{compare, find_team};
use wc_history::config::Config;
use wc_history::loader::{self, FilterField, LoadOptions, MatchCorpus};
use wc_history::match_record::MatchRecord;
use wc_history::parser::Layout;
use wc_history::report::{self, Labels};
use wc_history::source::Source;
use wc_history::standings::{RankPolicy, season_tables, select_years};
use wc_history::store::{self, TeamQuery};
use wc_history::HistoryError;
use wc_history::error::exit_status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum Format {
    /// Canonical pipe records (CSV grid for `stat`)
    #[default]
    Pipe,
    Table,
    Csv,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "wc_history")]
#[command(about = "World Cup match history: dumps, standings and head-to-head reports", long_about = None)]
struct Cli {
    /// Match history file path or http(s) URL
    #[arg(long, short = 'f')]
    file_path: Option<String>,

    /// Field layout of the source (detected from the first line when omitted)
    #[arg(long, value_enum)]
    layout: Option<Layout>,

    /// Team name (substring for find/compare, exact for filter/search-match)
    #[arg(long, short = 't')]
    team: Option<String>,

    /// Second team for compare
    #[arg(long, short = 'o')]
    opponent: Option<String>,

    /// Anchor year; 0 means no lower bound
    #[arg(long, short = 'y', default_value_t = 0, allow_negative_numbers = true)]
    year: i32,

    /// Signed year-window width around the anchor year
    #[arg(long, short = 's', default_value_t = 0, allow_negative_numbers = true)]
    span: i32,

    /// Report to produce
    #[arg(long, short = 'c', default_value = "stat", value_parser = parse_command)]
    command: Command,

    /// Competition name (or group letter / stage) for filter
    #[arg(long, short = 'm')]
    competition: Option<String>,

    /// City for filter
    #[arg(long, short = 'i')]
    city: Option<String>,

    /// Country for filter
    #[arg(long, short = 'C')]
    country: Option<String>,

    #[arg(long, value_enum, default_value_t = Format::Pipe)]
    format: Format,

    /// Header label set
    #[arg(long, value_enum)]
    labels: Option<Labels>,

    /// SQLite database path
    #[arg(long)]
    db: Option<PathBuf>,

    /// Also write the report rows to an .xlsx workbook
    #[arg(long)]
    xlsx: Option<PathBuf>,
}

fn parse_command(raw: &str) -> Result<Command, String> {
    raw.parse::<Command>().map_err(|err| {
        format!(
            "{err} (expected one of: {})",
            Command::tokens().collect::<Vec<_>>().join(", ")
        )
    })
}

fn main() -> ExitCode {
    let config = Config::from_env();
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_status(&err))
        }
    }
}

fn run(cli: &Cli, config: &Config) -> Result<()> {
    let labels = cli.labels.unwrap_or(config.labels);
    if !cli.command.needs_source() {
        return match cli.command {
            Command::SearchMatch => search_match(cli, config),
            _ => store_standings(cli, config, labels),
        };
    }

    let source = cli
        .file_path
        .clone()
        .or_else(|| config.source.clone())
        .map(|raw| Source::parse(&raw))
        .ok_or_else(|| anyhow!("no source given: pass --file-path or set WC_HISTORY_SOURCE"))?;
    let text = source.read(config.http_timeout_secs)?;
    let corpus = loader::load_text(
        &text,
        LoadOptions {
            layout: cli.layout,
            delimiter: None,
        },
    )?;
    let years = select_years(corpus.years(), cli.year, cli.span);
    info!("{} records, years selected: {:?}", corpus.len(), years);

    match cli.command {
        Command::Dump => {
            let rows = corpus
                .records()
                .iter()
                .filter(|m| years.contains(&m.year()))
                .collect::<Vec<_>>();
            emit_matches(cli, &rows)
        }
        Command::Stat => {
            let tables = season_tables(corpus.records(), RankPolicy::Record);
            let grid = report::season_grid(&tables, &years, labels);
            if cli.format == Format::Json {
                let selected = tables
                    .iter()
                    .filter(|(year, _)| years.contains(*year))
                    .collect::<BTreeMap<_, _>>();
                println!("{}", serde_json::to_string_pretty(&selected)?);
            } else if cli.format == Format::Table {
                print!("{}", report::render_table(&grid));
            } else {
                print!("{}", report::render_csv(&grid)?);
            }
            export_xlsx(cli, "Seasons", grid)
        }
        Command::Find => {
            let team = required(cli.team.as_deref(), "--team");
            corpus.require_substring(FilterField::Team, team)?;
            let rows = find_team(corpus.records(), team, &years);
            emit_matches(cli, &rows.iter().collect::<Vec<_>>())
        }
        Command::Compare => {
            let team = required(cli.team.as_deref(), "--team");
            let opponent = required(cli.opponent.as_deref(), "--opponent");
            corpus.require_substring(FilterField::Team, team)?;
            corpus.require_substring(FilterField::Team, opponent)?;
            let cmp = compare(corpus.records(), team, opponent, &years);
            info!(
                "{} direct meetings, common opponents: {}",
                cmp.direct.len(),
                cmp.common_opponents.join(", ")
            );
            emit_matches(cli, &cmp.rows().collect::<Vec<_>>())
        }
        Command::Filter => filter_dump(cli, &corpus),
        Command::UpdateStore => update_store(cli, config, &corpus),
        Command::SearchMatch | Command::Standings => Err(anyhow!("{} reads the store", cli.command)),
    }
}

fn filter_dump(cli: &Cli, corpus: &MatchCorpus) -> Result<()> {
    let criteria = [
        (FilterField::Team, cli.team.as_deref()),
        (FilterField::Competition, cli.competition.as_deref()),
        (FilterField::City, cli.city.as_deref()),
        (FilterField::Country, cli.country.as_deref()),
    ]
    .into_iter()
    .filter_map(|(field, value)| value.map(|v| (field, v)))
    .collect::<Vec<_>>();
    let year = (cli.year != 0).then_some(cli.year);
    let rows = corpus.filter(&criteria, year)?;
    emit_matches(cli, &rows)
}

fn update_store(cli: &Cli, config: &Config, corpus: &MatchCorpus) -> Result<()> {
    let db_path = db_path(cli, config)?;
    let mut conn = store::open_db(&db_path)?;
    let summary = store::insert_records(&mut conn, corpus.records())?;

    println!("Store update complete");
    println!("DB: {}", db_path.display());
    println!("Rows inserted: {}", summary.inserted);
    println!("Rows already present: {}", summary.ignored);
    if summary.unstaged > 0 {
        println!("Rows skipped (no stage): {}", summary.unstaged);
    }
    Ok(())
}

fn search_match(cli: &Cli, config: &Config) -> Result<()> {
    let team = required(cli.team.as_deref(), "--team");
    let conn = store::open_db(&db_path(cli, config)?)?;
    match store::query_team(&conn, team)? {
        TeamQuery::Matches(rows) => {
            let records = rows
                .iter()
                .map(store::StoredRow::to_record)
                .collect::<Result<Vec<_>>>()?;
            let grid = report::match_rows(&records);
            print!("{}", report::render_table(&grid));
            export_xlsx(cli, "Matches", grid)
        }
        TeamQuery::DidYouMean(suggestions) => Err(HistoryError::UnknownFilterValue {
            field: FilterField::Team.name(),
            value: team.to_string(),
            suggestions,
        }
        .into()),
    }
}

fn store_standings(cli: &Cli, config: &Config, labels: Labels) -> Result<()> {
    let conn = store::open_db(&db_path(cli, config)?)?;
    let years = select_years(store::stored_years(&conn)?, cli.year, cli.span);
    if years.is_empty() {
        return Err(anyhow!("store holds no seasons in the selected range"));
    }

    let mut sheet = Vec::new();
    for year in years {
        let table = store::season_standings(&conn, year)?;
        let mut rows = report::standings_rows(&table, labels);
        if let Some(header) = rows.first_mut() {
            header[0] = year.to_string();
        }
        match cli.format {
            Format::Csv => print!("{}", report::render_csv(&rows)?),
            Format::Json => println!("{}", serde_json::to_string_pretty(&table)?),
            Format::Pipe | Format::Table => print!("{}", report::render_table(&rows)),
        }
        sheet.extend(rows);
    }
    export_xlsx(cli, "Standings", sheet)
}

fn emit_matches(cli: &Cli, records: &[&MatchRecord]) -> Result<()> {
    match cli.format {
        Format::Pipe => {
            for m in records {
                println!("{m}");
            }
        }
        Format::Table => print!("{}", report::render_table(&match_grid(records))),
        Format::Csv => print!("{}", report::render_csv(&match_grid(records))?),
        Format::Json => println!("{}", serde_json::to_string_pretty(records)?),
    }
    export_xlsx(cli, "Matches", match_grid(records))
}

fn match_grid(records: &[&MatchRecord]) -> Vec<Vec<String>> {
    report::match_rows(records.iter().copied())
}

fn export_xlsx(cli: &Cli, sheet: &str, rows: Vec<Vec<String>>) -> Result<()> {
    let Some(path) = cli.xlsx.as_deref() else {
        return Ok(());
    };
    report::write_xlsx(path, &[(sheet, rows)])?;
    info!("wrote {}", path.display());
    Ok(())
}

/// Missing filters are usage errors; clap prints them and exits with code 2.
fn required<'a>(value: Option<&'a str>, flag: &str) -> &'a str {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v,
        None => Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                format!("{flag} is required for this command"),
            )
            .exit(),
    }
}

fn db_path(cli: &Cli, config: &Config) -> Result<PathBuf> {
    cli.db
        .clone()
        .or_else(|| config.db_path.clone())
        .context("unable to resolve sqlite path")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_filter_is_a_usage_error() {
        let err = Cli::command().error(ErrorKind::MissingRequiredArgument, "--team is required");
        assert_eq!(err.exit_code(), i32::from(wc_history::error::EXIT_USAGE));
    }

    #[test]
    fn unknown_command_token_is_rejected() {
        assert!(Cli::try_parse_from(["wc_history", "-c", "explode"]).is_err());
        let cli = Cli::try_parse_from(["wc_history", "-c", "t", "-y", "2010", "-s", "-4"])
            .expect("valid arguments");
        assert_eq!(cli.command, Command::Standings);
        assert_eq!((cli.year, cli.span), (2010, -4));
    }
}
