use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDateTime};
use log::info;
use rusqlite::{Connection, params};

use crate::match_record::{Competition, Field, MatchRecord, MatchStage};
use crate::standings::{RankPolicy, TeamStanding, aggregate};

const ISO_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const RECORD_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One persisted orientation of a stage-classified fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    pub identity: String,
    pub epoch_seconds: i64,
    pub year: i32,
    pub time: String,
    pub team: String,
    pub opponent: String,
    pub score: u32,
    pub opponent_score: u32,
    pub stage: MatchStage,
    pub group: Option<String>,
    pub stadium: Option<String>,
    pub venue: Option<String>,
}

impl StoredRow {
    /// `None` for team-record rows, which carry no stage.
    pub fn from_record(m: &MatchRecord) -> Option<Self> {
        let stage = m.competition.stage()?;
        Some(Self {
            identity: m.identity(),
            epoch_seconds: m.date.and_utc().timestamp(),
            year: m.year(),
            time: m.date.format(ISO_TIME_FORMAT).to_string(),
            team: m.team.clone(),
            opponent: m.opponent.clone(),
            score: m.score,
            opponent_score: m.opponent_score,
            stage,
            group: m.competition.group_label().map(str::to_string),
            stadium: non_empty(&m.stadium),
            venue: non_empty(&m.venue),
        })
    }

    pub fn date(&self) -> Result<NaiveDateTime> {
        DateTime::from_timestamp(self.epoch_seconds, 0)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| anyhow!("epoch {} out of range", self.epoch_seconds))
    }

    pub fn to_record(&self) -> Result<MatchRecord> {
        let date = self.date()?;
        Ok(MatchRecord {
            date_text: date.format(RECORD_DATE_FORMAT).to_string(),
            date,
            team: self.team.clone(),
            opponent: self.opponent.clone(),
            score: self.score,
            opponent_score: self.opponent_score,
            competition: Competition::Stage {
                stage: self.stage,
                group: self.group.clone(),
            },
            stadium: self.stadium.clone().unwrap_or_default(),
            venue: self.venue.clone().unwrap_or_default(),
            field: Field::Neutral,
        })
    }
}

/// Result of a team lookup: its matches, or close names when nothing matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamQuery {
    Matches(Vec<StoredRow>),
    DidYouMean(Vec<String>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertSummary {
    pub inserted: usize,
    pub ignored: usize,
    pub unstaged: usize,
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS matches (
            uuid TEXT NOT NULL UNIQUE ON CONFLICT IGNORE,
            date INTEGER NOT NULL,
            year INTEGER NOT NULL,
            time TEXT NOT NULL,
            team TEXT NOT NULL,
            opponent TEXT NOT NULL,
            score INTEGER NOT NULL,
            opponent_score INTEGER NOT NULL,
            stage INTEGER NOT NULL,
            group_name TEXT NULL,
            stadium TEXT NULL,
            venue TEXT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_team ON matches(team);
        CREATE INDEX IF NOT EXISTS idx_matches_year ON matches(year);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Inserts every record in one transaction. Rows whose identity already
/// exists are ignored by the table constraint.
pub fn insert_records(conn: &mut Connection, records: &[MatchRecord]) -> Result<InsertSummary> {
    let mut summary = InsertSummary::default();
    let tx = conn.transaction().context("begin insert transaction")?;
    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO matches (
                    uuid, date, year, time, team, opponent,
                    score, opponent_score, stage, group_name, stadium, venue
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )
            .context("prepare insert")?;
        for m in records {
            let Some(row) = StoredRow::from_record(m) else {
                summary.unstaged += 1;
                continue;
            };
            let changed = stmt
                .execute(params![
                    row.identity,
                    row.epoch_seconds,
                    row.year,
                    row.time,
                    row.team,
                    row.opponent,
                    row.score,
                    row.opponent_score,
                    row.stage.ordinal(),
                    row.group,
                    row.stadium,
                    row.venue,
                ])
                .context("insert match")?;
            if changed == 0 {
                summary.ignored += 1;
            } else {
                summary.inserted += 1;
            }
        }
    }
    tx.commit().context("commit insert transaction")?;
    info!(
        "store insert: {} new, {} already present, {} without stage",
        summary.inserted, summary.ignored, summary.unstaged
    );
    Ok(summary)
}

/// Exact team match, newest first. Falls back to distinct names that
/// contain the query's characters in order.
pub fn query_team(conn: &Connection, team: &str) -> Result<TeamQuery> {
    let rows = select_rows(conn, "WHERE team = ?1 ORDER BY date DESC, rowid ASC", params![team])?;
    if !rows.is_empty() {
        return Ok(TeamQuery::Matches(rows));
    }

    let mut stmt = conn
        .prepare(
            "SELECT DISTINCT team FROM matches WHERE team LIKE ?1 ESCAPE '\\' ORDER BY team",
        )
        .context("prepare team suggestion query")?;
    let names = stmt
        .query_map(params![like_pattern(team)], |row| row.get::<_, String>(0))
        .context("query team suggestions")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("decode team suggestion")?;
    Ok(TeamQuery::DidYouMean(names))
}

/// Stored rows (both orientations) as records, optionally for one year.
pub fn load_records(conn: &Connection, year: Option<i32>) -> Result<Vec<MatchRecord>> {
    let rows = match year {
        Some(year) => select_rows(
            conn,
            "WHERE year = ?1 ORDER BY date ASC, rowid ASC",
            params![year],
        )?,
        None => select_rows(conn, "ORDER BY date ASC, rowid ASC", params![])?,
    };
    rows.iter().map(StoredRow::to_record).collect()
}

pub fn stored_years(conn: &Connection) -> Result<Vec<i32>> {
    let mut stmt = conn
        .prepare("SELECT DISTINCT year FROM matches ORDER BY year DESC")
        .context("prepare year query")?;
    let years = stmt
        .query_map([], |row| row.get::<_, i32>(0))
        .context("query years")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("decode year")?;
    Ok(years)
}

/// Points-ranked table for one stored season.
pub fn season_standings(conn: &Connection, year: i32) -> Result<Vec<TeamStanding>> {
    let records = load_records(conn, Some(year))?;
    Ok(aggregate(&records, RankPolicy::Points))
}

fn select_rows(
    conn: &Connection,
    tail: &str,
    args: impl rusqlite::Params,
) -> Result<Vec<StoredRow>> {
    let sql = format!(
        "SELECT uuid, date, year, time, team, opponent, score, opponent_score,
                stage, group_name, stadium, venue
         FROM matches {tail}"
    );
    let mut stmt = conn.prepare(&sql).context("prepare match query")?;
    let rows = stmt
        .query_map(args, |row| {
            let ordinal = row.get::<_, i64>(8)?;
            let stage = MatchStage::from_ordinal(ordinal).ok_or_else(|| {
                rusqlite::Error::IntegralValueOutOfRange(8, ordinal)
            })?;
            Ok(StoredRow {
                identity: row.get(0)?,
                epoch_seconds: row.get(1)?,
                year: row.get(2)?,
                time: row.get(3)?,
                team: row.get(4)?,
                opponent: row.get(5)?,
                score: row.get(6)?,
                opponent_score: row.get(7)?,
                stage,
                group: row.get(9)?,
                stadium: row.get(10)?,
                venue: row.get(11)?,
            })
        })
        .context("query matches")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode match row")?);
    }
    Ok(out)
}

const LIKE_ESCAPE: char = '\\';

/// `%c%h%a%r%` with LIKE wildcards in the query taken literally.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::from("%");
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(ch);
        pattern.push('%');
    }
    pattern
}

fn non_empty(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}
