use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{HistoryError, HistoryResult};
use crate::match_record::{Competition, Field, MatchRecord, MatchStage};

const TOURNAMENT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";
const TEAM_RECORD_DATE_FORMAT: &str = "%Y-%m-%d";

/// Field-position convention of a flat source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Layout {
    /// `date-time|team|opponent|score|opponent_score|stage|stadium|venue`
    TournamentHistory,
    /// `date,team,opponent,score,opponent_score,competition,city,country,neutral`
    TeamRecord,
}

impl Layout {
    pub fn field_count(self) -> usize {
        match self {
            Layout::TournamentHistory => 8,
            Layout::TeamRecord => 9,
        }
    }

    pub fn from_field_count(count: usize) -> Option<Self> {
        match count {
            8 => Some(Layout::TournamentHistory),
            9 => Some(Layout::TeamRecord),
            _ => None,
        }
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "tournament" | "tournament-history" => Ok(Layout::TournamentHistory),
            "team" | "team-record" => Ok(Layout::TeamRecord),
            other => Err(format!("unknown layout '{other}'")),
        }
    }
}

/// Pipe wins when the line carries one, otherwise comma.
pub fn detect_delimiter(line: &str) -> char {
    if line.contains('|') { '|' } else { ',' }
}

pub fn split_fields(line: &str, delimiter: char) -> Vec<&str> {
    line.split(delimiter).map(str::trim).collect()
}

/// Team-record exports start with a `date,home_team,...` column row.
pub fn is_header(line: &str, delimiter: char) -> bool {
    split_fields(line, delimiter)
        .first()
        .is_some_and(|first| first.eq_ignore_ascii_case("date"))
}

pub fn parse_line(
    line_no: usize,
    line: &str,
    layout: Layout,
    delimiter: char,
) -> HistoryResult<MatchRecord> {
    let fields = split_fields(line, delimiter);
    if fields.len() != layout.field_count() {
        return Err(HistoryError::malformed(
            line_no,
            line,
            format!(
                "expected {} fields, found {}",
                layout.field_count(),
                fields.len()
            ),
        ));
    }

    let date_text = fields[0];
    let date = parse_date(date_text, layout)
        .ok_or_else(|| HistoryError::malformed(line_no, line, format!("bad date '{date_text}'")))?;
    let score = parse_score(fields[3])
        .ok_or_else(|| HistoryError::malformed(line_no, line, format!("bad score '{}'", fields[3])))?;
    let opponent_score = parse_score(fields[4])
        .ok_or_else(|| HistoryError::malformed(line_no, line, format!("bad score '{}'", fields[4])))?;

    let (competition, field) = match layout {
        Layout::TournamentHistory => {
            let competition = classify_stage(fields[5]).ok_or_else(|| {
                HistoryError::malformed(line_no, line, format!("unknown stage '{}'", fields[5]))
            })?;
            (competition, Field::Neutral)
        }
        Layout::TeamRecord => {
            let field = if fields[8].eq_ignore_ascii_case("true") {
                Field::Neutral
            } else {
                Field::Home
            };
            (Competition::Named(fields[5].to_string()), field)
        }
    };

    Ok(MatchRecord {
        date_text: date_text.to_string(),
        date,
        team: fields[1].to_string(),
        opponent: fields[2].to_string(),
        score,
        opponent_score,
        competition,
        stadium: fields[6].to_string(),
        venue: fields[7].to_string(),
        field,
    })
}

/// A single character is a group letter; anything else must name a stage.
pub fn classify_stage(raw: &str) -> Option<Competition> {
    if raw.chars().count() == 1 {
        return Some(Competition::group(raw));
    }
    MatchStage::from_token(raw).map(|stage| Competition::Stage { stage, group: None })
}

fn parse_date(raw: &str, layout: Layout) -> Option<NaiveDateTime> {
    match layout {
        Layout::TournamentHistory => NaiveDateTime::parse_from_str(raw, TOURNAMENT_DATE_FORMAT).ok(),
        Layout::TeamRecord => NaiveDate::parse_from_str(raw, TEAM_RECORD_DATE_FORMAT)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
    }
}

fn parse_score(raw: &str) -> Option<u32> {
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u32>().ok()
}
