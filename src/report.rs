use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::match_record::{Competition, MatchRecord, MatchStage};
use crate::standings::TeamStanding;

const SEASONS_PER_BAND: usize = 3;
const PROMOTED_MARK: &str = "★";

/// Header label set for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Labels {
    #[default]
    En,
    Zh,
}

impl Labels {
    /// Column labels after the year cell of a season block.
    fn season_block(self) -> [&'static str; 6] {
        match self {
            Labels::En => ["GF", "GA", "MP", "W", "D", "L"],
            Labels::Zh => ["进", "丢", "场", "胜", "平", "负"],
        }
    }

    fn standings(self) -> [&'static str; 10] {
        match self {
            Labels::En => ["MP", "W", "D", "L", "GF", "GA", "+/-", "PTS", "", ""],
            Labels::Zh => ["场", "胜", "平", "负", "进", "丢", "净", "积分", "组", ""],
        }
    }
}

impl FromStr for Labels {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Labels::En),
            "zh" | "cn" => Ok(Labels::Zh),
            other => Err(format!("unknown label set '{other}'")),
        }
    }
}

/// Fixed-width columns, each cell followed by ` | `.
pub fn render_table(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in rows {
        let mut line = String::new();
        for (idx, width) in widths.iter().enumerate() {
            let cell = row.get(idx).map(String::as_str).unwrap_or("");
            line.push_str(&format!("{cell:<width$} | "));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

pub fn render_csv(rows: &[Vec<String>]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row).context("write csv row")?;
    }
    let bytes = writer.into_inner().context("flush csv writer")?;
    String::from_utf8(bytes).context("csv output is not utf-8")
}

/// Season tables laid out side by side, three seasons per band.
pub fn season_grid(
    tables: &BTreeMap<i32, Vec<TeamStanding>>,
    years: &[i32],
    labels: Labels,
) -> Vec<Vec<String>> {
    let empty = Vec::new();
    let block_width = 1 + labels.season_block().len();
    let mut out = Vec::new();

    for band in years.chunks(SEASONS_PER_BAND) {
        let height = band
            .iter()
            .map(|year| tables.get(year).map_or(0, Vec::len))
            .max()
            .unwrap_or(0)
            + 1;
        for line in 0..height {
            let mut row = Vec::with_capacity(block_width * band.len());
            for year in band {
                let table = tables.get(year).unwrap_or(&empty);
                if line == 0 {
                    row.push(year.to_string());
                    row.extend(labels.season_block().iter().map(|s| s.to_string()));
                } else if let Some(s) = table.get(line - 1) {
                    row.extend([
                        s.team.clone(),
                        s.goals_for.to_string(),
                        s.goals_against.to_string(),
                        s.played.to_string(),
                        s.wins.to_string(),
                        s.draws.to_string(),
                        s.losses.to_string(),
                    ]);
                } else {
                    row.extend(std::iter::repeat_n(String::new(), block_width));
                }
            }
            while row.last().is_some_and(String::is_empty) {
                row.pop();
            }
            out.push(row);
        }
    }
    out
}

pub fn standings_rows(table: &[TeamStanding], labels: Labels) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(table.len() + 1);
    let mut header = vec![String::new()];
    header.extend(labels.standings().iter().map(|s| s.to_string()));
    rows.push(header);
    for s in table {
        rows.push(vec![
            s.team.clone(),
            s.played.to_string(),
            s.wins.to_string(),
            s.draws.to_string(),
            s.losses.to_string(),
            s.goals_for.to_string(),
            s.goals_against.to_string(),
            s.goal_difference().to_string(),
            s.points.to_string(),
            s.group.clone().unwrap_or_default(),
            if s.promoted { PROMOTED_MARK } else { " " }.to_string(),
        ]);
    }
    rows
}

/// Compact per-match rows for table printing.
pub fn match_rows<'a>(records: impl IntoIterator<Item = &'a MatchRecord>) -> Vec<Vec<String>> {
    records
        .into_iter()
        .map(|m| {
            vec![
                m.date.format("%Y-%m-%d").to_string(),
                m.team.clone(),
                m.opponent.clone(),
                m.score.to_string(),
                m.opponent_score.to_string(),
                stage_cell(&m.competition),
            ]
        })
        .collect()
}

fn stage_cell(competition: &Competition) -> String {
    match competition {
        Competition::Stage {
            group: Some(group), ..
        } => format!(":{group}:"),
        Competition::Stage { stage, .. } => stage_name(*stage).to_string(),
        Competition::Named(name) => name.clone(),
    }
}

fn stage_name(stage: MatchStage) -> &'static str {
    match stage {
        MatchStage::Group => "group",
        MatchStage::Knock => "knock",
        MatchStage::Quarter => "quarter",
        MatchStage::Semi => "semi",
        MatchStage::Third => "third",
        MatchStage::Final => "final",
    }
}

pub fn write_xlsx(path: &Path, sheets: &[(&str, Vec<Vec<String>>)]) -> Result<()> {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name)?;
        write_rows(sheet, rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
