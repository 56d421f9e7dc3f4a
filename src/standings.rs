use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::match_record::{MatchRecord, Outcome};

const WIN_POINTS: u32 = 3;
const DRAW_POINTS: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TeamStanding {
    pub team: String,
    /// Summed over a season, so wider than a single score.
    pub goals_for: u64,
    pub goals_against: u64,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub points: u32,
    pub group: Option<String>,
    /// Played past the group stage in this table's season.
    pub promoted: bool,
}

impl TeamStanding {
    fn new(team: &str) -> Self {
        Self {
            team: team.to_string(),
            ..Self::default()
        }
    }

    pub fn goal_difference(&self) -> i64 {
        let goals_for = i64::try_from(self.goals_for).unwrap_or(i64::MAX);
        let goals_against = i64::try_from(self.goals_against).unwrap_or(i64::MAX);
        goals_for.saturating_sub(goals_against)
    }

    fn add(&mut self, m: &MatchRecord) {
        self.goals_for += u64::from(m.score);
        self.goals_against += u64::from(m.opponent_score);
        self.played += 1;

        let outcome = m.outcome();
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::Lose => self.losses += 1,
        }

        // Without stage information every match earns points.
        let counts_for_points = match m.competition.stage() {
            Some(_) => m.competition.is_group_stage(),
            None => true,
        };
        if counts_for_points {
            self.points += match outcome {
                Outcome::Win => WIN_POINTS,
                Outcome::Draw => DRAW_POINTS,
                Outcome::Lose => 0,
            };
        }

        if m.competition.is_group_stage() {
            if self.group.is_none() {
                self.group = m.competition.group_label().map(str::to_string);
            }
        } else if m.competition.stage().is_some() {
            self.promoted = true;
        }
    }
}

/// Ranking keys for a standings table, all descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankPolicy {
    /// wins, draws, losses
    #[default]
    Record,
    /// wins, draws, losses, goals for
    RecordThenGoals,
    /// points, goal difference, goals for
    Points,
}

impl RankPolicy {
    pub fn compare(self, a: &TeamStanding, b: &TeamStanding) -> Ordering {
        match self {
            RankPolicy::Record => (b.wins, b.draws, b.losses).cmp(&(a.wins, a.draws, a.losses)),
            RankPolicy::RecordThenGoals => (b.wins, b.draws, b.losses, b.goals_for)
                .cmp(&(a.wins, a.draws, a.losses, a.goals_for)),
            RankPolicy::Points => (b.points, b.goal_difference(), b.goals_for).cmp(&(
                a.points,
                a.goal_difference(),
                a.goals_for,
            )),
        }
    }
}

/// One row per distinct `team`. Expects both orientations of every fixture
/// in `records`; teams tied on every key keep first-seen order.
pub fn aggregate<'a>(
    records: impl IntoIterator<Item = &'a MatchRecord>,
    policy: RankPolicy,
) -> Vec<TeamStanding> {
    let mut rows: Vec<TeamStanding> = Vec::new();
    let mut slot: HashMap<String, usize> = HashMap::new();
    for m in records {
        let idx = *slot.entry(m.team.clone()).or_insert_with(|| {
            rows.push(TeamStanding::new(&m.team));
            rows.len() - 1
        });
        rows[idx].add(m);
    }
    rows.sort_by(|a, b| policy.compare(a, b));
    rows
}

/// Partitions by calendar year and ranks each season on its own.
pub fn season_tables<'a>(
    records: impl IntoIterator<Item = &'a MatchRecord>,
    policy: RankPolicy,
) -> BTreeMap<i32, Vec<TeamStanding>> {
    let mut seasons: BTreeMap<i32, Vec<&MatchRecord>> = BTreeMap::new();
    for m in records {
        seasons.entry(m.year()).or_default().push(m);
    }
    seasons
        .into_iter()
        .map(|(year, matches)| (year, aggregate(matches, policy)))
        .collect()
}

/// Year window selection, newest first.
///
/// `span == 0` keeps `year >= anchor`; a positive span keeps
/// `anchor <= year < anchor + span`; a negative span keeps
/// `anchor + span < year <= anchor`.
pub fn select_years(years: impl IntoIterator<Item = i32>, anchor: i32, span: i32) -> Vec<i32> {
    let mut out = years
        .into_iter()
        .filter(|&year| match span.cmp(&0) {
            Ordering::Equal => year >= anchor,
            Ordering::Greater => year >= anchor && year < anchor.saturating_add(span),
            Ordering::Less => year > anchor.saturating_add(span) && year <= anchor,
        })
        .collect::<Vec<_>>();
    out.sort_unstable_by(|a, b| b.cmp(a));
    out.dedup();
    out
}
