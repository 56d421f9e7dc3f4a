use std::collections::{BTreeSet, HashSet};

use crate::match_record::{MatchRecord, identity_key};

#[derive(Debug, Clone, Default)]
pub struct Comparison {
    pub direct: Vec<MatchRecord>,
    pub common: Vec<MatchRecord>,
    /// Sorted ascending.
    pub common_opponents: Vec<String>,
}

impl Comparison {
    /// Direct meetings first, then the common-opponent block.
    pub fn rows(&self) -> impl Iterator<Item = &MatchRecord> {
        self.direct.iter().chain(self.common.iter())
    }

    pub fn len(&self) -> usize {
        self.direct.len() + self.common.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Head-to-head view of `team` and `opponent` over the selected years.
///
/// Names match by substring, so a partial query can cover several real
/// teams.
pub fn compare(records: &[MatchRecord], team: &str, opponent: &str, years: &[i32]) -> Comparison {
    let in_years = |m: &&MatchRecord| years.contains(&m.year());
    let either = |name: &str| name.contains(team) || name.contains(opponent);

    let direct = records
        .iter()
        .filter(in_years)
        .filter(|m| m.team.contains(team) && m.opponent.contains(opponent))
        .cloned()
        .collect::<Vec<_>>();

    let faced_by = |query: &str| {
        records
            .iter()
            .filter(in_years)
            .filter(|m| m.team.contains(query) && !either(&m.opponent))
            .map(|m| m.opponent.as_str())
            .collect::<BTreeSet<_>>()
    };
    let team_opponents = faced_by(team);
    let opponent_opponents = faced_by(opponent);
    let shared = team_opponents
        .intersection(&opponent_opponents)
        .copied()
        .collect::<BTreeSet<_>>();

    let mut common = records
        .iter()
        .filter(in_years)
        .filter(|m| either(&m.team) && shared.contains(m.opponent.as_str()))
        .cloned()
        .collect::<Vec<_>>();
    common.sort_by(|a, b| b.year().cmp(&a.year()).then(b.opponent.cmp(&a.opponent)));

    Comparison {
        direct,
        common,
        common_opponents: shared.into_iter().map(str::to_string).collect(),
    }
}

/// Every match of a team in the selected years, from its own side.
///
/// The loaded records hold both orientations of each fixture, so keeping
/// the rows whose `team` matches is enough. A fixture whose two names both
/// match is reported once, in the first orientation met.
pub fn find_team(records: &[MatchRecord], team: &str, years: &[i32]) -> Vec<MatchRecord> {
    let mut reported = HashSet::new();
    records
        .iter()
        .filter(|m| years.contains(&m.year()) && m.team.contains(team))
        .filter(|m| {
            reported.insert(identity_key(&m.date_text, &m.opponent));
            reported.insert(m.identity())
        })
        .cloned()
        .collect()
}
