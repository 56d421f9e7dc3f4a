use std::fmt;

use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Which side hosted the fixture, from the record's `team` point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Home,
    Away,
    Neutral,
}

impl Field {
    pub fn mirrored(self) -> Self {
        match self {
            Field::Home => Field::Away,
            Field::Away => Field::Home,
            Field::Neutral => Field::Neutral,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::Home => "home",
            Field::Away => "away",
            Field::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Lose,
    Draw,
}

impl Outcome {
    pub fn from_scores(score: u32, opponent_score: u32) -> Self {
        match score.cmp(&opponent_score) {
            std::cmp::Ordering::Greater => Outcome::Win,
            std::cmp::Ordering::Less => Outcome::Lose,
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    pub fn complement(self) -> Self {
        match self {
            Outcome::Win => Outcome::Lose,
            Outcome::Lose => Outcome::Win,
            Outcome::Draw => Outcome::Draw,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::Lose => "lose",
            Outcome::Draw => "draw",
        }
    }
}

/// Tournament phase. Ordinals are persisted by the store, keep the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStage {
    Group,
    Knock,
    Quarter,
    Semi,
    Third,
    Final,
}

const STAGE_TOKENS: &[(&str, MatchStage)] = &[
    ("group", MatchStage::Group),
    ("knock", MatchStage::Knock),
    ("round of 16", MatchStage::Knock),
    ("round-of-16", MatchStage::Knock),
    ("quarter", MatchStage::Quarter),
    ("quarter-final", MatchStage::Quarter),
    ("semi", MatchStage::Semi),
    ("semi-final", MatchStage::Semi),
    ("third", MatchStage::Third),
    ("third place", MatchStage::Third),
    ("third-place", MatchStage::Third),
    ("final", MatchStage::Final),
];

impl MatchStage {
    pub const ALL: [MatchStage; 6] = [
        MatchStage::Group,
        MatchStage::Knock,
        MatchStage::Quarter,
        MatchStage::Semi,
        MatchStage::Third,
        MatchStage::Final,
    ];

    /// Case-insensitive lookup in the stage token table.
    pub fn from_token(raw: &str) -> Option<Self> {
        let token = raw.trim().to_ascii_lowercase();
        STAGE_TOKENS
            .iter()
            .find(|(name, _)| *name == token)
            .map(|(_, stage)| *stage)
    }

    pub fn ordinal(self) -> i64 {
        self as i64
    }

    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    pub fn label(self) -> &'static str {
        match self {
            MatchStage::Group => "Group",
            MatchStage::Knock => "Knock",
            MatchStage::Quarter => "Quarter",
            MatchStage::Semi => "Semi",
            MatchStage::Third => "Third",
            MatchStage::Final => "Final",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Competition {
    /// Tournament-history rows: a fixed stage, plus the group letter for group games.
    Stage {
        stage: MatchStage,
        group: Option<String>,
    },
    /// Team-record rows: free-text competition name ("Friendly", "FIFA World Cup").
    Named(String),
}

impl Competition {
    pub fn group(label: impl Into<String>) -> Self {
        Competition::Stage {
            stage: MatchStage::Group,
            group: Some(label.into()),
        }
    }

    pub fn stage(&self) -> Option<MatchStage> {
        match self {
            Competition::Stage { stage, .. } => Some(*stage),
            Competition::Named(_) => None,
        }
    }

    pub fn group_label(&self) -> Option<&str> {
        match self {
            Competition::Stage { group, .. } => group.as_deref(),
            Competition::Named(_) => None,
        }
    }

    pub fn is_group_stage(&self) -> bool {
        self.stage() == Some(MatchStage::Group)
    }

    /// The value written to dumps and used as the competition index key.
    pub fn label(&self) -> &str {
        match self {
            Competition::Stage {
                group: Some(group), ..
            } => group,
            Competition::Stage { stage, .. } => stage.label(),
            Competition::Named(name) => name,
        }
    }
}

/// One team's view of a fixture.
///
/// Tournament-history records keep stadium and venue in the two location
/// slots; team-record rows keep city and country there instead. Use
/// [`MatchRecord::city`] and [`MatchRecord::country`] rather than reading the
/// slots directly when the layout matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub date_text: String,
    pub date: NaiveDateTime,
    pub team: String,
    pub opponent: String,
    pub score: u32,
    pub opponent_score: u32,
    pub competition: Competition,
    pub stadium: String,
    pub venue: String,
    pub field: Field,
}

impl MatchRecord {
    pub fn outcome(&self) -> Outcome {
        Outcome::from_scores(self.score, self.opponent_score)
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn goal_difference(&self) -> i64 {
        i64::from(self.score) - i64::from(self.opponent_score)
    }

    pub fn is_tournament_history(&self) -> bool {
        matches!(self.competition, Competition::Stage { .. })
    }

    pub fn city(&self) -> Option<&str> {
        if self.is_tournament_history() {
            Some(self.venue.as_str())
        } else {
            Some(self.stadium.as_str())
        }
    }

    pub fn country(&self) -> Option<&str> {
        if self.is_tournament_history() {
            None
        } else {
            Some(self.venue.as_str())
        }
    }

    /// The opponent's view of the same fixture.
    pub fn reverse(&self) -> MatchRecord {
        MatchRecord {
            date_text: self.date_text.clone(),
            date: self.date,
            team: self.opponent.clone(),
            opponent: self.team.clone(),
            score: self.opponent_score,
            opponent_score: self.score,
            competition: self.competition.clone(),
            stadium: self.stadium.clone(),
            venue: self.venue.clone(),
            field: self.field.mirrored(),
        }
    }

    /// Per-orientation identity: sha256 over the raw date text and the team.
    pub fn identity(&self) -> String {
        identity_key(&self.date_text, &self.team)
    }
}

pub fn identity_key(date_text: &str, team: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(date_text.as_bytes());
    hasher.update(team.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl fmt::Display for MatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}|{}|{}|{}|{}",
            self.date.format("%Y-%m-%d"),
            self.team,
            self.opponent,
            self.score,
            self.opponent_score,
            self.competition.label(),
            self.stadium,
            self.venue
        )?;
        if !self.is_tournament_history() {
            write!(f, "|{}|{}", self.field.name(), self.outcome().name())?;
        }
        Ok(())
    }
}
