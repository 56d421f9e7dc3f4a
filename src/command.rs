use std::fmt;
use std::str::FromStr;

use crate::error::HistoryError;

/// Output command selector accepted by the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Pipe dump of every loaded record in the selected years.
    Dump,
    /// Multi-season standings grid.
    Stat,
    /// Every match of one team.
    Find,
    /// Direct meetings and common opponents of two teams.
    Compare,
    /// Exact-match dump through the grouping indices.
    Filter,
    /// Load the source into the SQLite store.
    UpdateStore,
    /// Team lookup against the store.
    SearchMatch,
    /// Points-ranked season table read back from the store.
    Standings,
}

const COMMAND_TOKENS: &[(&str, Command)] = &[
    ("d", Command::Dump),
    ("dump", Command::Dump),
    ("s", Command::Stat),
    ("stat", Command::Stat),
    ("f", Command::Find),
    ("find", Command::Find),
    ("c", Command::Compare),
    ("compare", Command::Compare),
    ("l", Command::Filter),
    ("filter", Command::Filter),
    ("u", Command::UpdateStore),
    ("update-store", Command::UpdateStore),
    ("m", Command::SearchMatch),
    ("search-match", Command::SearchMatch),
    ("t", Command::Standings),
    ("standings", Command::Standings),
];

impl Command {
    pub fn tokens() -> impl Iterator<Item = &'static str> {
        COMMAND_TOKENS.iter().map(|(token, _)| *token)
    }

    pub fn name(self) -> &'static str {
        // The long token is listed right after the short one.
        COMMAND_TOKENS
            .iter()
            .filter(|(_, cmd)| *cmd == self)
            .map(|(token, _)| *token)
            .next_back()
            .unwrap_or("?")
    }

    /// Commands that read the flat source rather than the store.
    pub fn needs_source(self) -> bool {
        !matches!(self, Command::SearchMatch | Command::Standings)
    }
}

impl FromStr for Command {
    type Err = HistoryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let token = raw.trim().to_ascii_lowercase();
        COMMAND_TOKENS
            .iter()
            .find(|(name, _)| *name == token)
            .map(|(_, cmd)| *cmd)
            .ok_or_else(|| HistoryError::UnsupportedCommand(raw.to_string()))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_long_tokens_resolve() {
        assert_eq!("d".parse::<Command>().unwrap(), Command::Dump);
        assert_eq!("Compare".parse::<Command>().unwrap(), Command::Compare);
        assert_eq!("update-store".parse::<Command>().unwrap(), Command::UpdateStore);
    }

    #[test]
    fn unknown_token_is_rejected() {
        let err = "explode".parse::<Command>().unwrap_err();
        assert!(matches!(err, HistoryError::UnsupportedCommand(ref t) if t == "explode"));
    }

    #[test]
    fn names_are_long_tokens() {
        assert_eq!(Command::Stat.name(), "stat");
        assert_eq!(Command::SearchMatch.to_string(), "search-match");
        assert_eq!(Command::tokens().count(), 16);
    }
}
