use thiserror::Error;

/// Failures raised by the parsing, loading and lookup layers.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("malformed record at line {line_no}: {reason} (`{line}`)")]
    MalformedRecord {
        line_no: usize,
        line: String,
        reason: String,
    },
    #[error("source '{source_name}' not found: {reason}")]
    SourceNotFound { source_name: String, reason: String },
    #[error("no {field} matches '{value}'{}", format_suggestions(.suggestions))]
    UnknownFilterValue {
        field: &'static str,
        value: String,
        suggestions: Vec<String>,
    },
    #[error("unsupported command '{0}'")]
    UnsupportedCommand(String),
}

impl HistoryError {
    pub(crate) fn malformed(line_no: usize, line: &str, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            line_no,
            line: line.to_string(),
            reason: reason.into(),
        }
    }

    pub fn suggestions(&self) -> &[String] {
        match self {
            Self::UnknownFilterValue { suggestions, .. } => suggestions,
            _ => &[],
        }
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(", maybe < {} >", suggestions.join(" | "))
    }
}

pub type HistoryResult<T> = std::result::Result<T, HistoryError>;

/// Usage-level failures share clap's usage exit code.
pub const EXIT_USAGE: u8 = 2;
pub const EXIT_FAILURE: u8 = 1;

/// Process exit status for a failed run. Looks through any `context`
/// layers for an unknown filter value.
pub fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<HistoryError>() {
        Some(HistoryError::UnknownFilterValue { .. }) => EXIT_USAGE,
        _ => EXIT_FAILURE,
    }
}
