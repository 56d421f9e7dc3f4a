use std::fs;
use std::path::Path;

use log::info;

use crate::error::{HistoryError, HistoryResult};
use crate::http_client::http_client;

/// Where a flat match file comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(String),
    Url(String),
}

impl Source {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Source::Url(trimmed.to_string())
        } else {
            Source::File(trimmed.to_string())
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Source::File(path) | Source::Url(path) => path,
        }
    }

    /// Whole-source read. Any failure is reported as `SourceNotFound`
    /// before a single line is parsed.
    pub fn read(&self, timeout_secs: u64) -> HistoryResult<String> {
        let text = match self {
            Source::File(path) => read_file(Path::new(path))?,
            Source::Url(url) => fetch_url(url, timeout_secs)?,
        };
        info!("read {} bytes from {}", text.len(), self.name());
        Ok(text)
    }
}

fn read_file(path: &Path) -> HistoryResult<String> {
    if !path.is_file() {
        return Err(not_found(&path.display().to_string(), "no such file"));
    }
    fs::read_to_string(path).map_err(|err| not_found(&path.display().to_string(), err))
}

fn fetch_url(url: &str, timeout_secs: u64) -> HistoryResult<String> {
    let client = http_client(timeout_secs).map_err(|err| not_found(url, err))?;
    let resp = client.get(url).send().map_err(|err| not_found(url, err))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(not_found(url, format!("http status {status}")));
    }
    resp.text().map_err(|err| not_found(url, err))
}

fn not_found(name: &str, reason: impl ToString) -> HistoryError {
    HistoryError::SourceNotFound {
        source_name: name.to_string(),
        reason: reason.to_string(),
    }
}
