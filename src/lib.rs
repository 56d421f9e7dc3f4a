pub mod command;
pub mod compare;
pub mod config;
pub mod error;
pub mod http_client;
pub mod loader;
pub mod match_record;
pub mod parser;
pub mod report;
pub mod source;
pub mod standings;
pub mod store;

pub use error::{HistoryError, HistoryResult};
pub use loader::{FilterField, LoadOptions, MatchCorpus};
pub use match_record::{Competition, Field, MatchRecord, MatchStage, Outcome};
