use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use log::{debug, info};

use crate::error::{HistoryError, HistoryResult};
use crate::match_record::MatchRecord;
use crate::parser::{self, Layout};

/// Record attributes that carry a grouping index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterField {
    Team,
    Competition,
    City,
    Country,
}

type Accessor = fn(&MatchRecord) -> Option<&str>;

struct FilterSpec {
    field: FilterField,
    token: &'static str,
    accessor: Accessor,
}

const FILTER_FIELDS: &[FilterSpec] = &[
    FilterSpec {
        field: FilterField::Team,
        token: "team",
        accessor: team_of,
    },
    FilterSpec {
        field: FilterField::Competition,
        token: "competition",
        accessor: competition_of,
    },
    FilterSpec {
        field: FilterField::City,
        token: "city",
        accessor: city_of,
    },
    FilterSpec {
        field: FilterField::Country,
        token: "country",
        accessor: country_of,
    },
];

fn team_of(m: &MatchRecord) -> Option<&str> {
    Some(m.team.as_str())
}

fn competition_of(m: &MatchRecord) -> Option<&str> {
    Some(m.competition.label())
}

fn city_of(m: &MatchRecord) -> Option<&str> {
    m.city()
}

fn country_of(m: &MatchRecord) -> Option<&str> {
    m.country()
}

impl FilterField {
    pub const ALL: [FilterField; 4] = [
        FilterField::Team,
        FilterField::Competition,
        FilterField::City,
        FilterField::Country,
    ];

    // Table rows follow the enum declaration order.
    fn spec(self) -> &'static FilterSpec {
        &FILTER_FIELDS[self as usize]
    }

    pub fn from_token(raw: &str) -> Option<Self> {
        FILTER_FIELDS
            .iter()
            .find(|spec| spec.token.eq_ignore_ascii_case(raw.trim()))
            .map(|spec| spec.field)
    }

    pub fn name(self) -> &'static str {
        self.spec().token
    }

    pub fn accessor(self) -> Accessor {
        self.spec().accessor
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Detected from the first data line when unset.
    pub layout: Option<Layout>,
    /// Detected from the first non-blank line when unset.
    pub delimiter: Option<char>,
}

/// Every loaded fixture in both orientations, plus per-field indices into it.
///
/// Built once per run and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct MatchCorpus {
    records: Vec<MatchRecord>,
    indices: HashMap<FilterField, BTreeMap<String, Vec<usize>>>,
    duplicates: usize,
}

impl MatchCorpus {
    /// Dedups by identity (first wins), adds each reverse, then orders the
    /// result newest year first and chronologically within a year.
    pub fn from_records(raw: impl IntoIterator<Item = MatchRecord>) -> Self {
        let mut seen = HashSet::new();
        let mut records = Vec::new();
        let mut duplicates = 0usize;

        for record in raw {
            if !seen.insert(record.identity()) {
                debug!(
                    "skipping duplicate fixture {} {} vs {}",
                    record.date_text, record.team, record.opponent
                );
                duplicates += 1;
                continue;
            }
            let reverse = record.reverse();
            seen.insert(reverse.identity());
            records.push(record);
            records.push(reverse);
        }

        records.sort_by(|a, b| b.year().cmp(&a.year()).then(a.date.cmp(&b.date)));

        let mut indices: HashMap<FilterField, BTreeMap<String, Vec<usize>>> = HashMap::new();
        for field in FilterField::ALL {
            let accessor = field.accessor();
            let index = indices.entry(field).or_default();
            for (pos, record) in records.iter().enumerate() {
                if let Some(value) = accessor(record) {
                    index.entry(value.to_string()).or_default().push(pos);
                }
            }
        }

        info!(
            "loaded {} fixtures ({} records, {} duplicates skipped)",
            records.len() / 2,
            records.len(),
            duplicates
        );

        Self {
            records,
            indices,
            duplicates,
        }
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn duplicates_skipped(&self) -> usize {
        self.duplicates
    }

    pub fn years(&self) -> Vec<i32> {
        self.records
            .iter()
            .map(MatchRecord::year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn keys(&self, field: FilterField) -> impl Iterator<Item = &str> {
        self.indices
            .get(&field)
            .into_iter()
            .flat_map(|index| index.keys().map(String::as_str))
    }

    /// Exact lookup in one grouping index.
    pub fn lookup(&self, field: FilterField, value: &str) -> HistoryResult<Vec<&MatchRecord>> {
        let positions = self
            .indices
            .get(&field)
            .and_then(|index| index.get(value))
            .ok_or_else(|| self.unknown(field, value))?;
        Ok(positions.iter().map(|&pos| &self.records[pos]).collect())
    }

    /// Fails unless at least one key of `field` contains `query`.
    pub fn require_substring(&self, field: FilterField, query: &str) -> HistoryResult<()> {
        if self.keys(field).any(|key| key.contains(query)) {
            Ok(())
        } else {
            Err(self.unknown(field, query))
        }
    }

    /// Keys containing `value` (case-insensitive); failing that, keys that
    /// contain its characters in order.
    pub fn suggest(&self, field: FilterField, value: &str) -> Vec<String> {
        let needle = value.to_lowercase();
        let contains = self
            .keys(field)
            .filter(|key| key.to_lowercase().contains(&needle))
            .map(str::to_string)
            .collect::<Vec<_>>();
        if !contains.is_empty() || needle.is_empty() {
            return contains;
        }
        self.keys(field)
            .filter(|key| is_subsequence(&needle, &key.to_lowercase()))
            .map(str::to_string)
            .collect()
    }

    fn unknown(&self, field: FilterField, value: &str) -> HistoryError {
        HistoryError::UnknownFilterValue {
            field: field.name(),
            value: value.to_string(),
            suggestions: self.suggest(field, value),
        }
    }

    /// The first criterion goes through its index; the rest narrow by
    /// exact equality, then the optional year.
    pub fn filter(
        &self,
        criteria: &[(FilterField, &str)],
        year: Option<i32>,
    ) -> HistoryResult<Vec<&MatchRecord>> {
        let mut out = match criteria.split_first() {
            None => self.records.iter().collect::<Vec<_>>(),
            Some(((field, value), rest)) => {
                let mut out = self.lookup(*field, value)?;
                for (field, value) in rest {
                    let accessor = field.accessor();
                    out.retain(|m| accessor(m) == Some(*value));
                }
                out
            }
        };
        if let Some(year) = year {
            out.retain(|m| m.year() == year);
        }
        Ok(out)
    }
}

/// Reads a whole flat source. Aborts on the first malformed line.
pub fn load_lines<'a>(
    lines: impl IntoIterator<Item = &'a str>,
    options: LoadOptions,
) -> HistoryResult<MatchCorpus> {
    let mut delimiter = options.delimiter;
    let mut resolved = options.layout;
    let mut first = true;
    let mut raw = Vec::new();

    for (idx, line) in lines.into_iter().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let delim = *delimiter.get_or_insert_with(|| parser::detect_delimiter(line));
        if std::mem::take(&mut first) && parser::is_header(line, delim) {
            debug!("skipping header row at line {line_no}");
            continue;
        }
        let layout = match resolved {
            Some(layout) => layout,
            None => {
                let count = parser::split_fields(line, delim).len();
                let detected = Layout::from_field_count(count).ok_or_else(|| {
                    HistoryError::malformed(
                        line_no,
                        line,
                        format!("unrecognized layout with {count} fields"),
                    )
                })?;
                resolved = Some(detected);
                detected
            }
        };
        raw.push(parser::parse_line(line_no, line, layout, delim)?);
    }

    Ok(MatchCorpus::from_records(raw))
}

pub fn load_text(text: &str, options: LoadOptions) -> HistoryResult<MatchCorpus> {
    load_lines(text.lines(), options)
}

fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut hay = haystack.chars();
    needle.chars().all(|c| hay.any(|h| h == c))
}
