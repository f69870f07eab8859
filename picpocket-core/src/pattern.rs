//! Dynamic directory patterns for incremental task runs.
//!
//! A pattern is an ordered list of parts, one per directory level below a
//! task's source root. Literal parts must equal the directory name; matcher
//! parts parse the name and decide, using the date of the task's last run,
//! whether the subtree can contain anything new. Parameters produced by a
//! part are visible to every part after it.
//!
//! Serialized form: parts joined with `/`, matchers written as `{name}` or
//! `{name:argument}`, literals containing `{` escaped as `{str:literal}`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::format::{Item, Parsed, StrftimeItems};
use chrono::{DateTime, Datelike, Local, NaiveDate};
use regex::Regex;

use crate::error::PatternError;

/// Recognizes `{name}` and `{name:argument}` segments.
static SEGMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\{(\w+)(?::(.*?))?\}$").expect("Invalid path segment regex")
});

/// A value produced by a matcher for the parts below it.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Text(String),
    DateTime(DateTime<Local>),
}

impl ParamValue {
    /// Integer view of the value. Text is parsed, so regex captures like
    /// `(?P<month>\d+)` feed the date matchers.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Text(text) => text.trim().parse().ok(),
            Self::DateTime(_) => None,
        }
    }
}

/// New parameters returned by a successful match.
pub type Params = BTreeMap<String, ParamValue>;

/// Parameters accumulated while descending a directory tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchParams {
    /// When the task last completed. `None` means everything is new.
    pub last_ran: Option<DateTime<Local>>,
    values: Params,
}

impl MatchParams {
    pub fn new(last_ran: Option<DateTime<Local>>) -> Self {
        Self {
            last_ran,
            values: Params::new(),
        }
    }

    pub fn with(mut self, key: &str, value: ParamValue) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn values(&self) -> &Params {
        &self.values
    }

    /// Parameters for a child directory: these plus `new`, with `new` winning.
    pub fn merged(&self, new: Params) -> Self {
        let mut merged = self.clone();
        merged.values.extend(new);
        merged
    }

    fn int(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(ParamValue::as_int)
    }
}

// ── Path parts ──────────────────────────────────────────────────────────────

/// One element of a path pattern.
#[derive(Debug, Clone)]
pub enum PathPart {
    /// Directory name must match exactly.
    Literal(String),
    /// Integer year.
    Year,
    /// Integer month, 1–12.
    Month,
    /// Integer day, 1–31.
    Day,
    /// Whole directory name parsed with a strftime-style format.
    Date(String),
    /// Directory name searched with a regex; named groups become parameters.
    Regex(Regex),
}

impl PartialEq for PathPart {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Year, Self::Year) | (Self::Month, Self::Month) | (Self::Day, Self::Day) => true,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Regex(a), Self::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl PathPart {
    /// Build a `Date` part, rejecting formats chrono cannot interpret.
    pub fn date(format: &str) -> Result<Self, PatternError> {
        if format.is_empty() || StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err(PatternError::InvalidDateFormat(format.to_string()));
        }
        Ok(Self::Date(format.to_string()))
    }

    /// Build a `Regex` part.
    pub fn regex(pattern: &str) -> Result<Self, PatternError> {
        let regex = Regex::new(pattern).map_err(|source| PatternError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self::Regex(regex))
    }

    /// The name used in the serialized form.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Literal(_) => "str",
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Date(_) => "date",
            Self::Regex(_) => "regex",
        }
    }

    /// Check a directory name against this part.
    ///
    /// Returns `None` when the subtree should be pruned, otherwise the
    /// parameters to merge in for the directories below it.
    pub fn matches(&self, directory: &str, params: &MatchParams) -> Option<Params> {
        match self {
            Self::Literal(literal) => (literal == directory).then(Params::new),
            Self::Year => {
                let year: i64 = directory.parse().ok()?;
                if let Some(last_ran) = params.last_ran
                    && precedes(
                        last_ran.date_naive(),
                        year,
                        params.int("month"),
                        params.int("day"),
                    )
                {
                    return None;
                }
                Some(single("year", ParamValue::Int(year)))
            }
            Self::Month => {
                let month: i64 = directory.parse().ok()?;
                if !(1..=12).contains(&month) {
                    return None;
                }
                // Without a year there is nothing to compare against yet.
                if let Some(last_ran) = params.last_ran
                    && let Some(year) = params.int("year")
                    && precedes(last_ran.date_naive(), year, Some(month), params.int("day"))
                {
                    return None;
                }
                Some(single("month", ParamValue::Int(month)))
            }
            Self::Day => {
                let day: i64 = directory.parse().ok()?;
                if !(1..=31).contains(&day) {
                    return None;
                }
                if let Some(last_ran) = params.last_ran
                    && let Some(year) = params.int("year")
                    && let Some(month) = params.int("month")
                    && precedes(last_ran.date_naive(), year, Some(month), Some(day))
                {
                    return None;
                }
                Some(single("day", ParamValue::Int(day)))
            }
            Self::Date(format) => {
                let date = parse_local(directory, format)?;
                if let Some(last_ran) = params.last_ran
                    && date < last_ran
                {
                    return None;
                }
                Some(single("date", ParamValue::DateTime(date)))
            }
            Self::Regex(regex) => {
                let captures = regex.captures(directory)?;
                let found = regex
                    .capture_names()
                    .flatten()
                    .filter_map(|name| {
                        captures
                            .name(name)
                            .map(|m| (name.to_string(), ParamValue::Text(m.as_str().to_string())))
                    })
                    .collect();
                Some(found)
            }
        }
    }
}

impl fmt::Display for PathPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(literal) if literal.contains('{') => write!(f, "{{str:{}}}", literal),
            Self::Literal(literal) => write!(f, "{}", literal),
            Self::Date(format) => write!(f, "{{date:{}}}", format),
            Self::Regex(regex) => write!(f, "{{regex:{}}}", regex.as_str()),
            other => write!(f, "{{{}}}", other.name()),
        }
    }
}

fn single(key: &str, value: ParamValue) -> Params {
    Params::from([(key.to_string(), value)])
}

/// Whether the (year[, month[, day]]) composite falls strictly before
/// `last_ran` truncated to the same precision. A day only counts when the
/// month is known.
fn precedes(last_ran: NaiveDate, year: i64, month: Option<i64>, day: Option<i64>) -> bool {
    let last_year = i64::from(last_ran.year());
    let last_month = i64::from(last_ran.month());
    let last_day = i64::from(last_ran.day());

    match (month, day) {
        (Some(month), Some(day)) => (year, month, day) < (last_year, last_month, last_day),
        (Some(month), None) => (year, month) < (last_year, last_month),
        (None, _) => year < last_year,
    }
}

/// Parse a directory name as a local timestamp. Fields the format leaves
/// out default to the start of their range: month and day to 1, time of
/// day to midnight.
fn parse_local(directory: &str, format: &str) -> Option<DateTime<Local>> {
    let mut parsed = Parsed::new();
    chrono::format::parse(&mut parsed, directory, StrftimeItems::new(format)).ok()?;

    // Setters refuse to overwrite a parsed value, so failures here mean the
    // field was already present.
    let _ = parsed.set_month(1);
    let _ = parsed.set_day(1);
    let _ = parsed.set_hour(0);
    let _ = parsed.set_minute(0);
    let _ = parsed.set_second(0);

    let naive = parsed.to_naive_datetime_with_offset(0).ok()?;
    naive.and_local_timezone(Local).earliest()
}

// ── Patterns ────────────────────────────────────────────────────────────────

/// An ordered sequence of path parts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathPattern {
    parts: Vec<PathPart>,
}

impl PathPattern {
    pub fn new(parts: Vec<PathPart>) -> Self {
        Self { parts }
    }

    pub fn parts(&self) -> &[PathPart] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Deserialize a pattern. The empty string is the empty pattern.
    pub fn parse(serialized: &str) -> Result<Self, PatternError> {
        if serialized.is_empty() {
            return Ok(Self::default());
        }
        let parts = serialized
            .split('/')
            .map(parse_segment)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { parts })
    }
}

impl FromStr for PathPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

fn parse_segment(segment: &str) -> Result<PathPart, PatternError> {
    let Some(captures) = SEGMENT_REGEX.captures(segment) else {
        return Ok(PathPart::Literal(segment.to_string()));
    };

    let name = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    let argument = captures
        .get(2)
        .map(|m| m.as_str())
        .filter(|argument| !argument.is_empty());

    match (name, argument) {
        ("str", Some(literal)) => Ok(PathPart::Literal(literal.to_string())),
        ("year", None) => Ok(PathPart::Year),
        ("month", None) => Ok(PathPart::Month),
        ("day", None) => Ok(PathPart::Day),
        ("date", Some(format)) => PathPart::date(format),
        ("regex", Some(pattern)) => PathPart::regex(pattern),
        ("year" | "month" | "day", Some(_)) => Err(PatternError::UnexpectedArgument {
            name: name.to_string(),
            segment: segment.to_string(),
        }),
        ("str" | "date" | "regex", None) => Err(PatternError::MissingArgument {
            name: name.to_string(),
            segment: segment.to_string(),
        }),
        _ => Err(PatternError::UnknownPart(segment.to_string())),
    }
}

#[cfg(test)]
#[path = "tests/pattern_tests.rs"]
mod tests;
