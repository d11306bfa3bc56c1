//! Result filters
//!
//! Keyword matching on post and comment text, the set of users a run looks
//! for, and the `dd.mm.yyyy` date cutoff accepted on the command line.

use crate::error::{Error, Result};
use crate::pagination::DateCutoff;
use crate::types::Group;
use chrono::{NaiveDate, TimeZone, Utc};
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

/// Date format accepted by `--date`
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Parse a `dd.mm.yyyy` date into a cutoff at midnight UTC
pub fn parse_cutoff(input: &str) -> Result<DateCutoff> {
    let date = NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|e| Error::invalid_value("date", format!("'{input}' is not dd.mm.yyyy: {e}")))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| Error::invalid_value("date", format!("'{input}' has no midnight")))?;
    Ok(DateCutoff::new(Utc.from_utc_datetime(&midnight)))
}

/// Groups whose wall can be read without membership
pub fn public_groups(groups: Vec<Group>) -> Vec<Group> {
    groups.into_iter().filter(Group::is_public).collect()
}

/// Whole-word, case-insensitive keyword matcher
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    patterns: Vec<(String, Regex)>,
}

impl KeywordMatcher {
    /// Compile one pattern per non-blank keyword.
    ///
    /// Keywords are matched literally; regex metacharacters are escaped.
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim();
            if keyword.is_empty() {
                continue;
            }
            let regex = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(keyword)))
                .case_insensitive(true)
                .build()
                .map_err(|e| Error::invalid_value("keywords", e.to_string()))?;
            patterns.push((keyword.to_string(), regex));
        }
        Ok(Self { patterns })
    }

    /// Whether no keywords were configured
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// First keyword found in `text`
    pub fn first_match(&self, text: &str) -> Option<&str> {
        if text.is_empty() {
            return None;
        }
        self.patterns
            .iter()
            .find(|(_, regex)| regex.is_match(text))
            .map(|(keyword, _)| keyword.as_str())
    }

    /// Whether any keyword occurs in `text`
    pub fn is_match(&self, text: &str) -> bool {
        self.first_match(text).is_some()
    }
}

/// Users a run is looking for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserIdSet {
    ids: HashSet<i64>,
}

impl UserIdSet {
    /// Collect ids
    pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// Whether `id` is one of the users
    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    /// Number of users
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
