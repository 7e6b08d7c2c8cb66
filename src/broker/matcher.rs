//! Wildcard matching
//!
//! Two wildcard forms are understood, both evaluated against a snapshot of
//! topic names:
//!
//! - multilevel `prefix/#`: every name that starts with `prefix/`
//! - single-level `front+back` (exactly one `+`): every name that starts with
//!   `front` and ends with `back`
//!
//! Matching is a literal prefix/suffix comparison. `/` gets no special
//! treatment, so `A/+/Z` also matches `A/B/C/Z` and `A/Z`. The prefix and
//! suffix are checked independently and may share characters of the name.
//!
//! Anything else is an exact topic name and is left to the caller.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicFilter<'a> {
    MultiLevel { prefix: &'a str },
    SingleLevel { front: &'a str, back: &'a str },
    Exact(&'a str),
}

impl<'a> TopicFilter<'a> {
    pub fn parse(pattern: &'a str) -> Self {
        if pattern.ends_with("/#") {
            // keep the trailing '/' so "A/#" never matches "A" itself
            return TopicFilter::MultiLevel {
                prefix: &pattern[..pattern.len() - 1],
            };
        }
        if pattern.matches('+').count() == 1 {
            if let Some((front, back)) = pattern.split_once('+') {
                return TopicFilter::SingleLevel { front, back };
            }
        }
        TopicFilter::Exact(pattern)
    }

    pub fn matches(&self, name: &str) -> bool {
        match *self {
            TopicFilter::MultiLevel { prefix } => name.starts_with(prefix),
            TopicFilter::SingleLevel { front, back } => {
                name.starts_with(front) && name.ends_with(back)
            }
            TopicFilter::Exact(exact) => name == exact,
        }
    }

    /// Every name in `names` accepted by this filter, sorted and without duplicates.
    pub fn expand<'n, I>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'n str>,
    {
        names
            .into_iter()
            .filter(|name| self.matches(name))
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Names matched by a multilevel pattern such as `A/#`.
pub fn multilevel_topics<'n, I>(pattern: &str, names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'n str>,
{
    match TopicFilter::parse(pattern) {
        filter @ TopicFilter::MultiLevel { .. } => filter.expand(names),
        _ => Vec::new(),
    }
}

/// Names matched by a single-level pattern such as `A/+/Z`.
pub fn singlelevel_topics<'n, I>(pattern: &str, names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'n str>,
{
    match TopicFilter::parse(pattern) {
        filter @ TopicFilter::SingleLevel { .. } => filter.expand(names),
        _ => Vec::new(),
    }
}
