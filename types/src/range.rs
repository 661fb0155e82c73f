use std::fmt;

use crate::Error;

/// A closed integer interval `[start, end]`. Endpoints are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Range {
    pub start: i64,
    pub end: i64,
}

impl Range {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn point(value: i64) -> Self {
        Self { start: value, end: value }
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= self.start && value <= self.end
    }

    /// Returns the intersection of `self` and `other`, or `None` if they
    /// don't overlap.
    pub fn overlap(&self, other: &Range) -> Option<Range> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start <= end {
            Some(Range { start, end })
        } else {
            None
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Formats a sequence of ranges as `"a,b-c,d"`.
pub fn format_ranges(ranges: &[Range]) -> String {
    ranges
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Parses a comma-separated list of `a` or `a-b` tokens into an ordered
/// sequence of [`Range`]. Fails naming the offending token.
pub fn parse_ranges(s: &str) -> Result<Vec<Range>, Error> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    s.split(',')
        .map(|token| parse_token(token.trim()))
        .collect()
}

fn parse_token(token: &str) -> Result<Range, Error> {
    let bad = || Error::RangeParse(token.to_string());
    if token.is_empty() {
        return Err(bad());
    }
    match token.split_once('-') {
        Some((a, b)) => {
            let start: i64 = a.trim().parse().map_err(|_| bad())?;
            let end: i64 = b.trim().parse().map_err(|_| bad())?;
            if start > end {
                return Err(bad());
            }
            Ok(Range::new(start, end))
        }
        None => {
            let value: i64 = token.parse().map_err(|_| bad())?;
            Ok(Range::point(value))
        }
    }
}
