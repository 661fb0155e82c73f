use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::Error;

/// A placement predicate over a single attribute value, parameterized by the
/// history of values already bound to that attribute by peer servers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Constraint {
    /// Matches iff value is not already present in history.
    Unique,
    /// If `expected` is set, matches iff `value == expected` — this is a pure
    /// equality check against the literal and never consults `history` (see
    /// SPEC_FULL.md §3a). If absent, matches iff history is empty or
    /// `value == history[0]`, pinning future placements to the first landed
    /// cluster.
    Cluster(Option<String>),
    /// Matches iff value fully matches `regex`.
    Like(#[serde(with = "regex_serde")] Regex),
    /// Matches iff value does not fully match `regex`.
    Unlike(#[serde(with = "regex_serde")] Regex),
    /// Matches iff fewer than `n` distinct groups exist yet in history, or
    /// adding this value preserves balance (this value's count in history is
    /// at or below the minimum group count — a brand-new group always
    /// qualifies).
    GroupBy(usize),
}

mod regex_serde {
    use regex::Regex;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(re: &Regex, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(re.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Regex, D::Error> {
        let s = String::deserialize(d)?;
        Regex::new(&s).map_err(serde::de::Error::custom)
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Constraint::Unique, Constraint::Unique) => true,
            (Constraint::Cluster(a), Constraint::Cluster(b)) => a == b,
            (Constraint::Like(a), Constraint::Like(b)) => a.as_str() == b.as_str(),
            (Constraint::Unlike(a), Constraint::Unlike(b)) => a.as_str() == b.as_str(),
            (Constraint::GroupBy(a), Constraint::GroupBy(b)) => a == b,
            _ => false,
        }
    }
}

impl Constraint {
    /// `history` is the ordered list of the same attribute's values across
    /// other servers in the cluster, taken at evaluation time.
    pub fn matches(&self, value: &str, history: &[String]) -> bool {
        match self {
            Constraint::Unique => !history.iter().any(|h| h == value),
            Constraint::Cluster(Some(expected)) => value == expected,
            Constraint::Cluster(None) => history.is_empty() || history[0] == value,
            Constraint::Like(re) => re.is_match(value) && full_match(re, value),
            Constraint::Unlike(re) => !(re.is_match(value) && full_match(re, value)),
            Constraint::GroupBy(n) => {
                let counts = group_counts(history);
                if counts.len() < *n {
                    return true;
                }
                let this_count = counts.get(value).copied().unwrap_or(0);
                let min_count = counts.values().copied().min().unwrap_or(0);
                this_count <= min_count
            }
        }
    }

    /// Canonical string form this constraint round-trips through.
    pub fn to_expr(&self) -> String {
        match self {
            Constraint::Unique => "unique".to_string(),
            Constraint::Cluster(None) => "cluster".to_string(),
            Constraint::Cluster(Some(v)) => format!("cluster:{v}"),
            Constraint::Like(re) => format!("like:{}", re.as_str()),
            Constraint::Unlike(re) => format!("unlike:{}", re.as_str()),
            Constraint::GroupBy(n) => {
                if *n == 1 {
                    "groupBy".to_string()
                } else {
                    format!("groupBy:{n}")
                }
            }
        }
    }
}

fn full_match(re: &Regex, value: &str) -> bool {
    re.find(value)
        .is_some_and(|m| m.start() == 0 && m.end() == value.len())
}

fn group_counts(history: &[String]) -> HashMap<&str, usize> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for h in history {
        *counts.entry(h.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Parses a single constraint expression: `unique`, `cluster[:value]`,
/// `like:<regex>`, `unlike:<regex>`, `groupBy[:<n>]`.
fn parse_expr(expr: &str) -> Result<Constraint, Error> {
    let bad = || Error::ConstraintParse(expr.to_string());
    let (kind, rest) = match expr.split_once(':') {
        Some((k, r)) => (k, Some(r)),
        None => (expr, None),
    };
    match kind {
        "unique" => Ok(Constraint::Unique),
        "cluster" => Ok(Constraint::Cluster(rest.map(|s| s.to_string()))),
        "like" => {
            let pattern = rest.ok_or_else(bad)?;
            Ok(Constraint::Like(Regex::new(pattern)?))
        }
        "unlike" => {
            let pattern = rest.ok_or_else(bad)?;
            Ok(Constraint::Unlike(Regex::new(pattern)?))
        }
        "groupBy" => match rest {
            None => Ok(Constraint::GroupBy(1)),
            Some(n) => {
                let n: usize = n.parse().map_err(|_| bad())?;
                Ok(Constraint::GroupBy(n))
            }
        },
        _ => Err(bad()),
    }
}

/// Parses a constraints spec: a comma-separated list `attr=expr,attr=expr,…`.
/// An empty/absent spec yields the empty mapping. Several constraints may
/// bind to the same attribute.
pub fn parse(spec: &str) -> Result<HashMap<String, Vec<Constraint>>, Error> {
    let mut out: HashMap<String, Vec<Constraint>> = HashMap::new();
    if spec.trim().is_empty() {
        return Ok(out);
    }
    for entry in spec.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (attr, expr) = entry
            .split_once('=')
            .ok_or_else(|| Error::ConstraintParse(entry.to_string()))?;
        let constraint = parse_expr(expr)?;
        out.entry(attr.to_string()).or_default().push(constraint);
    }
    Ok(out)
}

/// Formats a mapping back into its canonical `attr=expr,attr=expr,…` spec.
pub fn format(constraints: &HashMap<String, Vec<Constraint>>) -> String {
    let mut attrs: Vec<&String> = constraints.keys().collect();
    attrs.sort();
    attrs
        .into_iter()
        .flat_map(|attr| {
            constraints[attr]
                .iter()
                .map(move |c| format!("{attr}={}", c.to_expr()))
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_through_canonical_form() {
        let spec = "hostname=unique,rack=groupBy:2,dc=like:us-.*,zone=unlike:eu-.*,pool=cluster:a";
        let parsed = parse(spec).unwrap();
        let formatted = format(&parsed);
        let reparsed = parse(&formatted).unwrap();
        for (attr, constraints) in &parsed {
            assert_eq!(constraints, &reparsed[attr]);
        }
    }

    #[test]
    fn empty_spec_is_empty_map() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn unique_matches_iff_absent_from_history() {
        let c = Constraint::Unique;
        assert!(c.matches("h1", &[]));
        assert!(!c.matches("h1", &["h1".to_string()]));
        assert!(c.matches("h1", &["h2".to_string()]));
    }

    #[test]
    fn cluster_literal_ignores_history() {
        let c = Constraint::Cluster(Some("east".to_string()));
        assert!(c.matches("east", &["west".to_string()]));
        assert!(!c.matches("west", &[]));
    }

    #[test]
    fn cluster_pins_to_first_history_value() {
        let c = Constraint::Cluster(None);
        assert!(c.matches("east", &[]));
        assert!(c.matches("east", &["east".to_string()]));
        assert!(!c.matches("west", &["east".to_string()]));
    }

    #[test]
    fn like_requires_full_match() {
        let c = Constraint::Like(Regex::new("us-.*").unwrap());
        assert!(c.matches("us-east", &[]));
        assert!(!c.matches("eu-west", &[]));
    }

    #[test]
    fn group_by_balances_counts() {
        let c = Constraint::GroupBy(1);
        let history = vec!["a".to_string(), "b".to_string()];
        // "a" has count 1, "b" has count 1 — both at the minimum.
        assert!(c.matches("a", &history));
        assert!(c.matches("b", &history));
        assert!(c.matches("c", &history));
    }

    #[test]
    fn group_by_rejects_overloaded_group() {
        let c = Constraint::GroupBy(1);
        let history = vec!["a".to_string(), "a".to_string(), "b".to_string()];
        // min count is 1 (b), "a" already has count 2.
        assert!(!c.matches("a", &history));
        assert!(c.matches("b", &history));
        assert!(c.matches("c", &history));
    }

    #[test]
    fn group_by_degenerates_below_n_groups() {
        let c = Constraint::GroupBy(3);
        let history = vec!["a".to_string(), "a".to_string()];
        // Only one distinct group so far, fewer than n=3: accept anything.
        assert!(c.matches("a", &history));
        assert!(c.matches("z", &history));
    }
}
