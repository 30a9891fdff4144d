use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

use super::{HeuristicConfig, token_count};

pub struct CandidateFilter {
    min_tokens: usize,
    reject: Vec<Regex>,
}

impl CandidateFilter {
    pub fn new(config: &HeuristicConfig) -> Result<Self> {
        let reject = config
            .reject_patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .with_context(|| format!("invalid rejection pattern: {pattern}"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            min_tokens: config.min_tokens,
            reject,
        })
    }

    pub fn is_rejected(&self, candidate: &str) -> bool {
        token_count(candidate) < self.min_tokens
            || self.reject.iter().any(|pattern| pattern.is_match(candidate))
    }

    /// Keep actionable candidates, first occurrence wins.
    pub fn apply<I, S>(&self, candidates: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut kept = Vec::new();

        for candidate in candidates {
            let candidate = candidate.as_ref().trim();
            if self.is_rejected(candidate) {
                continue;
            }
            if seen.insert(candidate.to_string()) {
                kept.push(candidate.to_string());
            }
        }

        kept
    }
}
