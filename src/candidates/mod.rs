//! Candidate extraction heuristic: normalize page text, split it into
//! paragraph and sentence candidates, then drop low-signal and duplicate ones.

use anyhow::Result;

use crate::cli::HeuristicArgs;

mod filter;
mod normalize;
mod segment;

pub use filter::CandidateFilter;
pub use normalize::normalize_text;
pub use segment::segment;

/// Rejection patterns for headers, metadata and Q&A prefixes. Matched
/// case-insensitively anywhere in a candidate.
pub const DEFAULT_REJECT_PATTERNS: &[&str] = &[
    r"table of contents",
    r"amendment record",
    r"version",
    r"online:",
    r"email:",
    r"this document is for",
    r"not legal advice",
    r"copyright",
    r"all rights reserved",
    r"contact",
    r"introduction",
    r"overview",
    r"page \d+",
    r"section \d+",
    r"figure",
    r"amendment",
    r"template",
    r"description",
    r"^q:",
    r"^a:",
];

pub const DEFAULT_MIN_CANDIDATE_TOKENS: usize = 4;

/// Sentences must carry more than this many tokens to become candidates.
pub const SENTENCE_TOKEN_FLOOR: usize = 3;

#[derive(Debug, Clone)]
pub struct HeuristicConfig {
    pub min_tokens: usize,
    pub reject_patterns: Vec<String>,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            min_tokens: DEFAULT_MIN_CANDIDATE_TOKENS,
            reject_patterns: DEFAULT_REJECT_PATTERNS
                .iter()
                .map(|pattern| pattern.to_string())
                .collect(),
        }
    }
}

impl HeuristicConfig {
    pub fn from_args(args: &HeuristicArgs) -> Self {
        let mut config = Self {
            min_tokens: args.min_tokens,
            ..Self::default()
        };

        if !args.reject_patterns.is_empty() {
            config.reject_patterns = args.reject_patterns.clone();
        }
        config
            .reject_patterns
            .extend(args.extra_reject_patterns.iter().cloned());

        config
    }
}

/// Normalize, segment and filter one block of raw text.
pub struct CandidateExtractor {
    filter: CandidateFilter,
}

impl CandidateExtractor {
    pub fn new(config: &HeuristicConfig) -> Result<Self> {
        Ok(Self {
            filter: CandidateFilter::new(config)?,
        })
    }

    pub fn extract(&self, raw_text: &str) -> Vec<String> {
        let normalized = normalize_text(raw_text);
        self.filter.apply(segment(&normalized))
    }

    /// Sentence candidates only. Paragraph candidates repeat the sentences
    /// they contain, so a model block built from `extract` would carry every
    /// rule twice.
    pub fn extract_sentences(&self, raw_text: &str) -> Vec<String> {
        let normalized = normalize_text(raw_text);
        self.filter.apply(segment::split_sentences(&normalized))
    }
}

pub(crate) fn token_count(text: &str) -> usize {
    text.split_whitespace().count()
}
