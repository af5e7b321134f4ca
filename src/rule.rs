use serde::Deserialize;
use std::fmt;
use tracing::debug;

/// Minimum normalized similarity for a line to be reported as a near miss.
const NEAR_MISS_THRESHOLD: f64 = 0.6;

/// A single literal replacement: every non-overlapping occurrence of `search`
/// is replaced with `replacement`, left to right.
///
/// There is no pattern syntax. A rule with an empty `search` never matches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplacementRule {
    /// Stable identifier used in reports and errors
    pub id: String,
    /// Exact text to look for
    pub search: String,
    /// Text substituted for each occurrence
    #[serde(rename = "replace")]
    pub replacement: String,
}

/// What a rule did to the buffer it ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    /// Search literal was absent; buffer passed through unchanged
    NoMatch,
    /// `count` occurrences were replaced
    Replaced { count: usize },
}

impl RuleOutcome {
    pub fn count(&self) -> usize {
        match self {
            RuleOutcome::NoMatch => 0,
            RuleOutcome::Replaced { count } => *count,
        }
    }

    /// True when the rule matched exactly once.
    pub fn is_exact(&self) -> bool {
        self.count() == 1
    }
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleOutcome::NoMatch => write!(f, "no match"),
            RuleOutcome::Replaced { count: 1 } => write!(f, "replaced 1 occurrence"),
            RuleOutcome::Replaced { count } => write!(f, "replaced {count} occurrences"),
        }
    }
}

/// The buffer line that most resembles a search literal that matched nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct NearMiss {
    /// 1-based line number in the buffer the rule ran against
    pub line: usize,
    pub text: String,
    /// Normalized Levenshtein similarity in [0, 1]
    pub similarity: f64,
}

impl fmt::Display for NearMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "closest line {}: `{}` ({:.0}% similar)",
            self.line,
            self.text,
            self.similarity * 100.0
        )
    }
}

impl ReplacementRule {
    pub fn new(
        id: impl Into<String>,
        search: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            search: search.into(),
            replacement: replacement.into(),
        }
    }

    /// Count non-overlapping occurrences of the search literal in `text`.
    pub fn count_in(&self, text: &str) -> usize {
        if self.search.is_empty() {
            return 0;
        }
        text.matches(self.search.as_str()).count()
    }

    /// Apply this rule to `text`, returning the new buffer and what happened.
    pub fn apply_to(&self, text: &str) -> (String, RuleOutcome) {
        let count = self.count_in(text);
        debug!(rule = %self.id, count, "rule evaluated");

        if count == 0 {
            return (text.to_string(), RuleOutcome::NoMatch);
        }

        (
            text.replace(self.search.as_str(), &self.replacement),
            RuleOutcome::Replaced { count },
        )
    }

    /// Find the line of `text` closest to the first non-blank line of the
    /// search literal. Indentation is ignored on both sides.
    pub fn near_miss(&self, text: &str) -> Option<NearMiss> {
        let needle = self.search.lines().map(str::trim).find(|l| !l.is_empty())?;

        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| NearMiss {
                line: idx + 1,
                text: line.trim().to_string(),
                similarity: strsim::normalized_levenshtein(needle, line.trim()),
            })
            .filter(|candidate| candidate.similarity >= NEAR_MISS_THRESHOLD)
            .max_by(|a, b| a.similarity.total_cmp(&b.similarity))
    }
}
