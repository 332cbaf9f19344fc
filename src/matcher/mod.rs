//! Recognition of plausible desktop user-agent strings.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// Platform markers a scraped string must carry to be kept.
pub const DEFAULT_PATTERNS: [&str; 3] = [
    r"windows nt \d+\.\d+",
    r"macintosh",
    r"linux (x86_64|i686)",
];

static BUILTIN: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    DEFAULT_PATTERNS
        .iter()
        .map(|p| compile(p).expect("built-in user-agent pattern is valid"))
        .collect()
});

fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Ordered set of precompiled, case-insensitive patterns.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    patterns: Vec<Regex>,
}

impl PatternMatcher {
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| compile(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// True when the trimmed candidate is non-empty and any pattern matches.
    pub fn matches(&self, candidate: &str) -> bool {
        let candidate = candidate.trim();
        !candidate.is_empty() && self.patterns.iter().any(|p| p.is_match(candidate))
    }
}

impl Default for PatternMatcher {
    fn default() -> Self {
        Self {
            patterns: BUILTIN.clone(),
        }
    }
}
