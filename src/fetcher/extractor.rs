use scraper::{Html, Selector};

use crate::app::{MimicError, Result};

/// Where the reference page lists its user-agent strings.
pub const DEFAULT_SELECTOR: &str = "td li span.code";

/// Pulls candidate user-agent strings out of a reference page.
#[derive(Debug, Clone)]
pub struct Extractor {
    selector: Selector,
}

impl Extractor {
    pub fn new(selector: &str) -> Result<Self> {
        let selector = Selector::parse(selector)
            .map_err(|e| MimicError::Config(format!("Invalid selector '{}': {}", selector, e)))?;
        Ok(Self { selector })
    }

    /// Text of every element matched by the selector, trimmed.
    ///
    /// A page without a single matching element does not have the expected
    /// shape and is reported as a parse error.
    pub fn extract(&self, html: &str) -> Result<Vec<String>> {
        let document = Html::parse_document(html);
        let mut found = 0usize;

        let candidates = document
            .select(&self.selector)
            .inspect(|_| found += 1)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>();

        if found == 0 {
            return Err(MimicError::Parse(
                "no user-agent entries found in page".to_string(),
            ));
        }

        Ok(candidates)
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self {
            selector: Selector::parse(DEFAULT_SELECTOR).expect("default selector is valid"),
        }
    }
}
