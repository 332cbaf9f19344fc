use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Browser family scraped as one unit of a refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Chrome,
    Firefox,
    Safari,
    Edge,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Chrome,
        Category::Firefox,
        Category::Safari,
        Category::Edge,
    ];

    /// Path segment on the source site, also the serialized name.
    pub fn slug(&self) -> &'static str {
        match self {
            Category::Chrome => "chrome",
            Category::Firefox => "firefox",
            Category::Safari => "safari",
            Category::Edge => "edge",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.slug() == s)
            .ok_or_else(|| format!("Unknown browser category: {}", s))
    }
}
