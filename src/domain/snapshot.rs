use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One consistent version of the user-agent list.
///
/// The serialized form is the on-disk record:
/// `{ "user-agent": [...], "last-update": "<rfc3339>" }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "user-agent", default)]
    agents: Vec<String>,
    #[serde(rename = "last-update", default)]
    last_update: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Build a snapshot, trimming entries and dropping blanks and duplicates.
    /// The first occurrence of a duplicate keeps its position.
    pub fn new<I, S>(agents: I, last_update: Option<DateTime<Utc>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let agents = agents
            .into_iter()
            .map(|a| {
                let a: String = a.into();
                a.trim().to_string()
            })
            .filter(|a| !a.is_empty())
            .filter(|a| seen.insert(a.clone()))
            .collect();

        Self {
            agents,
            last_update,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn agents(&self) -> &[String] {
        &self.agents
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Re-apply the construction invariants to a deserialized snapshot.
    pub(crate) fn normalized(self) -> Self {
        Self::new(self.agents, self.last_update)
    }
}
