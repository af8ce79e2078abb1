use serde::{Deserialize, Serialize};

/// Caller-supplied narrowing of a collection read.
///
/// A `None` field places no constraint on that field. Empty strings are
/// normalized to `None` on construction so they never mean "match empty".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(rename = "userName")]
    pub identifier: Option<String>,
    #[serde(rename = "applicationStatus")]
    pub status: Option<String>,
}

impl FilterCriteria {
    pub fn new(identifier: Option<String>, status: Option<String>) -> Self {
        Self { identifier: non_empty(identifier), status: non_empty(status) }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.identifier.is_none() && self.status.is_none()
    }

    /// Fills fields still unset from a lower-precedence source.
    pub fn or(self, fallback: FilterCriteria) -> Self {
        Self {
            identifier: self.identifier.or(fallback.identifier),
            status: self.status.or(fallback.status),
        }
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}
