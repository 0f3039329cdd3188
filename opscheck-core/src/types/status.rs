use serde::{Deserialize, Serialize};
use std::fmt;

/// Tri-state verdict of a single check
///
/// Variants are declared in priority order so that `Ord` gives
/// `Pass < Warn < Fail` and the worst status wins a `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Warn,
    Fail,
}

impl Status {
    /// Highest-priority status among the contributing ones, `Pass` if none
    pub fn worst<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = Status>,
    {
        statuses.into_iter().max().unwrap_or(Status::Pass)
    }

    /// Collect the statuses whose condition holds and take the worst
    pub fn from_conditions(conditions: &[(bool, Status)]) -> Self {
        Self::worst(
            conditions
                .iter()
                .filter(|(hit, _)| *hit)
                .map(|(_, status)| *status),
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Warn => "WARN",
            Status::Fail => "FAIL",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
