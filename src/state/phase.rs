//! Lifecycle phases of a single domain crawl
//!
//! A domain crawl moves strictly forward: `Init -> Running -> Done`, with a
//! shortcut `Init -> Done` for crawls that end before the first page (seed
//! rejected, cancelled before start).

use serde::Serialize;
use std::fmt;

/// Represents the current phase of a domain crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlPhase {
    /// Frontier is being seeded
    Init,

    /// Frontier is being drained
    Running,

    /// Result is finalized and immutable
    Done,
}

impl CrawlPhase {
    /// Returns true if this is the terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Init, Self::Running) | (Self::Init, Self::Done) | (Self::Running, Self::Done)
        )
    }

    /// Short lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Running => "running",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
