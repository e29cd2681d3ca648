//! Types describing what a page load asked for and what it got.

use std::fmt;
use thiserror::Error;

/// Why the paging layer wants more data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTrigger {
  /// Start over from the first page
  Refresh,
  /// Load the page after the cursor
  Append,
  /// Load the page before the first one; never has data here
  Prepend,
}

/// Why a load could not get fresh data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
  /// No usable network path
  Unavailable,
  /// The remote call ran past its time budget
  Timeout,
  /// The remote answered with an error or garbage
  Upstream,
}

impl fmt::Display for FailureKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      FailureKind::Unavailable => "unavailable",
      FailureKind::Timeout => "timeout",
      FailureKind::Upstream => "upstream error",
    };
    f.write_str(s)
  }
}

/// Where the posts behind a successful load came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSource {
  /// The page was fetched and stored
  Fresh,
  /// Fetching failed; the cache is being served as-is
  Cached(FailureKind),
}

/// A load that failed with nothing cached to fall back on.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct LoadError {
  pub kind: FailureKind,
  pub message: String,
}

impl LoadError {
  pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
    Self {
      kind,
      message: message.into(),
    }
  }
}

/// Result of one `load` call.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
  Success { end_of_data: bool, source: PageSource },
  Failure(LoadError),
}

impl LoadOutcome {
  /// `Some(end_of_data)` for successes.
  pub fn end_of_data(&self) -> Option<bool> {
    match self {
      LoadOutcome::Success { end_of_data, .. } => Some(*end_of_data),
      LoadOutcome::Failure(_) => None,
    }
  }

  /// The failure kind, whether the load failed outright or degraded to cache.
  pub fn failure_kind(&self) -> Option<FailureKind> {
    match self {
      LoadOutcome::Success {
        source: PageSource::Cached(kind),
        ..
      } => Some(*kind),
      LoadOutcome::Success { .. } => None,
      LoadOutcome::Failure(e) => Some(e.kind),
    }
  }

  /// Served stale cache instead of fresh data.
  pub fn is_degraded(&self) -> bool {
    matches!(
      self,
      LoadOutcome::Success {
        source: PageSource::Cached(_),
        ..
      }
    )
  }
}
