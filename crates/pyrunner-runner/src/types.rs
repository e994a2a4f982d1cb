//! Types used by the runner module

use serde::{Deserialize, Serialize};

/// Per-invocation lifecycle state.
///
/// `NotStarted -> Starting -> Running -> {Completed, TimedOut}`, or
/// `Starting -> StartFailed`. `Started` fires on `Starting -> Running`;
/// `Exited` fires on entering `Completed` or `TimedOut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationState {
    NotStarted,
    Starting,
    Running,
    Completed,
    TimedOut,
    StartFailed,
}

impl InvocationState {
    /// Convert the state to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::TimedOut => "timed_out",
            Self::StartFailed => "start_failed",
        }
    }

    /// Whether `next` is a legal successor of this state.
    #[must_use]
    pub const fn can_transition_to(&self, next: InvocationState) -> bool {
        matches!(
            (self, next),
            (Self::NotStarted, Self::Starting)
                | (Self::Starting, Self::Running)
                | (Self::Starting, Self::StartFailed)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::TimedOut)
        )
    }

    /// Whether the invocation has reached an end state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::TimedOut | Self::StartFailed)
    }
}

impl std::fmt::Display for InvocationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
