use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// One of the five wizard phases. Declaration order is the only legal
/// forward path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Idea,
    Plan,
    Repo,
    Docs,
    Deploy,
}

impl Step {
    pub fn all() -> &'static [Step] {
        &[Step::Idea, Step::Plan, Step::Repo, Step::Docs, Step::Deploy]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<Step> {
        Step::all().get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<Step> {
        self.index().checked_sub(1).map(|i| Step::all()[i])
    }

    pub fn is_last(self) -> bool {
        self.next().is_none()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Step::Idea => "idea",
            Step::Plan => "plan",
            Step::Repo => "repo",
            Step::Docs => "docs",
            Step::Deploy => "deploy",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Step {
    type Err = crate::error::ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idea" => Ok(Step::Idea),
            "plan" => Ok(Step::Plan),
            "repo" => Ok(Step::Repo),
            "docs" => Ok(Step::Docs),
            "deploy" => Ok(Step::Deploy),
            _ => Err(crate::error::ForgeError::InvalidStep(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// StepStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Locked,
    Active,
    Approved,
    Completed,
    Error,
}

impl StepStatus {
    pub fn all() -> &'static [StepStatus] {
        &[
            StepStatus::Locked,
            StepStatus::Active,
            StepStatus::Approved,
            StepStatus::Completed,
            StepStatus::Error,
        ]
    }

    /// Outgoing edges of the status graph.
    pub fn successors(self) -> &'static [StepStatus] {
        match self {
            StepStatus::Locked => &[StepStatus::Active],
            StepStatus::Active => &[StepStatus::Approved, StepStatus::Error],
            StepStatus::Approved => &[StepStatus::Completed, StepStatus::Error],
            StepStatus::Completed => &[],
            StepStatus::Error => &[StepStatus::Active],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Locked => "locked",
            StepStatus::Active => "active",
            StepStatus::Approved => "approved",
            StepStatus::Completed => "completed",
            StepStatus::Error => "error",
        }
    }
}

/// Pure lookup in the transition table.
pub fn can_transition(from: StepStatus, to: StepStatus) -> bool {
    from.successors().contains(&to)
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StepStatus {
    type Err = crate::error::ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "locked" => Ok(StepStatus::Locked),
            "active" => Ok(StepStatus::Active),
            "approved" => Ok(StepStatus::Approved),
            "completed" => Ok(StepStatus::Completed),
            "error" => Ok(StepStatus::Error),
            _ => Err(crate::error::ForgeError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// LogLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Success,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Success => "success",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn step_ordering() {
        assert!(Step::Idea < Step::Plan);
        assert!(Step::Docs < Step::Deploy);
        assert_eq!(Step::all().len(), 5);
    }

    #[test]
    fn step_next_and_previous() {
        assert_eq!(Step::Idea.next(), Some(Step::Plan));
        assert_eq!(Step::Deploy.next(), None);
        assert_eq!(Step::Idea.previous(), None);
        assert_eq!(Step::Repo.previous(), Some(Step::Plan));
        assert!(Step::Deploy.is_last());
    }

    #[test]
    fn step_parse() {
        for step in Step::all() {
            assert_eq!(Step::from_str(step.as_str()).unwrap(), *step);
        }
        assert!(Step::from_str("launch").is_err());
    }

    #[test]
    fn locked_never_reaches_completed_directly() {
        assert!(!can_transition(StepStatus::Locked, StepStatus::Completed));
        assert!(!can_transition(StepStatus::Active, StepStatus::Completed));
        assert!(!can_transition(StepStatus::Error, StepStatus::Completed));
        assert!(can_transition(StepStatus::Active, StepStatus::Approved));
        assert!(can_transition(StepStatus::Approved, StepStatus::Completed));
    }

    #[test]
    fn only_approved_leads_to_completed() {
        let into_completed: Vec<_> = StepStatus::all()
            .iter()
            .filter(|s| can_transition(**s, StepStatus::Completed))
            .collect();
        assert_eq!(into_completed, vec![&StepStatus::Approved]);

        let into_approved: Vec<_> = StepStatus::all()
            .iter()
            .filter(|s| can_transition(**s, StepStatus::Approved))
            .collect();
        assert_eq!(into_approved, vec![&StepStatus::Active]);
    }

    #[test]
    fn completed_is_terminal() {
        for to in StepStatus::all() {
            assert!(!can_transition(StepStatus::Completed, *to));
        }
    }

    #[test]
    fn error_only_returns_to_active() {
        assert_eq!(StepStatus::Error.successors(), &[StepStatus::Active]);
    }
}
