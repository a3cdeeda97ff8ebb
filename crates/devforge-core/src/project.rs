use crate::error::{ForgeError, Result};
use crate::payload::{
    CommitRecord, DeployConfig, Deployment, GeneratedDocs, GeneratedScaffold, IdeaInput,
    ProjectPlan, PromptPolicy, RepoConfig, RepoResult,
};
use crate::settings::Settings;
use crate::types::{can_transition, LogLevel, Step, StepStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Activity entries kept on the aggregate; older entries are dropped.
pub const ACTIVITY_LIMIT: usize = 200;

// ---------------------------------------------------------------------------
// StepState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepState {
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Failure detail while the step sits in `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepState {
    fn new(status: StepStatus) -> Self {
        Self {
            status,
            approved_at: None,
            completed_at: None,
            error: None,
        }
    }
}

/// Status record for every step. A struct rather than a map so no step can
/// ever be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepMap {
    pub idea: StepState,
    pub plan: StepState,
    pub repo: StepState,
    pub docs: StepState,
    pub deploy: StepState,
}

impl StepMap {
    fn initial() -> Self {
        Self {
            idea: StepState::new(StepStatus::Active),
            plan: StepState::new(StepStatus::Locked),
            repo: StepState::new(StepStatus::Locked),
            docs: StepState::new(StepStatus::Locked),
            deploy: StepState::new(StepStatus::Locked),
        }
    }

    pub fn get(&self, step: Step) -> &StepState {
        match step {
            Step::Idea => &self.idea,
            Step::Plan => &self.plan,
            Step::Repo => &self.repo,
            Step::Docs => &self.docs,
            Step::Deploy => &self.deploy,
        }
    }

    pub fn get_mut(&mut self, step: Step) -> &mut StepState {
        match step {
            Step::Idea => &mut self.idea,
            Step::Plan => &mut self.plan,
            Step::Repo => &mut self.repo,
            Step::Docs => &mut self.docs,
            Step::Deploy => &mut self.deploy,
        }
    }
}

// ---------------------------------------------------------------------------
// LogEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub step: Step,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub revision: u64,
    pub current_step: Step,
    pub steps: StepMap,
    pub idea: Option<IdeaInput>,
    pub plan: Option<ProjectPlan>,
    pub repo: Option<RepoConfig>,
    pub repo_result: Option<RepoResult>,
    pub docs: Option<GeneratedDocs>,
    pub scaffold: Option<GeneratedScaffold>,
    #[serde(default)]
    pub policy: Option<PromptPolicy>,
    #[serde(default)]
    pub docs_commit: Option<CommitRecord>,
    pub deploy: Option<DeployConfig>,
    #[serde(default)]
    pub deployment: Option<Deployment>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub activity: Vec<LogEntry>,
}

impl Project {
    /// Fresh aggregate: `idea` active, everything else locked, no payloads.
    pub fn create_initial() -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            revision: 0,
            current_step: Step::Idea,
            steps: StepMap::initial(),
            idea: None,
            plan: None,
            repo: None,
            repo_result: None,
            docs: None,
            scaffold: None,
            policy: None,
            docs_commit: None,
            deploy: None,
            deployment: None,
            settings: Settings::default(),
            activity: Vec::new(),
        }
    }

    pub fn status(&self, step: Step) -> StepStatus {
        self.steps.get(step).status
    }

    /// True once the last step has completed.
    pub fn is_finished(&self) -> bool {
        self.status(Step::Deploy) == StepStatus::Completed
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.revision += 1;
    }

    /// Append an activity entry, trimming to the most recent [`ACTIVITY_LIMIT`].
    pub fn record(
        &mut self,
        level: LogLevel,
        step: Step,
        message: impl Into<String>,
        detail: Option<String>,
    ) {
        self.activity.push(LogEntry {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            level,
            step,
            message: message.into(),
            detail,
        });
        if self.activity.len() > ACTIVITY_LIMIT {
            self.activity.drain(..self.activity.len() - ACTIVITY_LIMIT);
        }
    }

    pub fn with_settings(&self, settings: Settings) -> Self {
        let mut next = self.clone();
        next.settings = settings;
        next.touch();
        next
    }

    // ---------------------------------------------------------------------------
    // Transition engine
    // ---------------------------------------------------------------------------

    fn set_status(&mut self, step: Step, to: StepStatus) -> Result<()> {
        let from = self.status(step);
        if !can_transition(from, to) {
            return Err(invalid(step, from, to, format!("step is {from}")));
        }
        self.steps.get_mut(step).status = to;
        Ok(())
    }

    /// Mark `step` approved. Rejected unless the step is `active` and holds
    /// the payload it needs to move on.
    pub fn approve(&self, step: Step) -> Result<Self> {
        let from = self.status(step);
        if !can_transition(from, StepStatus::Approved) {
            return Err(invalid(
                step,
                from,
                StepStatus::Approved,
                format!("step is {from}"),
            ));
        }
        if let Some(payload) = self.missing_for_approval(step) {
            return Err(ForgeError::MissingPayload {
                step: step.to_string(),
                payload: payload.to_string(),
            });
        }

        let mut next = self.clone();
        next.set_status(step, StepStatus::Approved)?;
        next.steps.get_mut(step).approved_at = Some(Utc::now());
        next.touch();
        Ok(next)
    }

    /// Complete the current (approved) step and activate the next one.
    /// Returns the aggregate unchanged when already at the last step.
    pub fn advance(&self) -> Result<Self> {
        let outgoing = self.current_step;
        let Some(incoming) = outgoing.next() else {
            return Ok(self.clone());
        };

        let mut next = self.clone();
        next.set_status(outgoing, StepStatus::Completed)?;
        next.set_status(incoming, StepStatus::Active)?;
        next.steps.get_mut(outgoing).completed_at = Some(Utc::now());
        next.current_step = incoming;
        next.touch();
        Ok(next)
    }

    /// Complete the approved last step. The workflow has nowhere further to go.
    pub fn finish(&self) -> Result<Self> {
        let step = self.current_step;
        if !step.is_last() {
            return Err(invalid(
                step,
                self.status(step),
                StepStatus::Completed,
                "only the last step can finish the workflow".into(),
            ));
        }
        let mut next = self.clone();
        next.set_status(step, StepStatus::Completed)?;
        next.steps.get_mut(step).completed_at = Some(Utc::now());
        next.touch();
        Ok(next)
    }

    /// Approve the current step and move on in one operation, so callers
    /// never observe a step parked in `approved`.
    pub fn approve_and_advance(&self, step: Step) -> Result<Self> {
        if step != self.current_step {
            return Err(invalid(
                step,
                self.status(step),
                StepStatus::Approved,
                format!("current step is {}", self.current_step),
            ));
        }
        let approved = self.approve(step)?;
        if step.is_last() {
            approved.finish()
        } else {
            approved.advance()
        }
    }

    /// Put `step` into `error`, keeping `current_step` so it can be retried.
    pub fn fail(&self, step: Step, detail: impl Into<String>) -> Result<Self> {
        let mut next = self.clone();
        next.set_status(step, StepStatus::Error)?;
        next.steps.get_mut(step).error = Some(detail.into());
        next.touch();
        Ok(next)
    }

    /// Return an errored step to `active`.
    pub fn retry(&self, step: Step) -> Result<Self> {
        let mut next = self.clone();
        next.set_status(step, StepStatus::Active)?;
        next.steps.get_mut(step).error = None;
        next.touch();
        Ok(next)
    }

    /// Re-open the previous step. The current step drops back to `locked`;
    /// generated payloads are kept.
    pub fn go_back(&self) -> Result<Self> {
        let step = self.current_step;
        let from = self.status(step);
        if !matches!(from, StepStatus::Active | StepStatus::Error) {
            return Err(invalid(
                step,
                from,
                StepStatus::Locked,
                format!("cannot go back from a {from} step"),
            ));
        }
        let Some(previous) = step.previous() else {
            return Err(invalid(
                step,
                from,
                StepStatus::Locked,
                "already at the first step".into(),
            ));
        };

        let mut next = self.clone();
        *next.steps.get_mut(step) = StepState::new(StepStatus::Locked);
        *next.steps.get_mut(previous) = StepState::new(StepStatus::Active);
        next.current_step = previous;
        next.touch();
        Ok(next)
    }

    fn missing_for_approval(&self, step: Step) -> Option<&'static str> {
        match step {
            Step::Idea => match &self.idea {
                Some(idea) if !idea.description.trim().is_empty() => None,
                _ => Some("an idea description"),
            },
            Step::Plan => self.plan.is_none().then_some("a generated plan"),
            Step::Repo => self.repo_result.is_none().then_some("a created repository"),
            Step::Docs => {
                if self.docs.is_none() {
                    Some("generated docs")
                } else if self.docs_commit.is_none() {
                    Some("a docs commit")
                } else {
                    None
                }
            }
            Step::Deploy => self.deployment.is_none().then_some("a launched site"),
        }
    }

    // ---------------------------------------------------------------------------
    // Guards
    // ---------------------------------------------------------------------------

    /// Require `step` to be open for work (`active`, or `error` awaiting retry).
    pub fn ensure_workable(&self, step: Step) -> Result<()> {
        let status = self.status(step);
        if matches!(status, StepStatus::Active | StepStatus::Error) {
            Ok(())
        } else {
            Err(invalid(
                step,
                status,
                StepStatus::Active,
                format!("step is {status}"),
            ))
        }
    }

    /// Require `step` to be `active`, used for direct user edits.
    pub fn ensure_active(&self, step: Step) -> Result<()> {
        let status = self.status(step);
        if status == StepStatus::Active {
            Ok(())
        } else {
            Err(invalid(
                step,
                status,
                StepStatus::Active,
                format!("step is {status}"),
            ))
        }
    }

    /// Read a payload slot owned by an upstream step. Only `completed`
    /// steps hand their data downstream.
    pub fn upstream<'a, T>(&self, owner: Step, slot: &'a Option<T>, name: &str) -> Result<&'a T> {
        let missing = || ForgeError::MissingPayload {
            step: owner.to_string(),
            payload: format!("a completed {name}"),
        };
        if self.status(owner) != StepStatus::Completed {
            return Err(missing());
        }
        slot.as_ref().ok_or_else(missing)
    }

    // ---------------------------------------------------------------------------
    // Direct edits
    // ---------------------------------------------------------------------------

    pub fn edit_plan(&self, plan: ProjectPlan) -> Result<Self> {
        self.ensure_active(Step::Plan)?;
        let mut next = self.clone();
        next.plan = Some(plan);
        next.touch();
        Ok(next)
    }

    /// Replace the generated docs. A recorded commit no longer matches and
    /// is cleared.
    pub fn edit_docs(&self, docs: GeneratedDocs) -> Result<Self> {
        self.ensure_active(Step::Docs)?;
        let mut next = self.clone();
        next.docs = Some(docs);
        next.docs_commit = None;
        next.touch();
        Ok(next)
    }

    // ---------------------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------------------

    /// Check the structural invariants of an aggregate received from outside
    /// (for instance a client-held copy).
    pub fn validate(&self) -> Result<()> {
        let current = self.current_step;
        for step in Step::all().iter().copied() {
            let status = self.status(step);
            let ok = if step < current {
                status == StepStatus::Completed
            } else if step > current {
                status == StepStatus::Locked
            } else {
                // `approved` only exists inside approve-and-advance.
                !matches!(status, StepStatus::Locked | StepStatus::Approved)
                    && (status != StepStatus::Completed || step.is_last())
            };
            if !ok {
                return Err(ForgeError::InvalidInput(format!(
                    "step '{step}' cannot be {status} while the current step is '{current}'"
                )));
            }
        }
        if self.updated_at < self.created_at {
            return Err(ForgeError::InvalidInput(
                "updated_at precedes created_at".into(),
            ));
        }
        Ok(())
    }
}

fn invalid(step: Step, from: StepStatus, to: StepStatus, reason: String) -> ForgeError {
    ForgeError::InvalidTransition {
        step: step.to_string(),
        from: from.to_string(),
        to: to.to_string(),
        reason,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
