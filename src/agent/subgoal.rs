//! Subgoal ledger for the control loop.
//!
//! The planner produces an ordered list of subgoals, and the orchestrator
//! walks it, promoting one subgoal at a time to `Pending` and closing it out
//! as `Success` or `Failure`. At most one subgoal is `Pending` at any time.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Subgoal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubgoalStatus {
    /// Planned but not started.
    #[default]
    NotStarted,
    /// The current subgoal.
    Pending,
    /// Completed successfully.
    Success,
    /// Judged unachievable; triggers replanning.
    Failure,
}

impl SubgoalStatus {
    /// Marker used in the display form.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::NotStarted => "(not started yet)",
            Self::Pending => "⏳",
            Self::Success => "✅",
            Self::Failure => "❌",
        }
    }
}

/// One step of a decomposed plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subgoal {
    /// Unique subgoal ID.
    pub id: String,
    /// What the subgoal should achieve (natural language).
    pub description: String,
    /// Current status.
    #[serde(default)]
    pub status: SubgoalStatus,
    /// Why the subgoal ended the way it did.
    #[serde(default)]
    pub completion_reason: Option<String>,
}

impl Subgoal {
    /// Create a subgoal that has not started yet.
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            status: SubgoalStatus::NotStarted,
            completion_reason: None,
        }
    }

    /// Set the completion reason.
    pub fn with_completion_reason(mut self, reason: impl Into<String>) -> Self {
        self.completion_reason = Some(reason.into());
        self
    }

    /// Set the status.
    pub fn with_status(mut self, status: SubgoalStatus) -> Self {
        self.status = status;
        self
    }
}

impl fmt::Display for Subgoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "- [ID:{}]: {} : {}.",
            self.id,
            self.description,
            self.status.marker()
        )?;
        if let Some(reason) = &self.completion_reason {
            write!(f, " Completion reason: {}", reason)?;
        }
        Ok(())
    }
}

/// Ordered subgoal plan; insertion order is execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubgoalPlan {
    items: Vec<Subgoal>,
}

impl SubgoalPlan {
    /// Build a plan from raw subgoals.
    ///
    /// Only the first `Pending` entry survives; later ones are demoted to
    /// `NotStarted`.
    pub fn new(items: Vec<Subgoal>) -> Self {
        let mut items = items;
        let mut seen_pending = false;
        for item in items.iter_mut() {
            if item.status != SubgoalStatus::Pending {
                continue;
            }
            if seen_pending {
                tracing::warn!(
                    "Subgoal {} was pending while another subgoal is current, demoting it",
                    item.id
                );
                item.status = SubgoalStatus::NotStarted;
            }
            seen_pending = true;
        }
        Self { items }
    }

    /// All subgoals, in plan order.
    pub fn items(&self) -> &[Subgoal] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get a subgoal by ID.
    pub fn get(&self, id: &str) -> Option<&Subgoal> {
        self.items.iter().find(|item| item.id == id)
    }

    /// The current (pending) subgoal.
    pub fn current(&self) -> Option<&Subgoal> {
        self.items
            .iter()
            .find(|item| item.status == SubgoalStatus::Pending)
    }

    /// First subgoal that has not started, in plan order.
    pub fn next_not_started(&self) -> Option<&Subgoal> {
        self.items
            .iter()
            .find(|item| item.status == SubgoalStatus::NotStarted)
    }

    /// Promote the next not-started subgoal to pending.
    ///
    /// No-op while another subgoal is pending or when nothing is left.
    /// Returns the promoted subgoal.
    pub fn start_next(&mut self) -> Option<&Subgoal> {
        if self.current().is_some() {
            return None;
        }
        let item = self
            .items
            .iter_mut()
            .find(|item| item.status == SubgoalStatus::NotStarted)?;
        item.status = SubgoalStatus::Pending;
        Some(&*item)
    }

    /// Mark every subgoal whose ID is in `ids` as successful.
    ///
    /// Unknown IDs are ignored.
    pub fn complete_by_ids<S: AsRef<str>>(&mut self, ids: &[S]) {
        for item in self.items.iter_mut() {
            if ids.iter().any(|id| id.as_ref() == item.id) {
                item.status = SubgoalStatus::Success;
            }
        }
    }

    /// Mark the current subgoal as successful.
    pub fn complete_current(&mut self) {
        if let Some(item) = self.current_mut() {
            item.status = SubgoalStatus::Success;
        }
    }

    /// Mark the current subgoal as failed.
    pub fn fail_current(&mut self) {
        if let Some(item) = self.current_mut() {
            item.status = SubgoalStatus::Failure;
        }
    }

    /// Record a reason on the current subgoal.
    pub fn set_current_reason(&mut self, reason: impl Into<String>) {
        if let Some(item) = self.current_mut() {
            item.completion_reason = Some(reason.into());
        }
    }

    /// Check if every subgoal succeeded. True for an empty plan.
    pub fn all_completed(&self) -> bool {
        self.items
            .iter()
            .all(|item| item.status == SubgoalStatus::Success)
    }

    /// Check if any subgoal failed.
    pub fn any_failed(&self) -> bool {
        self.items
            .iter()
            .any(|item| item.status == SubgoalStatus::Failure)
    }

    /// Check if no subgoal has started yet.
    pub fn nothing_started(&self) -> bool {
        self.items
            .iter()
            .all(|item| item.status == SubgoalStatus::NotStarted)
    }

    /// Subgoals whose IDs are in `ids`, in plan order.
    pub fn by_ids<S: AsRef<str>>(&self, ids: &[S]) -> Vec<&Subgoal> {
        self.items
            .iter()
            .filter(|item| ids.iter().any(|id| id.as_ref() == item.id))
            .collect()
    }

    /// Get statistics.
    pub fn stats(&self) -> SubgoalStats {
        let mut stats = SubgoalStats::default();
        for item in &self.items {
            stats.total += 1;
            match item.status {
                SubgoalStatus::NotStarted => stats.not_started += 1,
                SubgoalStatus::Pending => stats.pending += 1,
                SubgoalStatus::Success => stats.success += 1,
                SubgoalStatus::Failure => stats.failure += 1,
            }
        }
        stats
    }

    fn current_mut(&mut self) -> Option<&mut Subgoal> {
        self.items
            .iter_mut()
            .find(|item| item.status == SubgoalStatus::Pending)
    }
}

impl fmt::Display for SubgoalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.is_empty() {
            return f.write_str("No subgoal.");
        }
        let lines: Vec<String> = self.items.iter().map(|item| item.to_string()).collect();
        f.write_str(&lines.join("\n"))
    }
}

/// Subgoal plan statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubgoalStats {
    pub total: usize,
    pub not_started: usize,
    pub pending: usize,
    pub success: usize,
    pub failure: usize,
}

impl SubgoalStats {
    /// Calculate completion percentage.
    pub fn completion_percentage(&self) -> f32 {
        if self.total == 0 {
            100.0
        } else {
            (self.success as f32 / self.total as f32) * 100.0
        }
    }
}
