// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sequence gating: derives completed / current / locked for one user.
//!
//! Every view and write path resolves progress through [`Progression`], so
//! they all agree on which activity is actionable. Resolution is a pure
//! function of the catalog and the user's completions; nothing here is
//! persisted or cached.

use crate::models::{Activity, ActivityStatus, Completion};
use std::collections::HashMap;
use std::fmt;

/// Why an action on an activity is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceViolation {
    /// A lower-ordered activity is still open.
    NotYetReached,
    /// The activity is already completed.
    AlreadyCompleted,
}

impl fmt::Display for SequenceViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceViolation::NotYetReached => {
                write!(f, "This activity is not unlocked yet; finish the current one first")
            }
            SequenceViolation::AlreadyCompleted => {
                write!(f, "This activity has already been completed")
            }
        }
    }
}

/// Errors from progression resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Activity not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    OutOfSequence(SequenceViolation),
}

/// One activity with its derived status.
#[derive(Debug, Clone, Copy)]
pub struct ProgressEntry<'a> {
    pub activity: &'a Activity,
    pub status: ActivityStatus,
    pub completion: Option<&'a Completion>,
}

/// Resolved progress of one user over the catalog, in sequence order.
#[derive(Debug, Clone)]
pub struct Progression<'a> {
    entries: Vec<ProgressEntry<'a>>,
    current: Option<usize>,
}

impl<'a> Progression<'a> {
    /// Resolve statuses in a single pass over the catalog.
    ///
    /// The catalog is sorted by `sequence_order`; a repeated order value is
    /// `InvalidInput`. Completions are keyed by activity ID, later entries
    /// replacing earlier ones. Completions for activities outside the catalog
    /// are ignored.
    pub fn resolve(
        activities: &'a [Activity],
        completions: &'a [Completion],
    ) -> Result<Self, ProgressionError> {
        let mut ordered: Vec<&Activity> = activities.iter().collect();
        ordered.sort_by_key(|a| a.sequence_order);

        if let Some(pair) = ordered
            .windows(2)
            .find(|pair| pair[0].sequence_order == pair[1].sequence_order)
        {
            return Err(ProgressionError::InvalidInput(format!(
                "duplicate sequence_order {} ({} and {})",
                pair[0].sequence_order, pair[0].id, pair[1].id
            )));
        }

        let by_activity: HashMap<&str, &Completion> = completions
            .iter()
            .map(|c| (c.activity_id.as_str(), c))
            .collect();

        let mut current = None;
        let entries = ordered
            .into_iter()
            .enumerate()
            .map(|(index, activity)| {
                let completion = by_activity.get(activity.id.as_str()).copied();
                let status = if completion.is_some() {
                    ActivityStatus::Completed
                } else if current.is_none() {
                    current = Some(index);
                    ActivityStatus::Current
                } else {
                    ActivityStatus::Locked
                };
                ProgressEntry {
                    activity,
                    status,
                    completion,
                }
            })
            .collect();

        Ok(Self { entries, current })
    }

    /// All activities in sequence order with their status.
    pub fn entries(&self) -> &[ProgressEntry<'a>] {
        &self.entries
    }

    /// Mapping of activity ID to status.
    pub fn statuses(&self) -> HashMap<String, ActivityStatus> {
        self.entries
            .iter()
            .map(|e| (e.activity.id.clone(), e.status))
            .collect()
    }

    pub fn current(&self) -> Option<&'a Activity> {
        self.current.map(|i| self.entries[i].activity)
    }

    /// First activity without a completion; `None` when all are done or the
    /// catalog is empty.
    pub fn current_activity_id(&self) -> Option<&'a str> {
        self.current().map(|a| a.id.as_str())
    }

    pub fn entry(&self, activity_id: &str) -> Option<&ProgressEntry<'a>> {
        self.entries.iter().find(|e| e.activity.id == activity_id)
    }

    pub fn completed_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == ActivityStatus::Completed)
            .count()
    }

    pub fn is_finished(&self) -> bool {
        !self.entries.is_empty() && self.current.is_none()
    }

    /// Gate an action (view action page, check in, upload, complete).
    ///
    /// Only the current activity passes. An empty catalog is `InvalidInput`,
    /// an unknown ID is `NotFound`, anything else is `OutOfSequence` saying
    /// whether the activity is ahead of or behind the current one.
    pub fn check_action(&self, activity_id: &str) -> Result<&'a Activity, ProgressionError> {
        if self.entries.is_empty() {
            return Err(ProgressionError::InvalidInput(
                "activity catalog is empty".to_string(),
            ));
        }

        let entry = self
            .entry(activity_id)
            .ok_or_else(|| ProgressionError::NotFound(activity_id.to_string()))?;

        match entry.status {
            ActivityStatus::Current => Ok(entry.activity),
            ActivityStatus::Completed => Err(ProgressionError::OutOfSequence(
                SequenceViolation::AlreadyCompleted,
            )),
            ActivityStatus::Locked => Err(ProgressionError::OutOfSequence(
                SequenceViolation::NotYetReached,
            )),
        }
    }

    /// `true` iff `activity_id` is the current activity.
    pub fn is_action_authorized(&self, activity_id: &str) -> Result<bool, ProgressionError> {
        match self.check_action(activity_id) {
            Ok(_) => Ok(true),
            Err(ProgressionError::OutOfSequence(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Mapping of activity ID to derived status.
pub fn classify(
    activities: &[Activity],
    completions: &[Completion],
) -> Result<HashMap<String, ActivityStatus>, ProgressionError> {
    Ok(Progression::resolve(activities, completions)?.statuses())
}

/// ID of the lowest-ordered activity without a completion.
pub fn current_activity_id(
    activities: &[Activity],
    completions: &[Completion],
) -> Result<Option<String>, ProgressionError> {
    Ok(Progression::resolve(activities, completions)?
        .current_activity_id()
        .map(str::to_string))
}

/// Whether `activity_id` is the one activity the user may act on.
pub fn is_action_authorized(
    activity_id: &str,
    activities: &[Activity],
    completions: &[Completion],
) -> Result<bool, ProgressionError> {
    Progression::resolve(activities, completions)?.is_action_authorized(activity_id)
}
