//! Event status machine and event creation rules.
//!
//! ```text
//! scheduled --start live--> live --complete--> completed
//!                            |  ^                  |
//!                      delay |  | resume           | delay / resume
//!                            v  |                  v
//!                           delayed <--------- (re-opened)
//! ```
//!
//! The store accepts any status write, so every write goes through
//! [`plan_transition`] or [`force_status`] first.

use crate::error::{AppError, AppResult, TransitionError};
use crate::models::{Event, EventDraft, EventPatch, EventStatus, NewEvent, Sport};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Administrator action on an event card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StatusAction {
    StartLive,
    Delay { reason: String },
    Resume,
    Complete,
    /// Open score editing without changing status
    Edit,
}

impl StatusAction {
    /// Status the action moves to; `None` for Edit
    pub fn target(&self) -> Option<EventStatus> {
        match self {
            StatusAction::StartLive | StatusAction::Resume => Some(EventStatus::Live),
            StatusAction::Delay { .. } => Some(EventStatus::Delayed),
            StatusAction::Complete => Some(EventStatus::Completed),
            StatusAction::Edit => None,
        }
    }

    fn allowed_from(&self, from: EventStatus) -> bool {
        use EventStatus::*;
        match self {
            StatusAction::StartLive => from == Scheduled,
            StatusAction::Delay { .. } => matches!(from, Live | Completed),
            StatusAction::Resume => matches!(from, Delayed | Completed),
            StatusAction::Complete => from == Live,
            StatusAction::Edit => matches!(from, Live | Completed),
        }
    }
}

/// Trimmed delay reason. A blank one refuses the move to delayed.
pub fn require_delay_reason(reason: Option<&str>) -> AppResult<String> {
    match reason.map(str::trim) {
        Some(reason) if !reason.is_empty() => Ok(reason.to_string()),
        _ => Err(AppError::InvalidTransition {
            to: EventStatus::Delayed,
            reason: TransitionError::MissingDelayReason,
        }),
    }
}

/// Status write produced by a permitted transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: EventStatus,
    /// Set only when entering delayed; any other status clears it
    pub delay_reason: Option<String>,
}

impl StatusChange {
    fn new(status: EventStatus, reason: Option<&str>) -> AppResult<Self> {
        let delay_reason = if status == EventStatus::Delayed {
            Some(require_delay_reason(reason)?)
        } else {
            None
        };
        Ok(Self {
            status,
            delay_reason,
        })
    }
}

impl From<StatusChange> for EventPatch {
    fn from(change: StatusChange) -> Self {
        EventPatch::Status {
            status: change.status,
            delay_reason: change.delay_reason,
        }
    }
}

/// Check `action` against the event's current status and return the status
/// write to issue, or `None` when the action does not change status
pub fn plan_transition(event: &Event, action: &StatusAction) -> AppResult<Option<StatusChange>> {
    let from = event.status;

    let target = match action.target() {
        Some(target) => target,
        None if action.allowed_from(from) => return Ok(None),
        None => {
            return Err(AppError::Validation(format!(
                "a {} event cannot be edited",
                from
            )))
        }
    };

    let reason = match action {
        StatusAction::Delay { reason } => Some(require_delay_reason(Some(reason))?),
        _ => None,
    };

    if !action.allowed_from(from) {
        return Err(AppError::InvalidTransition {
            to: target,
            reason: TransitionError::NotAllowedFrom(from),
        });
    }

    StatusChange::new(target, reason.as_deref()).map(Some)
}

/// Administrator override: any status may be set directly, but a delay
/// still needs a reason
pub fn force_status(status: EventStatus, reason: Option<&str>) -> AppResult<StatusChange> {
    StatusChange::new(status, reason)
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Validate a draft and stamp it with its creator and creation time
pub fn prepare_event(
    draft: &EventDraft,
    created_by: &str,
    created_at: DateTime<Utc>,
) -> AppResult<NewEvent> {
    let required = [
        ("name", &draft.name),
        ("sport", &draft.sport),
        ("date", &draft.date),
        ("team1", &draft.team1),
        ("team2", &draft.team2),
    ];
    let missing: Vec<&'static str> = required
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| *field)
        .collect();
    if !missing.is_empty() {
        return Err(AppError::MissingFields(missing));
    }

    let sport = draft.sport.parse::<Sport>().map_err(AppError::Validation)?;
    let date = NaiveDate::parse_from_str(draft.date.trim(), "%Y-%m-%d")
        .map_err(|e| AppError::Validation(format!("Invalid date '{}': {}", draft.date, e)))?;

    Ok(NewEvent {
        name: draft.name.trim().to_string(),
        sport,
        date,
        time: draft.time.as_deref().and_then(non_empty),
        venue: draft.venue.as_deref().and_then(non_empty),
        team1: draft.team1.trim().to_string(),
        team2: draft.team2.trim().to_string(),
        status: EventStatus::Scheduled,
        created_at,
        created_by: created_by.to_string(),
    })
}
