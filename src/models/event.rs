use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Sports that events can be scheduled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sport {
    Football,
    Basketball,
    Tennis,
    Cricket,
    Baseball,
    Volleyball,
}

impl Sport {
    pub const ALL: [Sport; 6] = [
        Sport::Football,
        Sport::Basketball,
        Sport::Tennis,
        Sport::Cricket,
        Sport::Baseball,
        Sport::Volleyball,
    ];

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Football => "Football",
            Sport::Basketball => "Basketball",
            Sport::Tennis => "Tennis",
            Sport::Cricket => "Cricket",
            Sport::Baseball => "Baseball",
            Sport::Volleyball => "Volleyball",
        }
    }
}

impl FromStr for Sport {
    type Err = String;

    /// Case-insensitive, so "cricket" and "Cricket" both resolve
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sport::ALL
            .into_iter()
            .find(|sport| sport.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Invalid sport: {}", s))
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Scheduled,
    Live,
    Delayed,
    Completed,
}

impl EventStatus {
    pub const ALL: [EventStatus; 4] = [
        EventStatus::Scheduled,
        EventStatus::Live,
        EventStatus::Delayed,
        EventStatus::Completed,
    ];

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Scheduled => "scheduled",
            EventStatus::Live => "live",
            EventStatus::Delayed => "delayed",
            EventStatus::Completed => "completed",
        }
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scheduled" => Ok(EventStatus::Scheduled),
            "live" => Ok(EventStatus::Live),
            "delayed" => Ok(EventStatus::Delayed),
            "completed" => Ok(EventStatus::Completed),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A numeric field an administrator can edit while a game is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreField {
    Score1,
    Score2,
    Wickets1,
    Wickets2,
    Overs1,
    Overs2,
}

impl ScoreField {
    pub const ALL: [ScoreField; 6] = [
        ScoreField::Score1,
        ScoreField::Score2,
        ScoreField::Wickets1,
        ScoreField::Wickets2,
        ScoreField::Overs1,
        ScoreField::Overs2,
    ];

    /// Field name, also used as the column name
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreField::Score1 => "score1",
            ScoreField::Score2 => "score2",
            ScoreField::Wickets1 => "wickets1",
            ScoreField::Wickets2 => "wickets2",
            ScoreField::Overs1 => "overs1",
            ScoreField::Overs2 => "overs2",
        }
    }

    pub fn is_overs(&self) -> bool {
        matches!(self, ScoreField::Overs1 | ScoreField::Overs2)
    }

    pub fn is_wickets(&self) -> bool {
        matches!(self, ScoreField::Wickets1 | ScoreField::Wickets2)
    }
}

impl FromStr for ScoreField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "score1" => Ok(ScoreField::Score1),
            "score2" => Ok(ScoreField::Score2),
            "wickets1" => Ok(ScoreField::Wickets1),
            "wickets2" => Ok(ScoreField::Wickets2),
            "overs1" => Ok(ScoreField::Overs1),
            "overs2" => Ok(ScoreField::Overs2),
            _ => Err(format!("Invalid score field: {}", s)),
        }
    }
}

impl fmt::Display for ScoreField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event model representing a tracked sports fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub sport: Sport,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub venue: Option<String>,
    pub team1: String,
    pub team2: String,
    pub score1: f64,
    pub score2: f64,
    pub wickets1: u8,
    pub wickets2: u8,
    pub overs1: f64,
    pub overs2: f64,
    pub status: EventStatus,
    pub delay_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl Event {
    pub fn is_cricket(&self) -> bool {
        self.sport == Sport::Cricket
    }

    pub fn is_completed(&self) -> bool {
        self.status == EventStatus::Completed
    }

    /// Current value of a score field
    pub fn field_value(&self, field: ScoreField) -> f64 {
        match field {
            ScoreField::Score1 => self.score1,
            ScoreField::Score2 => self.score2,
            ScoreField::Wickets1 => f64::from(self.wickets1),
            ScoreField::Wickets2 => f64::from(self.wickets2),
            ScoreField::Overs1 => self.overs1,
            ScoreField::Overs2 => self.overs2,
        }
    }

    /// Apply a partial write the way the store does: only the named fields change
    pub fn apply_patch(&mut self, patch: &EventPatch) {
        match patch {
            EventPatch::Score { field, value } => match field {
                ScoreField::Score1 => self.score1 = *value,
                ScoreField::Score2 => self.score2 = *value,
                ScoreField::Wickets1 => self.wickets1 = wickets_from_f64(*value),
                ScoreField::Wickets2 => self.wickets2 = wickets_from_f64(*value),
                ScoreField::Overs1 => self.overs1 = *value,
                ScoreField::Overs2 => self.overs2 = *value,
            },
            EventPatch::Status {
                status,
                delay_reason,
            } => {
                self.status = *status;
                self.delay_reason = delay_reason.clone();
            }
        }
    }
}

/// Wickets are stored as integers; the value has already been normalized by the engine
pub(crate) fn wickets_from_f64(value: f64) -> u8 {
    value.round().clamp(0.0, 10.0) as u8
}

/// Unvalidated event as submitted from the "new event" form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventDraft {
    pub name: String,
    pub sport: String,
    pub date: String,
    pub time: Option<String>,
    pub venue: Option<String>,
    pub team1: String,
    pub team2: String,
}

/// Validated event record ready to be written to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub name: String,
    pub sport: Sport,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub venue: Option<String>,
    pub team1: String,
    pub team2: String,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl NewEvent {
    /// Materialize the stored event once the store has assigned its id
    pub fn into_event(self, id: Uuid) -> Event {
        Event {
            id,
            name: self.name,
            sport: self.sport,
            date: self.date,
            time: self.time,
            venue: self.venue,
            team1: self.team1,
            team2: self.team2,
            score1: 0.0,
            score2: 0.0,
            wickets1: 0,
            wickets2: 0,
            overs1: 0.0,
            overs2: 0.0,
            status: self.status,
            delay_reason: None,
            created_at: self.created_at,
            created_by: self.created_by,
        }
    }
}

/// Partial update issued against a single event document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPatch {
    /// A single score, wickets or overs field
    Score { field: ScoreField, value: f64 },
    /// Status write; `delay_reason` is `None` for every status other than delayed
    Status {
        status: EventStatus,
        delay_reason: Option<String>,
    },
}
