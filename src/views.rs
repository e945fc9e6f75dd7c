//! Dashboard projections over a snapshot of events.

use crate::models::{Event, EventStatus};
use crate::scoring::{compute_winner, winning_margin, Outcome};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dashboard tab. Delayed events are only listed under `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Upcoming,
    Live,
    Completed,
    All,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Upcoming, Tab::Live, Tab::Completed, Tab::All];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Upcoming => "upcoming",
            Tab::Live => "live",
            Tab::Completed => "completed",
            Tab::All => "all",
        }
    }

    /// Whether an event with `status` is listed under this tab
    pub fn includes(&self, status: EventStatus) -> bool {
        match self {
            Tab::Upcoming => status == EventStatus::Scheduled,
            Tab::Live => status == EventStatus::Live,
            Tab::Completed => status == EventStatus::Completed,
            Tab::All => true,
        }
    }

    /// Placeholder text for a tab with nothing in it
    pub fn empty_message(&self) -> String {
        format!("No {} events", self.as_str())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tab::ALL
            .into_iter()
            .find(|tab| tab.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("Invalid tab: {}", s))
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events listed under `tab`, in snapshot order
pub fn filter_by_tab(events: &[Event], tab: Tab) -> Vec<&Event> {
    events.iter().filter(|e| tab.includes(e.status)).collect()
}

/// Number of events under each tab
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabCounts {
    pub upcoming: usize,
    pub live: usize,
    pub completed: usize,
    pub all: usize,
}

impl TabCounts {
    pub fn get(&self, tab: Tab) -> usize {
        match tab {
            Tab::Upcoming => self.upcoming,
            Tab::Live => self.live,
            Tab::Completed => self.completed,
            Tab::All => self.all,
        }
    }
}

pub fn tab_counts(events: &[Event]) -> TabCounts {
    events.iter().fold(TabCounts::default(), |mut counts, event| {
        match event.status {
            EventStatus::Scheduled => counts.upcoming += 1,
            EventStatus::Live => counts.live += 1,
            EventStatus::Completed => counts.completed += 1,
            EventStatus::Delayed => {}
        }
        counts.all += 1;
        counts
    })
}

/// Event card data: the stored event plus its derived result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    #[serde(flatten)]
    pub event: Event,
    pub outcome: Option<Outcome>,
    pub margin_runs: Option<f64>,
}

impl EventSummary {
    /// Winning team name or "Draw"
    pub fn result_label(&self) -> Option<&str> {
        self.outcome.as_ref().map(Outcome::label)
    }
}

pub fn summarize(event: &Event) -> EventSummary {
    EventSummary {
        event: event.clone(),
        outcome: compute_winner(event),
        margin_runs: winning_margin(event),
    }
}
