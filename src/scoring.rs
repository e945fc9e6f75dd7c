//! Score entry and derived results.
//!
//! Score input comes straight from a text box while a game is running, so
//! parsing never fails: anything that does not start with a number counts
//! as 0. Cricket overs are written `overs.balls` with six balls to the over,
//! and a balls digit of 6 or more is carried into completed overs.

use crate::error::{AppError, AppResult};
use crate::models::{Event, ScoreField};
use serde::{Deserialize, Serialize};

/// Balls in a cricket over
const BALLS_PER_OVER: f64 = 6.0;
/// Most wickets a side can lose in an innings
const MAX_WICKETS: f64 = 10.0;

/// Longest prefix of `input` that reads as a decimal number, in the manner of
/// a lenient `parseFloat`: `"12.5 runs"` yields `"12.5"`, `"abc"` yields `""`.
fn numeric_prefix(input: &str) -> &str {
    let bytes = input.as_bytes();
    let mut i = 0;

    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut has_digits = i > int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        has_digits |= i > frac_start;
    }

    if !has_digits {
        return "";
    }
    let mut end = i;

    // Exponent only counts when it has digits of its own
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            end = j;
        }
    }

    &input[..end]
}

/// Coerce free-form input to a number. Unparseable or non-finite input is 0.
pub fn coerce_number(raw: &str) -> f64 {
    numeric_prefix(raw.trim_start())
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Carry a balls digit of 6 or more into completed overs: `2.7` becomes `3.1`.
///
/// Only the first fractional digit is read, so already-normalized values are
/// fixed points and extra precision is dropped.
pub fn normalize_overs(value: f64) -> f64 {
    let whole = value.floor();
    let balls = ((value - whole) * 10.0).round();

    if balls >= BALLS_PER_OVER {
        let extra_overs = (balls / BALLS_PER_OVER).floor();
        let remainder = balls % BALLS_PER_OVER;
        whole + extra_overs + remainder / 10.0
    } else {
        whole + balls / 10.0
    }
}

/// Normalized value to store for `field` given what the administrator typed.
///
/// Negative input is stored as 0 and wickets are whole numbers capped at 10.
/// The carry rule applies to overs of cricket events only; other sports keep
/// the value as typed even if an overs field is written.
pub fn apply_score_update(event: &Event, field: ScoreField, raw: &str) -> f64 {
    let value = coerce_number(raw);
    let value = if value <= 0.0 { 0.0 } else { value };

    if field.is_wickets() {
        return value.round().min(MAX_WICKETS);
    }
    if field.is_overs() && event.is_cricket() {
        return normalize_overs(value);
    }
    value
}

/// Parse a field name received from a client
pub fn parse_score_field(name: &str) -> AppResult<ScoreField> {
    name.parse::<ScoreField>().map_err(AppError::Validation)
}

/// Result of a completed game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "team", rename_all = "lowercase")]
pub enum Outcome {
    Winner(String),
    Draw,
}

impl Outcome {
    /// Text shown on the result badge
    pub fn label(&self) -> &str {
        match self {
            Outcome::Winner(team) => team,
            Outcome::Draw => "Draw",
        }
    }
}

/// Winner of a completed event; `None` while the event is not completed
pub fn compute_winner(event: &Event) -> Option<Outcome> {
    if !event.is_completed() {
        return None;
    }
    if event.score1 > event.score2 {
        Some(Outcome::Winner(event.team1.clone()))
    } else if event.score2 > event.score1 {
        Some(Outcome::Winner(event.team2.clone()))
    } else {
        Some(Outcome::Draw)
    }
}

/// Winning margin in runs, for completed cricket games that were not drawn
pub fn winning_margin(event: &Event) -> Option<f64> {
    match compute_winner(event) {
        Some(Outcome::Winner(_)) if event.is_cricket() => Some((event.score1 - event.score2).abs()),
        _ => None,
    }
}
