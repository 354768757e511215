//! Screening state machine.
//!
//! States are `Normal`, `ScreeningPhq9(step)` and `ScreeningGad7(step)`. The
//! engine never mutates the state it is given: every transition returns a new
//! `ConversationState`, so a rejected answer leaves the caller's copy untouched.

use crate::composer;
use crate::models::ConversationState;
use crate::screening::instrument::{Instrument, Severity, MAX_ANSWER};
use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;
use thiserror::Error;

/// Why an answer was rejected. Recoverable: the user is simply re-prompted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum ValidationError {
    #[error("answer is not a number")]
    NotANumber,
    #[error("answer {0} is outside the 0-3 scale")]
    OutOfRange(i64),
    #[error("no screening is in progress")]
    NoActiveScreening,
}

/// Outcome of a completed questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub instrument: Instrument,
    pub total_score: u8,
    pub severity: Severity,
    pub recommendation: String,
    /// Crisis resources should follow the result message.
    pub escalate: bool,
    pub responses: Vec<u8>,
}

/// Result of one accepted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreeningStep {
    /// More questions remain; `state` must be persisted.
    NextQuestion {
        prompt: String,
        state: ConversationState,
    },
    /// The last question was answered; `state` is back to normal.
    Completed {
        result: ScreeningResult,
        state: ConversationState,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ScreeningEngine;

impl ScreeningEngine {
    pub fn new() -> Self {
        Self
    }

    /// Begins (or restarts) a questionnaire. Any screening already in progress is
    /// discarded by the caller persisting the returned state.
    pub fn start(&self, user_id: &str, instrument: Instrument) -> (ConversationState, String) {
        (
            ConversationState::screening(user_id, instrument),
            composer::screening_intro(instrument),
        )
    }

    /// Applies one raw answer to `state`.
    pub fn submit_answer(
        &self,
        state: &ConversationState,
        raw_input: &str,
    ) -> Result<ScreeningStep, ValidationError> {
        let instrument = state
            .mode
            .instrument()
            .ok_or(ValidationError::NoActiveScreening)?;
        let answer = parse_answer(raw_input)?;

        let mut next = state.clone();
        next.responses.push(answer);
        let step = next.step();

        if step < instrument.question_count() {
            return Ok(ScreeningStep::NextQuestion {
                prompt: composer::question_prompt(instrument, step),
                state: next,
            });
        }

        let result = score(instrument, &next.responses);
        Ok(ScreeningStep::Completed {
            result,
            state: ConversationState::normal(state.user_id.clone()),
        })
    }
}

/// Parses a 0-3 answer. Surrounding whitespace and a leading sign are accepted;
/// integers too large for `i64` count as out of range rather than non-numeric.
pub fn parse_answer(raw_input: &str) -> Result<u8, ValidationError> {
    let value = match raw_input.trim().parse::<i64>() {
        Ok(value) => value,
        Err(e) => {
            return Err(match e.kind() {
                IntErrorKind::PosOverflow => ValidationError::OutOfRange(i64::MAX),
                IntErrorKind::NegOverflow => ValidationError::OutOfRange(i64::MIN),
                _ => ValidationError::NotANumber,
            })
        }
    };
    if (0..=MAX_ANSWER as i64).contains(&value) {
        Ok(value as u8)
    } else {
        Err(ValidationError::OutOfRange(value))
    }
}

/// Sums the answers and looks up the band.
pub fn score(instrument: Instrument, responses: &[u8]) -> ScreeningResult {
    let total: u32 = responses.iter().map(|&r| r as u32).sum();
    let total_score = total.min(instrument.max_score() as u32) as u8;
    let band = instrument.band_for(total_score);
    ScreeningResult {
        instrument,
        total_score,
        severity: band.severity,
        recommendation: band.recommendation.to_string(),
        escalate: total_score >= instrument.escalation_threshold(),
        responses: responses.to_vec(),
    }
}
