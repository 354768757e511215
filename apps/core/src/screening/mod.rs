//! # Screening Module
//!
//! Multi-turn self-report questionnaires (PHQ-9, GAD-7).
//!
//! ## Components
//! - `instrument`: question bank and severity band tables
//! - `engine`: the per-answer state machine and scoring

pub mod engine;
pub mod instrument;

pub use engine::{ScreeningEngine, ScreeningResult, ScreeningStep, ValidationError};
pub use instrument::{Instrument, Severity, SeverityBand};
