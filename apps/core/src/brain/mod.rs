//! # Brain Module
//!
//! Fast, non-LLM analysis of user input. Runs BEFORE any call to the
//! open-ended responder and owns the crisis routing decision.
//!
//! ## Components
//! - `lexicon`: immutable keyword lists for the risk classifier
//! - `risk`: tiered risk classification (LOW / MODERATE / HIGH / IMMINENT)
//! - `topic`: support topic detection for template replies

pub mod lexicon;
pub mod risk;
pub mod topic;

pub use lexicon::Lexicon;
pub use risk::{CrisisType, RiskAssessment, RiskClassifier, RiskLevel};
pub use topic::{SupportTopic, TopicClassifier};
