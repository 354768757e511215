//! Conversational mental-health triage engine.
//!
//! Routes each inbound chat message to a multi-turn screening questionnaire,
//! the crisis path, or an open-ended supportive reply.

pub mod actors;
pub mod brain;
pub mod composer;
pub mod config;
pub mod controller;
pub mod database;
pub mod error;
pub mod fallback;
pub mod models;
pub mod screening;
pub mod store;
pub mod user_locks;

#[cfg(test)]
mod tests;
