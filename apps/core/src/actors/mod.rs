//! Actor layer: the supervisor front door and the provider-backed responder.

pub mod messages;
pub mod responder;
pub mod supervisor;
pub mod traits;
