//! Request/response payloads exchanged with clients.

/// Health check payloads.
pub mod health;
/// Participant payloads.
pub mod participant;
/// Results and tally payloads.
pub mod results;
/// Room payloads.
pub mod room;
/// Server-sent event payloads.
pub mod sse;
/// Input validation helpers.
pub mod validation;
/// Vote payloads.
pub mod vote;
