//! Client-side helpers: identity persistence, push/poll planning, and the
//! random pick suggestion. Transport-free so a frontend or an integration
//! test can drive them directly.

/// Random pick suggestion.
pub mod pick;
/// Stored identity reconciliation.
pub mod session;
/// Push/poll synchronisation planning.
pub mod sync;
