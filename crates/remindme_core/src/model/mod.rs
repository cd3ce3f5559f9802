//! Reminder domain model.
//!
//! # Responsibility
//! - Define the canonical reminder record persisted by the store.
//! - Keep field validation next to the data it guards.
//!
//! # Invariants
//! - Every reminder is identified by an immutable `ReminderId`.
//! - Deletion is a hard delete; there are no tombstones or history.

pub mod reminder;
