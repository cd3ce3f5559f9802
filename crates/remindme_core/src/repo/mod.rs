//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the reminder collection contract used by the coordinator.
//! - Isolate blob encoding and key-value details from orchestration.
//!
//! # Invariants
//! - Repository APIs return typed `StoreError`s; degrading to "empty" is the
//!   caller's decision.

pub mod reminder_repo;
