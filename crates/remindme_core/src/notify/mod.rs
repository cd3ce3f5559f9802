//! Notification scheduling.
//!
//! # Responsibility
//! - Derive trigger shapes from reminder timing.
//! - Keep one platform registration per reminder id.
//! - Provide backends for hosts with and without a native notification API.

pub mod memory;
pub mod outbox;
pub mod scheduler;
pub mod trigger;
