//! Reminder search.
//!
//! # Responsibility
//! - Filter a collection snapshot by title for the list view.

pub mod title_filter;
