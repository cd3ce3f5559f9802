//! Flutter bridge crate for RemindMe.

pub mod api;
