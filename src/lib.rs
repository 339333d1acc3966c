//! Household budget summary, retirement balance forecast and JSON report
//! export, with a one-shot CLI and a small HTTP API on top.

pub mod api;
pub mod core;
