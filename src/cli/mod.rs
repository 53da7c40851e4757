//! Command-line host for the dashboard.

pub mod commands;
