//! CLI subcommands

pub mod classify;
pub mod config;
pub mod doctor;
pub mod models;
pub mod run;
