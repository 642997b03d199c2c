// Common library for the payer accumulation scheduling pipeline

pub mod composer;
pub mod config;
pub mod errors;
pub mod files;
pub mod models;
pub mod payers;
pub mod schedule;
pub mod storage;
pub mod telemetry;
