#![forbid(unsafe_code)]

pub mod app;
pub mod cli;
pub mod commands;
pub mod dashboard;
pub mod formats;
pub mod ingest;
pub mod logging;
pub mod lookup;
pub mod stats;
pub mod store;
