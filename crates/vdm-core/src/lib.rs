pub mod config;
pub mod logging;

pub mod control;
pub mod fetcher;
pub mod job;
pub mod orchestrator;
pub mod progress;
pub mod registry;
