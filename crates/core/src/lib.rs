//! Core library: classification orchestration, result handling, fan-out and
//! clustering job scheduling.

pub mod classifier;
pub mod config;
pub mod error;
pub mod faces;
pub mod jobs;
pub mod models;
pub mod ownership;
pub mod pipeline;
pub mod report;
pub mod scanner;
pub mod settings;
pub mod store;
pub mod tagger;
pub mod timeout;
