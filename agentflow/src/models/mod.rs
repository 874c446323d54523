//! Data models

pub mod agent;
pub mod execution;
pub mod workflow;
