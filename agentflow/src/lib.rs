//! agentflow library
//!
//! Workflow graph model, editing store, graph algorithms, execution
//! tracking and the workflow service boundary.

pub mod catalog;
pub mod cli;
pub mod errors;
pub mod execution;
pub mod filesys;
pub mod gateway;
pub mod graph;
pub mod logs;
pub mod models;
pub mod server;
pub mod storage;
pub mod store;
pub mod utils;
