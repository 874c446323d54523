//! Workflow editing state

pub mod workflow;

pub use workflow::WorkflowStore;
