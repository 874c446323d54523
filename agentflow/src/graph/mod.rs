//! Graph algorithms over workflow definitions

pub mod branch;
pub mod order;
pub mod validate;

pub use branch::{evaluate_condition, select_branch, FALSE_HANDLE, TRUE_HANDLE};
pub use order::{adjacency, execution_order, Link};
pub use validate::{validate, ValidationIssue};
