//! Status state machines for executions
//!
//! Node status: `pending -> running -> success | error`, with `pending -> error`
//! for nodes that fail before starting. Execution status:
//! `pending -> running -> completed | failed`, with `pending -> failed`.
//! Nothing moves backward and terminal states are final.

use std::fmt::Debug;

use crate::errors::FlowError;
use crate::models::execution::{ExecutionStatus, NodeStatus};

/// A status with a fixed transition table
pub trait StatusMachine: Copy + Debug + PartialEq {
    /// Whether `self -> next` is allowed
    fn can_transition_to(self, next: Self) -> bool;

    /// Whether no further transition is possible
    fn is_terminal(self) -> bool;
}

impl StatusMachine for NodeStatus {
    fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (NodeStatus::Pending, NodeStatus::Running)
                | (NodeStatus::Pending, NodeStatus::Error)
                | (NodeStatus::Running, NodeStatus::Success)
                | (NodeStatus::Running, NodeStatus::Error)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, NodeStatus::Success | NodeStatus::Error)
    }
}

impl StatusMachine for ExecutionStatus {
    fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (ExecutionStatus::Pending, ExecutionStatus::Running)
                | (ExecutionStatus::Pending, ExecutionStatus::Failed)
                | (ExecutionStatus::Running, ExecutionStatus::Completed)
                | (ExecutionStatus::Running, ExecutionStatus::Failed)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }
}

/// Move `current` to `next`, or fail without changing it
pub fn advance<S: StatusMachine>(current: &mut S, next: S) -> Result<(), FlowError> {
    if !current.can_transition_to(next) {
        return Err(FlowError::InvalidTransition(format!(
            "{:?} -> {:?}",
            current, next
        )));
    }
    *current = next;
    Ok(())
}
