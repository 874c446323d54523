//! Server state

use std::sync::Arc;

use crate::gateway::WorkflowGateway;

/// Server state shared across handlers
pub struct ServerState {
    pub gateway: Arc<dyn WorkflowGateway>,
}

impl ServerState {
    pub fn new(gateway: Arc<dyn WorkflowGateway>) -> Self {
        Self { gateway }
    }
}
