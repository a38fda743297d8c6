//! Event types for observing flow execution
//!
//! The runner reports each run, every node execution and every value
//! copied across a link to an `EventSink`. Sinks are how hosts trace a
//! run without the engine knowing about terminals, UIs or channels.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Trait for receiving flow events
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be delivered
    fn send(&self, event: FlowEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone, Error)]
#[error("Event error: {message}")]
pub struct EventError {
    pub message: String,
}

impl EventError {
    pub fn channel_closed() -> Self {
        Self {
            message: "Channel closed".to_string(),
        }
    }
}

/// Events emitted while a runner executes its roots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FlowEvent {
    /// A run over all roots started
    #[serde(rename_all = "camelCase")]
    RunStarted {
        execution_id: String,
        roots: Vec<String>,
    },

    /// A node finished executing
    #[serde(rename_all = "camelCase")]
    NodeExecuted {
        execution_id: String,
        node_id: String,
    },

    /// A value was copied from an output port to an input port
    #[serde(rename_all = "camelCase")]
    ValuePropagated {
        execution_id: String,
        source: String,
        source_port: String,
        target: String,
        target_port: String,
        value: serde_json::Value,
    },

    /// All roots ran to completion
    #[serde(rename_all = "camelCase")]
    RunCompleted {
        execution_id: String,
        executed_nodes: usize,
    },

    /// A node failed and the remaining roots were abandoned
    #[serde(rename_all = "camelCase")]
    RunFailed {
        execution_id: String,
        error: String,
    },
}

impl FlowEvent {
    /// Create a node executed event
    pub fn node_executed(execution_id: &str, node_id: &str) -> Self {
        Self::NodeExecuted {
            execution_id: execution_id.to_string(),
            node_id: node_id.to_string(),
        }
    }

    /// Execution ID carried by every event
    pub fn execution_id(&self) -> &str {
        match self {
            Self::RunStarted { execution_id, .. }
            | Self::NodeExecuted { execution_id, .. }
            | Self::ValuePropagated { execution_id, .. }
            | Self::RunCompleted { execution_id, .. }
            | Self::RunFailed { execution_id, .. } => execution_id,
        }
    }
}

/// Deliver an event, logging rather than failing when the sink refuses it
pub(crate) fn emit(sink: &dyn EventSink, event: FlowEvent) {
    if let Err(err) = sink.send(event) {
        log::warn!("Dropped flow event: {}", err);
    }
}

/// A no-op event sink that discards all events
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: FlowEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: Mutex<Vec<FlowEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<FlowEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// IDs of executed nodes, in execution order
    pub fn executed_nodes(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                FlowEvent::NodeExecuted { node_id, .. } => Some(node_id),
                _ => None,
            })
            .collect()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: FlowEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .map_err(|_| EventError {
                message: "Event buffer poisoned".to_string(),
            })?
            .push(event);
        Ok(())
    }
}
