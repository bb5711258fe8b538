//! Streaming lifecycle events and the sinks that receive them.
//!
//! For one run the observed order is always
//! `run_start, (task_start, chunk*, task_end | error)*, run_end`, with
//! `run_end` emitted exactly once and last.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::registry::AgentId;
use crate::routing::Intent;
use crate::store::RunStatus;

/// One lifecycle event of a streaming run.
///
/// Serializes as JSON tagged by `"type"`, for example
/// `{"type":"chunk","task_id":"...","content":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestrationEvent {
    RunStart {
        run_id: String,
        intent: Intent,
        /// Full ordered pipeline
        agents: Vec<AgentId>,
    },
    TaskStart {
        task_id: String,
        agent_id: AgentId,
        order_index: usize,
    },
    Chunk {
        task_id: String,
        content: String,
    },
    TaskEnd {
        task_id: String,
        agent_id: AgentId,
        /// Full accumulated output of the task
        output: String,
    },
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent_id: Option<AgentId>,
        message: String,
    },
    RunEnd {
        run_id: String,
        status: RunStatus,
        final_output: String,
    },
}

impl OrchestrationEvent {
    /// Event type name as used on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestrationEvent::RunStart { .. } => "run_start",
            OrchestrationEvent::TaskStart { .. } => "task_start",
            OrchestrationEvent::Chunk { .. } => "chunk",
            OrchestrationEvent::TaskEnd { .. } => "task_end",
            OrchestrationEvent::Error { .. } => "error",
            OrchestrationEvent::RunEnd { .. } => "run_end",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrchestrationEvent::RunEnd { .. })
    }

    /// Render as a server-sent-events frame
    pub fn to_sse(&self) -> serde_json::Result<String> {
        let data = serde_json::to_string(self)?;
        Ok(format!("event: {}\ndata: {}\n\n", self.kind(), data))
    }
}

/// Receiver of streaming events.
///
/// Implemented for any `FnMut(OrchestrationEvent) + Send` closure.
pub trait EventSink: Send {
    fn emit(&mut self, event: OrchestrationEvent);
}

impl<F> EventSink for F
where
    F: FnMut(OrchestrationEvent) + Send,
{
    fn emit(&mut self, event: OrchestrationEvent) {
        self(event)
    }
}

/// Forwards events into an unbounded channel.
///
/// A dropped receiver means the client went away; events are then
/// discarded and the run still completes and is persisted.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OrchestrationEvent>,
    closed: bool,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<OrchestrationEvent>) -> Self {
        Self { tx, closed: false }
    }

    /// Create a sink and its receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OrchestrationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: OrchestrationEvent) {
        if self.tx.send(event).is_err() && !self.closed {
            self.closed = true;
            tracing::debug!("Event receiver dropped; discarding remaining events");
        }
    }
}

/// Discards every event. Used by synchronous runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: OrchestrationEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = OrchestrationEvent::RunStart {
            run_id: "r1".to_string(),
            intent: Intent::Design,
            agents: vec![AgentId::Architect, AgentId::RtlEngineer],
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "run_start");
        assert_eq!(json["intent"], "design");
        assert_eq!(json["agents"][1], "rtl_engineer");

        let event = OrchestrationEvent::Error {
            task_id: None,
            agent_id: None,
            message: "boom".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"error","message":"boom"}"#);
    }

    #[test]
    fn test_sse_framing() {
        let event = OrchestrationEvent::Chunk {
            task_id: "t1".to_string(),
            content: "always_ff".to_string(),
        };
        assert_eq!(
            event.to_sse().unwrap(),
            "event: chunk\ndata: {\"type\":\"chunk\",\"task_id\":\"t1\",\"content\":\"always_ff\"}\n\n"
        );
    }

    #[test]
    fn test_kind_matches_serialized_tag() {
        let event = OrchestrationEvent::RunEnd {
            run_id: "r1".to_string(),
            status: RunStatus::Completed,
            final_output: "done".to_string(),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.kind());
        assert!(event.is_terminal());
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |event: OrchestrationEvent| seen.push(event.kind());
            sink.emit(OrchestrationEvent::Chunk {
                task_id: "t".to_string(),
                content: "x".to_string(),
            });
        }
        assert_eq!(seen, vec!["chunk"]);
    }

    #[tokio::test]
    async fn test_channel_sink_survives_dropped_receiver() {
        let (mut sink, mut rx) = ChannelSink::channel();
        sink.emit(OrchestrationEvent::Chunk {
            task_id: "t".to_string(),
            content: "a".to_string(),
        });
        assert_eq!(rx.recv().await.unwrap().kind(), "chunk");

        drop(rx);
        sink.emit(OrchestrationEvent::Chunk {
            task_id: "t".to_string(),
            content: "b".to_string(),
        });
        sink.emit(OrchestrationEvent::Chunk {
            task_id: "t".to_string(),
            content: "c".to_string(),
        });
    }
}
