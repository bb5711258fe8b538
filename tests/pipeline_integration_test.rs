//! Integration test for the orchestration pipeline
//!
//! Drives full runs through `Orchestrator` with a scripted provider and
//! checks persisted state, prompt chaining and streaming event order.

use anyhow::Result;
use async_trait::async_trait;
use chipflow::context::{
    ConversationHistory, DefaultContextAssembler, DocumentRetriever, Snippet, SourceSearch,
    SpaceDirectory,
};
use chipflow::orchestration::{OrchestrationEvent, CANCELLED_MESSAGE};
use chipflow::prelude::*;
use chipflow::provider::{assistant_message, user_message, MessageRole};
use chipflow::store::FileRunStore;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// What the scripted provider does for one call
#[derive(Clone)]
enum Reply {
    Text(&'static str),
    Fail(&'static str),
    /// Streams the text, then never finishes
    Stall(&'static str),
    /// Streams the text, then the stream itself errors
    FailMidStream(&'static str, &'static str),
}

// Mock provider replaying scripted replies in call order
struct ScriptedProvider {
    replies: Mutex<Vec<Reply>>,
    calls: Mutex<Vec<Vec<InternalMessage>>>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn next_reply(&self, messages: Vec<InternalMessage>) -> Reply {
        self.calls.lock().unwrap().push(messages);
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            Reply::Text("done")
        } else {
            replies.remove(0)
        }
    }

    fn calls(&self) -> Vec<Vec<InternalMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(
        &self,
        messages: Vec<InternalMessage>,
        _config: &GenerateConfig,
    ) -> Result<GenerateResponse> {
        match self.next_reply(messages) {
            Reply::Text(text) => Ok(GenerateResponse::new(text, "mock-model")),
            Reply::Fail(error) | Reply::FailMidStream(_, error) => anyhow::bail!(error),
            Reply::Stall(_) => std::future::pending().await,
        }
    }

    async fn generate_stream(
        &self,
        messages: Vec<InternalMessage>,
        _config: &GenerateConfig,
    ) -> Result<StreamingResponse> {
        use futures_util::stream::{self, StreamExt};

        match self.next_reply(messages) {
            Reply::Text(text) => {
                let chunks: Vec<Result<StreamChunk>> = text
                    .split_inclusive(' ')
                    .map(|part| Ok(StreamChunk::Text(part.to_string())))
                    .chain(std::iter::once(Ok(StreamChunk::Done)))
                    .collect();
                Ok(Box::pin(stream::iter(chunks)))
            }
            Reply::Fail(error) => anyhow::bail!(error),
            Reply::Stall(text) => Ok(Box::pin(
                stream::iter(vec![Ok(StreamChunk::Text(text.to_string()))])
                    .chain(stream::pending()),
            )),
            Reply::FailMidStream(text, error) => Ok(Box::pin(stream::iter(vec![
                Ok(StreamChunk::Text(text.to_string())),
                Err(anyhow::anyhow!(error)),
            ]))),
        }
    }

    fn provider_name(&self) -> &str {
        "ScriptedProvider"
    }

    fn default_model(&self) -> String {
        "mock-model".to_string()
    }
}

/// Built-in table with the design route replaced
fn router_with_design(agents: Vec<AgentId>) -> Router {
    let builtin = Router::builtin();
    Router::new(Intent::ALL.into_iter().map(|intent| {
        let route = if intent == Intent::Design {
            agents.clone()
        } else {
            builtin.route_intent(intent).unwrap()
        };
        (intent, route)
    }))
}

fn four_step_router() -> Router {
    router_with_design(vec![
        AgentId::Architect,
        AgentId::RtlEngineer,
        AgentId::Reviewer,
        AgentId::TechnicalWriter,
    ])
}

fn last_user_text(messages: &[InternalMessage]) -> String {
    messages
        .last()
        .and_then(|m| m.text())
        .unwrap_or_default()
        .to_string()
}

fn system_text(messages: &[InternalMessage]) -> String {
    messages
        .first()
        .and_then(|m| m.text())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn test_failed_step_stops_pipeline() {
    let provider = ScriptedProvider::new(vec![
        Reply::Text("spec"),
        Reply::Text("rtl"),
        Reply::Fail("backend overloaded"),
    ]);
    let orchestrator = Orchestrator::builder(provider.clone())
        .with_router(four_step_router())
        .build()
        .unwrap();

    let result = orchestrator
        .run("design a round-robin arbiter", RunOptions::new("user-1"))
        .await
        .unwrap();

    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(result.final_output, "rtl");
    let failure = result.error.clone().unwrap();
    assert_eq!(failure.order_index, 2);
    assert_eq!(failure.agent_id, AgentId::Reviewer);
    assert!(failure.message.contains("backend overloaded"));
    assert!(!failure.cancelled);

    // The fourth agent never ran
    assert_eq!(provider.calls().len(), 3);

    let tasks = orchestrator.store().list_tasks(&result.run_id).await.unwrap();
    assert_eq!(tasks.len(), 3);
    assert_eq!(tasks[0].status, TaskStatus::Completed);
    assert_eq!(tasks[0].output, "spec");
    assert_eq!(tasks[1].status, TaskStatus::Completed);
    assert_eq!(tasks[1].output, "rtl");
    assert_eq!(tasks[2].status, TaskStatus::Failed);
    assert!(tasks[2]
        .metadata
        .error
        .as_deref()
        .unwrap()
        .contains("backend overloaded"));

    let run = orchestrator
        .store()
        .get_run(&result.run_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.final_output, "rtl");
    assert!(run.completed_at.is_some());
}

#[tokio::test]
async fn test_steps_chain_previous_output() {
    let provider = ScriptedProvider::new(vec![Reply::Text("block plan"), Reply::Text("module fifo;")]);
    let orchestrator = Orchestrator::builder(provider.clone()).build().unwrap();

    let input = "design a 4-entry async FIFO";
    let result = orchestrator.run(input, RunOptions::new("user-1")).await.unwrap();
    assert!(result.is_completed());
    assert_eq!(result.intent, Intent::Design);
    assert_eq!(result.final_output, "module fifo;");

    let calls = provider.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(last_user_text(&calls[0]), input);
    assert_eq!(
        last_user_text(&calls[1]),
        format!("Previous output:\nblock plan\n\nOriginal request: {input}")
    );

    let registry = AgentRegistry::builtin();
    let architect = &registry.get(AgentId::Architect).unwrap().prompt_fragment;
    let engineer = &registry.get(AgentId::RtlEngineer).unwrap().prompt_fragment;
    assert!(system_text(&calls[0]).contains(architect.as_str()));
    assert!(system_text(&calls[1]).contains(engineer.as_str()));
    assert!(!system_text(&calls[1]).contains(architect.as_str()));

    let tasks = orchestrator.store().list_tasks(&result.run_id).await.unwrap();
    assert_eq!(tasks[1].input, last_user_text(&calls[1]));
    assert_eq!(tasks[0].metadata.model.as_deref(), Some("mock-model"));
}

#[tokio::test]
async fn test_streaming_event_order() {
    let provider = ScriptedProvider::new(vec![
        Reply::Text("plan the fifo"),
        Reply::Text("module fifo; endmodule"),
    ]);
    let orchestrator = Orchestrator::builder(provider).build().unwrap();

    let mut events = Vec::new();
    let mut sink = |event: OrchestrationEvent| events.push(event);
    let result = orchestrator
        .run_streaming("design a fifo", RunOptions::new("user-1"), &mut sink)
        .await
        .unwrap();
    assert!(result.is_completed());

    let kinds: Vec<&str> = events.iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            "run_start",
            "task_start",
            "chunk",
            "chunk",
            "chunk",
            "task_end",
            "task_start",
            "chunk",
            "chunk",
            "chunk",
            "task_end",
            "run_end",
        ]
    );
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);

    match &events[0] {
        OrchestrationEvent::RunStart { agents, intent, .. } => {
            assert_eq!(*intent, Intent::Design);
            assert_eq!(agents, &vec![AgentId::Architect, AgentId::RtlEngineer]);
        }
        other => panic!("unexpected first event: {other:?}"),
    }

    // Chunks concatenate to the task output
    let first_chunks: String = events[2..5]
        .iter()
        .map(|e| match e {
            OrchestrationEvent::Chunk { content, .. } => content.clone(),
            _ => String::new(),
        })
        .collect();
    match &events[5] {
        OrchestrationEvent::TaskEnd { output, agent_id, .. } => {
            assert_eq!(*agent_id, AgentId::Architect);
            assert_eq!(output, &first_chunks);
            assert_eq!(output, "plan the fifo");
        }
        other => panic!("expected task_end, got {other:?}"),
    }

    match events.last().unwrap() {
        OrchestrationEvent::RunEnd {
            status,
            final_output,
            run_id,
        } => {
            assert_eq!(*status, RunStatus::Completed);
            assert_eq!(final_output, "module fifo; endmodule");
            assert_eq!(run_id, &result.run_id);
        }
        other => panic!("expected run_end, got {other:?}"),
    }
}

#[tokio::test]
async fn test_streaming_failure_emits_error_then_run_end() {
    let provider = ScriptedProvider::new(vec![Reply::Text("plan"), Reply::Fail("quota exceeded")]);
    let orchestrator = Orchestrator::builder(provider).build().unwrap();

    let (mut sink, mut rx) = ChannelSink::channel();
    let result = orchestrator
        .run_streaming("design a fifo", RunOptions::new("user-1"), &mut sink)
        .await
        .unwrap();
    drop(sink);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    let kinds: Vec<&str> = events.iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec!["run_start", "task_start", "chunk", "task_end", "task_start", "error", "run_end"]
    );
    match &events[5] {
        OrchestrationEvent::Error {
            agent_id, message, ..
        } => {
            assert_eq!(*agent_id, Some(AgentId::RtlEngineer));
            assert!(message.contains("quota exceeded"));
        }
        other => panic!("expected error, got {other:?}"),
    }
    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(result.final_output, "plan");
}

#[tokio::test]
async fn test_stream_error_after_chunks_keeps_partial_output() {
    let provider = ScriptedProvider::new(vec![
        Reply::Text("plan"),
        Reply::FailMidStream("module ", "socket reset"),
    ]);
    let orchestrator = Orchestrator::builder(provider.clone())
        .with_router(four_step_router())
        .build()
        .unwrap();

    let mut events = Vec::new();
    let mut sink = |event: OrchestrationEvent| events.push(event);
    let result = orchestrator
        .run_streaming("design a fifo", RunOptions::new("user-1"), &mut sink)
        .await
        .unwrap();

    let kinds: Vec<&str> = events.iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec!["run_start", "task_start", "chunk", "task_end", "task_start", "chunk", "error", "run_end"]
    );
    match &events[6] {
        OrchestrationEvent::Error {
            agent_id, message, ..
        } => {
            assert_eq!(*agent_id, Some(AgentId::RtlEngineer));
            assert!(message.contains("socket reset"));
        }
        other => panic!("expected error, got {other:?}"),
    }

    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(result.final_output, "plan");
    let failure = result.error.unwrap();
    assert_eq!(failure.order_index, 1);
    assert!(!failure.cancelled);

    // Later agents never ran
    assert_eq!(provider.calls().len(), 2);
    let tasks = orchestrator.store().list_tasks(&result.run_id).await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[1].status, TaskStatus::Failed);
    assert_eq!(tasks[1].output, "module ");
    assert!(tasks[1]
        .metadata
        .error
        .as_deref()
        .unwrap()
        .contains("socket reset"));
}

#[tokio::test]
async fn test_cancellation_mid_stream_keeps_partial_output() {
    let provider = ScriptedProvider::new(vec![Reply::Text("plan"), Reply::Stall("module ")]);
    let orchestrator = Orchestrator::builder(provider.clone()).build().unwrap();

    let token = CancellationToken::new();
    let cancel = token.clone();
    let mut events = Vec::new();
    let mut sink = |event: OrchestrationEvent| {
        if let OrchestrationEvent::Chunk { content, .. } = &event {
            if content == "module " {
                cancel.cancel();
            }
        }
        events.push(event);
    };

    let result = orchestrator
        .run_streaming(
            "design a fifo",
            RunOptions::new("user-1").with_cancellation(token),
            &mut sink,
        )
        .await
        .unwrap();

    assert_eq!(result.status, RunStatus::Failed);
    let failure = result.error.unwrap();
    assert!(failure.cancelled);
    assert_eq!(failure.message, CANCELLED_MESSAGE);
    assert_eq!(result.final_output, "plan");

    let tasks = orchestrator.store().list_tasks(&result.run_id).await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[1].status, TaskStatus::Failed);
    assert_eq!(tasks[1].output, "module ");

    assert_eq!(events.last().map(|e| e.kind()), Some("run_end"));
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
}

// Context collaborators

struct FixedHistory;

#[async_trait]
impl ConversationHistory for FixedHistory {
    async fn recent_messages(
        &self,
        _user_id: &str,
        conversation_id: Option<&str>,
        _limit: usize,
    ) -> Result<Vec<InternalMessage>> {
        match conversation_id {
            Some(_) => Ok(vec![
                user_message("what clock does the fifo use?"),
                assistant_message("clk_wr and clk_rd"),
            ]),
            None => Ok(Vec::new()),
        }
    }
}

struct FixedSpaces;

#[async_trait]
impl SpaceDirectory for FixedSpaces {
    async fn space_instructions(&self, _user_id: &str, space_id: &str) -> Result<Option<String>> {
        Ok(Some(format!("Project {space_id} uses SystemVerilog-2017.")))
    }
}

struct FixedDocuments;

#[async_trait]
impl DocumentRetriever for FixedDocuments {
    async fn retrieve(&self, _user_id: &str, _query: &str, _limit: usize) -> Result<Vec<Snippet>> {
        Ok(vec![Snippet::new("fifo_spec.md", "Depth is 16 entries.").with_source("docs")])
    }
}

struct OfflineSearch;

#[async_trait]
impl SourceSearch for OfflineSearch {
    async fn search(&self, _kind: SourceKind, _query: &str, _limit: usize) -> Result<Vec<Snippet>> {
        anyhow::bail!("search service offline")
    }
}

#[tokio::test]
async fn test_context_reaches_every_step_and_survives_lookup_failure() {
    let provider = ScriptedProvider::new(vec![Reply::Text("plan"), Reply::Text("rtl")]);
    let assembler = DefaultContextAssembler::new()
        .with_history(Arc::new(FixedHistory))
        .with_spaces(Arc::new(FixedSpaces))
        .with_retriever(Arc::new(FixedDocuments))
        .with_search(Arc::new(OfflineSearch));
    let orchestrator = Orchestrator::builder(provider.clone())
        .with_context_assembler(Arc::new(assembler))
        .build()
        .unwrap();

    let options = RunOptions::new("user-1")
        .with_conversation("conv-1")
        .with_space("fifo-project")
        .with_sources(vec![SourceKind::Documents, SourceKind::Web]);
    let result = orchestrator.run("design a fifo", options).await.unwrap();
    assert!(result.is_completed());

    let calls = provider.calls();
    assert_eq!(calls.len(), 2);
    for call in &calls {
        // system, two history turns, step input
        assert_eq!(call.len(), 4);
        assert_eq!(call[0].role, MessageRole::System);
        assert_eq!(call[1].text(), Some("what clock does the fifo use?"));
        assert_eq!(call[2].text(), Some("clk_wr and clk_rd"));
        assert_eq!(call[3].role, MessageRole::User);

        let system = system_text(call);
        assert!(system.starts_with("Project fifo-project uses SystemVerilog-2017."));
        assert!(system.contains("## Relevant documents"));
        assert!(system.contains("Depth is 16 entries."));
        assert!(!system.contains("Web results"));
    }
}

#[tokio::test]
async fn test_file_store_persists_run_history() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn RunStore> = Arc::new(FileRunStore::new(temp_dir.path()).unwrap());
    let provider = ScriptedProvider::new(vec![Reply::Text("looks clean")]);
    let orchestrator = Orchestrator::builder(provider)
        .with_store(store)
        .build()
        .unwrap();

    let result = orchestrator
        .run("please review my arbiter", RunOptions::new("user-7"))
        .await
        .unwrap();
    assert_eq!(result.intent, Intent::Review);

    // A fresh store over the same directory sees the finished run
    let reopened = FileRunStore::new(temp_dir.path()).unwrap();
    let runs = reopened.list_runs("user-7").await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].id, result.run_id);
    assert_eq!(runs[0].status, RunStatus::Completed);
    assert_eq!(runs[0].final_output, "looks clean");

    let tasks = reopened.list_tasks(&result.run_id).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].agent_id, AgentId::Reviewer);
    assert_eq!(tasks[0].status, TaskStatus::Completed);
}

#[tokio::test]
async fn test_concurrent_runs_are_independent() {
    let provider = ScriptedProvider::new(Vec::new());
    let orchestrator = Arc::new(Orchestrator::builder(provider).build().unwrap());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move {
                orchestrator
                    .run("hello there", RunOptions::new(format!("user-{i}")))
                    .await
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.await.unwrap().unwrap();
        assert!(result.is_completed());
        let runs = orchestrator
            .store()
            .list_runs(&format!("user-{i}"))
            .await
            .unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].id, result.run_id);
    }
}
