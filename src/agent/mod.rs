//! The reasoning loop binding a chat model to the tool registry.
//!
//! A [`AgentSession::run`] call returns a [`StepStream`] that advances one
//! step per [`StepStream::next_step`]: either a model turn ([`StepEvent::Agent`])
//! or one tool execution ([`StepEvent::Tool`]). Steps are produced strictly in
//! order and each resolves fully before the next begins.

pub mod aggregate;
pub mod memory;
pub mod model;
pub mod prompt;

use crate::tools::{parse_arguments, ToolContext, ToolRegistry};
use memory::CheckpointMemory;
use model::{ChatMessage, ChatModel, ToolCall, ToolDescriptor};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, warn};

pub use aggregate::{IncompleteRun, ResponseAggregator};

#[derive(Clone, Debug, PartialEq)]
pub enum StepEvent {
    /// Model output for one turn. Empty when the turn only requested tools.
    Agent { text: String },
    /// Result of one tool call.
    Tool { name: String, text: String },
    /// The thread was persisted; carries no text.
    Checkpoint { thread_id: String, messages: usize },
}

impl StepEvent {
    pub fn text(&self) -> Option<&str> {
        match self {
            StepEvent::Agent { text } | StepEvent::Tool { text, .. } => Some(text),
            StepEvent::Checkpoint { .. } => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("{0:#}")]
    Model(anyhow::Error),
    #[error("agent stopped after {0} model turns without a final answer")]
    IterationLimit(usize),
}

#[derive(Clone, Debug)]
pub struct AgentSettings {
    pub default_thread_id: String,
    pub max_iterations: usize,
}

/// Everything a single session acts on.
#[derive(Clone)]
pub struct SessionContext {
    pub thread_id: String,
    pub registry: Arc<ToolRegistry>,
    pub tools: ToolContext,
}

/// Long-lived pieces shared by every session in the process.
pub struct AgentRuntime {
    model: Arc<dyn ChatModel>,
    memory: Arc<CheckpointMemory>,
    registry: Arc<ToolRegistry>,
    tools: ToolContext,
    instruction: String,
    settings: AgentSettings,
}

impl AgentRuntime {
    pub fn new(
        model: Arc<dyn ChatModel>,
        registry: ToolRegistry,
        tools: ToolContext,
        settings: AgentSettings,
    ) -> Self {
        Self {
            model,
            memory: Arc::new(CheckpointMemory::new()),
            registry: Arc::new(registry),
            tools,
            instruction: prompt::SYSTEM_INSTRUCTION.to_string(),
            settings,
        }
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// A session on `thread_id`, or on the configured default thread.
    pub fn session(&self, thread_id: Option<&str>) -> AgentSession {
        let thread_id = thread_id
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.settings.default_thread_id)
            .to_string();

        AgentSession {
            model: self.model.clone(),
            memory: self.memory.clone(),
            instruction: self.instruction.clone(),
            max_iterations: self.settings.max_iterations,
            context: SessionContext {
                thread_id,
                registry: self.registry.clone(),
                tools: self.tools.clone(),
            },
        }
    }
}

pub struct AgentSession {
    model: Arc<dyn ChatModel>,
    memory: Arc<CheckpointMemory>,
    instruction: String,
    max_iterations: usize,
    context: SessionContext,
}

impl AgentSession {
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Starts a pass over the thread with `message` appended.
    ///
    /// The thread stays locked until the stream finishes or is dropped, so
    /// concurrent runs on one thread take turns instead of overwriting each
    /// other's checkpoints.
    pub async fn run(&self, message: &str) -> StepStream<'_> {
        let thread = self.memory.lock_thread(&self.context.thread_id).await;
        let mut history = self.memory.load(&self.context.thread_id).await;
        history.push(ChatMessage::user(message));

        let descriptors = self
            .context
            .registry
            .all()
            .map(|t| ToolDescriptor {
                name: t.name(),
                description: t.description(),
                schema: t.schema(),
            })
            .collect();

        StepStream {
            session: self,
            descriptors,
            history,
            pending: VecDeque::new(),
            turns: 0,
            state: StreamState::AwaitingModel,
            thread: Some(thread),
        }
    }
}

enum StreamState {
    AwaitingModel,
    Answered,
    Done,
}

/// Pull-based step sequence for one [`AgentSession::run`] call.
pub struct StepStream<'a> {
    session: &'a AgentSession,
    descriptors: Vec<ToolDescriptor>,
    history: Vec<ChatMessage>,
    pending: VecDeque<ToolCall>,
    turns: usize,
    state: StreamState,
    thread: Option<OwnedMutexGuard<()>>,
}

impl StepStream<'_> {
    /// The next step, or `None` once the model has answered without
    /// requesting tools. A returned error ends the stream; the thread is
    /// still saved up to its last answered tool call.
    pub async fn next_step(&mut self) -> Option<Result<StepEvent, AgentError>> {
        if let Some(call) = self.pending.pop_front() {
            return Some(Ok(self.run_tool(call).await));
        }

        match self.state {
            StreamState::Done => None,
            StreamState::Answered => {
                self.state = StreamState::Done;
                Some(Ok(self.checkpoint().await))
            }
            StreamState::AwaitingModel => {
                let turn = self.model_turn().await;
                if turn.is_err() {
                    self.persist().await;
                }
                Some(turn)
            }
        }
    }

    async fn model_turn(&mut self) -> Result<StepEvent, AgentError> {
        let session = self.session;
        if self.turns >= session.max_iterations {
            self.state = StreamState::Done;
            warn!(
                "thread {} hit the {} turn limit",
                session.context.thread_id, session.max_iterations
            );
            return Err(AgentError::IterationLimit(session.max_iterations));
        }
        self.turns += 1;

        let mut messages = Vec::with_capacity(self.history.len() + 1);
        messages.push(ChatMessage::system(session.instruction.clone()));
        messages.extend(self.history.iter().cloned());

        let reply = match session.model.complete(&messages, &self.descriptors).await {
            Ok(reply) => reply,
            Err(e) => {
                self.state = StreamState::Done;
                return Err(AgentError::Model(e));
            }
        };

        let text = reply.content.clone().unwrap_or_default();
        if reply.tool_calls.is_empty() {
            self.state = StreamState::Answered;
        } else {
            self.pending.extend(reply.tool_calls.iter().cloned());
        }
        self.history.push(ChatMessage::Assistant {
            content: reply.content,
            tool_calls: reply.tool_calls,
        });

        Ok(StepEvent::Agent { text })
    }

    async fn run_tool(&mut self, call: ToolCall) -> StepEvent {
        let context = &self.session.context;
        let name = call.function.name;

        let text = match parse_arguments(&call.function.arguments) {
            Ok(args) => context.registry.dispatch(&name, args, &context.tools).await,
            Err(e) => format!("Invalid arguments for {name}: arguments are not JSON ({e})"),
        };
        debug!("tool {} answered: {}", name, text);

        self.history.push(ChatMessage::tool(call.id, text.clone()));
        StepEvent::Tool { name, text }
    }

    async fn checkpoint(&mut self) -> StepEvent {
        self.persist().await;
        StepEvent::Checkpoint {
            thread_id: self.session.context.thread_id.clone(),
            messages: self.history.len(),
        }
    }

    // Only called with no tool call pending, so a stored thread never ends
    // in an unanswered tool call. Releases the thread afterwards.
    async fn persist(&mut self) {
        if self.thread.is_none() {
            return;
        }
        let thread_id = &self.session.context.thread_id;
        self.session
            .memory
            .save(thread_id, self.history.clone())
            .await;
        debug!("saved {} messages on thread {}", self.history.len(), thread_id);
        self.thread = None;
    }
}
