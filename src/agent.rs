// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
//! The agent: drives the reason/act/observe cycle for one conversation.
//!
//! Each `run` appends the user message, then loops: call the provider; if
//! the response carries tool calls, execute them sequentially in provider
//! order and append the observations; otherwise the text is the final
//! answer.  The iteration cap bounds the number of provider calls per run.

use std::ops::ControlFlow;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::warn;

use reagent_config::{AgentConfig, LlmParams};
use reagent_core::{Arena, ArenaStats, Error, Result};
use reagent_model::{
    ChatRequest, ChatResponse, DeltaKind, Message, Provider, Role, StreamEvent, Usage,
};
use reagent_tools::{result_is_error, ToolContext, ToolRegistry};

use crate::events::AgentEvent;
use crate::hooks::{
    self, IterationInfo, LlmRequestInfo, LlmResponseInfo, RunEndInfo, RunStartInfo, ToolEndInfo,
    ToolStartInfo,
};
use crate::session::SessionShared;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The model produced a final (possibly empty) answer.
    Success,
    /// The iteration cap was reached before a final answer.
    MaxIterations,
    /// A provider turn failed (transport, HTTP, or parse); the transcript
    /// holds no partial state from the failed turn.
    ProviderError,
    /// A stream observer aborted the turn.
    Aborted,
}

/// Outcome of one [`Agent::run`].
#[derive(Debug, Clone)]
pub struct RunResult {
    pub status: RunStatus,
    /// Final answer text; `None` when the run ended without one.
    pub content: Option<String>,
    /// Provider calls made.
    pub iterations: u32,
    /// Token usage accumulated across all iterations of this run.
    pub usage: Usage,
    pub duration: Duration,
}

type StreamObserver = Box<dyn FnMut(&StreamEvent) -> ControlFlow<()> + Send>;

/// A conversation bound to one provider, with an optional tool registry.
///
/// The transcript is owned by the agent and strictly append-only; its order
/// is the order of provider interactions and tool executions.  Partial
/// progress survives failed runs, so a later `run` on the same agent
/// continues the conversation.
pub struct Agent {
    shared: Arc<SessionShared>,
    config: AgentConfig,
    params: LlmParams,
    provider: Box<dyn Provider>,
    tools: Option<Arc<ToolRegistry>>,
    transcript: Vec<Message>,
    /// Per-run scratch region, also lent to tools during their calls.
    arena: Arena,
    max_iterations: u32,
    events: Option<mpsc::Sender<AgentEvent>>,
    stream_observer: Option<StreamObserver>,
    total_usage: Usage,
    runs: u32,
}

impl Agent {
    pub(crate) fn new(
        shared: Arc<SessionShared>,
        config: AgentConfig,
        params: LlmParams,
        provider: Box<dyn Provider>,
    ) -> Self {
        let max_iterations = if config.max_iterations == 0 {
            warn!("max_iterations of 0 clamped to 1");
            1
        } else {
            config.max_iterations
        };
        Self {
            shared,
            config,
            params,
            provider,
            tools: None,
            transcript: Vec::new(),
            arena: Arena::new(),
            max_iterations,
            events: None,
            stream_observer: None,
            total_usage: Usage::default(),
            runs: 0,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.config.name.as_deref()
    }

    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    /// Attach a tool registry; must happen before `run`.
    pub fn set_tools(&mut self, tools: Arc<ToolRegistry>) {
        self.tools = Some(tools);
    }

    pub fn tools(&self) -> Option<&Arc<ToolRegistry>> {
        self.tools.as_ref()
    }

    /// The conversation so far, in append order.
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn message_count(&self) -> usize {
        self.transcript.len()
    }

    pub fn params(&self) -> &LlmParams {
        &self.params
    }

    /// Mutable access to the parameters that may change between runs: the
    /// stream flag, the thinking configuration, and the stateful chaining
    /// id.  Other fields are fixed at provider construction.
    pub fn params_mut(&mut self) -> &mut LlmParams {
        &mut self.params
    }

    /// Open an event channel for this agent's progress events.
    pub fn subscribe(&mut self, capacity: usize) -> mpsc::Receiver<AgentEvent> {
        let (tx, rx) = mpsc::channel(capacity);
        self.events = Some(tx);
        rx
    }

    /// Like [`subscribe`](Agent::subscribe), but wraps the channel in a
    /// `Stream` so embedders can drive it with `StreamExt` combinators.
    pub fn event_stream(
        &mut self,
        capacity: usize,
    ) -> tokio_stream::wrappers::ReceiverStream<AgentEvent> {
        tokio_stream::wrappers::ReceiverStream::new(self.subscribe(capacity))
    }

    /// Install a streaming observer.  The observer sees every uniform stream
    /// event of every streamed provider turn and may return
    /// `ControlFlow::Break` to abort the run ([`RunStatus::Aborted`]).
    pub fn set_stream_observer(
        &mut self,
        observer: impl FnMut(&StreamEvent) -> ControlFlow<()> + Send + 'static,
    ) {
        self.stream_observer = Some(Box::new(observer));
    }

    /// Usage accumulated over the agent's lifetime.
    pub fn total_usage(&self) -> Usage {
        self.total_usage
    }

    pub fn runs(&self) -> u32 {
        self.runs
    }

    pub fn arena_stats(&self) -> ArenaStats {
        self.arena.stats()
    }

    /// Drive one user turn to completion.
    pub async fn run(&mut self, input: &str) -> Result<RunResult> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(Error::InvalidState("session is closed".into()));
        }
        let start = Instant::now();
        self.arena.reset();
        let mut usage = Usage::default();
        let mut iterations = 0u32;
        let mut final_content: Option<String> = None;
        let mut status = RunStatus::Success;

        if let Some(h) = hooks::active() {
            h.run_start(&RunStartInfo { agent: self.config.name.as_deref(), input });
        }

        // Instructions become the system message on the first run only.
        if self.transcript.is_empty() {
            if let Some(instructions) = &self.config.instructions {
                self.transcript.push(Message::system(instructions));
            }
        }
        self.transcript.push(Message::user(input));

        // Tool schema is built once per run.
        let schema = self.tools.as_ref().map(|t| t.schema());

        for iteration in 1..=self.max_iterations {
            iterations = iteration;
            if let Some(h) = hooks::active() {
                h.iter_start(&IterationInfo { iteration });
            }
            self.emit(AgentEvent::IterationStarted(iteration));

            if let Some(h) = hooks::active() {
                h.llm_request(&LlmRequestInfo {
                    messages: &self.transcript,
                    tools: schema.as_ref(),
                });
            }

            let llm_start = Instant::now();
            let (outcome, aborted) = self.provider_turn(&schema).await;
            let response = match outcome {
                Ok(r) => r,
                Err(e) => {
                    // The failed turn leaves no trace in the transcript; the
                    // user message stays so the next run can continue.
                    status =
                        if aborted { RunStatus::Aborted } else { RunStatus::ProviderError };
                    warn!(iteration, error = %e, "provider turn failed");
                    break;
                }
            };
            if let Some(h) = hooks::active() {
                h.llm_response(&LlmResponseInfo {
                    response: &response,
                    duration: llm_start.elapsed(),
                });
            }
            usage.add(&response.usage);
            self.emit(AgentEvent::TokenUsage {
                input: response.usage.input,
                output: response.usage.output,
                cache_read: response.usage.cache_read,
                cache_create: response.usage.cache_create,
            });

            let tool_uses: Vec<(String, String, String)> = response
                .tool_uses()
                .into_iter()
                .map(|(id, name, args)| (id.to_string(), name.to_string(), args.to_string()))
                .collect();

            if !tool_uses.is_empty() {
                // Commit the assistant message first, with every block —
                // thinking and redacted blocks included, so the provider
                // serializer can echo them on the next request.
                self.transcript
                    .push(Message { role: Role::Assistant, blocks: response.blocks.clone() });

                // Sequential execution in provider order keeps inter-call
                // dependencies and the transcript deterministic.
                for (id, name, args) in &tool_uses {
                    if let Some(h) = hooks::active() {
                        h.tool_start(&ToolStartInfo { id, name, args, iteration });
                    }
                    self.emit(AgentEvent::ToolCallStarted {
                        id: id.clone(),
                        name: name.clone(),
                        args: args.clone(),
                    });

                    let tool_start = Instant::now();
                    let result = self.execute_tool(name, args).await;
                    let is_error = result_is_error(&result);

                    if let Some(h) = hooks::active() {
                        h.tool_end(&ToolEndInfo {
                            id,
                            name,
                            result: &result,
                            success: !is_error,
                            duration: tool_start.elapsed(),
                        });
                    }
                    self.emit(AgentEvent::ToolCallFinished {
                        id: id.clone(),
                        name: name.clone(),
                        result: result.clone(),
                        is_error,
                    });

                    self.transcript.push(Message::tool_result(id, result, is_error));
                }
                if let Some(h) = hooks::active() {
                    h.iter_end(&IterationInfo { iteration });
                }
                continue;
            }

            // No tool calls: this is the final answer, even when empty.
            let text = response.text();
            self.transcript
                .push(Message { role: Role::Assistant, blocks: response.blocks.clone() });
            if !text.is_empty() {
                self.emit(AgentEvent::TextComplete(text.clone()));
            }
            final_content = Some(text);
            if let Some(h) = hooks::active() {
                h.iter_end(&IterationInfo { iteration });
            }
            break;
        }

        if final_content.is_none() && status == RunStatus::Success {
            status = RunStatus::MaxIterations;
        }

        let result = RunResult {
            status,
            content: final_content,
            iterations,
            usage,
            duration: start.elapsed(),
        };
        self.total_usage.add(&usage);
        self.runs += 1;
        if let Some(h) = hooks::active() {
            h.run_end(&RunEndInfo {
                agent: self.config.name.as_deref(),
                status: result.status,
                iterations: result.iterations,
                usage: &result.usage,
                duration: result.duration,
            });
        }
        self.emit(AgentEvent::TurnComplete);
        Ok(result)
    }

    /// One provider interaction.  Returns the outcome plus whether a stream
    /// observer aborted it (the abort surfaces as an error from the driver;
    /// the flag is what distinguishes `Aborted` from `ProviderError`).
    async fn provider_turn(&mut self, schema: &Option<Value>) -> (Result<ChatResponse>, bool) {
        let req = ChatRequest {
            messages: self.transcript.clone(),
            tools: schema.clone(),
            thinking: Some(self.params.thinking.clone()),
        };
        if !self.params.stream {
            return (self.provider.chat(req).await, false);
        }

        let events = if self.config.emit_events { self.events.clone() } else { None };
        let observer = &mut self.stream_observer;
        let mut aborted = false;
        let mut handler = |ev: &StreamEvent| -> ControlFlow<()> {
            if let Some(tx) = &events {
                match ev {
                    StreamEvent::Delta { kind: DeltaKind::Text, data, .. } => {
                        let _ = tx.try_send(AgentEvent::TextDelta(data.clone()));
                    }
                    StreamEvent::Delta {
                        kind: DeltaKind::Thinking | DeltaKind::Reasoning,
                        data,
                        ..
                    } => {
                        let _ = tx.try_send(AgentEvent::ThinkingDelta(data.clone()));
                    }
                    _ => {}
                }
            }
            if let Some(obs) = observer.as_deref_mut() {
                if obs(ev).is_break() {
                    aborted = true;
                    return ControlFlow::Break(());
                }
            }
            ControlFlow::Continue(())
        };
        let outcome = self.provider.chat_stream(req, &mut handler).await;
        drop(handler);
        (outcome, aborted)
    }

    /// Execute one requested tool call; the returned string is always a JSON
    /// payload for the model, never a loop failure.
    async fn execute_tool(&self, name: &str, args: &str) -> String {
        let ctx = ToolContext {
            session_id: Some(&self.shared.id),
            working_dir: self.shared.working_dir.as_deref(),
            scratch: Some(&self.arena),
            user_data: None,
        };
        match &self.tools {
            Some(registry) => match registry.call(name, args, &ctx).await {
                Ok(result) => result,
                Err(e) => json!({ "error": e.to_string() }).to_string(),
            },
            None => json!({ "error": format!("unknown tool: {name}") }).to_string(),
        }
    }

    fn emit(&self, event: AgentEvent) {
        if !self.config.emit_events {
            return;
        }
        if let Some(tx) = &self.events {
            let _ = tx.try_send(event);
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use reagent_model::ScriptedProvider;

    fn shared() -> Arc<SessionShared> {
        Arc::new(SessionShared {
            id: "test-session".into(),
            working_dir: None,
            closed: std::sync::atomic::AtomicBool::new(false),
        })
    }

    fn agent_with(provider: ScriptedProvider, config: AgentConfig) -> Agent {
        Agent::new(shared(), config, LlmParams::default(), Box::new(provider))
    }

    #[test]
    fn zero_max_iterations_clamped_to_one() {
        let config = AgentConfig { max_iterations: 0, ..AgentConfig::default() };
        let agent = agent_with(ScriptedProvider::text("x"), config);
        assert_eq!(agent.max_iterations, 1);
    }

    #[test]
    fn default_max_iterations_is_ten() {
        let agent = agent_with(ScriptedProvider::text("x"), AgentConfig::default());
        assert_eq!(agent.max_iterations, 10);
    }

    #[tokio::test]
    async fn run_on_closed_session_fails_without_transcript_change() {
        let shared = shared();
        shared.closed.store(true, Ordering::Release);
        let mut agent = Agent::new(
            shared,
            AgentConfig::default(),
            LlmParams::default(),
            Box::new(ScriptedProvider::text("never")),
        );
        let err = agent.run("hello").await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(agent.message_count(), 0);
    }

    #[tokio::test]
    async fn lifetime_stats_accumulate() {
        let mut agent = agent_with(
            ScriptedProvider::new(vec![
                reagent_model::text_script("one"),
                reagent_model::text_script("two"),
            ]),
            AgentConfig::default(),
        );
        agent.run("a").await.unwrap();
        agent.run("b").await.unwrap();
        assert_eq!(agent.runs(), 2);
        assert_eq!(agent.total_usage().input, 10, "5 input tokens per scripted turn");
    }
}
