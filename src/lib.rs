// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
//! Embeddable runtime for tool-using LLM agents.
//!
//! A [`Session`] owns the memory and the long-lived resources (tool
//! registries, MCP clients) and hands out [`Agent`]s, each bound to one chat
//! provider.  `Agent::run` drives a full reason/act/observe turn: the model
//! either answers or requests tool calls; requested tools execute in order
//! and their observations are fed back until the model produces a final
//! answer or the iteration cap is hit.
//!
//! ```no_run
//! use std::sync::Arc;
//! use reagent::{AgentConfig, LlmParams, Session, SessionConfig, ToolRegistry};
//!
//! # async fn demo() -> reagent::Result<()> {
//! let session = Session::open(SessionConfig::default())?;
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(Arc::new(
//!     reagent::FnTool::builder("time")
//!         .description("current unix time")
//!         .handler(|_args, _ctx| Ok(r#"{"epoch":0}"#.into()))
//!         .build()?,
//! ))?;
//! let tools = session.add_registry(registry).await?;
//!
//! let params = LlmParams { model: "claude-sonnet-4-5".into(), ..Default::default() };
//! let mut agent = session.agent(AgentConfig::default(), params).await?;
//! agent.set_tools(tools);
//!
//! let result = agent.run("what time is it?").await?;
//! println!("{}", result.content.unwrap_or_default());
//! session.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! The provider layer, tool layer, and configuration live in their own
//! crates and are re-exported here for convenience.

mod agent;
mod events;
pub mod hooks;
mod session;

pub use agent::{Agent, RunResult, RunStatus};
pub use events::AgentEvent;
pub use hooks::{set_hooks, Hooks};
pub use session::Session;

// ── Re-exports from the member crates ─────────────────────────────────────────

pub use reagent_config::{
    load as load_config, AgentConfig, Config, LlmParams, SessionConfig, StatefulConfig,
    ThinkingConfig,
};
pub use reagent_core::{Arena, ArenaStats, Error, ErrorKind, Result};
pub use reagent_model::{
    from_params, resolve_driver, BlockKind, Capabilities, ChatRequest, ChatResponse,
    ContentBlock, DeltaKind, Message, MockProvider, Provider, Role, ScriptedProvider,
    SseDecoder, SseRecord, StopReason, StreamEvent, Usage,
};
pub use reagent_tools::{
    result_is_error, FnTool, McpClient, McpToolInfo, StaticMcpClient, Tool, ToolContext,
    ToolRegistry,
};

/// The most commonly used types in one import.
pub mod prelude {
    pub use crate::{
        Agent, AgentConfig, AgentEvent, ContentBlock, Error, FnTool, LlmParams, Message,
        Provider, Result, Role, RunResult, RunStatus, Session, SessionConfig, Tool,
        ToolContext, ToolRegistry,
    };
}
