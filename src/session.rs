// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use reagent_config::{default_list_capacity, AgentConfig, LlmParams, SessionConfig};
use reagent_core::{Arena, ArenaStats, Error, Result};
use reagent_model::Provider;
use reagent_tools::{McpClient, ToolRegistry};

use crate::agent::Agent;

/// State shared between a session and the agents it created.  Non-owning
/// from the agent's side: the flag is how agents observe teardown.
pub(crate) struct SessionShared {
    pub id: String,
    pub working_dir: Option<String>,
    pub closed: AtomicBool,
}

struct SessionState {
    registries: Vec<Arc<ToolRegistry>>,
    mcp_clients: Vec<Arc<dyn McpClient>>,
}

/// Top-level lifetime of the runtime.  Owns the session arena, the tool
/// registries, and the MCP clients; hands out agents bound to providers.
///
/// Teardown order is fixed and written in exactly one place
/// ([`Session::close`]): MCP clients are disconnected first (so no tool
/// wrapper can reach a dead client), then agents refuse further runs, then
/// the registries are dropped and the session arena's blocks are released.
pub struct Session {
    shared: Arc<SessionShared>,
    /// Session-lifetime scratch region.  Behind its own lock (std, never
    /// held across an await) so `close()` can release the blocks through a
    /// shared reference; access goes through [`Session::with_arena`].
    arena: std::sync::Mutex<Arena>,
    state: Mutex<SessionState>,
    agents_created: AtomicU32,
}

impl Session {
    /// Open a session with the given configuration.
    pub fn open(config: SessionConfig) -> Result<Self> {
        let arena = Arena::with_capacity(config.arena_capacity)?;
        let id = Uuid::new_v4().to_string();
        info!(session = %id, arena_capacity = config.arena_capacity, "session opened");
        Ok(Self {
            shared: Arc::new(SessionShared {
                id,
                working_dir: config.working_dir,
                closed: AtomicBool::new(false),
            }),
            arena: std::sync::Mutex::new(arena),
            state: Mutex::new(SessionState {
                registries: Vec::with_capacity(default_list_capacity()),
                mcp_clients: Vec::with_capacity(default_list_capacity()),
            }),
            agents_created: AtomicU32::new(0),
        })
    }

    pub fn id(&self) -> &str {
        &self.shared.id
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Run `f` with the session-lifetime scratch region.  Allocations are
    /// valid for the duration of the call; [`Session::close`] releases the
    /// region, so nothing allocated here may escape the closure (the closure
    /// signature enforces this).
    pub fn with_arena<R>(&self, f: impl FnOnce(&Arena) -> R) -> R {
        let arena = self.arena.lock().unwrap_or_else(|p| p.into_inner());
        f(&arena)
    }

    pub fn memory_stats(&self) -> ArenaStats {
        self.arena.lock().unwrap_or_else(|p| p.into_inner()).stats()
    }

    /// Move a populated registry into the session and get the shared handle
    /// agents attach to.
    pub async fn add_registry(&self, registry: ToolRegistry) -> Result<Arc<ToolRegistry>> {
        let mut state = self.state.lock().await;
        self.ensure_open()?;
        let registry = Arc::new(registry);
        state.registries.push(Arc::clone(&registry));
        Ok(registry)
    }

    /// Register an MCP client for managed disconnect at close time.
    pub async fn add_mcp(&self, client: Arc<dyn McpClient>) -> Result<()> {
        let mut state = self.state.lock().await;
        self.ensure_open()?;
        state.mcp_clients.push(client);
        Ok(())
    }

    /// Create an agent, constructing its provider from `params`.
    pub async fn agent(&self, config: AgentConfig, params: LlmParams) -> Result<Agent> {
        let provider = reagent_model::from_params(&params)?;
        self.agent_with_provider(config, params, provider).await
    }

    /// Create an agent around an already-built provider (custom backends,
    /// scripted test providers).
    pub async fn agent_with_provider(
        &self,
        config: AgentConfig,
        params: LlmParams,
        provider: Box<dyn Provider>,
    ) -> Result<Agent> {
        {
            let _state = self.state.lock().await;
            self.ensure_open()?;
        }
        self.agents_created.fetch_add(1, Ordering::Relaxed);
        info!(
            session = %self.shared.id,
            agent = config.name.as_deref().unwrap_or("unnamed"),
            provider = provider.name(),
            model = provider.model(),
            "agent created"
        );
        Ok(Agent::new(Arc::clone(&self.shared), config, params, provider))
    }

    /// How many agents this session has handed out.
    pub fn agent_count(&self) -> u32 {
        self.agents_created.load(Ordering::Relaxed)
    }

    /// Close the session.  Idempotent: a second call logs a warning and does
    /// nothing.  Disconnects the MCP clients, drops the registries, and
    /// releases the session arena, in that order.  After close, `add_*`,
    /// agent creation, and agent runs fail with `InvalidState`.
    pub async fn close(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            warn!(session = %self.shared.id, "session already closed");
            return Ok(());
        }
        // MCP clients go first: registry wrappers hold handles to them, so
        // no tool call may outlive the disconnect.
        for client in state.mcp_clients.drain(..) {
            if let Err(e) = client.disconnect().await {
                warn!(session = %self.shared.id, error = %e, "MCP disconnect failed");
            }
        }
        // Agents observe the closed flag and refuse further runs; their own
        // arenas go when the agent values drop.
        state.registries.clear();
        // Last step: release the session arena's blocks.
        *self.arena.lock().unwrap_or_else(|p| p.into_inner()) = Arena::new();
        info!(session = %self.shared.id, "session closed");
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::InvalidState("session is closed".into()));
        }
        Ok(())
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
