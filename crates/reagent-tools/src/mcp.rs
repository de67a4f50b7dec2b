// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
//! MCP bridge: adapts an external MCP client's discovered tools into the
//! registry.
//!
//! The wire protocol is the client's concern — this module only defines the
//! contract the registry needs ([`McpClient`]) and a wrapper tool that
//! forwards calls.  The bridge never reconnects; a call on a disconnected
//! client fails like any other tool failure and surfaces to the model as an
//! error payload.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use reagent_core::{Error, Result};

use crate::{Tool, ToolContext, ToolRegistry};

/// A tool as discovered on an MCP server.
#[derive(Debug, Clone)]
pub struct McpToolInfo {
    pub name: String,
    pub description: String,
    /// JSON Schema of the argument object.
    pub parameters: Value,
}

/// The contract an MCP client must expose for the registry to adapt it.
/// Connection lifecycle (connect, reconnect, transport) stays on the client
/// side of this seam.
#[async_trait]
pub trait McpClient: Send + Sync {
    fn is_connected(&self) -> bool;

    fn tool_count(&self) -> usize;

    /// Discovered tool at `index`, or `None` past the end.
    fn tool_info(&self, index: usize) -> Option<McpToolInfo>;

    async fn call_tool(&self, name: &str, args_json: &str) -> Result<String>;

    async fn disconnect(&self) -> Result<()>;
}

/// Registry-side wrapper around one discovered tool.  Holds a non-owning
/// handle to the client; the session's teardown order guarantees clients are
/// disconnected before registries go away.
struct McpTool {
    client: Arc<dyn McpClient>,
    info: McpToolInfo,
}

#[async_trait]
impl Tool for McpTool {
    fn name(&self) -> &str {
        &self.info.name
    }

    fn description(&self) -> &str {
        &self.info.description
    }

    fn parameters_schema(&self) -> Value {
        self.info.parameters.clone()
    }

    async fn execute(&self, args_json: &str, _ctx: &ToolContext<'_>) -> Result<String> {
        if !self.client.is_connected() {
            return Err(Error::NotConnected);
        }
        self.client.call_tool(&self.info.name, args_json).await
    }
}

impl ToolRegistry {
    /// Adapt every tool discovered on `client` into this registry.  Returns
    /// how many tools were adapted.  Fails with `NotConnected` when the
    /// client has no live connection to enumerate.
    pub fn register_mcp(&mut self, client: Arc<dyn McpClient>) -> Result<usize> {
        if !client.is_connected() {
            return Err(Error::NotConnected);
        }
        let mut adapted = 0;
        for index in 0..client.tool_count() {
            let Some(info) = client.tool_info(index) else { continue };
            self.register(Arc::new(McpTool { client: Arc::clone(&client), info }))?;
            adapted += 1;
        }
        info!(count = adapted, "adapted MCP tools into registry");
        Ok(adapted)
    }
}

// ─── In-memory client ─────────────────────────────────────────────────────────

type StaticHandler = Box<dyn Fn(&str) -> Result<String> + Send + Sync>;

/// In-memory [`McpClient`] with a fixed tool table.  Backs the bridge tests
/// and serves as a template for real transports.
pub struct StaticMcpClient {
    tools: Vec<(McpToolInfo, StaticHandler)>,
    connected: AtomicBool,
}

impl StaticMcpClient {
    pub fn new() -> Self {
        Self { tools: Vec::new(), connected: AtomicBool::new(true) }
    }

    pub fn with_tool(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: impl Fn(&str) -> Result<String> + Send + Sync + 'static,
    ) -> Self {
        self.tools.push((
            McpToolInfo {
                name: name.into(),
                description: description.into(),
                parameters: json!({ "type": "object", "properties": {} }),
            },
            Box::new(handler),
        ));
        self
    }
}

impl Default for StaticMcpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl McpClient for StaticMcpClient {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn tool_count(&self) -> usize {
        self.tools.len()
    }

    fn tool_info(&self, index: usize) -> Option<McpToolInfo> {
        self.tools.get(index).map(|(info, _)| info.clone())
    }

    async fn call_tool(&self, name: &str, args_json: &str) -> Result<String> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        let (_, handler) = self
            .tools
            .iter()
            .find(|(info, _)| info.name == name)
            .ok_or_else(|| Error::NotFound(format!("MCP tool: {name}")))?;
        handler(args_json)
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::Release);
        Ok(())
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
