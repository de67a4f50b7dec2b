// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
use std::ops::ControlFlow;

use async_trait::async_trait;

use reagent_core::Result;

use crate::{ChatRequest, ChatResponse, StreamEvent};

/// Optional-feature bitset declared by each driver so callers can
/// feature-gate at runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities(u32);

impl Capabilities {
    pub const THINKING: Capabilities = Capabilities(1 << 0);
    pub const REASONING: Capabilities = Capabilities(1 << 1);
    pub const STREAMING: Capabilities = Capabilities(1 << 2);
    pub const STATEFUL: Capabilities = Capabilities(1 << 3);
    pub const TOOLS: Capabilities = Capabilities(1 << 4);
    pub const VISION: Capabilities = Capabilities(1 << 5);

    pub const fn empty() -> Self {
        Capabilities(0)
    }

    pub const fn union(self, other: Capabilities) -> Self {
        Capabilities(self.0 | other.0)
    }

    pub const fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Capabilities {
    type Output = Capabilities;
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Callback receiving uniform stream events during `chat_stream`.
///
/// Returning `ControlFlow::Break(())` aborts the stream: the driver tears the
/// connection down cleanly and reports the turn as failed.
pub type StreamHandler<'a> = dyn FnMut(&StreamEvent) -> ControlFlow<()> + Send + 'a;

/// A chat-model backend: turns a transcript plus tool schema into either a
/// final assistant message or a set of tool-call requests.
///
/// Implementations hold no shared mutable state after construction, so one
/// provider instance may serve concurrent agents on distinct tasks.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable driver id (matches the driver registry).
    fn name(&self) -> &str;

    /// Model identifier forwarded on the wire.
    fn model(&self) -> &str;

    fn capabilities(&self) -> Capabilities;

    /// One request/response turn.
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse>;

    /// One streaming turn.  Events are delivered in the documented order
    /// (one `MessageStart`, bracketed block deltas, terminal `MessageStop`);
    /// the same final [`ChatResponse`] is returned once the stream ends.
    async fn chat_stream(
        &self,
        req: ChatRequest,
        on_event: &mut StreamHandler<'_>,
    ) -> Result<ChatResponse>;
}

// A shared provider handle is itself a provider, so one backend instance can
// serve several agents (providers hold no mutable state after construction).
#[async_trait]
impl<P: Provider + ?Sized> Provider for std::sync::Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }
    fn model(&self) -> &str {
        (**self).model()
    }
    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
        (**self).chat(req).await
    }
    async fn chat_stream(
        &self,
        req: ChatRequest,
        on_event: &mut StreamHandler<'_>,
    ) -> Result<ChatResponse> {
        (**self).chat_stream(req, on_event).await
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
