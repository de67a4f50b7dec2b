// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
//! Provider layer: the transcript/message model, the polymorphic chat
//! backend, driver selection, and the streaming machinery (SSE decoding plus
//! per-driver normalization into one event vocabulary).

pub mod registry;
mod anthropic;
mod mock;
mod openai;
mod provider;
mod sse;
mod stream;
mod types;

pub use anthropic::AnthropicProvider;
pub use mock::{text_script, tool_script, MockProvider, ScriptedProvider};
pub use openai::OpenAiProvider;
pub use provider::{Capabilities, Provider, StreamHandler};
pub use registry::{get_driver, list_drivers, resolve_driver, DriverMeta};
pub use sse::{SseDecoder, SseRecord};
pub use stream::{assemble, BlockKind, DeltaKind, ResponseAssembler, StreamEvent};
pub use types::{ChatRequest, ChatResponse, ContentBlock, Message, Role, StopReason, Usage};

use reagent_config::LlmParams;
use reagent_core::{Error, Result};

/// Construct a boxed [`Provider`] from parameters.
///
/// Driver selection is [`resolve_driver`]: explicit provider id, then the
/// compatibility hint, then auto-detection.  The API key comes from the
/// params or, failing that, from the selected driver's default environment
/// variable.
pub fn from_params(params: &LlmParams) -> Result<Box<dyn Provider>> {
    let driver = resolve_driver(params);
    let key = resolve_api_key(params, driver);
    match driver {
        "openai" => Ok(Box::new(OpenAiProvider::new(params, key)?)),
        "anthropic" => Ok(Box::new(AnthropicProvider::new(params, key)?)),
        "mock" => Ok(Box::new(MockProvider)),
        other => Err(Error::NotFound(format!("model driver: {other}"))),
    }
}

fn resolve_api_key(params: &LlmParams, driver: &str) -> Option<String> {
    if let Some(k) = &params.api_key {
        return Some(k.clone());
    }
    if let Some(env) = &params.api_key_env {
        return std::env::var(env).ok();
    }
    // Fall back to the driver's registry default env var.
    registry::get_driver(driver)
        .and_then(|meta| meta.default_api_key_env)
        .and_then(|env| std::env::var(env).ok())
}

/// Map an HTTP client failure onto the uniform taxonomy.
pub(crate) fn map_transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        return Error::Timeout;
    }
    // Collect the source chain; reqwest's display string alone often hides
    // the interesting cause (DNS vs TLS vs connection refused).
    let mut detail = e.to_string();
    let mut source = std::error::Error::source(&e);
    while let Some(s) = source {
        detail.push_str(": ");
        detail.push_str(&s.to_string());
        source = s.source();
    }
    let lower = detail.to_lowercase();
    if lower.contains("dns") || lower.contains("name resolution") {
        Error::Dns(detail)
    } else if lower.contains("tls") || lower.contains("certificate") || lower.contains("handshake")
    {
        Error::Tls(detail)
    } else {
        Error::Network(detail)
    }
}

/// Failure used when a stream handler aborts the turn mid-flight.
pub(crate) fn stream_abort_error() -> Error {
    Error::InvalidState("streaming aborted by event handler".into())
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
