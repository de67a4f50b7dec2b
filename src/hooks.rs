// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
//! Observation hooks: process-wide synchronous callbacks fired at fixed
//! points of the agent loop.
//!
//! Hooks are installed once, before any agent runs, and are read-only
//! afterwards.  Callbacks run on the agent's thread at the call site and
//! must be fast and non-blocking.  Building with `--no-default-features`
//! (dropping the `hooks` feature) compiles every dispatch site away.

use std::sync::OnceLock;
use std::time::Duration;

use reagent_core::{Error, Result};
use reagent_model::{ChatResponse, Message, Usage};
use serde_json::Value;

use crate::agent::RunStatus;

pub struct RunStartInfo<'a> {
    pub agent: Option<&'a str>,
    pub input: &'a str,
}

pub struct RunEndInfo<'a> {
    pub agent: Option<&'a str>,
    pub status: RunStatus,
    pub iterations: u32,
    pub usage: &'a Usage,
    pub duration: Duration,
}

pub struct IterationInfo {
    pub iteration: u32,
}

pub struct LlmRequestInfo<'a> {
    /// The raw transcript about to be sent; no serialization happens here.
    pub messages: &'a [Message],
    pub tools: Option<&'a Value>,
}

pub struct LlmResponseInfo<'a> {
    pub response: &'a ChatResponse,
    pub duration: Duration,
}

pub struct ToolStartInfo<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub args: &'a str,
    pub iteration: u32,
}

pub struct ToolEndInfo<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub result: &'a str,
    pub success: bool,
    pub duration: Duration,
}

/// The hook table.  Every slot is optional; unset slots cost one branch.
#[derive(Default)]
pub struct Hooks {
    pub on_run_start: Option<Box<dyn Fn(&RunStartInfo<'_>) + Send + Sync>>,
    pub on_run_end: Option<Box<dyn Fn(&RunEndInfo<'_>) + Send + Sync>>,
    pub on_iter_start: Option<Box<dyn Fn(&IterationInfo) + Send + Sync>>,
    pub on_iter_end: Option<Box<dyn Fn(&IterationInfo) + Send + Sync>>,
    pub on_llm_request: Option<Box<dyn Fn(&LlmRequestInfo<'_>) + Send + Sync>>,
    pub on_llm_response: Option<Box<dyn Fn(&LlmResponseInfo<'_>) + Send + Sync>>,
    pub on_tool_start: Option<Box<dyn Fn(&ToolStartInfo<'_>) + Send + Sync>>,
    pub on_tool_end: Option<Box<dyn Fn(&ToolEndInfo<'_>) + Send + Sync>>,
}

impl Hooks {
    pub(crate) fn run_start(&self, info: &RunStartInfo<'_>) {
        if let Some(f) = &self.on_run_start {
            f(info);
        }
    }
    pub(crate) fn run_end(&self, info: &RunEndInfo<'_>) {
        if let Some(f) = &self.on_run_end {
            f(info);
        }
    }
    pub(crate) fn iter_start(&self, info: &IterationInfo) {
        if let Some(f) = &self.on_iter_start {
            f(info);
        }
    }
    pub(crate) fn iter_end(&self, info: &IterationInfo) {
        if let Some(f) = &self.on_iter_end {
            f(info);
        }
    }
    pub(crate) fn llm_request(&self, info: &LlmRequestInfo<'_>) {
        if let Some(f) = &self.on_llm_request {
            f(info);
        }
    }
    pub(crate) fn llm_response(&self, info: &LlmResponseInfo<'_>) {
        if let Some(f) = &self.on_llm_response {
            f(info);
        }
    }
    pub(crate) fn tool_start(&self, info: &ToolStartInfo<'_>) {
        if let Some(f) = &self.on_tool_start {
            f(info);
        }
    }
    pub(crate) fn tool_end(&self, info: &ToolEndInfo<'_>) {
        if let Some(f) = &self.on_tool_end {
            f(info);
        }
    }
}

static HOOKS: OnceLock<Hooks> = OnceLock::new();

/// Install the process-wide hook table.  Must happen before any agent runs;
/// a second install fails with `InvalidState`.
pub fn set_hooks(hooks: Hooks) -> Result<()> {
    HOOKS
        .set(hooks)
        .map_err(|_| Error::InvalidState("hooks already installed".into()))
}

/// The installed hook table, if any.  Compiled to `None` without the
/// `hooks` feature.
pub(crate) fn active() -> Option<&'static Hooks> {
    #[cfg(feature = "hooks")]
    {
        HOOKS.get()
    }
    #[cfg(not(feature = "hooks"))]
    {
        None
    }
}
