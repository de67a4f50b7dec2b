// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
//! Driver registry: static metadata for every supported provider, plus the
//! deterministic selection rule that maps [`LlmParams`] to a driver id.
//!
//! The table is the single source of truth for which provider ids exist and
//! what their defaults are; it is populated at compile time and read-only
//! afterwards.  Construction logic lives in [`crate::from_params`].

use reagent_config::LlmParams;

/// Metadata describing a registered driver.
#[derive(Debug, Clone)]
pub struct DriverMeta {
    /// Unique driver id used in `LlmParams.provider` (e.g. `"anthropic"`).
    pub id: &'static str,
    /// Human-readable display name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Default environment variable holding the API key, when one applies.
    pub default_api_key_env: Option<&'static str>,
    /// Default base URL when `LlmParams.base_url` is unset.
    pub default_base_url: Option<&'static str>,
    pub requires_api_key: bool,
}

/// Complete registry of supported drivers.
pub static DRIVERS: &[DriverMeta] = &[
    DriverMeta {
        id: "openai",
        name: "OpenAI-compatible",
        description: "Chat-completions wire format (OpenAI and compatible servers)",
        default_api_key_env: Some("OPENAI_API_KEY"),
        default_base_url: Some("https://api.openai.com/v1"),
        requires_api_key: true,
    },
    DriverMeta {
        id: "anthropic",
        name: "Anthropic",
        description: "Anthropic messages API (Claude models)",
        default_api_key_env: Some("ANTHROPIC_API_KEY"),
        default_base_url: Some("https://api.anthropic.com"),
        requires_api_key: true,
    },
    DriverMeta {
        id: "mock",
        name: "Mock",
        description: "Deterministic in-process driver for tests (no network)",
        default_api_key_env: None,
        default_base_url: None,
        requires_api_key: false,
    },
];

/// Returns all registered drivers in declaration order.
pub fn list_drivers() -> &'static [DriverMeta] {
    DRIVERS
}

/// Look up a driver by its id.  Returns `None` for unknown ids.
pub fn get_driver(id: &str) -> Option<&'static DriverMeta> {
    DRIVERS.iter().find(|d| d.id == id)
}

/// Deterministically resolve the driver id for a parameter set.
///
/// Order: an explicit `provider` naming a registered driver wins; then the
/// `compatibility` hint; then auto-detection — a `claude*` model or an
/// `anthropic.com` base URL selects the Anthropic driver, anything else
/// falls back to the OpenAI-compatible driver.
pub fn resolve_driver(params: &LlmParams) -> &'static str {
    if let Some(meta) = params.provider.as_deref().and_then(get_driver) {
        return meta.id;
    }
    if let Some(meta) = params.compatibility.as_deref().and_then(get_driver) {
        return meta.id;
    }
    let base = params.base_url.as_deref().unwrap_or("");
    if params.model.starts_with("claude") || base.contains("anthropic.com") {
        "anthropic"
    } else {
        "openai"
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
