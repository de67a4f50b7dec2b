// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
use std::path::Path;

use tracing::debug;

use reagent_core::{Error, Result};

use crate::Config;

/// Load configuration by deep-merging the given YAML files in order; later
/// files override earlier ones.  An empty list yields `Config::default()`.
///
/// The runtime is embeddable, so there is no implicit search of system or
/// home directories — the host decides which layers exist and passes them in.
pub fn load(paths: &[&Path]) -> Result<Config> {
    let mut merged = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());

    for path in paths {
        debug!(path = %path.display(), "loading config layer");
        let text = std::fs::read_to_string(path).map_err(Error::Io)?;
        let layer: serde_yaml::Value = serde_yaml::from_str(&text)
            .map_err(|e| Error::Parse(format!("{}: {e}", path.display())))?;
        merge_yaml(&mut merged, layer);
    }

    if matches!(merged, serde_yaml::Value::Mapping(ref m) if m.is_empty()) {
        return Ok(Config::default());
    }
    serde_yaml::from_value(merged).map_err(|e| Error::Parse(e.to_string()))
}

/// Deep-merge `src` into `dst`; src wins on scalar conflicts.
fn merge_yaml(dst: &mut serde_yaml::Value, src: serde_yaml::Value) {
    match (dst, src) {
        (serde_yaml::Value::Mapping(d), serde_yaml::Value::Mapping(s)) => {
            for (k, v) in s {
                let entry = d
                    .entry(k)
                    .or_insert(serde_yaml::Value::Mapping(serde_yaml::Mapping::new()));
                merge_yaml(entry, v);
            }
        }
        (dst, src) => *dst = src,
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
