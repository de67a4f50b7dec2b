// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
//! Foundation crate for the reagent runtime: the uniform error taxonomy and
//! the region allocator shared by every other crate in the workspace.

mod arena;
mod error;

pub use arena::{Arena, ArenaStats};
pub use error::{Error, ErrorKind, Result};
