// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
mod loader;
mod schema;

pub use loader::load;
pub use schema::*;
