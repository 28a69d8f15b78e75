// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printlink core: types, service messages and error definitions shared
// across all crates.

pub mod config;
pub mod error;
pub mod messages;
pub mod types;

pub use config::AgentConfig;
pub use error::AgentError;
pub use messages::{ClientMessage, ServerMessage};
pub use types::*;
