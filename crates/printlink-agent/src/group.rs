// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cancellation-linked task group.
//
// Member tasks share one token.  The first member to fail records its error
// and cancels the token; the others observe the cancellation and wind down.
// The caller joins all members, then takes the recorded error.

use std::future::Future;
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use printlink_core::error::{AgentError, Result};

pub struct TaskGroup {
    cancel: CancellationToken,
    first_error: Mutex<Option<AgentError>>,
}

impl TaskGroup {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            first_error: Mutex::new(None),
        }
    }

    /// Token every member must observe.
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drive one member to completion.  An error cancels the whole group;
    /// only the first error is kept.
    pub async fn run<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = Result<()>>,
    {
        match task.await {
            Ok(()) => debug!(task = name, "task finished"),
            Err(e) => {
                debug!(task = name, error = %e, "task failed, cancelling group");
                if let Ok(mut slot) = self.first_error.lock() {
                    slot.get_or_insert(e);
                }
                self.cancel.cancel();
            }
        }
    }

    /// The first recorded error, if any.  Call after every member returned.
    pub fn finish(self) -> Result<()> {
        match self.first_error.into_inner() {
            Ok(Some(e)) => Err(e),
            _ => Ok(()),
        }
    }
}
