// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session supervision with exponential backoff.
//
// The agent keeps exactly one session alive.  Failed sessions are retried
// after a delay that doubles per failure between `BACKOFF_FLOOR` and
// `BACKOFF_CEILING`.  A session that lasted at least `STABLE_SESSION`
// resets the delay, and the idle resets the service applies to quiet
// streams are retried at once.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use printlink_core::error::Result;
use printlink_print::PrinterApi;

use crate::connector::Connector;
use crate::fetch::DocumentFetcher;
use crate::session::{SessionSettings, run_session};

/// Shortest delay between sessions.
pub const BACKOFF_FLOOR: Duration = Duration::from_millis(500);

/// Longest delay between sessions.
pub const BACKOFF_CEILING: Duration = Duration::from_secs(30);

/// Sessions at least this long count as healthy.
pub const STABLE_SESSION: Duration = Duration::from_secs(5);

/// When to start the next session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAttempt {
    Immediate,
    After(Duration),
}

/// Reconnect delay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    delay: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self { delay: BACKOFF_FLOOR }
    }
}

impl Backoff {
    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn escalate(&mut self) {
        self.delay = self.delay.saturating_mul(2).min(BACKOFF_CEILING);
    }

    fn reset(&mut self) {
        self.delay = BACKOFF_FLOOR;
    }

    /// Account for a finished session and decide when to start the next.
    pub fn next_attempt(&mut self, outcome: &Result<()>, lasted: Duration) -> NextAttempt {
        if let Err(e) = outcome {
            if e.is_benign_disconnect() {
                info!("connection closed due to inactivity, reconnecting");
                return NextAttempt::Immediate;
            }
            error!(error = %e, "session failed");
            self.escalate();
        }

        if lasted >= STABLE_SESSION {
            self.reset();
            return NextAttempt::Immediate;
        }
        NextAttempt::After(self.delay)
    }
}

/// Keep a session running until `shutdown` fires.
pub async fn run_forever<C, P, F>(
    connector: &C,
    printer: &P,
    fetcher: &F,
    settings: &SessionSettings,
    shutdown: CancellationToken,
) where
    C: Connector,
    P: PrinterApi,
    F: DocumentFetcher,
{
    let mut backoff = Backoff::default();

    while !shutdown.is_cancelled() {
        let started = Instant::now();
        let outcome = run_session(connector, printer, fetcher, settings, &shutdown).await;

        if shutdown.is_cancelled() {
            break;
        }
        if let NextAttempt::After(delay) = backoff.next_attempt(&outcome, started.elapsed()) {
            info!("reconnecting in {}", humantime::format_duration(delay));
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    info!("agent stopped");
}
