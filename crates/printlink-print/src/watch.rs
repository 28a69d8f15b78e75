// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Polling watchers for printer and job state.
//
// Each watcher queries the printer, hands the sample to a single consumer
// and sleeps.  Every suspension point also waits on the cancellation token,
// so cancelling the session stops a watcher within one poll.  A failed
// query ends the watcher with that error; retrying is left to the session.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use printlink_core::error::Result;
use printlink_core::types::{JobState, PrinterState};

use crate::ipp_client::PrinterApi;

/// Poll interval for printer state.
pub const PRINTER_STATE_INTERVAL: Duration = Duration::from_secs(3);

/// Poll interval for job state.
pub const JOB_STATE_INTERVAL: Duration = Duration::from_secs(5);

/// Report every printer-state sample to `states`.
///
/// Samples are not deduplicated here; the consumer decides what is worth
/// reporting.  Returns `Ok(())` on cancellation or when the consumer is gone.
pub async fn watch_printer_state<P: PrinterApi>(
    printer: &P,
    interval: Duration,
    states: mpsc::Sender<PrinterState>,
    cancel: CancellationToken,
) -> Result<()> {
    loop {
        let attrs = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            attrs = printer.printer_attributes() => attrs.inspect_err(|e| {
                warn!(error = %e, "failed to get printer attributes");
            })?,
        };

        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            sent = states.send(attrs.state) => {
                if sent.is_err() {
                    debug!("printer state consumer closed");
                    return Ok(());
                }
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

/// Report changes in the state of printer job `job_id` to `states`.
///
/// A sample is only forwarded when it differs from the last forwarded one;
/// the first comparison is against `Pending`.
pub async fn watch_job_state<P: PrinterApi>(
    printer: &P,
    job_id: i32,
    interval: Duration,
    states: mpsc::Sender<JobState>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut previous = JobState::Pending;

    loop {
        let attrs = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            attrs = printer.job_attributes(job_id) => attrs.inspect_err(|e| {
                warn!(job_id, error = %e, "failed to get job attributes");
            })?,
        };

        if attrs.state != previous {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                sent = states.send(attrs.state) => {
                    if sent.is_err() {
                        debug!(job_id, "job state consumer closed");
                        return Ok(());
                    }
                    debug!(job_id, from = %previous, to = %attrs.state, "job state changed");
                    previous = attrs.state;
                }
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
