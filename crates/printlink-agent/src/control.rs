// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session control loop.
//
// The only task that writes to the outbound stream.  It consumes two inputs,
// server messages and printer-state samples, and handles one event at a
// time, so at most one document is in flight per session.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use printlink_core::error::Result;
use printlink_core::messages::{self, ServerMessage};
use printlink_core::types::{JobStatus, PrintJob, PrinterState, PrinterStatus};
use printlink_print::PrinterApi;

use crate::connector::MessageSink;
use crate::fetch::{self, DocumentFetcher};

pub struct ControlLoop<'a, P, F, S> {
    printer: &'a P,
    fetcher: &'a F,
    sink: S,
    job_ttl: Duration,
    /// Last printer state accepted for reporting.
    last_reported: PrinterState,
}

impl<'a, P, F, S> ControlLoop<'a, P, F, S>
where
    P: PrinterApi,
    F: DocumentFetcher,
    S: MessageSink,
{
    pub fn new(printer: &'a P, fetcher: &'a F, sink: S, job_ttl: Duration) -> Self {
        Self {
            printer,
            fetcher,
            sink,
            job_ttl,
            // The service assumes a fresh session's printer is offline, so
            // an initial `Stopped` sample is not re-sent.
            last_reported: PrinterState::Stopped,
        }
    }

    /// Handle events until cancelled or both inputs are closed.
    ///
    /// A failed job, or a job report that cannot be sent, ends the loop with
    /// that error.
    pub async fn run(
        mut self,
        mut messages: mpsc::Receiver<ServerMessage>,
        mut states: mpsc::Receiver<PrinterState>,
        cancel: CancellationToken,
    ) -> Result<()> {
        let mut messages_open = true;
        let mut states_open = true;

        while messages_open || states_open {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                message = messages.recv(), if messages_open => match message {
                    Some(message) => self.handle_message(message, &cancel).await?,
                    None => messages_open = false,
                },
                state = states.recv(), if states_open => match state {
                    Some(state) => self.handle_printer_state(state).await,
                    None => states_open = false,
                },
            }
        }
        debug!("control loop inputs closed");
        Ok(())
    }

    async fn handle_message(&mut self, message: ServerMessage, cancel: &CancellationToken) -> Result<()> {
        match message {
            ServerMessage::Print(job) => self.handle_print(job, cancel).await,
            other => {
                debug!(message = ?other, "ignoring server message");
                Ok(())
            }
        }
    }

    #[instrument(skip_all, fields(job_id = %job.id))]
    async fn handle_print(&mut self, job: PrintJob, cancel: &CancellationToken) -> Result<()> {
        info!(url = %job.document_url, "received print job");

        let age = job.age(Utc::now());
        if age > self.job_ttl {
            info!(age = ?age, ttl = ?self.job_ttl, "job is too old, cancelling");
            return self.sink.send(messages::report(JobStatus::Cancelled)).await;
        }

        let queue_number = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            queued = self.submit(&job) => queued?,
        };
        info!(queue_number, "printing job added to the queue");

        // Reported as soon as the printer accepts the job; the outcome on
        // the printer is not followed.
        self.sink.send(messages::report(JobStatus::Complete)).await
    }

    /// Download the document and hand it to the printer.  Returns the
    /// printer-assigned job id.
    async fn submit(&self, job: &PrintJob) -> Result<i32> {
        let document = self.fetcher.fetch(&job.document_url).await?;
        let content = tokio::fs::read(&document.path).await?;
        let queue_number = self
            .printer
            .print_job(&document.file_name(), &document.mime_type, content)
            .await?;
        fetch::discard(&document.path).await;
        Ok(queue_number)
    }

    async fn handle_printer_state(&mut self, state: PrinterState) {
        if state == self.last_reported {
            return;
        }
        let Some(status) = PrinterStatus::from_state(state) else {
            debug!("printer state unknown, not reported");
            return;
        };

        match status {
            PrinterStatus::Ready => info!("the printer is ready"),
            PrinterStatus::Busy => info!("the printer is busy"),
            PrinterStatus::Offline => info!("the printer is offline"),
        }

        if let Err(e) = self.sink.send(messages::status(status)).await {
            warn!(error = %e, "failed to report printer status");
        }
        self.last_reported = state;
    }
}
