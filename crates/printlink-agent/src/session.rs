// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One connection to the print service.
//
// A session opens the stream, waits for `Hello`, then runs three members in
// one task group until the first of them fails or the agent shuts down:
//
//   receiver        stream → message channel
//   printer-watcher printer → state channel
//   control-loop    both channels → stream
//
// The channels hold a single item, so a slow control loop holds back the
// receiver and the watcher instead of queueing work.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use printlink_core::error::{AgentError, Result};
use printlink_core::messages::ServerMessage;
use printlink_print::PrinterApi;
use printlink_print::watch::{PRINTER_STATE_INTERVAL, watch_printer_state};

use crate::connector::{Connector, Credentials, MessageSource};
use crate::control::ControlLoop;
use crate::fetch::DocumentFetcher;
use crate::group::TaskGroup;

/// Parameters shared by every session of one agent run.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub credentials: Credentials,
    /// Print commands older than this are cancelled unprinted.
    pub job_ttl: Duration,
    pub printer_poll_interval: Duration,
}

impl SessionSettings {
    pub fn new(credentials: Credentials, job_ttl: Duration) -> Self {
        Self {
            credentials,
            job_ttl,
            printer_poll_interval: PRINTER_STATE_INTERVAL,
        }
    }
}

/// Run one session to completion.
///
/// Returns `Ok(())` when `shutdown` fires or the service closes the stream
/// cleanly, and the first member error otherwise.
pub async fn run_session<C, P, F>(
    connector: &C,
    printer: &P,
    fetcher: &F,
    settings: &SessionSettings,
    shutdown: &CancellationToken,
) -> Result<()>
where
    C: Connector,
    P: PrinterApi,
    F: DocumentFetcher,
{
    let opened = tokio::select! {
        _ = shutdown.cancelled() => return Ok(()),
        opened = handshake(connector, &settings.credentials) => opened?,
    };
    let (sink, source) = opened;
    info!("connected to the server");

    let group = TaskGroup::new(shutdown.child_token());
    let (message_tx, message_rx) = mpsc::channel(1);
    let (state_tx, state_rx) = mpsc::channel(1);
    let control = ControlLoop::new(printer, fetcher, sink, settings.job_ttl);

    tokio::join!(
        group.run("receiver", receive_messages(source, message_tx, group.token())),
        group.run(
            "printer-watcher",
            watch_printer_state(printer, settings.printer_poll_interval, state_tx, group.token()),
        ),
        group.run("control-loop", control.run(message_rx, state_rx, group.token())),
    );

    match group.finish() {
        Err(AgentError::StreamClosed) => {
            info!("the server closed the stream");
            Ok(())
        }
        outcome => outcome,
    }
}

/// Open the stream and require `Hello` as its first message.
async fn handshake<C: Connector>(connector: &C, credentials: &Credentials) -> Result<(C::Sink, C::Source)> {
    let (sink, mut source) = connector.connect(credentials).await?;
    match source.recv().await? {
        Some(ServerMessage::Hello) => Ok((sink, source)),
        Some(other) => Err(AgentError::Handshake(format!("unexpected first message: {other:?}"))),
        None => Err(AgentError::Handshake("stream closed before hello".into())),
    }
}

/// Forward inbound messages until cancelled.  A clean end of stream is
/// reported as `StreamClosed` so that the rest of the group stops too.
async fn receive_messages<S: MessageSource>(
    mut source: S,
    messages: mpsc::Sender<ServerMessage>,
    cancel: CancellationToken,
) -> Result<()> {
    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            received = source.recv() => received?.ok_or(AgentError::StreamClosed)?,
        };

        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            sent = messages.send(message) => {
                if sent.is_err() {
                    debug!("message consumer closed");
                    return Ok(());
                }
            }
        }
    }
}
