// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory fakes for the agent's seams, shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use printlink_core::error::{AgentError, Result};
use printlink_core::messages::{ClientMessage, ServerMessage};
use printlink_core::types::{JobAttributes, PrinterAttributes, PrinterState};
use printlink_print::PrinterApi;

use crate::connector::{Connector, Credentials, MessageSink, MessageSource};
use crate::fetch::{DocumentFetcher, FetchedDocument};

pub(crate) const DOCUMENT_BYTES: &[u8] = b"%PDF-1.7 test";

/// One scripted inbound item.
pub(crate) type Inbound = Result<Option<ServerMessage>>;

/// Sink that records every message it accepts.
#[derive(Clone, Default)]
pub(crate) struct RecordingSink {
    sent: Arc<Mutex<Vec<ClientMessage>>>,
    fail_status: Arc<AtomicBool>,
    fail_report: Arc<AtomicBool>,
}

impl RecordingSink {
    pub(crate) fn sent(&self) -> Vec<ClientMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn fail_status(&self) {
        self.fail_status.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_report(&self) {
        self.fail_report.store(true, Ordering::SeqCst);
    }
}

impl MessageSink for RecordingSink {
    async fn send(&mut self, message: ClientMessage) -> Result<()> {
        let fail = match message {
            ClientMessage::Status(_) => &self.fail_status,
            ClientMessage::Report(_) => &self.fail_report,
            ClientMessage::Authenticate { .. } => return Ok(()),
        };
        if fail.load(Ordering::SeqCst) {
            return Err(AgentError::Transport("outbound stream closed".into()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

/// Source that replays a script, then stays open without sending.
pub(crate) struct ScriptedSource {
    script: VecDeque<Inbound>,
}

impl ScriptedSource {
    pub(crate) fn new(script: Vec<Inbound>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl MessageSource for ScriptedSource {
    async fn recv(&mut self) -> Result<Option<ServerMessage>> {
        match self.script.pop_front() {
            Some(item) => item,
            None => std::future::pending().await,
        }
    }
}

/// Connector handing out one scripted session per `connect`.  Once the
/// scripts run out every connect fails.
pub(crate) struct FakeConnector {
    pub(crate) sink: RecordingSink,
    sessions: Mutex<VecDeque<Result<Vec<Inbound>>>>,
    connects: AtomicUsize,
}

impl FakeConnector {
    pub(crate) fn new(sessions: Vec<Result<Vec<Inbound>>>) -> Self {
        Self {
            sink: RecordingSink::default(),
            sessions: Mutex::new(sessions.into()),
            connects: AtomicUsize::new(0),
        }
    }

    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl Connector for FakeConnector {
    type Sink = RecordingSink;
    type Source = ScriptedSource;

    async fn connect(&self, _credentials: &Credentials) -> Result<(RecordingSink, ScriptedSource)> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let next = self.sessions.lock().unwrap().pop_front();
        match next {
            Some(Ok(script)) => Ok((self.sink.clone(), ScriptedSource::new(script))),
            Some(Err(e)) => Err(e),
            None => Err(AgentError::Transport("connection refused".into())),
        }
    }
}

/// Printer reporting a settable state and accepting (or refusing) jobs.
pub(crate) struct FakePrinter {
    state: Mutex<PrinterState>,
    fail_queries: AtomicBool,
    fail_submit: AtomicBool,
    queries: AtomicUsize,
    submissions: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl FakePrinter {
    pub(crate) fn new(state: PrinterState) -> Self {
        Self {
            state: Mutex::new(state),
            fail_queries: AtomicBool::new(false),
            fail_submit: AtomicBool::new(false),
            queries: AtomicUsize::new(0),
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn fail_queries(&self) {
        self.fail_queries.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_submit(&self) {
        self.fail_submit.store(true, Ordering::SeqCst);
    }

    pub(crate) fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// `(job_name, mime_type, content)` of every accepted job.
    pub(crate) fn submissions(&self) -> Vec<(String, String, Vec<u8>)> {
        self.submissions.lock().unwrap().clone()
    }
}

impl PrinterApi for FakePrinter {
    async fn printer_attributes(&self) -> Result<PrinterAttributes> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(AgentError::Transport("Get-Printer-Attributes: connection refused".into()));
        }
        let state = *self.state.lock().unwrap();
        Ok(PrinterAttributes {
            state,
            ..Default::default()
        })
    }

    async fn job_attributes(&self, _job_id: i32) -> Result<JobAttributes> {
        Ok(JobAttributes::default())
    }

    async fn print_job(&self, job_name: &str, mime_type: &str, content: Vec<u8>) -> Result<i32> {
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(AgentError::Protocol(
                "Print-Job returned status ClientErrorDocumentFormatNotSupported".into(),
            ));
        }
        let mut submissions = self.submissions.lock().unwrap();
        submissions.push((job_name.to_owned(), mime_type.to_owned(), content));
        Ok(100 + submissions.len() as i32)
    }
}

/// Fetcher writing a fixed document into a temporary scratch directory.
pub(crate) struct FakeFetcher {
    dir: tempfile::TempDir,
    fetched: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl FakeFetcher {
    pub(crate) fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            fetched: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub(crate) fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub(crate) fn scratch_is_empty(&self) -> bool {
        std::fs::read_dir(self.dir.path()).unwrap().next().is_none()
    }
}

impl DocumentFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        let count = {
            let mut fetched = self.fetched.lock().unwrap();
            fetched.push(url.to_owned());
            fetched.len()
        };
        if self.fail.load(Ordering::SeqCst) {
            return Err(AgentError::Transport("failed to download document: 404".into()));
        }
        let path = self.dir.path().join(format!("doc-{count}"));
        tokio::fs::write(&path, DOCUMENT_BYTES).await?;
        Ok(FetchedDocument {
            path,
            mime_type: "application/pdf".into(),
        })
    }
}

pub(crate) fn credentials() -> Credentials {
    Credentials {
        token: "token".into(),
        space_id: "space".into(),
    }
}
