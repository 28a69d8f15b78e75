// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printlink agent: keeps one session with the print service alive, turns
// print commands into IPP jobs, and reports printer and job status back.
//
// Layering, outermost first:
//   reconnect  retry loop with backoff, never returns on its own
//   session    handshake plus the receiver / watcher / control-loop group
//   control    single event loop handling jobs and status reports
//   connector  gRPC stream to the service (`proto` holds the wire types)
//   fetch      document download into scratch storage

pub mod connector;
pub mod control;
pub mod fetch;
pub mod group;
pub mod proto;
pub mod reconnect;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use connector::{Connector, Credentials, GrpcConnector, MessageSink, MessageSource};
pub use fetch::{DocumentFetcher, FetchedDocument, HttpFetcher};
pub use reconnect::{Backoff, run_forever};
pub use session::{SessionSettings, run_session};
