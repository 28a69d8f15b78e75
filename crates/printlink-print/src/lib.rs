// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printlink print: IPP client for the managed printer, polling watchers for
// printer and job state, and mDNS printer discovery.  This crate bridges the
// core domain types defined in `printlink-core` and the printer on the wire.

pub mod discovery;
pub mod ipp_client;
pub mod watch;

pub use discovery::PrinterDiscovery;
pub use ipp_client::{IppClient, PrinterApi};
pub use watch::{watch_job_state, watch_printer_state};
