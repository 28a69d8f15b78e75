// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Printlink agent.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};

/// IPP `printer-state` (RFC 8011 §5.4.11).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PrinterState {
    Idle,
    Processing,
    Stopped,
    /// Absent or outside the enum range defined by the RFC.
    #[default]
    Unknown,
}

impl PrinterState {
    /// Map the IPP enum value onto a state.
    pub fn from_ipp(value: i32) -> Self {
        match value {
            3 => Self::Idle,
            4 => Self::Processing,
            5 => Self::Stopped,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for PrinterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Stopped => "stopped",
            Self::Unknown => "unknown",
        })
    }
}

/// IPP `job-state` (RFC 8011 §5.3.7).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum JobState {
    Pending,
    PendingHeld,
    Processing,
    ProcessingStopped,
    Canceled,
    Aborted,
    Completed,
    #[default]
    Unknown,
}

impl JobState {
    /// Map the IPP enum value onto a state.
    pub fn from_ipp(value: i32) -> Self {
        match value {
            3 => Self::Pending,
            4 => Self::PendingHeld,
            5 => Self::Processing,
            6 => Self::ProcessingStopped,
            7 => Self::Canceled,
            8 => Self::Aborted,
            9 => Self::Completed,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::PendingHeld => "pending-held",
            Self::Processing => "processing",
            Self::ProcessingStopped => "processing-stopped",
            Self::Canceled => "canceled",
            Self::Aborted => "aborted",
            Self::Completed => "completed",
            Self::Unknown => "unknown",
        })
    }
}

/// Snapshot of a Get-Printer-Attributes response.
///
/// Attributes the printer does not report keep their default value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrinterAttributes {
    pub name: String,
    pub info: String,
    pub state: PrinterState,
    pub state_reason: String,
    pub queued_job_count: i32,
    pub color_supported: bool,
    /// Raw IPP operation codes from `operations-supported`.
    pub operations_supported: BTreeSet<i32>,
    /// Keywords from `page-delivery-supported`.
    pub page_delivery_supported: BTreeSet<String>,
}

/// Snapshot of a Get-Job-Attributes response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobAttributes {
    pub state: JobState,
    pub state_reason: String,
}

/// A print command received from the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintJob {
    pub id: String,
    pub document_url: String,
    pub created_at: DateTime<Utc>,
}

impl PrintJob {
    /// Time elapsed between creation and `now`. Negative ages (clock skew)
    /// clamp to zero.
    pub fn age(&self, now: DateTime<Utc>) -> std::time::Duration {
        (now - self.created_at).to_std().unwrap_or_default()
    }
}

/// Printer availability as reported to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrinterStatus {
    Ready,
    Busy,
    Offline,
}

impl PrinterStatus {
    /// Status to report for a sampled printer state. `Unknown` has no
    /// service-side counterpart and is never reported.
    pub fn from_state(state: PrinterState) -> Option<Self> {
        match state {
            PrinterState::Idle => Some(Self::Ready),
            PrinterState::Processing => Some(Self::Busy),
            PrinterState::Stopped => Some(Self::Offline),
            PrinterState::Unknown => None,
        }
    }
}

/// Outcome of a print command as reported to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Complete,
    Cancelled,
}

/// A printer discovered on the local network via mDNS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPrinter {
    /// mDNS instance name.
    pub name: String,
    pub uri: String,
    /// Advertised through the `printer-state` TXT record.
    pub state: PrinterState,
}
