// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Messages exchanged with the print service over the connector stream.
//
// The wire codec lives with the connector; these are the values the session
// logic works with.

use crate::types::{JobStatus, PrintJob, PrinterStatus};

/// Inbound message (service → agent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Handshake; always the first message of a session.
    Hello,
    /// Print the referenced document.
    Print(PrintJob),
    /// A variant this agent does not understand.
    Other,
}

/// Outbound message (agent → service).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Authenticate { secret: String },
    Status(PrinterStatus),
    Report(JobStatus),
}

/// Build an `Authenticate` message.
pub fn authenticate(secret: impl Into<String>) -> ClientMessage {
    ClientMessage::Authenticate {
        secret: secret.into(),
    }
}

/// Build a printer `Status` message.
pub fn status(status: PrinterStatus) -> ClientMessage {
    ClientMessage::Status(status)
}

/// Build a job `Report` message.
pub fn report(status: JobStatus) -> ClientMessage {
    ClientMessage::Report(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_tag_their_variant() {
        assert_eq!(
            authenticate("s3cret"),
            ClientMessage::Authenticate {
                secret: "s3cret".into()
            }
        );
        assert_eq!(
            status(PrinterStatus::Busy),
            ClientMessage::Status(PrinterStatus::Busy)
        );
        assert_eq!(
            report(JobStatus::Cancelled),
            ClientMessage::Report(JobStatus::Cancelled)
        );
    }
}
