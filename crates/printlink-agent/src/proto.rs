// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Protobuf wire types of the `eolymp.printer` package used by the
// `PrinterConnector/Connect` stream, and their conversion to and from the
// core message model.  The layout mirrors prost-build output:
//
//   package eolymp.printer;
//   service PrinterConnector {
//     rpc Connect(stream PrinterConnectorClientMessage)
//         returns (stream PrinterConnectorServerMessage);
//   }
//
// TODO: field tags and enum numbers are assigned in declaration order;
// verify them against the published eolymp/printer .proto files and switch
// to generated code once those are vendored.

use chrono::{DateTime, Utc};

use printlink_core::messages::{ClientMessage, ServerMessage};
use printlink_core::types::{JobStatus, PrintJob, PrinterStatus};

/// gRPC method path of the bidirectional stream.
pub const CONNECT_PATH: &str = "/eolymp.printer.PrinterConnector/Connect";

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PrinterConnectorClientMessage {
    #[prost(oneof = "printer_connector_client_message::Message", tags = "1, 2, 3")]
    pub message: Option<printer_connector_client_message::Message>,
}

pub mod printer_connector_client_message {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Authenticate {
        #[prost(string, tag = "1")]
        pub secret: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Status {
        #[prost(enumeration = "super::printer::Status", tag = "1")]
        pub status: i32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Report {
        #[prost(enumeration = "super::job::Status", tag = "1")]
        pub status: i32,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Message {
        #[prost(message, tag = "1")]
        Authenticate(Authenticate),
        #[prost(message, tag = "2")]
        Status(Status),
        #[prost(message, tag = "3")]
        Report(Report),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PrinterConnectorServerMessage {
    #[prost(oneof = "printer_connector_server_message::Message", tags = "1, 2")]
    pub message: Option<printer_connector_server_message::Message>,
}

pub mod printer_connector_server_message {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Hello {}

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Print {
        #[prost(message, optional, tag = "1")]
        pub job: Option<super::Job>,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Message {
        #[prost(message, tag = "1")]
        Hello(Hello),
        #[prost(message, tag = "2")]
        Print(Print),
    }
}

pub mod printer {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Status {
        Unknown = 0,
        Ready = 1,
        Busy = 2,
        Offline = 3,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Job {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub document_url: String,
    #[prost(message, optional, tag = "3")]
    pub created_at: Option<::prost_types::Timestamp>,
}

pub mod job {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Status {
        Unknown = 0,
        Complete = 1,
        Cancelled = 2,
    }
}

impl From<ClientMessage> for PrinterConnectorClientMessage {
    fn from(msg: ClientMessage) -> Self {
        use printer_connector_client_message::{Authenticate, Message, Report, Status};

        let message = match msg {
            ClientMessage::Authenticate { secret } => Message::Authenticate(Authenticate { secret }),
            ClientMessage::Status(status) => Message::Status(Status {
                status: printer::Status::from(status) as i32,
            }),
            ClientMessage::Report(status) => Message::Report(Report {
                status: job::Status::from(status) as i32,
            }),
        };
        Self {
            message: Some(message),
        }
    }
}

impl From<PrinterStatus> for printer::Status {
    fn from(status: PrinterStatus) -> Self {
        match status {
            PrinterStatus::Ready => Self::Ready,
            PrinterStatus::Busy => Self::Busy,
            PrinterStatus::Offline => Self::Offline,
        }
    }
}

impl From<JobStatus> for job::Status {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Complete => Self::Complete,
            JobStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<PrinterConnectorServerMessage> for ServerMessage {
    fn from(msg: PrinterConnectorServerMessage) -> Self {
        use printer_connector_server_message::Message;

        match msg.message {
            Some(Message::Hello(_)) => Self::Hello,
            Some(Message::Print(print)) => {
                Self::Print(print.job.map(PrintJob::from).unwrap_or_else(|| PrintJob {
                    id: String::new(),
                    document_url: String::new(),
                    created_at: DateTime::<Utc>::UNIX_EPOCH,
                }))
            }
            None => Self::Other,
        }
    }
}

impl From<Job> for PrintJob {
    fn from(job: Job) -> Self {
        // A missing or out-of-range timestamp reads as the epoch, which no
        // TTL accepts.
        let created_at = job
            .created_at
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts.seconds, ts.nanos.try_into().ok()?))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        Self {
            id: job.id,
            document_url: job.document_url,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use prost::Message as _;

    use super::printer_connector_client_message as client;
    use super::printer_connector_server_message as server;
    use super::*;

    #[test]
    fn connect_path_is_in_the_eolymp_package() {
        assert_eq!(CONNECT_PATH, "/eolymp.printer.PrinterConnector/Connect");
    }

    #[test]
    fn status_message_encodes_enum_value() {
        let msg = PrinterConnectorClientMessage::from(ClientMessage::Status(PrinterStatus::Offline));
        assert_eq!(
            msg.message,
            Some(client::Message::Status(client::Status {
                status: printer::Status::Offline as i32
            }))
        );
    }

    #[test]
    fn report_survives_the_wire() {
        let msg = PrinterConnectorClientMessage::from(ClientMessage::Report(JobStatus::Cancelled));
        let decoded = PrinterConnectorClientMessage::decode(msg.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn print_message_converts_job() {
        let msg = PrinterConnectorServerMessage {
            message: Some(server::Message::Print(server::Print {
                job: Some(Job {
                    id: "17".into(),
                    document_url: "https://cdn.example.com/a.pdf".into(),
                    created_at: Some(prost_types::Timestamp {
                        seconds: 1_700_000_000,
                        nanos: 0,
                    }),
                }),
            })),
        };

        let ServerMessage::Print(job) = ServerMessage::from(msg) else {
            panic!("expected a print command");
        };
        assert_eq!(job.id, "17");
        assert_eq!(job.document_url, "https://cdn.example.com/a.pdf");
        assert_eq!(job.created_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn missing_timestamp_reads_as_epoch() {
        let job = PrintJob::from(Job {
            id: "1".into(),
            document_url: "u".into(),
            created_at: None,
        });
        assert_eq!(job.created_at, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn hello_and_unknown_variants() {
        let hello = PrinterConnectorServerMessage {
            message: Some(server::Message::Hello(server::Hello {})),
        };
        assert_eq!(ServerMessage::from(hello), ServerMessage::Hello);
        assert_eq!(
            ServerMessage::from(PrinterConnectorServerMessage { message: None }),
            ServerMessage::Other
        );
    }
}
