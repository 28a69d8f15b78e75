// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stream connection to the print service.
//
// The session logic only sees the two halves of a duplex message stream
// (`MessageSink` for outbound, `MessageSource` for inbound) produced by a
// `Connector`.  `GrpcConnector` is the production implementation over a
// bidirectional tonic stream; tests substitute in-memory fakes.

use std::future::Future;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::client::Grpc;
use tonic::codec::{ProstCodec, Streaming};
use tonic::codegen::http::uri::PathAndQuery;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tonic::{Code, Request};
use tracing::debug;
use url::Url;

use printlink_core::error::{AgentError, Result};
use printlink_core::messages::{ClientMessage, ServerMessage};

use crate::proto;

/// Outbound messages buffered ahead of the HTTP/2 stream.
const OUTBOUND_BUFFER: usize = 16;

/// Identity presented to the service as call metadata.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Sent as `authorization: Bearer <token>`.
    pub token: String,
    /// Sent as `space-id`.
    pub space_id: String,
}

/// Inbound half of a session stream.
pub trait MessageSource: Send {
    /// Next message from the service; `Ok(None)` once the service closed
    /// the stream cleanly.
    fn recv(&mut self) -> impl Future<Output = Result<Option<ServerMessage>>> + Send;
}

/// Outbound half of a session stream.
pub trait MessageSink: Send {
    fn send(&mut self, message: ClientMessage) -> impl Future<Output = Result<()>> + Send;
}

/// Opens one session stream per call.
pub trait Connector: Send + Sync {
    type Sink: MessageSink;
    type Source: MessageSource;

    fn connect(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<(Self::Sink, Self::Source)>> + Send;
}

/// Connector for the `PrinterConnector/Connect` gRPC stream.
///
/// The channel is created once and shared by all sessions; it connects
/// lazily and re-establishes the HTTP/2 connection by itself.
pub struct GrpcConnector {
    channel: Channel,
}

impl GrpcConnector {
    /// Must be called from within a Tokio runtime.
    pub fn new(server_url: &str) -> Result<Self> {
        let address = EndpointAddress::parse(server_url)?;

        let mut endpoint = Endpoint::from_shared(address.uri.clone())
            .map_err(|e| AgentError::Config(format!("invalid server endpoint {}: {e}", address.uri)))?;

        if let Some(domain) = address.tls_domain {
            endpoint = endpoint
                .tls_config(ClientTlsConfig::new().domain_name(domain).with_native_roots())
                .map_err(|e| AgentError::Transport(format!("failed to configure TLS: {e}")))?;
        }

        debug!(endpoint = %address.uri, "print service endpoint configured");
        Ok(Self {
            channel: endpoint.connect_lazy(),
        })
    }
}

impl Connector for GrpcConnector {
    type Sink = GrpcSink;
    type Source = GrpcSource;

    async fn connect(&self, credentials: &Credentials) -> Result<(GrpcSink, GrpcSource)> {
        let mut grpc = Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| AgentError::Transport(format!("failed to connect to printing server: {e}")))?;

        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        let mut request = Request::new(ReceiverStream::new(rx));
        let metadata = request.metadata_mut();
        metadata.insert("authorization", bearer(&credentials.token)?);
        metadata.insert("space-id", ascii_value("space-id", &credentials.space_id)?);

        let codec: ProstCodec<proto::PrinterConnectorClientMessage, proto::PrinterConnectorServerMessage> =
            ProstCodec::default();
        let response = grpc
            .streaming(request, PathAndQuery::from_static(proto::CONNECT_PATH), codec)
            .await
            .map_err(|status| status_error("failed to open stream", &status))?;

        Ok((
            GrpcSink { tx },
            GrpcSource {
                inbound: response.into_inner(),
            },
        ))
    }
}

/// Outbound half of a gRPC session.  Dropping it half-closes the stream.
pub struct GrpcSink {
    tx: mpsc::Sender<proto::PrinterConnectorClientMessage>,
}

impl MessageSink for GrpcSink {
    async fn send(&mut self, message: ClientMessage) -> Result<()> {
        self.tx
            .send(message.into())
            .await
            .map_err(|_| AgentError::Transport("outbound stream closed".into()))
    }
}

/// Inbound half of a gRPC session.
pub struct GrpcSource {
    inbound: Streaming<proto::PrinterConnectorServerMessage>,
}

impl MessageSource for GrpcSource {
    async fn recv(&mut self) -> Result<Option<ServerMessage>> {
        match self.inbound.message().await {
            Ok(message) => Ok(message.map(ServerMessage::from)),
            Err(status) => Err(status_error("failed to receive response", &status)),
        }
    }
}

/// Where and how to reach the service, derived from its URL.
#[derive(Debug, PartialEq, Eq)]
struct EndpointAddress {
    uri: String,
    /// TLS server name; `None` for plaintext `http` endpoints.
    tls_domain: Option<String>,
}

impl EndpointAddress {
    fn parse(server_url: &str) -> Result<Self> {
        let url = Url::parse(server_url)
            .map_err(|e| AgentError::Config(format!("failed to parse server URL '{server_url}': {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| AgentError::Config(format!("server URL '{server_url}' has no host")))?;

        let tls = url.scheme() != "http";
        let port = url.port().unwrap_or(if tls { 443 } else { 80 });
        let scheme = if tls { "https" } else { "http" };

        Ok(Self {
            uri: format!("{scheme}://{host}:{port}"),
            tls_domain: tls.then(|| host.trim_matches(|c| c == '[' || c == ']').to_owned()),
        })
    }
}

/// Bytes escaped in a URL path segment.  Unreserved characters and
/// `$ & + : = @` pass through; `/ ; , ?` and the rest are escaped.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b':')
    .remove(b'=')
    .remove(b'@');

fn bearer(token: &str) -> Result<MetadataValue<Ascii>> {
    let escaped = utf8_percent_encode(token, PATH_SEGMENT);
    ascii_value("authorization", &format!("Bearer {escaped}"))
}

fn ascii_value(key: &str, value: &str) -> Result<MetadataValue<Ascii>> {
    MetadataValue::try_from(value)
        .map_err(|e| AgentError::Config(format!("invalid {key} metadata value: {e}")))
}

/// Connection-level gRPC codes are transport failures; anything else is the
/// service rejecting the call.
fn status_error(context: &str, status: &tonic::Status) -> AgentError {
    let detail = format!("{context}: {} ({:?})", status.message(), status.code());
    match status.code() {
        Code::Unavailable | Code::Internal | Code::Unknown | Code::Cancelled | Code::DeadlineExceeded => {
            AgentError::Transport(detail)
        }
        _ => AgentError::Protocol(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_defaults_to_port_443_with_tls() {
        let address = EndpointAddress::parse("https://printer.example.com").unwrap();
        assert_eq!(address.uri, "https://printer.example.com:443");
        assert_eq!(address.tls_domain.as_deref(), Some("printer.example.com"));
    }

    #[test]
    fn http_defaults_to_port_80_without_tls() {
        let address = EndpointAddress::parse("http://localhost").unwrap();
        assert_eq!(address.uri, "http://localhost:80");
        assert_eq!(address.tls_domain, None);
    }

    #[test]
    fn explicit_port_is_kept() {
        let address = EndpointAddress::parse("https://printer.example.com:8443/ignored").unwrap();
        assert_eq!(address.uri, "https://printer.example.com:8443");
    }

    #[test]
    fn server_url_without_host_is_rejected() {
        assert!(matches!(
            EndpointAddress::parse("not a url"),
            Err(AgentError::Config(_))
        ));
    }

    #[test]
    fn bearer_token_is_path_escaped() {
        let value = bearer("a b/c?d;e,f").unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer a%20b%2Fc%3Fd%3Be%2Cf");
    }

    #[test]
    fn bearer_token_keeps_segment_safe_characters() {
        let value = bearer("tok-en_1.~$&+:=@").unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer tok-en_1.~$&+:=@");
    }

    #[test]
    fn idle_reset_status_stays_benign() {
        let status = tonic::Status::internal(
            "h2 protocol error: stream error received: unspecific protocol error detected",
        );
        let err = status_error("failed to receive response", &status);
        assert!(matches!(err, AgentError::Transport(_)));
        assert!(err.is_benign_disconnect());
    }

    #[test]
    fn rejected_call_is_a_protocol_error() {
        let status = tonic::Status::unauthenticated("bad token");
        assert!(matches!(
            status_error("failed to open stream", &status),
            AgentError::Protocol(_)
        ));
    }
}
