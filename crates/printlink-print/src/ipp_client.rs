// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Async IPP client for the printer managed by this agent.
//
// Uses the `ipp` crate's async API to send the standard IPP operations the
// agent needs:
//   - Get-Printer-Attributes  (RFC 8011 §4.2.5)
//   - Get-Job-Attributes      (RFC 8011 §4.3.4)
//   - Print-Job               (RFC 8011 §4.2.1)
//
// Failures to complete the HTTP exchange (including non-2xx responses) are
// transport errors; a completed exchange with a non-successful IPP status
// is a protocol error.

use std::future::Future;
use std::io::Cursor;

use ipp::model::StatusCode;
use ipp::prelude::*;
use tracing::{debug, error, info, instrument};
use url::Url;

use printlink_core::error::{AgentError, Result};
use printlink_core::types::{JobAttributes, JobState, PrinterAttributes, PrinterState};

/// Charset sent with every request.
const CHARSET: &str = "utf-8";

/// Natural language sent with every request.
const NATURAL_LANGUAGE: &str = "en-US";

/// `requesting-user-name` for submitted jobs.
const REQUESTING_USER_NAME: &str = "Printlink Agent";

/// The printer operations the session logic depends on.
///
/// Implemented by [`IppClient`] for real printers and by fakes in tests.
pub trait PrinterApi: Send + Sync {
    /// Query the printer's current attributes.
    fn printer_attributes(&self) -> impl Future<Output = Result<PrinterAttributes>> + Send;

    /// Query the attributes of a job previously accepted by the printer.
    fn job_attributes(&self, job_id: i32) -> impl Future<Output = Result<JobAttributes>> + Send;

    /// Submit a document and return the printer-assigned job-id.
    fn print_job(
        &self,
        job_name: &str,
        mime_type: &str,
        content: Vec<u8>,
    ) -> impl Future<Output = Result<i32>> + Send;
}

/// Async IPP client wrapping the `ipp` crate.
///
/// Each instance is bound to a single printer URI.  Credentials embedded in
/// the configured URL are sent as HTTP basic auth and never appear in the
/// `printer-uri` attribute.
pub struct IppClient {
    /// The target printer URI (ipp:// or ipps://), without credentials.
    uri: Uri,
    client: AsyncIppClient,
}

impl IppClient {
    /// Create a new client targeting the given printer URL.
    pub fn new(printer_url: &str) -> Result<Self> {
        let mut url = Url::parse(printer_url)
            .map_err(|e| AgentError::Config(format!("invalid printer URI '{printer_url}': {e}")))?;

        let username = url.username().to_owned();
        let password = url.password().unwrap_or_default().to_owned();
        // Clearing credentials only fails for URLs that cannot carry them.
        let _ = url.set_username("");
        let _ = url.set_password(None);

        let uri: Uri = url
            .as_str()
            .parse()
            .map_err(|e| AgentError::Config(format!("invalid printer URI '{printer_url}': {e}")))?;

        let mut builder = AsyncIppClient::builder(uri.clone());
        if !username.is_empty() {
            builder = builder.basic_auth(&username, &password);
        }

        Ok(Self {
            uri,
            client: builder.build(),
        })
    }

    /// Return the printer URI this client is targeting.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request skeleton shared by every operation: charset, natural language
    /// and the printer target.
    fn new_request(&self, operation: Operation) -> IppRequestResponse {
        let mut request =
            IppRequestResponse::new(IppVersion::v1_1(), operation, Some(self.uri.clone()));
        let attributes = request.attributes_mut();
        attributes.add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new(
                IppAttribute::ATTRIBUTES_CHARSET,
                IppValue::Charset(CHARSET.into()),
            ),
        );
        attributes.add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new(
                IppAttribute::ATTRIBUTES_NATURAL_LANGUAGE,
                IppValue::NaturalLanguage(NATURAL_LANGUAGE.into()),
            ),
        );
        attributes.add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new(IppAttribute::PRINTER_URI, IppValue::Uri(self.uri.to_string())),
        );
        request
    }

    fn printer_attributes_request(&self) -> IppRequestResponse {
        let mut request = self.new_request(Operation::GetPrinterAttributes);
        request.attributes_mut().add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new(
                IppAttribute::REQUESTED_ATTRIBUTES,
                IppValue::Keyword("all".into()),
            ),
        );
        request
    }

    fn job_attributes_request(&self, job_id: i32) -> IppRequestResponse {
        let mut request = self.new_request(Operation::GetJobAttributes);
        request.attributes_mut().add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new(IppAttribute::JOB_ID, IppValue::Integer(job_id)),
        );
        request
    }

    fn print_job_request(
        &self,
        job_name: &str,
        mime_type: &str,
        content: Vec<u8>,
    ) -> IppRequestResponse {
        let mut request = self.new_request(Operation::PrintJob);
        let attributes = request.attributes_mut();
        attributes.add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new(
                IppAttribute::REQUESTING_USER_NAME,
                IppValue::NameWithoutLanguage(REQUESTING_USER_NAME.into()),
            ),
        );
        attributes.add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new(
                IppAttribute::JOB_NAME,
                IppValue::NameWithoutLanguage(job_name.into()),
            ),
        );
        attributes.add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new(
                IppAttribute::DOCUMENT_FORMAT,
                IppValue::MimeMediaType(mime_type.into()),
            ),
        );
        *request.payload_mut() = IppPayload::new(Cursor::new(content));
        request
    }

    /// Send a request and check the IPP status of the response.
    async fn send(&self, operation: &str, request: IppRequestResponse) -> Result<IppRequestResponse> {
        let response = self
            .client
            .send(request)
            .await
            .map_err(|e| AgentError::Transport(format!("{operation}: {e}")))?;

        check_status(operation, response.header().status_code())?;
        Ok(response)
    }
}

/// Only plain `successful-ok` is accepted; the error carries the status
/// description.
fn check_status(operation: &str, code: StatusCode) -> Result<()> {
    if code == StatusCode::SuccessfulOk {
        return Ok(());
    }
    error!(status = ?code, "{operation} failed");
    Err(AgentError::Protocol(code.to_string()))
}

impl PrinterApi for IppClient {
    #[instrument(skip(self), fields(uri = %self.uri))]
    async fn printer_attributes(&self) -> Result<PrinterAttributes> {
        debug!("sending Get-Printer-Attributes");
        let response = self
            .send("Get-Printer-Attributes", self.printer_attributes_request())
            .await?;

        let attrs = parse_printer_attributes(response.attributes());
        debug!(state = %attrs.state, "received printer attributes");
        Ok(attrs)
    }

    #[instrument(skip(self), fields(uri = %self.uri))]
    async fn job_attributes(&self, job_id: i32) -> Result<JobAttributes> {
        debug!("sending Get-Job-Attributes");
        let response = self
            .send("Get-Job-Attributes", self.job_attributes_request(job_id))
            .await?;

        Ok(parse_job_attributes(response.attributes()))
    }

    #[instrument(skip(self, content), fields(uri = %self.uri, size = content.len()))]
    async fn print_job(&self, job_name: &str, mime_type: &str, content: Vec<u8>) -> Result<i32> {
        info!(mime = mime_type, "sending Print-Job");
        let response = self
            .send("Print-Job", self.print_job_request(job_name, mime_type, content))
            .await?;

        let job_id = extract_job_id(response.attributes()).ok_or(AgentError::NoJobId)?;

        info!(job_id, "print job accepted by printer");
        Ok(job_id)
    }
}

// ---------------------------------------------------------------------------
// Helper functions for parsing IPP responses
// ---------------------------------------------------------------------------

/// All values of an attribute; single values are a one-element slice.
fn values(value: &IppValue) -> &[IppValue] {
    match value {
        IppValue::Array(items) => items,
        other => std::slice::from_ref(other),
    }
}

fn first(value: &IppValue) -> Option<&IppValue> {
    values(value).first()
}

fn as_int(value: &IppValue) -> Option<i32> {
    match value {
        IppValue::Integer(v) | IppValue::Enum(v) => Some(*v),
        _ => None,
    }
}

/// Read the Printer Attributes group of a Get-Printer-Attributes response.
///
/// Unknown attributes are skipped and absent ones keep their default, so a
/// sparse response is never an error.
pub fn parse_printer_attributes(attrs: &IppAttributes) -> PrinterAttributes {
    let mut out = PrinterAttributes::default();

    for group in attrs.groups_of(DelimiterTag::PrinterAttributes) {
        for (name, attr) in group.attributes() {
            let value = attr.value();
            let Some(head) = first(value) else {
                continue;
            };

            match name.as_str() {
                "printer-name" => out.name = head.to_string(),
                "printer-info" => out.info = head.to_string(),
                "printer-state" => {
                    if let Some(v) = as_int(head) {
                        out.state = PrinterState::from_ipp(v);
                    }
                }
                "printer-state-reasons" => out.state_reason = head.to_string(),
                "queued-job-count" => {
                    if let Some(v) = as_int(head) {
                        out.queued_job_count = v;
                    }
                }
                "color-supported" => {
                    if let IppValue::Boolean(v) = head {
                        out.color_supported = *v;
                    }
                }
                "operations-supported" => {
                    out.operations_supported = values(value).iter().filter_map(as_int).collect();
                }
                "page-delivery-supported" => {
                    out.page_delivery_supported =
                        values(value).iter().map(|v| v.to_string()).collect();
                }
                _ => {}
            }
        }
    }

    out
}

/// Read the Job Attributes group of a Get-Job-Attributes response.
pub fn parse_job_attributes(attrs: &IppAttributes) -> JobAttributes {
    let mut out = JobAttributes::default();

    for group in attrs.groups_of(DelimiterTag::JobAttributes) {
        for (name, attr) in group.attributes() {
            let Some(head) = first(attr.value()) else {
                continue;
            };

            match name.as_str() {
                "job-state" => {
                    if let Some(v) = as_int(head) {
                        out.state = JobState::from_ipp(v);
                    }
                }
                "job-state-reasons" => out.state_reason = head.to_string(),
                _ => {}
            }
        }
    }

    out
}

/// Extract the `job-id` integer from a response's Job Attributes group.
pub fn extract_job_id(attrs: &IppAttributes) -> Option<i32> {
    attrs
        .groups_of(DelimiterTag::JobAttributes)
        .filter_map(|group| group.attributes().get("job-id"))
        .find_map(|attr| first(attr.value()).and_then(as_int))
}
