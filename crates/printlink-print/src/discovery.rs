// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// mDNS service discovery for IPP and IPPS printers on the local network.
//
// Diagnostic only: the agent runs this when no printer is configured, lists
// what it found, and exits.  We browse for `_ipp._tcp.local.` and
// `_ipps._tcp.local.` using the `mdns-sd` crate.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mdns_sd::{ServiceDaemon, ServiceEvent, ServiceInfo};
use tracing::{debug, info, warn};

use printlink_core::error::{AgentError, Result};
use printlink_core::types::{DiscoveredPrinter, PrinterState};

/// mDNS service type for plain IPP.
const IPP_SERVICE: &str = "_ipp._tcp.local.";

/// mDNS service type for TLS-secured IPP.
const IPPS_SERVICE: &str = "_ipps._tcp.local.";

type PrinterMap = Arc<Mutex<HashMap<String, DiscoveredPrinter>>>;

/// Printer discovery engine using mDNS-SD.
///
/// Resolved services are accumulated in a map keyed by their full service
/// name, so repeated announcements collapse into one entry.
pub struct PrinterDiscovery {
    daemon: ServiceDaemon,
    printers: PrinterMap,
    /// Addresses of this host; printers announced from one of them are
    /// reachable as `localhost`.
    local_addrs: Arc<Vec<IpAddr>>,
}

impl PrinterDiscovery {
    /// Create a new discovery engine.  Browsing starts with [`discover`].
    ///
    /// [`discover`]: PrinterDiscovery::discover
    pub fn new() -> Result<Self> {
        let daemon = ServiceDaemon::new()
            .map_err(|e| AgentError::Discovery(format!("failed to start mDNS daemon: {e}")))?;

        let local_addrs = local_ip_address::list_afinet_netifas()
            .map(|ifaces| ifaces.into_iter().map(|(_, ip)| ip).collect())
            .unwrap_or_else(|e| {
                warn!(error = %e, "could not list local interfaces");
                Vec::new()
            });

        Ok(Self {
            daemon,
            printers: Arc::new(Mutex::new(HashMap::new())),
            local_addrs: Arc::new(local_addrs),
        })
    }

    /// Browse for `timeout`, then shut the daemon down and return every
    /// printer that was resolved and not withdrawn in the meantime.
    pub fn discover(self, timeout: Duration) -> Result<Vec<DiscoveredPrinter>> {
        for (service_type, tls) in [(IPP_SERVICE, false), (IPPS_SERVICE, true)] {
            let receiver = self
                .daemon
                .browse(service_type)
                .map_err(|e| AgentError::Discovery(format!("browse {service_type}: {e}")))?;
            self.spawn_listener(service_type, tls, receiver)?;
        }

        info!(timeout = ?timeout, "mDNS printer discovery started");
        std::thread::sleep(timeout);

        // A failed shutdown only leaks the daemon thread until exit.
        if let Err(e) = self.daemon.shutdown() {
            warn!(error = %e, "mDNS daemon shutdown failed");
        }

        let mut printers: Vec<DiscoveredPrinter> = self
            .printers
            .lock()
            .map_err(|_| AgentError::Discovery("printer map lock poisoned".into()))?
            .values()
            .cloned()
            .collect();
        printers.sort_by(|a, b| a.uri.cmp(&b.uri));
        Ok(printers)
    }

    /// Spawn a thread that drains the browse receiver into the shared map.
    fn spawn_listener(
        &self,
        service_type: &'static str,
        tls: bool,
        receiver: mdns_sd::Receiver<ServiceEvent>,
    ) -> Result<()> {
        let printers = Arc::clone(&self.printers);
        let local_addrs = Arc::clone(&self.local_addrs);

        std::thread::Builder::new()
            .name(format!("mdns-{service_type}"))
            .spawn(move || {
                // The channel closes when browsing stops or the daemon shuts down.
                while let Ok(event) = receiver.recv() {
                    match event {
                        ServiceEvent::ServiceResolved(info) => {
                            let printer = service_info_to_printer(&info, tls, &local_addrs);
                            info!(name = %printer.name, uri = %printer.uri, "printer resolved");
                            if let Ok(mut map) = printers.lock() {
                                map.insert(info.get_fullname().to_owned(), printer);
                            }
                        }
                        ServiceEvent::ServiceRemoved(stype, fullname) => {
                            debug!(service_type = %stype, name = %fullname, "printer removed");
                            if let Ok(mut map) = printers.lock() {
                                map.remove(&fullname);
                            }
                        }
                        ServiceEvent::SearchStopped(_) => break,
                        _ => {}
                    }
                }
            })
            .map(|_| ())
            .map_err(|e| AgentError::Discovery(format!("failed to spawn mDNS listener: {e}")))
    }
}

/// Convert a resolved `ServiceInfo` into a `DiscoveredPrinter`.
///
/// TXT record keys used:
///   - `rp`            resource path (e.g. "ipp/print")
///   - `printer-state` IPP printer-state enum value
fn service_info_to_printer(info: &ServiceInfo, tls: bool, local_addrs: &[IpAddr]) -> DiscoveredPrinter {
    let fullname = info.get_fullname();
    let name = instance_name(fullname, info.get_type()).to_owned();

    let is_local = info.get_addresses().iter().any(|ip| local_addrs.contains(ip));
    let host = if is_local {
        "localhost".to_owned()
    } else {
        info.get_hostname().trim_end_matches('.').to_owned()
    };

    DiscoveredPrinter {
        name,
        uri: printer_uri(
            tls,
            &host,
            info.get_port(),
            info.get_property_val_str("rp").unwrap_or_default(),
        ),
        state: txt_printer_state(info.get_property_val_str("printer-state")),
    }
}

/// Instance part of an mDNS full name (`Office._ipp._tcp.local.` → `Office`).
fn instance_name<'a>(fullname: &'a str, service_type: &str) -> &'a str {
    fullname
        .strip_suffix(service_type)
        .map(|s| s.trim_end_matches('.'))
        .unwrap_or(fullname)
}

fn printer_uri(tls: bool, host: &str, port: u16, resource_path: &str) -> String {
    let scheme = if tls { "ipps" } else { "ipp" };
    format!(
        "{scheme}://{host}:{port}/{}",
        resource_path.trim_start_matches('/')
    )
}

fn txt_printer_state(value: Option<&str>) -> PrinterState {
    value
        .and_then(|v| v.trim().parse().ok())
        .map(PrinterState::from_ipp)
        .unwrap_or_default()
}
