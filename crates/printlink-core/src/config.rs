// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Agent configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AgentError, Result};

/// Default print service endpoint.
pub const DEFAULT_SERVER_URL: &str = "https://printer.eolymp.com";

/// Settings fixed at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Printer URI (`ipp://` or `ipps://`, optionally with `user:pass@`).
    /// Empty means "discover printers and exit".
    pub printer_url: String,
    /// Print service URL.
    pub server_url: String,
    /// Space the printer is registered in (`space-id` metadata).
    pub space_id: String,
    /// Bearer token authenticating this printer.
    pub token: String,
    /// Jobs older than this are cancelled instead of printed.
    pub job_ttl: Duration,
    /// How long to browse the network in discovery mode.
    pub lookup_timeout: Duration,
    /// Where downloaded documents are written before submission.
    pub scratch_dir: PathBuf,
}

impl AgentConfig {
    /// Whether the agent should run printer discovery instead of connecting.
    pub fn discovery_mode(&self) -> bool {
        self.printer_url.trim().is_empty()
    }

    /// Check the settings required to open a session.
    pub fn validate(&self) -> Result<()> {
        if self.space_id.trim().is_empty() {
            return Err(AgentError::Config(
                "space ID is required, please add --space argument".into(),
            ));
        }
        if self.token.trim().is_empty() {
            return Err(AgentError::Config(
                "printer token is required, please add --token argument".into(),
            ));
        }
        if self.job_ttl.is_zero() {
            return Err(AgentError::Config("job TTL must be positive".into()));
        }
        Ok(())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            printer_url: String::new(),
            server_url: DEFAULT_SERVER_URL.into(),
            space_id: String::new(),
            token: String::new(),
            job_ttl: Duration::from_secs(5 * 60),
            lookup_timeout: Duration::from_secs(60),
            scratch_dir: std::env::temp_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> AgentConfig {
        AgentConfig {
            printer_url: "ipp://192.168.1.20:631/ipp/print".into(),
            space_id: "space-1".into(),
            token: "token".into(),
            ..Default::default()
        }
    }

    #[test]
    fn defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.job_ttl, Duration::from_secs(300));
        assert!(config.discovery_mode());
    }

    #[test]
    fn complete_config_is_valid() {
        assert!(configured().validate().is_ok());
        assert!(!configured().discovery_mode());
    }

    #[test]
    fn missing_space_or_token_is_rejected() {
        let config = AgentConfig {
            space_id: String::new(),
            ..configured()
        };
        assert!(matches!(config.validate(), Err(AgentError::Config(_))));

        let config = AgentConfig {
            token: "  ".into(),
            ..configured()
        };
        assert!(matches!(config.validate(), Err(AgentError::Config(_))));
    }
}
