//! # Mode Selector
//!
//! Decides at startup whether the dispatcher runs live or simulated.
//!
//! ```text
//! mock flag? ──yes──→ Simulated
//!     │no
//! endpoint? ──no───→ Simulated
//!     │
//! identity  ──bad──→ Simulated   (absent secret: read-only identity)
//!     │
//! contract? ──no───→ Simulated
//!     │
//! connect   ──err──→ Simulated
//!     │
//! probe     ──err──→ Simulated   (only if verify_contract)
//!     │
//!   Live
//! ```
//!
//! Never fails: every problem degrades to simulated mode with a warning.

use crate::adapters::identity::SigningIdentity;
use crate::config::DispatcherConfig;
use crate::ports::outbound::{LedgerClient, LedgerConnector, LedgerTarget};
use ringside_types::Mode;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of mode selection.
pub struct Selection {
    pub mode: Mode,
    /// Present iff `mode` is `Live`.
    pub client: Option<Arc<dyn LedgerClient>>,
    pub identity: SigningIdentity,
    /// Why simulated mode was chosen.
    pub fallback_reason: Option<String>,
}

impl Selection {
    fn simulated(identity: SigningIdentity, reason: impl Into<String>) -> Self {
        Self {
            mode: Mode::Simulated,
            client: None,
            identity,
            fallback_reason: Some(reason.into()),
        }
    }
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("mode", &self.mode)
            .field("identity", &self.identity)
            .field("fallback_reason", &self.fallback_reason)
            .finish()
    }
}

pub struct ModeSelector;

impl ModeSelector {
    pub async fn initialize(config: &DispatcherConfig, connector: &dyn LedgerConnector) -> Selection {
        let selection = Self::select(config, connector).await;
        match &selection.fallback_reason {
            None => info!(
                address = %selection.identity.address_hex(),
                can_sign = selection.identity.can_sign(),
                "Ledger client ready, running live"
            ),
            Some(reason) if config.mock_mode => info!(reason = %reason, "Running simulated"),
            Some(reason) => warn!(reason = %reason, "Falling back to simulated mode"),
        }
        selection
    }

    async fn select(config: &DispatcherConfig, connector: &dyn LedgerConnector) -> Selection {
        if config.mock_mode {
            return Selection::simulated(SigningIdentity::read_only(), "mock mode requested");
        }

        let Some(endpoint_url) = config.endpoint_url.clone() else {
            return Selection::simulated(SigningIdentity::read_only(), "no ledger endpoint configured");
        };

        let identity = match config.signing_secret.as_deref() {
            Some(secret) => match SigningIdentity::from_secret_hex(secret) {
                Ok(identity) => identity,
                Err(e) => {
                    return Selection::simulated(
                        SigningIdentity::read_only(),
                        format!("invalid signing secret: {}", e),
                    )
                }
            },
            None => {
                warn!("No signing secret configured, submissions will be rejected");
                SigningIdentity::read_only()
            }
        };

        let Some(contract_address) = config.contract_address.clone() else {
            return Selection::simulated(identity, "no contract address configured");
        };

        let target = LedgerTarget {
            endpoint_url,
            contract_address,
            chain_id: config.chain_id,
            identity: identity.clone(),
        };

        let client = match connector.connect(&target).await {
            Ok(client) => client,
            Err(e) => return Selection::simulated(identity, format!("connect failed: {}", e)),
        };

        if config.verify_contract {
            if let Err(e) = client.probe().await {
                return Selection::simulated(identity, format!("contract probe failed: {}", e));
            }
        }

        Selection {
            mode: Mode::Live,
            client: Some(client),
            identity,
            fallback_reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::{
        FeeParams, LedgerError, OfflineConnector, PendingHandle, Receipt, SubmissionPayload,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubClient {
        probe_ok: bool,
    }

    #[async_trait]
    impl LedgerClient for StubClient {
        async fn submit(
            &self,
            _payload: &SubmissionPayload,
            _fees: &FeeParams,
        ) -> Result<PendingHandle, LedgerError> {
            Err(LedgerError::Uninitialized)
        }

        async fn await_confirmation(&self, _handle: &PendingHandle) -> Result<Receipt, LedgerError> {
            Err(LedgerError::Uninitialized)
        }

        async fn probe(&self) -> Result<(), LedgerError> {
            if self.probe_ok {
                Ok(())
            } else {
                Err(LedgerError::Chain("no code".into()))
            }
        }
    }

    #[derive(Default)]
    struct StubConnector {
        probe_ok: bool,
        connects: AtomicUsize,
    }

    #[async_trait]
    impl LedgerConnector for StubConnector {
        async fn connect(
            &self,
            _target: &LedgerTarget,
        ) -> Result<Arc<dyn LedgerClient>, LedgerError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(StubClient {
                probe_ok: self.probe_ok,
            }))
        }
    }

    fn live_config() -> DispatcherConfig {
        DispatcherConfig {
            endpoint_url: Some("http://localhost:8545".into()),
            signing_secret: Some("11".repeat(32)),
            contract_address: Some("0x0000000000000000000000000000000000000042".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_mock_flag_wins() {
        let connector = StubConnector {
            probe_ok: true,
            ..Default::default()
        };
        let config = DispatcherConfig {
            mock_mode: true,
            ..live_config()
        };
        let selection = ModeSelector::initialize(&config, &connector).await;
        assert_eq!(selection.mode, Mode::Simulated);
        assert_eq!(connector.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fully_configured_goes_live() {
        let connector = StubConnector {
            probe_ok: true,
            ..Default::default()
        };
        let selection = ModeSelector::initialize(&live_config(), &connector).await;
        assert_eq!(selection.mode, Mode::Live);
        assert!(selection.client.is_some());
        assert!(selection.identity.can_sign());
    }

    #[tokio::test]
    async fn test_missing_endpoint_is_simulated() {
        let config = DispatcherConfig {
            endpoint_url: None,
            ..live_config()
        };
        let selection = ModeSelector::initialize(&config, &OfflineConnector).await;
        assert_eq!(selection.mode, Mode::Simulated);
        assert!(selection.client.is_none());
    }

    #[tokio::test]
    async fn test_malformed_secret_is_simulated() {
        let connector = StubConnector {
            probe_ok: true,
            ..Default::default()
        };
        let config = DispatcherConfig {
            signing_secret: Some("not hex".into()),
            ..live_config()
        };
        let selection = ModeSelector::initialize(&config, &connector).await;
        assert_eq!(selection.mode, Mode::Simulated);
        assert!(selection
            .fallback_reason
            .unwrap()
            .contains("invalid signing secret"));
    }

    #[tokio::test]
    async fn test_absent_secret_is_read_only_live() {
        let connector = StubConnector {
            probe_ok: true,
            ..Default::default()
        };
        let config = DispatcherConfig {
            signing_secret: None,
            ..live_config()
        };
        let selection = ModeSelector::initialize(&config, &connector).await;
        assert_eq!(selection.mode, Mode::Live);
        assert!(!selection.identity.can_sign());
        assert_eq!(selection.identity.address(), [0u8; 20]);
    }

    #[tokio::test]
    async fn test_failed_probe_is_simulated() {
        let connector = StubConnector::default();
        let selection = ModeSelector::initialize(&live_config(), &connector).await;
        assert_eq!(selection.mode, Mode::Simulated);

        let config = DispatcherConfig {
            verify_contract: false,
            ..live_config()
        };
        let selection = ModeSelector::initialize(&config, &connector).await;
        assert_eq!(selection.mode, Mode::Live);
    }

    #[tokio::test]
    async fn test_connect_failure_is_simulated() {
        let selection = ModeSelector::initialize(&live_config(), &OfflineConnector).await;
        assert_eq!(selection.mode, Mode::Simulated);
        assert!(selection.fallback_reason.unwrap().contains("connect failed"));
    }
}
