//! Dispatcher configuration from environment variables.
//!
//! Every setting has a default, so a missing variable never prevents
//! startup. Missing ledger settings simply lead the mode selector to
//! choose simulated mode.

use std::env;
use std::time::Duration;

/// Fee parameters attached to every live submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeParams {
    /// Maximum total fee per gas unit (wei).
    pub fee_ceiling: u128,
    /// Maximum priority fee per gas unit (wei).
    pub priority_fee: u128,
    /// Gas limit for the transaction.
    pub gas_budget: u64,
}

impl Default for FeeParams {
    fn default() -> Self {
        Self {
            fee_ceiling: 100_000_000_000,  // 100 gwei
            priority_fee: 100_000_000_000, // 100 gwei
            gas_budget: 3_000_000,
        }
    }
}

/// Configuration for the dispatch core.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// JSON-RPC endpoint of the remote ledger.
    pub endpoint_url: Option<String>,
    /// Hex-encoded secp256k1 secret of the signing account.
    pub signing_secret: Option<String>,
    /// Address of the game contract.
    pub contract_address: Option<String>,
    /// EIP-155 chain id.
    pub chain_id: u64,
    /// Force simulated mode.
    pub mock_mode: bool,
    /// Perform a read-only contract call during initialization.
    pub verify_contract: bool,
    /// Maximum live submissions per rolling minute.
    pub max_per_minute: usize,
    /// Delay before re-checking the rate window when throttled.
    pub throttle_interval: Duration,
    /// Delay before the next dispatch after a failed one.
    pub failure_backoff: Duration,
    /// Number of records kept for display.
    pub ledger_capacity: usize,
    /// Ceiling on the encoded payload size.
    pub max_payload_bytes: usize,
    /// Deadline for a single JSON-RPC request, including the startup
    /// contract check.
    pub rpc_timeout: Duration,
    /// Deadline for confirmations. `None` waits until the chain answers or
    /// the record is evicted from the ledger, whichever comes first.
    pub confirmation_timeout: Option<Duration>,
    /// Fee parameters for live submissions.
    pub fees: FeeParams,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            signing_secret: None,
            contract_address: None,
            chain_id: 10143,
            mock_mode: false,
            verify_contract: true,
            max_per_minute: 100,
            throttle_interval: Duration::from_millis(5000),
            failure_backoff: Duration::from_millis(1000),
            ledger_capacity: 100,
            max_payload_bytes: 8192,
            rpc_timeout: Duration::from_secs(10),
            confirmation_timeout: None,
            fees: FeeParams::default(),
        }
    }
}

impl DispatcherConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `RINGSIDE_RPC_URL`: Ledger endpoint (default: unset)
    /// - `RINGSIDE_PRIVATE_KEY`: Signing secret, hex (default: unset)
    /// - `RINGSIDE_CONTRACT_ADDRESS`: Game contract (default: unset)
    /// - `RINGSIDE_CHAIN_ID`: Chain id (default: 10143)
    /// - `RINGSIDE_MOCK_MODE`: Force simulated mode (default: false)
    /// - `RINGSIDE_VERIFY_CONTRACT`: Probe contract at startup (default: true)
    /// - `RINGSIDE_MAX_TX_PER_MINUTE`: Rate ceiling (default: 100)
    /// - `RINGSIDE_THROTTLE_INTERVAL_MS`: Throttle backoff (default: 5000)
    /// - `RINGSIDE_FAILURE_BACKOFF_MS`: Failure backoff (default: 1000)
    /// - `RINGSIDE_LEDGER_CAPACITY`: Display history size (default: 100)
    /// - `RINGSIDE_MAX_PAYLOAD_BYTES`: Payload ceiling (default: 8192)
    /// - `RINGSIDE_RPC_TIMEOUT_MS`: Per-request RPC deadline (default: 10000)
    /// - `RINGSIDE_CONFIRMATION_TIMEOUT_MS`: Confirmation deadline (default: none)
    /// - `RINGSIDE_GAS_LIMIT`: Gas limit (default: 3000000)
    /// - `RINGSIDE_MAX_FEE_PER_GAS`: Fee ceiling in wei (default: 100 gwei)
    /// - `RINGSIDE_MAX_PRIORITY_FEE_PER_GAS`: Priority fee in wei (default: 100 gwei)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            endpoint_url: non_empty("RINGSIDE_RPC_URL"),
            signing_secret: non_empty("RINGSIDE_PRIVATE_KEY"),
            contract_address: non_empty("RINGSIDE_CONTRACT_ADDRESS"),
            chain_id: parsed("RINGSIDE_CHAIN_ID").unwrap_or(defaults.chain_id),
            mock_mode: flag("RINGSIDE_MOCK_MODE").unwrap_or(defaults.mock_mode),
            verify_contract: flag("RINGSIDE_VERIFY_CONTRACT").unwrap_or(defaults.verify_contract),
            max_per_minute: parsed("RINGSIDE_MAX_TX_PER_MINUTE")
                .unwrap_or(defaults.max_per_minute),
            throttle_interval: parsed("RINGSIDE_THROTTLE_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.throttle_interval),
            failure_backoff: parsed("RINGSIDE_FAILURE_BACKOFF_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.failure_backoff),
            ledger_capacity: parsed("RINGSIDE_LEDGER_CAPACITY")
                .unwrap_or(defaults.ledger_capacity),
            max_payload_bytes: parsed("RINGSIDE_MAX_PAYLOAD_BYTES")
                .unwrap_or(defaults.max_payload_bytes),
            rpc_timeout: parsed("RINGSIDE_RPC_TIMEOUT_MS")
                .filter(|ms: &u64| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.rpc_timeout),
            confirmation_timeout: parsed("RINGSIDE_CONFIRMATION_TIMEOUT_MS")
                .map(Duration::from_millis),
            fees: FeeParams {
                fee_ceiling: parsed("RINGSIDE_MAX_FEE_PER_GAS")
                    .unwrap_or(defaults.fees.fee_ceiling),
                priority_fee: parsed("RINGSIDE_MAX_PRIORITY_FEE_PER_GAS")
                    .unwrap_or(defaults.fees.priority_fee),
                gas_budget: parsed("RINGSIDE_GAS_LIMIT").unwrap_or(defaults.fees.gas_budget),
            },
        }
    }

    /// Creates a config with short intervals for testing.
    pub fn for_testing() -> Self {
        Self {
            mock_mode: true,
            throttle_interval: Duration::from_millis(50),
            failure_backoff: Duration::from_millis(10),
            ..Default::default()
        }
    }

    /// Ledger size actually allocated.
    ///
    /// The rate window is computed from ledger contents, so the ledger must
    /// be able to hold at least one full window of submissions.
    pub fn effective_ledger_capacity(&self) -> usize {
        self.ledger_capacity.max(self.max_per_minute).max(1)
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn flag(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
}
