use memochat_api::types::ValidationLimits;
use serde::{Deserialize, Serialize};

/// Default relationship category written into identities and handshake
/// payloads.
pub const DEFAULT_CATEGORY: &str = "individual";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Inbound poll cadence.
    pub poll_interval_ms: u64,
    /// Backoff between operation-result queries.
    pub result_poll_interval_ms: u64,
    /// Upper bound on result queries per operation; an exhausted loop is
    /// reported as an operation failure.
    pub max_result_polls: u32,
    /// Minimum confirmations when listing unspent notes.
    pub min_conf: u32,
    /// Fixed memo width the transport pads to.
    pub memo_width: usize,
    /// Unspent-note count at which notes are merged; the daemon rejects
    /// transactions spending more notes than this.
    pub max_notes: usize,
    /// Amount carried by handshake and message transactions, in base units.
    pub dust: u64,
    pub fee: u64,
    pub merge_fee: u64,
    /// Messages loaded per pagination step.
    pub page_size: usize,
    pub category: String,
    pub limits: ValidationLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5_000,
            result_poll_interval_ms: 3_000,
            max_result_polls: 100,
            min_conf: 0,
            memo_width: 512,
            max_notes: 54,
            dust: 10_000,
            fee: 10_000,
            merge_fee: 10_000,
            page_size: 5,
            category: DEFAULT_CATEGORY.to_string(),
            limits: ValidationLimits::default(),
        }
    }
}
