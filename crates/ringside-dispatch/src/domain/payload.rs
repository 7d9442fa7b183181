//! Action payload encoding.
//!
//! The payload is the JSON object `{type, details, timestamp}`. Its byte
//! length is what `max_payload_bytes` bounds, and for ordinary actions it is
//! also the string handed to `logAction`.

use crate::ports::outbound::SubmissionPayload;
use rand::Rng;
use ringside_types::{ActionDetails, ActionKind, DispatchError, Timestamp};
use serde::Serialize;

/// Detail key naming the trophy recipient.
pub const RECIPIENT_KEY: &str = "recipient";

const MOCK_SUFFIX_LEN: usize = 6;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Serialize)]
struct ActionPayload<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    details: &'a ActionDetails,
    timestamp: Timestamp,
}

/// Encode an action and enforce the size ceiling.
pub fn encode_action(
    kind: &ActionKind,
    details: &ActionDetails,
    timestamp: Timestamp,
    limit: usize,
) -> Result<String, DispatchError> {
    let encoded = serde_json::to_string(&ActionPayload {
        kind: kind.as_str(),
        details,
        timestamp,
    })
    .map_err(|e| DispatchError::Rejected(format!("payload encoding failed: {}", e)))?;

    if encoded.len() > limit {
        return Err(DispatchError::OversizedPayload {
            size: encoded.len(),
            limit,
        });
    }
    Ok(encoded)
}

/// Contract call a request turns into.
///
/// Trophy requests carrying a recipient go to `mintTrophy`; everything
/// else is logged through `logAction`.
pub fn submission_for(
    kind: &ActionKind,
    details: &ActionDetails,
    encoded: &str,
) -> SubmissionPayload {
    if *kind == ActionKind::MintTrophy {
        if let Some(recipient) = details.get(RECIPIENT_KEY).and_then(|v| v.as_str()) {
            return SubmissionPayload::MintTrophy {
                recipient: recipient.to_string(),
            };
        }
    }
    SubmissionPayload::LogAction {
        data: encoded.to_string(),
    }
}

/// Identifier for a simulated record: `mock-<tag>-<millis>-<6 base36 chars>`,
/// where the tag is `mint` for trophy mints and `tx` for everything else.
pub fn mock_tx_id(kind: &ActionKind, now: Timestamp) -> String {
    let tag = if *kind == ActionKind::MintTrophy { "mint" } else { "tx" };
    let mut rng = rand::thread_rng();
    let suffix: String = (0..MOCK_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("mock-{}-{}-{}", tag, now, suffix)
}
