//! Contract call and EIP-1559 transaction encoding.
//!
//! Signing hash: `keccak256(0x02 || rlp([chainId, nonce, maxPriorityFeePerGas,
//! maxFeePerGas, gasLimit, to, value, data, accessList]))`. The signed form
//! appends `[yParity, r, s]` to the same list.

use crate::adapters::identity::RecoverableSignature;
use primitive_types::{H160, U256};
use ringside_types::Address;
use rlp::RlpStream;
use sha3::{Digest, Keccak256};

const EIP1559_TX_TYPE: u8 = 0x02;

/// First four bytes of keccak256 of a function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// Calldata for `logAction(string)`.
pub fn encode_log_action(data: &str) -> Vec<u8> {
    let bytes = data.as_bytes();
    let padded_len = bytes.len().div_ceil(32) * 32;

    let mut out = Vec::with_capacity(4 + 64 + padded_len);
    out.extend_from_slice(&selector("logAction(string)"));
    out.extend_from_slice(&word(32));
    out.extend_from_slice(&word(bytes.len() as u64));
    out.extend_from_slice(bytes);
    out.resize(4 + 64 + padded_len, 0);
    out
}

/// Calldata for `mintTrophy(address)`.
pub fn encode_mint_trophy(recipient: &Address) -> Vec<u8> {
    let mut out = Vec::with_capacity(36);
    out.extend_from_slice(&selector("mintTrophy(address)"));
    out.extend_from_slice(&[0u8; 12]);
    out.extend_from_slice(recipient);
    out
}

/// Parse a `0x`-prefixed 20-byte hex address.
pub fn parse_address(value: &str) -> Option<Address> {
    let stripped = value.trim().strip_prefix("0x")?;
    let bytes = hex::decode(stripped).ok()?;
    if bytes.len() != 20 {
        return None;
    }
    let mut address = [0u8; 20];
    address.copy_from_slice(&bytes);
    Some(address)
}

/// Parse a JSON-RPC hex quantity (`0x1a`).
pub fn parse_quantity(value: &str) -> Option<u64> {
    let stripped = value.strip_prefix("0x")?;
    if stripped.is_empty() {
        return Some(0);
    }
    u64::from_str_radix(stripped, 16).ok()
}

fn word(value: u64) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[24..].copy_from_slice(&value.to_be_bytes());
    out
}

/// Unsigned EIP-1559 contract call with zero value and an empty access list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicFeeTx {
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee: u128,
    pub max_fee: u128,
    pub gas_limit: u64,
    pub to: Address,
    pub data: Vec<u8>,
}

impl DynamicFeeTx {
    fn append_fields(&self, stream: &mut RlpStream) {
        stream.append(&self.chain_id);
        stream.append(&self.nonce);
        stream.append(&U256::from(self.max_priority_fee));
        stream.append(&U256::from(self.max_fee));
        stream.append(&self.gas_limit);
        stream.append(&H160::from(self.to));
        stream.append(&U256::zero());
        stream.append(&self.data);
        stream.begin_list(0);
    }

    /// Digest the signer commits to.
    pub fn signing_hash(&self) -> [u8; 32] {
        let mut stream = RlpStream::new_list(9);
        self.append_fields(&mut stream);

        let mut hasher = Keccak256::new();
        hasher.update([EIP1559_TX_TYPE]);
        hasher.update(stream.as_raw());
        hasher.finalize().into()
    }

    /// Typed envelope ready for `eth_sendRawTransaction`.
    pub fn encode_signed(&self, signature: &RecoverableSignature) -> Vec<u8> {
        let mut stream = RlpStream::new_list(12);
        self.append_fields(&mut stream);
        stream.append(&signature.y_parity);
        stream.append(&U256::from_big_endian(&signature.r));
        stream.append(&U256::from_big_endian(&signature.s));

        let mut out = Vec::with_capacity(1 + stream.as_raw().len());
        out.push(EIP1559_TX_TYPE);
        out.extend_from_slice(stream.as_raw());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::identity::SigningIdentity;
    use rlp::Rlp;

    #[test]
    fn test_known_selectors() {
        assert_eq!(hex::encode(selector("owner()")), "8da5cb5b");
        assert_eq!(
            hex::encode(selector("transfer(address,uint256)")),
            "a9059cbb"
        );
    }

    #[test]
    fn test_log_action_layout() {
        let calldata = encode_log_action("hi");
        assert_eq!(calldata.len(), 4 + 32 + 32 + 32);
        assert_eq!(&calldata[..4], &selector("logAction(string)"));
        assert_eq!(calldata[4 + 31], 0x20);
        assert_eq!(calldata[36 + 31], 2);
        assert_eq!(&calldata[68..70], b"hi");
        assert!(calldata[70..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_log_action_exact_word() {
        let calldata = encode_log_action(&"a".repeat(32));
        assert_eq!(calldata.len(), 4 + 64 + 32);
        assert_eq!(encode_log_action("").len(), 4 + 64);
    }

    #[test]
    fn test_mint_trophy_layout() {
        let recipient = [0xAB; 20];
        let calldata = encode_mint_trophy(&recipient);
        assert_eq!(calldata.len(), 36);
        assert!(calldata[4..16].iter().all(|b| *b == 0));
        assert_eq!(&calldata[16..], &recipient);
    }

    #[test]
    fn test_parse_address() {
        let parsed = parse_address("0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf").unwrap();
        assert_eq!(parsed[0], 0x7E);
        assert_eq!(parsed[19], 0xDF);
        assert!(parse_address("7E5F4552091A69125d5DfCb7b8C2659029395Bdf").is_none());
        assert!(parse_address("0x1234").is_none());
        assert!(parse_address("0xzz").is_none());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x1a"), Some(26));
        assert_eq!(parse_quantity("0x0"), Some(0));
        assert_eq!(parse_quantity("0x"), Some(0));
        assert_eq!(parse_quantity("26"), None);
    }

    #[test]
    fn test_signed_envelope_shape() {
        let identity = SigningIdentity::from_secret_hex(&"11".repeat(32)).unwrap();
        let tx = DynamicFeeTx {
            chain_id: 10143,
            nonce: 7,
            max_priority_fee: 100_000_000_000,
            max_fee: 100_000_000_000,
            gas_limit: 3_000_000,
            to: [0x42; 20],
            data: encode_log_action("{}"),
        };

        let signature = identity.sign_prehash(&tx.signing_hash()).unwrap();
        let raw = tx.encode_signed(&signature);
        assert_eq!(raw[0], EIP1559_TX_TYPE);

        let list = Rlp::new(&raw[1..]);
        assert_eq!(list.item_count().unwrap(), 12);
        assert_eq!(list.val_at::<u64>(0).unwrap(), 10143);
        assert_eq!(list.val_at::<u64>(1).unwrap(), 7);
        assert_eq!(list.val_at::<u64>(4).unwrap(), 3_000_000);
        assert_eq!(list.val_at::<Vec<u8>>(7).unwrap(), tx.data);
    }

    #[test]
    fn test_signing_hash_depends_on_nonce() {
        let mut tx = DynamicFeeTx {
            chain_id: 1,
            nonce: 0,
            max_priority_fee: 1,
            max_fee: 2,
            gas_limit: 21_000,
            to: [1; 20],
            data: Vec::new(),
        };
        let first = tx.signing_hash();
        tx.nonce = 1;
        assert_ne!(first, tx.signing_hash());
    }
}
