//! # Signing Identity (secp256k1)
//!
//! The account live submissions are sent from.
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Low-S normalization (EIP-2)
//! - Decoded secret bytes are zeroized after key construction
//!
//! Without a configured secret the identity is read-only: it carries the
//! zero placeholder address and every signing attempt fails, which the
//! dispatcher surfaces as a rejected submission.

use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use ringside_types::Address;
use sha3::{Digest, Keccak256};
use std::fmt;
use thiserror::Error;
use zeroize::Zeroize;

/// Errors from identity construction and signing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Secret is not valid hex.
    #[error("Signing secret is not valid hex")]
    InvalidHex,

    /// Secret has the wrong length.
    #[error("Signing secret must be 32 bytes, got {0}")]
    InvalidLength(usize),

    /// Secret is not a valid secp256k1 scalar.
    #[error("Signing secret is not a valid secp256k1 key")]
    InvalidPrivateKey,

    /// Read-only identity asked to sign.
    #[error("no signing key configured")]
    NoSigningKey,

    /// The signer refused the digest.
    #[error("Signing failed")]
    SigningFailed,
}

/// ECDSA signature split for transaction encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// 0 or 1.
    pub y_parity: u8,
}

/// Account used for live submissions.
#[derive(Clone)]
pub struct SigningIdentity {
    address: Address,
    signing_key: Option<SigningKey>,
}

impl SigningIdentity {
    /// Build from a hex secret (with or without `0x`).
    pub fn from_secret_hex(secret: &str) -> Result<Self, IdentityError> {
        let trimmed = secret.trim();
        let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let mut decoded = hex::decode(stripped).map_err(|_| IdentityError::InvalidHex)?;

        if decoded.len() != 32 {
            let len = decoded.len();
            decoded.zeroize();
            return Err(IdentityError::InvalidLength(len));
        }

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();

        let result = SigningKey::from_bytes((&bytes).into());
        bytes.zeroize();
        let signing_key = result.map_err(|_| IdentityError::InvalidPrivateKey)?;

        Ok(Self {
            address: address_of(&signing_key),
            signing_key: Some(signing_key),
        })
    }

    /// Identity that cannot sign, at the zero placeholder address.
    pub fn read_only() -> Self {
        Self {
            address: [0u8; 20],
            signing_key: None,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// `0x`-prefixed lowercase hex address.
    pub fn address_hex(&self) -> String {
        format!("0x{}", hex::encode(self.address))
    }

    pub fn can_sign(&self) -> bool {
        self.signing_key.is_some()
    }

    /// Sign a 32-byte digest.
    pub fn sign_prehash(&self, digest: &[u8; 32]) -> Result<RecoverableSignature, IdentityError> {
        let key = self.signing_key.as_ref().ok_or(IdentityError::NoSigningKey)?;
        let (signature, recovery_id) = key
            .sign_prehash_recoverable(digest)
            .map_err(|_| IdentityError::SigningFailed)?;

        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);

        Ok(RecoverableSignature {
            r,
            s,
            y_parity: recovery_id.to_byte() & 1,
        })
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("address", &self.address_hex())
            .field("can_sign", &self.can_sign())
            .finish()
    }
}

/// Last 20 bytes of keccak256 of the uncompressed public key (without the
/// 0x04 prefix).
fn address_of(key: &SigningKey) -> Address {
    let point = key.verifying_key().to_encoded_point(false);
    let hash = Keccak256::digest(&point.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_of_key_one() {
        let identity = SigningIdentity::from_secret_hex(
            "0x0000000000000000000000000000000000000000000000000000000000000001",
        )
        .unwrap();
        assert_eq!(
            identity.address_hex(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
        assert!(identity.can_sign());
    }

    #[test]
    fn test_address_of_dev_key() {
        let identity = SigningIdentity::from_secret_hex(
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        assert_eq!(
            identity.address_hex(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_invalid_secrets() {
        assert_eq!(
            SigningIdentity::from_secret_hex("zz").unwrap_err(),
            IdentityError::InvalidHex
        );
        assert_eq!(
            SigningIdentity::from_secret_hex("0xabcd").unwrap_err(),
            IdentityError::InvalidLength(2)
        );
        assert_eq!(
            SigningIdentity::from_secret_hex(&"00".repeat(32)).unwrap_err(),
            IdentityError::InvalidPrivateKey
        );
    }

    #[test]
    fn test_read_only_cannot_sign() {
        let identity = SigningIdentity::read_only();
        assert_eq!(
            identity.address_hex(),
            "0x0000000000000000000000000000000000000000"
        );
        assert_eq!(
            identity.sign_prehash(&[7u8; 32]).unwrap_err(),
            IdentityError::NoSigningKey
        );
    }

    #[test]
    fn test_deterministic_signatures() {
        let identity = SigningIdentity::from_secret_hex(&"ab".repeat(32)).unwrap();
        let sig1 = identity.sign_prehash(&[1u8; 32]).unwrap();
        let sig2 = identity.sign_prehash(&[1u8; 32]).unwrap();
        assert_eq!(sig1, sig2);
        assert!(sig1.y_parity <= 1);
    }

    #[test]
    fn test_debug_hides_secret() {
        let identity = SigningIdentity::from_secret_hex(&"ab".repeat(32)).unwrap();
        let debug = format!("{:?}", identity);
        assert!(!debug.contains(&"ab".repeat(32)));
        assert!(debug.contains("can_sign: true"));
    }
}
