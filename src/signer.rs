//! Transaction Signer
//!
//! Signs transaction payloads with ed25519 account keys.
//! Signatures are deterministic (RFC 8032): the same key over the same draft
//! always yields the same bytes.

use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier, VerifyingKey};

use crate::keys::{self, KeyError};
use crate::transaction::DecoratedSignature;

/// Trait for transaction signers
pub trait TxSigner: Send + Sync {
    /// Sign a 32-byte signature payload
    fn sign_payload(&self, payload: &[u8; 32]) -> Result<DecoratedSignature, SignerError>;

    /// Account id of the signing key
    fn account_id(&self) -> String;

    /// Get signer type description
    fn signer_type(&self) -> &'static str;
}

/// Single ed25519 account key
pub struct Ed25519Signer {
    signing_key: SigningKey,
}

impl std::fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("account_id", &self.account_id())
            .finish_non_exhaustive()
    }
}

impl Ed25519Signer {
    /// Create from raw seed bytes
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Create from a secret seed strkey (`S...`)
    pub fn from_secret(secret: &str) -> Result<Self, SignerError> {
        let seed = keys::decode_secret_seed(secret)?;
        Ok(Self::from_seed(&seed))
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Last four bytes of the public key
    pub fn hint(&self) -> [u8; 4] {
        let public = self.public_key();
        [public[28], public[29], public[30], public[31]]
    }
}

impl TxSigner for Ed25519Signer {
    fn sign_payload(&self, payload: &[u8; 32]) -> Result<DecoratedSignature, SignerError> {
        let signature = self
            .signing_key
            .try_sign(payload)
            .map_err(|e| SignerError::SigningFailed(e.to_string()))?;

        Ok(DecoratedSignature {
            hint: self.hint(),
            signature: signature.to_bytes(),
        })
    }

    fn account_id(&self) -> String {
        keys::encode_account_id(&self.public_key())
    }

    fn signer_type(&self) -> &'static str {
        "ed25519"
    }
}

/// Check a decorated signature against an account's public key
pub fn verify_signature(
    public_key: &[u8; 32],
    payload: &[u8; 32],
    signature: &DecoratedSignature,
) -> Result<(), SignerError> {
    let key = VerifyingKey::from_bytes(public_key)
        .map_err(|e| SignerError::InvalidKey(e.to_string()))?;
    let sig = Signature::from_bytes(&signature.signature);
    key.verify(payload, &sig)
        .map_err(|_| SignerError::VerificationFailed)
}

/// Signer errors
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("invalid key: {0}")]
    Key(#[from] KeyError),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("signature verification failed")]
    VerificationFailed,
}
