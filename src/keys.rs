//! Stellar Key Strings
//!
//! Classifies strkey text by its version prefix and decodes account ids.
//! Secret seeds start with `S`, account ids (public keys) start with `G`;
//! anything else is rejected rather than guessed.

use stellar_strkey::ed25519;
use thiserror::Error;

/// Kind of a Stellar key string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Secret seed (`S...`)
    Private,
    /// Account id (`G...`)
    Public,
}

impl std::fmt::Display for KeyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyKind::Private => write!(f, "private"),
            KeyKind::Public => write!(f, "public"),
        }
    }
}

/// Key errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid key format: expected a key starting with 'S' or 'G'")]
    InvalidKeyFormat,

    #[error("expected a {expected} key, got a {got} key")]
    WrongKind { expected: KeyKind, got: KeyKind },

    #[error("malformed {0} key")]
    Malformed(KeyKind),
}

/// Classify a key string by its first character
pub fn classify_key(key: &str) -> Result<KeyKind, KeyError> {
    match key.trim().chars().next() {
        Some('S') => Ok(KeyKind::Private),
        Some('G') => Ok(KeyKind::Public),
        _ => Err(KeyError::InvalidKeyFormat),
    }
}

pub fn is_private_key(key: &str) -> Result<bool, KeyError> {
    classify_key(key).map(|kind| kind == KeyKind::Private)
}

pub fn is_public_key(key: &str) -> Result<bool, KeyError> {
    classify_key(key).map(|kind| kind == KeyKind::Public)
}

/// Decode and re-encode an account id, rejecting secret seeds
pub fn parse_account_id(key: &str) -> Result<String, KeyError> {
    let key = key.trim();
    match classify_key(key)? {
        KeyKind::Public => {}
        got => {
            return Err(KeyError::WrongKind {
                expected: KeyKind::Public,
                got,
            })
        }
    }

    let public = ed25519::PublicKey::from_string(key)
        .map_err(|_| KeyError::Malformed(KeyKind::Public))?;
    Ok(public.to_string())
}

/// Decode a secret seed into its 32 raw bytes
pub(crate) fn decode_secret_seed(key: &str) -> Result<[u8; 32], KeyError> {
    let key = key.trim();
    match classify_key(key)? {
        KeyKind::Private => {}
        got => {
            return Err(KeyError::WrongKind {
                expected: KeyKind::Private,
                got,
            })
        }
    }

    ed25519::PrivateKey::from_string(key)
        .map(|seed| seed.0)
        .map_err(|_| KeyError::Malformed(KeyKind::Private))
}

/// Encode raw public key bytes as an account id
pub fn encode_account_id(public_key: &[u8; 32]) -> String {
    ed25519::PublicKey(*public_key).to_string()
}

/// Resolve any key string to the account id it refers to
///
/// Secret seeds are converted to their public key, account ids are validated.
pub fn account_id_for(key: &str) -> Result<String, KeyError> {
    match classify_key(key)? {
        KeyKind::Public => parse_account_id(key),
        KeyKind::Private => {
            let seed = decode_secret_seed(key)?;
            let signing = ed25519_dalek::SigningKey::from_bytes(&seed);
            Ok(encode_account_id(signing.verifying_key().as_bytes()))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Secret seed strkey for a fixed test seed
    pub(crate) fn test_secret(byte: u8) -> String {
        ed25519::PrivateKey([byte; 32]).to_string()
    }

    /// Account id derived from `test_secret(byte)`
    pub(crate) fn test_account(byte: u8) -> String {
        let signing = ed25519_dalek::SigningKey::from_bytes(&[byte; 32]);
        encode_account_id(signing.verifying_key().as_bytes())
    }

    #[test]
    fn test_classify_by_prefix() {
        assert_eq!(classify_key("SABC").unwrap(), KeyKind::Private);
        assert_eq!(classify_key("GABC").unwrap(), KeyKind::Public);
        assert_eq!(classify_key("  GABC").unwrap(), KeyKind::Public);
        assert_eq!(classify_key("MABC"), Err(KeyError::InvalidKeyFormat));
        assert_eq!(classify_key("sabc"), Err(KeyError::InvalidKeyFormat));
        assert_eq!(classify_key(""), Err(KeyError::InvalidKeyFormat));
    }

    #[test]
    fn test_is_private_and_public_are_complementary() {
        assert_eq!(is_private_key("SABC"), Ok(true));
        assert_eq!(is_public_key("SABC"), Ok(false));
        assert_eq!(is_private_key("GABC"), Ok(false));
        assert_eq!(is_public_key("GABC"), Ok(true));
        assert!(is_public_key("XABC").is_err());
    }

    #[test]
    fn test_generated_strkeys_classify() {
        assert_eq!(classify_key(&test_secret(1)).unwrap(), KeyKind::Private);
        assert_eq!(classify_key(&test_account(1)).unwrap(), KeyKind::Public);
    }

    #[test]
    fn test_parse_account_id() {
        let account = test_account(3);
        assert_eq!(parse_account_id(&account).unwrap(), account);

        assert_eq!(
            parse_account_id(&test_secret(3)),
            Err(KeyError::WrongKind {
                expected: KeyKind::Public,
                got: KeyKind::Private
            })
        );
        assert_eq!(
            parse_account_id("GNOTAREALKEY"),
            Err(KeyError::Malformed(KeyKind::Public))
        );
    }

    #[test]
    fn test_account_id_for_secret() {
        assert_eq!(account_id_for(&test_secret(9)).unwrap(), test_account(9));
        assert_eq!(account_id_for(&test_account(9)).unwrap(), test_account(9));
        assert_eq!(account_id_for("Bogus"), Err(KeyError::InvalidKeyFormat));
    }
}
