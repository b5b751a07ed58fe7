//! PKCE (Proof Key for Code Exchange) helpers.
//!
//! The verifier is generated once per authorization attempt, persisted under
//! [`CODE_VERIFIER_KEY`] so that the code exchange can read it back, and
//! deleted after the exchange whatever its outcome.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::store::{KeyValueStore, StoreError};

/// Store key holding the pending PKCE verifier.
pub const CODE_VERIFIER_KEY: &str = "convertkit_code_verifier";

/// Challenge method sent with every authorization URL.
pub const CODE_CHALLENGE_METHOD: &str = "S256";

/// Generates a fresh verifier: 32 random bytes, base64url without padding.
#[must_use]
pub fn generate_code_verifier() -> String {
    let mut rng = rand::thread_rng();
    let random_bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Derives the S256 challenge for `verifier`.
///
/// ```rust
/// use convertkit_api::auth::oauth::code_challenge;
///
/// // RFC 7636 appendix B
/// assert_eq!(
///     code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
///     "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
/// );
/// ```
#[must_use]
pub fn code_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Returns the stored verifier, generating and persisting one if absent.
///
/// # Errors
///
/// Returns [`StoreError`] if the store cannot be read or written.
pub fn get_or_create_code_verifier(store: &dyn KeyValueStore) -> Result<String, StoreError> {
    if let Some(existing) = stored_code_verifier(store)? {
        return Ok(existing);
    }
    let verifier = generate_code_verifier();
    store.set(CODE_VERIFIER_KEY, Value::String(verifier.clone()))?;
    Ok(verifier)
}

/// Returns the stored verifier, if a non-empty one exists.
///
/// # Errors
///
/// Returns [`StoreError`] if the store cannot be read.
pub fn stored_code_verifier(store: &dyn KeyValueStore) -> Result<Option<String>, StoreError> {
    Ok(store
        .get(CODE_VERIFIER_KEY)?
        .and_then(|value| value.as_str().map(str::to_string))
        .filter(|verifier| !verifier.is_empty()))
}

/// Deletes the stored verifier.
///
/// # Errors
///
/// Returns [`StoreError`] if the store cannot be written.
pub fn delete_code_verifier(store: &dyn KeyValueStore) -> Result<(), StoreError> {
    store.delete(CODE_VERIFIER_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_verifier_is_url_safe_and_unpadded() {
        let verifier = generate_code_verifier();
        assert_eq!(verifier.len(), 43);
        assert!(verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_verifiers_are_unique() {
        assert_ne!(generate_code_verifier(), generate_code_verifier());
    }

    #[test]
    fn test_challenge_has_no_padding() {
        let challenge = code_challenge(&generate_code_verifier());
        assert_eq!(challenge.len(), 43);
        assert!(!challenge.contains('='));
    }

    #[test]
    fn test_verifier_is_reused_until_deleted() {
        let store = MemoryStore::new();
        let first = get_or_create_code_verifier(&store).unwrap();
        let second = get_or_create_code_verifier(&store).unwrap();
        assert_eq!(first, second);

        delete_code_verifier(&store).unwrap();
        assert_eq!(stored_code_verifier(&store).unwrap(), None);

        let third = get_or_create_code_verifier(&store).unwrap();
        assert_ne!(first, third);
    }

    #[test]
    fn test_empty_stored_verifier_is_ignored() {
        let store = MemoryStore::new();
        store.set(CODE_VERIFIER_KEY, Value::String(String::new())).unwrap();
        assert_eq!(stored_code_verifier(&store).unwrap(), None);
    }
}
