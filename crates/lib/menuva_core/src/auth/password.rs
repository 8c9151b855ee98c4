//! Password hashing via PBKDF2-HMAC-SHA512.
//!
//! Stored hashes are self-describing:
//! `pbkdf2:sha512:<iterations>:<salt-hex>:<key-hex>`, so the iteration
//! count can be raised later without breaking existing credentials.
//!
//! A legacy `<salt>:<sha256-hex>` format (plain salted SHA-256) is still
//! verifiable for migration, but never produced for new credentials —
//! callers must rehash on the next successful login. Plain-text stored
//! passwords always fail and are escalated as a security incident.

use pbkdf2::pbkdf2_hmac;
use rand::{Rng, rng};
use sha2::{Digest, Sha256, Sha512};
use subtle::ConstantTimeEq;
use tracing::error;

use super::AuthError;

/// PBKDF2 iteration count for newly created hashes.
const PBKDF2_ITERATIONS: u32 = 310_000;

/// Salt length in bytes.
const SALT_LEN: usize = 32;

/// Derived key length in bytes (SHA-512 output size).
const KEY_LEN: usize = 64;

/// Format tag for the current scheme.
const TAG: &str = "pbkdf2:sha512";

/// Outcome of verifying a password against a stored hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Password matches a current-format hash.
    Valid,
    /// Password matches a legacy hash; the caller should rehash and
    /// persist without blocking its own response on the write.
    ValidNeedsRehash,
    /// Password does not match, or the stored value is unverifiable.
    Invalid,
}

impl VerifyOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyOutcome::Valid | VerifyOutcome::ValidNeedsRehash)
    }
}

/// Hash a password with PBKDF2-HMAC-SHA512 and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    if password.is_empty() {
        return Err(AuthError::ValidationError("Password must not be empty".into()));
    }
    let mut salt = [0u8; SALT_LEN];
    rng().fill(&mut salt);

    let key = derive_key(password, &salt, PBKDF2_ITERATIONS);
    Ok(format!(
        "{TAG}:{PBKDF2_ITERATIONS}:{}:{}",
        hex::encode(salt),
        hex::encode(key)
    ))
}

/// Verify a password against a stored hash, branching on the format tag.
pub fn verify_password(password: &str, stored: &str) -> VerifyOutcome {
    if let Some(rest) = stored.strip_prefix("pbkdf2:") {
        return verify_tagged(password, rest);
    }

    // The legacy shape is `<salt>:<sha256-hex>`; the digest field must be
    // an exact SHA-256 hex string, so a colon inside a plain-text
    // password cannot masquerade as it.
    if let Some((salt, digest_hex)) = stored.split_once(':')
        && is_sha256_hex(digest_hex)
    {
        return verify_legacy(password, salt, digest_hex);
    }

    // Anything left is an unverifiable stored value — plain text or
    // corrupt. Fail closed and escalate.
    error!("plain-text or corrupt stored credential detected, rejecting login");
    VerifyOutcome::Invalid
}

fn is_sha256_hex(s: &str) -> bool {
    s.len() == 2 * Sha256::output_size() && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Verify against the tagged `pbkdf2:sha512:<iter>:<salt>:<key>` format.
fn verify_tagged(password: &str, rest: &str) -> VerifyOutcome {
    let parts: Vec<&str> = rest.split(':').collect();
    let [algo, iter_s, salt_hex, key_hex] = parts.as_slice() else {
        return VerifyOutcome::Invalid;
    };
    if *algo != "sha512" {
        return VerifyOutcome::Invalid;
    }
    let Ok(iterations) = iter_s.parse::<u32>() else {
        return VerifyOutcome::Invalid;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(key_hex)) else {
        return VerifyOutcome::Invalid;
    };
    if expected.len() != KEY_LEN {
        return VerifyOutcome::Invalid;
    }

    let derived = derive_key_var(password, &salt, iterations);
    // Constant-time comparison; `==` would leak a timing side-channel.
    if derived.ct_eq(expected.as_slice()).into() {
        VerifyOutcome::Valid
    } else {
        VerifyOutcome::Invalid
    }
}

/// Verify against the legacy `<salt>:<sha256-hex>` format.
///
/// Migration compatibility only — a match still demands a rehash.
fn verify_legacy(password: &str, salt: &str, digest_hex: &str) -> VerifyOutcome {
    let Ok(expected) = hex::decode(digest_hex) else {
        return VerifyOutcome::Invalid;
    };
    if expected.len() != Sha256::output_size() {
        return VerifyOutcome::Invalid;
    }

    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let derived = hasher.finalize();

    if derived.as_slice().ct_eq(expected.as_slice()).into() {
        VerifyOutcome::ValidNeedsRehash
    } else {
        VerifyOutcome::Invalid
    }
}

/// Is the stored hash in the current tagged format?
pub fn is_current_format(stored: &str) -> bool {
    stored.starts_with(TAG)
}

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha512>(password.as_bytes(), salt, iterations, &mut key);
    key
}

fn derive_key_var(password: &str, salt: &[u8], iterations: u32) -> Vec<u8> {
    let mut key = vec![0u8; KEY_LEN];
    pbkdf2_hmac::<Sha512>(password.as_bytes(), salt, iterations, &mut key);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    // Keep test hashing fast: round-trip through the real path once,
    // everything else exercises parsing/format branches.

    #[test]
    fn hash_round_trip() {
        let stored = hash_password("correct horse").unwrap();
        assert!(is_current_format(&stored));
        assert_eq!(verify_password("correct horse", &stored), VerifyOutcome::Valid);
        assert_eq!(verify_password("wrong horse", &stored), VerifyOutcome::Invalid);
    }

    #[test]
    fn empty_password_rejected() {
        assert!(hash_password("").is_err());
    }

    #[test]
    fn legacy_format_verifies_and_demands_rehash() {
        let salt = "abc123";
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(b"eski-sifre");
        let stored = format!("{salt}:{}", hex::encode(hasher.finalize()));

        assert_eq!(
            verify_password("eski-sifre", &stored),
            VerifyOutcome::ValidNeedsRehash
        );
        assert_eq!(verify_password("yanlis", &stored), VerifyOutcome::Invalid);
        assert!(!is_current_format(&stored));
    }

    #[test]
    fn plain_text_always_fails() {
        // A stored plain-text password must never verify, not even
        // against itself.
        assert_eq!(verify_password("hunter2", "hunter2"), VerifyOutcome::Invalid);
    }

    #[test]
    fn plain_text_with_colons_is_not_mistaken_for_legacy() {
        // A colon inside a plain-text password must not route it into the
        // legacy branch: the digest field is not valid SHA-256 hex.
        assert_eq!(
            verify_password("pass:word", "pass:word"),
            VerifyOutcome::Invalid
        );
        assert_eq!(verify_password("a:b:c", "a:b:c"), VerifyOutcome::Invalid);
        // Right length but not hex.
        let fake = format!("salt:{}", "z".repeat(64));
        assert_eq!(verify_password("pw", &fake), VerifyOutcome::Invalid);
    }

    #[test]
    fn unknown_tag_fails() {
        assert_eq!(
            verify_password("pw", "argon2:whatever:1:aa:bb"),
            VerifyOutcome::Invalid
        );
        assert_eq!(
            verify_password("pw", "pbkdf2:sha512:notanumber:aa:bb"),
            VerifyOutcome::Invalid
        );
    }

    #[test]
    fn iteration_count_is_embedded() {
        let stored = hash_password("pw").unwrap();
        let parts: Vec<&str> = stored.split(':').collect();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[2].parse::<u32>().unwrap(), PBKDF2_ITERATIONS);
    }
}
