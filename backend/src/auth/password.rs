//! Password hashing using argon2
//!
//! Passwords are stored as a raw Argon2id digest plus the random salt it was
//! derived with, in two separate columns. Parameters are fixed in code:
//! changing them invalidates every stored digest.
//!
//! # Performance Considerations
//!
//! Argon2 is intentionally CPU-intensive. Use the `_async` variants from
//! request handlers so derivation runs on the blocking thread pool.

use anyhow::Result;
use argon2::{password_hash::Output, Algorithm, Argon2, Params, Version};
use rand::{rngs::OsRng, RngCore};

/// Salt length in bytes
pub const SALT_LEN: usize = 16;

/// Digest length in bytes
pub const HASH_LEN: usize = 32;

/// Memory cost in KiB (19 MiB)
const MEMORY_COST_KIB: u32 = 19 * 1024;
/// Number of passes
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;

/// A derived password digest and the salt it was derived with
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest {
    pub hash: Vec<u8>,
    pub salt: Vec<u8>,
}

impl std::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordDigest")
            .field("hash", &"[REDACTED]")
            .field("salt", &"[REDACTED]")
            .finish()
    }
}

/// Password hashing service
///
/// Uses Argon2id which is the recommended variant for password hashing.
/// It provides resistance against both side-channel and GPU-based attacks.
pub struct PasswordService;

impl PasswordService {
    fn hasher() -> Result<Argon2<'static>> {
        let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, Some(HASH_LEN))
            .map_err(|e| anyhow::anyhow!("Invalid argon2 parameters: {}", e))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    fn derive(password: &str, salt: &[u8]) -> Result<[u8; HASH_LEN]> {
        let mut out = [0u8; HASH_LEN];
        Self::hasher()?
            .hash_password_into(password.as_bytes(), salt, &mut out)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
        Ok(out)
    }

    /// Hash a password with a fresh random salt (blocking operation)
    ///
    /// # Performance Note
    /// This is CPU-intensive. For async contexts, use `encode_async`.
    pub fn encode(password: &str) -> Result<PasswordDigest> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let hash = Self::derive(password, &salt)?;
        Ok(PasswordDigest {
            hash: hash.to_vec(),
            salt: salt.to_vec(),
        })
    }

    /// Hash a password asynchronously (non-blocking)
    ///
    /// Spawns the CPU-intensive work on a blocking thread pool,
    /// preventing it from blocking the async runtime.
    pub async fn encode_async(password: String) -> Result<PasswordDigest> {
        tokio::task::spawn_blocking(move || Self::encode(&password))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }

    /// Verify a password against a stored digest and salt (blocking operation)
    ///
    /// The comparison runs in constant time. A stored digest or salt of the
    /// wrong shape never matches.
    pub fn compare(password: &str, hash: &[u8], salt: &[u8]) -> bool {
        if hash.len() != HASH_LEN || salt.len() != SALT_LEN {
            return false;
        }
        let Ok(derived) = Self::derive(password, salt) else {
            return false;
        };
        match (Output::new(&derived), Output::new(hash)) {
            // `Output` equality is constant-time
            (Ok(derived), Ok(stored)) => derived == stored,
            _ => false,
        }
    }

    /// Verify a password asynchronously (non-blocking)
    ///
    /// Spawns the CPU-intensive work on a blocking thread pool.
    pub async fn compare_async(password: String, hash: Vec<u8>, salt: Vec<u8>) -> Result<bool> {
        tokio::task::spawn_blocking(move || Self::compare(&password, &hash, &salt))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))
    }

    /// Burn the same amount of work as a real comparison.
    ///
    /// Used when a sign-in names no known account, so the response time does
    /// not reveal whether the account exists.
    pub async fn dummy_compare_async(password: String) -> Result<()> {
        tokio::task::spawn_blocking(move || {
            let _ = Self::derive(&password, &[0u8; SALT_LEN]);
        })
        .await
        .map_err(|e| anyhow::anyhow!("Task join error: {}", e))
    }
}
