//! Password hashing for the change-password flow.
//!
//! Stored format is `<salt>$<digest>` where both halves are lowercase hex
//! and the digest is SHA-256 over the salt followed by the password. The
//! hash is one-way; verification recomputes the digest with the stored
//! salt and compares.

use sha2::{Digest, Sha256};

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let salt: u128 = rand::random();
    let salt_hex = format!("{:032x}", salt);
    format!("{}${}", salt_hex, digest_hex(&salt_hex, password))
}

/// Check a password against a stored `<salt>$<digest>` hash.
///
/// Malformed stored values never verify; they are treated as a mismatch
/// rather than an error so a corrupted user record cannot be logged into.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt_hex, digest)) => digest_hex(salt_hex, password) == digest,
        None => false,
    }
}

fn digest_hex(salt_hex: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt_hex.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}
