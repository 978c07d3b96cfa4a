//! Session identifier hashing.

use sha2::{Digest, Sha256};

/// Number of digest bytes kept in audit events.
///
/// 16 bytes keeps log lines compact while making accidental collisions
/// across real session populations a non-concern.
const TRUNCATED_LEN: usize = 16;

/// Hashes a session identifier for inclusion in audit events.
///
/// The result is the first 16 bytes of the SHA-256 digest, hex-encoded
/// (32 characters). Deterministic, so the same session correlates across
/// events, and non-reversible, so logs never leak a usable session id.
#[must_use]
pub fn hash_session_id(session_id: &str) -> String {
    let digest = Sha256::digest(session_id.as_bytes());
    hex::encode(&digest[..TRUNCATED_LEN])
}
