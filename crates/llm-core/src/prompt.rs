//! Prompt fingerprinting, so logs can tell prompt versions apart.

use sha2::{Digest, Sha256};

/// Short, stable SHA-256 fingerprint of a prompt (first 12 hex chars).
pub fn prompt_fingerprint(prompt: &str) -> String {
    let digest = Sha256::digest(prompt.as_bytes());
    hex::encode(&digest[..6])
}
