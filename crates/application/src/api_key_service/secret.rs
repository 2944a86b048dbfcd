use std::fmt::Write;

use scholaris_core::{AppError, AppResult};
use scholaris_domain::{API_KEY_PREFIX, API_KEY_SECRET_HEX_LENGTH, display_prefix_for_secret};
use sha2::{Digest, Sha256};

/// Freshly generated secret with everything that gets persisted for it.
pub(super) struct GeneratedSecret {
    pub(super) secret: String,
    pub(super) display_prefix: String,
    pub(super) hash: String,
}

/// Generates `sk_live_` followed by 64 random hex characters.
pub(super) fn generate_secret() -> AppResult<GeneratedSecret> {
    let mut bytes = [0u8; API_KEY_SECRET_HEX_LENGTH / 2];
    getrandom::fill(&mut bytes)
        .map_err(|error| AppError::Internal(format!("failed to generate API key: {error}")))?;

    let secret = format!("{API_KEY_PREFIX}{}", to_hex(&bytes));
    let display_prefix = display_prefix_for_secret(&secret)?;
    let hash = hash_secret(&secret);
    Ok(GeneratedSecret {
        secret,
        display_prefix,
        hash,
    })
}

/// SHA-256 of the full secret, hex encoded, as stored.
pub(super) fn hash_secret(secret: &str) -> String {
    to_hex(&Sha256::digest(secret.as_bytes()))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        })
}
