use anyhow::bail;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

const APP_KEY_SALT: &[u8] = b"junkd-pk-salt";
const APP_KEY_ROUNDS: u32 = 4096;

/// Derives the 32-byte application key from the configured app secret.
///
/// The derivation is deterministic, so the same secret always identifies the
/// same application to the indexer.
pub fn derive_app_key(secret: &str) -> anyhow::Result<[u8; 32]> {
    if secret.is_empty() {
        bail!("app secret is required");
    }

    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(secret.as_bytes(), APP_KEY_SALT, APP_KEY_ROUNDS, &mut key);
    Ok(key)
}
