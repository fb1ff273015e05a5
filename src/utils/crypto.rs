use anyhow::Context;
use p256::ecdsa::VerifyingKey;

/// Parse a SEC1 encoded P-256 public key, as carried by certificates.
pub fn p256_public_key_from_sec1(bytes: &[u8]) -> anyhow::Result<VerifyingKey> {
    VerifyingKey::from_sec1_bytes(bytes).context("P-256 public key")
}

/// Convert a 64-byte `x || y` attestation public key to a verifying key by
/// prepending the SEC1 uncompressed point tag.
pub fn attestation_key_from_raw(raw: &[u8; 64]) -> anyhow::Result<VerifyingKey> {
    let mut sec1 = [4u8; 65];
    sec1[1..].copy_from_slice(raw);
    VerifyingKey::from_sec1_bytes(&sec1).context("attestation key")
}
