use anyhow::{anyhow, Context, Result};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

/// Checks a detached hex Ed25519 signature over template bytes.
///
/// Returns `Ok(false)` for a well-formed signature that does not verify and
/// an error when the key or signature cannot be decoded.
pub fn verify_template_signature(
    template_bytes: &[u8],
    public_key_hex: &str,
    signature_hex: &str,
) -> Result<bool> {
    let public_key: [u8; 32] = decode_fixed(public_key_hex.trim(), "public key")?;
    let signature: [u8; 64] = decode_fixed(signature_hex.trim(), "signature")?;

    let verifying_key =
        VerifyingKey::from_bytes(&public_key).context("invalid Ed25519 public key bytes")?;
    let signature = Signature::from_bytes(&signature);

    Ok(verifying_key.verify(template_bytes, &signature).is_ok())
}

fn decode_fixed<const N: usize>(value: &str, what: &str) -> Result<[u8; N]> {
    let bytes = hex::decode(value).with_context(|| format!("failed to decode Ed25519 {what} hex"))?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        anyhow!("invalid Ed25519 {what} length: expected {N} bytes, got {len}")
    })
}
