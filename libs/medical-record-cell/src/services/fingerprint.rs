use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};

use shared_models::error::AppError;

use crate::models::FingerprintRequest;

const DIGEST_HEX_LEN: usize = 64;

/// Lowercase hex SHA-256 of the raw image bytes.
pub fn digest_image(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

pub fn is_hex_digest(value: &str) -> bool {
    value.len() == DIGEST_HEX_LEN && value.chars().all(|c| c.is_ascii_hexdigit())
}

pub fn decode_image(encoded: &str) -> Result<Vec<u8>, AppError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|_| AppError::ValidationError("Fingerprint image must be valid base64".to_string()))?;
    if bytes.is_empty() {
        return Err(AppError::ValidationError("Fingerprint image is empty".to_string()));
    }
    Ok(bytes)
}

/// Resolves the digest to match on. An image wins over a supplied hash.
pub fn resolve_digest(request: &FingerprintRequest) -> Result<String, AppError> {
    if let Some(image) = &request.fingerprint_image {
        return Ok(digest_image(&decode_image(image)?));
    }
    match &request.fingerprint_hash {
        Some(hash) if is_hex_digest(hash) => Ok(hash.to_ascii_lowercase()),
        Some(_) => Err(AppError::ValidationError(
            "Fingerprint hash must be a 64-character hex SHA-256 digest".to_string(),
        )),
        None => Err(AppError::ValidationError("Fingerprint data is required".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_known_value() {
        assert_eq!(
            digest_image(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_image_and_hash_resolve_to_same_digest() {
        let image = STANDARD.encode(b"ridge-pattern");
        let from_image = resolve_digest(&FingerprintRequest {
            fingerprint_image: Some(image),
            fingerprint_hash: None,
        })
        .unwrap();
        let from_hash = resolve_digest(&FingerprintRequest {
            fingerprint_image: None,
            fingerprint_hash: Some(from_image.to_uppercase()),
        })
        .unwrap();

        assert_eq!(from_image, from_hash);
    }

    #[test]
    fn test_resolve_rejects_bad_input() {
        assert!(resolve_digest(&FingerprintRequest::default()).is_err());
        assert!(resolve_digest(&FingerprintRequest {
            fingerprint_image: Some("not base64!!".to_string()),
            fingerprint_hash: None,
        })
        .is_err());
        assert!(resolve_digest(&FingerprintRequest {
            fingerprint_image: None,
            fingerprint_hash: Some("abc".to_string()),
        })
        .is_err());
    }
}
