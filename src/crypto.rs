use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use hkdf::Hkdf;
use sha2::Sha256;

const HKDF_SALT: &[u8] = b"chatplane-v1";
const HKDF_INFO: &[u8] = b"channel-credentials";
const NONCE_LEN: usize = 12;

fn derive_key(key: &str) -> Result<[u8; 32], String> {
    let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), key.as_bytes());
    let mut okm = [0u8; 32];
    hk.expand(HKDF_INFO, &mut okm)
        .map_err(|e| format!("Key derivation failed: {e}"))?;
    Ok(okm)
}

fn cipher(key: &str) -> Result<Aes256Gcm, String> {
    Aes256Gcm::new_from_slice(&derive_key(key)?).map_err(|e| format!("Invalid key: {e}"))
}

/// Encrypt a channel secret with AES-256-GCM. Output is `nonce || ciphertext`.
pub fn encrypt(plaintext: &[u8], key: &str) -> Result<Vec<u8>, String> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher(key)?
        .encrypt(&nonce, plaintext)
        .map_err(|e| format!("Encryption failed: {e}"))?;

    let mut sealed = nonce.to_vec();
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

pub fn decrypt(sealed: &[u8], key: &str) -> Result<Vec<u8>, String> {
    if sealed.len() < NONCE_LEN {
        return Err("Ciphertext too short".to_string());
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    cipher(key)?
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|e| format!("Decryption failed: {e}"))
}

/// Serialize a JSON credentials object and seal it.
pub fn seal_json(value: &serde_json::Value, key: &str) -> Result<Vec<u8>, String> {
    let bytes = serde_json::to_vec(value).map_err(|e| format!("Invalid credentials: {e}"))?;
    encrypt(&bytes, key)
}

pub fn open_json(sealed: &[u8], key: &str) -> Result<serde_json::Value, String> {
    let bytes = decrypt(sealed, key)?;
    serde_json::from_slice(&bytes).map_err(|e| format!("Corrupt credentials: {e}"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn sealed_credentials_open_with_the_same_key() {
        let creds = json!({ "access_token": "EAAG...", "phone_number_id": "1234" });
        let sealed = seal_json(&creds, "k1").unwrap();
        assert_eq!(open_json(&sealed, "k1").unwrap(), creds);
    }

    #[test]
    fn wrong_key_fails_to_open() {
        let sealed = encrypt(b"secret", "k1").unwrap();
        assert!(decrypt(&sealed, "k2").is_err());
    }

    #[test]
    fn nonces_differ_between_encryptions() {
        let a = encrypt(b"secret", "k1").unwrap();
        let b = encrypt(b"secret", "k1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn truncated_input_is_rejected() {
        assert!(decrypt(&[0u8; 4], "k1").is_err());
    }
}
